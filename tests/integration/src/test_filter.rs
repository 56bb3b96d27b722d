//! End-to-end filter parsing and evaluation tests.

#[cfg(test)]
mod tests {
    use querystack_filter::{Evaluator, PreparedFilter, QueryError, parse_filtering};
    use serde_json::json;

    use crate::{ann, jan, registry};

    #[test]
    fn test_should_match_typed_records() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let jan = jan();

        for expression in [
            "first_name == 'Jan' and last_name == \"Kowalski\"",
            "age == 42 and balance > 1000.25",
            "address.city ~ '^K' and address.zip >= 1000",
            "middle_name == null and manager != null",
            "manager.first_name == 'Ann' and manager.manager == null",
            "firstname == 'Jan'",
        ] {
            assert!(evaluator.filter(&jan, expression).unwrap(), "{expression}");
        }
    }

    #[test]
    fn test_should_flip_single_negated_leaf() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let jan = jan();

        for (positive, negative) in [
            ("first_name == 'Jan'", "first_name != 'Jan'"),
            ("age >= 42", "not age >= 42"),
            ("address.city ~ 'yiv'", "address.city !~ 'yiv'"),
            ("middle_name == null", "middle_name != null"),
        ] {
            assert!(evaluator.filter(&jan, positive).unwrap(), "{positive}");
            assert!(!evaluator.filter(&jan, negative).unwrap(), "{negative}");
        }
    }

    #[test]
    fn test_should_filter_a_collection() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let filtering = parse_filtering("age > 45 or address.city == 'Kyiv' and balance < 0")
            .unwrap();

        let users = [jan(), ann()];
        let matched: Vec<&str> = users
            .iter()
            .filter(|u| evaluator.evaluate(filtering.as_ref(), *u).unwrap())
            .map(|u| u.first_name.as_str())
            .collect();
        assert_eq!(matched, vec!["Ann"]);
    }

    #[test]
    fn test_should_report_type_mismatch() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let jan = jan();

        let err = evaluator.filter(&jan, "first_name == 123").unwrap_err();
        assert!(
            matches!(err, QueryError::TypeMismatch { ref field_path, .. } if field_path == "first_name")
        );
        assert!(matches!(
            evaluator.filter(&ann(), "manager.age > 1"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_should_not_negate_type_mismatch_into_success() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let jan = jan();

        for (expression, path) in [
            ("first_name != 123", "first_name"),
            ("not age == '42'", "age"),
            ("not first_name < 3", "first_name"),
            ("first_name != null", "first_name"),
            ("not (age > 1 or address.city >= 1)", "address.city"),
        ] {
            let err = evaluator.filter(&jan, expression).unwrap_err();
            assert!(
                matches!(err, QueryError::TypeMismatch { ref field_path, .. } if field_path == path),
                "{expression}: {err}"
            );
        }
    }

    #[test]
    fn test_should_reject_deep_nesting_without_crashing() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let jan = jan();

        let nested = format!("{}age == 42{}", "(".repeat(20_000), ")".repeat(20_000));
        let chained = vec!["age == 42"; 20_000].join(" and ");
        for expression in [nested, chained] {
            assert!(matches!(
                evaluator.filter(&jan, &expression),
                Err(QueryError::NestingTooDeep { .. })
            ));
        }
    }

    #[test]
    fn test_should_apply_prepared_filter_to_many_records() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let prepared = PreparedFilter::parse("address.city ~ '^K' and age != 0").unwrap();

        let users = [jan(), ann()];
        let matched = users
            .iter()
            .filter(|u| evaluator.matches(&prepared, *u).unwrap())
            .count();
        let expected = users
            .iter()
            .filter(|u| evaluator.evaluate(prepared.filtering(), *u).unwrap())
            .count();
        assert_eq!(matched, expected);
    }

    #[test]
    fn test_should_report_invalid_regex() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        assert!(matches!(
            evaluator.filter(&jan(), "first_name ~ '11[1'"),
            Err(QueryError::Regex(_))
        ));
    }

    #[test]
    fn test_should_evaluate_negated_groups_on_json() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let doc = json!({ "a": "x", "b": "z", "c": 5 });
        assert!(
            !evaluator
                .filter(&doc, "(a == 'x' or b == 'y') and not c == 5")
                .unwrap()
        );
    }

    #[test]
    fn test_should_share_registry_across_threads() {
        let registry = std::sync::Arc::new(registry());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    Evaluator::new(&registry)
                        .filter(&jan(), "manager.last_name == 'Lee'")
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_should_reparse_rendered_filters() {
        for expression in [
            "first_name == 'Jan' or not (age < 18 and balance >= -1.5)",
            "not not address.city !~ 'K.*'",
            "a == 1 or b == 2 and c == 3",
            "manager != null and manager.middle_name == \"O'Neil\"",
        ] {
            let parsed = parse_filtering(expression).unwrap().unwrap();
            let rendered = parsed.to_string();
            assert_eq!(
                parse_filtering(&rendered).unwrap().unwrap(),
                parsed,
                "{expression} -> {rendered}"
            );
        }
    }
}
