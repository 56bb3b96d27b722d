//! Permission validation integration tests.

#[cfg(test)]
mod tests {
    use querystack_filter::{QueryError, parse_filtering, parse_sorting, validate};
    use querystack_model::{FilterOperation, PolicyTable};

    use crate::user_policies;

    fn check(filter: &str, order_by: &str) -> Result<(), QueryError> {
        let filtering = parse_filtering(filter)?;
        let sorting = parse_sorting(order_by)?;
        validate(filtering.as_ref(), Some(&sorting), &user_policies(), "User")
    }

    #[test]
    fn test_should_deny_equality_on_first_name() {
        let err = check("first_name == \"Jan\"", "").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("first_name"), "{message}");
        assert!(message.contains("EQ"), "{message}");
    }

    #[test]
    fn test_should_allow_match_on_first_name() {
        assert!(check("first_name ~ \"Jan.*\"", "").is_ok());
    }

    #[test]
    fn test_should_deny_disabled_sorting() {
        let err = check("", "first_name, middle_name").unwrap_err();
        assert!(matches!(err, QueryError::SortingDisabled { ref field } if field == "middle_name"));
    }

    #[test]
    fn test_should_deny_nested_field_paths() {
        assert!(matches!(
            check("manager.last_name ~ 'L'", ""),
            Err(QueryError::OperationDenied {
                operation: FilterOperation::Match,
                ..
            })
        ));
        assert!(check("manager.first_name == 'Ann'", "").is_ok());
    }

    #[test]
    fn test_should_enforce_literal_types() {
        assert!(matches!(
            check("balance > 'rich'", ""),
            Err(QueryError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            check("balance ~ '^1'", ""),
            Err(QueryError::InvalidLiteralType { .. })
        ));
        assert!(check("balance > 10", "balance desc").is_ok());
    }

    #[test]
    fn test_should_load_policies_from_json_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"Order": {"total": {"denied": ["GT", "GE"]}, "note": {"sorting_disabled": true}}}"#,
        )
        .unwrap();
        let table = PolicyTable::from_json(&std::fs::read_to_string(file.path()).unwrap()).unwrap();

        let filtering = parse_filtering("total >= 100").unwrap();
        assert!(matches!(
            validate(filtering.as_ref(), None, &table, "Order"),
            Err(QueryError::OperationDenied {
                operation: FilterOperation::Ge,
                ..
            })
        ));
        let sorting = parse_sorting("note").unwrap();
        assert!(validate(None, Some(&sorting), &table, "Order").is_err());
        assert!(validate(filtering.as_ref(), Some(&sorting), &table, "User").is_ok());
    }
}
