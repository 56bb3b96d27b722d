//! Evaluates filter ASTs against in-memory records.
//!
//! Field paths are resolved one segment at a time through the [`Resolve`]
//! trait, so any [`Record`](querystack_core::Record) type or JSON document
//! can be filtered. Present optional values are unwrapped along the way.
//!
//! A [`PreparedFilter`] compiles every `~` pattern of a tree once so the same
//! filter can be applied to many records.

use std::collections::HashMap;

use querystack_core::{FieldRegistry, FieldValue, Resolve};
use querystack_model::{
    Filtering, LogicalOperator, LogicalOperatorType, NullCondition, NumberCondition,
    NumberConditionType, StringCondition, StringConditionType,
};
use regex::Regex;

use super::parser::parse_filtering;
use crate::error::{QueryError, QueryResult};

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Applies filters to records using the field accessors in a registry.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r FieldRegistry,
}

impl<'r> Evaluator<'r> {
    /// Create an evaluator backed by `registry`.
    #[must_use]
    pub fn new(registry: &'r FieldRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate `filtering` against `object`. An absent filter matches everything.
    ///
    /// Both sides of every logical operator are evaluated, so an error
    /// anywhere in the tree is reported even when the result is already known.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TypeMismatch`] when a field path cannot be
    /// resolved or holds the wrong type, and [`QueryError::Regex`] when a
    /// `~` pattern does not compile.
    pub fn evaluate(&self, filtering: Option<&Filtering>, object: &dyn Resolve) -> QueryResult<bool> {
        let Some(node) = filtering else {
            return Ok(true);
        };
        let patterns = compile_patterns(node)?;
        self.eval_node(node, &patterns, object)
    }

    /// Evaluate a prepared filter against `object`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TypeMismatch`] when a field path cannot be
    /// resolved or holds the wrong type.
    pub fn matches(&self, prepared: &PreparedFilter, object: &dyn Resolve) -> QueryResult<bool> {
        prepared
            .filtering
            .as_ref()
            .map_or(Ok(true), |node| self.eval_node(node, &prepared.patterns, object))
    }

    /// Parse `expression` and evaluate it against `object`.
    pub fn filter(&self, object: &dyn Resolve, expression: &str) -> QueryResult<bool> {
        let filtering = parse_filtering(expression)?;
        self.evaluate(filtering.as_ref(), object)
    }

    fn eval_node(
        &self,
        node: &Filtering,
        patterns: &Patterns,
        object: &dyn Resolve,
    ) -> QueryResult<bool> {
        match node {
            Filtering::Operator(op) => self.eval_operator(op, patterns, object),
            Filtering::StringCondition(cond) => self.eval_string(cond, patterns, object),
            Filtering::NumberCondition(cond) => self.eval_number(cond, object),
            Filtering::NullCondition(cond) => self.eval_null(cond, object),
        }
    }

    fn eval_operator(
        &self,
        op: &LogicalOperator,
        patterns: &Patterns,
        object: &dyn Resolve,
    ) -> QueryResult<bool> {
        let left = self.eval_node(&op.left, patterns, object)?;
        let right = self.eval_node(&op.right, patterns, object)?;
        let result = match op.op_type {
            LogicalOperatorType::And => left && right,
            LogicalOperatorType::Or => left || right,
        };
        Ok(result != op.is_negative)
    }

    fn eval_string(
        &self,
        cond: &StringCondition,
        patterns: &Patterns,
        object: &dyn Resolve,
    ) -> QueryResult<bool> {
        let result = match self.resolve(object, &cond.field_path)?.dereference() {
            FieldValue::Str(actual) => match cond.condition_type {
                StringConditionType::Eq => actual == cond.value,
                StringConditionType::Match => match patterns.get(&cond.value) {
                    Some(re) => re.is_match(actual),
                    None => Regex::new(&cond.value)?.is_match(actual),
                },
            },
            // An absent value satisfies no comparison.
            FieldValue::Optional(None) => false,
            other => return Err(wrong_kind(&cond.field_path, "a string", &other)),
        };
        Ok(result != cond.is_negative)
    }

    fn eval_number(&self, cond: &NumberCondition, object: &dyn Resolve) -> QueryResult<bool> {
        let value = self.resolve(object, &cond.field_path)?.dereference();
        let result = match value.as_f64() {
            Some(actual) => compare_f64(actual, cond.condition_type, cond.value),
            None if value.is_null() => false,
            None => return Err(wrong_kind(&cond.field_path, "a number", &value)),
        };
        Ok(result != cond.is_negative)
    }

    fn eval_null(&self, cond: &NullCondition, object: &dyn Resolve) -> QueryResult<bool> {
        let value = self.resolve(object, &cond.field_path)?;
        if !value.is_optional() {
            return Err(wrong_kind(&cond.field_path, "a nullable value", &value));
        }
        Ok(value.is_null() != cond.is_negative)
    }

    /// Walk `path` from `object`, unwrapping nested records.
    fn resolve<'a>(&self, object: &'a dyn Resolve, path: &[String]) -> QueryResult<FieldValue<'a>> {
        let Some((last, parents)) = path.split_last() else {
            return Err(mismatch(path, "empty field path".to_owned()));
        };

        let mut current = object;
        for segment in parents {
            let value = self.resolve_segment(current, path, segment)?;
            current = match value.dereference() {
                FieldValue::Record(next) => next,
                FieldValue::Optional(None) => {
                    return Err(mismatch(path, format!("'{segment}' is null")));
                }
                other => {
                    return Err(mismatch(
                        path,
                        format!("'{segment}' is {} and has no fields", other.kind()),
                    ));
                }
            };
        }
        self.resolve_segment(current, path, last)
    }

    fn resolve_segment<'a>(
        &self,
        object: &'a dyn Resolve,
        path: &[String],
        segment: &str,
    ) -> QueryResult<FieldValue<'a>> {
        object
            .resolve_field(self.registry, segment)
            .ok_or_else(|| mismatch(path, format!("unknown field '{segment}'")))
    }
}

// ---------------------------------------------------------------------------
// Prepared filters
// ---------------------------------------------------------------------------

/// Compiled `~` patterns keyed by their source text.
type Patterns = HashMap<String, Regex>;

/// A parsed filter with its `~` patterns compiled, ready to apply to many
/// records through [`Evaluator::matches`].
///
/// ```
/// use querystack_core::FieldRegistry;
/// use querystack_filter::{Evaluator, PreparedFilter};
///
/// let prepared = PreparedFilter::parse("name ~ '^J'").unwrap();
/// let registry = FieldRegistry::new();
/// let evaluator = Evaluator::new(&registry);
/// assert!(evaluator.matches(&prepared, &serde_json::json!({ "name": "Jan" })).unwrap());
/// assert!(!evaluator.matches(&prepared, &serde_json::json!({ "name": "Ann" })).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PreparedFilter {
    filtering: Option<Filtering>,
    patterns: Patterns,
}

impl PreparedFilter {
    /// Compile the patterns of `filtering`. `None` matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Regex`] when a `~` pattern does not compile.
    pub fn new(filtering: Option<Filtering>) -> QueryResult<Self> {
        let patterns = match &filtering {
            Some(node) => compile_patterns(node)?,
            None => Patterns::new(),
        };
        Ok(Self {
            filtering,
            patterns,
        })
    }

    /// Parse `expression` and compile its patterns.
    pub fn parse(expression: &str) -> QueryResult<Self> {
        Self::new(parse_filtering(expression)?)
    }

    /// The underlying tree, if any.
    #[must_use]
    pub fn filtering(&self) -> Option<&Filtering> {
        self.filtering.as_ref()
    }

    /// Number of distinct compiled patterns.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

fn compile_patterns(node: &Filtering) -> QueryResult<Patterns> {
    fn collect(node: &Filtering, patterns: &mut Patterns) -> QueryResult<()> {
        match node {
            Filtering::Operator(op) => {
                collect(&op.left, patterns)?;
                collect(&op.right, patterns)
            }
            Filtering::StringCondition(cond)
                if cond.condition_type == StringConditionType::Match
                    && !patterns.contains_key(&cond.value) =>
            {
                patterns.insert(cond.value.clone(), Regex::new(&cond.value)?);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    let mut patterns = Patterns::new();
    collect(node, &mut patterns)?;
    Ok(patterns)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[allow(clippy::float_cmp)]
fn compare_f64(actual: f64, op: NumberConditionType, expected: f64) -> bool {
    match op {
        NumberConditionType::Eq => actual == expected,
        NumberConditionType::Lt => actual < expected,
        NumberConditionType::Le => actual <= expected,
        NumberConditionType::Gt => actual > expected,
        NumberConditionType::Ge => actual >= expected,
    }
}

fn mismatch(path: &[String], message: String) -> QueryError {
    QueryError::TypeMismatch {
        field_path: path.join("."),
        message,
    }
}

fn wrong_kind(path: &[String], expected: &str, actual: &FieldValue<'_>) -> QueryError {
    mismatch(path, format!("expected {expected}, found {}", actual.kind()))
}

#[cfg(test)]
mod tests {
    use querystack_core::{AsFieldValue, FieldSet, Record};

    use super::*;

    struct Address {
        city: String,
        zip: Option<u32>,
    }

    impl Record for Address {
        fn describe(fields: &mut FieldSet<Self>) {
            fields
                .field("city", |a| a.city.as_field_value())
                .field("zip", |a| a.zip.as_field_value());
        }
    }

    struct User {
        first_name: String,
        middle_name: Option<String>,
        age: i32,
        score: f64,
        active: bool,
        address: Address,
        previous: Option<Address>,
    }

    impl Record for User {
        fn describe(fields: &mut FieldSet<Self>) {
            fields
                .tagged("first_name", "FirstName", |u| u.first_name.as_field_value())
                .field("middle_name", |u| u.middle_name.as_field_value())
                .field("age", |u| u.age.as_field_value())
                .field("score", |u| u.score.as_field_value())
                .field("active", |u| u.active.as_field_value())
                .field("address", |u| FieldValue::record(&u.address))
                .field("previous", |u| FieldValue::optional_record(u.previous.as_ref()));
        }
    }

    fn user() -> User {
        User {
            first_name: "Jan".to_owned(),
            middle_name: None,
            age: 42,
            score: 0.5,
            active: true,
            address: Address {
                city: "Kyiv".to_owned(),
                zip: Some(1001),
            },
            previous: None,
        }
    }

    fn check(expression: &str) -> QueryResult<bool> {
        let registry = FieldRegistry::new();
        Evaluator::new(&registry).filter(&user(), expression)
    }

    #[test]
    fn test_should_match_everything_without_filter() {
        let registry = FieldRegistry::new();
        let evaluator = Evaluator::new(&registry);
        assert!(evaluator.evaluate(None, &user()).unwrap());
        assert!(evaluator.filter(&user(), "  ").unwrap());
    }

    #[test]
    fn test_should_match_mirrored_values() {
        assert!(check("first_name == 'Jan'").unwrap());
        assert!(check("age == 42 and score == 0.5").unwrap());
        assert!(check("address.city == 'Kyiv' and address.zip >= 1000").unwrap());
        assert!(check("middle_name == null and previous == null").unwrap());
    }

    #[test]
    fn test_should_flip_result_when_leaf_negated() {
        assert!(!check("first_name != 'Jan'").unwrap());
        assert!(!check("not age == 42").unwrap());
        assert!(!check("address.zip == null").unwrap());
        assert!(check("first_name != 'Ann'").unwrap());
    }

    #[test]
    fn test_should_compare_numbers() {
        assert!(check("age > 41 and age < 43 and age <= 42 and age >= 42").unwrap());
        assert!(!check("age > 42").unwrap());
        assert!(check("score < 1").unwrap());
    }

    #[test]
    fn test_should_match_regex() {
        assert!(check("first_name ~ '^J.n$'").unwrap());
        assert!(check("first_name !~ '^A'").unwrap());
        assert!(!check("address.city ~ 'Lviv'").unwrap());
    }

    #[test]
    fn test_should_surface_invalid_regex() {
        assert!(matches!(check("first_name ~ '11[1'"), Err(QueryError::Regex(_))));
    }

    #[test]
    fn test_should_reject_wrong_literal_type() {
        let err = check("first_name == 123").unwrap_err();
        assert!(matches!(
            err,
            QueryError::TypeMismatch { ref field_path, .. } if field_path == "first_name"
        ));
        assert!(matches!(check("age == '42'"), Err(QueryError::TypeMismatch { .. })));
        assert!(matches!(check("active == 'yes'"), Err(QueryError::TypeMismatch { .. })));
    }

    #[test]
    fn test_should_keep_type_mismatch_under_negation() {
        for (expression, path) in [
            ("first_name != 123", "first_name"),
            ("not age == '42'", "age"),
            ("not first_name < 3", "first_name"),
            ("first_name != null", "first_name"),
            ("not (age == 42 and address.city > 1)", "address.city"),
            ("address.city !~ 'K' and not active ~ 'y'", "active"),
        ] {
            let err = check(expression).unwrap_err();
            assert!(
                matches!(err, QueryError::TypeMismatch { ref field_path, .. } if field_path == path),
                "{expression}: {err}"
            );
        }
    }

    #[test]
    fn test_should_compare_small_numbers_exactly() {
        let doc = serde_json::json!({ "x": 2e-20 });
        let registry = FieldRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let tiny = "0.00000000000000000001";
        assert!(!evaluator.filter(&doc, &format!("x == {tiny}")).unwrap());
        assert!(!evaluator.filter(&doc, &format!("x <= {tiny}")).unwrap());
        assert!(evaluator.filter(&doc, &format!("x != {tiny}")).unwrap());
        assert!(evaluator.filter(&doc, "x == 0.00000000000000000002").unwrap());
        assert!(evaluator.filter(&doc, "x >= 0.00000000000000000002").unwrap());
    }

    #[test]
    fn test_should_reuse_prepared_patterns() {
        let prepared =
            PreparedFilter::parse("first_name ~ '^J' or address.city ~ '^J' or age < 0").unwrap();
        assert_eq!(prepared.pattern_count(), 1);

        let registry = FieldRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let mut u = user();
        assert!(evaluator.matches(&prepared, &u).unwrap());
        u.first_name = "Ann".to_owned();
        assert!(!evaluator.matches(&prepared, &u).unwrap());
        assert!(evaluator.matches(&PreparedFilter::default(), &u).unwrap());
    }

    #[test]
    fn test_should_reject_invalid_pattern_when_preparing() {
        assert!(matches!(
            PreparedFilter::parse("age > 1 or first_name ~ '('"),
            Err(QueryError::Regex(_))
        ));
    }

    #[test]
    fn test_should_refuse_overly_deep_filters() {
        let expression = vec!["age == 42"; 20_000].join(" and ");
        assert!(matches!(check(&expression), Err(QueryError::NestingTooDeep { .. })));
        let expression = vec!["age == 42"; 32].join(" and ");
        assert!(check(&expression).unwrap());
    }

    #[test]
    fn test_should_reject_null_check_on_required_field() {
        assert!(matches!(
            check("first_name == null"),
            Err(QueryError::TypeMismatch { ref field_path, .. }) if field_path == "first_name"
        ));
    }

    #[test]
    fn test_should_reject_unresolvable_paths() {
        for (expression, path) in [
            ("last_name == 'x'", "last_name"),
            ("previous.city == 'x'", "previous.city"),
            ("age.value == 1", "age.value"),
            ("address.street == 'x'", "address.street"),
        ] {
            let err = check(expression).unwrap_err();
            assert!(
                matches!(err, QueryError::TypeMismatch { ref field_path, .. } if field_path == path),
                "{expression}: {err}"
            );
        }
    }

    #[test]
    fn test_should_resolve_member_names_case_insensitively() {
        assert!(check("FIRSTNAME == 'Jan'").unwrap());
    }

    #[test]
    fn test_should_treat_absent_values_as_non_matching() {
        let mut u = user();
        u.address.zip = None;
        let registry = FieldRegistry::new();
        let evaluator = Evaluator::new(&registry);
        assert!(!evaluator.filter(&u, "address.zip > 0").unwrap());
        assert!(evaluator.filter(&u, "address.zip != 1001").unwrap());
    }

    #[test]
    fn test_should_evaluate_both_sides_of_operators() {
        assert!(matches!(
            check("age == 42 or last_name == 'x'"),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            check("age == 0 and first_name ~ '('"),
            Err(QueryError::Regex(_))
        ));
    }

    #[test]
    fn test_should_apply_negated_groups() {
        let doc = serde_json::json!({ "a": "x", "b": "z", "c": 5 });
        let registry = FieldRegistry::new();
        let evaluator = Evaluator::new(&registry);
        assert!(
            !evaluator
                .filter(&doc, "(a == 'x' or b == 'y') and not c == 5")
                .unwrap()
        );
        assert!(evaluator.filter(&doc, "not (a == 'y' or b == 'y')").unwrap());
    }

    #[test]
    fn test_should_filter_json_documents() {
        let doc = serde_json::json!({
            "name": "Jan",
            "age": 42,
            "manager": null,
            "address": { "city": "Kyiv" },
        });
        let registry = FieldRegistry::new();
        let evaluator = Evaluator::new(&registry);
        assert!(evaluator.filter(&doc, "name == 'Jan' and age > 40").unwrap());
        assert!(evaluator.filter(&doc, "manager == null and address != null").unwrap());
        assert!(evaluator.filter(&doc, "address.city ~ '^K'").unwrap());
        assert!(!evaluator.filter(&doc, "manager == 'x'").unwrap());
        assert!(matches!(
            evaluator.filter(&doc, "manager.name == 'x'"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }
}
