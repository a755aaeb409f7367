//! Typed structured-query selector.
//!
//! A selector is a conjunction of `(field, operator, value)` conditions over
//! top-level fields of a stored JSON document. It renders to the
//! `{"selector": {...}}` query form understood by document-store ledgers and
//! can also be evaluated locally.

use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    /// Field value (or any element of an array field) is one of the listed
    /// values.
    In,
    Gte,
    Lte,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::In => "$in",
            Self::Gte => "$gte",
            Self::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    fn matches(&self, document: &Value) -> bool {
        let Some(actual) = document.get(self.field.as_str()) else {
            return false;
        };
        match self.operator {
            Operator::Eq => compare(actual, &self.value) == Some(Ordering::Equal),
            Operator::In => {
                let Value::Array(candidates) = &self.value else {
                    return false;
                };
                let contains = |item: &Value| {
                    candidates
                        .iter()
                        .any(|candidate| compare(item, candidate) == Some(Ordering::Equal))
                };
                match actual {
                    Value::Array(items) => items.iter().any(contains),
                    scalar => contains(scalar),
                }
            }
            Operator::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Conjunction of conditions, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    conditions: Vec<Condition>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn field_in<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        self.condition(field, Operator::In, Value::Array(values))
    }

    pub fn field_gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, Operator::Gte, value)
    }

    pub fn field_lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, Operator::Lte, value)
    }

    /// True when every condition holds for `document`.
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(document))
    }

    /// Renders `{"selector": {field: {op: value, ...}, ...}}`.
    ///
    /// Conditions on the same field share one operator object.
    pub fn to_query(&self) -> Value {
        let mut fields = Map::new();
        for condition in &self.conditions {
            let entry = fields
                .entry(condition.field.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(operators) = entry {
                operators.insert(
                    condition.operator.as_str().to_string(),
                    condition.value.clone(),
                );
            }
        }
        let mut query = Map::new();
        query.insert("selector".to_string(), Value::Object(fields));
        Value::Object(query)
    }

    pub fn to_query_string(&self) -> String {
        self.to_query().to_string()
    }
}

// Numbers compare numerically, strings lexically, booleans by value.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
                return Some(left.cmp(&right));
            }
            if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
                return Some(left.cmp(&right));
            }
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Operator, Selector};
    use serde_json::json;

    #[test]
    fn renders_grouped_query() {
        let selector = Selector::new()
            .field_in("isoNumbers", ["A123"])
            .field_gte("createdAtUTC", 100u64)
            .field_lte("createdAtUTC", 200u64);
        assert_eq!(
            selector.to_query(),
            json!({
                "selector": {
                    "isoNumbers": {"$in": ["A123"]},
                    "createdAtUTC": {"$gte": 100, "$lte": 200}
                }
            })
        );
    }

    #[test]
    fn in_matches_array_membership_and_scalars() {
        let selector = Selector::new().field_in("isoNumbers", ["A123"]);
        assert!(selector.matches(&json!({"isoNumbers": ["Z", "A123"]})));
        assert!(!selector.matches(&json!({"isoNumbers": ["Z"]})));
        assert!(!selector.matches(&json!({"isoNumbers": []})));
        assert!(!selector.matches(&json!({"other": ["A123"]})));

        let scalar = Selector::new().field_in("premiseId", ["P1", "P2"]);
        assert!(scalar.matches(&json!({"premiseId": "P2"})));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let selector = Selector::new()
            .field_gte("createdAtUTC", 100u64)
            .field_lte("createdAtUTC", 200u64);
        assert!(selector.matches(&json!({"createdAtUTC": 100})));
        assert!(selector.matches(&json!({"createdAtUTC": 200})));
        assert!(!selector.matches(&json!({"createdAtUTC": 99})));
        assert!(!selector.matches(&json!({"createdAtUTC": 201})));
        assert!(!selector.matches(&json!({"createdAtUTC": "150"})));
    }

    #[test]
    fn empty_selector_matches_everything() {
        assert!(Selector::new().matches(&json!({})));
        assert_eq!(Selector::new().to_query_string(), r#"{"selector":{}}"#);
    }

    #[test]
    fn eq_condition_via_generic_builder() {
        let selector = Selector::new().condition("revoked", Operator::Eq, true);
        assert!(selector.matches(&json!({"revoked": true})));
        assert!(!selector.matches(&json!({"revoked": false})));
    }
}
