use std::cmp::Ordering;

use serde_json::Value;

use super::store::Document;

/// A single predicate on one field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value. A missing field equals `null`.
    Eq(Value),
    /// Field is less than or equal to the value (`$lte`)
    Lte(Value),
    /// Field is greater than or equal to the value (`$gte`)
    Gte(Value),
    /// Field equals one of the values (`$in`)
    In(Vec<Value>),
}

/// Conjunction of field predicates, the query language shared by all backends.
///
/// Range conditions are only defined between two strings (compared
/// lexicographically) or two numbers. Any other pairing never matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    pub fn lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Condition::Lte(value.into())));
        self
    }

    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Condition::Gte(value.into())));
        self
    }

    pub fn is_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((field.to_string(), Condition::In(values)));
        self
    }

    pub fn clauses(&self) -> &[(String, Condition)] {
        &self.clauses
    }

    /// Evaluate the filter against a document in process.
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|(field, condition)| {
            let actual = document.get(field).unwrap_or(&Value::Null);
            match condition {
                Condition::Eq(expected) => actual == expected,
                Condition::Lte(bound) => {
                    matches!(compare(actual, bound), Some(Ordering::Less | Ordering::Equal))
                }
                Condition::Gte(bound) => {
                    matches!(compare(actual, bound), Some(Ordering::Greater | Ordering::Equal))
                }
                Condition::In(values) => values.iter().any(|v| v == actual),
            }
        })
    }
}

/// Order two scalar values of the same kind. Mixed kinds are incomparable.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_date_strings_compare_lexicographically() {
        let job = doc(json!({"status": "open", "end_date": "2023-01-01"}));

        assert!(Filter::new().lte("end_date", "2023-06-01").matches(&job));
        assert!(Filter::new().lte("end_date", "2023-01-01").matches(&job));
        assert!(!Filter::new().lte("end_date", "2022-12-31").matches(&job));
        assert!(Filter::new().gte("end_date", "2022-12-31").matches(&job));
    }

    #[test]
    fn test_range_across_types_never_matches() {
        let job = doc(json!({"end_date": 20230101}));

        assert!(!Filter::new().lte("end_date", "2023-06-01").matches(&job));
        assert!(!Filter::new().gte("end_date", "2023-06-01").matches(&job));
        assert!(Filter::new().lte("end_date", 20230601).matches(&job));
    }

    #[test]
    fn test_missing_field_equals_null_only() {
        let job = doc(json!({"status": "open"}));

        assert!(Filter::new().eq("assigned_hr", Value::Null).matches(&job));
        assert!(!Filter::new().eq("assigned_hr", "hr-1").matches(&job));
        assert!(!Filter::new().lte("end_date", "2099-01-01").matches(&job));
    }

    #[test]
    fn test_in_and_conjunction() {
        let candidate = doc(json!({"job_id": "jb001", "status": "placed"}));
        let qualifying = ["interview_selected", "placed"];

        assert!(Filter::new()
            .eq("job_id", "jb001")
            .is_in("status", qualifying)
            .matches(&candidate));
        assert!(!Filter::new()
            .eq("job_id", "jb002")
            .is_in("status", qualifying)
            .matches(&candidate));
        assert!(!Filter::new()
            .eq("job_id", "jb001")
            .is_in("status", Vec::<String>::new())
            .matches(&candidate));
    }
}
