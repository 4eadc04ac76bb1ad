//! Helpers over [`serde_json::Value`] implementing JSON Schema's typed
//! equality and instance-type tagging.
//!
//! The engine works directly on `serde_json::Value` rather than a bespoke
//! value type with parent/key back-references: every scope already carries
//! its instance location as a JSON pointer (see [`crate::scope`]), which
//! gives the same path information the parent-chain would, without a second
//! owning tree shadowing the instance document.

use schema_core::number;
use serde_json::Value;

/// The seven JSON Schema instance types, plus the `"integer"` refinement of
/// `"number"` used by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl InstanceType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => InstanceType::Null,
            Value::Bool(_) => InstanceType::Boolean,
            Value::Object(_) => InstanceType::Object,
            Value::Array(_) => InstanceType::Array,
            Value::String(_) => InstanceType::String,
            Value::Number(n) => {
                if is_integer(n) {
                    InstanceType::Integer
                } else {
                    InstanceType::Number
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Object => "object",
            InstanceType::Array => "array",
            InstanceType::Number => "number",
            InstanceType::String => "string",
            InstanceType::Integer => "integer",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "null" => InstanceType::Null,
            "boolean" => InstanceType::Boolean,
            "object" => InstanceType::Object,
            "array" => InstanceType::Array,
            "number" => InstanceType::Number,
            "string" => InstanceType::String,
            "integer" => InstanceType::Integer,
            _ => return None,
        })
    }

}

fn is_integer(n: &serde_json::Number) -> bool {
    if let Some(i) = n.as_i64() {
        let _ = i;
        return true;
    }
    if let Some(u) = n.as_u64() {
        let _ = u;
        return true;
    }
    if let Some(f) = n.as_f64() {
        return f.fract() == 0.0 && f.is_finite();
    }
    false
}

/// Whether `value`'s declared instance type (per the `type` keyword)
/// matches `declared`, allowing a whole-valued `number` to satisfy
/// `"integer"`.
pub fn instance_type_matches(value: &Value, declared: InstanceType) -> bool {
    let actual = InstanceType::of(value);
    if actual == declared {
        return true;
    }
    if declared == InstanceType::Integer && actual == InstanceType::Number {
        if let Value::Number(n) = value {
            return is_integer(n);
        }
    }
    false
}

/// JSON Schema equality: structurally equal, with
/// numbers of differing representational kind compared arithmetically
/// (`1` equals `1.0`), and booleans never equal to numbers.
pub fn schema_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Bool(_), Value::Number(_)) | (Value::Number(_), Value::Bool(_)) => false,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(xi, yi)| schema_equal(xi, yi))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|yv| schema_equal(v, yv)))
        }
        _ => false,
    }
}

fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    match (number::from_json_number(a), number::from_json_number(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Counts Unicode code points, per the `maxLength`/`minLength` requirement
/// that length is measured in characters, not UTF-8 bytes or UTF-16 units.
pub fn code_point_len(s: &str) -> usize {
    s.chars().count()
}

pub fn kind_name(value: &Value) -> &'static str {
    InstanceType::of(value).name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_and_float_are_schema_equal() {
        assert!(schema_equal(&json!(1), &json!(1.0)));
    }

    #[test]
    fn bool_never_equals_number() {
        assert!(!schema_equal(&json!(true), &json!(1)));
        assert!(!schema_equal(&json!(false), &json!(0)));
    }

    #[test]
    fn arrays_compare_elementwise() {
        assert!(schema_equal(&json!([1, 2.0]), &json!([1.0, 2])));
        assert!(!schema_equal(&json!([1, 2]), &json!([1, 3])));
    }

    #[test]
    fn objects_compare_regardless_of_key_order() {
        assert!(schema_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
    }

    #[test]
    fn whole_valued_float_satisfies_integer_type() {
        assert!(instance_type_matches(&json!(4.0), InstanceType::Integer));
        assert!(!instance_type_matches(&json!(4.5), InstanceType::Integer));
    }

    #[test]
    fn code_points_not_bytes() {
        assert_eq!(code_point_len("héllo"), 5);
    }
}
