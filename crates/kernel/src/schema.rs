//! Field-rule validation for JSON payloads.
//!
//! A schema is a static slice of [`FieldRule`]s. [`validate`] walks the slice
//! in declaration order and collects one message per violated rule; it never
//! stops at the first failure. Properties the schema does not name are
//! ignored.

use serde_json::Value;

/// JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => as_integral(value).is_some(),
        }
    }
}

/// A JSON number with no fractional part, widened to `f64`.
///
/// `264` and `264.0` are the same integer on the wire.
fn as_integral(value: &Value) -> Option<f64> {
    if value.is_i64() || value.is_u64() {
        return value.as_f64();
    }
    value.as_f64().filter(|number| number.fract() == 0.0)
}

/// Named string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Absolute URI with a scheme.
    Uri,
}

impl Format {
    fn name(&self) -> &'static str {
        match self {
            Format::Uri => "uri",
        }
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            // The WHATWG parser percent-encodes whitespace instead of failing.
            Format::Uri => {
                !value.chars().any(|c| c.is_whitespace() || c.is_control())
                    && url::Url::parse(value).is_ok()
            }
        }
    }
}

/// Constraints on a single property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub field_type: FieldType,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<i64>,
    pub format: Option<Format>,
}

impl FieldRule {
    /// A required string property with no further constraints.
    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    /// A required integer property with no further constraints.
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            required: true,
            field_type,
            min_length: None,
            max_length: None,
            minimum: None,
            format: None,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub const fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub const fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    pub const fn minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub const fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    fn check(&self, value: &Value, violations: &mut Vec<String>) {
        let path = format!("instance.{}", self.name);

        if !self.field_type.matches(value) {
            violations.push(format!(
                "{path} is not of a type(s) {}",
                self.field_type.type_name()
            ));
            return;
        }

        if let Value::String(text) = value {
            let length = text.chars().count();
            if let Some(min) = self.min_length.filter(|min| length < *min) {
                violations.push(format!("{path} does not meet minimum length of {min}"));
            }
            if let Some(max) = self.max_length.filter(|max| length > *max) {
                violations.push(format!("{path} does not meet maximum length of {max}"));
            }
            if let Some(format) = self.format.filter(|format| !format.accepts(text)) {
                violations.push(format!(
                    "{path} does not conform to the \"{}\" format",
                    format.name()
                ));
            }
        }

        if let (Some(minimum), Some(number)) = (self.minimum, as_integral(value)) {
            if number < minimum as f64 {
                violations.push(format!(
                    "{path} must be greater than or equal to {minimum}"
                ));
            }
        }
    }
}

/// Rewrite integral floats (`264.0`) held by integer fields as plain
/// integers so they decode into integer types. Values outside `i64` are left
/// untouched.
pub fn normalize_integers(instance: &mut Value, rules: &[FieldRule]) {
    let Some(object) = instance.as_object_mut() else {
        return;
    };

    for rule in rules.iter().filter(|r| r.field_type == FieldType::Integer) {
        let Some(value) = object.get_mut(rule.name) else {
            continue;
        };
        if value.is_i64() || value.is_u64() {
            continue;
        }
        if let Some(number) = as_integral(value) {
            if number >= i64::MIN as f64 && number < i64::MAX as f64 {
                *value = Value::from(number as i64);
            }
        }
    }
}

/// Validate `instance` against `rules`.
///
/// Returns every violation message in rule order. Within one field the type
/// check runs first; a wrong type suppresses that field's remaining checks.
pub fn validate(instance: &Value, rules: &[FieldRule]) -> Result<(), Vec<String>> {
    let Some(object) = instance.as_object() else {
        return Err(vec!["instance is not of a type(s) object".to_string()]);
    };

    let mut violations = Vec::new();
    for rule in rules {
        match object.get(rule.name) {
            Some(value) => rule.check(value, &mut violations),
            None if rule.required => {
                violations.push(format!("instance requires property \"{}\"", rule.name));
            }
            None => {}
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: &[FieldRule] = &[
        FieldRule::string("code").min_length(2).max_length(4),
        FieldRule::string("link").format(Format::Uri),
        FieldRule::integer("count").minimum(0),
        FieldRule::string("note").optional(),
    ];

    #[test]
    fn accepts_valid_instance_and_ignores_unknown_properties() {
        let instance = json!({
            "code": "ab",
            "link": "https://example.com/x",
            "count": 0,
            "extra": [1, 2, 3]
        });
        assert_eq!(validate(&instance, RULES), Ok(()));
    }

    #[test]
    fn collects_every_violation_in_rule_order() {
        let instance = json!({
            "code": "abcdef",
            "link": "not a uri",
            "count": -1
        });
        assert_eq!(
            validate(&instance, RULES),
            Err(vec![
                "instance.code does not meet maximum length of 4".to_string(),
                "instance.link does not conform to the \"uri\" format".to_string(),
                "instance.count must be greater than or equal to 0".to_string(),
            ])
        );
    }

    #[test]
    fn missing_required_properties_are_reported_but_optional_are_not() {
        assert_eq!(
            validate(&json!({}), RULES),
            Err(vec![
                "instance requires property \"code\"".to_string(),
                "instance requires property \"link\"".to_string(),
                "instance requires property \"count\"".to_string(),
            ])
        );
    }

    #[test]
    fn wrong_type_suppresses_remaining_checks() {
        let instance = json!({
            "code": 12,
            "link": null,
            "count": 1.5,
            "note": false
        });
        assert_eq!(
            validate(&instance, RULES),
            Err(vec![
                "instance.code is not of a type(s) string".to_string(),
                "instance.link is not of a type(s) string".to_string(),
                "instance.count is not of a type(s) integer".to_string(),
                "instance.note is not of a type(s) string".to_string(),
            ])
        );
    }

    #[test]
    fn uri_with_whitespace_or_control_characters_is_rejected() {
        for link in ["http://a.co/a b", "http://a.co/\tx", "http://a.co/\u{7f}"] {
            let instance = json!({ "code": "ab", "link": link, "count": 1 });
            assert_eq!(
                validate(&instance, RULES),
                Err(vec![
                    "instance.link does not conform to the \"uri\" format".to_string()
                ]),
                "{link:?} should not be a uri"
            );
        }
    }

    #[test]
    fn integral_floats_count_as_integers() {
        let instance = json!({ "code": "ab", "link": "http://a.co/x", "count": 264.0 });
        assert_eq!(validate(&instance, RULES), Ok(()));

        let negative = json!({ "code": "ab", "link": "http://a.co/x", "count": -2.0 });
        assert_eq!(
            validate(&negative, RULES),
            Err(vec![
                "instance.count must be greater than or equal to 0".to_string()
            ])
        );
    }

    #[test]
    fn normalize_rewrites_integral_floats_only() {
        let mut instance = json!({ "code": "ab", "count": 264.0 });
        normalize_integers(&mut instance, RULES);
        assert!(instance["count"].is_i64());
        assert_eq!(instance["count"], 264);

        let mut huge = json!({ "count": 1e300 });
        normalize_integers(&mut huge, RULES);
        assert!(huge["count"].is_f64());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let instance = json!({ "code": "éé", "link": "urn:isbn:0451450523", "count": 3 });
        assert_eq!(validate(&instance, RULES), Ok(()));
    }

    #[test]
    fn non_object_instance_is_rejected() {
        assert_eq!(
            validate(&json!([1, 2]), RULES),
            Err(vec!["instance is not of a type(s) object".to_string()])
        );
    }
}
