//! Field rules shared by the user schemas.
//!
//! Each rule both checks and normalizes one field (trimming, lowercasing,
//! numeric coercion). A [`Schema`] is a table of rules with a presence flag,
//! so the create and update schemas are declared side by side and can only
//! differ in which fields are required.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::{ValidateEmail, ValidationError, ValidationErrors};

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;
pub const AGE_MIN: i64 = 0;
pub const AGE_MAX: i64 = 150;

/// Path used when the payload itself is not an object.
pub const BODY_PATH: &str = "body";

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text { min_len: usize, max_len: usize },
    Email,
    Integer { min: i64, max: i64 },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: FieldKind,
}

pub const NAME: FieldRule = FieldRule {
    field: "name",
    kind: FieldKind::Text {
        min_len: NAME_MIN_LEN,
        max_len: NAME_MAX_LEN,
    },
};

pub const EMAIL: FieldRule = FieldRule {
    field: "email",
    kind: FieldKind::Email,
};

pub const AGE: FieldRule = FieldRule {
    field: "age",
    kind: FieldKind::Integer {
        min: AGE_MIN,
        max: AGE_MAX,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub fields: &'static [(FieldRule, Presence)],
}

pub const CREATE_USER: Schema = Schema {
    fields: &[
        (NAME, Presence::Required),
        (EMAIL, Presence::Required),
        (AGE, Presence::Optional),
    ],
};

pub const UPDATE_USER: Schema = Schema {
    fields: &[
        (NAME, Presence::Optional),
        (EMAIL, Presence::Optional),
        (AGE, Presence::Optional),
    ],
};

impl FieldRule {
    /// Checks one present value and returns its normalized form.
    pub fn check(&self, value: &Value) -> Result<Value, ValidationError> {
        let field = self.field;
        match self.kind {
            FieldKind::Text { min_len, max_len } => {
                let text = expect_string(field, value)?.trim();
                let len = text.chars().count();
                if len == 0 {
                    return Err(violation(
                        "string.empty",
                        format!("\"{}\" is not allowed to be empty", field),
                    ));
                }
                if len < min_len {
                    return Err(violation(
                        "string.min",
                        format!(
                            "\"{}\" length must be at least {} characters long",
                            field, min_len
                        ),
                    ));
                }
                if len > max_len {
                    return Err(violation(
                        "string.max",
                        format!(
                            "\"{}\" length must be less than or equal to {} characters long",
                            field, max_len
                        ),
                    ));
                }
                Ok(Value::String(text.to_string()))
            }
            FieldKind::Email => {
                let email = expect_string(field, value)?.trim().to_lowercase();
                if email.is_empty() {
                    return Err(violation(
                        "string.empty",
                        format!("\"{}\" is not allowed to be empty", field),
                    ));
                }
                if !is_email(&email) {
                    return Err(violation(
                        "string.email",
                        format!("\"{}\" must be a valid email", field),
                    ));
                }
                Ok(Value::String(email))
            }
            FieldKind::Integer { min, max } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite());

                let Some(number) = number else {
                    return Err(violation(
                        "number.base",
                        format!("\"{}\" must be a number", field),
                    ));
                };
                if number.fract() != 0.0 {
                    return Err(violation(
                        "number.integer",
                        format!("\"{}\" must be an integer", field),
                    ));
                }
                if number < min as f64 {
                    return Err(violation(
                        "number.min",
                        format!("\"{}\" must be greater than or equal to {}", field, min),
                    ));
                }
                if number > max as f64 {
                    return Err(violation(
                        "number.max",
                        format!("\"{}\" must be less than or equal to {}", field, max),
                    ));
                }
                Ok(Value::from(number as i64))
            }
        }
    }
}

impl Schema {
    /// Validates `input` against every rule in the table, collecting all
    /// violations. Unknown keys are dropped from the normalized output.
    pub fn apply(&self, input: &Value) -> Result<Map<String, Value>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let Some(object) = input.as_object() else {
            errors.add(
                BODY_PATH,
                violation("object.base", "\"value\" must be of type object".to_string()),
            );
            return Err(errors);
        };

        let mut normalized = Map::new();
        for (rule, presence) in self.fields {
            match object.get(rule.field) {
                Some(value) => match rule.check(value) {
                    Ok(clean) => {
                        normalized.insert(rule.field.to_string(), clean);
                    }
                    Err(err) => errors.add(rule.field, err),
                },
                None if *presence == Presence::Required => errors.add(
                    rule.field,
                    violation("any.required", format!("\"{}\" is required", rule.field)),
                ),
                None => {}
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }

    /// Validates and deserializes into a typed payload.
    pub fn parse<T: DeserializeOwned>(&self, input: &Value) -> crate::error::Result<T> {
        let normalized = self.apply(input)?;
        Ok(serde_json::from_value(Value::Object(normalized))?)
    }

    fn position(&self, path: &str) -> usize {
        if path == BODY_PATH {
            return 0;
        }
        self.fields
            .iter()
            .position(|(rule, _)| rule.field == path)
            .map_or(usize::MAX, |idx| idx + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    pub path: String,
    pub message: String,
}

/// Flattens validator errors into the `errors` list of the response envelope,
/// in schema order.
pub fn violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut list: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let path = field.to_string();
            errs.iter().map(move |err| FieldViolation {
                path: path.clone(),
                message: err
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            })
        })
        .collect();

    list.sort_by(|a, b| {
        CREATE_USER
            .position(&a.path)
            .cmp(&CREATE_USER.position(&b.path))
            .then_with(|| a.path.cmp(&b.path))
    });
    list
}

fn expect_string<'a>(field: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| violation("string.base", format!("\"{}\" must be a string", field)))
}

/// The validator crate accepts bare hosts such as `a@localhost`; a dotted
/// domain is required on top of that.
fn is_email(email: &str) -> bool {
    let has_dotted_domain = email
        .rsplit_once('@')
        .map(|(_, domain)| {
            domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        })
        .unwrap_or(false);
    has_dotted_domain && email.validate_email()
}

fn violation(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(errors: &ValidationErrors) -> Vec<String> {
        violations(errors).into_iter().map(|v| v.path).collect()
    }

    #[test]
    fn name_length_boundaries_are_inclusive() {
        for (len, ok) in [(1, false), (2, true), (50, true), (51, false)] {
            let name = "x".repeat(len);
            let result = CREATE_USER.apply(&json!({ "name": name, "email": "a@b.com" }));
            assert_eq!(result.is_ok(), ok, "name of length {}", len);
        }
    }

    #[test]
    fn name_is_trimmed_before_length_check() {
        let out = CREATE_USER
            .apply(&json!({ "name": "  Jo  ", "email": "a@b.com" }))
            .unwrap();
        assert_eq!(out["name"], "Jo");

        let err = CREATE_USER
            .apply(&json!({ "name": " J ", "email": "a@b.com" }))
            .unwrap_err();
        assert_eq!(paths(&err), vec!["name"]);
    }

    #[test]
    fn age_range_boundaries_are_inclusive() {
        for (age, ok) in [(-1, false), (0, true), (150, true), (151, false)] {
            let result = UPDATE_USER.apply(&json!({ "age": age }));
            assert_eq!(result.is_ok(), ok, "age {}", age);
        }
    }

    #[test]
    fn age_is_coerced_from_numeric_strings_and_whole_floats() {
        let out = UPDATE_USER.apply(&json!({ "age": "42" })).unwrap();
        assert_eq!(out["age"], json!(42));

        let out = UPDATE_USER.apply(&json!({ "age": 30.0 })).unwrap();
        assert_eq!(out["age"], json!(30));
    }

    #[test]
    fn age_rejects_fractions_and_non_numbers() {
        let err = UPDATE_USER.apply(&json!({ "age": 30.5 })).unwrap_err();
        assert_eq!(violations(&err)[0].message, "\"age\" must be an integer");

        let err = UPDATE_USER.apply(&json!({ "age": true })).unwrap_err();
        assert_eq!(violations(&err)[0].message, "\"age\" must be a number");

        assert!(UPDATE_USER.apply(&json!({ "age": null })).is_err());
    }

    #[test]
    fn email_is_lowercased() {
        let out = CREATE_USER
            .apply(&json!({ "name": "Jo", "email": " A@B.com " }))
            .unwrap();
        assert_eq!(out["email"], "a@b.com");
    }

    #[test]
    fn email_shape_is_enforced() {
        for bad in ["plainaddress", "a@localhost", "@b.com", "a@b.", "a b@c.com"] {
            let result = UPDATE_USER.apply(&json!({ "email": bad }));
            assert!(result.is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn every_violation_is_reported_in_schema_order() {
        let err = CREATE_USER
            .apply(&json!({ "age": 500, "email": "nope", "name": 7 }))
            .unwrap_err();
        assert_eq!(paths(&err), vec!["name", "email", "age"]);
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let err = CREATE_USER.apply(&json!({})).unwrap_err();
        let list = violations(&err);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].message, "\"name\" is required");
        assert_eq!(list[1].message, "\"email\" is required");
    }

    #[test]
    fn update_schema_accepts_empty_object() {
        assert!(UPDATE_USER.apply(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn unknown_fields_are_stripped() {
        let out = CREATE_USER
            .apply(&json!({ "name": "Jo", "email": "a@b.com", "role": "admin" }))
            .unwrap();
        assert!(!out.contains_key("role"));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn non_object_body_is_a_single_violation() {
        let err = CREATE_USER.apply(&json!(["Jo"])).unwrap_err();
        assert_eq!(paths(&err), vec![BODY_PATH]);
    }

    #[test]
    fn schemas_share_field_rules() {
        let create: Vec<_> = CREATE_USER.fields.iter().map(|(r, _)| r.field).collect();
        let update: Vec<_> = UPDATE_USER.fields.iter().map(|(r, _)| r.field).collect();
        assert_eq!(create, update);
        assert!(UPDATE_USER
            .fields
            .iter()
            .all(|(_, presence)| *presence == Presence::Optional));
    }
}
