//! Schema Validator — declarative field descriptors for flow inputs and outputs.
//!
//! A `Schema` is built once when the catalog is assembled and never mutated
//! afterwards. `validate()` is pure: it reads a loosely-typed JSON value and
//! returns a new map holding only the declared fields, or every field-level
//! failure it found.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Typed result of a successful validation — only declared fields survive.
pub type FlowValue = Map<String, Value>;

// ────────────────────────────────────────────────────────────────────────────
// Descriptors
// ────────────────────────────────────────────────────────────────────────────

/// Primitive kind of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    StringArray,
    Enum(Vec<&'static str>),
    Object(Schema),
}

/// One field of a schema. `description` is guidance for the model only.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl Field {
    pub fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// "If `field` is present, `requires` must be present too."
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub field: &'static str,
    pub requires: &'static str,
}

/// An object shape: ordered fields plus optional presence dependencies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
    dependencies: Vec<Dependency>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            dependencies: Vec::new(),
        }
    }

    /// A schema with no fields. Any object validates to an empty map.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_dependency(mut self, field: &'static str, requires: &'static str) -> Self {
        self.dependencies.push(Dependency { field, requires });
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Renders the descriptor tree as a JSON Schema document for model guidance.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut property = match &field.kind {
                FieldKind::String => json!({ "type": "string" }),
                FieldKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
                FieldKind::Enum(literals) => json!({ "type": "string", "enum": literals }),
                FieldKind::Object(nested) => nested.to_json_schema(),
            };
            if let Value::Object(map) = &mut property {
                map.insert("description".to_string(), json!(field.description));
            }
            properties.insert(field.name.to_string(), property);
            if field.required {
                required.push(field.name);
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validation errors
// ────────────────────────────────────────────────────────────────────────────

/// A single failure, addressed by a dotted / indexed path (`profile.skills[2]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_path: String,
    pub reason: String,
}

/// All failures found in one value. Never empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field_path: field_path.into(),
                reason: reason.into(),
            }],
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field_path.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field_path, e.reason))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

/// Validates `value` against `schema`.
///
/// Unknown fields are dropped. Absent or `null` optional fields are omitted
/// from the result rather than defaulted. Every failure is collected.
pub fn validate(schema: &Schema, value: &Value) -> Result<FlowValue, ValidationErrors> {
    let mut errors = Vec::new();
    let typed = validate_object(schema, value, "", &mut errors);

    match typed {
        Some(map) if errors.is_empty() => Ok(map),
        _ => Err(ValidationErrors { errors }),
    }
}

fn validate_object(
    schema: &Schema,
    value: &Value,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<FlowValue> {
    let Some(object) = value.as_object() else {
        errors.push(FieldError {
            field_path: if path.is_empty() { "$".to_string() } else { path.to_string() },
            reason: format!("expected an object, found {}", kind_name(value)),
        });
        return None;
    };

    let mut typed = Map::new();

    for field in &schema.fields {
        let field_path = join_path(path, field.name);
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    errors.push(FieldError {
                        field_path,
                        reason: "required field is missing".to_string(),
                    });
                }
            }
            Some(raw) => {
                if let Some(checked) = validate_field(&field.kind, raw, &field_path, errors) {
                    typed.insert(field.name.to_string(), checked);
                }
            }
        }
    }

    for dependency in &schema.dependencies {
        if typed.contains_key(dependency.field) && !typed.contains_key(dependency.requires) {
            errors.push(FieldError {
                field_path: join_path(path, dependency.requires),
                reason: format!("required when '{}' is provided", dependency.field),
            });
        }
    }

    Some(typed)
}

fn validate_field(
    kind: &FieldKind,
    raw: &Value,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    match kind {
        FieldKind::String => match raw.as_str() {
            Some(s) if !s.trim().is_empty() => Some(raw.clone()),
            Some(_) => {
                errors.push(FieldError {
                    field_path: path.to_string(),
                    reason: "must not be empty".to_string(),
                });
                None
            }
            None => {
                errors.push(FieldError {
                    field_path: path.to_string(),
                    reason: format!("expected a string, found {}", kind_name(raw)),
                });
                None
            }
        },
        FieldKind::StringArray => {
            let Some(items) = raw.as_array() else {
                errors.push(FieldError {
                    field_path: path.to_string(),
                    reason: format!("expected an array of strings, found {}", kind_name(raw)),
                });
                return None;
            };
            let before = errors.len();
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    errors.push(FieldError {
                        field_path: format!("{path}[{i}]"),
                        reason: format!("expected a string, found {}", kind_name(item)),
                    });
                }
            }
            (errors.len() == before).then(|| raw.clone())
        }
        FieldKind::Enum(literals) => match raw.as_str() {
            Some(s) if literals.contains(&s) => Some(raw.clone()),
            _ => {
                errors.push(FieldError {
                    field_path: path.to_string(),
                    reason: format!("must be one of: {}", literals.join(", ")),
                });
                None
            }
        },
        FieldKind::Object(nested) => {
            let before = errors.len();
            let typed = validate_object(nested, raw, path, errors)?;
            (errors.len() == before).then_some(Value::Object(typed))
        }
    }
}

fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_schema() -> Schema {
        Schema::new(vec![
            Field::required("name", FieldKind::String, "Display name"),
            Field::required("skills", FieldKind::StringArray, "Skills"),
            Field::optional(
                "level",
                FieldKind::Enum(vec!["junior", "senior"]),
                "Seniority",
            ),
            Field::optional("bio", FieldKind::String, "Short bio"),
        ])
    }

    #[test]
    fn test_valid_value_drops_unknown_fields() {
        let value = json!({
            "name": "Ada",
            "skills": ["Rust", "SQL"],
            "favouriteColour": "green"
        });
        let typed = validate(&profile_schema(), &value).unwrap();
        assert_eq!(typed.len(), 2);
        assert!(!typed.contains_key("favouriteColour"));
        assert_eq!(typed["skills"], json!(["Rust", "SQL"]));
    }

    #[test]
    fn test_absent_optional_is_omitted_not_defaulted() {
        let typed = validate(&profile_schema(), &json!({"name": "Ada", "skills": []})).unwrap();
        assert!(!typed.contains_key("bio"));
        assert!(!typed.contains_key("level"));
    }

    #[test]
    fn test_null_optional_is_treated_as_absent() {
        let typed = validate(
            &profile_schema(),
            &json!({"name": "Ada", "skills": [], "bio": null}),
        )
        .unwrap();
        assert!(!typed.contains_key("bio"));
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let err = validate(&profile_schema(), &json!({})).unwrap_err();
        assert_eq!(err.paths(), vec!["name", "skills"]);
    }

    #[test]
    fn test_empty_and_non_string_required_fail() {
        let err = validate(&profile_schema(), &json!({"name": "   ", "skills": []})).unwrap_err();
        assert_eq!(err.errors[0].reason, "must not be empty");

        let err = validate(&profile_schema(), &json!({"name": 7, "skills": []})).unwrap_err();
        assert!(err.errors[0].reason.contains("expected a string"));
    }

    #[test]
    fn test_present_optional_string_must_not_be_empty() {
        let err = validate(
            &profile_schema(),
            &json!({"name": "Ada", "skills": [], "bio": ""}),
        )
        .unwrap_err();
        assert_eq!(err.paths(), vec!["bio"]);
    }

    #[test]
    fn test_enum_rejects_unknown_literal() {
        let err = validate(
            &profile_schema(),
            &json!({"name": "Ada", "skills": [], "level": "principal"}),
        )
        .unwrap_err();
        assert_eq!(err.paths(), vec!["level"]);
        assert!(err.errors[0].reason.contains("junior, senior"));
    }

    #[test]
    fn test_string_array_reports_element_path() {
        let err = validate(
            &profile_schema(),
            &json!({"name": "Ada", "skills": ["Rust", 3, "Go", false]}),
        )
        .unwrap_err();
        assert_eq!(err.paths(), vec!["skills[1]", "skills[3]"]);
    }

    #[test]
    fn test_nested_object_paths() {
        let schema = Schema::new(vec![Field::required(
            "profile",
            FieldKind::Object(profile_schema()),
            "Nested profile",
        )]);
        let err = validate(&schema, &json!({"profile": {"skills": "Rust"}})).unwrap_err();
        assert_eq!(err.paths(), vec!["profile.name", "profile.skills"]);
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let err = validate(&profile_schema(), &json!(["Ada"])).unwrap_err();
        assert_eq!(err.paths(), vec!["$"]);
    }

    #[test]
    fn test_empty_schema_accepts_any_object() {
        let typed = validate(&Schema::empty(), &json!({"anything": 1})).unwrap();
        assert!(typed.is_empty());
    }

    #[test]
    fn test_dependency_requires_companion_field() {
        let schema = Schema::new(vec![
            Field::optional("question", FieldKind::String, "q"),
            Field::optional("answer", FieldKind::String, "a"),
        ])
        .with_dependency("answer", "question");

        let err = validate(&schema, &json!({"answer": "I would profile first"})).unwrap_err();
        assert_eq!(err.paths(), vec!["question"]);

        assert!(validate(&schema, &json!({"question": "Why?"})).is_ok());
        assert!(validate(&schema, &json!({"question": "Why?", "answer": "Because"})).is_ok());
    }

    #[test]
    fn test_validation_is_stable_across_reserialization() {
        let value = json!({
            "name": "Ada",
            "skills": ["Rust"],
            "level": "senior",
            "extra": {"ignored": true}
        });
        let first = validate(&profile_schema(), &value).unwrap();
        let reserialized = serde_json::to_string(&first).unwrap();
        let reparsed: Value = serde_json::from_str(&reserialized).unwrap();
        let second = validate(&profile_schema(), &reparsed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_does_not_mutate_input() {
        let value = json!({"name": "Ada", "skills": ["Rust"], "extra": 1});
        let snapshot = value.clone();
        let _ = validate(&profile_schema(), &value);
        assert_eq!(value, snapshot);
    }

    #[test]
    fn test_json_schema_lists_required_fields_and_descriptions() {
        let doc = profile_schema().to_json_schema();
        assert_eq!(doc["type"], "object");
        assert_eq!(doc["required"], json!(["name", "skills"]));
        assert_eq!(doc["properties"]["skills"]["items"]["type"], "string");
        assert_eq!(doc["properties"]["level"]["enum"], json!(["junior", "senior"]));
        assert_eq!(doc["properties"]["bio"]["description"], "Short bio");
    }

    #[test]
    fn test_display_joins_errors() {
        let err = validate(&profile_schema(), &json!({})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "name: required field is missing; skills: required field is missing"
        );
    }
}
