// steward-core/src/models/tools.rs
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use thiserror::Error;

/// The schema of a tool as presented to the model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParametersDefinition,
}

/// Object schema describing a tool's arguments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParametersDefinition {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: BTreeMap<String, ToolParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Schema of a single argument.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParameter {
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ToolParameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ToolParameterType {
    fn matches(self, value: &JsonValue) -> bool {
        match self {
            ToolParameterType::String => value.is_string(),
            ToolParameterType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            ToolParameterType::Number => value.is_number(),
            ToolParameterType::Boolean => value.is_boolean(),
            ToolParameterType::Array => value.is_array(),
            ToolParameterType::Object => value.is_object(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ToolParameterType::String => "string",
            ToolParameterType::Integer => "integer",
            ToolParameterType::Number => "number",
            ToolParameterType::Boolean => "boolean",
            ToolParameterType::Array => "array",
            ToolParameterType::Object => "object",
        }
    }
}

impl ToolParameter {
    pub fn new(param_type: ToolParameterType, description: impl Into<String>) -> Self {
        Self {
            param_type,
            description: description.into(),
            enum_values: None,
            items: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ToolParameterType::String, description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(ToolParameterType::Integer, description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(ToolParameterType::Number, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(ToolParameterType::Boolean, description)
    }

    pub fn array(description: impl Into<String>, items: ToolParameter) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(ToolParameterType::Array, description)
        }
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Inclusive numeric bounds.
    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    fn check(&self, path: &str, value: &JsonValue) -> Result<(), SchemaViolation> {
        if !self.param_type.matches(value) {
            return Err(SchemaViolation::WrongType {
                argument: path.to_string(),
                expected: self.param_type.as_str(),
                found: json_type_name(value),
            });
        }

        if let (Some(allowed), Some(s)) = (&self.enum_values, value.as_str()) {
            if !allowed.iter().any(|a| a == s) {
                return Err(SchemaViolation::NotInEnum {
                    argument: path.to_string(),
                    value: s.to_string(),
                    allowed: allowed.clone(),
                });
            }
        }

        if let Some(n) = value.as_f64() {
            let below = self.minimum.is_some_and(|min| n < min);
            let above = self.maximum.is_some_and(|max| n > max);
            if below || above {
                return Err(SchemaViolation::OutOfRange {
                    argument: path.to_string(),
                    value: n,
                    minimum: self.minimum,
                    maximum: self.maximum,
                });
            }
        }

        if let (Some(item_schema), Some(items)) = (&self.items, value.as_array()) {
            for (index, item) in items.iter().enumerate() {
                item_schema.check(&format!("{}[{}]", path, index), item)?;
            }
        }

        Ok(())
    }

    fn normalize(&self, value: &mut JsonValue) {
        match self.param_type {
            ToolParameterType::Integer if !value.is_i64() && !value.is_u64() => {
                if let Some(whole) = value.as_f64().and_then(whole_number) {
                    *value = whole;
                }
            }
            ToolParameterType::Array => {
                if let (Some(item_schema), JsonValue::Array(items)) = (&self.items, value) {
                    for item in items {
                        item_schema.normalize(item);
                    }
                }
            }
            _ => {}
        }
    }
}

/// `5.0` becomes `5`; fractional or out-of-range values give `None`.
fn whole_number(f: f64) -> Option<JsonValue> {
    if f.fract() != 0.0 {
        return None;
    }
    if f >= 0.0 && f < u64::MAX as f64 {
        Some(JsonValue::from(f as u64))
    } else if f < 0.0 && f >= i64::MIN as f64 {
        Some(JsonValue::from(f as i64))
    } else {
        None
    }
}

impl Default for ToolParametersDefinition {
    fn default() -> Self {
        Self {
            param_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl ToolParametersDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property; `required` also lists it in the `required` array.
    pub fn property(mut self, name: impl Into<String>, parameter: ToolParameter, required: bool) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, parameter);
        self
    }

    /// Checks decoded arguments against this schema.
    ///
    /// Required arguments must be present and non-null. Declared arguments are
    /// type-checked, including enum membership, numeric bounds and array items.
    /// Undeclared arguments are ignored.
    pub fn validate(&self, arguments: &Map<String, JsonValue>) -> Result<(), SchemaViolation> {
        for name in &self.required {
            match arguments.get(name) {
                None | Some(JsonValue::Null) => {
                    return Err(SchemaViolation::MissingRequired(name.clone()))
                }
                Some(_) => {}
            }
        }

        for (name, value) in arguments {
            if value.is_null() {
                continue;
            }
            if let Some(parameter) = self.properties.get(name) {
                parameter.check(name, value)?;
            }
        }
        Ok(())
    }
}

impl ToolParametersDefinition {
    /// Rewrites whole-valued floats given for `integer` parameters as JSON
    /// integers, so typed access through [`ToolInput`] accepts what
    /// [`Self::validate`] accepted.
    pub fn normalize(&self, arguments: &mut Map<String, JsonValue>) {
        for (name, value) in arguments.iter_mut() {
            if let Some(parameter) = self.properties.get(name) {
                parameter.normalize(value);
            }
        }
    }
}

/// Why a set of arguments was rejected by a [`ToolParametersDefinition`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("missing required argument '{0}'")]
    MissingRequired(String),

    #[error("argument '{argument}' should be of type {expected}, got {found}")]
    WrongType {
        argument: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("argument '{argument}' has value '{value}', expected one of: {}", .allowed.join(", "))]
    NotInEnum {
        argument: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("argument '{argument}' value {value} is outside the allowed range [{}, {}]",
        .minimum.map(|m| m.to_string()).unwrap_or_else(|| "-inf".to_string()),
        .maximum.map(|m| m.to_string()).unwrap_or_else(|| "inf".to_string()))]
    OutOfRange {
        argument: String,
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "number",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Arguments handed to a tool handler at runtime.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ToolInput {
    pub arguments: Map<String, JsonValue>,
}

impl ToolInput {
    pub fn new(arguments: Map<String, JsonValue>) -> Self {
        Self { arguments }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.arguments.get(key)
    }

    pub fn required<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self
            .arguments
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("Missing required argument: '{}'", key))?;
        serde_json::from_value(value.clone()).map_err(|e| {
            anyhow::anyhow!(
                "Invalid type or value for argument '{}'. Expected {}: {}",
                key,
                std::any::type_name::<T>(),
                e
            )
        })
    }

    /// Like [`ToolInput::required`], but absent or null yields `None`.
    pub fn optional<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.arguments.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(_) => self.required(key).map(Some),
        }
    }

    /// Deserializes the whole argument object into `T`.
    pub fn parse<T>(&self) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(JsonValue::Object(self.arguments.clone())).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse arguments as {}: {}",
                std::any::type_name::<T>(),
                e
            )
        })
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.arguments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    fn search_schema() -> ToolParametersDefinition {
        ToolParametersDefinition::new()
            .property("query", ToolParameter::string("The search query"), true)
            .property(
                "max_results",
                ToolParameter::integer("Maximum number of results").with_range(Some(1.0), Some(20.0)),
                false,
            )
            .property(
                "category",
                ToolParameter::string("Category filter").with_enum(["docs", "programming"]),
                false,
            )
            .property(
                "tags",
                ToolParameter::array("Tags", ToolParameter::string("A tag")),
                false,
            )
    }

    #[test]
    fn test_schema_serializes_like_json_schema() {
        let schema = ToolParametersDefinition::new()
            .property("location", ToolParameter::string("The city name"), true);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string", "description": "The city name" }
                },
                "required": ["location"]
            })
        );
    }

    #[test]
    fn test_validate_accepts_valid_arguments() {
        let schema = search_schema();
        assert!(schema.validate(&args(json!({ "query": "rust" }))).is_ok());
        assert!(schema
            .validate(&args(json!({
                "query": "rust",
                "max_results": 3,
                "category": "docs",
                "tags": ["a", "b"],
                "unknown": true
            })))
            .is_ok());
        assert!(schema
            .validate(&args(json!({ "query": "rust", "category": null })))
            .is_ok());
    }

    #[test]
    fn test_validate_reports_violations() {
        let schema = search_schema();

        assert_eq!(
            schema.validate(&args(json!({}))),
            Err(SchemaViolation::MissingRequired("query".to_string()))
        );
        assert_eq!(
            schema.validate(&args(json!({ "query": null }))),
            Err(SchemaViolation::MissingRequired("query".to_string()))
        );

        let wrong_type = schema.validate(&args(json!({ "query": 42 }))).unwrap_err();
        assert_eq!(
            wrong_type.to_string(),
            "argument 'query' should be of type string, got integer"
        );

        let out_of_range = schema
            .validate(&args(json!({ "query": "q", "max_results": 50 })))
            .unwrap_err();
        assert!(matches!(out_of_range, SchemaViolation::OutOfRange { .. }));

        let not_in_enum = schema
            .validate(&args(json!({ "query": "q", "category": "music" })))
            .unwrap_err();
        assert!(not_in_enum.to_string().contains("expected one of: docs, programming"));

        let bad_item = schema
            .validate(&args(json!({ "query": "q", "tags": ["ok", 3] })))
            .unwrap_err();
        assert!(bad_item.to_string().contains("tags[1]"));
    }

    #[test]
    fn test_integer_accepts_whole_floats_only() {
        let schema = ToolParametersDefinition::new()
            .property("n", ToolParameter::integer("n"), true);
        assert!(schema.validate(&args(json!({ "n": 4.0 }))).is_ok());
        assert!(schema.validate(&args(json!({ "n": 4.5 }))).is_err());
    }

    #[test]
    fn test_normalize_turns_whole_floats_into_integers() {
        let schema = search_schema()
            .property("offset", ToolParameter::integer("Offset"), false)
            .property("ids", ToolParameter::array("Ids", ToolParameter::integer("An id")), false)
            .property("ratio", ToolParameter::number("Ratio"), false);
        let mut arguments = args(json!({
            "query": "rust",
            "max_results": 5.0,
            "offset": -3.0,
            "ids": [1.0, 2],
            "ratio": 2.0,
            "extra": 7.0
        }));
        assert!(schema.validate(&arguments).is_ok());

        schema.normalize(&mut arguments);
        let input = ToolInput::new(arguments);
        assert_eq!(input.required::<u32>("max_results").unwrap(), 5);
        assert_eq!(input.required::<i64>("offset").unwrap(), -3);
        assert_eq!(input.required::<Vec<u8>>("ids").unwrap(), vec![1, 2]);
        // Only integer parameters are touched.
        assert!(input.get("ratio").is_some_and(|v| v.is_f64()));
        assert!(input.get("extra").is_some_and(|v| v.is_f64()));
        assert_eq!(input.required::<String>("query").unwrap(), "rust");
    }

    #[test]
    fn test_tool_input_accessors() {
        let input = ToolInput::new(args(json!({ "a": 1.5, "b": "x", "c": null })));
        assert_eq!(input.required::<f64>("a").unwrap(), 1.5);
        assert!(input.required::<String>("a").is_err());
        assert!(input.required::<String>("missing").is_err());
        assert_eq!(input.optional::<String>("b").unwrap(), Some("x".to_string()));
        assert_eq!(input.optional::<String>("c").unwrap(), None);
        assert_eq!(input.optional::<String>("missing").unwrap(), None);

        #[derive(serde::Deserialize)]
        struct Parsed {
            a: f64,
            b: String,
        }
        let parsed: Parsed = input.parse().unwrap();
        assert_eq!(parsed.a, 1.5);
        assert_eq!(parsed.b, "x");
    }
}
