use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of scalar types a schema field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Integer,
    String,
    Boolean,
    Float,
    Double,
    Text,
    Datetime,
    Date,
}

impl ScalarType {
    /// Map a schema `type` value. Anything unrecognized becomes [`ScalarType::String`].
    pub fn from_schema(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::String)
    }

    /// Map a schema `type` value, returning `None` when it is not part of the table.
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_schema_type(raw).as_str() {
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "text" => Some(Self::Text),
            "datetime" => Some(Self::Datetime),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Double => "double",
            Self::Text => "text",
            Self::Datetime => "datetime",
            Self::Date => "date",
        }
    }
}

impl Default for ScalarType {
    fn default() -> Self {
        Self::String
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim and lowercase. Sized forms such as `integer(11)` are not part of the table and stay
/// as written.
pub fn normalize_schema_type(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_only_trims_and_lowercases() {
        assert_eq!(normalize_schema_type(" Integer "), "integer");
        assert_eq!(normalize_schema_type("float(10, 2)"), "float(10, 2)");
    }

    #[test]
    fn sized_types_default_to_string() {
        assert_eq!(ScalarType::from_schema("integer(11)"), ScalarType::String);
        assert_eq!(ScalarType::from_schema("float(10, 2)"), ScalarType::String);
        assert_eq!(ScalarType::parse("string(255)"), None);
    }

    #[test]
    fn maps_known_types() {
        assert_eq!(ScalarType::from_schema("integer"), ScalarType::Integer);
        assert_eq!(ScalarType::from_schema("DATETIME"), ScalarType::Datetime);
        assert_eq!(ScalarType::from_schema("text"), ScalarType::Text);
    }

    #[test]
    fn unknown_types_default_to_string() {
        assert_eq!(ScalarType::from_schema("uuid"), ScalarType::String);
        assert_eq!(ScalarType::parse("uuid"), None);
        assert_eq!(ScalarType::default(), ScalarType::String);
    }
}
