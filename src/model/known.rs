//! Known variables: the request-scoped inputs of a solve.

use serde::{Deserialize, Serialize};

/// Semantic type tag for force-typed knowns.
pub const FORCE_TYPE: &str = "force";

/// A known value supplied with a problem.
///
/// Wire shape matches the problem-parsing collaborator:
/// `{"name", "value", "unit", "type", "subType", "direction"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownVariable {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    /// Semantic type, e.g. `"mass"` or `"force"`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Refinement of `kind`, e.g. `"friction"` or `"gravity"`.
    #[serde(default)]
    pub sub_type: Option<String>,
    /// Free-text direction ("向左", "down", "30 degrees").
    #[serde(default)]
    pub direction: Option<String>,
}

impl KnownVariable {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            kind: None,
            sub_type: None,
            direction: None,
        }
    }

    /// Shorthand for a force-typed known.
    pub fn force(name: impl Into<String>, magnitude: f64) -> Self {
        Self::new(name, magnitude, "N").with_kind(FORCE_TYPE)
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn is_force(&self) -> bool {
        self.kind.as_deref() == Some(FORCE_TYPE)
    }
}

/// Output of the problem-parsing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedProblem {
    #[serde(default)]
    pub knowns: Vec<KnownVariable>,
    pub unknown: String,
}

impl ParsedProblem {
    /// Decode the collaborator's JSON reply.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = r#"{
            "knowns": [
                {"name": "mass", "value": 2.0, "unit": "kg", "type": "mass"},
                {"name": "friction", "value": 4.0, "unit": "N", "type": "force",
                 "subType": "friction", "direction": "left"}
            ],
            "unknown": "acceleration"
        }"#;
        let parsed = ParsedProblem::from_json(json).unwrap();
        assert_eq!(parsed.unknown, "acceleration");
        assert_eq!(parsed.knowns.len(), 2);
        assert!(!parsed.knowns[0].is_force());
        assert!(parsed.knowns[1].is_force());
        assert_eq!(parsed.knowns[1].sub_type.as_deref(), Some("friction"));
    }

    #[test]
    fn test_missing_optional_fields() {
        let k: KnownVariable = serde_json::from_str(r#"{"name": "t", "value": 3}"#).unwrap();
        assert_eq!(k.unit, "");
        assert!(k.kind.is_none());
        assert!(k.direction.is_none());
    }

    #[test]
    fn test_malformed_reply_is_json_error() {
        let err = ParsedProblem::from_json("not json").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}
