//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```
//! use physics_derive::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     [search]
//!     max_expansions = 500
//!
//!     [force]
//!     resultant_name = "net force"
//! "#).unwrap();
//!
//! assert_eq!(config.search.max_expansions, 500);
//! assert_eq!(config.search.max_frontier, 100_000);
//! assert_eq!(config.force.resultant_name, "net force");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub force: ForceConfig,
    pub solver: SolverConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::from_toml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.search.max_expansions == 0 {
            return Err(Error::Config("search.max_expansions must be positive".into()));
        }
        if self.search.max_frontier == 0 {
            return Err(Error::Config("search.max_frontier must be positive".into()));
        }
        let tol = self.force.equilibrium_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(Error::Config(format!(
                "force.equilibrium_tolerance must be a non-negative number, got {tol}"
            )));
        }
        if self.force.resultant_name.trim().is_empty() {
            return Err(Error::Config("force.resultant_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_max_expansions(mut self, n: usize) -> Self {
        self.search.max_expansions = n;
        self
    }

    pub fn with_resultant_name(mut self, name: impl Into<String>) -> Self {
        self.force.resultant_name = name.into();
        self
    }
}

/// Bounds on one derivation search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Frontier pops before the search gives up.
    pub max_expansions: usize,
    /// Largest frontier the search may hold.
    pub max_frontier: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_expansions: 10_000, max_frontier: 100_000 }
    }
}

/// Force composition settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Resultant magnitudes below this count as equilibrium.
    pub equilibrium_tolerance: f64,
    /// Name of the synthetic known that replaces composed forces. Must
    /// resolve to a quantity in the knowledge store.
    pub resultant_name: String,
    pub unit: String,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            equilibrium_tolerance: 0.01,
            resultant_name: "resultant force".into(),
            unit: "N".into(),
        }
    }
}

/// Which fallback rearrangements run after symbolic isolation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    pub enable_rule_table: bool,
    pub enable_simple_transform: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { enable_rule_table: true, enable_simple_transform: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            [force]
            equilibrium_tolerance = 0.5

            [solver]
            enable_rule_table = false
            "#,
        )
        .unwrap();
        assert_eq!(config.force.equilibrium_tolerance, 0.5);
        assert_eq!(config.force.unit, "N");
        assert!(!config.solver.enable_rule_table);
        assert!(config.solver.enable_simple_transform);
    }

    #[test]
    fn test_bad_toml() {
        let err = EngineConfig::from_toml_str("[search\nmax_expansions = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::default().with_max_expansions(0).validate().is_err());

        let mut config = EngineConfig::default();
        config.force.equilibrium_tolerance = -1.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        assert!(EngineConfig::default().with_resultant_name("  ").validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/physics-derive.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("physics-derive-{}.toml", std::process::id()));
        std::fs::write(&path, "[search]\nmax_frontier = 64\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.search.max_frontier, 64);
    }
}
