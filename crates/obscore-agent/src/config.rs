// crates/obscore-agent/src/config.rs
// ============================================================================
// Module: Merged Configuration Loader
// Description: Builds the flattened env/file/default view the Startup
//              Asserter validates, plus the agent-process-specific fields
//              (AGENT_KIND, classification rule table) it never sees.
// Purpose: One place that knows the full layering order: compiled defaults,
//          overlaid by an optional TOML file, overlaid by the process
//          environment.
// Dependencies: obscore-core, obscore-engines, std::env, toml
// ============================================================================

//! ## Overview
//! [`obscore_core::startup::Config::from_merged_vars`] only validates a flat
//! `BTreeMap<String, String>`; it has no opinion on where those values come
//! from. This module supplies that map by reading an optional TOML file at
//! the path named by `AGENT_CONFIG_PATH`, then overlaying every variable the
//! process environment actually set — so a deployment can ship one file and
//! still override a single field with an environment variable without
//! touching it.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use obscore_core::startup::Config as StartupConfig;
use obscore_core::startup::StartupError;
use obscore_core::startup::MANDATORY_VARS;
use obscore_engines::ClassificationRule;
use serde::Deserialize;
use thiserror::Error;

use crate::kind::AgentKind;
use crate::kind::InvalidAgentKind;
use crate::rules::default_rules;
use crate::rules::rules_from_specs;
use crate::rules::RuleSpec;
use crate::rules::RuleSpecError;

/// Name of the environment variable naming the optional TOML overlay file.
pub const CONFIG_PATH_VAR: &str = "AGENT_CONFIG_PATH";

/// Maximum size, in bytes, of the configuration file this process will read.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Every variable the merged view may carry, beyond the Startup Asserter's
/// own [`MANDATORY_VARS`] and their optional overrides. Listed so file and
/// environment values layer onto the same flat map regardless of source.
const OPTIONAL_VARS: &[&str] = &[
    "RUVECTOR_POOL_SIZE",
    "RUVECTOR_RETRY_ATTEMPTS",
    "RUVECTOR_RETRY_DELAY_MS",
    "RUVECTOR_MAX_RETRY_DELAY_MS",
    "RUVECTOR_TIMEOUT_MS",
    "RUVECTOR_HEALTH_TIMEOUT_MS",
    "MAX_LATENCY_MS",
    "MAX_CALLS_PER_RUN",
    "MAX_EVENTS_PER_ANALYSIS",
    "MAX_TIME_WINDOW_DAYS",
    "SELF_OBSERVATION_ENABLED",
    "AGENT_VERSION",
    "SERVER_BIND_ADDR",
];

/// Everything that can go wrong assembling the merged view before the
/// Startup Asserter ever sees it.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// The file named by `AGENT_CONFIG_PATH` could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error, rendered.
        source: String,
    },

    /// The file exceeded [`MAX_CONFIG_FILE_SIZE`].
    #[error("config file {0} exceeds the maximum size")]
    TooLarge(PathBuf),

    /// The file was not valid TOML, or its shape did not deserialize.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// The path that failed to parse.
        path: PathBuf,
        /// The underlying parse error, rendered.
        source: String,
    },

    /// `AGENT_KIND` was absent or unrecognized.
    #[error(transparent)]
    InvalidKind(#[from] InvalidAgentKind),

    /// A `[[classification_rules]]` entry named an unrecognized field value.
    #[error(transparent)]
    InvalidRule(#[from] RuleSpecError),

    /// The merged view failed the Startup Asserter's own validation.
    #[error(transparent)]
    Startup(#[from] StartupError),
}

/// TOML shape of the optional overlay file. Every field is optional; the
/// file may be entirely absent, in which case environment variables and
/// compiled defaults carry the whole configuration.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(flatten)]
    vars: BTreeMap<String, String>,
    #[serde(default)]
    classification_rules: Vec<RuleSpec>,
}

/// Everything startup needs beyond the frozen [`StartupConfig`]: which
/// analytical kind this process runs, and the rule table the classification
/// engine is built from (ignored by every other kind).
pub struct LoadedConfig {
    /// The validated, frozen startup configuration.
    pub startup: StartupConfig,
    /// The analytical transformation this process performs.
    pub kind: AgentKind,
    /// The classification rule table, resolved from the file overlay or the
    /// compiled-in default.
    pub classification_rules: Vec<ClassificationRule>,
}

/// Loads the full process configuration from the environment, optionally
/// overlaid on a TOML file.
///
/// # Errors
/// Returns [`ConfigLoadError`] if the overlay file cannot be read or parsed,
/// `AGENT_KIND` is missing or unrecognized, a rule entry is malformed, or the
/// merged view fails startup validation.
pub fn load() -> Result<LoadedConfig, ConfigLoadError> {
    load_from_env(&env::vars().collect())
}

/// Same as [`load`], but takes the process environment as an explicit map —
/// the seam tests use to avoid mutating real environment variables.
///
/// # Errors
/// See [`load`].
pub fn load_from_env(env_vars: &BTreeMap<String, String>) -> Result<LoadedConfig, ConfigLoadError> {
    let file = match env_vars.get(CONFIG_PATH_VAR) {
        Some(path) => Some(read_file_config(Path::new(path))?),
        None => None,
    };

    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    if let Some(file) = &file {
        for key in MANDATORY_VARS.iter().chain(OPTIONAL_VARS) {
            if let Some(value) = file.vars.get(*key) {
                merged.insert((*key).to_owned(), value.clone());
            }
        }
    }
    for key in MANDATORY_VARS.iter().chain(OPTIONAL_VARS) {
        if let Some(value) = env_vars.get(*key) {
            merged.insert((*key).to_owned(), value.clone());
        }
    }

    let kind_value = env_vars
        .get("AGENT_KIND")
        .or_else(|| file.as_ref().and_then(|f| f.vars.get("AGENT_KIND")))
        .map(String::as_str)
        .unwrap_or("");
    let kind = AgentKind::parse(kind_value)?;

    let classification_rules = match file {
        Some(file) if !file.classification_rules.is_empty() => {
            rules_from_specs(file.classification_rules)?
        }
        _ => default_rules(),
    };

    let startup = StartupConfig::from_merged_vars(&merged)?;

    Ok(LoadedConfig { startup, kind, classification_rules })
}

/// Reads and parses the TOML overlay file, enforcing the same size bound the
/// broader configuration-loading idiom in this codebase applies.
fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let metadata = fs::metadata(path).map_err(|err| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source: err.to_string(),
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigLoadError::TooLarge(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source: err.to_string(),
    })?;
    toml::from_str(&content).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use std::collections::BTreeMap;
    use std::io::Write;

    use super::load_from_env;

    fn base_vars() -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("RUVECTOR_SERVICE_URL".to_owned(), "https://gateway.internal".to_owned());
        vars.insert("RUVECTOR_API_KEY".to_owned(), "secret".to_owned());
        vars.insert("AGENT_NAME".to_owned(), "failure-classifier".to_owned());
        vars.insert("AGENT_DOMAIN".to_owned(), "llm-gateway".to_owned());
        vars.insert("AGENT_PHASE".to_owned(), "phase1".to_owned());
        vars.insert("AGENT_LAYER".to_owned(), "layer1".to_owned());
        vars.insert("AGENT_KIND".to_owned(), "classification".to_owned());
        vars
    }

    #[test]
    fn env_only_produces_default_rules() {
        let loaded = load_from_env(&base_vars()).expect("valid env");
        assert_eq!(loaded.kind, super::AgentKind::Classification);
        assert!(!loaded.classification_rules.is_empty());
    }

    #[test]
    fn missing_agent_kind_is_rejected() {
        let err = load_from_env(&BTreeMap::new()).unwrap_err();
        assert!(matches!(err, super::ConfigLoadError::InvalidKind(_)));
    }

    #[test]
    fn env_var_overrides_file_value() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "RUVECTOR_POOL_SIZE = \"7\"").expect("write temp file");
        let mut vars = base_vars();
        vars.insert(super::CONFIG_PATH_VAR.to_owned(), file.path().display().to_string());
        vars.insert("RUVECTOR_POOL_SIZE".to_owned(), "20".to_owned());
        let loaded = load_from_env(&vars).expect("valid env");
        assert_eq!(loaded.startup.gateway.pool_size, 20);
    }

    #[test]
    fn file_value_applies_when_env_silent() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "RUVECTOR_POOL_SIZE = \"7\"").expect("write temp file");
        let mut vars = base_vars();
        vars.insert(super::CONFIG_PATH_VAR.to_owned(), file.path().display().to_string());
        let loaded = load_from_env(&vars).expect("valid env");
        assert_eq!(loaded.startup.gateway.pool_size, 7);
    }
}
