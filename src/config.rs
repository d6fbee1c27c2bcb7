//! Interpreter configuration
//!
//! Defaults can be overridden through `SOLTRACE_*` environment variables and,
//! in the binary, by command line flags.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::interpreter::ErrorPolicy;

pub const SEED_VAR: &str = "SOLTRACE_SEED";
pub const TRACE_OUTPUT_VAR: &str = "SOLTRACE_TRACE_OUTPUT";
pub const ERROR_POLICY_VAR: &str = "SOLTRACE_ERROR_POLICY";

pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_TRACE_OUTPUT: &str = "interpretation.json";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a valid number, got {value}")]
    InvalidSeed { var: String, value: String },

    #[error("{var}: {reason}")]
    InvalidErrorPolicy { var: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Seed for every random choice the evaluator makes
    pub random_seed: u64,
    /// Where `finish` writes the trace
    pub trace_output: PathBuf,
    pub error_policy: ErrorPolicy,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            random_seed: DEFAULT_SEED,
            trace_output: PathBuf::from(DEFAULT_TRACE_OUTPUT),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl InterpreterConfig {
    /// Defaults overridden by any `SOLTRACE_*` variables that are set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Like `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(SEED_VAR) {
            config.random_seed =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidSeed {
                        var: SEED_VAR.to_string(),
                        value: value.clone(),
                    })?;
        }

        if let Some(value) = lookup(TRACE_OUTPUT_VAR) {
            config.trace_output = PathBuf::from(value);
        }

        if let Some(value) = lookup(ERROR_POLICY_VAR) {
            config.error_policy =
                value
                    .parse()
                    .map_err(|reason| ConfigError::InvalidErrorPolicy {
                        var: ERROR_POLICY_VAR.to_string(),
                        reason,
                    })?;
        }

        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_trace_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.trace_output = path.into();
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}
