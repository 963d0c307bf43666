//! # Runtime Settings
//!
//! Session defaults loaded from the environment or a TOML file.
//!
//! ## Environment Variables
//!
//! - `BRAINSTEM_MAX_STEPS` - Step ceiling applied to new sessions (default: unlimited)
//! - `BRAINSTEM_COST_LIMIT` - Maximum total cost per session (default: no limit)
//! - `BRAINSTEM_COST_LIMIT_CURRENCY` - Currency of the cost limit (default: USD)
//! - `BRAINSTEM_COST_LIMIT_POLICY` - `stop`, `interrupt` or `warn` (default: warn)
//! - `BRAINSTEM_MAX_ROUNDS` - Supervisor rounds per group run (default: 10)
//! - `BRAINSTEM_SUPERVISOR_AGENT_ID` - Agent id of the group supervisor (default: supervisor)
//!
//! ## File Format
//!
//! ```toml
//! max_steps = 20
//!
//! [cost_limit]
//! max_total_cost = 1.5
//! currency = "USD"
//! on_exceeded = "interrupt"
//!
//! [orchestration]
//! max_rounds = 5
//! supervisor_agent_id = "host"
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};

use crate::state::{AgentState, CostLimit, CostLimitAction};
use crate::usage::DEFAULT_CURRENCY;

/// Error type for settings loading
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Failed to read settings file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    #[error("Settings validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLimitSettings {
    pub max_total_cost: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub on_exceeded: CostLimitAction,
}

impl CostLimitSettings {
    pub fn to_cost_limit(&self) -> CostLimit {
        CostLimit::new(self.max_total_cost)
            .with_currency(self.currency.clone())
            .with_action(self.on_exceeded)
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationSettings {
    pub max_rounds: u32,
    pub supervisor_agent_id: String,
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            supervisor_agent_id: "supervisor".to_string(),
        }
    }
}

/// Defaults applied to new sessions and group runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub max_steps: Option<u32>,
    pub cost_limit: Option<CostLimitSettings>,
    pub orchestration: OrchestrationSettings,
}

impl RuntimeSettings {
    /// Load settings from `BRAINSTEM_*` environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(max_steps) = parse_var::<u32, _>(&lookup, "BRAINSTEM_MAX_STEPS")? {
            settings.max_steps = Some(max_steps);
        }

        if let Some(max_total_cost) = parse_var::<f64, _>(&lookup, "BRAINSTEM_COST_LIMIT")? {
            let currency = lookup("BRAINSTEM_COST_LIMIT_CURRENCY").unwrap_or_else(default_currency);
            let on_exceeded = match lookup("BRAINSTEM_COST_LIMIT_POLICY") {
                Some(policy) => parse_policy("BRAINSTEM_COST_LIMIT_POLICY", &policy)?,
                None => CostLimitAction::default(),
            };
            settings.cost_limit = Some(CostLimitSettings {
                max_total_cost,
                currency,
                on_exceeded,
            });
        }

        if let Some(max_rounds) = parse_var::<u32, _>(&lookup, "BRAINSTEM_MAX_ROUNDS")? {
            settings.orchestration.max_rounds = max_rounds;
        }
        if let Some(id) = lookup("BRAINSTEM_SUPERVISOR_AGENT_ID") {
            settings.orchestration.supervisor_agent_id = id;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(raw).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_cost_limit(mut self, max_total_cost: f64, on_exceeded: CostLimitAction) -> Self {
        self.cost_limit = Some(CostLimitSettings {
            max_total_cost,
            currency: default_currency(),
            on_exceeded,
        });
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.orchestration.max_rounds = max_rounds;
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_steps == Some(0) {
            return Err(SettingsError::Validation(
                "max_steps must be greater than zero".to_string(),
            ));
        }
        if let Some(limit) = &self.cost_limit
            && (!limit.max_total_cost.is_finite() || limit.max_total_cost < 0.0)
        {
            return Err(SettingsError::Validation(format!(
                "cost limit must be a non-negative number, got {}",
                limit.max_total_cost
            )));
        }
        if self.orchestration.max_rounds == 0 {
            return Err(SettingsError::Validation(
                "orchestration.max_rounds must be greater than zero".to_string(),
            ));
        }
        if self.orchestration.supervisor_agent_id.trim().is_empty() {
            return Err(SettingsError::Validation(
                "orchestration.supervisor_agent_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply the session-level settings to `state`.
    pub fn apply(&self, mut state: AgentState) -> AgentState {
        if let Some(max_steps) = self.max_steps {
            state.max_steps = Some(max_steps);
        }
        if let Some(limit) = &self.cost_limit {
            state.cost_limit = Some(limit.to_cost_limit());
        }
        state
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SettingsError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid value '{val}': {e}"),
            }),
        None => Ok(None),
    }
}

fn parse_policy(key: &str, val: &str) -> Result<CostLimitAction, SettingsError> {
    match val.to_lowercase().as_str() {
        "stop" => Ok(CostLimitAction::Stop),
        "interrupt" => Ok(CostLimitAction::Interrupt),
        "warn" => Ok(CostLimitAction::Warn),
        _ => Err(SettingsError::InvalidEnvVar {
            key: key.to_string(),
            message: format!("invalid policy '{val}', expected stop/interrupt/warn"),
        }),
    }
}
