//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// How strictly `set_current_step` guards the linear step order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPolicy {
    /// Any step is accepted, including skips and backward jumps.
    #[default]
    Permissive,
    /// Only the current step or its immediate successor is accepted.
    Strict,
}

impl FromStr for StepPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(ConfigError::InvalidValue {
                key: "EMERTRIX_STEP_POLICY".to_string(),
                message: format!("expected 'strict' or 'permissive', got '{other}'"),
            }),
        }
    }
}

/// Wizard behaviour knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WizardConfig {
    pub step_policy: StepPolicy,
}

/// Service configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// libSQL database file holding onboarding drafts.
    pub db_path: PathBuf,
    /// HTTP listen port.
    pub port: u16,
    pub wizard: WizardConfig,
    /// Front-end origin allowed by CORS. `None` allows any origin.
    pub cors_origin: Option<String>,
    /// Backend endpoint receiving completed onboarding submissions.
    /// Handoff is disabled when unset.
    pub provision_url: Option<String>,
    /// Drafts untouched for this many days are pruned at startup.
    pub draft_retention_days: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/onboarding.db"),
            port: 8080,
            wizard: WizardConfig::default(),
            cors_origin: None,
            provision_url: None,
            draft_retention_days: 30,
        }
    }
}

impl ServiceConfig {
    /// Build config from `EMERTRIX_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = std::env::var("EMERTRIX_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let port = match std::env::var("EMERTRIX_PORT") {
            Ok(raw) => parse_var("EMERTRIX_PORT", &raw)?,
            Err(_) => defaults.port,
        };

        let step_policy = match std::env::var("EMERTRIX_STEP_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => StepPolicy::default(),
        };

        let draft_retention_days = match std::env::var("EMERTRIX_DRAFT_RETENTION_DAYS") {
            Ok(raw) => parse_var("EMERTRIX_DRAFT_RETENTION_DAYS", &raw)?,
            Err(_) => defaults.draft_retention_days,
        };

        let cors_origin = non_empty_var("EMERTRIX_CORS_ORIGIN");
        let provision_url = non_empty_var("EMERTRIX_PROVISION_URL");

        Ok(Self {
            db_path,
            port,
            wizard: WizardConfig { step_policy },
            cors_origin,
            provision_url,
            draft_retention_days,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
