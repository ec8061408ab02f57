//! Error types for the onboarding service.

use crate::onboarding::state::WizardStep;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Draft store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Wizard errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Failed to persist onboarding draft: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to serialize onboarding draft: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot move onboarding from {from} to {to}")]
    InvalidTransition { from: WizardStep, to: WizardStep },

    #[error("No plan selected")]
    PlanRequired,

    #[error("Facility limit reached: plan allows {limit}")]
    FacilityLimitReached { limit: u32 },

    #[error("No facility at index {index}")]
    FacilityNotFound { index: usize },

    #[error("Onboarding is missing the {missing} draft")]
    Incomplete { missing: &'static str },

    #[error("Onboarding is not complete (current step: {step})")]
    NotComplete { step: WizardStep },

    #[error("Provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),
}

/// Account provisioning errors (backend handoff).
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Provisioning request failed: {0}")]
    Transport(String),

    #[error("Provisioning rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid provisioning response: {0}")]
    InvalidResponse(String),
}
