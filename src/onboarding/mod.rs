//! Onboarding system — the account-setup wizard.
//!
//! A new organization walks a linear wizard: pick a plan, create the owner
//! account, describe the organization, list its facilities. Progress is a
//! disposable draft kept in an [`OnboardingStore`](crate::store::OnboardingStore)
//! so a reload or a billing redirect resumes where the user left off. Once
//! complete, the draft is handed to the backend and discarded.

pub mod handoff;
pub mod model;
pub mod routes;
pub mod state;
pub mod wizard;

pub use handoff::{AccountProvisioner, HttpProvisioner, OnboardingSubmission, ProvisionReceipt};
pub use model::{
    AccountDraft, BillingCycle, FacilityDraft, Microsite, OrganizationDraft, PlanLimits,
    PlanSelection, Tier,
};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use state::{OnboardingPatch, OnboardingState, WizardStep};
pub use wizard::{BillingOutcome, OnboardingWizard};

/// Store key holding the serialized draft. A schema change needs a new key.
pub const STORAGE_KEY: &str = "emertrix-onboarding-v1";

/// Scope used when a single wizard owns the whole store.
pub const DEFAULT_SCOPE: &str = "default";
