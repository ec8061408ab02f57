//! Emertrix onboarding — account-setup wizard drafts and their REST surface.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
