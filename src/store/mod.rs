//! Persistence layer — pluggable key-value storage for onboarding drafts.

pub mod libsql_backend;
pub mod memory;
mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use memory::MemoryStore;
pub use traits::OnboardingStore;
