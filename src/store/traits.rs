//! `OnboardingStore` trait — the key-value port the wizard persists through.

use async_trait::async_trait;

use crate::error::StoreError;

/// Backend-agnostic draft store.
///
/// Values are opaque strings addressed by `(scope, key)`. A scope is one
/// browser session; within it the wizard only ever touches a single key.
#[async_trait]
pub trait OnboardingStore: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Write (upsert) the raw value under `key`.
    async fn set(&self, scope: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Returns whether anything was removed.
    async fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError>;
}
