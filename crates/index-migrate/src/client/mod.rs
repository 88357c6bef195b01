//! Search service client boundary.
//!
//! Orchestration only talks to the service through [`SearchClient`]. The
//! production implementation drives the `algolia` command-line tool
//! ([`cli::AlgoliaCli`]); tests substitute an in-memory fake.

pub mod cli;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use std::path::Path;

use crate::config::Profile;
use crate::error::Result;
use crate::index::{Category, IndexDescriptor};

pub use cli::AlgoliaCli;

/// Operations the migration and validation engines need from the service.
///
/// Every call is scoped by a named profile selecting the credential context.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Verify the client is reachable.
    async fn check_available(&self) -> Result<()>;

    /// Register a credential profile.
    async fn create_profile(&self, profile: &Profile) -> Result<()>;

    /// Remove a credential profile.
    async fn delete_profile(&self, name: &str) -> Result<()>;

    /// List every index visible to `profile`.
    async fn list_indices(&self, profile: &str) -> Result<Vec<IndexDescriptor>>;

    /// Export `category` of `index` as ndjson into `dest`.
    async fn export(
        &self,
        category: Category,
        index: &str,
        profile: &str,
        dest: &Path,
    ) -> Result<()>;

    /// Import the ndjson file `src` as `category` of `index`.
    async fn import(
        &self,
        category: Category,
        index: &str,
        profile: &str,
        src: &Path,
    ) -> Result<()>;
}
