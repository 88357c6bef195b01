//! In-memory [`SearchClient`] recording every call, for orchestration tests.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Mutex;

use super::SearchClient;
use crate::config::Profile;
use crate::error::{Error, Result};
use crate::index::{Category, IndexDescriptor};

/// A recorded client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckAvailable,
    CreateProfile(String),
    DeleteProfile(String),
    List(String),
    Export {
        category: Category,
        index: String,
        profile: String,
    },
    Import {
        category: Category,
        index: String,
        profile: String,
    },
}

impl Call {
    pub fn export(category: Category, index: &str, profile: &str) -> Self {
        Self::Export {
            category,
            index: index.to_string(),
            profile: profile.to_string(),
        }
    }

    pub fn import(category: Category, index: &str, profile: &str) -> Self {
        Self::Import {
            category,
            index: index.to_string(),
            profile: profile.to_string(),
        }
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    profiles: BTreeSet<String>,
    listings: HashMap<String, Vec<IndexDescriptor>>,
    content: HashMap<(String, String, Category), String>,
}

/// Fake search service. Content is keyed by profile, index and category.
#[derive(Default)]
pub struct FakeClient {
    state: Mutex<State>,
    unavailable: bool,
    fail_on: Vec<Call>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Makes the given call fail when it happens.
    pub fn failing_on(mut self, call: Call) -> Self {
        self.fail_on.push(call);
        self
    }

    pub fn with_listing(self, profile: &str, indices: Vec<IndexDescriptor>) -> Self {
        self.lock().listings.insert(profile.to_string(), indices);
        self
    }

    pub fn with_content(self, profile: &str, index: &str, category: Category, body: &str) -> Self {
        self.lock().content.insert(
            (profile.to_string(), index.to_string(), category),
            body.to_string(),
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Export and import calls only, in order.
    pub fn transfer_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Export { .. } | Call::Import { .. }))
            .collect()
    }

    pub fn live_profiles(&self) -> Vec<String> {
        self.lock().profiles.iter().cloned().collect()
    }

    pub fn content(&self, profile: &str, index: &str, category: Category) -> Option<String> {
        self.lock()
            .content
            .get(&(profile.to_string(), index.to_string(), category))
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) -> Result<()> {
        let fails = self.fail_on.contains(&call);
        let description = format!("{call:?}");
        self.lock().calls.push(call);
        if fails {
            return Err(Error::Client {
                command: description,
                status: "exit status: 1".to_string(),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchClient for FakeClient {
    async fn check_available(&self) -> Result<()> {
        self.record(Call::CheckAvailable)?;
        if self.unavailable {
            return Err(Error::ToolUnavailable {
                binary: "fake".to_string(),
                reason: "not installed".to_string(),
            });
        }
        Ok(())
    }

    async fn create_profile(&self, profile: &Profile) -> Result<()> {
        self.record(Call::CreateProfile(profile.name.clone()))?;
        self.lock().profiles.insert(profile.name.clone());
        Ok(())
    }

    async fn delete_profile(&self, name: &str) -> Result<()> {
        self.record(Call::DeleteProfile(name.to_string()))?;
        self.lock().profiles.remove(name);
        Ok(())
    }

    async fn list_indices(&self, profile: &str) -> Result<Vec<IndexDescriptor>> {
        self.record(Call::List(profile.to_string()))?;
        Ok(self.lock().listings.get(profile).cloned().unwrap_or_default())
    }

    async fn export(
        &self,
        category: Category,
        index: &str,
        profile: &str,
        dest: &Path,
    ) -> Result<()> {
        self.record(Call::export(category, index, profile))?;
        let body = self.content(profile, index, category).unwrap_or_default();
        std::fs::write(dest, body).map_err(|e| Error::artifact(dest, e))
    }

    async fn import(
        &self,
        category: Category,
        index: &str,
        profile: &str,
        src: &Path,
    ) -> Result<()> {
        self.record(Call::import(category, index, profile))?;
        let body = std::fs::read_to_string(src).map_err(|e| Error::artifact(src, e))?;
        self.lock().content.insert(
            (profile.to_string(), index.to_string(), category),
            body,
        );
        Ok(())
    }
}
