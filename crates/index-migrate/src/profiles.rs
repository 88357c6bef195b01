//! Scoped ownership of the two credential profiles of a run.
//!
//! Profiles are registered with [`ProfileScope::acquire`] and removed with
//! [`ProfileScope::release`]. Callers must not early-return between the two:
//! the phase result is captured, the scope released, then the result
//! returned. A scope dropped without being released logs the profiles it
//! leaked.

use tracing::{error, info};

use crate::client::SearchClient;
use crate::config::ProfilePair;
use crate::error::{Error, Result};

/// A profile deletion that failed during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    /// Profile name.
    pub profile: String,
    /// Error message.
    pub message: String,
}

/// Live credential profiles of one run.
#[derive(Debug)]
pub struct ProfileScope {
    source: String,
    target: String,
    created: Vec<String>,
}

impl ProfileScope {
    /// Creates the source profile, then the target profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileProvisioning`] if either creation fails. Any
    /// profile already created is deleted before returning.
    pub async fn acquire<C>(client: &C, profiles: &ProfilePair) -> Result<Self>
    where
        C: SearchClient + ?Sized,
    {
        let mut scope = Self {
            source: profiles.source.name.clone(),
            target: profiles.target.name.clone(),
            created: Vec::with_capacity(2),
        };

        for profile in [&profiles.source, &profiles.target] {
            info!(profile = %profile.name, "Creating search client profile");
            if let Err(e) = client.create_profile(profile).await {
                error!(profile = %profile.name, error = %e, "Profile creation failed");
                scope.release(client).await;
                return Err(Error::ProfileProvisioning {
                    profile: profile.name.clone(),
                    source: Box::new(e),
                });
            }
            scope.created.push(profile.name.clone());
        }

        Ok(scope)
    }

    /// Source profile name.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Target profile name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Deletes every created profile. Failures are logged and returned, not
    /// retried.
    pub async fn release<C>(mut self, client: &C) -> Vec<CleanupFailure>
    where
        C: SearchClient + ?Sized,
    {
        info!("Cleaning up search client profiles");
        let mut failures = Vec::new();
        for name in std::mem::take(&mut self.created) {
            if let Err(e) = client.delete_profile(&name).await {
                error!(profile = %name, error = %e, "Failed to remove profile");
                failures.push(CleanupFailure {
                    profile: name,
                    message: e.to_string(),
                });
            }
        }
        failures
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if !self.created.is_empty() {
            error!(
                profiles = ?self.created,
                "Profiles were not removed; delete them manually with `algolia profile remove`"
            );
        }
    }
}
