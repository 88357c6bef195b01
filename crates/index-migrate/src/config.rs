//! Configuration types for index-migrate.
//!
//! A [`RunConfig`] is built once at start-up (defaults, then the optional
//! YAML file, then environment variables and flags) and passed by reference
//! into every component.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::index::MetadataField;
use crate::matcher::DEFAULT_MATCH_FIELDS;

/// Environment variable holding the source application ID.
pub const SOURCE_APP_ID_ENV: &str = "SOURCE_ALGOLIA_APP_ID";
/// Environment variable holding the source API key.
pub const SOURCE_API_KEY_ENV: &str = "SOURCE_ALGOLIA_API_KEY";
/// Environment variable holding the target application ID.
pub const TARGET_APP_ID_ENV: &str = "TARGET_ALGOLIA_APP_ID";
/// Environment variable holding the target API key.
pub const TARGET_API_KEY_ENV: &str = "TARGET_ALGOLIA_API_KEY";

/// Profile name used for the source account unless configured.
pub const DEFAULT_SOURCE_PROFILE: &str = "source_algolia_profile";
/// Profile name used for the target account unless configured.
pub const DEFAULT_TARGET_PROFILE: &str = "target_algolia_profile";

/// Main run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Account indices are read from.
    #[serde(default)]
    pub source: AccountConfig,
    /// Account indices are written to.
    #[serde(default)]
    pub target: AccountConfig,
    /// Where run artifacts are written.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    /// Search client settings.
    #[serde(default)]
    pub client: ClientConfig,
    /// Validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Only process indices of these hubs (empty = all).
    #[serde(default)]
    pub hubs: Vec<String>,
    /// Abort before confirmation when replica links are inconsistent.
    #[serde(default)]
    pub strict_links: bool,
    /// Show a progress bar while migrating.
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: AccountConfig::default(),
            target: AccountConfig::default(),
            artifacts: ArtifactsConfig::default(),
            client: ClientConfig::default(),
            validation: ValidationConfig::default(),
            hubs: Vec::new(),
            strict_links: false,
            progress: true,
        }
    }
}

/// Credentials and profile name for one account.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Profile name registered with the search client.
    pub profile: Option<String>,
    /// Application ID.
    pub app_id: Option<String>,
    /// API key.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("profile", &self.profile)
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Artifact directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Root directory; each run creates `<root>/<mode>/<timestamp>/`.
    #[serde(default = "default_artifact_root")]
    pub root: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: default_artifact_root(),
        }
    }
}

/// Search client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Path or name of the `algolia` executable.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
        }
    }
}

/// Validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Descriptor fields compared between source and target.
    #[serde(default = "default_match_fields")]
    pub fields: Vec<MetadataField>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fields: default_match_fields(),
        }
    }
}

/// A fully specified credential profile.
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile name.
    pub name: String,
    /// Application ID.
    pub app_id: String,
    /// API key.
    pub api_key: String,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Source and target profiles of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePair {
    /// Source account profile.
    pub source: Profile,
    /// Target account profile.
    pub target: Profile,
}

fn default_artifact_root() -> PathBuf {
    PathBuf::from(".tmp")
}

fn default_binary() -> PathBuf {
    PathBuf::from("algolia")
}

fn default_match_fields() -> Vec<MetadataField> {
    DEFAULT_MATCH_FIELDS.to_vec()
}

fn default_true() -> bool {
    true
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl RunConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Profile name for the source account.
    pub fn source_profile_name(&self) -> &str {
        self.source
            .profile
            .as_deref()
            .unwrap_or(DEFAULT_SOURCE_PROFILE)
    }

    /// Profile name for the target account.
    pub fn target_profile_name(&self) -> &str {
        self.target
            .profile
            .as_deref()
            .unwrap_or(DEFAULT_TARGET_PROFILE)
    }

    /// Validate settings that do not involve credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.source_profile_name().is_empty() || self.target_profile_name().is_empty() {
            return Err(Error::Config("profile names cannot be empty".to_string()));
        }
        if self.source_profile_name() == self.target_profile_name() {
            return Err(Error::Config(format!(
                "source and target profiles must differ (both are '{}')",
                self.source_profile_name()
            )));
        }
        if self.artifacts.root.as_os_str().is_empty() {
            return Err(Error::Config(
                "artifacts.root cannot be empty".to_string(),
            ));
        }
        if self.client.binary.as_os_str().is_empty() {
            return Err(Error::Config("client.binary cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve both credential profiles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] naming every absent credential.
    pub fn profiles(&self) -> Result<ProfilePair> {
        let source_app_id = non_empty(self.source.app_id.as_ref());
        let source_api_key = non_empty(self.source.api_key.as_ref());
        let target_app_id = non_empty(self.target.app_id.as_ref());
        let target_api_key = non_empty(self.target.api_key.as_ref());

        let missing: Vec<String> = [
            (SOURCE_APP_ID_ENV, source_app_id),
            (SOURCE_API_KEY_ENV, source_api_key),
            (TARGET_APP_ID_ENV, target_app_id),
            (TARGET_API_KEY_ENV, target_api_key),
        ]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| (*name).to_string())
        .collect();

        match (source_app_id, source_api_key, target_app_id, target_api_key) {
            (
                Some(source_app_id),
                Some(source_api_key),
                Some(target_app_id),
                Some(target_api_key),
            ) => Ok(ProfilePair {
                source: Profile {
                    name: self.source_profile_name().to_string(),
                    app_id: source_app_id.to_string(),
                    api_key: source_api_key.to_string(),
                },
                target: Profile {
                    name: self.target_profile_name().to_string(),
                    app_id: target_app_id.to_string(),
                    api_key: target_api_key.to_string(),
                },
            }),
            _ => Err(Error::ConfigMissing(missing)),
        }
    }
}

/// Example configuration written by `index-migrate init`.
pub const EXAMPLE_CONFIG: &str = r#"# index-migrate configuration
#
# Credentials are best supplied through the environment:
#   SOURCE_ALGOLIA_APP_ID, SOURCE_ALGOLIA_API_KEY,
#   TARGET_ALGOLIA_APP_ID, TARGET_ALGOLIA_API_KEY
# Values below are only used when the variables are not set.

source:
  profile: source_algolia_profile
  # app_id: YOURSOURCEAPP
  # api_key: your-source-admin-key

target:
  profile: target_algolia_profile
  # app_id: YOURTARGETAPP
  # api_key: your-target-admin-key

artifacts:
  root: .tmp

client:
  binary: algolia

validation:
  fields: [dataSize, entries, primary, replicas]

# Only process these hubs (leading segment of the index name). Empty = all.
hubs: []

# Abort before confirmation if primary/replica declarations disagree.
strict_links: false

progress: true
"#;
