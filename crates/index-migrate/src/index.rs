//! Index descriptors as reported by the search service, and the categories
//! of content exported per index.

use serde::{Deserialize, Serialize};

/// One entry of an index listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    /// Index name, `<hub>.<rest>` by convention.
    pub name: String,
    /// Size of the index data in bytes.
    #[serde(default)]
    pub data_size: u64,
    /// Number of records.
    #[serde(default)]
    pub entries: u64,
    /// Size of the index files in bytes.
    #[serde(default)]
    pub file_size: u64,
    /// Number of tasks not yet applied.
    #[serde(default)]
    pub number_of_pending_tasks: u64,
    /// Whether any task is pending.
    #[serde(default)]
    pub pending_task: bool,
    /// Name of the primary index; empty for primaries.
    #[serde(default)]
    pub primary: String,
    /// Names of the replica indices declared by this index.
    #[serde(default)]
    pub replicas: Vec<String>,
}

impl IndexDescriptor {
    /// Creates a primary descriptor with no replicas and zeroed statistics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the primary this index replicates.
    #[must_use]
    pub fn with_primary(mut self, primary: impl Into<String>) -> Self {
        self.primary = primary.into();
        self
    }

    /// Sets the declared replicas.
    #[must_use]
    pub fn with_replicas<I, S>(mut self, replicas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replicas = replicas.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this descriptor is a primary index.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.primary.is_empty()
    }

    /// Whether this descriptor is a replica index.
    #[must_use]
    pub fn is_replica(&self) -> bool {
        !self.is_primary()
    }

    /// Hub name: the part of the index name before the first `.`.
    #[must_use]
    pub fn hub_name(&self) -> &str {
        hub_of(&self.name)
    }
}

/// Returns the hub portion of an index name.
pub fn hub_of(name: &str) -> &str {
    name.split_once('.').map_or(name, |(hub, _)| hub)
}

/// Response body of `indices list -o json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListIndexResponse {
    /// Listed indices.
    #[serde(default)]
    pub items: Vec<IndexDescriptor>,
    /// Number of pages reported by the service.
    #[serde(default, rename = "nbPages", skip_serializing_if = "Option::is_none")]
    pub nb_pages: Option<u32>,
}

/// A comparable field of [`IndexDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataField {
    /// `name`
    Name,
    /// `dataSize`
    DataSize,
    /// `entries`
    Entries,
    /// `fileSize`
    FileSize,
    /// `numberOfPendingTasks`
    NumberOfPendingTasks,
    /// `pendingTask`
    PendingTask,
    /// `primary`
    Primary,
    /// `replicas`
    Replicas,
}

impl MetadataField {
    /// Field name as it appears in listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DataSize => "dataSize",
            Self::Entries => "entries",
            Self::FileSize => "fileSize",
            Self::NumberOfPendingTasks => "numberOfPendingTasks",
            Self::PendingTask => "pendingTask",
            Self::Primary => "primary",
            Self::Replicas => "replicas",
        }
    }
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content exported and imported per index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Records.
    Objects,
    /// Query rules.
    Rules,
    /// Synonyms.
    Synonyms,
    /// Index settings.
    Settings,
}

impl Category {
    /// Stages run for a primary index, in order.
    pub const PRIMARY_STAGES: [Category; 4] = [
        Category::Objects,
        Category::Rules,
        Category::Synonyms,
        Category::Settings,
    ];

    /// Stages run for a replica index, in order. Replicas share their
    /// primary's records.
    pub const REPLICA_STAGES: [Category; 3] =
        [Category::Rules, Category::Synonyms, Category::Settings];

    /// Lowercase name used in file names and client sub-commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::Rules => "rules",
            Self::Synonyms => "synonyms",
            Self::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
