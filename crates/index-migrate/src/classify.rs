//! Classification of an index listing into primaries, replicas and hubs.
//!
//! All functions here are pure and may be called in any order on the same
//! listing. Replicas are enumerated from the `replicas` arrays of the
//! descriptors; [`check_replica_links`] reports where the per-descriptor
//! `primary` pointers disagree with those arrays.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::index::{Category, IndexDescriptor};

/// Names of the primary indices, in listing order.
pub fn extract_primary_index_names(indices: &[IndexDescriptor]) -> Vec<String> {
    indices
        .iter()
        .filter(|index| index.is_primary())
        .map(|index| index.name.clone())
        .collect()
}

/// Names of every declared replica, in declaration order.
///
/// Not deduplicated: a replica declared by two primaries appears twice.
pub fn extract_replica_index_names(indices: &[IndexDescriptor]) -> Vec<String> {
    indices
        .iter()
        .flat_map(|index| index.replicas.iter().cloned())
        .collect()
}

/// Distinct hub names in first-seen order.
pub fn extract_hub_names(indices: &[IndexDescriptor]) -> Vec<String> {
    let mut seen = HashSet::new();
    indices
        .iter()
        .map(IndexDescriptor::hub_name)
        .filter(|hub| seen.insert(*hub))
        .map(str::to_string)
        .collect()
}

/// Keeps only descriptors whose hub is in `hubs`. An empty filter keeps
/// everything.
pub fn filter_by_hubs(indices: Vec<IndexDescriptor>, hubs: &[String]) -> Vec<IndexDescriptor> {
    if hubs.is_empty() {
        return indices;
    }
    indices
        .into_iter()
        .filter(|index| hubs.iter().any(|hub| hub == index.hub_name()))
        .collect()
}

/// The three views of one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Primary index names.
    pub primaries: Vec<String>,
    /// Replica index names.
    pub replicas: Vec<String>,
    /// Hub names.
    pub hubs: Vec<String>,
}

impl Classification {
    /// Classifies a listing.
    pub fn from_indices(indices: &[IndexDescriptor]) -> Self {
        Self {
            primaries: extract_primary_index_names(indices),
            replicas: extract_replica_index_names(indices),
            hubs: extract_hub_names(indices),
        }
    }

    /// Total number of export/import stages a migration of this listing runs.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.primaries.len() * Category::PRIMARY_STAGES.len()
            + self.replicas.len() * Category::REPLICA_STAGES.len()
    }
}

/// A disagreement between `primary` pointers and `replicas` declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkIssue {
    /// A descriptor points at a primary that does not declare it. It is
    /// migrated neither as a primary nor as a replica.
    UndeclaredReplica {
        /// Replica index.
        replica: String,
        /// Primary it points at.
        primary: String,
    },
    /// A primary declares a replica that is not in the listing.
    MissingReplica {
        /// Declaring primary.
        primary: String,
        /// Declared replica name.
        replica: String,
    },
    /// A declared replica points at a different primary.
    MismatchedPrimary {
        /// Replica index.
        replica: String,
        /// Primary declaring it.
        declared_by: String,
        /// Primary its own descriptor points at.
        points_to: String,
    },
    /// A replica declared by more than one index.
    DuplicateReplica {
        /// Replica index.
        replica: String,
    },
}

impl std::fmt::Display for LinkIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndeclaredReplica { replica, primary } => write!(
                f,
                "'{replica}' names '{primary}' as primary but is not in its replicas"
            ),
            Self::MissingReplica { primary, replica } => write!(
                f,
                "'{primary}' declares replica '{replica}' which is not listed"
            ),
            Self::MismatchedPrimary {
                replica,
                declared_by,
                points_to,
            } => write!(
                f,
                "'{replica}' is declared by '{declared_by}' but names '{points_to}' as primary"
            ),
            Self::DuplicateReplica { replica } => {
                write!(f, "'{replica}' is declared as a replica more than once")
            }
        }
    }
}

/// Cross-checks each replica's `primary` field against the `replicas`
/// declarations of the listing.
pub fn check_replica_links(indices: &[IndexDescriptor]) -> Vec<LinkIssue> {
    let by_name: HashMap<&str, &IndexDescriptor> = indices
        .iter()
        .map(|index| (index.name.as_str(), index))
        .collect();

    let mut issues = Vec::new();
    let mut declared = HashSet::new();
    let mut reported_duplicates = HashSet::new();

    for index in indices {
        for replica in &index.replicas {
            if !declared.insert(replica.as_str())
                && reported_duplicates.insert(replica.as_str())
            {
                issues.push(LinkIssue::DuplicateReplica {
                    replica: replica.clone(),
                });
            }

            match by_name.get(replica.as_str()) {
                None => issues.push(LinkIssue::MissingReplica {
                    primary: index.name.clone(),
                    replica: replica.clone(),
                }),
                Some(descriptor) if descriptor.primary != index.name => {
                    issues.push(LinkIssue::MismatchedPrimary {
                        replica: replica.clone(),
                        declared_by: index.name.clone(),
                        points_to: descriptor.primary.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    for index in indices.iter().filter(|index| index.is_replica()) {
        if !declared.contains(index.name.as_str()) {
            issues.push(LinkIssue::UndeclaredReplica {
                replica: index.name.clone(),
                primary: index.primary.clone(),
            });
        }
    }

    issues
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
