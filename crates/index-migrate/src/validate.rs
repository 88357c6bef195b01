//! Post-migration validation.
//!
//! Lists both accounts, then for every source index checks that the target
//! exists, that the configured descriptor fields agree, and that the exported
//! rules, synonyms and settings are byte-identical. Mismatches are
//! [`Finding`]s, not errors: they are logged and the loop moves on. A client
//! or artifact failure aborts the loop and falls through to profile cleanup.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

use crate::artifacts::{RunArtifacts, Side, FINDINGS, SOURCE_LISTING, TARGET_LISTING};
use crate::client::SearchClient;
use crate::config::RunConfig;
use crate::error::{Error, Phase, Result};
use crate::index::{Category, IndexDescriptor, ListIndexResponse, MetadataField};
use crate::matcher::mismatched_fields;
use crate::profiles::{CleanupFailure, ProfileScope};

/// Categories whose exports are compared. Records are covered by the
/// `entries` descriptor field instead.
pub const COMPARED_CATEGORIES: [Category; 3] = Category::REPLICA_STAGES;

/// A recoverable difference between source and target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// No target index with the source index's name.
    TargetMissing {
        /// Source index name.
        index: String,
    },
    /// Descriptor fields differ.
    MetadataMismatch {
        /// Index name.
        index: String,
        /// Differing fields.
        fields: Vec<MetadataField>,
    },
    /// Exported content differs.
    ContentMismatch {
        /// Index name.
        index: String,
        /// Category compared.
        category: Category,
        /// First differing line, 1-based.
        first_difference_line: usize,
    },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetMissing { index } => write!(f, "{index}: missing on target"),
            Self::MetadataMismatch { index, fields } => {
                let names: Vec<&str> = fields.iter().map(MetadataField::as_str).collect();
                write!(f, "{index}: metadata differs ({})", names.join(", "))
            }
            Self::ContentMismatch {
                index,
                category,
                first_difference_line,
            } => write!(
                f,
                "{index}: {category} differ from line {first_difference_line}"
            ),
        }
    }
}

/// Per-index outcome. `None` means the comparison was not evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexValidation {
    /// Source index name.
    pub index: String,
    /// Whether a target index with the same name exists.
    pub target_found: bool,
    /// Descriptor comparison.
    pub metadata_match: Option<bool>,
    /// Rules comparison.
    pub rules_match: Option<bool>,
    /// Synonyms comparison.
    pub synonyms_match: Option<bool>,
    /// Settings comparison.
    pub settings_match: Option<bool>,
}

impl IndexValidation {
    fn new(index: &str) -> Self {
        Self {
            index: index.to_string(),
            ..Self::default()
        }
    }

    fn record_content(&mut self, category: Category, matched: bool) {
        match category {
            Category::Rules => self.rules_match = Some(matched),
            Category::Synonyms => self.synonyms_match = Some(matched),
            Category::Settings => self.settings_match = Some(matched),
            Category::Objects => {}
        }
    }
}

/// Outcome of a validation run that got as far as creating profiles.
#[derive(Debug)]
pub struct ValidationReport {
    /// Run directory.
    pub artifacts_dir: PathBuf,
    /// One entry per source index evaluated.
    pub results: Vec<IndexValidation>,
    /// Every finding, in the order found.
    pub findings: Vec<Finding>,
    /// Error that aborted the run, if any.
    pub failure: Option<Error>,
    /// Profile deletions that failed.
    pub cleanup_failures: Vec<CleanupFailure>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl ValidationReport {
    fn new(artifacts_dir: &Path) -> Self {
        Self {
            artifacts_dir: artifacts_dir.to_path_buf(),
            results: Vec::new(),
            findings: Vec::new(),
            failure: None,
            cleanup_failures: Vec::new(),
            duration_secs: 0.0,
        }
    }

    /// No findings and no failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.failure.is_none()
    }
}

/// Line (1-based) where `left` and `right` first differ, or `None` when they
/// are identical.
///
/// Lines are split on `\n`, so inputs that differ only by a final newline
/// report the line after the last shared one.
pub fn first_difference_line(left: &[u8], right: &[u8]) -> Option<usize> {
    if left == right {
        return None;
    }

    let mut left_lines = left.split(|byte| *byte == b'\n');
    let mut right_lines = right.split(|byte| *byte == b'\n');
    let mut line = 1;
    loop {
        match (left_lines.next(), right_lines.next()) {
            (Some(l), Some(r)) if l == r => line += 1,
            _ => return Some(line),
        }
    }
}

async fn read_export(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::artifact(path, e))
}

/// Validation engine.
pub struct Validator<'a> {
    config: &'a RunConfig,
    client: &'a dyn SearchClient,
}

impl<'a> Validator<'a> {
    /// Create a new validator.
    pub fn new(config: &'a RunConfig, client: &'a dyn SearchClient) -> Self {
        Self { config, client }
    }

    /// Compare the source and target accounts.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures before any profile exists. Later
    /// failures are recorded in [`ValidationReport::failure`].
    pub async fn run(&self, artifacts: &RunArtifacts) -> Result<ValidationReport> {
        let start = Instant::now();
        let mut report = ValidationReport::new(artifacts.dir());

        info!("Checking for search client");
        self.client.check_available().await?;

        info!("Checking profiles information is available");
        self.config.validate()?;
        let profiles = self.config.profiles()?;

        let scope = ProfileScope::acquire(self.client, &profiles).await?;

        let outcome = self.validate_with_profiles(&scope, artifacts, &mut report).await;

        report.cleanup_failures = scope.release(self.client).await;
        if let Err(e) = outcome {
            error!(error = %e, "Validation failed");
            report.failure = Some(e);
        }

        if let Err(e) = artifacts.write_json(FINDINGS, &report.findings) {
            error!(error = %e, "Failed to write findings");
        }

        report.duration_secs = start.elapsed().as_secs_f64();
        info!(
            indices = report.results.len(),
            findings = report.findings.len(),
            duration_secs = report.duration_secs,
            "Validation complete"
        );
        Ok(report)
    }

    async fn validate_with_profiles(
        &self,
        scope: &ProfileScope,
        artifacts: &RunArtifacts,
        report: &mut ValidationReport,
    ) -> Result<()> {
        info!("Listing source indexes");
        let source = self
            .list(scope.source(), artifacts, SOURCE_LISTING)
            .await
            .map_err(|e| Error::stage(Phase::Validation, "list source", e))?;

        info!("Listing target indexes");
        let target = self
            .list(scope.target(), artifacts, TARGET_LISTING)
            .await
            .map_err(|e| Error::stage(Phase::Validation, "list target", e))?;

        let targets: HashMap<&str, &IndexDescriptor> =
            target.iter().map(|index| (index.name.as_str(), index)).collect();

        for source_index in &source {
            let target_index = targets.get(source_index.name.as_str()).copied();
            let result = self
                .validate_index(scope, artifacts, source_index, target_index, report)
                .await?;
            report.results.push(result);
        }

        Ok(())
    }

    async fn list(
        &self,
        profile: &str,
        artifacts: &RunArtifacts,
        file: &str,
    ) -> Result<Vec<IndexDescriptor>> {
        let indices = self.client.list_indices(profile).await?;
        let indices = crate::classify::filter_by_hubs(indices, &self.config.hubs);
        artifacts.write_json(
            file,
            &ListIndexResponse {
                items: indices.clone(),
                nb_pages: None,
            },
        )?;
        Ok(indices)
    }

    async fn validate_index(
        &self,
        scope: &ProfileScope,
        artifacts: &RunArtifacts,
        source: &IndexDescriptor,
        target: Option<&IndexDescriptor>,
        report: &mut ValidationReport,
    ) -> Result<IndexValidation> {
        let index = source.name.as_str();
        info!(index, "Validating index");
        let mut result = IndexValidation::new(index);

        let Some(target) = target else {
            record_finding(report, Finding::TargetMissing {
                index: index.to_string(),
            });
            return Ok(result);
        };
        result.target_found = true;

        let fields = mismatched_fields(source, target, &self.config.validation.fields);
        result.metadata_match = Some(fields.is_empty());
        if !fields.is_empty() {
            record_finding(report, Finding::MetadataMismatch {
                index: index.to_string(),
                fields,
            });
        }

        for category in COMPARED_CATEGORIES {
            let difference = self
                .compare_content(scope, artifacts, index, category)
                .await
                .map_err(|e| Error::index_stage(Phase::Validation, index, category, "compare", e))?;
            result.record_content(category, difference.is_none());
            if let Some(line) = difference {
                record_finding(report, Finding::ContentMismatch {
                    index: index.to_string(),
                    category,
                    first_difference_line: line,
                });
            }
        }

        Ok(result)
    }

    async fn compare_content(
        &self,
        scope: &ProfileScope,
        artifacts: &RunArtifacts,
        index: &str,
        category: Category,
    ) -> Result<Option<usize>> {
        let source_file = artifacts.side_export_path(Side::Source, index, category)?;
        let target_file = artifacts.side_export_path(Side::Target, index, category)?;

        self.client
            .export(category, index, scope.source(), &source_file)
            .await?;
        self.client
            .export(category, index, scope.target(), &target_file)
            .await?;

        let source = read_export(&source_file).await?;
        let target = read_export(&target_file).await?;
        Ok(first_difference_line(&source, &target))
    }
}

fn record_finding(report: &mut ValidationReport, finding: Finding) {
    match &finding {
        Finding::TargetMissing { index } => {
            error!(index = %index, "Target index not found");
        }
        Finding::MetadataMismatch { index, fields } => {
            error!(index = %index, fields = ?fields, "Source and target indexes do not match");
        }
        Finding::ContentMismatch {
            index,
            category,
            first_difference_line,
        } => {
            error!(
                index = %index,
                category = %category,
                line = first_difference_line,
                "Source and target content differ"
            );
        }
    }
    report.findings.push(finding);
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
