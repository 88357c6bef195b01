//! Migration pipeline orchestration.
//!
//! A run walks `Uninitialized → ProfilesReady → Listed →
//! AwaitingConfirmation → Migrating → CleanupOk | CleanupAfterFailure →
//! Terminal`. Every primary is migrated through `objects, rules, synonyms,
//! settings` and every replica through `rules, synonyms, settings`, one
//! export/import step at a time. The first failing step aborts the rest of
//! the run; profiles are removed on every path once created.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::artifacts::{
    RunArtifacts, LINK_ISSUES, PRIMARIES_LIST, REPLICAS_LIST, SOURCE_LISTING,
};
use crate::classify::{check_replica_links, filter_by_hubs, Classification, LinkIssue};
use crate::client::SearchClient;
use crate::config::RunConfig;
use crate::error::{Error, Phase, Result};
use crate::index::{Category, ListIndexResponse};
use crate::profiles::{CleanupFailure, ProfileScope};
use crate::prompt::{confirm_blocking, Confirm, MigrationPreview};

/// States of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing created yet.
    Uninitialized,
    /// Both profiles exist.
    ProfilesReady,
    /// Source listing classified and persisted.
    Listed,
    /// Waiting on the confirmation gate.
    AwaitingConfirmation,
    /// Export/import steps running.
    Migrating,
    /// Profiles removed after a successful or declined run.
    CleanupOk,
    /// Profiles removed after a failed run.
    CleanupAfterFailure,
    /// Run complete.
    Terminal,
}

/// Half of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Source → artifact file.
    Export,
    /// Artifact file → target.
    Import,
}

/// One completed step of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    /// Index migrated.
    pub index: String,
    /// Category migrated.
    pub category: Category,
    /// Step completed.
    pub step: Step,
}

/// Outcome of a migration run that got as far as creating profiles.
#[derive(Debug)]
pub struct MigrationReport {
    /// Run directory.
    pub artifacts_dir: PathBuf,
    /// Classified source listing.
    pub classification: Classification,
    /// Replica link inconsistencies found in the listing.
    pub link_issues: Vec<LinkIssue>,
    /// Whether the operator confirmed the migration.
    pub confirmed: bool,
    /// Steps that completed, in order.
    pub completed: Vec<StageRecord>,
    /// Error that aborted the run, if any.
    pub failure: Option<Error>,
    /// Profile deletions that failed.
    pub cleanup_failures: Vec<CleanupFailure>,
    /// States visited, in order.
    pub states: Vec<PipelineState>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationReport {
    fn new(artifacts_dir: &Path) -> Self {
        Self {
            artifacts_dir: artifacts_dir.to_path_buf(),
            classification: Classification::default(),
            link_issues: Vec::new(),
            confirmed: false,
            completed: Vec::new(),
            failure: None,
            cleanup_failures: Vec::new(),
            states: vec![PipelineState::Uninitialized],
            duration_secs: 0.0,
        }
    }

    /// Whether the run finished without a stage failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Number of fully migrated stages (export and import done).
    #[must_use]
    pub fn stages_completed(&self) -> usize {
        self.completed
            .iter()
            .filter(|record| record.step == Step::Import)
            .count()
    }

    fn advance(&mut self, state: PipelineState) {
        debug!(?state, "Pipeline state");
        self.states.push(state);
    }
}

/// Migration pipeline.
pub struct Pipeline<'a> {
    config: &'a RunConfig,
    client: &'a dyn SearchClient,
    confirm: &'a dyn Confirm,
}

impl<'a> Pipeline<'a> {
    /// Create a new migration pipeline.
    pub fn new(
        config: &'a RunConfig,
        client: &'a dyn SearchClient,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            config,
            client,
            confirm,
        }
    }

    /// Run the migration pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures before any profile exists
    /// (unavailable client, missing credentials, profile provisioning).
    /// Later failures are recorded in [`MigrationReport::failure`] after the
    /// profiles have been removed.
    pub async fn run(&self, artifacts: &RunArtifacts) -> Result<MigrationReport> {
        let start = Instant::now();
        let mut report = MigrationReport::new(artifacts.dir());

        info!("Checking for search client");
        self.client.check_available().await?;

        info!("Checking profiles information is available");
        self.config.validate()?;
        let profiles = self.config.profiles()?;

        let scope = ProfileScope::acquire(self.client, &profiles).await?;
        report.advance(PipelineState::ProfilesReady);

        let outcome = self.run_with_profiles(&scope, artifacts, &mut report).await;

        report.cleanup_failures = scope.release(self.client).await;
        match outcome {
            Ok(()) => report.advance(PipelineState::CleanupOk),
            Err(e) => {
                error!(error = %e, "Migration failed");
                report.failure = Some(e);
                report.advance(PipelineState::CleanupAfterFailure);
            }
        }
        report.advance(PipelineState::Terminal);
        report.duration_secs = start.elapsed().as_secs_f64();

        info!(
            stages = report.stages_completed(),
            duration_secs = report.duration_secs,
            "Migration script complete"
        );
        Ok(report)
    }

    async fn run_with_profiles(
        &self,
        scope: &ProfileScope,
        artifacts: &RunArtifacts,
        report: &mut MigrationReport,
    ) -> Result<()> {
        self.list_and_classify(scope, artifacts, report)
            .await
            .map_err(|e| Error::stage(Phase::Listing, "list", e))?;
        report.advance(PipelineState::Listed);

        if self.config.strict_links && !report.link_issues.is_empty() {
            return Err(Error::stage(
                Phase::Listing,
                "link check",
                Error::Config(format!(
                    "{} replica link issue(s) with strict_links enabled",
                    report.link_issues.len()
                )),
            ));
        }

        report.advance(PipelineState::AwaitingConfirmation);
        let preview = MigrationPreview {
            classification: &report.classification,
            primaries_file: artifacts.path(PRIMARIES_LIST),
            replicas_file: artifacts.path(REPLICAS_LIST),
            link_issues: report.link_issues.len(),
        };
        let confirmed = confirm_blocking(self.confirm, &preview)
            .map_err(|e| Error::stage(Phase::Listing, "confirm", e))?;
        report.confirmed = confirmed;

        if !confirmed {
            info!("Migration not confirmed; no changes made");
            return Ok(());
        }

        report.advance(PipelineState::Migrating);
        info!("Starting migration");
        self.migrate(scope, artifacts, report).await?;
        info!("Finished migration");
        Ok(())
    }

    async fn list_and_classify(
        &self,
        scope: &ProfileScope,
        artifacts: &RunArtifacts,
        report: &mut MigrationReport,
    ) -> Result<()> {
        info!(profile = scope.source(), "Listing indices to be migrated");
        let indices = self.client.list_indices(scope.source()).await?;
        artifacts.write_json(
            SOURCE_LISTING,
            &ListIndexResponse {
                items: indices.clone(),
                nb_pages: None,
            },
        )?;

        let listed = indices.len();
        let indices = filter_by_hubs(indices, &self.config.hubs);
        if indices.len() != listed {
            info!(
                hubs = ?self.config.hubs,
                kept = indices.len(),
                listed,
                "Restricted listing to configured hubs"
            );
        }

        let classification = Classification::from_indices(&indices);
        artifacts.write_names(REPLICAS_LIST, &classification.replicas)?;
        artifacts.write_names(PRIMARIES_LIST, &classification.primaries)?;

        let issues = check_replica_links(&indices);
        for issue in &issues {
            warn!(issue = %issue, "Replica link inconsistency");
        }
        if !issues.is_empty() {
            let lines: Vec<String> = issues.iter().map(|issue| format!("{issue}\n")).collect();
            artifacts.write_text(LINK_ISSUES, &lines.concat())?;
        }

        info!(
            "Found {} primary and {} replicas to migrate from the hubs: {}",
            classification.primaries.len(),
            classification.replicas.len(),
            classification.hubs.join(", ")
        );
        info!(
            "Please review the list of indices and replicas to be migrated: {}, {}",
            artifacts.path(PRIMARIES_LIST).display(),
            artifacts.path(REPLICAS_LIST).display()
        );

        report.classification = classification;
        report.link_issues = issues;
        Ok(())
    }

    async fn migrate(
        &self,
        scope: &ProfileScope,
        artifacts: &RunArtifacts,
        report: &mut MigrationReport,
    ) -> Result<()> {
        let total = report.classification.stage_count() as u64;
        let progress = create_progress_bar(total, self.config.progress);

        info!("Migrating primary indices");
        let primaries = report.classification.primaries.clone();
        for index in &primaries {
            for category in Category::PRIMARY_STAGES {
                self.transfer(scope, artifacts, index, category, report, &progress)
                    .await?;
            }
            info!(index = %index, "Done migrating primary index");
        }

        info!("Migrating replica indices");
        let replicas = report.classification.replicas.clone();
        for replica in &replicas {
            for category in Category::REPLICA_STAGES {
                self.transfer(scope, artifacts, replica, category, report, &progress)
                    .await?;
            }
            info!(replica = %replica, "Done migrating replica index");
        }

        progress.finish_with_message("Migration complete");
        Ok(())
    }

    async fn transfer(
        &self,
        scope: &ProfileScope,
        artifacts: &RunArtifacts,
        index: &str,
        category: Category,
        report: &mut MigrationReport,
        progress: &ProgressBar,
    ) -> Result<()> {
        info!(index, %category, "Migrating index {category}");
        progress.set_message(format!("{index} {category}"));
        let file = artifacts.export_path(index, category);

        self.client
            .export(category, index, scope.source(), &file)
            .await
            .map_err(|e| Error::index_stage(Phase::Migration, index, category, "export", e))?;
        report.completed.push(StageRecord {
            index: index.to_string(),
            category,
            step: Step::Export,
        });

        self.client
            .import(category, index, scope.target(), &file)
            .await
            .map_err(|e| Error::index_stage(Phase::Migration, index, category, "import", e))?;
        report.completed.push(StageRecord {
            index: index.to_string(),
            category,
            step: Step::Import,
        });

        progress.inc(1);
        Ok(())
    }
}

fn create_progress_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    pb
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
