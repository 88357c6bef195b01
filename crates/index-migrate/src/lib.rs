// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # Index Migration Tool
//!
//! `index-migrate` is a CLI tool and library for copying every index of one
//! Algolia account into another, hub by hub, and checking the result.
//!
//! ## What is migrated
//!
//! | Index kind | Stages |
//! |------------|--------|
//! | Primary | objects, rules, synonyms, settings |
//! | Replica | rules, synonyms, settings |
//!
//! Each stage exports from the source account to a file in the run's
//! artifact directory, then imports that file into the target account.
//!
//! ## Quick Start
//!
//! ```bash
//! export SOURCE_ALGOLIA_APP_ID=... SOURCE_ALGOLIA_API_KEY=...
//! export TARGET_ALGOLIA_APP_ID=... TARGET_ALGOLIA_API_KEY=...
//!
//! # Preview what would be migrated
//! index-migrate plan
//!
//! # Migrate (asks for confirmation)
//! index-migrate migrate
//!
//! # Compare source and target afterwards
//! index-migrate validate
//! ```

#![warn(missing_docs)]

pub mod artifacts;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod matcher;
pub mod pipeline;
pub mod profiles;
pub mod prompt;
pub mod validate;

pub use artifacts::{RunArtifacts, RunMode};
pub use classify::{Classification, LinkIssue};
pub use client::{AlgoliaCli, SearchClient};
pub use config::RunConfig;
pub use error::{Error, Result};
pub use index::{Category, IndexDescriptor, MetadataField};
pub use matcher::matching_indexes;
pub use pipeline::{MigrationReport, Pipeline};
pub use validate::{Finding, ValidationReport, Validator};
