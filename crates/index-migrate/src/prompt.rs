//! Confirmation gate between listing and migrating.

use console::Style;
use dialoguer::{theme::ColorfulTheme, Input};
use std::path::PathBuf;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::classify::Classification;
use crate::error::{Error, Result};

/// What the operator is asked to approve.
#[derive(Debug, Clone)]
pub struct MigrationPreview<'a> {
    /// Classified listing.
    pub classification: &'a Classification,
    /// Primary name list on disk.
    pub primaries_file: PathBuf,
    /// Replica name list on disk.
    pub replicas_file: PathBuf,
    /// Number of replica link issues found.
    pub link_issues: usize,
}

/// Decides whether a migration proceeds.
pub trait Confirm {
    /// Returns `true` only on an explicit affirmative answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prompt`] if the answer cannot be read.
    fn confirm(&self, preview: &MigrationPreview<'_>) -> Result<bool>;
}

/// Runs `confirm` off the async workers.
///
/// On a multi-thread runtime the current worker hands its tasks to other
/// threads for the duration of the prompt. Elsewhere the prompt runs inline.
pub fn confirm_blocking(confirm: &dyn Confirm, preview: &MigrationPreview<'_>) -> Result<bool> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| confirm.confirm(preview))
        }
        _ => confirm.confirm(preview),
    }
}

/// Whether `answer` is the affirmative `y` (any case, surrounding
/// whitespace ignored).
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Asks on the terminal.
pub struct TerminalConfirm {
    theme: ColorfulTheme,
}

impl Default for TerminalConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalConfirm {
    /// Creates a terminal prompt.
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, preview: &MigrationPreview<'_>) -> Result<bool> {
        let bold = Style::new().bold();
        let classification = preview.classification;

        println!();
        println!("{}", bold.apply_to("Migration Preview:"));
        println!("┌─────────────────────────────────────────────────────────────┐");
        println!("│ Primaries:   {}", classification.primaries.len());
        println!("│ Replicas:    {}", classification.replicas.len());
        println!("│ Hubs:        {}", classification.hubs.join(", "));
        println!("│ Stages:      {}", classification.stage_count());
        if preview.link_issues > 0 {
            println!(
                "│ {}",
                Style::new()
                    .yellow()
                    .apply_to(format!("Link issues: {} (see logs)", preview.link_issues))
            );
        }
        println!("├─────────────────────────────────────────────────────────────┤");
        println!("│ Review: {}", preview.primaries_file.display());
        println!("│         {}", preview.replicas_file.display());
        println!("└─────────────────────────────────────────────────────────────┘");
        println!();

        let answer: String = Input::with_theme(&self.theme)
            .with_prompt("Would you like to proceed with the migration? (y/N)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))?;

        Ok(is_affirmative(&answer))
    }
}

/// Fixed answer, for `--yes` and plan-only runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _preview: &MigrationPreview<'_>) -> Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y"));
        assert!(is_affirmative("  y\n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative("yy"));
    }

    #[test]
    fn test_fixed_answer() {
        let classification = Classification::default();
        let preview = MigrationPreview {
            classification: &classification,
            primaries_file: PathBuf::from("p.txt"),
            replicas_file: PathBuf::from("r.txt"),
            link_issues: 0,
        };
        assert!(FixedAnswer(true).confirm(&preview).unwrap());
        assert!(!FixedAnswer(false).confirm(&preview).unwrap());
    }

    /// Blocks on the runtime from inside the prompt, which panics on an
    /// async worker thread.
    struct BlockingAnswer;

    impl Confirm for BlockingAnswer {
        fn confirm(&self, _preview: &MigrationPreview<'_>) -> Result<bool> {
            let handle = Handle::current();
            Ok(handle.block_on(async { true }))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_confirm_blocking_leaves_async_worker() {
        let classification = Classification::default();
        let preview = MigrationPreview {
            classification: &classification,
            primaries_file: PathBuf::from("p.txt"),
            replicas_file: PathBuf::from("r.txt"),
            link_issues: 0,
        };
        assert!(confirm_blocking(&BlockingAnswer, &preview).unwrap());
        assert!(!confirm_blocking(&FixedAnswer(false), &preview).unwrap());
    }

    #[test]
    fn test_confirm_blocking_without_runtime() {
        let classification = Classification::default();
        let preview = MigrationPreview {
            classification: &classification,
            primaries_file: PathBuf::from("p.txt"),
            replicas_file: PathBuf::from("r.txt"),
            link_issues: 0,
        };
        assert!(confirm_blocking(&FixedAnswer(true), &preview).unwrap());
    }
}
