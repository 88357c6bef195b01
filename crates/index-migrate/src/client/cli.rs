//! [`SearchClient`] backed by the `algolia` command-line tool.

use async_trait::async_trait;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

use super::SearchClient;
use crate::config::Profile;
use crate::error::{Error, Result};
use crate::index::{Category, IndexDescriptor, ListIndexResponse};

/// Placeholder shown instead of secrets in logged command lines.
const REDACTED: &str = "<redacted>";

/// Drives the `algolia` executable, one blocking invocation at a time.
#[derive(Debug, Clone)]
pub struct AlgoliaCli {
    binary: PathBuf,
}

impl Default for AlgoliaCli {
    fn default() -> Self {
        Self::new("algolia")
    }
}

/// Arguments of one invocation, with secret positions remembered for
/// redaction.
struct Invocation {
    args: Vec<OsString>,
    secrets: Vec<usize>,
}

impl Invocation {
    fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            secrets: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn secret(mut self, arg: impl Into<OsString>) -> Self {
        self.secrets.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    fn describe(&self, binary: &Path) -> String {
        let mut parts = vec![binary.display().to_string()];
        parts.extend(self.args.iter().enumerate().map(|(i, arg)| {
            if self.secrets.contains(&i) {
                REDACTED.to_string()
            } else {
                arg.to_string_lossy().into_owned()
            }
        }));
        parts.join(" ")
    }
}

impl AlgoliaCli {
    /// Creates a client invoking `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The executable this client invokes.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn browse_subcommand(category: Category) -> [&'static str; 2] {
        match category {
            Category::Settings => ["settings", "get"],
            other => [other.as_str(), "browse"],
        }
    }

    async fn run(&self, invocation: &Invocation, stdout: Stdio) -> Result<Output> {
        let command_line = invocation.describe(&self.binary);
        debug!(command = %command_line, "Running search client");

        let spawn_failure = |e: std::io::Error| Error::Client {
            command: command_line.clone(),
            status: "spawn failure".to_string(),
            stderr: e.to_string(),
        };

        // `output()` would re-pipe stdout; spawn so a file-backed stdout is kept.
        let child = Command::new(&self.binary)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_failure)?;
        let output = child.wait_with_output().await.map_err(spawn_failure)?;

        if !output.status.success() {
            return Err(Error::Client {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl SearchClient for AlgoliaCli {
    async fn check_available(&self) -> Result<()> {
        let invocation = Invocation::new(["--help"]);
        match self.run(&invocation, Stdio::null()).await {
            Ok(_) => Ok(()),
            Err(Error::Client { status, stderr, .. }) => Err(Error::ToolUnavailable {
                binary: self.binary.display().to_string(),
                reason: if stderr.is_empty() { status } else { stderr },
            }),
            Err(e) => Err(e),
        }
    }

    async fn create_profile(&self, profile: &Profile) -> Result<()> {
        let invocation = Invocation::new(["profile", "add", "--name", profile.name.as_str()])
            .arg("--app-id")
            .arg(profile.app_id.as_str())
            .arg("--api-key")
            .secret(profile.api_key.as_str());
        self.run(&invocation, Stdio::null()).await?;
        Ok(())
    }

    async fn delete_profile(&self, name: &str) -> Result<()> {
        let invocation = Invocation::new(["profile", "remove", name]);
        self.run(&invocation, Stdio::null()).await?;
        Ok(())
    }

    async fn list_indices(&self, profile: &str) -> Result<Vec<IndexDescriptor>> {
        let invocation = Invocation::new(["indices", "list", "-p", profile, "-o", "json"]);
        let output = self.run(&invocation, Stdio::piped()).await?;
        let response: ListIndexResponse = serde_json::from_slice(&output.stdout)?;
        Ok(response.items)
    }

    async fn export(
        &self,
        category: Category,
        index: &str,
        profile: &str,
        dest: &Path,
    ) -> Result<()> {
        let file = File::create(dest).map_err(|e| Error::artifact(dest, e))?;
        let invocation = Invocation::new(Self::browse_subcommand(category))
            .arg(index)
            .arg("-p")
            .arg(profile);
        self.run(&invocation, Stdio::from(file)).await?;
        Ok(())
    }

    async fn import(
        &self,
        category: Category,
        index: &str,
        profile: &str,
        src: &Path,
    ) -> Result<()> {
        let invocation = Invocation::new([category.as_str(), "import", index])
            .arg("-p")
            .arg(profile)
            .arg("-F")
            .arg(src.as_os_str());
        self.run(&invocation, Stdio::null()).await?;
        Ok(())
    }
}
