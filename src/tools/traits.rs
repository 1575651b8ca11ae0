//! Traits and types for running external extraction tools

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;

/// Captured result of one external process
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (-1 when the process was terminated by a signal)
    pub exit_code: i32,
    /// Stdout and stderr lines in the order they were read
    pub combined: String,
}

impl ProcessOutput {
    /// Returns `true` if the process exited with code 0
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Receives notifications while a tool runs
///
/// Called from the runner's task; implementations must not block.
pub trait RunObserver: Send + Sync {
    /// The process was started
    fn spawned(&self, pid: Option<u32>);

    /// One line of output was read (stdout or stderr)
    fn output_line(&self, _line: &str) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn spawned(&self, _pid: Option<u32>) {}
}

/// Trait for running an external tool to completion
///
/// The session only needs "spawn, collect output, wait, report exit code";
/// putting it behind a trait lets front-ends substitute sandbox-aware launchers
/// and lets tests script tool results without real binaries.
///
/// # Examples
///
/// ```no_run
/// use nekorar::tools::{CliToolRunner, NoopObserver, ToolRunner};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let runner = CliToolRunner::new();
/// let output = runner
///     .run(Path::new("/usr/bin/tar"), &["--version".into()], &NoopObserver)
///     .await?;
/// println!("exit {}: {}", output.exit_code, output.combined);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args`, returning once the process has exited
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Spawn`] if the process could not be started.
    /// A non-zero exit is *not* an error here; it is reported in the output.
    async fn run(
        &self,
        program: &Path,
        args: &[OsString],
        observer: &dyn RunObserver,
    ) -> crate::Result<ProcessOutput>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
