//! Subprocess runner built on `tokio::process`

use super::traits::{ProcessOutput, RunObserver, ToolRunner};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Runs tools as child processes with stdout and stderr piped
///
/// Both pipes are read as data arrives, one line at a time, so progress output
/// reaches the observer while the tool is still working. The combined output
/// keeps lines in arrival order.
#[derive(Debug, Default, Clone)]
pub struct CliToolRunner;

impl CliToolRunner {
    /// Create a new runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for CliToolRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[OsString],
        observer: &dyn RunObserver,
    ) -> crate::Result<ProcessOutput> {
        let tool = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());

        debug!(%tool, ?program, ?args, "spawning external tool");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                warn!(%tool, ?program, error = %source, "failed to spawn external tool");
                crate::Error::Spawn {
                    tool: tool.clone(),
                    source,
                }
            })?;

        observer.spawned(child.id());

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let collect = async {
            let mut combined = String::new();
            while let Some(line) = rx.recv().await {
                debug!(%tool, "{}", line);
                observer.output_line(&line);
                combined.push_str(&line);
                combined.push('\n');
            }
            combined
        };

        // The collector finishes once both readers have dropped their senders
        let (_, _, combined) = tokio::join!(
            forward_lines(stdout, tx.clone()),
            forward_lines(stderr, tx),
            collect
        );

        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(-1);

        if status.success() {
            info!(%tool, exit_code, "external tool finished");
        } else {
            warn!(%tool, exit_code, output = %combined, "external tool exited with failure");
        }

        Ok(ProcessOutput {
            exit_code,
            combined,
        })
    }

    fn name(&self) -> &'static str {
        "cli"
    }
}

/// Read `stream` line by line and send each line to `tx`
///
/// Output is decoded lossily; tools print file names in whatever encoding the
/// archive used.
async fn forward_lines<R>(stream: Option<R>, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let mut segments = BufReader::new(stream).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let line = String::from_utf8_lossy(&bytes);
                let line = line.trim_end_matches('\r');
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "error reading tool output");
                break;
            }
        }
    }
}
