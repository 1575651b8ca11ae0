//! Background part of an extraction: everything that touches the destination
//! or starts a process.

use super::{Extractor, PROGRESS_ACCESS_ACQUIRED, PROGRESS_FALLBACK_LAUNCHED, PROGRESS_LAUNCHED};
use crate::destination::DestinationLease;
use crate::error::{PermissionError, Result};
use crate::extraction::{ExtractionPlan, fallback_plan, outcome_error, outcome_from_output};
use crate::tools::RunObserver;
use crate::types::{ArchiveKind, Event, ExtractionOutcome, OutcomeStatus, ToolKind};
use crate::utils::{check_writable, has_new_entries, snapshot_entries};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Publishes a progress step when the tool process starts
struct LaunchObserver<'a> {
    events: &'a broadcast::Sender<Event>,
    fraction: f32,
}

impl RunObserver for LaunchObserver<'_> {
    fn spawned(&self, pid: Option<u32>) {
        debug!(?pid, "tool process started");
        self.events
            .send(Event::Progress {
                fraction: self.fraction,
            })
            .ok();
    }
}

impl Extractor {
    /// Run a prepared plan while holding the destination lease
    ///
    /// The lease is released after the tool (and any fallback) has exited, or
    /// after a preparation/spawn failure, never before.
    pub(super) async fn run_plan(
        &self,
        plan: ExtractionPlan,
        program: PathBuf,
    ) -> Result<ExtractionOutcome> {
        let lease = DestinationLease::acquire(self.access.clone(), &plan.request.destination)?;
        self.emit(Event::Progress {
            fraction: PROGRESS_ACCESS_ACQUIRED,
        });

        let result = self.run_with_lease(&plan, &program).await;

        lease.release();
        result
    }

    async fn run_with_lease(&self, plan: &ExtractionPlan, program: &Path) -> Result<ExtractionOutcome> {
        let destination = &plan.request.destination;
        prepare_destination(destination)?;

        let fallback_enabled = plan.kind == ArchiveKind::Rar && self.config.tools.rar_fallback;

        let tool = plan.invocation.tool;
        self.emit(Event::Status {
            message: format!("running {} on {}", tool, display_name(&plan.request.source)),
        });

        let observer = LaunchObserver {
            events: &self.event_tx,
            fraction: PROGRESS_LAUNCHED,
        };
        let output = self
            .runner
            .run(program, &plan.invocation.args, &observer)
            .await?;

        let outcome = outcome_from_output(
            plan.kind,
            tool,
            output,
            &self.config.extraction.corruption_markers,
        );

        if !outcome.succeeded
            && fallback_enabled
            && let Some(recovered) = self.try_fallback(plan).await
        {
            return Ok(recovered);
        }

        match outcome_error(&outcome, &plan.request.source) {
            Some(err) => Err(err),
            None => Ok(outcome),
        }
    }

    /// Retry a failed RAR extraction with `unar`
    ///
    /// Success requires exit code 0 and at least one entry created or changed
    /// by `unar` itself; whatever the failed `unrar` run left behind is part of
    /// the baseline. Any other result keeps the primary tool's failure.
    async fn try_fallback(&self, plan: &ExtractionPlan) -> Option<ExtractionOutcome> {
        let program = match self.locator.locate(ToolKind::Unar) {
            Ok(program) => program,
            Err(e) => {
                debug!(error = %e, "RAR fallback tool unavailable");
                return None;
            }
        };

        info!(archive = ?plan.request.source, "unrar failed, retrying with unar");
        self.emit(Event::Status {
            message: format!("retrying {} with unar", display_name(&plan.request.source)),
        });

        let destination = &plan.request.destination;
        let invocation = fallback_plan(&plan.request);
        let observer = LaunchObserver {
            events: &self.event_tx,
            fraction: PROGRESS_FALLBACK_LAUNCHED,
        };
        let before = snapshot_entries(destination);
        let output = match self.runner.run(&program, &invocation.args, &observer).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "RAR fallback tool could not be started");
                return None;
            }
        };

        if output.is_success() && has_new_entries(&before, destination) {
            Some(ExtractionOutcome {
                succeeded: true,
                exit_code: output.exit_code,
                combined_output: output.combined,
                status: OutcomeStatus::Success,
                tool: ToolKind::Unar,
                used_fallback: true,
            })
        } else {
            warn!(
                exit_code = output.exit_code,
                ?destination,
                "RAR fallback did not produce any output"
            );
            None
        }
    }
}

/// Create the destination (with parents) and check it can be written to
fn prepare_destination(destination: &Path) -> Result<()> {
    if let Err(e) = std::fs::create_dir_all(destination) {
        warn!(?destination, error = %e, "cannot create destination");
        return Err(match e.kind() {
            std::io::ErrorKind::NotFound => PermissionError::DestinationMissing {
                path: destination.to_path_buf(),
            },
            _ => PermissionError::DestinationNotWritable {
                path: destination.to_path_buf(),
                reason: e.to_string(),
            },
        }
        .into());
    }

    check_writable(destination).map_err(|e| {
        warn!(?destination, error = %e, "destination is not writable");
        PermissionError::DestinationNotWritable {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
