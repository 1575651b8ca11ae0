//! Extraction session
//!
//! [`Extractor`] is the explicit session object front-ends drive. It is split
//! by concern:
//! - this module: construction, the single in-flight slot, event publishing
//! - [`pipeline`] - the background work (destination lease, tool run, fallback)
//!
//! `submit` runs selection checks, classification, multi-part validation and
//! tool location synchronously, then hands the process work to a tokio task.
//! Only one extraction runs at a time; submitting while busy is a no-op.

mod pipeline;


use crate::config::Config;
use crate::destination::{DestinationAccess, FsDestinationAccess};
use crate::error::{Error, Result};
use crate::extraction::{self, ExtractionPlan};
use crate::tools::{CliToolRunner, ToolLocator, ToolRunner};
use crate::types::{Event, ExtractionOutcome, Selection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Progress published when an attempt starts
pub const PROGRESS_STARTED: f32 = 0.0;
/// Progress published once destination access is held
pub const PROGRESS_ACCESS_ACQUIRED: f32 = 0.2;
/// Progress published once the primary tool process is running
pub const PROGRESS_LAUNCHED: f32 = 0.45;
/// Progress published once the fallback tool process is running
pub const PROGRESS_FALLBACK_LAUNCHED: f32 = 0.7;
/// Progress published after a successful extraction
pub const PROGRESS_DONE: f32 = 1.0;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Extraction session (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Extractor {
    /// Configuration (wrapped in Arc for sharing with the worker task)
    pub(crate) config: Arc<Config>,
    /// Resolves tool kinds to executables
    pub(crate) locator: Arc<ToolLocator>,
    /// Runs external tools (trait object for pluggable implementations)
    pub(crate) runner: Arc<dyn ToolRunner>,
    /// Grants destination folder access
    pub(crate) access: Arc<dyn DestinationAccess>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Set while an extraction is in flight
    pub(crate) in_flight: Arc<AtomicBool>,
}

/// What happened to a submitted selection
#[derive(Debug)]
pub enum Submission {
    /// Another extraction is running; nothing was done
    Busy,
    /// Rejected before any process was started (the error was also published)
    Rejected(Error),
    /// Running in the background
    Started(ExtractionHandle),
}

/// Handle to a background extraction
#[derive(Debug)]
pub struct ExtractionHandle {
    handle: JoinHandle<Result<ExtractionOutcome>>,
}

impl ExtractionHandle {
    /// Wait for the extraction to finish
    pub async fn wait(self) -> Result<ExtractionOutcome> {
        self.handle
            .await
            .map_err(|e| Error::Other(format!("extraction task failed: {}", e)))?
    }
}

/// Claim on the single in-flight slot, released on drop
pub(crate) struct InFlightSlot {
    flag: Arc<AtomicBool>,
}

impl InFlightSlot {
    fn try_claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Extractor {
    /// Create a session that spawns real processes on the plain filesystem
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_components(
            config,
            Arc::new(CliToolRunner::new()),
            Arc::new(FsDestinationAccess),
        ))
    }

    /// Create a session with custom runner and destination access
    pub fn with_components(
        config: Config,
        runner: Arc<dyn ToolRunner>,
        access: Arc<dyn DestinationAccess>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        debug!(runner = runner.name(), "extraction session created");
        Self {
            locator: Arc::new(ToolLocator::new(config.tools.clone())),
            config: Arc::new(config),
            runner,
            access,
            event_tx,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to status, progress and completion events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Whether an extraction is currently running
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Session configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Destination access provider used by this session
    pub fn access(&self) -> Arc<dyn DestinationAccess> {
        self.access.clone()
    }

    /// Start extracting `selection`
    ///
    /// Must be called from within a tokio runtime. Checks that need no process
    /// run before this returns; a rejected selection leaves no trace on disk.
    pub fn submit(&self, selection: Selection) -> Submission {
        let Some(slot) = InFlightSlot::try_claim(&self.in_flight) else {
            debug!("extraction already running, ignoring request");
            return Submission::Busy;
        };

        self.emit(Event::Status {
            message: "extracting...".to_string(),
        });
        self.emit(Event::Progress {
            fraction: PROGRESS_STARTED,
        });

        let (plan, program) = match self.prepare(selection) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.finish(slot, Err(&e), None);
                return Submission::Rejected(e);
            }
        };

        let worker = self.clone();
        let handle = tokio::spawn(async move {
            let destination = plan.request.destination.clone();
            let result = worker.run_plan(plan, program).await;
            worker.finish(slot, result.as_ref(), Some(&destination));
            result
        });

        Submission::Started(ExtractionHandle { handle })
    }

    /// Submit and wait for the result
    pub async fn extract(&self, selection: Selection) -> Result<ExtractionOutcome> {
        match self.submit(selection) {
            Submission::Busy => Err(Error::Busy),
            Submission::Rejected(e) => Err(e),
            Submission::Started(handle) => handle.wait().await,
        }
    }

    fn prepare(&self, selection: Selection) -> Result<(ExtractionPlan, PathBuf)> {
        let request = selection.into_request()?;
        let plan = extraction::prepare(&request)?;
        let program = self.locator.locate(plan.invocation.tool)?;
        Ok((plan, program))
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// Publish the terminal events and free the slot
    ///
    /// The slot is released before `Completed` goes out so a subscriber that
    /// reacts to it can submit again immediately.
    fn finish(
        &self,
        slot: InFlightSlot,
        result: std::result::Result<&ExtractionOutcome, &Error>,
        destination: Option<&Path>,
    ) {
        let (succeeded, message) = match result {
            Ok(outcome) => {
                let dest = destination.map(|d| d.display().to_string()).unwrap_or_default();
                info!(
                    tool = %outcome.tool,
                    fallback = outcome.used_fallback,
                    destination = %dest,
                    "extraction succeeded"
                );
                (true, format!("success: extracted to {}", dest))
            }
            Err(e) => {
                error!(code = e.code(), error = %e, "extraction failed");
                (false, e.to_string())
            }
        };

        self.emit(Event::Progress {
            fraction: if succeeded { PROGRESS_DONE } else { PROGRESS_STARTED },
        });
        self.emit(Event::Status {
            message: message.clone(),
        });
        drop(slot);

        let destination = if succeeded {
            destination.map(Path::to_path_buf)
        } else {
            None
        };
        if let Some(dest) = &destination
            && self.config.extraction.open_destination
        {
            crate::utils::reveal_in_file_manager(dest);
        }

        self.emit(Event::Completed {
            succeeded,
            message,
            destination,
        });
    }
}
