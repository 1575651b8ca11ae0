//! # nekorar
//!
//! Archive extraction front-end core: decides which external tool handles a
//! file, validates multi-part RAR sets, runs the tool off the caller's thread
//! and reports status, progress and completion as events.
//!
//! ## Design Philosophy
//!
//! nekorar does not decode archives itself. It is designed to be:
//! - **Tool-driven** - `unrar`, `7za`, `unar` and `tar` do the actual work
//! - **Fail early** - bad selections and incomplete volume sets never start a process
//! - **Event-driven** - front-ends subscribe to events, no polling required
//! - **One at a time** - a session runs a single extraction; extra requests are ignored
//!
//! ## Quick Start
//!
//! ```no_run
//! use nekorar::{Config, Extractor, Selection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = Extractor::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = extractor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let outcome = extractor
//!         .extract(Selection {
//!             source: Some("/downloads/movie.part01.rar".into()),
//!             password: None,
//!             destination: Some("/downloads/movie".into()),
//!         })
//!         .await?;
//!     println!("extracted with {}", outcome.tool);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Destination folder access grants
pub mod destination;
/// Error types
pub mod error;
/// Archive classification, volume validation and tool arguments
pub mod extraction;
/// Extraction session (decomposed into focused submodules)
pub mod extractor;
/// Archive handoff from other processes
pub mod handoff;
/// Persisted state
pub mod state;
/// External tool location and execution
pub mod tools;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ExtractionConfig, StateConfig, ToolsConfig};
pub use destination::{AccessToken, DestinationAccess, DestinationLease, FsDestinationAccess};
pub use error::{
    Error, ExtractError, PermissionError, Result, SelectionError, ValidationError,
};
pub use extractor::{ExtractionHandle, Extractor, Submission};
pub use state::{PersistedState, StateStore};
pub use types::{
    ArchiveKind, ArchiveRequest, Event, ExtractionOutcome, OutcomeStatus, Selection, ToolKind,
};
