//! External extraction tools
//!
//! The core abstraction is the [`ToolRunner`] trait: run a program with
//! arguments, stream its output, and report the exit code. Implementations:
//!
//! - [`CliToolRunner`]: spawns a child process with `tokio::process`
//!
//! [`ToolLocator`] decides which executable a [`crate::types::ToolKind`] maps
//! to (configured path, bundle directory, or PATH).

mod cli;
mod locate;
mod traits;

pub use cli::CliToolRunner;
pub use locate::ToolLocator;
pub use traits::{NoopObserver, ProcessOutput, RunObserver, ToolRunner};
