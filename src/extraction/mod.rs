//! Archive classification, volume validation and tool argument building
//!
//! This module holds the decision logic that runs before and after an external
//! extractor: which tool a file name maps to, which arguments it gets, whether
//! a multi-part RAR set is complete enough to start, and how a finished run is
//! classified.

mod dispatch;
mod multipart;
mod outcome;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use dispatch::{ToolInvocation, classify, fallback_plan, plan};
pub use multipart::{
    MultipartSet, VolumeCheck, is_multipart_volume, scan_volumes, validate_volumes,
};
pub use outcome::{classify_output, detects_corruption, outcome_error, outcome_from_output};

use crate::error::{Error, Result};
use crate::types::{ArchiveKind, ArchiveRequest};
use tracing::info;

/// Everything decided before a process is started
#[derive(Clone, Debug)]
pub struct ExtractionPlan {
    /// Archive kind of the selected file
    pub kind: ArchiveKind,
    /// Request the tool will run with (source may be volume one of a set)
    pub request: ArchiveRequest,
    /// Primary tool invocation
    pub invocation: ToolInvocation,
    /// Volume set, when the selection was a `partNN.rar` file
    pub volumes: Option<MultipartSet>,
}

/// Validate and dispatch a request
///
/// Runs the multi-part check for RAR files, then builds the tool invocation.
/// Unsupported files and incomplete volume sets are rejected here, with no
/// side effects.
///
/// # Example
/// ```no_run
/// use nekorar::extraction::prepare;
/// use nekorar::ArchiveRequest;
///
/// # fn example() -> nekorar::Result<()> {
/// let request = ArchiveRequest::new("movie.part01.rar", "/tmp/out", None);
/// let plan = prepare(&request)?;
/// println!("running {} {:?}", plan.invocation.tool, plan.invocation.args);
/// # Ok(())
/// # }
/// ```
pub fn prepare(request: &ArchiveRequest) -> Result<ExtractionPlan> {
    let kind = classify(&request.source);
    if !kind.is_supported() {
        return Err(Error::UnsupportedFormat {
            path: request.source.clone(),
        });
    }

    let mut effective = request.clone();
    let mut volumes = None;
    if kind == ArchiveKind::Rar
        && let VolumeCheck::Multipart(set) = validate_volumes(&request.source)?
    {
        if let Some(first) = set.first_volume() {
            effective = request.with_source(first);
        }
        volumes = Some(set);
    }

    let invocation = plan(kind, &effective).ok_or_else(|| Error::UnsupportedFormat {
        path: request.source.clone(),
    })?;

    info!(
        archive = ?request.source,
        source = ?effective.source,
        %kind,
        tool = %invocation.tool,
        "dispatching extraction"
    );

    Ok(ExtractionPlan {
        kind,
        request: effective,
        invocation,
        volumes,
    })
}
