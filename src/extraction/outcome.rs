use crate::error::{Error, ExtractError};
use crate::tools::ProcessOutput;
use crate::types::{ArchiveKind, ExtractionOutcome, OutcomeStatus, ToolKind};
use std::path::Path;

/// Whether captured output contains one of the corruption markers (case-insensitive)
pub fn detects_corruption(combined_output: &str, markers: &[String]) -> bool {
    let lower = combined_output.to_lowercase();
    markers
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .any(|m| lower.contains(&m))
}

/// Classify a finished process run
///
/// Exit code 0 is success no matter what was printed. Only a failed RAR run is
/// scanned for corruption markers, and only to pick a more specific failure.
pub fn classify_output(kind: ArchiveKind, output: &ProcessOutput, markers: &[String]) -> OutcomeStatus {
    if output.is_success() {
        OutcomeStatus::Success
    } else if kind == ArchiveKind::Rar && detects_corruption(&output.combined, markers) {
        OutcomeStatus::CorruptOrMissingVolume
    } else {
        OutcomeStatus::Failed
    }
}

/// Build the outcome record for a primary tool run
pub fn outcome_from_output(
    kind: ArchiveKind,
    tool: ToolKind,
    output: ProcessOutput,
    markers: &[String],
) -> ExtractionOutcome {
    let status = classify_output(kind, &output, markers);
    ExtractionOutcome {
        succeeded: status == OutcomeStatus::Success,
        exit_code: output.exit_code,
        combined_output: output.combined,
        status,
        tool,
        used_fallback: false,
    }
}

/// Convert a failed outcome into the error reported to the user
///
/// Returns `None` for successful outcomes.
pub fn outcome_error(outcome: &ExtractionOutcome, archive: &Path) -> Option<Error> {
    let err = match outcome.status {
        OutcomeStatus::Success => return None,
        OutcomeStatus::CorruptOrMissingVolume => ExtractError::CorruptOrMissingVolume {
            archive: archive.to_path_buf(),
            tool: outcome.tool,
            exit_code: outcome.exit_code,
            output: outcome.combined_output.clone(),
        },
        OutcomeStatus::Failed => ExtractError::ToolFailed {
            tool: outcome.tool,
            exit_code: outcome.exit_code,
            output: outcome.combined_output.clone(),
        },
    };
    Some(err.into())
}
