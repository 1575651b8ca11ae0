use crate::types::{ArchiveKind, ArchiveRequest, ToolKind};
use std::ffi::OsString;
use std::path::Path;

/// Classify a file by its name
///
/// Checked in order: single extensions (`rar`, `zip`, `7z`, `tgz`, `tbz`),
/// then the two-part suffixes `.tar.gz` / `.tar.bz2` on the whole file name,
/// then plain `tar`. Everything else is [`ArchiveKind::Unsupported`].
pub fn classify(path: &Path) -> ArchiveKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "rar" => return ArchiveKind::Rar,
        "zip" => return ArchiveKind::Zip,
        "7z" => return ArchiveKind::SevenZip,
        "tgz" => return ArchiveKind::TarGz,
        "tbz" => return ArchiveKind::TarBz2,
        _ => {}
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if name.ends_with(".tar.gz") {
        ArchiveKind::TarGz
    } else if name.ends_with(".tar.bz2") {
        ArchiveKind::TarBz2
    } else if ext == "tar" {
        ArchiveKind::Tar
    } else {
        ArchiveKind::Unsupported
    }
}

/// A fully built command line for one external tool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Which tool to run
    pub tool: ToolKind,
    /// Arguments, not including the program itself
    pub args: Vec<OsString>,
}

/// Build the primary tool invocation for a classified archive
///
/// Returns `None` for [`ArchiveKind::Unsupported`]; nothing is run in that case.
pub fn plan(kind: ArchiveKind, request: &ArchiveRequest) -> Option<ToolInvocation> {
    let invocation = match kind {
        ArchiveKind::Rar => unrar(request),
        ArchiveKind::Zip | ArchiveKind::SevenZip => sevenzip(request),
        ArchiveKind::TarGz => tar("-xzf", request),
        ArchiveKind::TarBz2 => tar("-xjf", request),
        ArchiveKind::Tar => tar("-xf", request),
        ArchiveKind::Unsupported => return None,
    };
    Some(invocation)
}

/// Build the `unar` invocation used when `unrar` fails
pub fn fallback_plan(request: &ArchiveRequest) -> ToolInvocation {
    let mut args: Vec<OsString> = vec![
        "-o".into(),
        request.destination.clone().into(),
        "-force-overwrite".into(),
    ];
    if let Some(password) = &request.password {
        args.push("-p".into());
        args.push(password.into());
    }
    args.push(request.source.clone().into());

    ToolInvocation {
        tool: ToolKind::Unar,
        args,
    }
}

// unrar x -y (-p<pwd> | -p-) <src> <dst>
fn unrar(request: &ArchiveRequest) -> ToolInvocation {
    // -p- stops unrar from prompting on stdin for encrypted archives
    let password_flag = match &request.password {
        Some(password) => format!("-p{}", password),
        None => "-p-".to_string(),
    };

    ToolInvocation {
        tool: ToolKind::Unrar,
        args: vec![
            "x".into(),
            "-y".into(),
            password_flag.into(),
            request.source.clone().into(),
            request.destination.clone().into(),
        ],
    }
}

// 7za x -y [-p<pwd>] <src> -o<dst>
fn sevenzip(request: &ArchiveRequest) -> ToolInvocation {
    let mut args: Vec<OsString> = vec!["x".into(), "-y".into()];
    if let Some(password) = &request.password {
        args.push(format!("-p{}", password).into());
    }
    args.push(request.source.clone().into());

    let mut output_flag = OsString::from("-o");
    output_flag.push(&request.destination);
    args.push(output_flag);

    ToolInvocation {
        tool: ToolKind::SevenZip,
        args,
    }
}

fn tar(mode: &str, request: &ArchiveRequest) -> ToolInvocation {
    ToolInvocation {
        tool: ToolKind::Tar,
        args: vec![
            mode.into(),
            request.source.clone().into(),
            "-C".into(),
            request.destination.clone().into(),
        ],
    }
}
