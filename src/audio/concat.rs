//! Lossless assembly of chunk files into one MP3.
//!
//! A single chunk file is returned as-is: the bytes the synthesis backend
//! produced ARE the episode, and no external tool runs at all.
//!
//! Multiple files go through ffmpeg's concat demuxer with `-c copy`, which
//! splices the streams at the container level without re-encoding.  The
//! input list is written into the working area, in chunk order, with shell
//! quoting handled by the demuxer's own escape rules.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;
use tokio::process::Command;

use crate::workdir::WorkingArea;

/// Name of the assembled output inside the working area.
pub const OUTPUT_FILE: &str = "audio.mp3";

/// Name of the concat demuxer's input list inside the working area.
const LIST_FILE: &str = "concat.txt";

// ---------------------------------------------------------------------------
// ConcatError
// ---------------------------------------------------------------------------

/// Errors from the assembly step.
#[derive(Debug, Error)]
pub enum ConcatError {
    /// The file list was empty; there is nothing to assemble.
    #[error("no chunk files to assemble")]
    NoInput,

    /// The `ffmpeg` binary could not be spawned at all.
    #[error("ffmpeg not found; install it and make sure it is on PATH")]
    FfmpegMissing,

    /// ffmpeg ran but exited with a failure status.
    #[error("ffmpeg exited with {status}: {stderr}")]
    FfmpegFailed { status: String, stderr: String },

    /// Filesystem error around the concat list or output.
    #[error("concat IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// assemble
// ---------------------------------------------------------------------------

/// Join `files` (already in chunk order) into a single MP3 and return its
/// path.
///
/// With exactly one input file that file is returned unchanged; ffmpeg is
/// never invoked and the output stays byte-identical.
pub async fn assemble(area: &WorkingArea, files: &[PathBuf]) -> Result<PathBuf, ConcatError> {
    match files {
        [] => Err(ConcatError::NoInput),
        [only] => {
            log::debug!("audio: single chunk file, skipping concatenation");
            Ok(only.clone())
        }
        _ => concat_with_ffmpeg(area, files).await,
    }
}

async fn concat_with_ffmpeg(
    area: &WorkingArea,
    files: &[PathBuf],
) -> Result<PathBuf, ConcatError> {
    let list_path = area.file(LIST_FILE);
    let output = area.file(OUTPUT_FILE);

    fs::write(&list_path, concat_list(files))
        .await
        .map_err(|source| ConcatError::Io {
            path: list_path.clone(),
            source,
        })?;

    log::debug!(
        "audio: concatenating {} files into {}",
        files.len(),
        output.display()
    );

    let run = Command::new("ffmpeg")
        .arg("-y")
        .args(["-f", "concat"])
        .args(["-safe", "0"])
        .arg("-i")
        .arg(&list_path)
        .args(["-c", "copy"])
        .arg(&output)
        .output()
        .await;

    let done = match run {
        Ok(done) => done,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConcatError::FfmpegMissing),
        Err(source) => {
            return Err(ConcatError::Io {
                path: output,
                source,
            })
        }
    };

    if !done.status.success() {
        return Err(ConcatError::FfmpegFailed {
            status: done.status.to_string(),
            stderr: String::from_utf8_lossy(&done.stderr).into_owned(),
        });
    }

    Ok(output)
}

/// Render the concat demuxer's input list: one `file '...'` line per input,
/// single quotes escaped the way the demuxer expects (`'` becomes `'\''`).
fn concat_list(files: &[PathBuf]) -> String {
    let mut list = String::new();
    for path in files {
        let quoted = path.display().to_string().replace('\'', r"'\''");
        list.push_str("file '");
        list.push_str(&quoted);
        list.push_str("'\n");
    }
    list
}

/// Whether an `ffmpeg` binary is runnable on this machine.
pub async fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
