// src/collab/command.rs

//! Runs a user-configured external command for a transform step.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Environment variable holding the newline-separated input files.
pub const INPUTS_ENV: &str = "ASSETRUN_INPUTS";
/// Environment variable holding the output directory.
pub const OUTPUT_ENV: &str = "ASSETRUN_OUTPUT";

/// Run `cmd` through the platform shell from `cwd`.
///
/// The inputs and output directory are passed through [`INPUTS_ENV`] and
/// [`OUTPUT_ENV`]. Stdout and stderr are drained and logged at debug level. A
/// non-zero exit status is an error.
pub async fn run_transform_command(
    step: &str,
    cmd: &str,
    cwd: &Path,
    inputs: &[PathBuf],
    output: &Path,
) -> Result<()> {
    info!(step, cmd, inputs = inputs.len(), "running transform command");

    let joined = inputs
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .current_dir(cwd)
        .env(INPUTS_ENV, joined)
        .env(OUTPUT_ENV, output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning command for transform '{step}'"))?;

    if let Some(stdout) = child.stdout.take() {
        let step = step.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(step = %step, "stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let step = step.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(step = %step, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for command of transform '{step}'"))?;

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        bail!("transform '{step}' command exited with code {code}");
    }

    debug!(step, "transform command finished");
    Ok(())
}
