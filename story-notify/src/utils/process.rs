//! Child process helpers for the external login helper.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Create a `tokio::process::Command` that does not pop up a console window on Windows.
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    #[allow(unused_mut)]
    let mut cmd = tokio::process::Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.as_std_mut().creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Outcome of [`run_with_input`].
#[derive(Debug)]
pub enum RunOutcome {
    Finished(Output),
    TimedOut,
}

/// Spawn `cmd`, write `input` to its stdin, and collect its output within `timeout`.
///
/// The child is killed when the timeout elapses.
pub async fn run_with_input(
    mut cmd: tokio::process::Command,
    input: &[u8],
    timeout: Duration,
) -> std::io::Result<RunOutcome> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).await?;
        stdin.shutdown().await?;
    }

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(RunOutcome::Finished(output?)),
        // Dropping the future drops the child, which kills it.
        Err(_) => Ok(RunOutcome::TimedOut),
    }
}
