//! Running external command-line tools with a deadline.
//!
//! Output pipes are drained on helper threads while the child runs, so a
//! tool writing a large image to stdout cannot fill the pipe and stall.
//! When the deadline passes the child is killed and reaped.
//!
//! A grandchild the tool left behind can keep the pipes open after the tool
//! itself is gone. The reader threads are therefore never joined on the kill
//! path, and with a deadline set their output is awaited for at most
//! [`PIPE_GRACE`]. Abandoned readers exit once the last writer closes.

use crate::strategy::StrategyError;
use std::ffi::OsStr;
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// How long to wait for pipe output after the tool has exited.
pub const PIPE_GRACE: Duration = Duration::from_secs(1);

/// Run `program` with `args` and return its stdout.
///
/// A non-zero exit becomes [`StrategyError::ToolFailed`] carrying the
/// trimmed stderr. `deadline = None` waits indefinitely.
pub fn run_tool<I, S>(
    program: &str,
    args: I,
    deadline: Option<Duration>,
) -> Result<Vec<u8>, StrategyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StrategyError::ToolMissing {
                program: program.to_string(),
            },
            _ => StrategyError::Io(e),
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match deadline {
        Some(limit) => match child.wait_timeout(limit)? {
            Some(status) => status,
            None => {
                debug!(program, "deadline reached, killing");
                let _ = child.kill();
                let _ = child.wait();
                return Err(StrategyError::TimedOut(limit));
            }
        },
        None => child.wait()?,
    };

    let stdout = collect(&stdout, deadline);
    let stderr = collect(&stderr, deadline);

    if !status.success() {
        return Err(StrategyError::ToolFailed {
            program: program.to_string(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }
    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

fn collect(rx: &Receiver<Vec<u8>>, deadline: Option<Duration>) -> Vec<u8> {
    match deadline {
        Some(_) => rx.recv_timeout(PIPE_GRACE).unwrap_or_default(),
        None => rx.recv().unwrap_or_default(),
    }
}
