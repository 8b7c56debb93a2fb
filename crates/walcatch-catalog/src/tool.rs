//! External tool invocation.
//!
//! The catalog listings come from running the backup tool and capturing
//! its stdout. A non-zero exit or non-UTF-8 output is an
//! [`WalcatchError::ExternalTool`] carrying the command line and whatever
//! the tool wrote to stderr. When the caller has a run deadline, the
//! child is waited on with that budget and killed on expiry, surfacing
//! [`WalcatchError::Timeout`] — a hung tool must not hang the run.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;
use walcatch_error::{Result, WalcatchError};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run `program args...` with no deadline, returning captured stdout.
pub fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    run_tool_bounded(program, args, None, "external-tool")
}

/// Run `program args...`, returning captured stdout as text.
///
/// `budget` bounds the child's wall-clock runtime; on expiry the child is
/// killed and reaped and the run fails with `Timeout { stage }`. `None`
/// blocks until the child exits.
pub fn run_tool_bounded(
    program: &str,
    args: &[&str],
    budget: Option<Duration>,
    stage: &'static str,
) -> Result<String> {
    if matches!(budget, Some(remaining) if remaining.is_zero()) {
        return Err(WalcatchError::Timeout { stage });
    }

    let command_line = render_command(program, args);
    debug!(command = %command_line, budget = ?budget, "invoking external tool");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| WalcatchError::external_tool(&command_line, err.to_string()))?;

    // Drain both pipes off-thread so a chatty child never blocks on a
    // full pipe while we wait on it.
    let stdout = drain_pipe(child.stdout.take());
    let stderr = drain_pipe(child.stderr.take());

    let status = wait_with_budget(&mut child, budget)
        .map_err(|err| WalcatchError::external_tool(&command_line, err.to_string()))?;
    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        let _ = stdout.join();
        let _ = stderr.join();
        return Err(WalcatchError::Timeout { stage });
    };

    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(WalcatchError::external_tool(
            &command_line,
            format!("{}: {}", status, stderr.trim()),
        ));
    }

    String::from_utf8(stdout)
        .map_err(|_| WalcatchError::external_tool(&command_line, "non-UTF-8 output"))
}

fn drain_pipe<P: Read + Send + 'static>(pipe: Option<P>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

/// Wait for the child within `budget`. `Ok(None)` means the budget ran
/// out with the child still alive.
fn wait_with_budget(
    child: &mut Child,
    budget: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(budget) = budget else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + budget;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        thread::sleep(WAIT_POLL_INTERVAL.min(remaining));
    }
}

fn render_command(program: &str, args: &[&str]) -> String {
    let mut rendered = program.to_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}
