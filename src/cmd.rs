use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{DeployError, DeployResult};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Extra settings for a local command beyond program and args.
#[derive(Debug, Clone, Copy, Default)]
pub struct Opts<'a> {
    /// Environment variables added to the child.
    pub env: &'a [(&'a str, &'a str)],
    /// Written to the child's stdin, which is closed afterwards.
    pub input: Option<&'a [u8]>,
    /// Masked in logged command lines, errors and forwarded output.
    pub secret: Option<&'a str>,
}

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> DeployResult<String> {
    run_with(program, args, &Opts::default())
}

/// Like [`run`], with environment, stdin and redaction.
pub fn run_with(program: &str, args: &[&str], opts: &Opts<'_>) -> DeployResult<String> {
    let output = capture(program, args, opts)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = redact(String::from_utf8_lossy(&output.stderr).trim(), opts.secret);
        let command = format_command(program, args, opts.secret);
        warn!(%command, %stderr, "command failed");
        Err(DeployError::CommandFailed {
            command,
            status: output.status,
        })
    }
}

/// Run a command to completion and hand back its raw output,
/// whatever the exit status.
pub fn capture(program: &str, args: &[&str], opts: &Opts<'_>) -> DeployResult<Output> {
    debug!(command = %format_command(program, args, opts.secret), "running");

    let mut child = base(program, args, opts)
        .stdin(stdin_mode(opts))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    if let (Some(data), Some(stdin)) = (opts.input, child.stdin.take()) {
        feed(stdin, data)?;
    }

    Ok(child.wait_with_output()?)
}

/// Run a command, forwarding every stdout/stderr line into the log
/// as it arrives. The child is killed once `timeout` elapses.
pub fn stream(
    program: &str,
    args: &[&str],
    opts: &Opts<'_>,
    timeout: Option<Duration>,
) -> DeployResult<()> {
    let command = format_command(program, args, opts.secret);
    debug!(%command, "running");

    let mut child = base(program, args, opts)
        .stdin(stdin_mode(opts))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let secret = opts.secret.map(str::to_string);
    let forwarders = [
        child.stdout.take().map(|out| forward(out, Stream::Out, secret.clone())),
        child.stderr.take().map(|err| forward(err, Stream::Err, secret.clone())),
    ];

    if let (Some(data), Some(stdin)) = (opts.input, child.stdin.take()) {
        feed(stdin, data)?;
    }

    let status = wait(&mut child, timeout)?;
    join(forwarders);

    match status {
        Some(status) if status.success() => Ok(()),
        Some(status) => Err(DeployError::CommandFailed { command, status }),
        None => Err(DeployError::Timeout {
            command,
            after: timeout.unwrap_or_default(),
        }),
    }
}

/// Connect `from`'s stdout to `into`'s stdin, like `a | b` in a
/// shell. Both sides must exit successfully.
pub fn pipe(from: (&str, &[&str]), into: (&str, &[&str])) -> DeployResult<()> {
    let (producer, producer_args) = from;
    let (consumer, consumer_args) = into;
    let left = format_command(producer, producer_args, None);
    let right = format_command(consumer, consumer_args, None);
    debug!(command = %format!("{left} | {right}"), "running");

    let mut source = Command::new(producer)
        .args(producer_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(producer, e))?;

    let Some(source_out) = source.stdout.take() else {
        let _ = source.kill();
        return Err(DeployError::Other(format!("{producer} has no stdout")));
    };
    let source_err = source.stderr.take().map(|err| forward(err, Stream::Err, None));

    let mut sink = match Command::new(consumer)
        .args(consumer_args)
        .stdin(Stdio::from(source_out))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            let _ = source.kill();
            let _ = source.wait();
            return Err(spawn_error(consumer, e));
        }
    };
    let sink_out = [
        sink.stdout.take().map(|out| forward(out, Stream::Out, None)),
        sink.stderr.take().map(|err| forward(err, Stream::Err, None)),
    ];

    let sink_status = sink.wait()?;
    let source_status = source.wait()?;
    join([source_err]);
    join(sink_out);

    if !source_status.success() {
        return Err(DeployError::CommandFailed {
            command: left,
            status: source_status,
        });
    }
    if !sink_status.success() {
        return Err(DeployError::CommandFailed {
            command: right,
            status: sink_status,
        });
    }
    Ok(())
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Replace every occurrence of `secret` in `text` with `***`.
#[must_use]
pub fn redact(text: &str, secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => text.replace(s, "***"),
        _ => text.to_string(),
    }
}

fn base(program: &str, args: &[&str], opts: &Opts<'_>) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in opts.env {
        command.env(key, value);
    }
    command
}

fn stdin_mode(opts: &Opts<'_>) -> Stdio {
    if opts.input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

// A child that exits before reading all of its input is reported
// through its exit status, not as a broken pipe.
fn feed(mut stdin: ChildStdin, data: &[u8]) -> DeployResult<()> {
    match stdin.write_all(data) {
        Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e.into()),
        _ => Ok(()),
    }
}

/// Which child pipe a forwarded line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Out,
    Err,
}

fn forward<R: Read + Send + 'static>(
    reader: R,
    stream: Stream,
    secret: Option<String>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            emit(&redact(&line, secret.as_deref()), stream);
        }
    })
}

// Child stderr is logged as a warning so it reaches the terminal's
// stderr.
fn emit(line: &str, stream: Stream) {
    match stream {
        Stream::Out => info!("{line}"),
        Stream::Err => warn!("{line}"),
    }
}

fn join<const N: usize>(handles: [Option<JoinHandle<()>>; N]) {
    for handle in handles.into_iter().flatten() {
        let _ = handle.join();
    }
}

fn wait(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> DeployError {
    if e.kind() == ErrorKind::NotFound {
        DeployError::CommandNotFound(program.to_string())
    } else {
        DeployError::Io(e)
    }
}

fn format_command(program: &str, args: &[&str], secret: Option<&str>) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    redact(&parts.join(" "), secret)
}
