use std::io::{self, PipeReader, Read};
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ExecError;
use crate::request::Request;
use crate::workdir::WorkingDir;

/// Receiving end of the command queue
pub type CommandReceiver = mpsc::UnboundedReceiver<String>;

/// Whether the executor keeps draining the queue after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Build a command that hands `line` to the host shell as one command string
pub fn shell_command(line: &str) -> Command {
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    let mut cmd = Command::new(shell);
    cmd.args([flag, line]);
    cmd
}

/// Run a command in `dir`, streaming its merged stdout and stderr into
/// `output` as it is produced, and wait for it to exit.
///
/// Both streams share one pipe, so the output keeps the order in which
/// the command wrote it.
pub async fn run_command<W>(
    mut cmd: Command,
    dir: &Path,
    output: &mut W,
) -> Result<ExitStatus, ExecError>
where
    W: AsyncWrite + Unpin,
{
    let (reader, writer) = io::pipe().map_err(ExecError::Spawn)?;
    let writer_for_stderr = writer.try_clone().map_err(ExecError::Spawn)?;
    cmd.current_dir(dir)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_for_stderr);

    let spawned = cmd.spawn();
    // Our copies of the write end live in `cmd`; EOF only arrives once they are gone
    drop(cmd);
    let mut child = spawned.map_err(ExecError::Spawn)?;

    let forwarded = forward_output(reader, output).await;
    let status = child.wait().await.map_err(ExecError::Wait)?;
    forwarded.map_err(ExecError::Io)?;
    Ok(status)
}

async fn forward_output<W>(reader: PipeReader, output: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<io::Result<Vec<u8>>>();
    tokio::task::spawn_blocking(move || pump_pipe(reader, tx));

    while let Some(chunk) = rx.recv().await {
        output.write_all(&chunk?).await?;
        output.flush().await?;
    }
    Ok(())
}

/// Blocking read loop, ends at EOF or when the receiver goes away
fn pump_pipe(mut reader: PipeReader, tx: mpsc::UnboundedSender<io::Result<Vec<u8>>>) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

/// The single worker that drains the command queue.
///
/// Requests are interpreted strictly one at a time, so a `MOVE` always
/// lands before any `RUN` queued after it and command output never
/// interleaves.
pub struct Executor<W> {
    queue: CommandReceiver,
    workdir: WorkingDir,
    exit: CancellationToken,
    show_commands: bool,
    output: W,
}

impl<W> Executor<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(
        queue: CommandReceiver,
        workdir: WorkingDir,
        exit: CancellationToken,
        output: W,
    ) -> Self {
        Self {
            queue,
            workdir,
            exit,
            show_commands: false,
            output,
        }
    }

    /// Echo each `RUN` command line to the output before running it
    pub fn show_commands(mut self, show: bool) -> Self {
        self.show_commands = show;
        self
    }

    pub fn working_dir(&self) -> &Path {
        self.workdir.read()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Drain the queue until `EXIT`, cancellation, or every sender is gone.
    /// Hands the executor back so callers can inspect its final state.
    pub async fn run(mut self) -> Self {
        info!(dir = %self.workdir.read().display(), "executor started");
        loop {
            let raw = tokio::select! {
                biased;
                () = self.exit.cancelled() => break,
                next = self.queue.recv() => match next {
                    Some(raw) => raw,
                    None => {
                        info!("command queue closed");
                        break;
                    }
                },
            };

            if self.dispatch(&raw).await == Flow::Exit {
                break;
            }
        }
        info!("executor stopped");
        self
    }

    /// Interpret one raw request
    pub async fn dispatch(&mut self, raw: &str) -> Flow {
        let request = Request::parse(raw);
        debug!(kind = request.kind(), "dispatching request");
        match request {
            Request::Run(line) => {
                self.run_line(&line).await;
                Flow::Continue
            }
            Request::Move(path) => {
                self.move_to(&path);
                Flow::Continue
            }
            Request::Exit => {
                info!("exit requested");
                self.exit.cancel();
                Flow::Exit
            }
            Request::Unknown(raw) => {
                warn!(request = %raw, "unknown command");
                Flow::Continue
            }
        }
    }

    fn move_to(&mut self, path: &str) {
        if !Path::new(path).exists() {
            error!(dir = %path, "directory doesn't exist, not changing it");
            return;
        }
        self.workdir.write(path);
        info!(dir = %path, "working directory changed");
    }

    async fn run_line(&mut self, line: &str) {
        if line.is_empty() {
            warn!("RUN request without a command line");
            return;
        }

        if self.show_commands {
            let echo = format!("> {}\n", line);
            let written = match self.output.write_all(echo.as_bytes()).await {
                Ok(()) => self.output.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                warn!(err = %e, "failed to echo command");
            }
        }

        let dir = self.workdir.read().to_path_buf();
        match run_command(shell_command(line), &dir, &mut self.output).await {
            Ok(status) if status.success() => {
                debug!(command = %line, "command finished");
            }
            Ok(status) => {
                warn!(command = %line, %status, "command exited unsuccessfully");
            }
            Err(e) => {
                error!(command = %line, dir = %dir.display(), err = %e, "command failed");
            }
        }
    }
}
