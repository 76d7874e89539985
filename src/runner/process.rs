//! Direct process runner
//!
//! Spawns the program without a shell and in its own process group, so a
//! timeout can take down everything it started with a single signal.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{CommandSpec, RunError, RunLimits, RunOutcome, Runner};
use crate::core::FailureKind;

/// Runner that executes programs directly on the host
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a program, feeding `stdin_content` and killing it after `time_ms`
    pub async fn execute(
        &self,
        cmd: &CommandSpec,
        time_ms: u64,
        stdin_content: Option<&str>,
    ) -> Result<RunOutcome, RunError> {
        debug!("Running program: {}", cmd.display());

        if cmd.program.is_empty() {
            return Err(RunError::Spawn {
                program: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        }

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }

        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: cmd.program.clone(),
            source,
        })?;
        // tracked by id: the group can outlive its leader
        let mut group = ProcessGroup::new(child.id());

        // stdin is written while stdout/stderr drain, so neither side can fill a pipe and stall
        let input = stdin_content.unwrap_or_default().to_owned();
        let mut stdin_task = child.stdin.take().map(|mut pipe| {
            tokio::spawn(async move {
                pipe.write_all(input.as_bytes()).await?;
                pipe.shutdown().await
            })
        });
        let mut stdout_task = spawn_reader(child.stdout.take());
        let mut stderr_task = spawn_reader(child.stderr.take());

        let finished = tokio::time::timeout(Duration::from_millis(time_ms), async {
            let status = child.wait().await?;
            let stdout = join_reader(&mut stdout_task).await?;
            let stderr = join_reader(&mut stderr_task).await?;
            if let Some(task) = stdin_task.as_mut() {
                match task.await {
                    Ok(Ok(())) => {}
                    // program exited without reading all of its input
                    Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Ok(Err(e)) => return Err(e),
                    Err(e) => return Err(std::io::Error::other(e)),
                }
            }
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (status, stdout, stderr) = match finished {
            Ok(result) => result.map_err(|source| RunError::Io {
                program: cmd.program.clone(),
                source,
            })?,
            Err(_) => {
                terminate(&mut child, &mut group).await?;
                stdout_task.abort();
                stderr_task.abort();
                if let Some(task) = stdin_task {
                    task.abort();
                }
                debug!(
                    "Program {} killed after {}ms (limit {}ms)",
                    cmd.program, elapsed_ms, time_ms
                );
                return Err(RunError::Timeout {
                    limit_ms: time_ms,
                    elapsed_ms,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&stdout).to_string();
        let stderr = String::from_utf8_lossy(&stderr).to_string();

        if status.success() {
            return Ok(RunOutcome {
                stdout,
                stderr,
                exit_code: 0,
                elapsed_ms,
            });
        }

        let failure = failure_kind(status);
        let message = if stderr.trim().is_empty() {
            match &failure {
                FailureKind::Exited { code } => format!("Process exited with code {}", code),
                FailureKind::Signaled { signal } => format!("Process terminated by {}", signal),
                FailureKind::SpawnFailed => "Process failed to start".to_string(),
            }
        } else {
            stderr.clone()
        };

        Err(RunError::RuntimeError {
            failure,
            message,
            stdout,
            stderr,
            elapsed_ms,
        })
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome, RunError> {
        self.execute(cmd, limits.time_ms, stdin).await
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn join_reader(
    task: &mut JoinHandle<std::io::Result<Vec<u8>>>,
) -> std::io::Result<Vec<u8>> {
    task.await.map_err(std::io::Error::other)?
}

/// Process group of a spawned child.
///
/// Dropping it sends SIGKILL to the group, so helpers a program started in the
/// background die with it on every exit path, including a dropped future.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    /// Send SIGKILL to the whole group once. A group that is already gone is not an error.
    fn kill(&mut self) -> Result<(), RunError> {
        let Some(pgid) = self.pgid.take() else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(errno) => {
                    return Err(RunError::KillFailed {
                        pid: pgid,
                        reason: errno.to_string(),
                    });
                }
            }
        }

        #[cfg(not(unix))]
        let _ = pgid;

        Ok(())
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Err(e) = self.kill() {
            warn!("{}", e);
        }
    }
}

/// Kill the child's process group and reap the child
async fn terminate(child: &mut Child, group: &mut ProcessGroup) -> Result<(), RunError> {
    let pid = group.pgid.unwrap_or_default();
    group.kill().map_err(|e| {
        warn!("Timed out program left running: {}", e);
        e
    })?;

    #[cfg(not(unix))]
    if let Err(e) = child.start_kill() {
        // already exited
        if e.kind() != std::io::ErrorKind::InvalidInput {
            return Err(RunError::KillFailed {
                pid,
                reason: e.to_string(),
            });
        }
    }

    // returns the cached status if the timed out wait already reaped the leader
    child.wait().await.map_err(|e| RunError::KillFailed {
        pid,
        reason: format!("failed to reap: {}", e),
    })?;

    Ok(())
}

#[cfg(unix)]
fn failure_kind(status: ExitStatus) -> FailureKind {
    use nix::sys::signal::Signal;
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => FailureKind::Exited { code },
        (None, Some(sig)) => {
            let signal = Signal::try_from(sig)
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|_| format!("signal {}", sig));
            FailureKind::Signaled { signal }
        }
        (None, None) => FailureKind::Exited { code: -1 },
    }
}

#[cfg(not(unix))]
fn failure_kind(status: ExitStatus) -> FailureKind {
    FailureKind::Exited {
        code: status.code().unwrap_or(-1),
    }
}
