use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::args::VolleyArgs;
use crate::engine::ProcessResult;
use crate::error::{AppError, AppResult, FleetError};
use crate::rpc::{WorkerClient, run_request};

use super::handle::{FleetJob, WorkerHandle, WorkerState, invalid_state};
use super::poller::PollElapsed;
use super::settings::FleetTimeouts;

/// Prefix of the single stdout line a worker prints once it is listening.
pub const ANNOUNCE_PREFIX: &str = "volley-worker listening on ";

#[must_use]
pub fn announce_line(addr: SocketAddr) -> String {
    format!("{}{}", ANNOUNCE_PREFIX, addr)
}

/// How to launch a worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLaunch {
    pub executable: PathBuf,
    pub args: Vec<String>,
}

impl WorkerLaunch {
    /// Relaunches the running executable in worker mode, forwarding the
    /// options that shape request execution and logging.
    ///
    /// # Errors
    ///
    /// Returns an error when the current executable cannot be located.
    pub fn current(args: &VolleyArgs) -> AppResult<Self> {
        let executable = std::env::current_exe()
            .map_err(|err| AppError::fleet(FleetError::ExecutableNotFound { source: err }))?;
        Ok(Self {
            executable,
            args: worker_arguments(args),
        })
    }
}

pub(crate) fn worker_arguments(args: &VolleyArgs) -> Vec<String> {
    let mut forwarded = vec![
        "--server".to_owned(),
        "--server-host".to_owned(),
        args.server_host.clone(),
        "--server-port".to_owned(),
        "0".to_owned(),
        "--request-timeout".to_owned(),
        duration_arg(args.request_timeout),
        "--connect-timeout".to_owned(),
        duration_arg(args.connect_timeout),
    ];
    if args.verbose {
        forwarded.push("--verbose".to_owned());
    }
    if args.no_color {
        forwarded.push("--no-color".to_owned());
    }
    forwarded
}

fn duration_arg(value: Duration) -> String {
    format!("{}ms", value.as_millis().max(1))
}

/// A worker running as a child process of the controller.
///
/// The child is killed if the handle is dropped before a clean stop.
pub struct ProcessWorker {
    label: String,
    launch: WorkerLaunch,
    timeouts: FleetTimeouts,
    state: WorkerState,
    child: Option<Child>,
    client: Option<WorkerClient>,
}

impl ProcessWorker {
    #[must_use]
    pub const fn new(label: String, launch: WorkerLaunch, timeouts: FleetTimeouts) -> Self {
        Self {
            label,
            launch,
            timeouts,
            state: WorkerState::Starting,
            child: None,
            client: None,
        }
    }

    async fn launch_and_wait(&mut self) -> AppResult<()> {
        let mut child = Command::new(&self.launch.executable)
            .args(&self.launch.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AppError::fleet(FleetError::SpawnFailed { source: err }))?;
        info!(
            "{} spawned (pid {})",
            self.label,
            child.id().unwrap_or_default()
        );
        let stdout = child.stdout.take();
        self.child = Some(child);
        let stdout = stdout.ok_or_else(|| {
            AppError::fleet(FleetError::AnnounceMissing {
                timeout: self.timeouts.announce,
            })
        })?;

        let mut lines = BufReader::new(stdout).lines();
        let addr = read_announcement(&mut lines, self.timeouts.announce).await?;
        debug!("{} announced {}", self.label, addr);
        tokio::spawn(forward_output(self.label.clone(), lines));

        let attempts = self
            .timeouts
            .connect
            .wait_until(|| async move { TcpStream::connect(addr).await.is_ok() })
            .await
            .map_err(|elapsed| readiness_timeout("connectable", elapsed))?;
        debug!("{} connectable after {} attempts", self.label, attempts);

        let client = WorkerClient::new(addr);
        let ping_client = &client;
        self.timeouts
            .ready
            .wait_until(|| async move { ping_client.ping().await.unwrap_or(false) })
            .await
            .map_err(|elapsed| readiness_timeout("healthy", elapsed))?;
        self.client = Some(client);
        Ok(())
    }

    async fn reap(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        match tokio::time::timeout(self.timeouts.stop.timeout, child.wait()).await {
            Ok(Ok(status)) => debug!("{} exited with {}", self.label, status),
            Ok(Err(err)) => warn!("Failed to wait for {}: {}", self.label, err),
            Err(_elapsed) => {
                warn!("{} did not exit after kill; terminating", self.label);
                if let Err(err) = child.kill().await {
                    warn!("Failed to terminate {}: {}", self.label, err);
                }
            }
        }
    }
}

#[async_trait]
impl WorkerHandle for ProcessWorker {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> WorkerState {
        self.state
    }

    async fn start(&mut self) -> AppResult<()> {
        if self.state != WorkerState::Starting {
            return Err(invalid_state(&self.label, self.state, "starting"));
        }
        if let Err(err) = self.launch_and_wait().await {
            self.state = WorkerState::Dead;
            self.client = None;
            self.child = None;
            return Err(err);
        }
        info!("{} ready", self.label);
        self.state = WorkerState::Ready;
        Ok(())
    }

    async fn run(&mut self, job: &FleetJob) -> AppResult<ProcessResult> {
        if self.state != WorkerState::Ready {
            return Err(invalid_state(&self.label, self.state, "ready"));
        }
        let Some(client) = self.client.as_ref() else {
            return Err(invalid_state(&self.label, self.state, "connected"));
        };
        let request = run_request(&job.items, &job.config)?;
        self.state = WorkerState::Running;
        let result = client.run(request).await;
        match &result {
            Ok(process) => info!(
                "{} finished: {} transactions",
                self.label, process.transactions
            ),
            Err(_) => self.state = WorkerState::Dead,
        }
        result
    }

    async fn stop(&mut self) -> AppResult<()> {
        match self.state {
            WorkerState::Ready | WorkerState::Running => {}
            WorkerState::Starting | WorkerState::Stopping | WorkerState::Dead => {
                return Err(invalid_state(&self.label, self.state, "ready or running"));
            }
        }
        let Some(client) = self.client.take() else {
            return Err(invalid_state(&self.label, self.state, "connected"));
        };
        self.state = WorkerState::Stopping;

        let label = self.label.as_str();
        let kill_client = &client;
        let acknowledged = self
            .timeouts
            .stop
            .wait_until(|| async move {
                match kill_client.kill().await {
                    Ok(_) => true,
                    Err(err) if err.is_peer_unavailable() => true,
                    Err(err) => {
                        debug!("Kill to {} not acknowledged yet: {}", label, err);
                        false
                    }
                }
            })
            .await;
        if let Err(elapsed) = acknowledged {
            self.state = WorkerState::Dead;
            return Err(AppError::fleet(FleetError::ShutdownTimeout {
                timeout: elapsed.timeout,
            }));
        }

        self.reap().await;
        info!("{} stopped", self.label);
        self.state = WorkerState::Dead;
        Ok(())
    }
}

fn readiness_timeout(stage: &'static str, elapsed: PollElapsed) -> AppError {
    AppError::fleet(FleetError::ReadinessTimeout {
        stage,
        timeout: elapsed.timeout,
    })
}

async fn read_announcement(
    lines: &mut Lines<BufReader<ChildStdout>>,
    timeout: Duration,
) -> AppResult<SocketAddr> {
    let announced = tokio::time::timeout(timeout, async {
        while let Some(line) = lines.next_line().await? {
            if let Some(addr) = line.trim().strip_prefix(ANNOUNCE_PREFIX) {
                return Ok(Some(addr.to_owned()));
            }
            debug!("Worker output before announcement: {}", line);
        }
        Ok::<_, std::io::Error>(None)
    })
    .await
    .map_err(|_elapsed| AppError::fleet(FleetError::AnnounceMissing { timeout }))??;

    let Some(addr) = announced else {
        return Err(AppError::fleet(FleetError::AnnounceMissing { timeout }));
    };
    addr.parse::<SocketAddr>()
        .map_err(|_err| AppError::fleet(FleetError::AnnounceInvalid { line: addr }))
}

async fn forward_output(label: String, mut lines: Lines<BufReader<ChildStdout>>) {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => debug!("[{}] {}", label, line),
            Ok(None) => break,
            Err(err) => {
                debug!("Stopped reading output of {}: {}", label, err);
                break;
            }
        }
    }
}
