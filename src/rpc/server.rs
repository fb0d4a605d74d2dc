use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::{ExecutionEngine, ProcessResult};
use crate::error::{AppError, AppResult, RpcError};
use crate::http::parse_work_items;

use super::protocol::{
    ErrorMessage, KillResponse, PingResponse, RunRequest, WireMessage, WireProcessResult,
    read_message, send_message,
};

/// Time open connections get to finish their reply once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Stops a running [`WorkerServer`]. Cheap to clone; every clone controls
/// the same server.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub(crate) fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`ShutdownHandle::shutdown`] has been called.
    pub async fn stopped(&self) {
        let mut receiver = self.sender.subscribe();
        if receiver.wait_for(|stopped| *stopped).await.is_err() {
            debug!("Shutdown channel closed");
        }
    }
}

/// RPC server hosting one execution engine.
pub struct WorkerServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    engine: ExecutionEngine,
    shutdown: ShutdownHandle,
}

impl WorkerServer {
    /// Binds the listener; port 0 picks an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be bound.
    pub async fn bind(host: &str, port: u16, engine: ExecutionEngine) -> AppResult<Self> {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr).await.map_err(|err| {
            AppError::rpc(RpcError::Bind {
                addr: addr.clone(),
                source: err,
            })
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| AppError::rpc(RpcError::Bind { addr, source: err }))?;
        Ok(Self {
            listener,
            local_addr,
            engine,
            shutdown: ShutdownHandle::new(),
        })
    }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serves connections until a Kill request or the shutdown handle stops it.
    /// Accept errors are logged and skipped.
    pub async fn serve(self) {
        info!("Worker listening on {}", self.local_addr);
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                () = self.shutdown.stopped() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("Accepted connection from {}", peer);
                        connections.spawn(handle_connection(
                            stream,
                            self.engine.clone(),
                            self.shutdown.clone(),
                        ));
                    }
                    Err(err) => warn!("Failed to accept connection: {}", err),
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    log_connection_end(finished);
                }
            }
        }

        info!("Worker shutting down");
        drop(self.listener);
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(finished) = connections.join_next().await {
                log_connection_end(finished);
            }
        })
        .await;
        if drained.is_err() {
            debug!("Aborting {} open connections", connections.len());
        }
    }
}

fn log_connection_end(finished: Result<AppResult<()>, tokio::task::JoinError>) {
    match finished {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!("Connection ended with error: {}", err),
        Err(err) => warn!("Connection task failed: {}", err),
    }
}

async fn handle_connection(
    stream: TcpStream,
    engine: ExecutionEngine,
    shutdown: ShutdownHandle,
) -> AppResult<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    loop {
        let message = match read_message(&mut reader).await {
            Ok(message) => message,
            Err(err) if err.is_peer_unavailable() => return Ok(()),
            Err(err) => {
                let reply = WireMessage::Error(ErrorMessage {
                    message: err.to_string(),
                });
                drop(send_message(&mut write_half, &reply).await);
                return Err(err);
            }
        };

        let kind = message.kind();
        let reply = match message {
            WireMessage::Run(request) => handle_run(&engine, &request).await,
            WireMessage::Ping => WireMessage::Pong(PingResponse {
                healthy: !shutdown.is_shutdown(),
            }),
            WireMessage::Kill => {
                info!("Kill requested; stopping worker");
                // Signalled before the reply; the peer may already be gone.
                shutdown.shutdown();
                let reply = WireMessage::Killed(KillResponse { killed: true });
                drop(send_message(&mut write_half, &reply).await);
                return Ok(());
            }
            WireMessage::RunResult(_)
            | WireMessage::Pong(_)
            | WireMessage::Killed(_)
            | WireMessage::Error(_) => WireMessage::Error(ErrorMessage {
                message: format!("Unexpected '{}' request.", kind),
            }),
        };
        send_message(&mut write_half, &reply).await?;
    }
}

async fn handle_run(engine: &ExecutionEngine, request: &RunRequest) -> WireMessage {
    debug!(
        "Run request: {} lines, {} workers, {} iterations",
        request.lines.len(),
        request.worker_count,
        request.iterations
    );
    match execute_run(engine, request).await {
        Ok(result) => WireMessage::RunResult(Box::new(WireProcessResult::from(&result))),
        Err(err) => {
            warn!("Run failed: {}", err);
            WireMessage::Error(ErrorMessage {
                message: err.to_string(),
            })
        }
    }
}

async fn execute_run(engine: &ExecutionEngine, request: &RunRequest) -> AppResult<ProcessResult> {
    let config = request.execution_config()?;
    let items = parse_work_items(&request.lines)?;
    engine.execute(items, config).await
}
