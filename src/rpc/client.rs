use std::net::SocketAddr;

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::trace;

use crate::engine::ProcessResult;
use crate::error::{AppError, AppResult, RpcError};

use super::protocol::{RunRequest, WireMessage, read_message, send_message};

/// RPC stub for one worker process.
///
/// The connection is opened on first use and kept for later calls; any
/// failed exchange drops it so the next call dials again.
#[derive(Debug)]
pub struct WorkerClient {
    addr: SocketAddr,
    connection: Mutex<Option<Connection>>,
}

#[derive(Debug)]
struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    async fn open(addr: SocketAddr) -> AppResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|err| AppError::rpc(RpcError::from_connect(addr.to_string(), err)))?;
        if let Err(err) = stream.set_nodelay(true) {
            trace!("Failed to set TCP_NODELAY for {}: {}", addr, err);
        }
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
        })
    }

    async fn exchange(&mut self, request: &WireMessage) -> AppResult<WireMessage> {
        send_message(&mut self.writer, request).await?;
        read_message(&mut self.reader).await
    }
}

impl WorkerClient {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connection: Mutex::const_new(None),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn exchange(&self, request: &WireMessage) -> AppResult<WireMessage> {
        let mut slot = self.connection.lock().await;
        let mut connection = match slot.take() {
            Some(connection) => connection,
            None => Connection::open(self.addr).await?,
        };
        trace!("Sending '{}' to {}", request.kind(), self.addr);
        let reply = connection.exchange(request).await?;
        *slot = Some(connection);
        match reply {
            WireMessage::Error(error) => Err(AppError::rpc(RpcError::Remote {
                message: error.message,
            })),
            WireMessage::Run(_)
            | WireMessage::RunResult(_)
            | WireMessage::Ping
            | WireMessage::Pong(_)
            | WireMessage::Kill
            | WireMessage::Killed(_) => Ok(reply),
        }
    }

    /// Runs the engine inside the worker and returns its result.
    ///
    /// # Errors
    ///
    /// Returns an error when the exchange fails or the worker reports a
    /// failed run.
    pub async fn run(&self, request: RunRequest) -> AppResult<ProcessResult> {
        let reply = self.exchange(&WireMessage::Run(request)).await?;
        match reply {
            WireMessage::RunResult(result) => Ok(ProcessResult::from(*result)),
            WireMessage::Run(_)
            | WireMessage::Ping
            | WireMessage::Pong(_)
            | WireMessage::Kill
            | WireMessage::Killed(_)
            | WireMessage::Error(_) => Err(unexpected("run", &reply)),
        }
    }

    /// Health check; `true` when the worker is serving.
    ///
    /// # Errors
    ///
    /// Returns an error when the exchange fails.
    pub async fn ping(&self) -> AppResult<bool> {
        let reply = self.exchange(&WireMessage::Ping).await?;
        match reply {
            WireMessage::Pong(pong) => Ok(pong.healthy),
            WireMessage::Run(_)
            | WireMessage::RunResult(_)
            | WireMessage::Ping
            | WireMessage::Kill
            | WireMessage::Killed(_)
            | WireMessage::Error(_) => Err(unexpected("ping", &reply)),
        }
    }

    /// Asks the worker to stop serving.
    ///
    /// # Errors
    ///
    /// Returns an error when the exchange fails. A worker that stops before
    /// answering surfaces as `RpcError::Unavailable`.
    pub async fn kill(&self) -> AppResult<bool> {
        let reply = self.exchange(&WireMessage::Kill).await?;
        match reply {
            WireMessage::Killed(killed) => Ok(killed.killed),
            WireMessage::Run(_)
            | WireMessage::RunResult(_)
            | WireMessage::Ping
            | WireMessage::Pong(_)
            | WireMessage::Kill
            | WireMessage::Error(_) => Err(unexpected("kill", &reply)),
        }
    }
}

fn unexpected(request: &'static str, reply: &WireMessage) -> AppError {
    AppError::rpc(RpcError::UnexpectedResponse {
        request,
        actual: reply.kind(),
    })
}
