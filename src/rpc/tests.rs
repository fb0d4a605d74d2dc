use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::engine::test_support::{
    SCRIPTED_BYTES_RECEIVED, SCRIPTED_BYTES_SENT, ScriptedTransport,
};
use crate::engine::{ExecutionEngine, FixedTimer};
use crate::error::{AppError, AppResult, RpcError};

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::rpc(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

/// Histogram-backed durations keep three significant figures.
fn close_to(actual: Duration, expected: Duration) -> bool {
    let tolerance = expected / 500;
    actual.abs_diff(expected) <= tolerance
}

fn scripted_engine(transport: ScriptedTransport) -> ExecutionEngine {
    ExecutionEngine::new(
        Arc::new(transport),
        Arc::new(FixedTimer(Duration::from_millis(5))),
    )
}

async fn start_server(
    transport: ScriptedTransport,
) -> AppResult<(SocketAddr, ShutdownHandle, tokio::task::JoinHandle<()>)> {
    let server = WorkerServer::bind("127.0.0.1", 0, scripted_engine(transport)).await?;
    let addr = server.local_addr();
    let shutdown = server.shutdown_handle();
    let handle = tokio::spawn(server.serve());
    Ok((addr, shutdown, handle))
}

fn lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|index| format!("http://localhost/item-{}", index))
        .collect()
}

#[test]
fn ping_reports_healthy_worker() -> AppResult<()> {
    run_async_test(async {
        let (addr, shutdown, _handle) = start_server(ScriptedTransport::ok()).await?;
        let client = WorkerClient::new(addr);
        if !client.ping().await? {
            return Err(AppError::rpc("Expected healthy pong"));
        }
        // The cached connection serves a second call.
        if !client.ping().await? {
            return Err(AppError::rpc("Expected healthy pong on reuse"));
        }
        shutdown.shutdown();
        Ok(())
    })
}

#[test]
fn run_executes_engine_in_worker() -> AppResult<()> {
    run_async_test(async {
        let (addr, shutdown, _handle) = start_server(ScriptedTransport::ok()).await?;
        let client = WorkerClient::new(addr);
        let result = client
            .run(RunRequest {
                iterations: 3,
                lines: lines(2),
                random: false,
                worker_count: 2,
            })
            .await?;
        if result.transactions != 6 || result.successful_transactions != 6 {
            return Err(AppError::rpc(format!(
                "Unexpected transactions: {}",
                result.transactions
            )));
        }
        if result.total_bytes_sent != SCRIPTED_BYTES_SENT.saturating_mul(6)
            || result.total_bytes_received != SCRIPTED_BYTES_RECEIVED.saturating_mul(6)
        {
            return Err(AppError::rpc(format!(
                "Unexpected bytes: {}/{}",
                result.total_bytes_sent, result.total_bytes_received
            )));
        }
        let shortest_ok = result
            .shortest_transaction
            .is_some_and(|shortest| close_to(shortest, Duration::from_millis(5)));
        if !shortest_ok {
            return Err(AppError::rpc(format!(
                "Unexpected shortest transaction: {:?}",
                result.shortest_transaction
            )));
        }
        shutdown.shutdown();
        Ok(())
    })
}

#[test]
fn run_failures_come_back_as_remote_errors() -> AppResult<()> {
    run_async_test(async {
        let (addr, shutdown, _handle) = start_server(ScriptedTransport::ok()).await?;
        let client = WorkerClient::new(addr);
        let requests = [
            RunRequest {
                iterations: 1,
                lines: vec!["not a url".to_owned()],
                random: false,
                worker_count: 1,
            },
            RunRequest {
                iterations: 1,
                lines: lines(1),
                random: false,
                worker_count: 0,
            },
            RunRequest {
                iterations: 1,
                lines: Vec::new(),
                random: false,
                worker_count: 1,
            },
        ];
        for request in requests {
            match client.run(request).await {
                Err(AppError::Rpc(RpcError::Remote { .. })) => {}
                Err(err) => return Err(AppError::rpc(format!("Unexpected error: {}", err))),
                Ok(_) => return Err(AppError::rpc("Expected run to fail")),
            }
        }
        // The worker keeps serving after a failed run.
        if !client.ping().await? {
            return Err(AppError::rpc("Expected healthy pong after failed run"));
        }
        shutdown.shutdown();
        Ok(())
    })
}

#[test]
fn kill_stops_the_server() -> AppResult<()> {
    run_async_test(async {
        let (addr, _shutdown, handle) = start_server(ScriptedTransport::ok()).await?;
        let client = WorkerClient::new(addr);
        match client.kill().await {
            Ok(true) => {}
            Err(err) if err.is_peer_unavailable() => {}
            Ok(false) => return Err(AppError::rpc("Worker refused to stop")),
            Err(err) => return Err(err),
        }
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .map_err(|_err| AppError::rpc("Server kept running after kill"))?
            .map_err(|err| AppError::rpc(format!("Server task failed: {}", err)))?;
        match client.ping().await {
            Err(err) if err.is_peer_unavailable() => Ok(()),
            Err(err) => Err(AppError::rpc(format!("Unexpected error: {}", err))),
            Ok(_) => Err(AppError::rpc("Expected stopped worker to be unavailable")),
        }
    })
}

#[test]
fn shutdown_handle_stops_serving() -> AppResult<()> {
    run_async_test(async {
        let (_addr, shutdown, handle) = start_server(ScriptedTransport::ok()).await?;
        shutdown.shutdown();
        if !shutdown.is_shutdown() {
            return Err(AppError::rpc("Expected shutdown flag"));
        }
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .map_err(|_err| AppError::rpc("Server kept running after shutdown"))?
            .map_err(|err| AppError::rpc(format!("Server task failed: {}", err)))?;
        Ok(())
    })
}

#[test]
fn wire_messages_use_type_tags() -> AppResult<()> {
    let encoded = serde_json::to_string(&WireMessage::Ping)?;
    if encoded != r#"{"type":"ping"}"# {
        return Err(AppError::rpc(format!("Unexpected encoding: {}", encoded)));
    }
    let decoded: WireMessage = serde_json::from_str(
        r#"{"type":"run","iterations":2,"lines":["http://a/"],"random":true,"worker_count":3}"#,
    )?;
    let expected = WireMessage::Run(RunRequest {
        iterations: 2,
        lines: vec!["http://a/".to_owned()],
        random: true,
        worker_count: 3,
    });
    if decoded != expected {
        return Err(AppError::rpc(format!("Unexpected decode: {:?}", decoded)));
    }
    Ok(())
}

#[test]
fn read_message_handles_framing() -> AppResult<()> {
    run_async_test(async {
        let mut input: &[u8] = b"{\"type\":\"pong\",\"healthy\":true}\r\n{\"type\":\"kill\"}\n";
        let first = read_message(&mut input).await?;
        if first != WireMessage::Pong(PingResponse { healthy: true }) {
            return Err(AppError::rpc(format!("Unexpected first message: {:?}", first)));
        }
        let second = read_message(&mut input).await?;
        if second != WireMessage::Kill {
            return Err(AppError::rpc(format!("Unexpected second message: {:?}", second)));
        }
        match read_message(&mut input).await {
            Err(err) if err.is_peer_unavailable() => Ok(()),
            Err(err) => Err(AppError::rpc(format!("Unexpected error: {}", err))),
            Ok(message) => Err(AppError::rpc(format!("Unexpected message: {:?}", message))),
        }
    })
}

#[test]
fn read_message_rejects_malformed_input() -> AppResult<()> {
    run_async_test(async {
        let mut oversized = vec![b'a'; MAX_MESSAGE_BYTES.saturating_add(16)];
        oversized.push(b'\n');
        let mut input: &[u8] = &oversized;
        match read_message(&mut input).await {
            Err(AppError::Rpc(RpcError::WireMessageTooLarge { .. })) => {}
            Err(err) => return Err(AppError::rpc(format!("Unexpected error: {}", err))),
            Ok(message) => return Err(AppError::rpc(format!("Unexpected message: {:?}", message))),
        }

        let mut invalid_utf8: &[u8] = b"\xff\xfe\n";
        match read_message(&mut invalid_utf8).await {
            Err(AppError::Rpc(RpcError::WireMessageInvalidUtf8 { .. })) => {}
            Err(err) => return Err(AppError::rpc(format!("Unexpected error: {}", err))),
            Ok(message) => return Err(AppError::rpc(format!("Unexpected message: {:?}", message))),
        }

        let mut unknown: &[u8] = b"{\"type\":\"reboot\"}\n";
        match read_message(&mut unknown).await {
            Err(AppError::Rpc(RpcError::Deserialize { .. })) => Ok(()),
            Err(err) => Err(AppError::rpc(format!("Unexpected error: {}", err))),
            Ok(message) => Err(AppError::rpc(format!("Unexpected message: {:?}", message))),
        }
    })
}

#[test]
fn send_message_writes_one_line() -> AppResult<()> {
    run_async_test(async {
        let mut output: Vec<u8> = Vec::new();
        send_message(&mut output, &WireMessage::Killed(KillResponse { killed: true })).await?;
        if output != b"{\"type\":\"killed\",\"killed\":true}\n" {
            return Err(AppError::rpc(format!(
                "Unexpected bytes: {}",
                String::from_utf8_lossy(&output)
            )));
        }
        Ok(())
    })
}

#[test]
fn negative_worker_count_is_rejected() -> AppResult<()> {
    for worker_count in [0, -3] {
        let request = RunRequest {
            iterations: 1,
            lines: lines(1),
            random: false,
            worker_count,
        };
        if request.execution_config().is_ok() {
            return Err(AppError::rpc(format!(
                "Expected worker_count {} to be rejected",
                worker_count
            )));
        }
    }
    Ok(())
}

#[test]
fn run_request_rejects_worker_count_beyond_wire_range() -> AppResult<()> {
    let items = crate::engine::test_support::work_items(1)?;
    let wire_max = usize::try_from(i32::MAX.unsigned_abs())
        .map_err(|err| AppError::rpc(format!("usize too narrow: {}", err)))?;
    let config = |worker_count: usize| -> AppResult<crate::engine::ExecutionConfig> {
        Ok(crate::engine::ExecutionConfig {
            worker_count: crate::args::PositiveUsize::try_from(worker_count)?,
            iterations: 1,
            randomize_order: false,
        })
    };

    let at_limit = run_request(&items, &config(wire_max)?)?;
    if at_limit.worker_count != i32::MAX {
        return Err(AppError::rpc(format!(
            "Unexpected worker_count: {}",
            at_limit.worker_count
        )));
    }
    match run_request(&items, &config(wire_max.saturating_add(1))?) {
        Err(crate::error::ValidationError::ValueTooLarge { max })
            if max == u64::from(i32::MAX.unsigned_abs()) =>
        {
            Ok(())
        }
        Err(err) => Err(AppError::rpc(format!("Unexpected error: {}", err))),
        Ok(unexpected) => Err(AppError::rpc(format!(
            "Expected rejection, got worker_count {}",
            unexpected.worker_count
        ))),
    }
}
