use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use rendezvous_core::{ClientSignal, ServerSignal};
use rendezvous_server::{AppState, ServerConfig, relay_router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve the relay router on an ephemeral local port.
pub async fn spawn_relay() -> Result<(SocketAddr, Arc<AppState>)> {
    let state = AppState::new(&ServerConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind test listener")?;
    let addr = listener.local_addr()?;

    let router = relay_router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok((addr, state))
}

/// Connect and consume the `ice-config` greeting.
pub async fn connect(addr: SocketAddr) -> Result<TestSocket> {
    let (mut socket, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .context("WebSocket handshake failed")?;

    match next_signal(&mut socket).await? {
        ServerSignal::IceConfig { .. } => Ok(socket),
        other => bail!("expected ice-config first, got {:?}", other),
    }
}

pub async fn send_signal(socket: &mut TestSocket, signal: &ClientSignal) -> Result<()> {
    send_text(socket, &signal.to_json()?).await
}

pub async fn send_text(socket: &mut TestSocket, text: &str) -> Result<()> {
    socket
        .send(Message::text(text.to_owned()))
        .await
        .context("Failed to send frame")
}

/// Next text frame from the relay, decoded.
pub async fn next_signal(socket: &mut TestSocket) -> Result<ServerSignal> {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, socket.next())
            .await
            .context("Timed out waiting for a frame")?
            .context("Socket closed")??;

        if frame.is_text() {
            return Ok(ServerSignal::parse(frame.to_text()?)?);
        }
    }
}

/// Poll `check` until it holds or the timeout passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
