//! Observer WebSocket server: accept loop and per-session forwarding.
//!
//! Each browser that connects gets its own Tokio task and its own broadcast
//! subscription.  Observers are push-only: inbound text and binary frames are
//! ignored, and a Close frame or socket error ends the session.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::ObserverBroadcast;

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `bind_addr` and serves observers until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_observer_server(
    bind_addr: SocketAddr,
    hub: ObserverBroadcast,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind observer WebSocket listener on {bind_addr}"))?;

    info!("observer WebSocket server listening on ws://{bind_addr}");
    serve_observers(listener, hub, running).await
}

/// Runs the accept loop on an already-bound listener.
pub async fn serve_observers(
    listener: TcpListener,
    hub: ObserverBroadcast,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping observer accept loop");
            break;
        }

        // Short timeout so the shutdown flag is re-checked while idle.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                // Subscribe before spawning so no frame published after the
                // accept is missed.
                let frames = hub.subscribe();
                tokio::spawn(async move {
                    handle_observer(stream, peer_addr, frames).await;
                });
            }
            Ok(Err(e)) => {
                error!("observer accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_observer(
    stream: TcpStream,
    peer_addr: SocketAddr,
    frames: broadcast::Receiver<String>,
) {
    let session_id = Uuid::new_v4();
    info!("observer {session_id} connected from {peer_addr}");
    match run_session(stream, session_id, frames).await {
        Ok(()) => info!("observer {session_id} disconnected"),
        Err(e) => warn!("observer {session_id} closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    session_id: Uuid,
    mut frames: broadcast::Receiver<String>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .with_context(|| format!("observer {session_id}: WebSocket handshake failed"))?;
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    ws_write
                        .send(WsMessage::Text(text))
                        .await
                        .with_context(|| format!("observer {session_id}: send failed"))?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("observer {session_id} lagging; skipped {skipped} frames");
                }
                Err(RecvError::Closed) => {
                    debug!("observer {session_id}: broadcast closed");
                    let _ = ws_write.send(WsMessage::Close(None)).await;
                    break;
                }
            },
            incoming = ws_read.next() => match incoming {
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(other)) => {
                    debug!("observer {session_id}: ignoring inbound {} byte frame", other.len());
                }
                Some(Err(e)) => {
                    return Err(e).with_context(|| format!("observer {session_id}: read failed"));
                }
            },
        }
    }

    Ok(())
}
