//! Integration tests for the observer WebSocket server over a real socket.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use switchdeck_bridge::application::ObserverSink;
use switchdeck_bridge::infrastructure::observers::{serve_observers, ObserverBroadcast};
use switchdeck_core::ObserverMessage;

#[tokio::test]
async fn test_connected_browser_receives_device_update() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = ObserverBroadcast::default();
    let running = Arc::new(AtomicBool::new(true));
    let server = tokio::spawn(serve_observers(listener, hub.clone(), Arc::clone(&running)));

    let (mut ws, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("handshake should succeed");

    // Act
    let delivered = hub.publish(&ObserverMessage::DeviceUpdate {
        program: 4,
        preview: 5,
    });

    // Assert
    assert_eq!(delivered, 1);
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("frame should arrive")
        .expect("stream should be open")
        .expect("frame should be valid");
    let WsMessage::Text(text) = msg else {
        panic!("expected a text frame, got {msg:?}");
    };
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "type": "deviceUpdate", "program": 4, "preview": 5 })
    );

    running.store(false, Ordering::Relaxed);
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_disconnected_browser_is_dropped_from_broadcast() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = ObserverBroadcast::default();
    let running = Arc::new(AtomicBool::new(true));
    let server = tokio::spawn(serve_observers(listener, hub.clone(), Arc::clone(&running)));
    let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    assert_eq!(hub.observer_count(), 1);

    // Act
    ws.close(None).await.unwrap();
    drop(ws);

    // Assert: the session ends and its subscription goes with it.
    let mut remaining = hub.observer_count();
    for _ in 0..50 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = hub.observer_count();
    }
    assert_eq!(remaining, 0);
    assert_eq!(
        hub.publish(&ObserverMessage::DeviceUpdate {
            program: 1,
            preview: 2
        }),
        0
    );

    running.store(false, Ordering::Relaxed);
    server.await.unwrap().unwrap();
}
