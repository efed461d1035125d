#![allow(clippy::unwrap_used)]
// Integration tests for `BackendClient` against a local WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

use djn_api::{BackendClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

/// Accept one WebSocket connection, capture the request, answer with `reply`.
async fn serve_once(reply: Value) -> (String, oneshot::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let request: Value = serde_json::from_str(&text).unwrap();
            let _ = tx.send(request);
        }
        ws.send(Message::text(reply.to_string())).await.unwrap();
        let _ = ws.close(None).await;
    });

    (format!("ws://{addr}"), rx)
}

fn client(url: &str) -> BackendClient {
    BackendClient::new(url, Duration::from_secs(5)).unwrap()
}

// ── Nodes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_request_nodes() {
    let (url, request) = serve_once(json!({
        "node-a": {
            "NodeId": "node-a",
            "IP": "10.0.0.1",
            "Age": 3_600_000_000_000_i64,
            "CapacityCPU": 16,
            "CapacityMemory": 65536,
            "CapacityGPUs": 8,
            "AllocatedCPU": 4,
            "Pods": [{ "PodName": "kernel-k1-abcde", "PodPhase": "Running", "PodIP": "10.1.0.4" }]
        },
        "node-b": { "NodeId": "node-b", "IP": "10.0.0.2" }
    }))
    .await;

    let nodes = client(&url).request_nodes(true).await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes["node-a"].pods.as_ref().unwrap()[0].pod_phase, "Running");
    assert!((nodes["node-a"].allocated_cpu - 4.0).abs() < f64::EPSILON);

    let sent = request.await.unwrap();
    assert_eq!(sent["op"], "request-nodes");
    assert_eq!(sent["spoof-nodes"], true);
}

#[tokio::test]
async fn test_request_nodes_error_envelope() {
    let (url, _request) = serve_once(json!({
        "ErrorMessage": "Failed to retrieve nodes from Kubernetes.",
        "Valid": true
    }))
    .await;

    let result = client(&url).request_nodes(false).await;
    assert!(
        matches!(result, Err(Error::Backend { ref message }) if message.contains("Kubernetes")),
        "expected Backend error, got: {result:?}"
    );
}

// ── Kernel specs ────────────────────────────────────────────────────

#[tokio::test]
async fn test_request_kernel_specs() {
    let (url, request) = serve_once(json!([{
        "name": "python3",
        "display_name": "Python 3 (ipykernel)",
        "language": "python",
        "interrupt_mode": "signal",
        "kernel_provisioner": { "name": "gateway-provisioner", "display_name": "gateway:8080" },
        "argv": ["python", "-m", "ipykernel_launcher"]
    }]))
    .await;

    let specs = client(&url).request_kernel_specs().await.unwrap();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].display_name, "Python 3 (ipykernel)");
    assert_eq!(
        specs[0].kernel_provisioner.as_ref().unwrap().gateway,
        "gateway:8080"
    );

    let sent = request.await.unwrap();
    assert_eq!(sent["op"], "request-kernel-specs");
}

// ── Failure modes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("ws://{addr}")).request_kernel_specs().await;
    assert!(
        matches!(result, Err(Error::WebSocketConnect(_))),
        "expected WebSocketConnect error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_silent_backend_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // Read the request and never answer.
        let _ = ws.next().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let backend = BackendClient::new(&format!("ws://{addr}"), Duration::from_millis(200)).unwrap();
    let result = backend.request_nodes(false).await;
    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout error, got: {result:?}"
    );
}
