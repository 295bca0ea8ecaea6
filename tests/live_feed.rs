//! Live Feed Tests - Listener against a local WebSocket server
//!
//! Spins up a tokio-tungstenite server on 127.0.0.1, points the mocked
//! feed authorization at it and drives the real listener task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use voluguard::adapters::feeds::{FeedHandle, FeedSettings};
use voluguard::adapters::persistence::FeedRecorder;
use voluguard::domain::{AccessToken, FeedAuthorization, FeedPayload, FeedStatus};
use voluguard::error::ApiError;

mod common;
use common::MockBackend;

const WAIT: Duration = Duration::from_secs(5);

fn settings(capacity: usize, max_reconnects: u32) -> FeedSettings {
    FeedSettings {
        buffer_capacity: capacity,
        reconnect_delay: Duration::from_millis(20),
        max_reconnects,
        instrument_keys: vec!["NSE_INDEX|Nifty 50".to_string()],
        mode: "ltpc".to_string(),
    }
}

fn token() -> AccessToken {
    AccessToken::new("feed-token").unwrap()
}

/// Accept one client, forward its first frame, send `frames`, then hold
/// the socket open until the client closes it.
async fn serve_once(frames: Vec<Message>) -> (String, oneshot::Receiver<Message>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let (first_tx, first_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if let Some(Ok(first)) = ws.next().await {
            let _ = first_tx.send(first);
        }
        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    (url, first_rx)
}

#[tokio::test]
async fn test_listener_subscribes_buffers_and_records() {
    let frames = vec![
        Message::Text("tick-1".into()),
        Message::Text("tick-2".into()),
        Message::Text("tick-3".into()),
        Message::Binary(vec![0x0a, 0x0b]),
    ];
    let (url, first_rx) = serve_once(frames).await;

    let mut mock = MockBackend::new();
    mock.expect_authorize_market_feed()
        .returning(move |_| Ok(FeedAuthorization { socket_url: url.clone() }));

    let dir = tempfile::tempdir().unwrap();
    let recorder = FeedRecorder::new(dir.path()).await.unwrap();
    let mut handle = FeedHandle::spawn(
        Arc::new(mock),
        token(),
        settings(2, 0),
        Some(recorder.clone()),
        None,
    );

    let subscription = tokio::time::timeout(WAIT, first_rx).await.unwrap().unwrap();
    let subscription: serde_json::Value =
        serde_json::from_slice(&subscription.into_data()).unwrap();
    assert_eq!(subscription["method"], "sub");
    assert_eq!(subscription["data"]["instrumentKeys"][0], "NSE_INDEX|Nifty 50");

    let mut status = handle.watch_status();
    tokio::time::timeout(WAIT, status.wait_for(|s| *s == FeedStatus::Streaming))
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(WAIT, async {
        while handle.total_received().await < 4 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let kept = handle.snapshot().await;
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].payload, FeedPayload::Text("tick-3".into()));
    assert_eq!(kept[1].payload, FeedPayload::Binary(vec![0x0a, 0x0b]));
    assert!(handle.is_running());

    handle.stop().await;
    assert_eq!(handle.status(), FeedStatus::Stopped);
    assert!(!handle.is_running());

    let recorded = recorder.load_day(Utc::now().date_naive()).await.unwrap();
    assert_eq!(recorded.len(), 4);
}

#[tokio::test]
async fn test_listener_gives_up_after_failed_authorizations() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut mock = MockBackend::new();
    mock.expect_authorize_market_feed().returning(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Http {
            status: 401,
            body: "token expired".into(),
        })
    });

    let handle = FeedHandle::spawn(Arc::new(mock), token(), settings(10, 2), None, None);

    let mut status = handle.watch_status();
    let failed = tokio::time::timeout(WAIT, status.wait_for(|s| matches!(s, FeedStatus::Failed(_))))
        .await
        .unwrap()
        .unwrap()
        .clone();

    assert!(failed.to_string().contains("authorization failed"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!handle.is_running());
    assert_eq!(handle.total_received().await, 0);
}

/// Accept two clients in turn. The first gets one frame and is closed by
/// the server; the second gets one frame and is held open.
async fn serve_twice() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        for (session, frame) in ["session-1", "session-2"].into_iter().enumerate() {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _subscription = ws.next().await;
            ws.send(Message::Text(frame.into())).await.unwrap();
            if session == 0 {
                ws.close(None).await.unwrap();
            }
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        }
    });

    url
}

#[tokio::test]
async fn test_dropped_session_reauthorizes_and_resets_failures() {
    let url = serve_twice().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut mock = MockBackend::new();
    mock.expect_authorize_market_feed().returning(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ApiError::Network("connection reset".into()))
        } else {
            Ok(FeedAuthorization {
                socket_url: url.clone(),
            })
        }
    });

    // One failure allowed: the streamed first session must reset the count
    // or the listener would give up before the second session.
    let mut handle = FeedHandle::spawn(Arc::new(mock), token(), settings(10, 1), None, None);

    tokio::time::timeout(WAIT, async {
        while handle.total_received().await < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let kept = handle.snapshot().await;
    assert_eq!(kept[0].payload, FeedPayload::Text("session-1".into()));
    assert_eq!(kept[1].payload, FeedPayload::Text("session-2".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(handle.is_running());

    handle.stop().await;
    assert_eq!(handle.status(), FeedStatus::Stopped);
}
