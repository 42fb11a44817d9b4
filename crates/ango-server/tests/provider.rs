//! Provider lifecycle: connection tracking, shared registry, hooks.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use ango_server::services::EchoProcedure;
use ango_server::transport::memory;
use ango_server::{Connection, ConnectionOptions, Deferred, ProcedureRegistry, Provider};

use common::{debug_options, next_event, recorder, Event};

async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held");
}

#[tokio::test]
async fn accept_tracks_connection_and_runs_on_connect() {
    let (conn_tx, mut conn_rx) = mpsc::unbounded_channel::<Connection>();
    let provider = Provider::builder(debug_options())
        .on_connect(move |conn| {
            let _ = conn_tx.send(conn);
        })
        .build();

    let ((sink, stream), (peer_sink, peer_stream)) = memory::pair(64);
    let serving = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.accept(sink, stream).await })
    };

    // The far end is a full engine with its own procedures.
    let client_procs = Arc::new(ProcedureRegistry::new());
    client_procs.register("echo", Arc::new(EchoProcedure));
    let (_client, client_driver) =
        Connection::open(1, client_procs, debug_options(), peer_sink, peer_stream);
    let client_task = tokio::spawn(client_driver);

    let server_conn = conn_rx.recv().await.unwrap();
    assert_eq!(server_conn.id(), 1);
    assert_eq!(provider.connection_count(), 1);
    assert!(provider.connection(1).is_some());

    let (callbacks, mut events) = recorder();
    server_conn
        .call_and_wait("echo", "hi", callbacks)
        .await
        .unwrap();
    assert_eq!(next_event(&mut events).await, Event::Resolve("\"hi\"".into()));

    // Dropping the client engine closes its transport end.
    client_task.abort();
    assert!(serving.await.unwrap().is_ok());
    assert_eq!(provider.connection_count(), 0);
    assert!(provider.connection(1).is_none());
}

#[tokio::test]
async fn connection_ids_are_distinct() {
    let (conn_tx, mut conn_rx) = mpsc::unbounded_channel::<u64>();
    let provider = Provider::builder(ConnectionOptions::default())
        .on_connect(move |conn| {
            let _ = conn_tx.send(conn.id());
        })
        .build();

    let mut peers = Vec::new();
    for _ in 0..2 {
        let ((sink, stream), peer) = memory::pair(8);
        let provider = provider.clone();
        tokio::spawn(async move { provider.accept(sink, stream).await });
        peers.push(peer);
    }

    let a = conn_rx.recv().await.unwrap();
    let b = conn_rx.recv().await.unwrap();
    assert_ne!(a, b);
    eventually(|| provider.connection_count() == 2).await;

    drop(peers);
    eventually(|| provider.connection_count() == 0).await;
}

#[tokio::test]
async fn registration_is_shared_and_last_wins() {
    let provider = Provider::new(debug_options());
    provider.register_procedure_fn("greet", |_data, d: Deferred| async move {
        d.resolve("first").await
    });
    provider.register_procedure_fn("greet", |_data, d: Deferred| async move {
        d.resolve("second").await
    });
    assert_eq!(provider.procedures().names(), vec!["greet".to_string()]);

    let ((sink, stream), (peer_sink, peer_stream)) = memory::pair(64);
    {
        let provider = provider.clone();
        tokio::spawn(async move { provider.accept(sink, stream).await });
    }
    let (client, client_driver) = Connection::open(
        1,
        Arc::new(ProcedureRegistry::new()),
        debug_options(),
        peer_sink,
        peer_stream,
    );
    tokio::spawn(client_driver);

    let (callbacks, mut events) = recorder();
    client.call_and_wait("greet", &(), callbacks).await.unwrap();
    assert_eq!(next_event(&mut events).await, Event::Resolve("\"second\"".into()));

    // Registering after the connection opened is visible to it.
    provider.register_procedure_fn("late", |_data, d: Deferred| async move {
        d.resolve(&1).await
    });
    let (callbacks, mut events) = recorder();
    client.call_and_wait("late", &(), callbacks).await.unwrap();
    assert_eq!(next_event(&mut events).await, Event::Resolve("1".into()));
}

#[tokio::test]
async fn providers_are_independent() {
    let a = Provider::new(ConnectionOptions::default());
    let b = Provider::new(ConnectionOptions::default());
    a.register_procedure("echo", Arc::new(EchoProcedure));

    assert!(a.procedures().contains("echo"));
    assert!(!b.procedures().contains("echo"));
}

#[tokio::test]
async fn before_connect_can_veto() {
    let provider = Provider::builder(ConnectionOptions::default())
        .before_connect(|_uri, headers| {
            if headers.contains_key("authorization") {
                Ok(())
            } else {
                Err(StatusCode::UNAUTHORIZED.into_response())
            }
        })
        .build();
    let uri: Uri = "/ango-websocket".parse().unwrap();

    let denied = provider.before_connect(&uri, &HeaderMap::new()).unwrap_err();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Bearer t".parse().unwrap());
    assert!(provider.before_connect(&uri, &headers).is_ok());

    // No hook means every session is accepted.
    let open = Provider::new(ConnectionOptions::default());
    assert!(open.before_connect(&uri, &HeaderMap::new()).is_ok());
}

#[tokio::test]
async fn aborted_accept_untracks_connection() {
    let provider = Provider::new(ConnectionOptions::default());
    let ((sink, stream), _peer) = memory::pair(8);
    let serving = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.accept(sink, stream).await })
    };

    eventually(|| provider.connection_count() == 1).await;
    let conn = provider.connection(1).unwrap();

    serving.abort();

    eventually(|| provider.connection_count() == 0).await;
    assert!(conn.is_closed());
}
