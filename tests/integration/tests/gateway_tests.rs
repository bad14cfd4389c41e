//! Gateway client scenario tests
//!
//! Each test drives a `GatewayConnection` against the in-memory gateway
//! with tokio's paused clock, so backoff and timeouts elapse instantly.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use integration_tests::{client, game, test_options, RESUME_URL};
use presence_common::JsonFileElapsedStore;
use presence_core::{
    ChannelConfigSource, ConfigChange, ElapsedMode, ElapsedRecord, ElapsedStore,
    MemoryElapsedStore, StaticCredential,
};
use presence_gateway::protocol::OpCode;
use presence_gateway::{ConnectionPhase, GatewayError};

fn memory_store() -> Arc<MemoryElapsedStore> {
    Arc::new(MemoryElapsedStore::new())
}

// ============================================================================
// Resume vs. identify
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_transport_drop_resumes_with_last_sequence() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 1).await;
    first.dispatch("SESSIONS_REPLACE", 4).await;
    first.dispatch("SESSIONS_REPLACE", 9).await;
    drop(first);

    let mut second = gateway.accept().await;
    second.hello().await;
    let resume = second
        .expect_op(OpCode::Resume)
        .await
        .as_resume()
        .expect("resume payload");
    assert_eq!(resume.session_id, "session-1");
    assert_eq!(resume.seq, 9);
    assert_eq!(resume.token, "token");
    assert!(gateway.urls()[1].starts_with(RESUME_URL));

    second.resumed(10).await;
    second.expect_op(OpCode::PresenceUpdate).await;
    assert_eq!(handle.phase(), ConnectionPhase::Ready);

    handle.stop();
    assert_eq!(second.expect_close().await, 1000);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_session_forces_identify() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 1).await;
    first
        .send(presence_gateway::protocol::GatewayMessage::invalid_session(false))
        .await;
    assert_eq!(first.expect_close().await, 4000);

    let mut second = gateway.accept().await;
    second.hello().await;
    let frame = second.expect_op(OpCode::Identify).await;
    assert_eq!(frame.as_identify().map(|i| i.token), Some("token".to_string()));
    assert!(!gateway.urls()[1].starts_with(RESUME_URL));

    handle.stop();
    drop(second);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_server_reconnect_request_resumes() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 3).await;
    first
        .send(presence_gateway::protocol::GatewayMessage::reconnect())
        .await;
    assert_eq!(first.expect_close().await, 4000);

    let mut second = gateway.accept().await;
    second.hello().await;
    let resume = second.expect_op(OpCode::Resume).await.as_resume().unwrap();
    assert_eq!((resume.session_id.as_str(), resume.seq), ("session-1", 3));

    handle.stop();
    drop(second);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_resumable_invalid_session_resumes() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 1).await;
    first.dispatch("SESSIONS_REPLACE", 5).await;
    first
        .send(presence_gateway::protocol::GatewayMessage::invalid_session(true))
        .await;
    assert_eq!(first.expect_close().await, 4000);

    let mut second = gateway.accept().await;
    second.hello().await;
    let resume = second.expect_op(OpCode::Resume).await.as_resume().unwrap();
    assert_eq!((resume.session_id.as_str(), resume.seq), ("session-1", 5));
    assert!(gateway.urls()[1].starts_with(RESUME_URL));

    handle.stop();
    drop(second);
    assert!(task.await.unwrap().is_ok());
}

// ============================================================================
// Handshake and protocol failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_missing_ready_times_out_and_reidentifies() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.hello().await;
    first.expect_op(OpCode::Identify).await;

    // No READY; the handshake deadline drops the connection
    let mut phases = handle.subscribe_phase();
    phases
        .wait_for(|phase| *phase == ConnectionPhase::Reconnecting)
        .await
        .unwrap();
    first.expect_abort().await;

    let mut second = gateway.accept().await;
    second.hello().await;
    second.expect_op(OpCode::Identify).await;
    assert_eq!(gateway.attempts(), 2);
    assert!(!gateway.urls()[1].starts_with(RESUME_URL));

    handle.stop();
    drop(second);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_hello_drops_connection_and_resumes() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 2).await;
    first.hello().await;
    first.expect_abort().await;

    let mut second = gateway.accept().await;
    second.hello().await;
    let resume = second.expect_op(OpCode::Resume).await.as_resume().unwrap();
    assert_eq!((resume.session_id.as_str(), resume.seq), ("session-1", 2));
    assert_eq!(gateway.attempts(), 2);

    handle.stop();
    drop(second);
    assert!(task.await.unwrap().is_ok());
}

// ============================================================================
// Terminal outcomes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_attempt_cap_stops_after_third_failure() {
    let (connection, _handle, gateway) = client(test_options(3), memory_store());
    gateway.set_refusing(true);
    let (config, _changes) = ChannelConfigSource::new(game("Game"));

    let result = connection
        .start(config, StaticCredential::new("token"))
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, GatewayError::ReconnectExhausted { attempts: 3 }));
    assert_eq!(error.exit_code(), 3);
    assert_eq!(gateway.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_ready_resets_attempt_count() {
    let (connection, handle, mut gateway) = client(test_options(2), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut peer = gateway.accept().await;
    peer.establish("session-1", 1).await;

    for seq in 2..6 {
        drop(peer);
        peer = gateway.accept().await;
        peer.hello().await;
        let resume = peer.expect_op(OpCode::Resume).await.as_resume().unwrap();
        assert_eq!(resume.seq, seq - 1);
        peer.resumed(seq).await;
        peer.expect_op(OpCode::PresenceUpdate).await;
        assert_eq!(handle.phase(), ConnectionPhase::Ready);
    }
    assert_eq!(gateway.attempts(), 5);
    assert!(!task.is_finished());

    handle.stop();
    drop(peer);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credential_is_fatal() {
    let (connection, _handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("bad-token")));

    let mut peer = gateway.accept().await;
    peer.hello().await;
    peer.expect_op(OpCode::Identify).await;
    peer.close(4004, "Authentication failed.").await;

    let error = task.await.unwrap().unwrap_err();
    assert!(matches!(error, GatewayError::AuthRejected(_)));
    assert_eq!(error.exit_code(), 2);
    assert_eq!(gateway.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_backoff_persists_elapsed() {
    let store = memory_store();
    let (connection, handle, gateway) = client(test_options(0), store.clone());
    gateway.set_refusing(true);
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut phases = handle.subscribe_phase();
    phases
        .wait_for(|phase| *phase == ConnectionPhase::Reconnecting)
        .await
        .unwrap();
    handle.stop();

    assert!(task.await.unwrap().is_ok());
    assert!(store.save_count() >= 1);
    assert_eq!(handle.phase(), ConnectionPhase::Disconnected);
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_zombie_connection_reconnects_once() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 1).await;

    // Never acknowledge; the second due heartbeat declares the connection dead
    first.expect_op(OpCode::Heartbeat).await;
    let _second = gateway.accept().await;
    assert_eq!(gateway.attempts(), 2);

    handle.stop();
    assert!(task.await.unwrap().is_ok());
    assert_eq!(gateway.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_acknowledged_heartbeats_keep_connection() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut peer = gateway.accept().await;
    peer.establish("session-1", 1).await;

    for _ in 0..3 {
        let beat = peer.expect_op(OpCode::Heartbeat).await;
        assert_eq!(beat.as_heartbeat_seq(), Some(Some(1)));
        peer.send(presence_gateway::protocol::GatewayMessage::heartbeat_ack())
            .await;
    }
    assert_eq!(gateway.attempts(), 1);
    assert_eq!(handle.phase(), ConnectionPhase::Ready);

    handle.stop();
    assert_eq!(peer.expect_close().await, 1000);
    assert!(task.await.unwrap().is_ok());
}

// ============================================================================
// Configuration changes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_name_change_repushes_without_reconnect() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, changes) = ChannelConfigSource::new(game("Old Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut peer = gateway.accept().await;
    peer.establish("session-1", 1).await;

    changes
        .send(ConfigChange::presence(game("New Game")))
        .await
        .unwrap();
    let update = peer
        .expect_op(OpCode::PresenceUpdate)
        .await
        .as_presence_update()
        .unwrap();
    assert_eq!(update.activity().map(|a| a.name.as_str()), Some("New Game"));
    assert_eq!(gateway.attempts(), 1);

    handle.stop();
    drop(peer);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_credential_change_reconnects_with_identify() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 1).await;

    changes
        .send(ConfigChange {
            spec: game("Game"),
            credential_changed: true,
        })
        .await
        .unwrap();
    assert_eq!(first.expect_close().await, 1000);

    let mut second = gateway.accept().await;
    second.hello().await;
    second.expect_op(OpCode::Identify).await;
    assert_eq!(gateway.attempts(), 2);

    handle.stop();
    drop(second);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_application_id_change_reconnects() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, changes) = ChannelConfigSource::new(game("Game"));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut first = gateway.accept().await;
    first.establish("session-1", 1).await;

    changes
        .send(ConfigChange::presence(
            game("Game").with_application_id("1234567890"),
        ))
        .await
        .unwrap();
    assert_eq!(first.expect_close().await, 1000);

    let mut second = gateway.accept().await;
    let (identify, _) = second.establish("session-2", 1).await;
    let presence = identify.as_identify().and_then(|i| i.presence).unwrap();
    assert_eq!(
        presence.activity().and_then(|a| a.application_id.as_deref()),
        Some("1234567890")
    );

    handle.stop();
    drop(second);
    assert!(task.await.unwrap().is_ok());
}

// ============================================================================
// Presence content
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_three_buttons_truncated_to_two() {
    let spec = game("Game")
        .with_application_id("1234567890")
        .with_button("One", "https://one.example")
        .with_button("Two", "https://two.example")
        .with_button("Three", "https://three.example");

    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) = ChannelConfigSource::new(spec);
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut peer = gateway.accept().await;
    let (_, presence) = peer.establish("session-1", 1).await;
    let payload = presence.as_presence_update().unwrap();
    let activity = payload.activity().unwrap();

    assert_eq!(activity.buttons, vec!["One".to_string(), "Two".to_string()]);
    assert_eq!(
        activity.metadata.as_ref().map(|m| m.button_urls.len()),
        Some(2)
    );

    handle.stop();
    drop(peer);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_time_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("elapsed.json");
    JsonFileElapsedStore::new(&path)
        .save(&ElapsedRecord::new(600, Utc::now()))
        .unwrap();

    let store: Arc<dyn ElapsedStore> = Arc::new(JsonFileElapsedStore::new(&path));
    let (connection, handle, mut gateway) = client(test_options(0), store);
    let (config, _changes) =
        ChannelConfigSource::new(game("Game").with_elapsed_mode(ElapsedMode::Auto));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut peer = gateway.accept().await;
    let (_, presence) = peer.establish("session-1", 1).await;
    let start = presence
        .as_presence_update()
        .and_then(|p| p.activity().and_then(|a| a.timestamps))
        .map(|t| t.start)
        .unwrap();

    let expected = (Utc::now() - ChronoDuration::seconds(600)).timestamp_millis();
    assert!((start - expected).abs() < 5_000, "start {start} vs {expected}");

    handle.stop();
    drop(peer);
    assert!(task.await.unwrap().is_ok());

    let saved = JsonFileElapsedStore::new(&path).load().unwrap().unwrap();
    assert!(saved.accumulated_seconds >= 600);
}

#[tokio::test(start_paused = true)]
async fn test_no_timestamps_in_none_mode() {
    let (connection, handle, mut gateway) = client(test_options(0), memory_store());
    let (config, _changes) =
        ChannelConfigSource::new(game("Game").with_elapsed_mode(ElapsedMode::None));
    let task = tokio::spawn(connection.start(config, StaticCredential::new("token")));

    let mut peer = gateway.accept().await;
    let (_, presence) = peer.establish("session-1", 1).await;
    let payload = presence.as_presence_update().unwrap();
    assert!(payload.activity().unwrap().timestamps.is_none());

    handle.stop();
    drop(peer);
    assert!(task.await.unwrap().is_ok());
}
