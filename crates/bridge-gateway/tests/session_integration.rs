//! Integration tests for session lifecycle and live fan-out.

use bridge_core::{BridgeError, GatewayConfig};
use bridge_gateway::{
    ConnectionState, ManagerApiFactory, ManagerCredentials, RawDeal, RawPosition,
    SessionRegistry, SimulatedConfig, SimulatedManagerApi,
};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

fn credentials() -> ManagerCredentials {
    ManagerCredentials {
        server: "203.0.113.1:443".to_string(),
        login: 1001,
        password: SecretString::from("manager-pw"),
    }
}

fn test_config() -> GatewayConfig {
    GatewayConfig {
        connect_timeout_ms: 500,
        poll_interval_ms: 20,
        channel_capacity: 64,
    }
}

/// Registry wired to a single shared simulated SDK instance.
fn registry_with(api: Arc<SimulatedManagerApi>) -> SessionRegistry {
    let factory = Arc::new(move |_credentials: &ManagerCredentials| {
        api.clone() as Arc<dyn bridge_gateway::ManagerApi>
    }) as Arc<dyn ManagerApiFactory>;
    SessionRegistry::new(factory, test_config())
}

fn raw_deal(ticket: u64) -> RawDeal {
    RawDeal {
        ticket,
        login: 1001,
        action: 0,
        symbol: "XAUUSD".to_string(),
        time: 1_700_000_000,
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_get_or_create_yields_single_session() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = Arc::new(registry_with(api));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry.get_or_create("demo", credentials())
        }));
    }

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap());
    }

    assert_eq!(registry.len(), 1);
    for session in &sessions[1..] {
        assert!(Arc::ptr_eq(&sessions[0], session));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_is_idempotent() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = registry_with(api.clone());
    let session = registry.get_or_create("demo", credentials());

    session.connect().await.unwrap();
    session.connect().await.unwrap();

    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(api.connect_calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_failure_carries_sdk_error_text() {
    let api = Arc::new(SimulatedManagerApi::with_config(SimulatedConfig {
        fail_connect: true,
        ..Default::default()
    }));
    let registry = registry_with(api);
    let session = registry.get_or_create("demo", credentials());

    let err = session.connect().await.unwrap_err();
    match err {
        BridgeError::ConnectionFailure(message) => {
            assert!(message.contains("Invalid login"));
        }
        other => panic!("expected ConnectionFailure, got {:?}", other),
    }
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_timeout_leaves_disconnected_and_orphan_cleans_up() {
    let api = Arc::new(SimulatedManagerApi::with_config(SimulatedConfig {
        connect_delay_ms: 200,
        ..Default::default()
    }));
    let factory = {
        let api = api.clone();
        Arc::new(move |_credentials: &ManagerCredentials| {
            api.clone() as Arc<dyn bridge_gateway::ManagerApi>
        }) as Arc<dyn ManagerApiFactory>
    };
    let registry = SessionRegistry::new(
        factory,
        GatewayConfig {
            connect_timeout_ms: 50,
            poll_interval_ms: 20,
            channel_capacity: 64,
        },
    );
    let session = registry.get_or_create("demo", credentials());

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, BridgeError::ConnectionFailure(_)));
    assert_eq!(session.state(), ConnectionState::Disconnected);

    // The abandoned handshake eventually succeeds and must tear itself down.
    sleep(Duration::from_millis(400)).await;
    assert!(!api.is_connected());
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_is_idempotent() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = registry_with(api);
    let session = registry.get_or_create("demo", credentials());

    session.connect().await.unwrap();
    assert!(session.disconnect().await);
    assert!(!session.disconnect().await);
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn latest_deals_drains_once() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = registry_with(api.clone());
    let session = registry.get_or_create("demo", credentials());

    // First call connects and subscribes as a side effect.
    assert!(session.latest_deals().await.unwrap().is_empty());
    assert!(api.emit_deal(raw_deal(1)));
    assert!(api.emit_deal(raw_deal(2)));

    let first = session.latest_deals().await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].ticket, 1);

    let second = session.latest_deals().await.unwrap();
    assert!(second.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn fanout_delivers_each_batch_to_every_subscriber() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = registry_with(api.clone());
    let session = registry.get_or_create("demo", credentials());

    let mut rx_a = session.subscribe_deals().await.unwrap();
    let mut rx_b = session.subscribe_deals().await.unwrap();
    let mut rx_c = session.subscribe_deals().await.unwrap();
    assert_eq!(api.subscribe_calls(), 1);

    assert!(api.emit_deal(raw_deal(7)));

    for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
        let batch = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("batch within a second")
            .expect("channel open");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].ticket, 7);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn subscribe_failure_leaves_no_subscriber() {
    let api = Arc::new(SimulatedManagerApi::with_config(SimulatedConfig {
        fail_subscribe: true,
        ..Default::default()
    }));
    let registry = registry_with(api.clone());
    let session = registry.get_or_create("demo", credentials());

    let err = session.subscribe_deals().await.unwrap_err();
    assert!(matches!(err, BridgeError::QueryFailure(_)));

    // No half-subscribed state: a later attempt subscribes cleanly.
    api.set_config(SimulatedConfig::default());
    let _rx = session.subscribe_deals().await.unwrap();
    assert_eq!(api.subscribe_calls(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn pump_stops_when_last_subscriber_leaves() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = registry_with(api.clone());
    let session = registry.get_or_create("demo", credentials());

    let rx = session.subscribe_deals().await.unwrap();
    drop(rx);

    // Give the pump time to observe zero subscribers and exit.
    sleep(Duration::from_millis(200)).await;

    assert!(api.emit_deal(raw_deal(9)));
    sleep(Duration::from_millis(200)).await;

    // A running pump would have drained the buffer into the void.
    let drained = session.latest_deals().await.unwrap();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].ticket, 9);
}

#[tokio::test(flavor = "multi_thread")]
async fn positions_stream_broadcasts_snapshots() {
    let api = Arc::new(SimulatedManagerApi::new());
    api.script_positions(vec![RawPosition {
        ticket: 55,
        login: 1001,
        symbol: "EURUSD".to_string(),
        action: 1,
        volume: 0.5,
        price_open: 1.0815,
        price_current: 1.0820,
        profit: -25.0,
        time_create: 1_700_000_000,
    }]);
    let registry = registry_with(api);
    let session = registry.get_or_create("demo", credentials());

    let mut rx = session.subscribe_positions().await.unwrap();
    let snapshot = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("snapshot within a second")
        .expect("channel open");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].ticket, 55);
}

#[tokio::test(flavor = "multi_thread")]
async fn registry_remove_reports_live_teardown() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = registry_with(api.clone());
    let session = registry.get_or_create("demo", credentials());
    session.connect().await.unwrap();

    assert!(registry.remove("demo").await.unwrap());
    assert!(!api.is_connected());
    assert!(matches!(
        registry.get("demo").unwrap_err(),
        BridgeError::NotFound(_)
    ));
    assert!(matches!(
        registry.remove("demo").await.unwrap_err(),
        BridgeError::NotFound(_)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_reflects_session_state() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = registry_with(api);

    let alpha = registry.get_or_create("alpha", credentials());
    registry.get_or_create("beta", credentials());
    alpha.connect().await.unwrap();

    let summaries = registry.list();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].identifier, "alpha");
    assert_eq!(summaries[0].state, ConnectionState::Connected);
    assert_eq!(summaries[1].identifier, "beta");
    assert_eq!(summaries[1].state, ConnectionState::Disconnected);
}
