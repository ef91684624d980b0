//! Integration tests for the historical query facade and catalog queries.

use bridge_core::{BridgeError, Coded, DealAction, GatewayConfig, ModifyFlag};
use bridge_gateway::{
    catalog, history, ManagerApiFactory, ManagerCredentials, RawCommission, RawDeal, RawGroup,
    RawTier, RawUser, SessionRegistry, SimulatedConfig, SimulatedManagerApi,
};
use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use std::sync::Arc;

fn setup(api: Arc<SimulatedManagerApi>) -> SessionRegistry {
    let factory = Arc::new(move |_credentials: &ManagerCredentials| {
        api.clone() as Arc<dyn bridge_gateway::ManagerApi>
    }) as Arc<dyn ManagerApiFactory>;
    SessionRegistry::new(factory, GatewayConfig::default())
}

fn credentials() -> ManagerCredentials {
    ManagerCredentials {
        server: "203.0.113.1:443".to_string(),
        login: 1001,
        password: SecretString::from("manager-pw"),
    }
}

fn raw_deal(ticket: u64, login: u64, symbol: &str, time: i64) -> RawDeal {
    RawDeal {
        ticket,
        login,
        symbol: symbol.to_string(),
        time,
        action: 0,
        entry: 0,
        reason: 3,
        modification_flags: 0x0000_0005,
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn facade_auto_connects_and_normalizes() {
    let api = Arc::new(SimulatedManagerApi::new());
    api.script_deals(vec![
        raw_deal(1, 1001, "XAUUSD", 1_700_000_100),
        raw_deal(2, 1002, "EURUSD", 1_700_000_200),
    ]);
    let registry = setup(api.clone());
    let session = registry.get_or_create("demo", credentials());
    assert_eq!(api.connect_calls(), 0);

    let from = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let to = Utc.timestamp_opt(1_700_001_000, 0).unwrap();
    let deals = history::deals_by_logins(&session, "1001", from, to)
        .await
        .unwrap();

    assert_eq!(api.connect_calls(), 1);
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].ticket, 1);
    assert_eq!(deals[0].action, Coded::Known(DealAction::Buy));
    assert_eq!(
        deals[0].modification_flags,
        vec![ModifyFlag::Admin, ModifyFlag::Position]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn validation_rejects_before_any_external_call() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = setup(api.clone());
    let session = registry.get_or_create("demo", credentials());

    let from = Utc.timestamp_opt(0, 0).unwrap();
    let to = Utc.timestamp_opt(1, 0).unwrap();

    let err = history::deals_by_logins(&session, "1001,abc", from, to)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ValidationFailure(_)));

    let err = history::deals_by_tickets(&session, "").await.unwrap_err();
    assert!(matches!(err, BridgeError::ValidationFailure(_)));

    let err = history::deals_by_group(&session, "  ", from, to)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ValidationFailure(_)));

    // No connect attempt was made for any of the rejected inputs.
    assert_eq!(api.connect_calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn query_shapes_filter_as_requested() {
    let api = Arc::new(SimulatedManagerApi::new());
    api.script_deals(vec![
        raw_deal(1, 1001, "XAUUSD", 100),
        raw_deal(2, 1001, "EURUSD", 200),
        raw_deal(3, 1002, "XAUUSD", 300),
        raw_deal(4, 1001, "XAUUSD", 400),
    ]);
    let registry = setup(api);
    let session = registry.get_or_create("demo", credentials());

    let from = Utc.timestamp_opt(0, 0).unwrap();
    let to = Utc.timestamp_opt(1_000, 0).unwrap();

    let by_group = history::deals_by_group(&session, "*", from, to).await.unwrap();
    assert_eq!(by_group.len(), 4);

    let by_group_symbol = history::deals_by_group_symbol(&session, "*", "XAUUSD", from, to)
        .await
        .unwrap();
    assert_eq!(by_group_symbol.len(), 3);

    let by_logins_symbol =
        history::deals_by_logins_symbol(&session, "1001", "XAUUSD", from, to)
            .await
            .unwrap();
    assert_eq!(by_logins_symbol.len(), 2);

    let by_tickets = history::deals_by_tickets(&session, "2,3").await.unwrap();
    assert_eq!(by_tickets.len(), 2);

    let page = history::deals_page(&session, 1001, from, to, 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].ticket, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn query_failure_carries_sdk_error_text() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = setup(api.clone());
    let session = registry.get_or_create("demo", credentials());
    session.connect().await.unwrap();

    api.set_config(SimulatedConfig {
        fail_queries: true,
        ..Default::default()
    });

    let from = Utc.timestamp_opt(0, 0).unwrap();
    let to = Utc.timestamp_opt(1, 0).unwrap();
    let err = history::deals_by_group(&session, "*", from, to)
        .await
        .unwrap_err();

    match err {
        BridgeError::QueryFailure(message) => assert!(message.contains("Request rejected")),
        other => panic!("expected QueryFailure, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_result_is_not_an_error() {
    let api = Arc::new(SimulatedManagerApi::new());
    let registry = setup(api);
    let session = registry.get_or_create("demo", credentials());

    let deals = history::deals_by_tickets(&session, "12345").await.unwrap();
    assert!(deals.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn catalog_normalizes_groups_with_ordered_tiers() {
    let api = Arc::new(SimulatedManagerApi::new());
    api.script_groups(vec![RawGroup {
        group: "real\\Standard".to_string(),
        currency: "USD".to_string(),
        leverage: 100,
        commissions: vec![RawCommission {
            name: "turnover".to_string(),
            path: "*".to_string(),
            tiers: vec![
                RawTier {
                    range_from: 10.0,
                    range_to: 100.0,
                    value: 0.0005,
                },
                RawTier {
                    range_from: 0.0,
                    range_to: 10.0,
                    value: 0.0007,
                },
            ],
        }],
        ..Default::default()
    }]);
    let registry = setup(api);
    let session = registry.get_or_create("demo", credentials());

    let groups = catalog::group_configurations(&session).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group, "real\\Standard");

    let tiers = &groups[0].commissions[0].tiers;
    assert_eq!(tiers[0].range_from, 0.0);
    assert_eq!(tiers[0].value, 0.0007);
    assert_eq!(tiers[1].range_from, 10.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn users_filtered_by_group_mask() {
    let api = Arc::new(SimulatedManagerApi::new());
    api.script_users(vec![
        RawUser {
            login: 1001,
            group: "real\\Standard".to_string(),
            name: "Alice".to_string(),
            ..Default::default()
        },
        RawUser {
            login: 1002,
            group: "demo\\Trial".to_string(),
            name: "Bob".to_string(),
            ..Default::default()
        },
    ]);
    let registry = setup(api);
    let session = registry.get_or_create("demo", credentials());

    let users = catalog::users_by_group(&session, "real\\Standard").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].login, 1001);

    let all = catalog::users_by_group(&session, "*").await.unwrap();
    assert_eq!(all.len(), 2);

    let err = catalog::users_by_group(&session, " ").await.unwrap_err();
    assert!(matches!(err, BridgeError::ValidationFailure(_)));
}
