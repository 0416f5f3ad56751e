//! End-to-end tests driving the REST and WebSocket surface of a running
//! gateway instance on an ephemeral port.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use tokio_tungstenite::tungstenite::Message as WsFrame;

use seedfund_gateway::api;
use seedfund_gateway::app_state::AppState;
use seedfund_gateway::collaborators::{
    AnalysisCache, AnalysisProvider, RepoAnalysis, TransferReceipt, WalletProvider,
};
use seedfund_gateway::domain::{
    EventBus, IdentityDirectory, LedgerBook, ListingBook, ListingId, MessageBoard,
};
use seedfund_gateway::error::MarketError;
use seedfund_gateway::service::{
    EngagementGateway, FundingLedger, IdentityReconciler, ListingRegistrar,
};
use seedfund_gateway::ws::handler::ws_handler;

#[derive(Debug, Default)]
struct SequentialWallet {
    counter: AtomicU64,
}

impl WalletProvider for SequentialWallet {
    fn send_transfer<'a>(
        &'a self,
        _to_address: &'a str,
        _amount: Decimal,
        _currency: &'a str,
    ) -> BoxFuture<'a, Result<TransferReceipt, MarketError>> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Box::pin(async move {
            Ok(TransferReceipt {
                reference: format!("0xe2e{n:08x}"),
            })
        })
    }
}

#[derive(Debug)]
struct FixedAnalysis;

impl AnalysisProvider for FixedAnalysis {
    fn analyze<'a>(
        &'a self,
        _listing_id: ListingId,
        repository_url: &'a str,
    ) -> BoxFuture<'a, Result<RepoAnalysis, MarketError>> {
        let url = repository_url.to_string();
        Box::pin(async move {
            Ok(RepoAnalysis {
                fraud_risk_score: 12,
                growth_potential_score: 81,
                code_quality_score: 74,
                summary: format!("healthy project at {url}"),
                risk_factors: vec!["single maintainer".to_string()],
                growth_indicators: vec!["steady commit cadence".to_string()],
                recommendations: vec!["add contributor docs".to_string()],
                analyzed_at: Utc::now(),
            })
        })
    }
}

/// Spawns a gateway on an ephemeral port; returns its HTTP and WS URLs.
async fn spawn_gateway() -> (String, String) {
    let directory = Arc::new(IdentityDirectory::new());
    let listings = Arc::new(ListingBook::new());
    let event_bus = EventBus::new(1024);

    let state = AppState {
        reconciler: Arc::new(IdentityReconciler::new(
            Arc::clone(&directory),
            event_bus.clone(),
        )),
        registrar: Arc::new(ListingRegistrar::new(
            Arc::clone(&directory),
            Arc::clone(&listings),
            event_bus.clone(),
        )),
        funding: Arc::new(FundingLedger::new(
            Arc::new(LedgerBook::new()),
            Arc::clone(&listings),
            directory,
            event_bus.clone(),
        )),
        engagement: Arc::new(EngagementGateway::new(
            Arc::new(MessageBoard::new()),
            listings,
            event_bus.clone(),
        )),
        event_bus,
        analysis: Some(Arc::new(AnalysisCache::new(Arc::new(FixedAnalysis)))),
        wallet: Some(Arc::new(SequentialWallet::default())),
    };

    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("bind failed: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("no local addr: {e}"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), format!("ws://{addr}/ws"))
}

async fn post_json(
    client: &reqwest::Client,
    url: &str,
    body: serde_json::Value,
) -> (reqwest::StatusCode, serde_json::Value) {
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("POST {url} failed: {e}"));
    let status = response.status();
    let body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or(serde_json::Value::Null);
    (status, body)
}

async fn get_json(client: &reqwest::Client, url: &str) -> (reqwest::StatusCode, serde_json::Value) {
    let response = client
        .get(url)
        .send()
        .await
        .unwrap_or_else(|e| panic!("GET {url} failed: {e}"));
    let status = response.status();
    let body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or(serde_json::Value::Null);
    (status, body)
}

fn snapshot_body(external_id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "external_id": external_id,
        "name": name,
        "full_name": format!("octocat/{name}"),
        "description": "an open source startup",
        "html_url": format!("https://github.com/octocat/{name}"),
        "language": "Rust",
        "stars_count": 42,
        "forks_count": 7
    })
}

/// Reconciles a handle + repository and registers a listing, returning
/// (developer_id, listing_id).
async fn onboard_listing(client: &reqwest::Client, base: &str, goal: &str) -> (String, String) {
    let (status, sync) = post_json(
        client,
        &format!("{base}/api/v1/sync"),
        serde_json::json!({
            "handle": "octocat",
            "repository": snapshot_body("9001", "widget"),
        }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    let developer_id = sync["developer_id"].as_str().unwrap_or_default().to_string();
    let repository_id = sync["repository_id"].as_str().unwrap_or_default().to_string();

    let (status, listing) = post_json(
        client,
        &format!("{base}/api/v1/listings"),
        serde_json::json!({
            "developer_id": developer_id,
            "repository_id": repository_id,
            "name": "widget",
            "description": "an open source startup",
            "funding_goal": goal,
            "contact": "founder@example.com",
            "funding_type": "grant",
            "project_stage": "mvp",
            "tags": ["rust"]
        }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{listing}");
    let listing_id = listing["listing_id"].as_str().unwrap_or_default().to_string();
    (developer_id, listing_id)
}

#[tokio::test]
async fn health_and_catalog_endpoints_respond() {
    let (base, _) = spawn_gateway().await;
    let client = reqwest::Client::new();

    let (status, health) = get_json(&client, &format!("{base}/health")).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    let (status, options) = get_json(&client, &format!("{base}/config/listing-options")).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(options["funding_types"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn sync_is_idempotent_and_relisting_conflicts() {
    let (base, _) = spawn_gateway().await;
    let client = reqwest::Client::new();

    let body = serde_json::json!({
        "handle": "octocat",
        "repository": snapshot_body("9001", "widget"),
    });
    let (status, first) = post_json(&client, &format!("{base}/api/v1/sync"), body.clone()).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(first["developer_created"], true);
    assert_eq!(first["repository_created"], true);

    let (status, second) = post_json(&client, &format!("{base}/api/v1/sync"), body).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(second["developer_created"], false);
    assert_eq!(second["repository_created"], false);
    assert_eq!(first["developer_id"], second["developer_id"]);
    assert_eq!(first["repository_id"], second["repository_id"]);

    // A second campaign for the same repository must be a 409 naming
    // the existing listing.
    let register = serde_json::json!({
        "developer_id": first["developer_id"],
        "repository_id": first["repository_id"],
        "name": "widget",
        "description": "an open source startup",
        "funding_goal": "50000",
        "contact": "founder@example.com"
    });
    let (status, created) =
        post_json(&client, &format!("{base}/api/v1/listings"), register.clone()).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    let listing_id = created["listing_id"].as_str().unwrap_or_default();

    let (status, conflict) = post_json(&client, &format!("{base}/api/v1/listings"), register).await;
    assert_eq!(status, reqwest::StatusCode::CONFLICT);
    assert_eq!(conflict["error"]["code"], 2101);
    assert!(
        conflict["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .contains(listing_id)
    );
}

#[tokio::test]
async fn funding_flow_produces_exact_summary() {
    let (base, _) = spawn_gateway().await;
    let client = reqwest::Client::new();
    let (_developer, listing_id) = onboard_listing(&client, &base, "50000").await;

    for (funder, amount) in [("0xAAA", "10000"), ("0xBBB", "5000"), ("0xAAA", "2500")] {
        let (status, tx) = post_json(
            &client,
            &format!("{base}/api/v1/listings/{listing_id}/transactions"),
            serde_json::json!({
                "funder": funder,
                "amount_display": amount,
                "amount_settlement": "1",
                "currency": "ETH"
            }),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::CREATED);
        assert_eq!(tx["status"], "pending");

        let tx_id = tx["transaction_id"].as_str().unwrap_or_default();
        let (status, settled) = post_json(
            &client,
            &format!("{base}/api/v1/transactions/{tx_id}/settle"),
            serde_json::json!({"outcome": "completed"}),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(settled["status"], "completed");
    }

    let (status, summary) = get_json(
        &client,
        &format!("{base}/api/v1/listings/{listing_id}/summary"),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(summary["raised"], "17500");
    assert_eq!(summary["funders"], 2);
    assert_eq!(summary["percentage"], "35");
    assert_eq!(summary["funding_goal"], "50000");
}

#[tokio::test]
async fn funding_replay_is_idempotent_and_mismatch_conflicts() {
    let (base, _) = spawn_gateway().await;
    let client = reqwest::Client::new();
    let (_developer, listing_id) = onboard_listing(&client, &base, "1000").await;
    let url = format!("{base}/api/v1/listings/{listing_id}/transactions");

    let body = serde_json::json!({
        "funder": "0xAAA",
        "amount_display": "100",
        "amount_settlement": "1",
        "currency": "ETH",
        "external_ref": "0xdeadbeef"
    });
    let (status, first) = post_json(&client, &url, body.clone()).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    assert_eq!(first["replayed"], false);

    let (status, replay) = post_json(&client, &url, body).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(replay["replayed"], true);
    assert_eq!(first["transaction_id"], replay["transaction_id"]);

    let (status, mismatch) = post_json(
        &client,
        &url,
        serde_json::json!({
            "funder": "0xAAA",
            "amount_display": "999",
            "amount_settlement": "1",
            "currency": "ETH",
            "external_ref": "0xdeadbeef"
        }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::CONFLICT);
    assert_eq!(mismatch["error"]["code"], 2103);
}

#[tokio::test]
async fn wallet_fund_flow_completes_and_counts() {
    let (base, _) = spawn_gateway().await;
    let client = reqwest::Client::new();
    let (developer_id, listing_id) = onboard_listing(&client, &base, "5000").await;

    // Funding requires the founder's payout address.
    let (status, _) = post_json(
        &client,
        &format!("{base}/api/v1/listings/{listing_id}/fund"),
        serde_json::json!({
            "funder": "0xAAA",
            "amount_display": "2500",
            "amount_settlement": "1",
            "currency": "ETH"
        }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &client,
        &format!("{base}/api/v1/developers/{developer_id}/payout-address"),
        serde_json::json!({"address": "0xF00"}),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let (status, tx) = post_json(
        &client,
        &format!("{base}/api/v1/listings/{listing_id}/fund"),
        serde_json::json!({
            "funder": "0xAAA",
            "amount_display": "2500",
            "amount_settlement": "1",
            "currency": "ETH"
        }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    assert_eq!(tx["status"], "completed");

    let (_, summary) = get_json(
        &client,
        &format!("{base}/api/v1/listings/{listing_id}/summary"),
    )
    .await;
    assert_eq!(summary["raised"], "2500");
    assert_eq!(summary["percentage"], "50");
}

#[tokio::test]
async fn analysis_endpoint_serves_cached_result() {
    let (base, _) = spawn_gateway().await;
    let client = reqwest::Client::new();
    let (_developer, listing_id) = onboard_listing(&client, &base, "1000").await;
    let url = format!("{base}/api/v1/listings/{listing_id}/analysis");

    let (status, analysis) = get_json(&client, &url).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(analysis["fraud_risk_score"], 12);

    let (status, again) = get_json(&client, &url).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(analysis["analyzed_at"], again["analyzed_at"]);
}

#[tokio::test]
async fn chat_partition_and_live_delivery() {
    let (base, ws_url) = spawn_gateway().await;
    let client = reqwest::Client::new();
    let (_developer, listing_id) = onboard_listing(&client, &base, "1000").await;

    // Subscribe as funder 0xAAA before any message is posted.
    let (mut ws, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .unwrap_or_else(|e| panic!("ws connect failed: {e}"));
    let subscribe = serde_json::json!({
        "id": "sub-1",
        "type": "command",
        "timestamp": Utc::now(),
        "payload": {
            "command": "subscribe",
            "listing_ids": [listing_id],
            "viewer_role": "funder",
            "viewer": "0xAAA"
        }
    });
    ws.send(WsFrame::text(subscribe.to_string()))
        .await
        .unwrap_or_else(|e| panic!("ws send failed: {e}"));

    let ack = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .ok()
        .flatten()
        .and_then(Result::ok)
        .unwrap_or_else(|| panic!("no subscribe ack"));
    let ack: serde_json::Value =
        serde_json::from_str(ack.to_text().unwrap_or_default()).unwrap_or_default();
    assert_eq!(ack["type"], "response");
    assert_eq!(ack["payload"]["count"], 1);

    // founder → funder A → funder B
    let messages_url = format!("{base}/api/v1/listings/{listing_id}/messages");
    for (role, sender, content) in [
        ("founder", None, "welcome"),
        ("funder", Some("0xAAA"), "hello from A"),
        ("funder", Some("0xBBB"), "hello from B"),
    ] {
        let (status, _) = post_json(
            &client,
            &messages_url,
            serde_json::json!({
                "sender_role": role,
                "sender": sender,
                "content": content
            }),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::CREATED);
    }

    // Funder A's live stream: founder message and A's own, in seq
    // order, never B's.
    let mut delivered = Vec::new();
    while delivered.len() < 2 {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .ok()
            .flatten()
            .and_then(Result::ok)
            .unwrap_or_else(|| panic!("live delivery timed out"));
        let value: serde_json::Value =
            serde_json::from_str(frame.to_text().unwrap_or_default()).unwrap_or_default();
        if value["payload"]["event_type"] == "message_posted" {
            delivered.push(value["payload"]["message"].clone());
        }
    }
    let seqs: Vec<u64> = delivered
        .iter()
        .filter_map(|m| m["seq"].as_u64())
        .collect();
    assert_eq!(seqs, vec![1, 2]);
    assert!(delivered.iter().all(|m| m["sender"] != "0xBBB"));

    // Founder's inbox: two conversations, each counting the broadcast
    // founder message.
    let (status, conversations) = get_json(
        &client,
        &format!("{base}/api/v1/listings/{listing_id}/conversations?role=founder"),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    let conversations = conversations.as_array().cloned().unwrap_or_default();
    assert_eq!(conversations.len(), 2);
    assert!(
        conversations
            .iter()
            .all(|c| c["message_count"].as_u64() == Some(2))
    );

    // Funder A sees one conversation and only their own side.
    let (status, own) = get_json(
        &client,
        &format!(
            "{base}/api/v1/listings/{listing_id}/conversations?role=funder&identity=0xAAA"
        ),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    let own = own.as_array().cloned().unwrap_or_default();
    assert_eq!(own.len(), 1);
    assert_eq!(own.first().map(|c| c["counterparty"].clone()), Some(serde_json::json!("founder")));

    // Resynchronization: history fetch matches what the live stream
    // delivered.
    let (status, history) = get_json(
        &client,
        &format!(
            "{base}/api/v1/listings/{listing_id}/conversations/founder/messages?role=funder&identity=0xAAA"
        ),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    let history_seqs: Vec<u64> = history["data"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|m| m["seq"].as_u64())
        .collect();
    assert_eq!(history_seqs, seqs);

    // Funder A may not read funder B's conversation.
    let (status, forbidden) = get_json(
        &client,
        &format!(
            "{base}/api/v1/listings/{listing_id}/conversations/0xBBB/messages?role=funder&identity=0xAAA"
        ),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
    assert_eq!(forbidden["error"]["code"], 1101);

    // Read acknowledgment clears the unread counter.
    let (status, marked) = post_json(
        &client,
        &format!("{base}/api/v1/listings/{listing_id}/conversations/founder/read"),
        serde_json::json!({"role": "funder", "identity": "0xAAA"}),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(marked["read_up_to"], 3);
}
