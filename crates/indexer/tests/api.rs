use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shield_core::crypto::derive_nullifier;
use shield_core::ledger::{LedgerSnapshot, Note, NotePage, NoteQuery, RootWindow};
use shield_core::proof::{CoordinatorConfig, ProverSet};
use shield_core::registry::MintConfig;
use shield_core::{FieldElement, LedgerStore, MintRegistry};
use shield_indexer::{app_router, AppState, HttpReplica, Replica, UpstreamError};
use tower::util::ServiceExt;

const BODY_LIMIT: usize = usize::MAX;
const MINT: &str = "So11111111111111111111111111111111111111112";

fn fe(v: u64) -> FieldElement {
    FieldElement::from_u64(v)
}

fn hex(v: u64) -> String {
    fe(v).to_hex()
}

fn test_state(ledger: Arc<LedgerStore>, registry: MintRegistry) -> AppState {
    AppState::new(
        ledger,
        Arc::new(registry),
        ProverSet::mock_only(),
        CoordinatorConfig::default(),
    )
}

fn test_app() -> (Router, Arc<LedgerStore>) {
    let ledger = Arc::new(LedgerStore::default());
    let app = app_router(test_state(ledger.clone(), MintRegistry::empty(5)));
    (app, ledger)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn transfer_body(old_root: u64, nullifier: u64) -> Value {
    json!({
        "mint": MINT,
        "oldRoot": hex(old_root),
        "nullifiers": [nullifier.to_string()],
        "outputCommitments": [format!("{:064x}", 31)],
        "outputAmountCommitments": [hex(41)],
    })
}

#[tokio::test]
async fn test_transfer_validation_is_read_only_until_nullifier_written() {
    let (app, _) = test_app();
    let (status, _) = post(&app, &format!("/roots/{MINT}"), json!({"current": hex(100)})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/transfers/validate", transfer_body(100, 7)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["nullifiers"], json!([hex(7)]));
    assert_eq!(body["outputCommitments"], json!([hex(31)]));

    let (status, _) = post(&app, "/transfers/validate", transfer_body(100, 7)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, &format!("/nullifiers/{MINT}"), json!({"nullifiers": [7]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nullifiers"], json!([hex(7)]));

    let (status, body) = post(&app, "/transfers/validate", transfer_body(100, 7)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "nullifier_conflict");
    assert_eq!(body["duplicates"], json!([hex(7)]));
}

#[tokio::test]
async fn test_transfer_with_stale_root_reports_window() {
    let (app, _) = test_app();
    post(&app, &format!("/roots/{MINT}"), json!({"current": hex(1)})).await;
    post(&app, &format!("/roots/{MINT}"), json!({"current": hex(2)})).await;

    let (status, _) = post(&app, "/transfers/validate", transfer_body(1, 7)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/transfers/validate", transfer_body(3, 7)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "root_mismatch");
    assert_eq!(body["expected"], json!(hex(2)));
    assert_eq!(body["recent"], json!([hex(1)]));
}

#[tokio::test]
async fn test_transfer_rejects_uneven_outputs_and_unknown_mint() {
    let (app, _) = test_app();

    let mut body = transfer_body(1, 7);
    body["outputAmountCommitments"] = json!([]);
    let (status, err) = post(&app, "/transfers/validate", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "output_set_mismatch");

    let (status, err) = post(&app, "/transfers/validate", transfer_body(1, 7)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "mint_not_found");
}

#[tokio::test]
async fn test_malformed_field_is_invalid_encoding() {
    let (app, _) = test_app();
    let (status, err) = post(&app, &format!("/nullifiers/{MINT}"), json!({"nullifiers": ["zz-not-hex"]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_encoding");
    assert_eq!(err["field"], "nullifiers[0]");

    let (status, err) = post(&app, &format!("/nullifiers/{MINT}"), json!({"nullifiers": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_payload");

    let (status, err) = post(&app, &format!("/roots/{MINT}"), json!({"current": "0xnothex"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_encoding");

    let oversized = format!("0x{}", "f".repeat(200_000));
    let (status, err) = post(&app, &format!("/roots/{MINT}"), json!({"current": oversized})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_encoding");
    assert!(err["message"].as_str().unwrap().len() < 400);

    let (status, err) = post(&app, &format!("/roots/{MINT}"), json!({"current": -3})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_encoding");

    let mut bad_note = note(1, 1, 0);
    bad_note["commitment"] = json!("not-a-field");
    let (status, err) = post(&app, "/notes/vk-1", json!({"notes": [bad_note]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_encoding");

    let (status, err) = post(&app, &format!("/roots/{MINT}"), json!({"recent": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_payload");
}

#[tokio::test]
async fn test_unknown_roots_is_not_found() {
    let (app, _) = test_app();
    let (status, err) = get(&app, "/roots/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "mint_not_found");

    let (status, body) = get(&app, "/nullifiers/nobody").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nullifiers"], json!([]));
}

fn note(commitment: u64, slot: u64, leaf_index: u64) -> Value {
    json!({
        "commitment": hex(commitment),
        "ciphertext": format!("ct-{commitment}"),
        "mint": MINT,
        "slot": slot,
        "leafIndex": leaf_index,
    })
}

#[tokio::test]
async fn test_sync_pages_notes_after_slot() {
    let (app, _) = test_app();
    let notes = json!({"notes": [note(3, 7, 1), note(1, 5, 0), note(2, 7, 0), note(4, 8, 0)]});
    let (status, body) = post(&app, "/notes/vk-1", notes).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"].as_array().unwrap().len(), 4);

    let (status, body) = get(&app, &format!("/sync/{MINT}?afterSlot=5&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    let page = body["notes"].as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["commitment"], json!(hex(2)));
    assert_eq!(page[1]["commitment"], json!(hex(3)));
    assert_eq!(body["hasMore"], json!(true));
    assert_eq!(body["cursor"], json!(7));
    assert_eq!(body["roots"], Value::Null);
    assert_eq!(body["sources"]["notes"], "cache");

    let (status, body) = get(&app, &format!("/notes/mint/{MINT}?afterSlot=7&limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"].as_array().unwrap().len(), 1);
    assert_eq!(body["cursor"], json!(8));
    assert_eq!(body["hasMore"], json!(false));

    let (status, body) = get(&app, &format!("/notes/mint/{MINT}?afterSlot=8&limit=0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], json!([]));
    assert_eq!(body["hasMore"], json!(false));

    let (status, _) = get(&app, &format!("/notes/mint/{MINT}?limit=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_token_gates_routes() {
    let ledger = Arc::new(LedgerStore::default());
    let state = test_state(ledger, MintRegistry::empty(5)).with_auth_token(Some("s3cret".into()));
    let app = app_router(state);

    let (status, err) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "unauthorized");

    let request = Request::builder()
        .uri("/health")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::OK);

    let request = Request::builder()
        .uri("/health")
        .header("x-api-key", "s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::OK);

    let request = Request::builder()
        .uri("/health")
        .header("x-api-key", "wrong")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::UNAUTHORIZED);
}

fn shield_payload() -> Value {
    json!({
        "payload": {
            "mint": MINT, "oldRoot": "0", "amount": 1000, "recipient": "0xabc",
            "depositId": 1, "poolId": 9, "blinding": 2, "mintId": 5
        }
    })
}

#[tokio::test]
async fn test_prove_shield_with_mock_prover() {
    let (app, _) = test_app();
    let (status, first) = post(&app, "/prove/shield", shield_payload()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["mode"], "mock");
    assert_eq!(first["circuit"], "shield");
    assert_eq!(first["proof"].as_str().unwrap().len(), 2 + 512);
    assert!(first["verifyingKeyHash"].as_str().unwrap().starts_with("0x"));
    assert!(!first["publicInputs"].as_array().unwrap().is_empty());

    let (_, second) = post(&app, "/prove/shield", shield_payload()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_prove_rejections() {
    let (app, _) = test_app();
    let (status, err) = post(&app, "/prove/mint", shield_payload()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "unknown_circuit");

    let (status, err) = post(&app, "/prove/shield", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_payload");
    assert_eq!(err["field"], "payload");

    let (status, err) = post(
        &app,
        "/prove/unshield",
        json!({"payload": {
            "mint": MINT, "oldRoot": "0", "noteId": 1, "spendingKey": 2, "amount": 900,
            "fee": 100, "noteAmount": 900, "destination": 4, "mode": "origin", "mintId": 5, "poolId": 9
        }}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "negative_change");

    let mut unknown_history = shield_payload();
    unknown_history["payload"]["oldRoot"] = json!(hex(3));
    let (status, err) = post(&app, "/prove/shield", unknown_history).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "unknown_root");
    assert_eq!(err["claimed"], json!(hex(3)));
    assert_eq!(err["expected"], Value::Null);
    assert_eq!(err["recent"], json!([]));
}

#[tokio::test]
async fn test_prove_transfer_with_spent_nullifier() {
    let (app, _) = test_app();
    post(&app, &format!("/roots/{MINT}"), json!({"current": hex(50)})).await;
    let spent = derive_nullifier(fe(1), fe(2)).unwrap();
    post(&app, &format!("/nullifiers/{MINT}"), json!({"nullifiers": [spent.to_hex()]})).await;

    let payload = json!({"payload": {
        "mint": MINT, "oldRoot": hex(50), "mintId": 5, "poolId": 9,
        "inputs": [{"noteId": 1, "spendingKey": 2}],
        "outputs": [{"amount": 10, "recipient": 3, "blinding": 4}]
    }});
    let (status, err) = post(&app, "/prove/transfer", payload.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "nullifier_reused");
    assert_eq!(err["duplicates"], json!([spent.to_hex()]));

    let mut stale = payload;
    stale["payload"]["oldRoot"] = json!(hex(51));
    let (status, err) = post(&app, "/prove/transfer", stale).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "unknown_root");
}

#[tokio::test]
async fn test_ingest_applies_transitions_atomically() {
    let (app, ledger) = test_app();
    let (status, body) = post(&app, &format!("/ingest/{MINT}"), json!({"newRoot": 1, "nullifiers": [5]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], json!(1));
    assert_eq!(body["roots"]["current"], json!(hex(1)));

    let (status, err) = post(&app, &format!("/ingest/{MINT}"), json!({"oldRoot": 99, "newRoot": 2})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "root_mismatch");

    let (status, err) = post(
        &app,
        &format!("/ingest/{MINT}"),
        json!({"oldRoot": 1, "newRoot": 2, "nullifiers": [6, 5]}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["duplicates"], json!([hex(5)]));
    assert_eq!(ledger.roots(MINT).unwrap().current, fe(1));
    assert!(!ledger.contains_nullifier(MINT, &fe(6)));

    let (status, body) = get(&app, &format!("/roots/{MINT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "cache");

    let (status, err) = post(&app, "/ingest/OtherMint", json!({"oldRoot": 4, "newRoot": 5})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "mint_not_found");
    let (status, _) = post(&app, "/ingest/OtherMint", json!({"newRoot": 5, "nullifiers": [8, 8]})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(ledger.mints(), vec![MINT.to_string()]);
    let (_, body) = get(&app, "/health").await;
    assert_eq!(body["mints"], json!(1));
}

#[tokio::test]
async fn test_frozen_mint_rejects_ingest_and_proofs() {
    let frozen: MintConfig = serde_json::from_value(json!({"mint": MINT, "status": "frozen"})).unwrap();
    let registry = MintRegistry::from_configs(vec![frozen], 5).unwrap();
    let app = app_router(test_state(Arc::new(LedgerStore::default()), registry));

    let (status, err) = post(&app, &format!("/ingest/{MINT}"), json!({"newRoot": 1})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "mint_frozen");

    let (status, err) = post(&app, "/prove/shield", shield_payload()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "mint_frozen");

    let (status, body) = get(&app, "/mints").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mints"][0]["status"], "frozen");
}

#[tokio::test]
async fn test_wallet_records() {
    let (app, _) = test_app();

    let (status, body) = get(&app, "/allowances/alice/bob/usdc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], "0");

    let (status, body) = post(&app, "/allowances/alice/bob/usdc", json!({"amount": "0042"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], "42");
    let (_, body) = get(&app, "/allowances/alice/bob/usdc").await;
    assert_eq!(body["amount"], "42");

    let (status, err) = post(&app, "/balances/alice", json!({"mint": "usdc", "amount": "-1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_payload");
    post(&app, "/balances/alice", json!({"mint": "usdc", "amount": "10"})).await;
    let (_, body) = get(&app, "/balances/alice").await;
    assert_eq!(body["balances"]["usdc"], "10");

    let entry = |id: &str, ts: u64| {
        json!({"id": id, "type": "wrap", "signature": "sig", "symbol": "USDC", "amount": "1", "timestamp": ts})
    };
    post(&app, "/activity/view-1", entry("a", 1)).await;
    let (status, body) = post(&app, "/activity/view-1", json!({"entries": [entry("b", 3), entry("a", 2)]})).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["activity"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn test_snapshot_round_trip_through_service() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("ledger.json");

    let (app, ledger) = test_app();
    post(&app, &format!("/ingest/{MINT}"), json!({"newRoot": 1, "nullifiers": [5]})).await;
    post(&app, &format!("/ingest/{MINT}"), json!({"oldRoot": 1, "newRoot": 2})).await;
    post(&app, "/notes/vk-1", json!({"notes": [note(3, 7, 1)]})).await;
    ledger.snapshot().write(&path).unwrap();

    let restored = LedgerSnapshot::read(&path).unwrap().unwrap();
    let ledger = Arc::new(LedgerStore::from_snapshot(restored, 32));
    let app = app_router(test_state(ledger, MintRegistry::empty(5)));

    let (status, body) = get(&app, &format!("/roots/{MINT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current"], json!(hex(2)));
    assert_eq!(body["recent"], json!([hex(1), hex(0)]));
    assert_eq!(body["source"], "snapshot");

    let (_, body) = get(&app, "/notes/vk-1").await;
    assert_eq!(body["notes"][0]["commitment"], json!(hex(3)));

    let (_, body) = get(&app, &format!("/nullifiers/{MINT}")).await;
    assert_eq!(body["nullifiers"], json!([hex(5)]));
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let ledger = Arc::new(LedgerStore::default());
    let replica = HttpReplica::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    let state = test_state(ledger, MintRegistry::empty(5)).with_replica(Arc::new(replica));
    let app = app_router(state);

    post(&app, &format!("/roots/{MINT}"), json!({"current": hex(100)})).await;

    let (status, body) = get(&app, &format!("/roots/{MINT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "cache");

    let (status, err) = post(&app, "/transfers/validate", transfer_body(100, 7)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(err["error"], "upstream_unreachable");

    let (_, body) = get(&app, "/health").await;
    assert_eq!(body["upstream"]["configured"], json!(true));
    assert_eq!(body["upstream"]["reachable"], json!(false));
}

/// In-process replica holding a fixed view of one mint.
struct StaticReplica {
    roots: RootWindow,
    nullifiers: Vec<FieldElement>,
    notes: Vec<Note>,
    last_query: Mutex<Option<NoteQuery>>,
}

#[async_trait]
impl Replica for StaticReplica {
    async fn roots(&self, mint: &str) -> Result<Option<RootWindow>, UpstreamError> {
        Ok((mint == MINT).then(|| self.roots.clone()))
    }

    async fn nullifiers(&self, mint: &str) -> Result<Option<Vec<FieldElement>>, UpstreamError> {
        Ok((mint == MINT).then(|| self.nullifiers.clone()))
    }

    async fn notes_by_mint(&self, mint: &str, query: &NoteQuery) -> Result<Option<NotePage>, UpstreamError> {
        *self.last_query.lock().unwrap() = Some(query.clone());
        if mint != MINT {
            return Ok(None);
        }
        Ok(Some(NotePage {
            notes: self.notes.clone(),
            cursor: self.notes.last().map(|n| n.slot),
            has_more: true,
        }))
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn test_sync_prefers_reachable_upstream() {
    let upstream_note: Note = serde_json::from_value(note(77, 12, 0)).unwrap();
    let replica = Arc::new(StaticReplica {
        roots: RootWindow {
            current: fe(200),
            recent: vec![fe(199)],
        },
        nullifiers: vec![fe(5), fe(6)],
        notes: vec![upstream_note],
        last_query: Mutex::new(None),
    });
    let ledger = Arc::new(LedgerStore::default());
    let state = test_state(ledger.clone(), MintRegistry::empty(5)).with_replica(replica.clone());
    let app = app_router(state);

    let local = json!({"notes": [note(1, 3, 0)]});
    let (status, _) = post(&app, "/notes/vk-local", local).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, &format!("/sync/{MINT}?afterSlot=10&limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"]["roots"], "upstream");
    assert_eq!(body["sources"]["nullifiers"], "upstream");
    assert_eq!(body["sources"]["notes"], "upstream");
    assert_eq!(body["roots"]["current"], json!(hex(200)));
    assert_eq!(body["roots"]["recent"], json!([hex(199)]));
    assert_eq!(body["nullifiers"], json!([hex(5), hex(6)]));
    let page = body["notes"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["commitment"], json!(hex(77)));
    assert_eq!(body["cursor"], json!(12));
    assert_eq!(body["hasMore"], json!(true));

    let forwarded = replica.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(forwarded.after_slot, Some(10));
    assert_eq!(forwarded.limit, Some(1));

    // Refreshed state is written back to the local ledger.
    assert_eq!(ledger.roots(MINT).unwrap().current, fe(200));
    assert!(ledger.contains_nullifier(MINT, &fe(6)));

    let (status, body) = get(&app, &format!("/notes/mint/{MINT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "upstream");
    assert_eq!(body["notes"][0]["commitment"], json!(hex(77)));

    let (_, body) = get(&app, "/health").await;
    assert_eq!(body["upstream"]["reachable"], json!(true));
}

#[tokio::test]
async fn test_health_reports_capabilities() {
    let (app, _) = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["standalone"], json!(false));
    assert_eq!(body["upstream"]["configured"], json!(false));
    assert_eq!(body["rootWindow"], json!(32));
    assert_eq!(body["artifactsDir"], json!(""));
    for circuit in ["shield", "transfer", "unshield"] {
        assert_eq!(body["circuits"][circuit]["realArtifacts"], json!(false));
        assert_eq!(body["circuits"][circuit]["mode"], "mock");
    }
}
