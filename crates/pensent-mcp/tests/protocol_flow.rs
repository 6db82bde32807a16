//! End-to-end flows through the protocol handler: record, match, predict.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use pensent_mcp::protocol::ProtocolHandler;
use pensent_mcp::session::PatternSessionManager;
use pensent_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

fn handler_in(dir: &tempfile::TempDir) -> ProtocolHandler {
    let path = dir.path().join("patterns.pens");
    let session = PatternSessionManager::open(path.to_str().unwrap()).unwrap();
    ProtocolHandler::new(Arc::new(Mutex::new(session)))
}

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    let parsed: IncomingMessage = serde_json::from_value(msg).unwrap();
    handler
        .handle_message(parsed)
        .await
        .expect("expected response")
}

async fn call_tool(handler: &ProtocolHandler, id: i64, name: &str, arguments: Value) -> Value {
    send_unwrap(
        handler,
        mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments })),
    )
    .await
}

/// Decode the JSON body a tool returned as text content.
fn tool_body(resp: &Value) -> Value {
    let text = resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("no text content in {resp}"));
    serde_json::from_str(text).unwrap()
}

fn signature(fingerprint: &str, archetype: &str, quadrants: [f64; 4], trend: &str) -> Value {
    json!({
        "fingerprint": fingerprint,
        "archetype": archetype,
        "dominant_force": "primary",
        "flow_direction": "forward",
        "intensity": 0.7,
        "quadrant_profile": {
            "q1": quadrants[0], "q2": quadrants[1], "q3": quadrants[2], "q4": quadrants[3]
        },
        "temporal_flow": {
            "opening": 0.3, "middle": 0.7, "ending": 0.5,
            "trend": trend, "momentum": 0.4
        },
        "critical_moments": [
            { "index": 24, "type": "sacrifice", "severity": 0.9, "description": "Bxh7+" }
        ]
    })
}

async fn record(handler: &ProtocolHandler, id: i64, sig: Value, outcome: &str) -> Value {
    let resp = call_tool(
        handler,
        id,
        "pattern_record",
        json!({ "domain": "chess", "signature": sig, "outcome": outcome }),
    )
    .await;
    tool_body(&resp)
}

// ═══════════════════════════════════════════════════════
// FULL FLOW
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_record_match_predict() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_in(&dir);
    send_unwrap(&handler, init_request()).await;

    let attack = [0.6, 0.2, 0.1, 0.1];
    let r1 = record(&handler, 1, signature("g1", "kingside_attack", attack, "accelerating"), "white_wins").await;
    let r2 = record(&handler, 2, signature("g2", "kingside_attack", attack, "accelerating"), "white_wins").await;
    let r3 = record(
        &handler,
        3,
        signature("g3", "endgame_grind", [0.1, 0.1, 0.4, 0.4], "declining"),
        "draw",
    )
    .await;
    assert_eq!(r1["pattern_id"], 1);
    assert_eq!(r2["pattern_id"], 2);
    assert_eq!(r3["pattern_id"], 3);
    assert_eq!(r1["known_archetype"], true);

    let target = signature("live", "kingside_attack", attack, "accelerating");

    let matched = tool_body(
        &call_tool(
            &handler,
            4,
            "pattern_match",
            json!({ "domain": "chess", "signature": target, "min_similarity": 0.6 }),
        )
        .await,
    );
    assert_eq!(matched["total"], 2);
    assert_eq!(matched["matches"][0]["pattern_id"], 1);
    assert_eq!(matched["matches"][1]["pattern_id"], 2);
    assert!((matched["matches"][0]["similarity"].as_f64().unwrap() - 1.0).abs() < 1e-9);

    let predicted = tool_body(
        &call_tool(
            &handler,
            5,
            "outcome_predict",
            json!({ "domain": "chess", "signature": target }),
        )
        .await,
    );
    assert_eq!(predicted["sample_size"], 3);
    assert_eq!(predicted["most_likely"]["outcome"], "white_wins");
    let p_white = predicted["probabilities"]["white_wins"].as_f64().unwrap();
    let p_draw = predicted["probabilities"]["draw"].as_f64().unwrap();
    assert!(p_white > p_draw);
    assert!((p_white + p_draw - 1.0).abs() < 1e-9);
    assert_eq!(predicted["strategic"]["archetype"], "kingside_attack");
    assert_eq!(predicted["recommendation"]["action"], "follow_kingside_attack_plan");
}

#[tokio::test]
async fn test_match_reports_source_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_in(&dir);
    send_unwrap(&handler, init_request()).await;

    let attack = [0.6, 0.2, 0.1, 0.1];
    let sig = signature("g1", "kingside_attack", attack, "accelerating");
    call_tool(
        &handler,
        1,
        "pattern_record",
        json!({
            "domain": "chess",
            "signature": sig,
            "outcome": "white_wins",
            "metadata": { "event": "club championship", "round": 4 }
        }),
    )
    .await;
    record(&handler, 2, signature("g2", "kingside_attack", attack, "stable"), "draw").await;

    let target = signature("live", "kingside_attack", attack, "accelerating");
    let matched = tool_body(
        &call_tool(&handler, 3, "pattern_match", json!({ "domain": "chess", "signature": target })).await,
    );
    assert_eq!(matched["matches"][0]["pattern_id"], 1);
    assert_eq!(matched["matches"][0]["source_metadata"]["round"], 4);
    assert!(matched["matches"][1]["source_metadata"].is_null());

    let predicted = tool_body(
        &call_tool(&handler, 4, "outcome_predict", json!({ "domain": "chess", "signature": target })).await,
    );
    assert_eq!(
        predicted["matches"][0]["source_metadata"]["event"],
        "club championship"
    );
}

#[tokio::test]
async fn test_prediction_on_empty_pool_is_tactical_only() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_in(&dir);
    send_unwrap(&handler, init_request()).await;

    let resp = call_tool(
        &handler,
        1,
        "outcome_predict",
        json!({
            "domain": "chess",
            "signature": signature("live", "tactical_melee", [0.25, 0.25, 0.25, 0.25], "volatile"),
            "tactical": {
                "best_action": "Nf5",
                "evaluation": 1.2,
                "depth": 22,
                "confidence": 0.8
            }
        }),
    )
    .await;
    let body = tool_body(&resp);
    assert_eq!(body["sample_size"], 0);
    assert!(body["most_likely"].is_null());
    assert_eq!(body["recommendation"]["action"], "Nf5");
    assert!(body["recommendation"]["strategic_reason"]
        .as_str()
        .unwrap()
        .contains("no historical pattern data"));
}

#[tokio::test]
async fn test_trajectory_probabilities_sum_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_in(&dir);
    send_unwrap(&handler, init_request()).await;

    let attack = [0.6, 0.2, 0.1, 0.1];
    record(&handler, 1, signature("g1", "kingside_attack", attack, "accelerating"), "white_wins").await;

    let body = tool_body(
        &call_tool(
            &handler,
            2,
            "trajectory_predict",
            json!({
                "domain": "chess",
                "signature": signature("live", "kingside_attack", attack, "accelerating"),
                "current_index": 10
            }),
        )
        .await,
    );
    let t = &body["trajectory"];
    let total = t["primary_win_probability"].as_f64().unwrap()
        + t["secondary_win_probability"].as_f64().unwrap()
        + t["draw_probability"].as_f64().unwrap();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(t["milestones"][0]["predicted_index"], 24);
    assert_eq!(body["pattern_ids"], json!([1]));
}

#[tokio::test]
async fn test_compare_and_resources() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_in(&dir);
    send_unwrap(&handler, init_request()).await;

    record(&handler, 1, signature("a", "kingside_attack", [0.6, 0.2, 0.1, 0.1], "stable"), "white_wins").await;
    record(&handler, 2, signature("b", "queenside_expansion", [0.1, 0.6, 0.2, 0.1], "stable"), "black_wins").await;

    let cmp = tool_body(
        &call_tool(&handler, 3, "pattern_compare", json!({ "pattern_a": 1, "pattern_b": 2 })).await,
    );
    assert_eq!(cmp["same_archetype"], false);
    assert_eq!(cmp["same_outcome"], false);
    let sim = cmp["similarity"].as_f64().unwrap();
    assert!(sim > 0.0 && sim < 1.0);

    let read = send_unwrap(
        &handler,
        mcp_request(4, "resources/read", json!({ "uri": "pens://pattern/2" })),
    )
    .await;
    let text = read["result"]["contents"][0]["text"].as_str().unwrap();
    let pattern: Value = serde_json::from_str(text).unwrap();
    assert_eq!(pattern["archetype"], "queenside_expansion");
    assert!(pattern["created_at"].as_str().unwrap().contains('T'));

    let stats = send_unwrap(
        &handler,
        mcp_request(5, "resources/read", json!({ "uri": "pens://stats" })),
    )
    .await;
    let text = stats["result"]["contents"][0]["text"].as_str().unwrap();
    let stats: Value = serde_json::from_str(text).unwrap();
    assert_eq!(stats["total_patterns"], 2);
    assert_eq!(stats["by_domain"]["chess"], 2);

    let domain = send_unwrap(
        &handler,
        mcp_request(6, "resources/read", json!({ "uri": "pens://domain/chess" })),
    )
    .await;
    let text = domain["result"]["contents"][0]["text"].as_str().unwrap();
    let domain: Value = serde_json::from_str(text).unwrap();
    assert_eq!(domain["outcomes"]["black_wins"], 1);
}

#[tokio::test]
async fn test_archetype_tools() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_in(&dir);
    send_unwrap(&handler, init_request()).await;

    let list = tool_body(&call_tool(&handler, 1, "archetype_list", json!({ "domain": "code" })).await);
    assert_eq!(list["count"], 6);

    let classified = tool_body(
        &call_tool(
            &handler,
            2,
            "archetype_classify",
            json!({ "domain": "chess", "tags": ["xyzzy-not-a-keyword"] }),
        )
        .await,
    );
    assert_eq!(classified["matched"], false);

    let resp = call_tool(&handler, 3, "archetype_list", json!({ "domain": "poker" })).await;
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn test_store_survives_session_end() {
    let dir = tempfile::tempdir().unwrap();
    {
        let handler = handler_in(&dir);
        send_unwrap(&handler, init_request()).await;
        record(&handler, 1, signature("", "kingside_attack", [0.5, 0.2, 0.2, 0.1], "stable"), "white_wins").await;
        let ended = tool_body(&call_tool(&handler, 2, "session_end", json!({})).await);
        assert_eq!(ended["total_patterns"], 1);
    }

    let handler = handler_in(&dir);
    let read = send_unwrap(
        &handler,
        mcp_request(1, "resources/read", json!({ "uri": "pens://pattern/1" })),
    )
    .await;
    let text = read["result"]["contents"][0]["text"].as_str().unwrap();
    let pattern: Value = serde_json::from_str(text).unwrap();
    assert!(!pattern["fingerprint"].as_str().unwrap().is_empty());
}
