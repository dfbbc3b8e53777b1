//! Upstream selection and response merging for send_message.

use crate::mock_server::*;
use guidance_gateway::Error;
use mockito::Matcher;
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[tokio::test]
async fn undergraduates_only_reach_ruh() {
    for flag in [None, Some(true), Some(false)] {
        let mut fx = MockServerFixture::new().await;
        let ruh = fx.mock_chat("ruh", 200, reply("ruh says", &["r1"], "s-ruh")).await;
        let ugc = fx.mock_chat_unused("ugc").await;
        let gw = fx.builder(Some(UNDERGRAD)).build().unwrap();

        let out = gw.send_message("hi", Some("s1"), None, flag).await.unwrap();

        assert_eq!(out.response, "ruh says", "flag {:?}", flag);
        assert_eq!(out.session_id, "s-ruh");
        ruh.assert_async().await;
        ugc.assert_async().await;
    }
}

#[tokio::test]
async fn undergraduate_failure_is_an_error() {
    let mut fx = MockServerFixture::new().await;
    let _ruh = fx.mock_chat("ruh", 500, json!({"detail": "boom"})).await;
    let gw = fx.builder(Some(UNDERGRAD)).build().unwrap();

    let err = gw.send_message("hi", None, None, None).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, Error::Remote { .. }));
}

#[tokio::test]
async fn only_use_ruh_true_skips_ugc() {
    let mut fx = MockServerFixture::new().await;
    let ruh = fx.mock_chat("ruh", 200, reply("ruh says", &[], "s1")).await;
    let ugc = fx.mock_chat_unused("ugc").await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();

    let out = gw.chat("hi").only_use_ruh(true).send().await.unwrap();
    assert_eq!(out.response, "ruh says");
    ruh.assert_async().await;
    ugc.assert_async().await;
}

#[tokio::test]
async fn only_use_ruh_false_skips_ruh() {
    let mut fx = MockServerFixture::new().await;
    let ruh = fx.mock_chat_unused("ruh").await;
    let ugc = fx.mock_chat("ugc", 200, reply("ugc says", &["u1"], "s-ugc")).await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();

    let out = gw.chat("hi").only_use_ruh(false).send().await.unwrap();
    // a single side comes back untouched
    assert_eq!(out.response, "ugc says");
    assert_eq!(out.session_id, "s-ugc");
    assert_eq!(out.conversation_history.len(), 1);
    ruh.assert_async().await;
    ugc.assert_async().await;
}

#[tokio::test]
async fn unset_flag_merges_both() {
    let mut fx = MockServerFixture::new().await;
    let ruh = fx.mock_chat("ruh", 200, reply("from ruh", &["r1", "r2"], "")).await;
    let ugc = fx.mock_chat("ugc", 200, reply("from ugc", &["u1"], "s-ugc")).await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();

    let out = gw.chat("hi").session_id("s1").send().await.unwrap();

    assert_eq!(out.response, "[RUH]\nfrom ruh\n\n[UGC]\nfrom ugc");
    let contents: Vec<_> = out
        .conversation_history
        .iter()
        .map(|m| m.text())
        .collect();
    assert_eq!(contents, vec!["r1", "r2", "u1"]);
    assert_eq!(out.session_id, "s-ugc");
    ruh.assert_async().await;
    ugc.assert_async().await;
}

#[tokio::test]
async fn failed_side_becomes_placeholder() {
    let mut fx = MockServerFixture::new().await;
    let _ruh = fx.mock_chat("ruh", 503, json!({"detail": "down"})).await;
    let _ugc = fx.mock_chat("ugc", 200, json!({"response": "ok"})).await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();

    let out = gw.send_message("hi", Some("s1"), None, None).await.unwrap();

    let ruh_at = out.response.find("[RUH]").unwrap();
    let status_at = out.response.find("503").unwrap();
    let ugc_at = out.response.find("[UGC]").unwrap();
    let ok_at = out.response.rfind("ok").unwrap();
    assert!(ruh_at < status_at && status_at < ugc_at && ugc_at < ok_at);
    assert!(out.response.contains("RUH request failed: 503"));
    // the placeholder keeps the caller's session id and wins the merge
    assert_eq!(out.session_id, "s1");
}

#[tokio::test]
async fn unreadable_reply_becomes_error_placeholder() {
    let mut fx = MockServerFixture::new().await;
    let _ruh = fx
        .server
        .mock("POST", "/ruh/chat")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;
    let _ugc = fx.mock_chat("ugc", 200, reply("fine", &[], "s-ugc")).await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();

    let out = gw.send_message("hi", None, None, None).await.unwrap();
    assert!(out.response.starts_with("[RUH]\nRUH request error: "));
    assert!(out.response.ends_with("[UGC]\nfine"));
}

#[tokio::test]
async fn sole_selected_side_failing_is_not_an_error() {
    let mut fx = MockServerFixture::new().await;
    let _ugc = fx.mock_chat("ugc", 500, json!({})).await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();

    let out = gw
        .send_message("hi", Some("s9"), None, Some(false))
        .await
        .unwrap();
    assert_eq!(out.response, "UGC request failed: 500");
    assert!(out.conversation_history.is_empty());
    assert_eq!(out.session_id, "s9");
}

#[tokio::test]
async fn request_body_shape() {
    let mut fx = MockServerFixture::new().await;
    let with_filter = fx
        .server
        .mock("POST", "/ruh/chat")
        .match_body(Matcher::Json(json!({
            "message": "hi",
            "session_id": "default",
            "user_id": UNDERGRAD,
            "guidance_filter": "housing"
        })))
        .with_status(200)
        .with_body(reply("ok", &[], "default").to_string())
        .create_async()
        .await;
    let gw = fx.builder(Some(UNDERGRAD)).build().unwrap();
    gw.chat("hi").guidance_filter("housing").send().await.unwrap();
    with_filter.assert_async().await;

    let mut fx = MockServerFixture::new().await;
    let anonymous = fx
        .server
        .mock("POST", "/ugc/chat")
        .match_body(Matcher::Json(json!({
            "message": "hi",
            "session_id": "default",
            "user_id": null
        })))
        .with_status(200)
        .with_body(reply("ok", &[], "default").to_string())
        .create_async()
        .await;
    let gw = fx.builder(None).build().unwrap();
    gw.send_message("hi", None, None, Some(false)).await.unwrap();
    anonymous.assert_async().await;
}

#[tokio::test]
async fn extra_reply_fields_pass_through() {
    let mut fx = MockServerFixture::new().await;
    let _ruh = fx
        .mock_chat(
            "ruh",
            200,
            json!({"response": "r", "conversation_history": [], "session_id": "s", "sources": ["catalog"]}),
        )
        .await;
    let gw = fx.builder(Some(UNDERGRAD)).build().unwrap();

    let out = gw.send_message("hi", None, None, None).await.unwrap();
    assert_eq!(out.extra["sources"], json!(["catalog"]));
}

#[tokio::test]
async fn loose_history_entries_are_returned_as_sent() {
    let history = json!([
        {"role": "user", "content": "q", "timestamp": 1700000000.5},
        {"role": "assistant", "content": null}
    ]);
    let body = json!({"response": "r", "conversation_history": history, "session_id": "s1"});

    let mut fx = MockServerFixture::new().await;
    let _ruh = fx.mock_chat("ruh", 200, body.clone()).await;
    let gw = fx.builder(Some(UNDERGRAD)).build().unwrap();
    let out = gw.send_message("hi", Some("s1"), None, None).await.unwrap();
    assert_eq!(serde_json::to_value(&out).unwrap(), body);

    let mut fx = MockServerFixture::new().await;
    let _ugc = fx
        .mock_chat(
            "ugc",
            200,
            json!({"response": "u", "conversation_history": [{"role": "assistant", "content": "a", "timestamp": 17}]}),
        )
        .await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();
    let out = gw.send_message("hi", None, None, Some(false)).await.unwrap();
    assert_eq!(out.response, "u");
    assert_eq!(out.conversation_history[0].extra["timestamp"], 17);
}

#[tokio::test]
async fn combined_calls_are_in_flight_together() {
    let mut fx = MockServerFixture::new().await;
    let ugc_arrived = Arc::new((Mutex::new(false), Condvar::new()));

    // RUH sends its headers, then holds its body back until UGC has been
    // asked; a sequential client would only ever see "ruh alone".
    let arrived = ugc_arrived.clone();
    let ruh = fx
        .server
        .mock("POST", "/ruh/chat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-access-token", "from-ruh")
        .with_chunked_body(move |w| {
            let (lock, cvar) = &*arrived;
            let (seen, _) = cvar
                .wait_timeout_while(lock.lock().unwrap(), Duration::from_secs(5), |seen| !*seen)
                .unwrap();
            let text = if *seen { "ruh after ugc" } else { "ruh alone" };
            w.write_all(reply(text, &["r1"], "").to_string().as_bytes())
        })
        .create_async()
        .await;

    let arrived = ugc_arrived.clone();
    let ugc = fx
        .server
        .mock("POST", "/ugc/chat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-access-token", "from-ugc")
        .with_body_from_request(move |_| {
            let (lock, cvar) = &*arrived;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
            reply("ugc", &["u1"], "s-ugc").to_string().into_bytes()
        })
        .create_async()
        .await;
    let gw = fx.builder(Some(STAFF)).build().unwrap();

    let out = tokio::time::timeout(
        Duration::from_secs(10),
        gw.send_message("hi", Some("s1"), None, None),
    )
    .await
    .expect("combined call did not finish")
    .unwrap();

    assert_eq!(out.response, "[RUH]\nruh after ugc\n\n[UGC]\nugc");
    assert_eq!(out.session_id, "s-ugc");
    // rotation still follows processing order: RUH, then UGC
    assert_eq!(gw.auth().get().as_deref(), Some("from-ugc"));
    ruh.assert_async().await;
    ugc.assert_async().await;
}
