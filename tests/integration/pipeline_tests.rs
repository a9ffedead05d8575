//! End-to-end runs through run_task and run_validation

use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xhs_harvest::api::HttpNoteApi;
use xhs_harvest::config::FetcherSettings;
use xhs_harvest::output::{channel, forward_records, Record, TabularSink};
use xhs_harvest::task::TaskRequest;
use xhs_harvest::{run_task, run_validation};

fn drain(rx: &mut mpsc::UnboundedReceiver<Record>) -> Vec<Record> {
    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records
}

fn user_page(ids: &[&str], cursor: &str, has_more: bool) -> Value {
    let notes: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "note_id": id,
                "type": "normal",
                "display_title": format!("title {}", id),
                "user": {"user_id": "u42", "nickname": "阿花"},
                "interact_info": {"liked_count": "3"}
            })
        })
        .collect();
    json!({
        "success": true,
        "msg": "成功",
        "data": {"cursor": cursor, "has_more": has_more, "notes": notes}
    })
}

async fn mount_user_page(server: &MockServer, cursor: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/sns/web/v1/user_posted"))
        .and(query_param("cursor", cursor))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn settings() -> FetcherSettings {
    FetcherSettings {
        fetch_details: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_user_timeline_into_tabular_store() {
    let server = MockServer::start().await;
    mount_user_page(&server, "", user_page(&["n1", "n2"], "c1", true)).await;
    mount_user_page(&server, "c1", user_page(&["n2", "n3"], "c2", false)).await;

    let dir = TempDir::new().unwrap();
    let request = TaskRequest::from_json(
        &json!({
            "cookie": "a1=abc; web_session=xyz",
            "taskType": "user",
            "params": {"userUrl": "https://www.xiaohongshu.com/user/profile/u42?xsec_token=t&xsec_source=pc_note"},
            "saveOptions": {"mode": "excel", "excelName": "阿花"},
            "paths": {"media": dir.path().join("media"), "excel": dir.path().join("excel")}
        })
        .to_string(),
    )
    .unwrap();

    let (emitter, mut rx) = channel();
    let api = HttpNoteApi::with_client(Client::new(), &server.uri()).unwrap();
    let result = run_task(
        &request,
        Arc::new(api),
        Client::new(),
        &settings(),
        &emitter,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(result.count, 3);
    assert!(result.api_success);

    let records = drain(&mut rx);
    assert!(matches!(
        records.last(),
        Some(Record::Done { success: true, count: 3, .. })
    ));
    assert_eq!(records.iter().filter(|r| r.is_terminal()).count(), 1);

    let store = TabularSink::open(&dir.path().join("excel").join("阿花.sqlite")).unwrap();
    assert_eq!(store.note_ids().unwrap(), vec!["n1", "n2", "n3"]);
}

#[tokio::test]
async fn test_unavailable_user_fails_with_platform_message() {
    let server = MockServer::start().await;
    mount_user_page(
        &server,
        "",
        json!({"success": false, "code": -510001, "msg": "用户不存在"}),
    )
    .await;

    let request = TaskRequest::from_json(
        &json!({
            "cookie": "a1=abc",
            "taskType": "user",
            "params": {"userUrl": "u42"},
            "saveOptions": {"mode": "none"}
        })
        .to_string(),
    )
    .unwrap();

    let (emitter, mut rx) = channel();
    let api = HttpNoteApi::with_client(Client::new(), &server.uri()).unwrap();
    run_task(
        &request,
        Arc::new(api),
        Client::new(),
        &settings(),
        &emitter,
        CancellationToken::new(),
    )
    .await;

    match drain(&mut rx).last() {
        Some(Record::Done {
            success,
            api_success,
            api_message,
            count,
            ..
        }) => {
            assert!(!success);
            assert!(!api_success);
            assert_eq!(*count, 0);
            assert_eq!(api_message, "用户不存在 (code=-510001)");
        }
        other => panic!("unexpected terminal record {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_writes_json_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/search/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "msg": "成功",
            "data": {"items": [], "has_more": false}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (emitter, rx) = channel();
    let api = HttpNoteApi::with_client(Client::new(), &server.uri()).unwrap();
    let outcome = run_validation("a1=abc; web_session=xyz", Arc::new(api), &emitter).await;
    assert!(outcome.unwrap().is_valid());
    drop(emitter);

    let mut out = Vec::new();
    forward_records(rx, &mut out).await.unwrap();
    let lines: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let result = lines
        .iter()
        .find(|line| line["type"] == "validation_result")
        .unwrap();
    assert_eq!(result["valid"], true);
    assert_eq!(result["message"], "Cookie有效");
    assert!(result["userInfo"].is_null());
    assert_eq!(lines.last().unwrap()["type"], "done");
}
