//! HttpNoteApi against a mock platform

use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xhs_harvest::api::{Cursor, HttpNoteApi, NoteApi, NoteKind, TaskContext};
use xhs_harvest::session::{classify_probe, Credential};
use xhs_harvest::task::{SearchFilters, SortOrder};
use xhs_harvest::url::{NoteRef, UserRef};

fn credential() -> Credential {
    Credential::parse("web_session=xyz; a1=abc").unwrap()
}

async fn api(server: &MockServer) -> HttpNoteApi {
    HttpNoteApi::with_client(Client::new(), &server.uri()).unwrap()
}

fn search_entry(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "model_type": "note",
        "xsec_token": format!("tok-{}", id),
        "note_card": {
            "type": "normal",
            "display_title": title,
            "user": {"user_id": "u1", "nickname": "小明"},
            "interact_info": {"liked_count": "12"},
            "cover": {"url_default": format!("https://img.example/{}.jpg", id)}
        }
    })
}

#[tokio::test]
async fn test_search_page_sends_cookie_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/search/notes"))
        .and(header("cookie", "a1=abc; web_session=xyz"))
        .and(body_partial_json(json!({
            "keyword": "露营",
            "page": 2,
            "sort": "time_descending"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "code": 0,
            "msg": "成功",
            "data": {
                "has_more": true,
                "items": [
                    search_entry("n1", "山野露营"),
                    {"id": "q1", "model_type": "rec_query"},
                    search_entry("n2", "湖边露营")
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let context = TaskContext::KeywordSearch {
        query: "露营".to_string(),
        filters: SearchFilters {
            sort: SortOrder::Latest,
            ..Default::default()
        },
    };
    let response = api(&server)
        .await
        .fetch_page(&credential(), &context, &Cursor::new("2"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.message, "成功");
    let page = response.data.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "n2"]);
    assert_eq!(page.next_cursor, Cursor::new("3"));
    assert!(page.has_more);
    assert_eq!(page.items[0].title, "山野露营");
    assert_eq!(page.items[0].author.nickname, "小明");
    assert_eq!(page.items[0].xsec_token.as_deref(), Some("tok-n1"));
}

#[tokio::test]
async fn test_user_timeline_passes_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sns/web/v1/user_posted"))
        .and(query_param("user_id", "u42"))
        .and(query_param("cursor", "c1"))
        .and(query_param("num", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "msg": "成功",
            "data": {
                "cursor": "c2",
                "has_more": false,
                "notes": [
                    {"note_id": "v1", "type": "video", "display_title": "vlog",
                     "user": {"user_id": "u42", "nickname": "阿花"}}
                ]
            }
        })))
        .mount(&server)
        .await;

    let context = TaskContext::UserTimeline(UserRef::new("u42"));
    let response = api(&server)
        .await
        .fetch_page(&credential(), &context, &Cursor::new("c1"))
        .await
        .unwrap();

    let page = response.data.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].kind, NoteKind::Video);
    assert_eq!(page.next_cursor, Cursor::new("c2"));
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_rejection_keeps_platform_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sns/web/v1/user_posted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "code": -100,
            "msg": "登录已过期",
            "data": {}
        })))
        .mount(&server)
        .await;

    let context = TaskContext::UserTimeline(UserRef::new("u42"));
    let response = api(&server)
        .await
        .fetch_page(&credential(), &context, &Cursor::start())
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.message, "登录已过期 (code=-100)");
}

#[tokio::test]
async fn test_server_error_without_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/feed"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let response = api(&server)
        .await
        .fetch_single(&credential(), &NoteRef::new("n1"))
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(response.message, "HTTP 502");
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/search/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let result = api(&server).await.probe(&credential(), "美食", 1).await;
    assert!(result.is_err());
    assert!(!classify_probe(result).is_valid());
}

#[tokio::test]
async fn test_note_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/feed"))
        .and(body_partial_json(json!({
            "source_note_id": "n1",
            "xsec_token": "tok-n1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "msg": "成功",
            "data": {
                "items": [{
                    "id": "n1",
                    "note_card": {
                        "type": "normal",
                        "title": "山野露营",
                        "desc": "周末去山里",
                        "time": 1700000000000i64,
                        "ip_location": "浙江",
                        "tag_list": [{"name": "露营"}],
                        "image_list": [
                            {"url_default": "https://img.example/1.jpg"},
                            {"url_default": "https://img.example/2.jpg"}
                        ]
                    }
                }]
            }
        })))
        .mount(&server)
        .await;

    let note = NoteRef::new("n1").with_token("tok-n1", "pc_search");
    let response = api(&server)
        .await
        .fetch_single(&credential(), &note)
        .await
        .unwrap();

    let item = response.data.unwrap();
    assert_eq!(item.id, "n1");
    assert_eq!(item.description, "周末去山里");
    assert_eq!(item.published_at, Some(1_700_000_000_000));
    assert_eq!(item.ip_location.as_deref(), Some("浙江"));
    assert_eq!(item.tags, vec!["露营"]);
    assert_eq!(item.media.len(), 2);
    assert_eq!(item.xsec_token.as_deref(), Some("tok-n1"));
}

#[tokio::test]
async fn test_probe_with_anomaly_message_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/search/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "msg": "检测到账号异常",
            "data": {"items": []}
        })))
        .mount(&server)
        .await;

    let result = api(&server).await.probe(&credential(), "穿搭", 1).await;
    let outcome = classify_probe(result);
    assert!(!outcome.is_valid());
}
