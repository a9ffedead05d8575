//! MediaSink downloads against a mock CDN

use reqwest::Client;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xhs_harvest::api::{Item, MediaKind, MediaRef, NoteKind};
use xhs_harvest::output::{ItemSink, MediaFilter, MediaSink, SaveMode, SinkConfig};

fn config(root: &Path, filter: MediaFilter) -> SinkConfig {
    SinkConfig {
        mode: SaveMode::MediaOnly,
        media_filter: filter,
        media_dir: root.to_path_buf(),
        tabular_dir: root.join("excel"),
        table_name: "笔记数据".to_string(),
    }
}

fn note(server: &MockServer, id: &str, kind: NoteKind, files: &[(MediaKind, &str)]) -> Item {
    Item {
        id: id.to_string(),
        title: "春日 出游".to_string(),
        kind,
        media: files
            .iter()
            .map(|(kind, file)| MediaRef {
                kind: *kind,
                url: format!("{}/{}", server.uri(), file),
            })
            .collect(),
        raw: serde_json::json!({"id": id}),
        ..Default::default()
    }
}

async fn serve(server: &MockServer, file: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", file)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_downloads_images_and_video() {
    let server = MockServer::start().await;
    serve(&server, "a.jpg", b"first").await;
    serve(&server, "b.jpg", b"second").await;
    serve(&server, "v.mp4", b"video").await;

    let dir = TempDir::new().unwrap();
    let sink = MediaSink::new(Client::new(), dir.path());
    let item = note(
        &server,
        "n1",
        NoteKind::Video,
        &[
            (MediaKind::Image, "a.jpg"),
            (MediaKind::Image, "b.jpg"),
            (MediaKind::Video, "v.mp4"),
        ],
    );

    sink.write(&item, &config(dir.path(), MediaFilter::All))
        .await
        .unwrap();

    let note_dir = dir.path().join("春日 出游_n1");
    assert_eq!(std::fs::read(note_dir.join("image_1.jpg")).unwrap(), b"first");
    assert_eq!(std::fs::read(note_dir.join("image_2.jpg")).unwrap(), b"second");
    assert_eq!(std::fs::read(note_dir.join("video.mp4")).unwrap(), b"video");

    let info: serde_json::Value =
        serde_json::from_slice(&std::fs::read(note_dir.join("info.json")).unwrap()).unwrap();
    assert_eq!(info["id"], "n1");
}

#[tokio::test]
async fn test_filter_skips_other_kinds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let sink = MediaSink::new(Client::new(), dir.path());
    let item = note(&server, "n2", NoteKind::Normal, &[(MediaKind::Image, "a.jpg")]);

    sink.write(&item, &config(dir.path(), MediaFilter::VideoOnly))
        .await
        .unwrap();

    assert!(!dir.path().join("春日 出游_n2").exists());
}

#[tokio::test]
async fn test_failed_file_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    serve(&server, "ok.jpg", b"ok").await;

    let dir = TempDir::new().unwrap();
    let sink = MediaSink::new(Client::new(), dir.path());
    let item = note(
        &server,
        "n3",
        NoteKind::Normal,
        &[(MediaKind::Image, "missing.jpg"), (MediaKind::Image, "ok.jpg")],
    );

    let result = sink
        .write(&item, &config(dir.path(), MediaFilter::ImageOnly))
        .await;
    assert!(result.is_err());

    let note_dir = dir.path().join("春日 出游_n3");
    assert!(!note_dir.join("image_1.jpg").exists());
    assert_eq!(std::fs::read(note_dir.join("image_2.jpg")).unwrap(), b"ok");
}
