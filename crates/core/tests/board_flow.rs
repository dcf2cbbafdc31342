mod common;

use common::*;
use serde_json::{json, Value};
use wetransfer_core::{Error, ItemKind, Link};
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_get_board(server: &MockServer, board: Value) {
    Mock::given(method("GET"))
        .and(path("/v2/boards/b-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_board() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/boards"))
        .and(body_json(json!({"name": "Holiday pictures"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "b-1",
            "name": "Holiday pictures",
            "state": "downloadable",
            "url": "https://we.tl/b-1",
            "items": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let board = client.create_board("Holiday pictures").await.unwrap();

    assert_eq!(board.id, "b-1");
    assert_eq!(board.url.as_deref(), Some("https://we.tl/b-1"));
    assert!(board.items.is_empty());
}

#[tokio::test]
async fn test_create_board_rejected() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/boards"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "name is required"})))
        .mount(&server)
        .await;

    match client.create_board("").await.unwrap_err() {
        Error::ResourceCreation(message) => assert_eq!(message, "400: name is required"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_add_files_to_board() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;
    mount_storage(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/boards/b-1/files"))
        .and(body_json(json!([
            {"name": "a.jpg", "size": 100},
            {"name": "b.jpg", "size": 20}
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "f-a", "name": "a.jpg", "multipart": {"id": "mp-a", "part_numbers": 2, "chunk_size": 64}},
            {"id": "f-b", "name": "b.jpg", "multipart": {"id": "mp-b", "part_numbers": 1, "chunk_size": 64}}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/boards/b-1/files/[^/]+/upload-url/\d+/mp-[ab]$"))
        .respond_with(PartUrlResponder {
            storage_base: server.uri(),
        })
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v2/boards/b-1/files/[^/]+/upload-complete$"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"success": true})))
        .expect(2)
        .mount(&server)
        .await;
    mount_get_board(
        &server,
        json!({
            "id": "b-1",
            "name": "pics",
            "items": [
                {"id": "f-a", "type": "file", "name": "a.jpg", "size": 100},
                {"id": "f-b", "type": "file", "name": "b.jpg", "size": 20}
            ]
        }),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write_file(dir.path(), "a.jpg", 100),
        write_file(dir.path(), "b.jpg", 20),
    ];

    let board = client.add_files_to_board("b-1", &paths).await.unwrap();
    assert_eq!(board.files().count(), 2);

    assert_eq!(
        request_lines(&server).await,
        vec![
            "POST /v2/authorize",
            "POST /v2/boards/b-1/files",
            "GET /v2/boards/b-1/files/f-a/upload-url/1/mp-a",
            "PUT /storage/f-a/1",
            "GET /v2/boards/b-1/files/f-a/upload-url/2/mp-a",
            "PUT /storage/f-a/2",
            "PUT /v2/boards/b-1/files/f-a/upload-complete",
            "GET /v2/boards/b-1/files/f-b/upload-url/1/mp-b",
            "PUT /storage/f-b/1",
            "PUT /v2/boards/b-1/files/f-b/upload-complete",
            "GET /v2/boards/b-1",
        ]
    );

    let received = requests(&server).await;
    let sizes: Vec<usize> = storage_puts(&received).iter().map(|r| r.body.len()).collect();
    assert_eq!(sizes, vec![64, 36, 20]);
}

#[tokio::test]
async fn test_board_file_without_multipart_id() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/boards/b-1/files"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "f-a", "multipart": {"part_numbers": 1, "chunk_size": 64}}
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "a.jpg", 10);

    let err = client.add_files_to_board("b-1", &[&file]).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn test_add_links_to_board() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/boards/b-1/links"))
        .and(body_json(json!([
            {"url": "https://wetransfer.com/", "title": "WeTransfer"},
            {"url": "https://developers.wetransfer.com/", "title": "Docs"}
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "l-1", "type": "link"},
            {"id": "l-2", "type": "link"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_get_board(
        &server,
        json!({
            "id": "b-1",
            "name": "links",
            "items": [
                {"id": "l-1", "type": "link", "url": "https://wetransfer.com/", "meta": {"title": "WeTransfer"}},
                {"id": "l-2", "type": "link", "url": "https://developers.wetransfer.com/", "meta": {"title": "Docs"}}
            ]
        }),
    )
    .await;

    let links = vec![
        Link::new("https://wetransfer.com/", "WeTransfer"),
        Link::new("https://developers.wetransfer.com/", "Docs"),
    ];
    let board = client.add_links_to_board("b-1", &links).await.unwrap();

    let titles: Vec<&str> = board.links().map(|l| l.label()).collect();
    assert_eq!(titles, vec!["WeTransfer", "Docs"]);
}

#[tokio::test]
async fn test_add_no_links_is_invalid_input() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    let err = client.add_links_to_board("b-1", &[]).await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(request_lines(&server).await, vec!["POST /v2/authorize"]);
}

#[tokio::test]
async fn test_get_board_items() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    mount_get_board(
        &server,
        json!({
            "id": "b-1",
            "name": "mixed",
            "description": "files and links",
            "items": [
                {"id": "i1", "type": "file", "name": "notes.txt", "size": 12},
                {"id": "i2", "type": "link", "url": "https://example.com", "meta": {"title": "Example"}},
                {"id": "i3", "type": "sticker"}
            ]
        }),
    )
    .await;

    let board = client.get_board("b-1").await.unwrap();

    let kinds: Vec<ItemKind> = board.items.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![ItemKind::File, ItemKind::Link, ItemKind::Other]);
    assert_eq!(board.description.as_deref(), Some("files and links"));
}

#[tokio::test]
async fn test_get_missing_board() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2/boards/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Board not found"})))
        .mount(&server)
        .await;

    match client.get_board("nope").await.unwrap_err() {
        Error::Request(message) => assert_eq!(message, "404: Board not found"),
        other => panic!("unexpected error: {other}"),
    }
}
