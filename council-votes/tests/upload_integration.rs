//! AirtableClient against a one-shot local HTTP responder, plus the dry-run store.

use chrono::NaiveDate;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use council_votes::upload::{AirtableClient, DryRunStore};
use council_votes_core::config::{StoreConfig, TableNames};
use council_votes_core::contract::{MeetingFields, MotionFields, RecordStore, VoteFields};
use council_votes_core::error::StoreError;
use council_votes_core::model::{RecordId, VoteValue};

async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let head = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n",
        body.len()
    );
    serve_raw_once(format!("{head}Connection: close\r\n\r\n{body}")).await
}

/// Writes `response` verbatim, then closes the connection.
async fn serve_raw_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });
    (format!("http://{addr}/v0"), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_body(request: &str) -> serde_json::Value {
    let (_, body) = request.split_once("\r\n\r\n").expect("request has a body");
    serde_json::from_str(body).expect("body is JSON")
}

fn client_for(api_url: String, tables: TableNames) -> AirtableClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    AirtableClient::with_client(
        &StoreConfig {
            token: "pat-test".into(),
            base_id: "appBase".into(),
            api_url,
            tables,
        },
        http,
    )
    .unwrap()
}

#[tokio::test]
async fn create_meeting_posts_fields_with_bearer_token() {
    let (api, server) = serve_once("200 OK", r#"{"id":"recMeeting1","fields":{}}"#).await;
    let client = client_for(api, TableNames::default());

    let id = client
        .create_meeting(&MeetingFields {
            meeting_id: "4211".into(),
            name: "City Council".into(),
            date: NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
            url: "Meeting.aspx?Id=4211".into(),
        })
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert_eq!(id, RecordId::from("recMeeting1"));
    assert!(request.starts_with("POST /v0/appBase/Meetings HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer pat-test"));
    let body = request_body(&request);
    assert_eq!(body["fields"]["Meeting ID"], "4211");
    assert_eq!(body["fields"]["Meeting Name"], "City Council");
    assert_eq!(body["fields"]["Date"], "2025-10-08");
    assert_eq!(body["fields"]["URL"], "Meeting.aspx?Id=4211");
}

#[tokio::test]
async fn create_motion_links_meeting_and_sends_null_title() {
    let (api, server) = serve_once("200 OK", r#"{"id":"recMotion1"}"#).await;
    let client = client_for(api, TableNames::default());

    client
        .create_motion(&MotionFields {
            meeting: vec![RecordId::from("recMeeting1")],
            title: None,
            result: Some("Carried".into()),
            for_count: 3,
            against_count: 0,
        })
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /v0/appBase/Motions HTTP/1.1"));
    let fields = &request_body(&request)["fields"];
    assert_eq!(fields["Meeting"], serde_json::json!(["recMeeting1"]));
    assert!(fields["Motion Title"].is_null());
    assert_eq!(fields["Result"], "Carried");
    assert_eq!(fields["For Count"], 3);
    assert_eq!(fields["Against Count"], 0);
}

#[tokio::test]
async fn table_names_with_spaces_are_percent_encoded() {
    let (api, server) = serve_once("200 OK", r#"{"id":"recVote1"}"#).await;
    let client = client_for(
        api,
        TableNames {
            votes: "Council Votes".into(),
            ..TableNames::default()
        },
    );

    client
        .create_vote(&VoteFields {
            motion: vec![RecordId::from("recMotion1")],
            councillor: "J. Leiper".into(),
            vote: VoteValue::Against,
        })
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /v0/appBase/Council%20Votes HTTP/1.1"));
    let fields = &request_body(&request)["fields"];
    assert_eq!(fields["Vote"], "Against");
    assert_eq!(fields["Councillor"], "J. Leiper");
}

#[tokio::test]
async fn rejected_create_surfaces_status_and_body() {
    let (api, server) = serve_once(
        "422 Unprocessable Entity",
        r#"{"error":{"type":"INVALID_VALUE_FOR_COLUMN"}}"#,
    )
    .await;
    let client = client_for(api, TableNames::default());

    let err = client
        .create_vote(&VoteFields {
            motion: vec![RecordId::from("recMotion1")],
            councillor: "M. Fleury".into(),
            vote: VoteValue::For,
        })
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        StoreError::Rejected {
            table,
            status,
            body,
        } => {
            assert_eq!(table, "Votes");
            assert_eq!(status, 422);
            assert!(body.contains("INVALID_VALUE_FOR_COLUMN"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn truncated_error_body_is_reported_not_dropped() {
    // promises 200 bytes, sends a few, then hangs up
    let (api, server) = serve_raw_once(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Type: application/json\r\nContent-Length: 200\r\nConnection: close\r\n\r\n{\"err".to_string(),
    )
    .await;
    let client = client_for(api, TableNames::default());

    let err = client
        .create_vote(&VoteFields {
            motion: vec![RecordId::from("recMotion1")],
            councillor: "M. Fleury".into(),
            vote: VoteValue::For,
        })
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        StoreError::Rejected { status, body, .. } => {
            assert_eq!(status, 503);
            assert!(body.starts_with("<unreadable body:"), "body was {body:?}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn non_hierarchical_api_url_is_a_config_error() {
    let result = AirtableClient::new(&StoreConfig {
        token: "pat-test".into(),
        base_id: "appBase".into(),
        api_url: "mailto:ops@example.org".into(),
        tables: TableNames::default(),
    });
    assert!(result.is_err());
}

#[tokio::test]
async fn dry_run_store_issues_sequential_ids_without_network() {
    let store = DryRunStore::default();
    let meeting = store
        .create_meeting(&MeetingFields {
            meeting_id: "1".into(),
            name: "City Council".into(),
            date: NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
            url: "u".into(),
        })
        .await
        .unwrap();
    let motion = store
        .create_motion(&MotionFields {
            meeting: vec![meeting.clone()],
            title: Some("Budget".into()),
            result: None,
            for_count: 0,
            against_count: 0,
        })
        .await
        .unwrap();

    assert_eq!(meeting, RecordId::from("dry-run-1"));
    assert_eq!(motion, RecordId::from("dry-run-2"));
    assert_eq!(store.issued(), 2);
}
