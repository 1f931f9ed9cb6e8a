//! End-to-end tests driving the console line by line against a mock bridge.

mod common;

use common::{mock_bridge_server, TestConsole};
use recipient_actions::{FileSlot, HandoffSlot, SELECTED_CHAT_KEY};
use std::sync::Arc;
use wa_console::session::SessionSettings;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_devices(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "SUCCESS",
            "message": "ok",
            "results": [
                {"id": "office", "jid": "5511999999999@s.whatsapp.net", "state": "logged_in"},
                {"id": "home", "state": "logged_out"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_send_uses_selected_device() {
    let server = mock_bridge_server().await;
    mount_devices(&server).await;

    Mock::given(method("POST"))
        .and(path("/send/message"))
        .and(header("X-Device-Id", "home"))
        .and(body_json(serde_json::json!({
            "phone": "12036342@g.us",
            "message": "dinner at 8",
            "is_forwarded": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "SUCCESS",
            "message": "Message sent to 12036342@g.us",
            "results": {"message_id": "3EB0ABC"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let console = TestConsole::new(&server, SessionSettings::default());

    let devices = console.run("device list").await;
    assert!(devices.contains("office"));

    assert_eq!(console.run("device use id=home").await, "[ok] Using device home");

    let sent = console
        .run("send message kind=group to=12036342 message=\"dinner at 8\"")
        .await;
    assert!(sent.starts_with("[ok] Message sent to 12036342@g.us"));
    assert!(sent.contains("3EB0ABC"));
}

#[tokio::test]
async fn test_failures_never_end_the_session() {
    let server = mock_bridge_server().await;
    Mock::given(method("POST"))
        .and(path("/send/message"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let console = TestConsole::new(&server, SessionSettings::default());

    assert_eq!(console.run("").await, "");
    assert!(console.run("nonsense").await.starts_with("[error] Unknown command"));
    assert!(console.run("send message to=0800 message=hi").await.starts_with("[error]"));
    assert_eq!(
        console.run("send message to=5511999999999 message=hi").await,
        "[error] Unexpected response status: 500"
    );
    assert!(console.run("help").await.contains("send message"));
}

#[tokio::test]
async fn test_selection_survives_in_file_slot() {
    let server = mock_bridge_server().await;
    Mock::given(method("GET"))
        .and(path("/chat/5511999999999@s.whatsapp.net/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "ok",
            "results": {"data": [{"id": "M1", "content": "hi there", "is_from_me": true}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let slot_path = dir.path().join("handoff.json");
    let settings = || SessionSettings {
        handoff: Arc::new(FileSlot::new(&slot_path)),
        ..SessionSettings::default()
    };

    let first = TestConsole::new(&server, settings());
    assert!(first
        .run("chat select jid=5511999999999@s.whatsapp.net")
        .await
        .starts_with("[ok] Selected"));
    drop(first);

    let second = TestConsole::new(&server, settings());
    let messages = second.run("chat messages").await;
    let row = messages.lines().find(|l| l.contains("hi there")).unwrap();
    assert!(row.contains(" me "));

    let leftover = FileSlot::new(&slot_path).take(SELECTED_CHAT_KEY).await.unwrap();
    assert_eq!(leftover, None);
}
