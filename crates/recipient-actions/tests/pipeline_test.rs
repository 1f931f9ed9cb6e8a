//! Forms submitted through a real bridge client against a mock bridge.

use bridge_client::BridgeClient;
use recipient_actions::forms::{BusinessProfileForm, GroupNameForm, MessageForm, VisualMediaForm};
use recipient_actions::{
    ActionForm, CoordinatorConfig, DownloadStatus, ErrorRemapTable, Feedback, LocalFile,
    MediaDownloadCoordinator, RecipientKind, SubmissionController, SubmitOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

fn client(server: &MockServer) -> Arc<BridgeClient> {
    Arc::new(BridgeClient::new(server.uri()).unwrap().with_device(Some("office")))
}

#[tokio::test]
async fn test_message_reaches_bridge_with_device_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send/message"))
        .and(header("X-Device-Id", "office"))
        .and(body_json(serde_json::json!({
            "phone": "12036342@g.us",
            "message": "See you at 8",
            "is_forwarded": false,
            "duration": 604800
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "SUCCESS",
            "message": "Message sent to 12036342@g.us",
            "results": {"message_id": "3EB0ABC", "status": "sent"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = SubmissionController::new(client(&server));
    let mut form = MessageForm::default();
    form.set_recipient_kind(RecipientKind::Group).unwrap();
    form.recipient_mut().unwrap().set_local_part("12036342");
    form.message = "See you at 8".into();
    form.options.duration_secs = 604_800;

    let outcome = controller.submit(&mut form).await;

    match &outcome {
        SubmitOutcome::Succeeded { message, results } => {
            assert_eq!(message, "Message sent to 12036342@g.us");
            assert_eq!(results["message_id"], "3EB0ABC");
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert!(form.message.is_empty());
}

#[tokio::test]
async fn test_structured_error_keeps_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/group/name"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "FORBIDDEN",
            "message": "you are not an admin of this group"
        })))
        .mount(&server)
        .await;

    let controller = SubmissionController::new(client(&server));
    let mut form = GroupNameForm::default();
    form.recipient_mut().unwrap().set_local_part("12036342@g.us");
    form.name = "Renamed".into();

    let outcome = controller.submit(&mut form).await;

    assert_eq!(
        outcome.feedback(),
        Some(Feedback::Error("you are not an admin of this group".into()))
    );
    assert_eq!(form.name, "Renamed");
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_image_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Image sent"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = SubmissionController::new(client(&server));
    let mut form = VisualMediaForm::image();
    form.recipient_mut().unwrap().set_local_part("5511999999999");
    form.caption = "cat".into();
    form.attachment
        .attach_file(LocalFile::from_bytes("cat.png", PNG.to_vec()));

    let outcome = controller.submit(&mut form).await;
    assert!(outcome.is_success());
    assert!(form.attachment.is_empty());

    let received = &server.received_requests().await.unwrap()[0];
    let body = String::from_utf8_lossy(&received.body);
    assert!(body.contains("name=\"image\""));
    assert!(body.contains("filename=\"cat.png\""));
    assert!(body.contains("name=\"caption\""));
}

#[tokio::test]
async fn test_business_profile_remap_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/business-profile"))
        .and(query_param("phone", "5511999999999@s.whatsapp.net"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "code": "INTERNAL_SERVER_ERROR",
            "message": "the number may not be a business account"
        })))
        .mount(&server)
        .await;

    let controller =
        SubmissionController::new(client(&server)).with_remap(ErrorRemapTable::business_profile());
    let mut form = BusinessProfileForm::default();
    form.recipient_mut().unwrap().set_local_part("5511999999999");

    let outcome = controller.submit(&mut form).await;

    match outcome {
        SubmitOutcome::Failed(message) => {
            assert!(message.contains("not a WhatsApp Business account"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_media_downloads_through_bridge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/message/M1/download"))
        .and(query_param("phone", "12036342@g.us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "ok",
            "results": {
                "file_path": "statics/media/m1.jpg",
                "media_type": "image",
                "file_size": 512,
                "filename": "m1.jpg"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/message/M2/download"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "media not found"
        })))
        .mount(&server)
        .await;

    let coordinator = MediaDownloadCoordinator::new(
        client(&server),
        CoordinatorConfig {
            max_concurrent: 3,
            dispatch_delay: Duration::from_millis(1),
        },
    );
    let messages: Vec<bridge_client::ChatMessage> = serde_json::from_value(serde_json::json!([
        {"id": "M1", "media_type": "image", "url": "https://mmg.whatsapp.net/1"},
        {"id": "M2", "media_type": "video", "url": "https://mmg.whatsapp.net/2"},
        {"id": "M3", "content": "no media"}
    ]))
    .unwrap();

    let queued = coordinator
        .download_all_pending(&messages, "12036342@g.us")
        .await;
    coordinator.wait_idle().await;

    assert_eq!(queued, 2);
    let m1 = coordinator.record("M1").await.unwrap();
    assert_eq!(m1.status, DownloadStatus::Completed);
    assert_eq!(m1.file_path.as_deref(), Some("statics/media/m1.jpg"));
    assert_eq!(
        coordinator.record("M2").await.unwrap().status,
        DownloadStatus::Failed("media not found".into())
    );
}
