//! /slack/actions : sélection → confirmation → exécution, et les sorties possibles.

use axum::http::StatusCode;
use powerdeck_devkit::payloads;
use powerdeck_devkit::test_utils::FORM_CONTENT_TYPE;
use powerdeck_devkit::TestHarness;
use powerdeck_kernel::slack::{Element, ResponseUpdate};
use std::time::Duration;

fn buttons(update: &ResponseUpdate) -> Vec<(String, String)> {
    let ResponseUpdate::Replace(msg) = update else { return Vec::new() };
    msg.elements()
        .filter_map(|(_, e)| match e {
            Element::Button { action_id, value, .. } => Some((action_id.clone(), value.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_selection_replaces_menu_with_confirmation() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi01"]);

    let (status, _) = h.select("select-shutdown", "esxi01").await;
    assert_eq!(status, StatusCode::OK);

    let last = h.chat.last_response().expect("confirmation prompt");
    assert_eq!(last.url, payloads::RESPONSE_URL);
    assert_eq!(
        buttons(&last.update),
        vec![("confirm-shutdown".to_string(), "esxi01".to_string()), ("cancel-shutdown".to_string(), "esxi01".to_string())]
    );
    // la sélection n'actionne jamais rien
    assert!(h.inventory.shutdowns().is_empty());
}

#[tokio::test]
async fn test_round_trip_value_reaches_the_same_host() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi01", "/DC/host/esxi02"]);

    h.mention("shutdown").await;
    let chosen = h.chat.last_menu_options()[1].clone();

    h.select("select-shutdown", &chosen).await;
    let (action_id, value) = buttons(&h.chat.last_response().unwrap().update).remove(0);
    assert_eq!(value, chosen);

    let (status, _) = h.press(&action_id, "decide-shutdown", &value).await;
    assert_eq!(status, StatusCode::OK);

    assert!(h.wait_for(1000, |h| !h.inventory.shutdowns().is_empty()).await);
    let shutdowns = h.inventory.shutdowns();
    assert_eq!(shutdowns.len(), 1);
    assert_eq!(shutdowns[0].inventory_path, "/DC/host/esxi02");
    assert_eq!(shutdowns[0].reference, "host-2");
    assert_eq!(h.chat.last_response().unwrap().update, ResponseUpdate::Delete);
}

#[tokio::test]
async fn test_cancel_deletes_prompt_without_actuating() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi01"]);

    h.select("select-shutdown", "esxi01").await;
    let (status, _) = h.press("cancel-shutdown", "decide-shutdown", "esxi01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.chat.last_response().unwrap().update, ResponseUpdate::Delete);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.inventory.shutdowns().is_empty());
    assert!(h.chat.posted().is_empty());
}

#[tokio::test]
async fn test_cancel_boot_sends_nothing() {
    let h = TestHarness::with_boot_targets(&[("esxi03", "AA:BB:CC:DD:EE:FF")]);
    let (status, _) = h.press("cancel-boot", "decide-boot", "esxi03").await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.wake.sent().is_empty());
}

#[tokio::test]
async fn test_ambiguous_target_reports_failure_without_shutdown() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi01", "/DC/host/esxi010"]);

    let (status, _) = h.press("confirm-shutdown", "decide-shutdown", "esxi01").await;
    assert_eq!(status, StatusCode::OK);

    assert!(h.wait_for(1000, |h| !h.chat.posted().is_empty()).await);
    let notice = &h.chat.posted()[0];
    assert_eq!((notice.channel.as_str(), notice.user.as_str()), ("C1", "U1"));
    assert!(notice.message.text.starts_with("Failed to shutdown *esxi01*"));
    assert!(notice.message.text.contains("ambiguous"));
    assert!(h.inventory.shutdowns().is_empty());
}

#[tokio::test]
async fn test_vanished_host_reports_not_found() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi02"]);

    h.press("confirm-shutdown", "decide-shutdown", "esxi01").await;
    assert!(h.wait_for(1000, |h| !h.chat.posted().is_empty()).await);
    assert!(h.chat.posted()[0].message.text.contains("not found"));
    assert!(h.inventory.shutdowns().is_empty());
}

#[tokio::test]
async fn test_remote_shutdown_failure_reported() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi01"]);
    h.inventory.fail_shutdown(Some("NoPermission"));

    h.press("confirm-shutdown", "decide-shutdown", "esxi01").await;
    assert!(h.wait_for(1000, |h| !h.chat.posted().is_empty()).await);
    assert!(h.chat.posted()[0].message.text.contains("NoPermission"));
}

#[tokio::test]
async fn test_shutdown_timeout_reported() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi01"]);
    h.inventory.delay_shutdown(Duration::from_secs(5));

    let (status, _) = h.press("confirm-shutdown", "decide-shutdown", "esxi01").await;
    // la réponse HTTP n'attend pas l'actionneur
    assert_eq!(status, StatusCode::OK);

    assert!(h.wait_for(4000, |h| !h.chat.posted().is_empty()).await);
    assert!(h.chat.posted()[0].message.text.contains("timed out"));
    assert!(h.inventory.shutdowns().is_empty());
}

#[tokio::test]
async fn test_empty_actions_is_400() {
    let h = TestHarness::new();
    let (status, _) = h.post_action(&payloads::block_actions("U1", "C1", vec![])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_control_acknowledged_and_ignored() {
    let h = TestHarness::new();
    h.inventory.set_paths(&["/DC/host/esxi01"]);

    let (status, _) = h.press("open-dashboard", "misc", "esxi01").await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.chat.responses().is_empty());
    assert!(h.inventory.shutdowns().is_empty());
}

#[tokio::test]
async fn test_non_block_actions_payload_ignored() {
    let h = TestHarness::new();
    let mut payload = payloads::block_actions("U1", "C1", vec![]);
    payload["type"] = "view_submission".into();
    let (status, _) = h.post_action(&payload).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_form_is_500() {
    let h = TestHarness::new();
    let req = h.signed_request("/slack/actions", FORM_CONTENT_TYPE, b"payload=%7Bnot-json".to_vec());
    assert_eq!(h.send(req).await.0, StatusCode::INTERNAL_SERVER_ERROR);

    let req = h.signed_request("/slack/actions", FORM_CONTENT_TYPE, b"nothing=here".to_vec());
    assert_eq!(h.send(req).await.0, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_response_url_failure_is_500() {
    let h = TestHarness::new();
    h.chat.fail_responses(true);
    let (status, _) = h.select("select-shutdown", "esxi01").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
