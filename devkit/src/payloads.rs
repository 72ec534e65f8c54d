/*!
Constructeurs de payloads Slack

Formes identiques à ce que Slack envoie réellement : enveloppes Events API
pour /slack/events, callbacks `block_actions` (champ de formulaire `payload`)
pour /slack/actions.
*/

use serde_json::{json, Value};

pub const RESPONSE_URL: &str = "https://hooks.slack.test/actions/T0001/1234/abcd";

pub fn url_verification(challenge: &str) -> Value {
    json!({
        "token": "Jhj5dZrVaK7ZwHHjRyZWjbDl",
        "challenge": challenge,
        "type": "url_verification"
    })
}

pub fn app_mention(user: &str, channel: &str, text: &str) -> Value {
    json!({
        "token": "XXYYZZ",
        "team_id": "T0001",
        "api_app_id": "A0001",
        "type": "event_callback",
        "event_id": "Ev0001",
        "event_time": 1_700_000_000,
        "event": {
            "type": "app_mention",
            "user": user,
            "text": text,
            "ts": "1700000000.000100",
            "channel": channel,
            "event_ts": "1700000000.000100"
        }
    })
}

/// Option choisie dans un menu static_select.
pub fn select_action(block_id: &str, value: &str) -> Value {
    json!({
        "type": "static_select",
        "block_id": block_id,
        "action_id": block_id,
        "selected_option": {
            "text": {"type": "plain_text", "text": value},
            "value": value
        },
        "action_ts": "1700000001.000200"
    })
}

pub fn button_action(action_id: &str, block_id: &str, value: &str) -> Value {
    json!({
        "type": "button",
        "block_id": block_id,
        "action_id": action_id,
        "text": {"type": "plain_text", "text": action_id},
        "value": value,
        "action_ts": "1700000002.000300"
    })
}

pub fn block_actions(user: &str, channel: &str, actions: Vec<Value>) -> Value {
    json!({
        "type": "block_actions",
        "user": {"id": user, "username": "operator"},
        "api_app_id": "A0001",
        "team": {"id": "T0001"},
        "container": {"type": "message", "is_ephemeral": true},
        "channel": {"id": channel, "name": "infra"},
        "response_url": RESPONSE_URL,
        "actions": actions
    })
}

/// Corps `application/x-www-form-urlencoded` portant `payload`.
pub fn form_encode(payload: &Value) -> String {
    format!("payload={}", urlencoding::encode(&payload.to_string()))
}
