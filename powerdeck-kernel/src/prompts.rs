//! Messages postés dans Slack par le pont.

use crate::error::Error;
use crate::models::{decision_block_id, ActionKind, Control, PendingAction};
use crate::slack::{Block, ButtonStyle, Element, Message, OptionObject, TextObject};

pub const FALLBACK_TEXT: &str = "This client is not supported.";

pub fn selection_prompt(kind: ActionKind, options: Vec<OptionObject>) -> Message {
    if options.is_empty() {
        // static_select refuse une liste d'options vide
        return Message::plain(format!("No host available to {kind}."));
    }
    let id = Control::Select(kind).id();
    Message {
        text: FALLBACK_TEXT.into(),
        blocks: vec![
            Block::Section { text: TextObject::markdown(format!("Please select *{kind} ESXi host*.")) },
            Block::Actions {
                block_id: id.into(),
                elements: vec![Element::StaticSelect {
                    action_id: id.into(),
                    placeholder: TextObject::plain("Select Host"),
                    options,
                }],
            },
        ],
    }
}

pub fn confirmation_prompt(action: &PendingAction) -> Message {
    let button = |control: Control, label: &str, style| Element::Button {
        action_id: control.id().into(),
        text: TextObject::plain(label),
        value: action.target.clone(),
        style: Some(style),
    };
    Message {
        text: FALLBACK_TEXT.into(),
        blocks: vec![
            Block::Section {
                text: TextObject::markdown(format!("Do you {} *{}*?", action.kind, action.target)),
            },
            Block::Actions {
                block_id: decision_block_id(action.kind),
                elements: vec![
                    button(Control::Confirm(action.kind), "Confirm", ButtonStyle::Primary),
                    button(Control::Cancel(action.kind), "Cancel", ButtonStyle::Danger),
                ],
            },
        ],
    }
}

pub fn failure_notice(action: &PendingAction, err: &Error) -> Message {
    Message::plain(format!("Failed to {} *{}*: {err}", action.kind, action.target))
}
