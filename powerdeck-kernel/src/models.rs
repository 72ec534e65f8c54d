use serde::Deserialize;
use std::fmt;

/// Hôte tel que présenté dans un menu de sélection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub inventory_path: String,
    pub mac_address: Option<String>,
}

/// Les deux actions d'alimentation connues du pont.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Shutdown,
    Boot,
}

impl ActionKind {
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Shutdown => "shutdown",
            ActionKind::Boot => "boot",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Action en attente de confirmation. N'existe que dans la valeur des boutons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub target: String,
}

/// Contrôles postés par le pont, chacun avec son propre identifiant.
///
/// Menus routés par block id, boutons par action id ;
/// Confirm et Cancel ne partagent jamais d'identifiant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Select(ActionKind),
    Confirm(ActionKind),
    Cancel(ActionKind),
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::Select(ActionKind::Shutdown),
        Control::Select(ActionKind::Boot),
        Control::Confirm(ActionKind::Shutdown),
        Control::Confirm(ActionKind::Boot),
        Control::Cancel(ActionKind::Shutdown),
        Control::Cancel(ActionKind::Boot),
    ];

    pub fn id(self) -> &'static str {
        match self {
            Control::Select(ActionKind::Shutdown) => "select-shutdown",
            Control::Select(ActionKind::Boot) => "select-boot",
            Control::Confirm(ActionKind::Shutdown) => "confirm-shutdown",
            Control::Confirm(ActionKind::Boot) => "confirm-boot",
            Control::Cancel(ActionKind::Shutdown) => "cancel-shutdown",
            Control::Cancel(ActionKind::Boot) => "cancel-boot",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn kind(self) -> ActionKind {
        match self {
            Control::Select(k) | Control::Confirm(k) | Control::Cancel(k) => k,
        }
    }
}

/// Block id commun à la paire Confirm/Cancel. Jamais utilisé pour router.
pub fn decision_block_id(kind: ActionKind) -> String {
    format!("decide-{}", kind.verb())
}

// ===== Callbacks d'interaction (champ `payload` sur /slack/actions) =====

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub response_url: String,
    pub user: Option<IdRef>,
    pub channel: Option<IdRef>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockAction {
    #[serde(default)]
    pub action_id: String,
    #[serde(default)]
    pub block_id: String,
    pub value: Option<String>,
    pub selected_option: Option<SelectedOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

impl BlockAction {
    /// Contrôle à l'origine de l'action, s'il est à nous.
    pub fn control(&self) -> Option<Control> {
        match Control::from_id(&self.action_id) {
            Some(c) => Some(c),
            None => match Control::from_id(&self.block_id) {
                Some(c @ Control::Select(_)) => Some(c),
                _ => None,
            },
        }
    }

    /// Valeur de l'option pour un menu, valeur du bouton sinon.
    pub fn selected_value(&self) -> Option<&str> {
        self.selected_option
            .as_ref()
            .map(|o| o.value.as_str())
            .or(self.value.as_deref())
    }
}

impl InteractionPayload {
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel.as_ref().map(|c| c.id.as_str())
    }
}
