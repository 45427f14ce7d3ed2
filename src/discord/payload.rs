use serde::{Deserialize, Serialize};

pub const COMPONENT_ACTION_ROW: u8 = 1;
pub const COMPONENT_BUTTON: u8 = 2;
pub const COMPONENT_STRING_SELECT: u8 = 3;
pub const BUTTON_STYLE_PRIMARY: u8 = 1;

pub const PRIVATE_THREAD_TYPE: u8 = 12;
pub const THREAD_AUTO_ARCHIVE_MINUTES: u32 = 1440;

pub const INTERACTION_CALLBACK_CHANNEL_MESSAGE: u8 = 4;
pub const EPHEMERAL_FLAG: u64 = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartialEmoji {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<PartialEmoji>,
    pub custom_id: String,
}

impl Button {
    pub fn primary(label: String, custom_id: String, emoji: Option<PartialEmoji>) -> Self {
        Self {
            kind: COMPONENT_BUTTON,
            style: BUTTON_STYLE_PRIMARY,
            label,
            emoji,
            custom_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<PartialEmoji>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StringSelect {
    #[serde(rename = "type")]
    pub kind: u8,
    pub custom_id: String,
    pub placeholder: String,
    pub min_values: u8,
    pub max_values: u8,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RowComponent {
    Button(Button),
    StringSelect(StringSelect),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<RowComponent>,
}

impl ActionRow {
    pub fn new(components: Vec<RowComponent>) -> Self {
        Self {
            kind: COMPONENT_ACTION_ROW,
            components,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OutboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            components: Vec::new(),
        }
    }

    pub fn with_components(content: Option<String>, components: Vec<ActionRow>) -> Self {
        Self {
            content,
            components,
        }
    }
}

/// Reply sent back over the interaction transport by the caller of the
/// router; the router only builds the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionReply {
    pub content: String,
    pub ephemeral: bool,
}

impl InteractionReply {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}
