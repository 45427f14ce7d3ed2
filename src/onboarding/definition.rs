use crate::shared::{GuildId, OptionValue, StepId};
use serde::{Deserialize, Serialize};

/// A guild's onboarding configuration. One active definition per guild,
/// mutated wholesale by administrator edits; the interpreter and router only
/// ever read it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub guild_id: GuildId,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub entry_channel_id: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl WorkflowDefinition {
    pub fn empty(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            enabled: false,
            entry_channel_id: None,
            steps: Vec::new(),
        }
    }

    pub fn step(&self, step_id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|step| step.id() == step_id)
    }
}

/// One onboarding step. Step ids are assigned when the step is authored and
/// never reused; inbound interaction events reference steps only by id,
/// potentially long after the step was removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Step {
    #[serde(rename = "message")]
    Message {
        id: StepId,
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "delay")]
    Delay { id: StepId, seconds: u64 },
    #[serde(rename = "action", rename_all = "camelCase")]
    Action {
        id: StepId,
        #[serde(default)]
        prompt: String,
        #[serde(default)]
        components: Vec<InteractiveComponent>,
    },
}

impl Step {
    pub fn id(&self) -> &StepId {
        match self {
            Step::Message { id, .. } => id,
            Step::Delay { id, .. } => id,
            Step::Action { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum InteractiveComponent {
    #[serde(rename = "button")]
    ButtonGroup {
        #[serde(default)]
        options: Vec<RoleOption>,
    },
    #[serde(rename = "dropdown", rename_all = "camelCase")]
    Dropdown {
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        multi_select: bool,
        #[serde(default)]
        options: Vec<RoleOption>,
    },
}

impl InteractiveComponent {
    pub fn options(&self) -> &[RoleOption] {
        match self {
            InteractiveComponent::ButtonGroup { options } => options,
            InteractiveComponent::Dropdown { options, .. } => options,
        }
    }
}

/// A selectable choice; `value` is the token embedded in the callback
/// identifier, `role_id` the role toggled when the option is selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleOption {
    pub label: String,
    pub value: OptionValue,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub emoji: Option<EmojiRef>,
    pub role_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmojiRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}
