use crate::shared::{GuildId, OptionValue, StepId};

/// Callback identifiers are the only persistent link between a rendered
/// control and the workflow definition: `onb:<guildId>:<stepId>:<selector>`,
/// where the selector is a button's option value or the literal dropdown
/// token. The format must stay stable across process restarts.
pub const CALLBACK_PREFIX: &str = "onb";
pub const DROPDOWN_SELECTOR: &str = "select";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Option(OptionValue),
    Dropdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackId {
    pub guild_id: GuildId,
    pub step_id: StepId,
    pub selector: Selector,
}

impl CallbackId {
    pub fn for_option(guild_id: GuildId, step_id: StepId, value: OptionValue) -> Self {
        Self {
            guild_id,
            step_id,
            selector: Selector::Option(value),
        }
    }

    pub fn for_dropdown(guild_id: GuildId, step_id: StepId) -> Self {
        Self {
            guild_id,
            step_id,
            selector: Selector::Dropdown,
        }
    }

    pub fn encode(&self) -> String {
        let selector = match &self.selector {
            Selector::Option(value) => value.as_str(),
            Selector::Dropdown => DROPDOWN_SELECTOR,
        };
        format!(
            "{CALLBACK_PREFIX}:{}:{}:{selector}",
            self.guild_id, self.step_id
        )
    }

    /// Returns None for identifiers that are not ours (foreign components)
    /// or that fail the identifier rules.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        if parts.next()? != CALLBACK_PREFIX {
            return None;
        }
        let guild = parts.next()?;
        let step = parts.next()?;
        let selector = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let guild_id = GuildId::parse(guild).ok()?;
        let step_id = StepId::parse(step).ok()?;
        let selector = if selector == DROPDOWN_SELECTOR {
            Selector::Dropdown
        } else {
            Selector::Option(OptionValue::parse(selector).ok()?)
        };
        Some(Self {
            guild_id,
            step_id,
            selector,
        })
    }
}
