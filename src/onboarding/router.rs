use super::custom_id::{CallbackId, Selector};
use super::definition::{InteractiveComponent, Step};
use crate::discord::payload::InteractionReply;
use crate::discord::ChatApi;
use crate::shared::OptionValue;
use crate::store::GuildStore;
use serde::Deserialize;
use std::collections::BTreeSet;

const UNAVAILABLE_REPLY: &str = "That onboarding choice is no longer available.";
const FAILURE_REPLY: &str = "Something went wrong while updating your roles. Please try again.";

/// An inbound component activation, normalized by the event layer. The role
/// set reflects what the member held when the platform delivered the event
/// and is treated as ground truth.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub custom_id: String,
    pub user_id: String,
    #[serde(default)]
    pub current_role_ids: Vec<String>,
    #[serde(default)]
    pub selected_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChanges {
    pub granted: Vec<String>,
    pub revoked: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOutcome {
    pub reply: InteractionReply,
    pub changes: RoleChanges,
    /// Set when the interaction could not be processed at all, e.g. the
    /// definition lookup failed. A stale step id is not an error.
    pub error: Option<String>,
}

impl InteractionOutcome {
    fn unavailable() -> Self {
        Self {
            reply: InteractionReply::ephemeral(UNAVAILABLE_REPLY),
            changes: RoleChanges::default(),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            reply: InteractionReply::ephemeral(FAILURE_REPLY),
            changes: RoleChanges::default(),
            error: Some(error),
        }
    }
}

fn role_mention(role_id: &str) -> String {
    format!("<@&{role_id}>")
}

fn roles_reply(now_held: &[String]) -> String {
    match now_held {
        [] => "You have no onboarding roles selected right now.".to_string(),
        [role] => format!("You now have the {} role.", role_mention(role)),
        many => format!(
            "You now have the following roles: {}.",
            many.iter()
                .map(|role| role_mention(role))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Resolves a component activation against the guild's *current* definition
/// and reconciles the member's roles. Always produces a reply; role state on
/// the platform is the single source of truth, so repeated submissions with
/// matching state issue no further calls.
pub fn route_interaction<A: ChatApi>(
    api: &A,
    store: &GuildStore,
    event: &InteractionEvent,
) -> InteractionOutcome {
    let Some(callback) = CallbackId::parse(&event.custom_id) else {
        return InteractionOutcome::unavailable();
    };

    let definition = match store.load_definition(&callback.guild_id) {
        Ok(definition) => definition,
        Err(err) => return InteractionOutcome::failure(err.to_string()),
    };

    // The definition may have changed since the control was rendered; a
    // removed step is an expected outcome, not an error.
    let Some(Step::Action { components, .. }) = definition.step(&callback.step_id) else {
        return InteractionOutcome::unavailable();
    };

    match &callback.selector {
        Selector::Option(value) => route_button(api, &callback, components, value, event),
        Selector::Dropdown => route_dropdown(api, &callback, components, event),
    }
}

fn route_button<A: ChatApi>(
    api: &A,
    callback: &CallbackId,
    components: &[InteractiveComponent],
    value: &OptionValue,
    event: &InteractionEvent,
) -> InteractionOutcome {
    let Some(option) = components
        .iter()
        .flat_map(|component| component.options().iter())
        .find(|option| &option.value == value)
    else {
        return InteractionOutcome::unavailable();
    };

    let mut changes = RoleChanges::default();

    // Buttons only ever add; an already-held role is a no-op.
    if event.current_role_ids.iter().any(|r| r == &option.role_id) {
        return InteractionOutcome {
            reply: InteractionReply::ephemeral(format!(
                "You already have the {} role.",
                role_mention(&option.role_id)
            )),
            changes,
            error: None,
        };
    }

    match api.add_member_role(callback.guild_id.as_str(), &event.user_id, &option.role_id) {
        Ok(()) => {
            changes.granted.push(option.role_id.clone());
            InteractionOutcome {
                reply: InteractionReply::ephemeral(format!(
                    "You now have the {} role.",
                    role_mention(&option.role_id)
                )),
                changes,
                error: None,
            }
        }
        Err(err) => {
            changes.failed.push(option.role_id.clone());
            InteractionOutcome {
                reply: InteractionReply::ephemeral(FAILURE_REPLY),
                changes,
                error: Some(err.to_string()),
            }
        }
    }
}

fn route_dropdown<A: ChatApi>(
    api: &A,
    callback: &CallbackId,
    components: &[InteractiveComponent],
    event: &InteractionEvent,
) -> InteractionOutcome {
    let selected: BTreeSet<&str> = event.selected_values.iter().map(String::as_str).collect();
    let held: BTreeSet<&str> = event.current_role_ids.iter().map(String::as_str).collect();
    let guild_id = callback.guild_id.as_str();

    let mut changes = RoleChanges::default();
    let mut now_held: Vec<String> = Vec::new();

    for component in components {
        let InteractiveComponent::Dropdown { options, .. } = component else {
            continue;
        };
        for option in options {
            let is_selected = selected.contains(option.value.as_str());
            let has_role = held.contains(option.role_id.as_str());

            if is_selected && !has_role {
                match api.add_member_role(guild_id, &event.user_id, &option.role_id) {
                    Ok(()) => {
                        changes.granted.push(option.role_id.clone());
                        now_held.push(option.role_id.clone());
                    }
                    // One failed mutation must not block the rest.
                    Err(_) => changes.failed.push(option.role_id.clone()),
                }
            } else if !is_selected && has_role {
                match api.remove_member_role(guild_id, &event.user_id, &option.role_id) {
                    Ok(()) => changes.revoked.push(option.role_id.clone()),
                    Err(_) => changes.failed.push(option.role_id.clone()),
                }
            } else if is_selected && has_role {
                now_held.push(option.role_id.clone());
            }
        }
    }

    // Two options may map onto the same role.
    let mut deduped = Vec::new();
    for role in now_held {
        if !deduped.contains(&role) {
            deduped.push(role);
        }
    }

    InteractionOutcome {
        reply: InteractionReply::ephemeral(roles_reply(&deduped)),
        changes,
        error: None,
    }
}
