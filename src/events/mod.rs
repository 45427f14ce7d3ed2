use crate::discord::payload::OutboundMessage;
use crate::discord::ChatApi;
use crate::onboarding::{route_interaction, substitute_tokens, InteractionEvent, CALLBACK_PREFIX};
use crate::runtime::{append_runtime_log, start_onboarding, RunRequest, StatePaths};
use crate::shared::GuildId;
use crate::store::GuildStore;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

const FALLBACK_GUILD_NAME: &str = "the server";
const INTERACTION_KIND_MESSAGE_COMPONENT: u8 = 3;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("failed to decode `{event}` dispatch payload: {source}")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{event}` dispatch carries invalid {field}: {reason}")]
    Invalid {
        event: String,
        field: String,
        reason: String,
    },
}

/// The gateway events the bot acts on, normalized from a dispatch `(t, d)`
/// pair. The connection itself (heartbeat, resume) lives with the transport
/// collaborator; events arrive here already delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    MemberJoined {
        guild_id: GuildId,
        user_id: String,
        username: String,
    },
    ComponentInteraction {
        interaction_id: String,
        interaction_token: String,
        event: InteractionEvent,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct UserPayload {
    id: String,
    username: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MemberAddPayload {
    guild_id: String,
    user: UserPayload,
}

#[derive(Debug, Clone, Deserialize)]
struct MemberPayload {
    user: UserPayload,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ComponentDataPayload {
    custom_id: String,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct InteractionPayload {
    id: String,
    token: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    member: Option<MemberPayload>,
}

/// Decodes one dispatch into a typed event. Returns Ok(None) for dispatch
/// types this bot ignores, including components that are not ours.
pub fn decode_dispatch(
    event_type: &str,
    payload: &Value,
) -> Result<Option<GatewayEvent>, EventError> {
    match event_type {
        "GUILD_MEMBER_ADD" => {
            let data: MemberAddPayload =
                serde_json::from_value(payload.clone()).map_err(|source| EventError::Decode {
                    event: event_type.to_string(),
                    source,
                })?;
            let guild_id = GuildId::parse(&data.guild_id).map_err(|reason| EventError::Invalid {
                event: event_type.to_string(),
                field: "guild_id".to_string(),
                reason,
            })?;
            Ok(Some(GatewayEvent::MemberJoined {
                guild_id,
                user_id: data.user.id,
                username: data.user.username,
            }))
        }
        "INTERACTION_CREATE" => {
            let data: InteractionPayload =
                serde_json::from_value(payload.clone()).map_err(|source| EventError::Decode {
                    event: event_type.to_string(),
                    source,
                })?;
            if data.kind != INTERACTION_KIND_MESSAGE_COMPONENT {
                return Ok(None);
            }
            let component: ComponentDataPayload =
                serde_json::from_value(data.data).map_err(|source| EventError::Decode {
                    event: event_type.to_string(),
                    source,
                })?;
            if !component
                .custom_id
                .starts_with(&format!("{CALLBACK_PREFIX}:"))
            {
                return Ok(None);
            }
            let member = data.member.ok_or_else(|| EventError::Invalid {
                event: event_type.to_string(),
                field: "member".to_string(),
                reason: "component interaction without guild member".to_string(),
            })?;
            Ok(Some(GatewayEvent::ComponentInteraction {
                interaction_id: data.id,
                interaction_token: data.token,
                event: InteractionEvent {
                    custom_id: component.custom_id,
                    user_id: member.user.id,
                    current_role_ids: member.roles,
                    selected_values: component.values,
                },
            }))
        }
        _ => Ok(None),
    }
}

/// Shared handles the dispatcher needs to act on events.
#[derive(Debug, Clone)]
pub struct EventContext<A: ChatApi + Send + Sync + 'static> {
    pub api: Arc<A>,
    pub store: Arc<GuildStore>,
    pub paths: StatePaths,
    pub stop: Arc<AtomicBool>,
}

impl<A: ChatApi + Send + Sync + 'static> EventContext<A> {
    /// Fans one event out to the welcome poster, the onboarding runner and
    /// the interaction router. Member joins return the detached run's join
    /// handle; the embedding runtime may track or drop it.
    pub fn dispatch(&self, event: GatewayEvent) -> Option<thread::JoinHandle<()>> {
        match event {
            GatewayEvent::MemberJoined {
                guild_id,
                user_id,
                username,
            } => {
                let guild_display_name = self
                    .api
                    .guild_display_name(guild_id.as_str())
                    .unwrap_or_else(|_| FALLBACK_GUILD_NAME.to_string());
                post_welcome(
                    self.api.as_ref(),
                    &self.store,
                    &self.paths,
                    &guild_id,
                    &user_id,
                    &username,
                    &guild_display_name,
                );
                Some(start_onboarding(
                    self.api.clone(),
                    self.store.clone(),
                    self.paths.clone(),
                    self.stop.clone(),
                    RunRequest {
                        guild_id,
                        user_id,
                        username,
                        guild_display_name,
                    },
                ))
            }
            GatewayEvent::ComponentInteraction {
                interaction_id,
                interaction_token,
                event,
            } => {
                let outcome = route_interaction(self.api.as_ref(), &self.store, &event);
                if let Some(error) = &outcome.error {
                    append_runtime_log(
                        &self.paths,
                        "error",
                        "interaction.route.failed",
                        &format!("custom_id={} error={error}", event.custom_id),
                    );
                }
                if !outcome.changes.failed.is_empty() {
                    append_runtime_log(
                        &self.paths,
                        "error",
                        "interaction.roles.failed",
                        &format!(
                            "custom_id={} user={} roles={}",
                            event.custom_id,
                            event.user_id,
                            outcome.changes.failed.join(",")
                        ),
                    );
                }
                if let Err(err) = self.api.respond_to_interaction(
                    &interaction_id,
                    &interaction_token,
                    &outcome.reply,
                ) {
                    append_runtime_log(
                        &self.paths,
                        "error",
                        "interaction.reply.failed",
                        &format!("custom_id={} error={err}", event.custom_id),
                    );
                }
                None
            }
        }
    }
}

/// Posts the configured welcome message for a joining member. Failures are
/// logged and never propagate; a disabled or unconfigured welcome is a no-op.
pub fn post_welcome<A: ChatApi>(
    api: &A,
    store: &GuildStore,
    paths: &StatePaths,
    guild_id: &GuildId,
    user_id: &str,
    username: &str,
    guild_display_name: &str,
) {
    let welcome = match store.load_welcome(guild_id) {
        Ok(welcome) => welcome,
        Err(err) => {
            append_runtime_log(
                paths,
                "error",
                "welcome.load.failed",
                &format!("guild={guild_id} error={err}"),
            );
            return;
        }
    };
    if !welcome.enabled {
        return;
    }
    let Some(channel_id) = welcome
        .channel_id
        .as_deref()
        .filter(|v| !v.trim().is_empty())
    else {
        return;
    };
    let content = substitute_tokens(&welcome.message, user_id, username, guild_display_name);
    if content.is_empty() {
        return;
    }
    if let Err(err) = api.post_message(channel_id, &OutboundMessage::text(content)) {
        append_runtime_log(
            paths,
            "error",
            "welcome.post.failed",
            &format!("guild={guild_id} error={err}"),
        );
    }
}
