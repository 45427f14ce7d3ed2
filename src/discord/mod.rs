use crate::discord::payload::{InteractionReply, OutboundMessage};

pub mod api;
pub mod payload;

pub use api::DiscordApiClient;
pub use payload::{
    ActionRow, Button, PartialEmoji, RowComponent, SelectOption, StringSelect,
};

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("missing required env var `{0}`")]
    MissingEnvVar(String),
    #[error("discord api request failed: {0}")]
    Request(String),
    #[error("discord api responded with status {status}: {message}")]
    Api {
        status: u16,
        code: Option<u64>,
        message: String,
    },
}

/// Operations the bot issues against the chat platform. `DiscordApiClient`
/// is the live implementation; tests drive the interpreter, router and event
/// dispatcher through recording fakes.
pub trait ChatApi {
    /// Creates a private, non-invitable thread under the parent channel and
    /// returns its id.
    fn create_private_thread(
        &self,
        parent_channel_id: &str,
        name: &str,
    ) -> Result<String, DiscordError>;

    fn add_thread_member(&self, thread_id: &str, user_id: &str) -> Result<(), DiscordError>;

    /// Posts text and/or interactive components as one message.
    fn post_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), DiscordError>;

    fn add_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError>;

    fn remove_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError>;

    fn guild_display_name(&self, guild_id: &str) -> Result<String, DiscordError>;

    fn respond_to_interaction(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        reply: &InteractionReply,
    ) -> Result<(), DiscordError>;
}
