use super::payload::{
    InteractionReply, OutboundMessage, EPHEMERAL_FLAG, INTERACTION_CALLBACK_CHANNEL_MESSAGE,
    PRIVATE_THREAD_TYPE, THREAD_AUTO_ARCHIVE_MINUTES,
};
use super::{ChatApi, DiscordError};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = "DiscordBot (concierge, 0.1.0)";

#[derive(Debug, Clone)]
pub struct DiscordApiClient {
    api_base: String,
    bot_token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ThreadData {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GuildData {
    name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

fn env_var_fallback(primary_key: &str, fallback_key: &str) -> Option<String> {
    std::env::var(primary_key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            std::env::var(fallback_key)
                .ok()
                .filter(|v| !v.trim().is_empty())
        })
}

fn api_failure(err: ureq::Error) -> DiscordError {
    match err {
        ureq::Error::Status(status, response) => {
            let body: ApiErrorBody = response.into_json().unwrap_or_default();
            DiscordError::Api {
                status,
                code: body.code,
                message: body
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            }
        }
        other => DiscordError::Request(other.to_string()),
    }
}

impl DiscordApiClient {
    pub fn new(bot_token: String) -> Self {
        let api_base = std::env::var("CONCIERGE_DISCORD_API_BASE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string());
        Self {
            api_base,
            bot_token,
        }
    }

    pub fn from_env() -> Result<Self, DiscordError> {
        let bot_token = env_var_fallback("CONCIERGE_DISCORD_TOKEN", "DISCORD_TOKEN")
            .ok_or_else(|| DiscordError::MissingEnvVar("DISCORD_TOKEN".to_string()))?;
        Ok(Self::new(bot_token))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("Authorization", &format!("Bot {}", self.bot_token))
            .set("User-Agent", USER_AGENT)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, DiscordError> {
        let response = self
            .authorized(ureq::get(&self.endpoint(path)))
            .call()
            .map_err(api_failure)?;
        response
            .into_json::<T>()
            .map_err(|e| DiscordError::Request(e.to_string()))
    }

    fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, DiscordError> {
        let response = self
            .authorized(ureq::post(&self.endpoint(path)))
            .send_json(body.clone())
            .map_err(api_failure)?;
        response
            .into_json::<T>()
            .map_err(|e| DiscordError::Request(e.to_string()))
    }

    fn post_json_discard(&self, path: &str, body: &serde_json::Value) -> Result<(), DiscordError> {
        self.authorized(ureq::post(&self.endpoint(path)))
            .send_json(body.clone())
            .map_err(api_failure)?;
        Ok(())
    }

    fn put_empty(&self, path: &str) -> Result<(), DiscordError> {
        self.authorized(ureq::put(&self.endpoint(path)))
            .call()
            .map_err(api_failure)?;
        Ok(())
    }

    fn delete_empty(&self, path: &str) -> Result<(), DiscordError> {
        self.authorized(ureq::delete(&self.endpoint(path)))
            .call()
            .map_err(api_failure)?;
        Ok(())
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

impl ChatApi for DiscordApiClient {
    fn create_private_thread(
        &self,
        parent_channel_id: &str,
        name: &str,
    ) -> Result<String, DiscordError> {
        let body = json!({
            "name": name,
            "type": PRIVATE_THREAD_TYPE,
            "invitable": false,
            "auto_archive_duration": THREAD_AUTO_ARCHIVE_MINUTES,
        });
        let thread: ThreadData =
            self.post_json(&format!("channels/{}/threads", encode(parent_channel_id)), &body)?;
        Ok(thread.id)
    }

    fn add_thread_member(&self, thread_id: &str, user_id: &str) -> Result<(), DiscordError> {
        self.put_empty(&format!(
            "channels/{}/thread-members/{}",
            encode(thread_id),
            encode(user_id)
        ))
    }

    fn post_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), DiscordError> {
        let body =
            serde_json::to_value(message).map_err(|e| DiscordError::Request(e.to_string()))?;
        self.post_json_discard(&format!("channels/{}/messages", encode(channel_id)), &body)
    }

    fn add_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError> {
        self.put_empty(&format!(
            "guilds/{}/members/{}/roles/{}",
            encode(guild_id),
            encode(user_id),
            encode(role_id)
        ))
    }

    fn remove_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError> {
        self.delete_empty(&format!(
            "guilds/{}/members/{}/roles/{}",
            encode(guild_id),
            encode(user_id),
            encode(role_id)
        ))
    }

    fn guild_display_name(&self, guild_id: &str) -> Result<String, DiscordError> {
        let guild: GuildData = self.get_json(&format!("guilds/{}", encode(guild_id)))?;
        Ok(guild.name)
    }

    fn respond_to_interaction(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        reply: &InteractionReply,
    ) -> Result<(), DiscordError> {
        let mut data = json!({ "content": reply.content });
        if reply.ephemeral {
            data["flags"] = json!(EPHEMERAL_FLAG);
        }
        let body = json!({
            "type": INTERACTION_CALLBACK_CHANNEL_MESSAGE,
            "data": data,
        });
        self.post_json_discard(
            &format!(
                "interactions/{}/{}/callback",
                encode(interaction_id),
                encode(interaction_token)
            ),
            &body,
        )
    }
}
