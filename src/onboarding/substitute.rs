/// Expands the message tokens administrators may use in welcome texts,
/// step messages and action prompts. `{user}` becomes a mention, `{username}`
/// the plain name, `{server}` the guild display name; anything else is left
/// verbatim.
pub fn substitute_tokens(text: &str, user_id: &str, username: &str, guild_name: &str) -> String {
    text.replace("{user}", &format!("<@{user_id}>"))
        .replace("{username}", username)
        .replace("{server}", guild_name)
}
