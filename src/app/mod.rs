use crate::discord::{ChatApi, DiscordApiClient};
use crate::onboarding::validate_steps;
use crate::runtime::{
    bootstrap_state_root, resolve_state_root, start_onboarding, RunRequest, StatePaths,
};
use crate::shared::GuildId;
use crate::store::GuildStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Setup,
    Validate,
    TestOnboarding,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "setup" => CliVerb::Setup,
        "validate" => CliVerb::Validate,
        "test-onboarding" => CliVerb::TestOnboarding,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  setup                                Initialize the state root directories".to_string(),
        "  validate [guild-id]                  Validate stored onboarding definitions".to_string(),
        "  test-onboarding <guild> <user> <name>  Run a guild's onboarding for one user"
            .to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

fn help_text() -> String {
    cli_help_lines().join("\n")
}

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let Some((verb_raw, rest)) = args.split_first() else {
        return Ok(help_text());
    };
    match parse_cli_verb(verb_raw) {
        CliVerb::Setup => handle_setup(),
        CliVerb::Validate => handle_validate(rest),
        CliVerb::TestOnboarding => handle_test_onboarding(rest),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{verb_raw}`\n\n{}", help_text())),
    }
}

fn state_paths() -> Result<StatePaths, String> {
    let root = resolve_state_root().map_err(|err| err.to_string())?;
    Ok(StatePaths::new(root))
}

fn handle_setup() -> Result<String, String> {
    let paths = state_paths()?;
    bootstrap_state_root(&paths).map_err(|err| err.to_string())?;
    Ok(format!("state root ready at {}", paths.root.display()))
}

fn handle_validate(rest: &[String]) -> Result<String, String> {
    let paths = state_paths()?;
    let store = GuildStore::new(&paths.root);

    let guild_ids = match rest.first() {
        Some(raw) => vec![GuildId::parse(raw)?],
        None => store.guild_ids().map_err(|err| err.to_string())?,
    };
    if guild_ids.is_empty() {
        return Ok("no guild onboarding definitions found".to_string());
    }

    let mut lines = Vec::new();
    let mut violation_count = 0usize;
    for guild_id in &guild_ids {
        let definition = store
            .load_definition(guild_id)
            .map_err(|err| err.to_string())?;
        let violations = validate_steps(&definition.steps);
        if violations.is_empty() {
            lines.push(format!(
                "guild {guild_id}: ok ({} steps)",
                definition.steps.len()
            ));
        } else {
            violation_count += violations.len();
            lines.push(format!("guild {guild_id}: {} violations", violations.len()));
            for violation in violations {
                lines.push(format!("  - {violation}"));
            }
        }
    }

    let report = lines.join("\n");
    if violation_count > 0 {
        Err(report)
    } else {
        Ok(report)
    }
}

fn handle_test_onboarding(rest: &[String]) -> Result<String, String> {
    let [guild_raw, user_id, username] = rest else {
        return Err("usage: test-onboarding <guild-id> <user-id> <username>".to_string());
    };
    let guild_id = GuildId::parse(guild_raw)?;

    let paths = state_paths()?;
    bootstrap_state_root(&paths).map_err(|err| err.to_string())?;
    let store = Arc::new(GuildStore::new(&paths.root));
    let api = Arc::new(DiscordApiClient::from_env().map_err(|err| err.to_string())?);

    let guild_display_name = api
        .guild_display_name(guild_id.as_str())
        .unwrap_or_else(|_| "the server".to_string());

    // The run is the same detached thread a member join would spawn; the CLI
    // just waits for it so the process does not exit underneath the run.
    let stop = Arc::new(AtomicBool::new(false));
    let handle = start_onboarding(
        api,
        store,
        paths.clone(),
        stop,
        RunRequest {
            guild_id: guild_id.clone(),
            user_id: user_id.clone(),
            username: username.clone(),
            guild_display_name,
        },
    );
    handle
        .join()
        .map_err(|_| "onboarding run thread panicked".to_string())?;

    Ok(format!(
        "onboarding test run finished for guild `{guild_id}`; outcome logged to {}",
        paths.runtime_log_path().display()
    ))
}
