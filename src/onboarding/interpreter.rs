use super::definition::{Step, WorkflowDefinition};
use super::render::render_components;
use super::substitute::substitute_tokens;
use super::validate::{MAX_DELAY_SECONDS, MIN_DELAY_SECONDS};
use super::OnboardingError;
use crate::discord::payload::OutboundMessage;
use crate::discord::ChatApi;
use crate::shared::{sleep_with_stop, GuildId};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Everything one in-flight run needs to know about the member it onboards.
/// Created at workflow start, discarded when the run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub guild_id: GuildId,
    pub user_id: String,
    pub username: String,
    pub guild_display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub thread_id: String,
    pub steps_completed: usize,
    /// True when a raised stop flag interrupted a delay; the remaining steps
    /// were abandoned, which is not an error.
    pub interrupted: bool,
}

pub fn clamp_delay_seconds(seconds: u64) -> u64 {
    seconds.clamp(MIN_DELAY_SECONDS, MAX_DELAY_SECONDS)
}

/// Runs a definition for one user: creates the private thread, adds the
/// member, then executes steps strictly in order. A failing step aborts the
/// rest of the run; messages already posted stay (chat messages are not
/// revocable). Callers are expected to check the preconditions themselves;
/// this fails fast when they did not.
pub fn execute_run<A: ChatApi>(
    api: &A,
    definition: &WorkflowDefinition,
    ctx: &RunContext,
    stop: &AtomicBool,
) -> Result<RunReport, OnboardingError> {
    if !definition.enabled {
        return Err(OnboardingError::Disabled(ctx.guild_id.clone()));
    }
    let entry_channel = definition
        .entry_channel_id
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| OnboardingError::MissingEntryChannel(ctx.guild_id.clone()))?;
    if definition.steps.is_empty() {
        return Err(OnboardingError::NoSteps(ctx.guild_id.clone()));
    }

    let thread_id = api.create_private_thread(entry_channel, &ctx.username)?;
    api.add_thread_member(&thread_id, &ctx.user_id)?;

    let mut steps_completed = 0usize;
    for step in &definition.steps {
        match step {
            Step::Message { text, .. } => {
                let content = substitute_tokens(
                    text,
                    &ctx.user_id,
                    &ctx.username,
                    &ctx.guild_display_name,
                );
                if !content.is_empty() {
                    api.post_message(&thread_id, &OutboundMessage::text(content))?;
                }
            }
            Step::Delay { seconds, .. } => {
                let wait = Duration::from_secs(clamp_delay_seconds(*seconds));
                if !sleep_with_stop(stop, wait) {
                    return Ok(RunReport {
                        thread_id,
                        steps_completed,
                        interrupted: true,
                    });
                }
            }
            Step::Action {
                id,
                prompt,
                components,
            } => {
                if !components.is_empty() {
                    let content = substitute_tokens(
                        prompt,
                        &ctx.user_id,
                        &ctx.username,
                        &ctx.guild_display_name,
                    );
                    let rows = render_components(&ctx.guild_id, id, components);
                    let message = OutboundMessage::with_components(
                        if content.is_empty() { None } else { Some(content) },
                        rows,
                    );
                    api.post_message(&thread_id, &message)?;
                }
            }
        }
        steps_completed += 1;
    }

    Ok(RunReport {
        thread_id,
        steps_completed,
        interrupted: false,
    })
}
