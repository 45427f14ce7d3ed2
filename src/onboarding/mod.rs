use crate::discord::DiscordError;
use crate::shared::GuildId;

pub mod custom_id;
pub mod definition;
pub mod interpreter;
pub mod render;
pub mod router;
pub mod substitute;
pub mod validate;

pub use custom_id::{CallbackId, Selector, CALLBACK_PREFIX, DROPDOWN_SELECTOR};
pub use definition::{EmojiRef, InteractiveComponent, RoleOption, Step, WorkflowDefinition};
pub use interpreter::{clamp_delay_seconds, execute_run, RunContext, RunReport};
pub use render::render_components;
pub use router::{route_interaction, InteractionEvent, InteractionOutcome, RoleChanges};
pub use substitute::substitute_tokens;
pub use validate::{
    validate_steps, MAX_BUTTON_OPTIONS, MAX_DELAY_SECONDS, MAX_DROPDOWN_OPTIONS, MAX_STEPS,
    MIN_DELAY_SECONDS,
};

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("onboarding is disabled for guild `{0}`")]
    Disabled(GuildId),
    #[error("onboarding for guild `{0}` has no entry channel configured")]
    MissingEntryChannel(GuildId),
    #[error("onboarding for guild `{0}` has no steps configured")]
    NoSteps(GuildId),
    #[error("discord api call failed: {0}")]
    Discord(#[from] DiscordError),
}

impl OnboardingError {
    /// Configuration errors are the caller's precondition violations; they
    /// are reported, never retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OnboardingError::Disabled(_)
                | OnboardingError::MissingEntryChannel(_)
                | OnboardingError::NoSteps(_)
        )
    }
}
