use concierge::discord::payload::OutboundMessage;
use concierge::discord::{ChatApi, DiscordError};
use concierge::onboarding::{
    execute_run, EmojiRef, InteractiveComponent, OnboardingError, RoleOption, RunContext, Step,
    WorkflowDefinition,
};
use concierge::shared::{GuildId, OptionValue, StepId};
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    CreateThread { channel: String, name: String },
    AddThreadMember { thread: String, user: String },
    PostMessage { channel: String, message: OutboundMessage },
}

#[derive(Default)]
struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    fail_thread_creation: bool,
    fail_posts: bool,
}

impl RecordingApi {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn transient_failure() -> DiscordError {
        DiscordError::Api {
            status: 500,
            code: None,
            message: "upstream unavailable".to_string(),
        }
    }
}

impl ChatApi for RecordingApi {
    fn create_private_thread(
        &self,
        parent_channel_id: &str,
        name: &str,
    ) -> Result<String, DiscordError> {
        self.record(Call::CreateThread {
            channel: parent_channel_id.to_string(),
            name: name.to_string(),
        });
        if self.fail_thread_creation {
            return Err(Self::transient_failure());
        }
        Ok("thread-1".to_string())
    }

    fn add_thread_member(&self, thread_id: &str, user_id: &str) -> Result<(), DiscordError> {
        self.record(Call::AddThreadMember {
            thread: thread_id.to_string(),
            user: user_id.to_string(),
        });
        Ok(())
    }

    fn post_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), DiscordError> {
        self.record(Call::PostMessage {
            channel: channel_id.to_string(),
            message: message.clone(),
        });
        if self.fail_posts {
            return Err(Self::transient_failure());
        }
        Ok(())
    }

    fn add_member_role(&self, _: &str, _: &str, _: &str) -> Result<(), DiscordError> {
        Ok(())
    }

    fn remove_member_role(&self, _: &str, _: &str, _: &str) -> Result<(), DiscordError> {
        Ok(())
    }

    fn guild_display_name(&self, _: &str) -> Result<String, DiscordError> {
        Ok("Test Guild".to_string())
    }

    fn respond_to_interaction(
        &self,
        _: &str,
        _: &str,
        _: &concierge::discord::payload::InteractionReply,
    ) -> Result<(), DiscordError> {
        Ok(())
    }
}

fn step_id(raw: &str) -> StepId {
    StepId::parse(raw).expect("step id")
}

fn ctx() -> RunContext {
    RunContext {
        guild_id: GuildId::parse("112233").expect("guild id"),
        user_id: "42".to_string(),
        username: "ada".to_string(),
        guild_display_name: "Rust Hall".to_string(),
    }
}

fn definition(steps: Vec<Step>) -> WorkflowDefinition {
    WorkflowDefinition {
        guild_id: GuildId::parse("112233").expect("guild id"),
        enabled: true,
        entry_channel_id: Some("900".to_string()),
        steps,
    }
}

fn dropdown_action(id: &str) -> Step {
    Step::Action {
        id: step_id(id),
        prompt: "Pick a team, {username}".to_string(),
        components: vec![InteractiveComponent::Dropdown {
            placeholder: String::new(),
            multi_select: true,
            options: vec![RoleOption {
                label: "Red".to_string(),
                value: OptionValue::parse("red").expect("value"),
                description: None,
                emoji: Some(EmojiRef {
                    id: None,
                    name: "🔴".to_string(),
                }),
                role_id: "100".to_string(),
            }],
        }],
    }
}

#[test]
fn steps_execute_strictly_in_order_with_the_delay_elapsing() {
    let api = RecordingApi::default();
    let definition = definition(vec![
        Step::Message {
            id: step_id("s1"),
            text: "Hi {user}".to_string(),
        },
        Step::Delay {
            id: step_id("s2"),
            seconds: 1,
        },
        dropdown_action("s3"),
    ]);
    let stop = AtomicBool::new(false);

    let started = Instant::now();
    let report = execute_run(&api, &definition, &ctx(), &stop).expect("run");
    assert!(started.elapsed() >= Duration::from_secs(1));

    assert_eq!(report.thread_id, "thread-1");
    assert_eq!(report.steps_completed, 3);
    assert!(!report.interrupted);

    let calls = api.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(
        calls[0],
        Call::CreateThread {
            channel: "900".to_string(),
            name: "ada".to_string(),
        }
    );
    assert_eq!(
        calls[1],
        Call::AddThreadMember {
            thread: "thread-1".to_string(),
            user: "42".to_string(),
        }
    );
    match &calls[2] {
        Call::PostMessage { channel, message } => {
            assert_eq!(channel, "thread-1");
            assert_eq!(message.content.as_deref(), Some("Hi <@42>"));
            assert!(message.components.is_empty());
        }
        other => panic!("expected message post, got {other:?}"),
    }
    match &calls[3] {
        Call::PostMessage { channel, message } => {
            assert_eq!(channel, "thread-1");
            assert_eq!(message.content.as_deref(), Some("Pick a team, ada"));
            assert_eq!(message.components.len(), 1);
        }
        other => panic!("expected action post, got {other:?}"),
    }
}

#[test]
fn empty_message_text_is_a_no_op_not_an_error() {
    let api = RecordingApi::default();
    let definition = definition(vec![Step::Message {
        id: step_id("s1"),
        text: String::new(),
    }]);
    let stop = AtomicBool::new(false);

    let report = execute_run(&api, &definition, &ctx(), &stop).expect("run");
    assert_eq!(report.steps_completed, 1);
    assert_eq!(api.calls().len(), 2);
}

#[test]
fn action_steps_without_components_post_nothing() {
    let api = RecordingApi::default();
    let definition = definition(vec![Step::Action {
        id: step_id("s1"),
        prompt: "orphaned prompt".to_string(),
        components: Vec::new(),
    }]);
    let stop = AtomicBool::new(false);

    let report = execute_run(&api, &definition, &ctx(), &stop).expect("run");
    assert_eq!(report.steps_completed, 1);
    assert_eq!(api.calls().len(), 2);
}

#[test]
fn precondition_violations_fail_fast_before_any_side_effect() {
    let api = RecordingApi::default();
    let stop = AtomicBool::new(false);

    let mut disabled = definition(vec![dropdown_action("s1")]);
    disabled.enabled = false;
    assert!(matches!(
        execute_run(&api, &disabled, &ctx(), &stop),
        Err(OnboardingError::Disabled(_))
    ));

    let mut unchanneled = definition(vec![dropdown_action("s1")]);
    unchanneled.entry_channel_id = None;
    assert!(matches!(
        execute_run(&api, &unchanneled, &ctx(), &stop),
        Err(OnboardingError::MissingEntryChannel(_))
    ));

    let empty = definition(Vec::new());
    assert!(matches!(
        execute_run(&api, &empty, &ctx(), &stop),
        Err(OnboardingError::NoSteps(_))
    ));

    assert!(api.calls().is_empty());
}

#[test]
fn thread_creation_failure_aborts_the_whole_run() {
    let api = RecordingApi {
        fail_thread_creation: true,
        ..RecordingApi::default()
    };
    let definition = definition(vec![dropdown_action("s1")]);
    let stop = AtomicBool::new(false);

    let err = execute_run(&api, &definition, &ctx(), &stop).expect_err("aborted");
    assert!(matches!(err, OnboardingError::Discord(_)));
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn a_failing_step_aborts_the_remaining_steps() {
    let api = RecordingApi {
        fail_posts: true,
        ..RecordingApi::default()
    };
    let definition = definition(vec![
        Step::Message {
            id: step_id("s1"),
            text: "one".to_string(),
        },
        Step::Message {
            id: step_id("s2"),
            text: "two".to_string(),
        },
    ]);
    let stop = AtomicBool::new(false);

    let err = execute_run(&api, &definition, &ctx(), &stop).expect_err("aborted");
    assert!(matches!(err, OnboardingError::Discord(_)));
    // Thread setup plus exactly one attempted post; step two never runs.
    assert_eq!(api.calls().len(), 3);
}

#[test]
fn a_raised_stop_flag_interrupts_a_delay_and_abandons_the_run() {
    let api = RecordingApi::default();
    let definition = definition(vec![
        Step::Delay {
            id: step_id("s1"),
            seconds: 300,
        },
        Step::Message {
            id: step_id("s2"),
            text: "never".to_string(),
        },
    ]);
    let stop = AtomicBool::new(true);

    let started = Instant::now();
    let report = execute_run(&api, &definition, &ctx(), &stop).expect("interrupted run");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(report.interrupted);
    assert_eq!(report.steps_completed, 0);
    assert_eq!(api.calls().len(), 2);
}
