use concierge::discord::payload::{InteractionReply, OutboundMessage};
use concierge::discord::{ChatApi, DiscordError};
use concierge::onboarding::{Step, WorkflowDefinition};
use concierge::runtime::{start_onboarding, RunRequest, StatePaths};
use concierge::shared::{GuildId, StepId};
use concierge::store::GuildStore;
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[derive(Default)]
struct RecordingApi {
    posted: Mutex<Vec<String>>,
    fail_thread_creation: bool,
}

impl ChatApi for RecordingApi {
    fn create_private_thread(&self, _: &str, name: &str) -> Result<String, DiscordError> {
        if self.fail_thread_creation {
            return Err(DiscordError::Api {
                status: 502,
                code: None,
                message: "bad gateway".to_string(),
            });
        }
        Ok(format!("thread-{name}"))
    }

    fn add_thread_member(&self, _: &str, _: &str) -> Result<(), DiscordError> {
        Ok(())
    }

    fn post_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), DiscordError> {
        self.posted.lock().expect("posted lock").push(format!(
            "{channel_id}: {}",
            message.content.as_deref().unwrap_or_default()
        ));
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
        _: &InteractionReply,
    ) -> Result<(), DiscordError> {
        Ok(())
    }
}

fn guild() -> GuildId {
    GuildId::parse("112233").expect("guild id")
}

fn save_definition(store: &GuildStore, steps: Vec<Step>, enabled: bool) {
    let definition = WorkflowDefinition {
        guild_id: guild(),
        enabled,
        entry_channel_id: Some("900".to_string()),
        steps,
    };
    store.save_definition(&definition).expect("save definition");
}

fn request(user_id: &str, username: &str) -> RunRequest {
    RunRequest {
        guild_id: guild(),
        user_id: user_id.to_string(),
        username: username.to_string(),
        guild_display_name: "Rust Hall".to_string(),
    }
}

fn runtime_log(paths: &StatePaths) -> String {
    fs::read_to_string(paths.runtime_log_path()).unwrap_or_default()
}

#[test]
fn a_delay_suspends_only_its_own_run() {
    let tmp = tempdir().expect("tempdir");
    let paths = StatePaths::new(tmp.path());
    let store = Arc::new(GuildStore::new(tmp.path()));
    let api = Arc::new(RecordingApi::default());
    let stop = Arc::new(AtomicBool::new(false));

    save_definition(
        &store,
        vec![
            Step::Delay {
                id: StepId::parse("d1").expect("step id"),
                seconds: 1,
            },
            Step::Message {
                id: StepId::parse("m1").expect("step id"),
                text: "done {username}".to_string(),
            },
        ],
        true,
    );

    let started = Instant::now();
    let first = start_onboarding(
        api.clone(),
        store.clone(),
        paths.clone(),
        stop.clone(),
        request("1", "alice"),
    );
    let second = start_onboarding(
        api.clone(),
        store.clone(),
        paths.clone(),
        stop.clone(),
        request("2", "bob"),
    );
    first.join().expect("first run");
    second.join().expect("second run");
    let elapsed = started.elapsed();

    // Two one-second delays running concurrently finish well under the
    // two seconds sequential execution would need.
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1900), "elapsed {elapsed:?}");

    let mut posted = api.posted.lock().expect("posted lock").clone();
    posted.sort();
    assert_eq!(
        posted,
        vec![
            "thread-alice: done alice".to_string(),
            "thread-bob: done bob".to_string(),
        ]
    );

    let log = runtime_log(&paths);
    assert_eq!(log.matches("onboarding.run.completed").count(), 2);
}

#[test]
fn a_failed_run_is_only_visible_in_the_runtime_log() {
    let tmp = tempdir().expect("tempdir");
    let paths = StatePaths::new(tmp.path());
    let store = Arc::new(GuildStore::new(tmp.path()));
    let api = Arc::new(RecordingApi {
        fail_thread_creation: true,
        ..RecordingApi::default()
    });
    let stop = Arc::new(AtomicBool::new(false));

    save_definition(
        &store,
        vec![Step::Message {
            id: StepId::parse("m1").expect("step id"),
            text: "hello".to_string(),
        }],
        true,
    );

    start_onboarding(api, store, paths.clone(), stop, request("1", "alice"))
        .join()
        .expect("run thread");

    let log = runtime_log(&paths);
    assert!(log.contains("onboarding.run.started"));
    assert!(log.contains("onboarding.run.failed"));
    assert!(log.contains("bad gateway"));
}

#[test]
fn disabled_guilds_skip_without_touching_the_platform() {
    let tmp = tempdir().expect("tempdir");
    let paths = StatePaths::new(tmp.path());
    let store = Arc::new(GuildStore::new(tmp.path()));
    let api = Arc::new(RecordingApi::default());
    let stop = Arc::new(AtomicBool::new(false));

    save_definition(
        &store,
        vec![Step::Message {
            id: StepId::parse("m1").expect("step id"),
            text: "hello".to_string(),
        }],
        false,
    );

    start_onboarding(
        api.clone(),
        store,
        paths.clone(),
        stop,
        request("1", "alice"),
    )
    .join()
    .expect("run thread");

    assert!(api.posted.lock().expect("posted lock").is_empty());
    let log = runtime_log(&paths);
    assert!(log.contains("onboarding.run.skipped"));
    assert!(!log.contains("onboarding.run.started"));
}

#[test]
fn a_raised_stop_flag_abandons_an_in_flight_delay() {
    let tmp = tempdir().expect("tempdir");
    let paths = StatePaths::new(tmp.path());
    let store = Arc::new(GuildStore::new(tmp.path()));
    let api = Arc::new(RecordingApi::default());
    let stop = Arc::new(AtomicBool::new(false));

    save_definition(
        &store,
        vec![
            Step::Delay {
                id: StepId::parse("d1").expect("step id"),
                seconds: 300,
            },
            Step::Message {
                id: StepId::parse("m1").expect("step id"),
                text: "never".to_string(),
            },
        ],
        true,
    );

    let started = Instant::now();
    let handle = start_onboarding(
        api.clone(),
        store,
        paths.clone(),
        stop.clone(),
        request("1", "alice"),
    );
    std::thread::sleep(Duration::from_millis(300));
    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    handle.join().expect("run thread");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(api.posted.lock().expect("posted lock").is_empty());
    assert!(runtime_log(&paths).contains("onboarding.run.abandoned"));
}
