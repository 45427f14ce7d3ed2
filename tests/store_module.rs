use concierge::onboarding::{Step, WorkflowDefinition};
use concierge::shared::{GuildId, StepId};
use concierge::store::{GuildStore, StoreError};
use tempfile::tempdir;

fn guild() -> GuildId {
    GuildId::parse("112233").expect("guild id")
}

fn message(id: &str) -> Step {
    Step::Message {
        id: StepId::parse(id).expect("step id"),
        text: "hi".to_string(),
    }
}

#[test]
fn documents_land_under_the_guild_directory() {
    let tmp = tempdir().expect("tempdir");
    let store = GuildStore::new(tmp.path());
    let definition = WorkflowDefinition {
        guild_id: guild(),
        enabled: false,
        entry_channel_id: None,
        steps: vec![message("s1")],
    };
    store.save_definition(&definition).expect("save");
    assert!(tmp.path().join("guilds/112233/onboarding.yaml").is_file());
}

#[test]
fn rejection_reports_every_violation_in_one_error() {
    let tmp = tempdir().expect("tempdir");
    let store = GuildStore::new(tmp.path());
    let mut steps: Vec<Step> = (0..21).map(|i| message(&format!("s{i}"))).collect();
    steps.push(Step::Delay {
        id: StepId::parse("d1").expect("step id"),
        seconds: 0,
    });
    let definition = WorkflowDefinition {
        guild_id: guild(),
        enabled: true,
        entry_channel_id: Some("900".to_string()),
        steps,
    };

    let err = store.save_definition(&definition).expect_err("rejected");
    let StoreError::Rejected { violations } = &err else {
        panic!("expected rejection, got {err:?}");
    };
    assert_eq!(violations.len(), 2);
    let rendered = err.to_string();
    assert!(rendered.contains("at most 20 steps"));
    assert!(rendered.contains("delay must be between 1 and 300 seconds"));
}

#[test]
fn definitions_survive_a_reload_from_disk() {
    let tmp = tempdir().expect("tempdir");
    let definition = WorkflowDefinition {
        guild_id: guild(),
        enabled: true,
        entry_channel_id: Some("900".to_string()),
        steps: vec![message("s1"), message("s2")],
    };
    GuildStore::new(tmp.path())
        .save_definition(&definition)
        .expect("save");

    // A fresh store over the same root sees the same document.
    let reloaded = GuildStore::new(tmp.path())
        .load_definition(&guild())
        .expect("load");
    assert_eq!(reloaded, definition);
}
