use super::logging::append_runtime_log;
use super::StatePaths;
use crate::discord::ChatApi;
use crate::onboarding::{execute_run, RunContext};
use crate::shared::{new_run_id, now_secs, GuildId};
use crate::store::GuildStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub guild_id: GuildId,
    pub user_id: String,
    pub username: String,
    pub guild_display_name: String,
}

/// Starts an onboarding run on its own thread and returns immediately.
/// The run loads a fresh snapshot of the guild's definition, executes it,
/// and reports its outcome only to the runtime log; callers never block on
/// completion. Raising the stop flag interrupts a sleeping `Delay` and
/// abandons the rest of the run.
pub fn start_onboarding<A: ChatApi + Send + Sync + 'static>(
    api: Arc<A>,
    store: Arc<GuildStore>,
    paths: StatePaths,
    stop: Arc<AtomicBool>,
    request: RunRequest,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let run_id = new_run_id(now_secs()).unwrap_or_else(|_| "run-unidentified".to_string());
        let tag = format!(
            "run_id={run_id} guild={} user={}",
            request.guild_id, request.user_id
        );

        let definition = match store.load_definition(&request.guild_id) {
            Ok(definition) => definition,
            Err(err) => {
                append_runtime_log(
                    &paths,
                    "error",
                    "onboarding.run.failed",
                    &format!("{tag} error={err}"),
                );
                return;
            }
        };

        if !definition.enabled {
            append_runtime_log(&paths, "info", "onboarding.run.skipped", &tag);
            return;
        }

        append_runtime_log(&paths, "info", "onboarding.run.started", &tag);

        let ctx = RunContext {
            guild_id: request.guild_id,
            user_id: request.user_id,
            username: request.username,
            guild_display_name: request.guild_display_name,
        };

        match execute_run(api.as_ref(), &definition, &ctx, &stop) {
            Ok(report) if report.interrupted => append_runtime_log(
                &paths,
                "info",
                "onboarding.run.abandoned",
                &format!(
                    "{tag} thread={} steps_completed={}",
                    report.thread_id, report.steps_completed
                ),
            ),
            Ok(report) => append_runtime_log(
                &paths,
                "info",
                "onboarding.run.completed",
                &format!(
                    "{tag} thread={} steps_completed={}",
                    report.thread_id, report.steps_completed
                ),
            ),
            Err(err) if err.is_configuration() => append_runtime_log(
                &paths,
                "error",
                "onboarding.run.refused",
                &format!("{tag} error={err}"),
            ),
            Err(err) => append_runtime_log(
                &paths,
                "error",
                "onboarding.run.failed",
                &format!("{tag} error={err}"),
            ),
        }
    })
}
