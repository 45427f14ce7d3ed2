pub mod fs_atomic;
pub mod ids;
pub mod run_ids;
pub mod time;

pub use fs_atomic::atomic_write_file;
pub use ids::{validate_identifier_value, GuildId, OptionValue, StepId};
pub use run_ids::new_run_id;
pub use time::{now_secs, sleep_with_stop};
