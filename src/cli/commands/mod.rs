//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod sessions;
mod summarize;
mod turns;

pub use ask::run_ask;
pub use chat::run_question_loop;
pub use config::run_config;
pub use doctor::run_doctor;
pub use sessions::run_sessions;
pub use summarize::run_summarize;
pub use turns::run_turns;
