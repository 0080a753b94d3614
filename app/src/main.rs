use std::process::ExitCode;

use statusboard_core::{targets, Config};
use statusboard_ui::logging::{init_logging, LogLevel, LogStore};
use statusboard_ui::{run, Flags};

const LOG_CAPACITY: usize = 2000;

fn main() -> ExitCode {
    let log_store = LogStore::new(LOG_CAPACITY);
    let reload_handle = init_logging(log_store.clone(), LogLevel::Info);

    tracing::info!(target: targets::UI, "status board starting");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(target: targets::CONFIG, "{}", error.technical_detail());
            eprintln!("statusboard: {}", error.user_summary());
            return ExitCode::from(2);
        }
    };

    match run(Flags {
        log_store,
        reload_handle,
        config,
    }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: targets::UI, "dashboard exited with an error: {error}");
            ExitCode::FAILURE
        }
    }
}
