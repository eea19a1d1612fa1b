use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;

use lifeos_client::cli::{build_cli, run};
use lifeos_client::config::TokenBackend;
use lifeos_client::session::SessionState;
use lifeos_client::utils::logging::initialize_logging;
use lifeos_client::{AppConfig, Gateway, HttpTransport, SessionManager};

const LOGIN_HINT: &str = "Your session has expired. Please log in again with `lifeos login`.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let matches = build_cli().get_matches();

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if matches.get_flag("ephemeral") {
        config.token_backend = TokenBackend::Memory;
    }

    if let Err(e) = initialize_logging(&config.log_path(), config.level_filter()) {
        eprintln!("Warning: logging disabled ({})", e);
    }
    info!(
        "Starting lifeos against {} with {} token storage",
        config.api_base_url, config.token_backend
    );

    let transport = match HttpTransport::new(&config.api_base_url, config.request_timeout()) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = match config.token_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let gateway = Gateway::new(Arc::new(transport), store, SessionState::new());
    let manager = SessionManager::new(Arc::new(gateway));

    let snapshot = manager.initialize().await;
    if snapshot.is_expired() {
        warn!("Stored session could not be restored");
        println!("{}", LOGIN_HINT);
    }

    match run(&matches, &manager).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            if manager.snapshot().is_expired() {
                eprintln!("{}", LOGIN_HINT);
            } else {
                eprintln!("Error: {}", e.user_message());
            }
            ExitCode::FAILURE
        }
    }
}
