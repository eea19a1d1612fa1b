use env_logger::{Builder, WriteStyle};
use log::{debug, info, warn, LevelFilter};
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Initialize the logging system, appending to `log_file`.
///
/// `RUST_LOG`-style filters in `LIFEOS_LOG` win over `level`.
pub fn initialize_logging(log_file: &Path, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    Builder::new()
        .filter_level(level)
        .parse_env("LIFEOS_LOG")
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Never)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;

    info!("Logging system initialized");
    Ok(())
}

/// Mask a sensitive value, keeping two characters at each end
pub fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Structured logging for login, logout and session restore
pub fn log_auth_event(event_type: &str, username: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Auth event: type={}, user={}, success=true, timestamp={}, details={:?}",
            event_type,
            format_sensitive(username),
            timestamp,
            details
        );
    } else {
        warn!(
            "Auth event: type={}, user={}, success=false, timestamp={}, details={:?}",
            event_type,
            format_sensitive(username),
            timestamp,
            details
        );
    }
}

/// One line per send; `status` is `None` when no response arrived
pub fn log_api_call(method: &str, path: &str, status: Option<u16>, attempt: &str) {
    match status {
        Some(code) if code < 400 => {
            debug!("API call: {} {} -> {} ({})", method, path, code, attempt)
        }
        Some(code) => warn!("API call: {} {} -> {} ({})", method, path, code, attempt),
        None => warn!("API call: {} {} -> no response ({})", method, path, attempt),
    }
}
