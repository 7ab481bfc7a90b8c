// Social Support Application Wizard
//
// Multi-step application form: personal information, family and financial
// information, situation descriptions, final submission. Progress is
// persisted locally after every committed change, so a session can stop and
// resume at the recorded step.

use anyhow::{Context, Result};
use chrono::Local;
use log::info;

pub mod ai;
pub mod api;
pub mod geo;
pub mod models;
pub mod settings;
pub mod store;
mod tui;
pub mod utils;
pub mod wizard;

use utils::logging;
use utils::path_resolver;

/// Initialize file logging: a JSON `.log` stream for tooling and a
/// human-readable `.txt` stream, both under the data folder. Nothing goes to
/// stdout; the terminal belongs to the wizard UI.
pub fn init_logging() -> Result<()> {
    let log_folder = path_resolver::resolve_log_folder()?;
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    let json_file = log_folder.join(format!("support-wizard-{}.log", timestamp));
    let text_file = log_folder.join(format!("support-wizard-{}.txt", timestamp));

    let json_out = fern::Dispatch::new()
        .format(|out, message, record| {
            let raw = message.to_string();
            let (phase, step, cleaned) = logging::parse_log_metadata(&raw);
            out.finish(format_args!(
                "{}",
                logging::format_json_log(
                    &Local::now().to_rfc3339(),
                    record.level(),
                    record.target(),
                    &cleaned,
                    phase.as_deref(),
                    step.as_deref(),
                )
            ))
        })
        .chain(fern::log_file(&json_file).context("Failed to open JSON log file")?);

    let text_out = fern::Dispatch::new()
        .format(|out, message, record| {
            let raw = message.to_string();
            let (phase, step, cleaned) = logging::parse_log_metadata(&raw);
            out.finish(format_args!(
                "{}",
                logging::format_human_readable_log(
                    &Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                    record.level(),
                    record.target(),
                    &cleaned,
                    phase.as_deref(),
                    step.as_deref(),
                )
            ))
        })
        .chain(fern::log_file(&text_file).context("Failed to open text log file")?);

    fern::Dispatch::new()
        .level(log::LevelFilter::Info)
        .level_for("support_wizard", log::LevelFilter::Debug)
        .chain(json_out)
        .chain(text_out)
        .apply()
        .context("Failed to initialize logging")?;

    info!(
        "[PHASE: initialization] [STEP: logging] Logging initialized: {}",
        json_file.display()
    );
    Ok(())
}

/// Run the interactive terminal wizard.
pub fn run_tui() -> Result<()> {
    let settings = settings::Settings::load()?;
    tui::run(settings)
}

/// Render one frame of the requested page to an in-memory backend and exit.
/// Used by CI and packaging checks; never touches the real terminal.
pub fn run_tui_smoke(target: Option<&str>) -> Result<()> {
    tui::smoke(target.unwrap_or("personal"))
}
