use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = support_wizard::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!(
        "[PHASE: initialization] [STEP: start] support-wizard v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    // Flag scan: `--tui-smoke` or `--tui-smoke=<page>` renders one frame and
    // exits; anything else runs the interactive wizard.
    let mut smoke_target: Option<String> = None;
    let mut smoke = false;
    for arg in std::env::args().skip(1) {
        if arg == "--tui-smoke" {
            smoke = true;
        } else if let Some(target) = arg.strip_prefix("--tui-smoke=") {
            smoke = true;
            smoke_target = Some(target.to_string());
        }
    }

    let result = if smoke {
        support_wizard::run_tui_smoke(smoke_target.as_deref())
    } else {
        support_wizard::run_tui()
    };

    match result {
        Ok(()) => {
            info!("[PHASE: shutdown] [STEP: exit] support-wizard exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("[PHASE: shutdown] [STEP: exit] Fatal error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
