use std::process::ExitCode;

use room_engine::{PathRequestError, SimConfig};
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::demo::{Demo, DemoStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) ticks: u64,
    pub(crate) transitions: u32,
    pub(crate) player_alive: bool,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_fixed_ticks(app.demo, &app.config) {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                transitions = summary.transitions,
                player_alive = summary.player_alive,
                "sim_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "sim_failed");
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn run_fixed_ticks(
    mut demo: Demo,
    config: &SimConfig,
) -> Result<RunSummary, PathRequestError> {
    let fixed_dt_seconds = config.fixed_dt().as_secs_f32();
    let progress_interval = u64::from(config.target_tps.max(1));
    info!(
        target_tps = config.target_tps,
        max_ticks = config.max_ticks,
        "sim_started"
    );

    let mut player_alive = true;
    while config.max_ticks == 0 || demo.ticks() < config.max_ticks {
        if demo.step(fixed_dt_seconds)? == DemoStatus::PlayerDied {
            player_alive = false;
            break;
        }
        if demo.ticks() % progress_interval == 0 {
            info!(
                tick = demo.ticks(),
                room = %demo.active_room_id(),
                health = demo.player_health().map_or(0, |health| health.current),
                transitions = demo.transitions(),
                "sim_progress"
            );
        }
    }

    Ok(RunSummary {
        ticks: demo.ticks(),
        transitions: demo.transitions(),
        player_alive,
    })
}
