use std::path::PathBuf;

use engine::{PaintRegistry, Rotation};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;

use app::bootstrap::AppWiring;
use app::track_paint::register_track_callbacks;
use app::{build_app, load_world, run_simulation, save_world, LoopConfig};

const MAP_SIZE_ENV_VAR: &str = "PARK_MAP_SIZE";
const TICKS_ENV_VAR: &str = "PARK_TICKS";
const ROTATION_ENV_VAR: &str = "PARK_ROTATION";
const SAVE_PATH_ENV_VAR: &str = "PARK_SAVE_PATH";
const LOAD_PATH_ENV_VAR: &str = "PARK_LOAD_PATH";

fn main() {
    init_tracing();
    info!("=== Park Sim Startup ===");

    let config = LoopConfig {
        map_size: parse_env_i32(MAP_SIZE_ENV_VAR).unwrap_or(LoopConfig::default().map_size),
        ticks: parse_env_i32(TICKS_ENV_VAR)
            .and_then(|ticks| u32::try_from(ticks).ok())
            .unwrap_or(LoopConfig::default().ticks),
        rotation: parse_env_i32(ROTATION_ENV_VAR)
            .map(|raw| Rotation::from_index(raw as u8))
            .unwrap_or(Rotation::R0),
        ..LoopConfig::default()
    };

    let mut app = match std::env::var(LOAD_PATH_ENV_VAR) {
        Ok(path) => {
            let path = PathBuf::from(path);
            match load_world(&path) {
                Ok(state) => {
                    let mut registry = PaintRegistry::with_core_callbacks();
                    register_track_callbacks(&mut registry);
                    AppWiring {
                        state,
                        registry,
                        config,
                    }
                }
                Err(err) => {
                    error!(error = %err, path = %path.display(), "load_failed");
                    std::process::exit(1);
                }
            }
        }
        Err(_) => match build_app(config) {
            Ok(app) => app,
            Err(err) => {
                error!(error = %err, "startup_failed");
                std::process::exit(1);
            }
        },
    };

    let summary = run_simulation(&mut app.state, &app.registry, &app.config);
    info!(
        ticks = summary.ticks_run,
        frames = summary.frames_painted,
        draw_calls = summary.last_frame_draw_calls,
        checksum = %summary.entity_checksum,
        "run complete"
    );

    if let Ok(path) = std::env::var(SAVE_PATH_ENV_VAR) {
        let path = PathBuf::from(path);
        if let Err(err) = save_world(&mut app.state, &path) {
            error!(error = %err, path = %path.display(), "save_failed");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_env_i32(var: &str) -> Option<i32> {
    std::env::var(var).ok().and_then(|raw| raw.trim().parse().ok())
}
