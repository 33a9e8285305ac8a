use torque_engine::{resolve_app_paths, LoopConfig, Scene};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{load_puzzle_config, ConfigError, PuzzleConfig, PUZZLE_CONFIG_FILE};
use super::puzzle;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Torque Startup ===");

    let puzzle_config = load_startup_config()?;
    let config = LoopConfig {
        window_title: "Torque".to_string(),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene: puzzle::build_scene(puzzle_config),
    })
}

fn load_startup_config() -> Result<PuzzleConfig, ConfigError> {
    match resolve_app_paths() {
        Ok(paths) => load_puzzle_config(&paths.asset(PUZZLE_CONFIG_FILE)),
        Err(error) => {
            warn!(error = %error, "project_root_unresolved_using_defaults");
            Ok(PuzzleConfig::default())
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
