use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod assembly;

pub use app::{
    run_app, screen_to_world, world_to_screen, AppError, Camera2D, InputAction, InputSnapshot,
    LoopConfig, LoopMetricsSnapshot, PlateRect, Renderer, Scene, SceneCommand, SceneWorld,
    UnitVisual, UnitVisuals, Viewport, CAP_HALF_EXTENTS, SHAFT_HALF_EXTENTS,
};
pub use assembly::{
    AimProvider, AssemblyBoard, AssemblyUnit, BoardError, Choreographer, ConfigValueError,
    CueStep, FeedbackSink, FixedStepClock, InteractionConfig, NodeArena, NodeError, NodeHandle,
    NodePose, NullFeedback, PickedUnit, PointerSample, PositionSpace, SequenceError,
    SequenceEvent, SequenceValidator, SoundKind, TickSource, TighteningConfig, UnitId, UnitState,
    Vec2, Vec3, VisualState,
};

pub const ROOT_ENV_VAR: &str = "TORQUE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppPaths {
    pub fn asset(&self, file_name: &str) -> PathBuf {
        self.assets_dir.join(file_name)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "TORQUE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/torque\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(app_paths_for_root(root))
}

pub fn app_paths_for_root(root: PathBuf) -> AppPaths {
    let assets_dir = root.join("assets");
    AppPaths { root, assets_dir }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("assets")).expect("assets");
        assert!(!is_repo_marker(dir.path()));

        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        assert!(is_repo_marker(dir.path()));
    }

    #[test]
    fn root_is_found_from_nested_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        fs::create_dir(dir.path().join("crates")).expect("crates");
        let nested = dir.path().join("target").join("debug");
        fs::create_dir_all(&nested).expect("nested");

        let found = find_root_above(&nested).expect("root");
        assert_eq!(found, normalize_path(dir.path()));
    }

    #[test]
    fn assets_live_under_root() {
        let paths = app_paths_for_root(PathBuf::from("/opt/torque"));
        assert_eq!(
            paths.asset("puzzle.json"),
            PathBuf::from("/opt/torque/assets/puzzle.json")
        );
    }
}
