use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod anim;
pub mod context;
pub mod frame;
pub mod input;
pub mod narrative;
pub mod outcome;
pub mod persist;
pub mod resources;
pub mod scene;
pub mod sim;
pub mod text;
pub mod toast;

pub use anim::{Facing, FacingAnim};
pub use context::Context;
pub use frame::{Color, Frame};
pub use input::{InputEvent, InputState, Key};
pub use narrative::{load_script, Script, ScriptError, Slide, SlideFx, SlideKind, SlideSide};
pub use outcome::{Conclusion, Outcome, OutcomeCell};
pub use persist::{ProgressStore, SaveError};
pub use resources::{FontFace, ImageData, Resources, SoundClip};
pub use scene::{
    Challenge, ChallengeId, SceneCommand, SceneId, TransitionRequest, UnknownSceneKey,
};
pub use sim::grid::{LevelError, PassGrid, Tile};
pub use sim::spawn::{Curve, HazardPhase, LaneHazard, LaneSpawner, LaneTuning, WaveClock};
pub use sim::steering::{Wanderer, WanderTuning};
pub use sim::{circles_touch, Rect, Vec2, DIR_FALLBACK};
pub use toast::{ToastSpec, ToastStack, ToastStyle, ToastView};

pub const ROOT_ENV_VAR: &str = "STORY_ROOT";

/// Directories the kernel and its host read from and write to.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub data_dir: PathBuf,
    pub saves_dir: PathBuf,
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
    #[error("failed to create saves directory at {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "STORY_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or data/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or data/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/story\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    let data_dir = root.join("data");
    let saves_dir = root.join("saves");

    fs::create_dir_all(&saves_dir).map_err(|source| StartupError::CreateSavesDir {
        path: saves_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        assets_dir,
        data_dir,
        saves_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
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

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
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

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_data = path.join("data").is_dir();

    cargo_toml && (has_crates || has_data)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
