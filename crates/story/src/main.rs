//! Headless attract-mode driver.
//!
//! The real host owns the window, the timing source and narrative playback;
//! this binary stands in for it during development: it steps every
//! challenge in story order at a fixed tick, renders into an off-screen
//! frame, and logs outcomes and transition requests.

mod challenges;
mod flow;

use kernel::{resolve_app_paths, Context, Frame, Outcome, SceneCommand, StartupError};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flow::{build_challenge, resolve_destination, FlowError, FLOW};

const WINDOW_SIZE: (u32, u32) = (960, 540);
const FIXED_DT: f32 = 1.0 / 60.0;
const MAX_FRAMES_PER_CHALLENGE: u32 = 60 * 20;
const DRAW_EVERY: u32 = 60;

#[derive(Debug, Error)]
enum DriverError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,story=debug")
        }))
        .init();

    if let Err(error) = run() {
        error!(%error, "driver_failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), DriverError> {
    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        data_dir = %paths.data_dir.display(),
        saves_dir = %paths.saves_dir.display(),
        "startup"
    );

    let mut ctx = Context::new(&paths);
    let loaded = ctx.progress.load();
    info!(loaded, chapter = ctx.progress.chapter(), "progress_loaded");

    let mut frame = Frame::new(WINDOW_SIZE.0, WINDOW_SIZE.1);
    for (index, id) in FLOW.iter().enumerate() {
        let mut challenge = build_challenge(*id, WINDOW_SIZE, index as u64 + 1, ctx.data_dir())?;

        let mut frames = 0;
        while frames < MAX_FRAMES_PER_CHALLENGE {
            ctx.tick(FIXED_DT);
            let command = challenge.update(FIXED_DT, &mut ctx);
            if frames % DRAW_EVERY == 0 {
                challenge.draw(&mut frame, &mut ctx);
                ctx.toasts.draw(&mut frame, &mut ctx.resources);
            }
            for sound in ctx.toasts.take_queued_sounds() {
                let present = ctx.resources.sound(&sound).is_some();
                info!(sound = %sound, present, "sound_requested");
            }
            frames += 1;

            if let SceneCommand::Transition(request) = command {
                let destination = resolve_destination(&request, &mut ctx)?;
                info!(
                    challenge = id.key(),
                    outcome = ?challenge.outcome(),
                    destination = destination.key(),
                    "transition_request_resolved"
                );
                break;
            }
        }

        info!(
            challenge = id.key(),
            frames,
            outcome = ?challenge.outcome(),
            "attract_run_finished"
        );
    }

    info!(
        chapter = ctx.progress.chapter(),
        achievements = ctx.progress.achievements().count(),
        "attract_mode_complete"
    );
    Ok(())
}

#[cfg(test)]
mod test_support {
    use kernel::{AppPaths, Context};

    /// Context rooted in a fresh temp directory; keep the guard alive for
    /// the duration of the test.
    pub fn test_context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths {
            root: dir.path().to_path_buf(),
            assets_dir: dir.path().join("assets"),
            data_dir: dir.path().join("data"),
            saves_dir: dir.path().join("saves"),
        };
        let ctx = Context::new(&paths);
        (dir, ctx)
    }
}
