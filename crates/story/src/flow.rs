//! Challenge registry and transition resolution.
//!
//! Scene identifiers are closed; everything string-keyed (script `next`
//! overrides) resolves through the kernel's table and fails loudly on an
//! unknown key.

use std::path::Path;

use kernel::{
    load_script, Challenge, ChallengeId, Context, SceneId, ScriptError, TransitionRequest,
    UnknownSceneKey,
};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;
use tracing::info;

use crate::challenges::{
    arena::Arena,
    breakout::Breakout,
    invaders::Invaders,
    maze::{Maze, MazeLoadError},
    rush::Rush,
    stack::Stack,
    storm::Storm,
};

/// Story order, first challenge to last.
pub const FLOW: [ChallengeId; 7] = [
    ChallengeId::Arena,
    ChallengeId::Stack,
    ChallengeId::Maze,
    ChallengeId::Invaders,
    ChallengeId::Breakout,
    ChallengeId::Rush,
    ChallengeId::Storm,
];

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    UnknownScene(#[from] UnknownSceneKey),
    #[error(transparent)]
    MazeLevels(#[from] MazeLoadError),
}

/// Instantiates a challenge for the registry entry.
pub fn build_challenge(
    id: ChallengeId,
    size: (u32, u32),
    seed: u64,
    data_dir: &Path,
) -> Result<Box<dyn Challenge>, FlowError> {
    let challenge: Box<dyn Challenge> = match id {
        ChallengeId::Arena => Box::new(Arena::new(size, seed)),
        ChallengeId::Stack => Box::new(Stack::new(size, seed)),
        ChallengeId::Maze => {
            let mut rng = Pcg32::seed_from_u64(seed);
            Box::new(Maze::load(data_dir, &mut rng)?)
        }
        ChallengeId::Invaders => Box::new(Invaders::new(size, seed)),
        ChallengeId::Breakout => Box::new(Breakout::new(size)),
        ChallengeId::Rush => Box::new(Rush::new(size, seed)),
        ChallengeId::Storm => Box::new(Storm::new(size, seed)),
    };
    info!(challenge = id.key(), "challenge_built");
    Ok(challenge)
}

/// Resolves where a transition request actually leads: loads the narrative
/// script when one is named and lets its `next` key override the default
/// destination. Narrative playback itself belongs to the host.
pub fn resolve_destination(
    request: &TransitionRequest,
    ctx: &mut Context,
) -> Result<SceneId, FlowError> {
    match &request.script {
        Some(file) => {
            let script = load_script(ctx.data_dir(), file)?;
            info!(
                script = file.as_str(),
                slides = script.slides().len(),
                "narrative_script_loaded"
            );
            Ok(script.resolved_next(request.destination)?)
        }
        None => Ok(request.destination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use kernel::Outcome;
    use std::fs;

    #[test]
    fn the_flow_covers_every_challenge_exactly_once() {
        let mut ids = FLOW.to_vec();
        ids.sort_by_key(|id| id.key());
        ids.dedup();
        assert_eq!(ids.len(), ChallengeId::ALL.len());
    }

    #[test]
    fn every_registry_entry_builds_an_ongoing_challenge() {
        let (dir, _ctx) = test_context();
        let maze_dir = dir.path().join("data").join("maze");
        fs::create_dir_all(&maze_dir).expect("mkdir");
        fs::write(maze_dir.join("maze01.txt"), "#####\n#S.E#\n#####").expect("write");

        for id in ChallengeId::ALL {
            let challenge = build_challenge(id, (960, 540), 3, &dir.path().join("data"))
                .expect("builds");
            assert_eq!(challenge.outcome(), Outcome::Ongoing);
        }
    }

    #[test]
    fn missing_maze_levels_surface_through_the_registry() {
        let (dir, _ctx) = test_context();
        let error = build_challenge(
            ChallengeId::Maze,
            (960, 540),
            3,
            &dir.path().join("data"),
        )
        .expect_err("no levels");
        assert!(matches!(error, FlowError::MazeLevels(_)));
    }

    #[test]
    fn transitions_without_scripts_resolve_directly() {
        let (_dir, mut ctx) = test_context();
        let request = TransitionRequest::to_scene(SceneId::Challenge(ChallengeId::Storm));
        assert_eq!(
            resolve_destination(&request, &mut ctx).expect("resolves"),
            SceneId::Challenge(ChallengeId::Storm)
        );
    }

    #[test]
    fn a_script_next_key_overrides_the_destination() {
        let (dir, mut ctx) = test_context();
        fs::create_dir_all(dir.path().join("data")).expect("mkdir");
        fs::write(
            dir.path().join("data").join("detour.json"),
            r#"{ "slides": [ { "text": "A knock at the door." } ], "next": "breakout" }"#,
        )
        .expect("write");

        let request =
            TransitionRequest::through_script("detour.json", SceneId::Challenge(ChallengeId::Maze));
        assert_eq!(
            resolve_destination(&request, &mut ctx).expect("resolves"),
            SceneId::Challenge(ChallengeId::Breakout)
        );
    }

    #[test]
    fn an_unknown_next_key_aborts_resolution() {
        let (dir, mut ctx) = test_context();
        fs::create_dir_all(dir.path().join("data")).expect("mkdir");
        fs::write(
            dir.path().join("data").join("broken.json"),
            r#"{ "slides": [ { "text": "..." } ], "next": "chapter_seven" }"#,
        )
        .expect("write");

        let request =
            TransitionRequest::through_script("broken.json", SceneId::Epilogue);
        let error = resolve_destination(&request, &mut ctx).expect_err("unknown key");
        assert!(matches!(error, FlowError::UnknownScene(_)));
    }

    #[test]
    fn a_missing_script_file_aborts_resolution() {
        let (_dir, mut ctx) = test_context();
        let request = TransitionRequest::through_script("ghost.json", SceneId::Epilogue);
        let error = resolve_destination(&request, &mut ctx).expect_err("missing script");
        assert!(matches!(error, FlowError::Script(_)));
    }
}
