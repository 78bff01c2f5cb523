//! The per-frame challenge contract and the scene transition vocabulary.
//!
//! Scene identifiers are a closed enumeration: string keys coming from
//! narrative data resolve through [`SceneId::from_key`] and an unknown key
//! is a loud content error, never a silent no-op.

use thiserror::Error;

use crate::context::Context;
use crate::frame::Frame;
use crate::input::InputEvent;
use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeId {
    Arena,
    Stack,
    Maze,
    Invaders,
    Breakout,
    Rush,
    Storm,
}

impl ChallengeId {
    pub const ALL: [ChallengeId; 7] = [
        ChallengeId::Arena,
        ChallengeId::Stack,
        ChallengeId::Maze,
        ChallengeId::Invaders,
        ChallengeId::Breakout,
        ChallengeId::Rush,
        ChallengeId::Storm,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ChallengeId::Arena => "arena",
            ChallengeId::Stack => "stack",
            ChallengeId::Maze => "maze",
            ChallengeId::Invaders => "invaders",
            ChallengeId::Breakout => "breakout",
            ChallengeId::Rush => "rush",
            ChallengeId::Storm => "storm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneId {
    Menu,
    Epilogue,
    Challenge(ChallengeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scene key '{0}'")]
pub struct UnknownSceneKey(pub String);

impl SceneId {
    pub fn key(self) -> &'static str {
        match self {
            SceneId::Menu => "menu",
            SceneId::Epilogue => "epilogue",
            SceneId::Challenge(challenge) => challenge.key(),
        }
    }

    pub fn from_key(key: &str) -> Result<SceneId, UnknownSceneKey> {
        match key {
            "menu" => Ok(SceneId::Menu),
            "epilogue" => Ok(SceneId::Epilogue),
            other => ChallengeId::ALL
                .iter()
                .find(|challenge| challenge.key() == other)
                .map(|challenge| SceneId::Challenge(*challenge))
                .ok_or_else(|| UnknownSceneKey(other.to_string())),
        }
    }
}

/// Instruction handed to the host scene manager when a challenge ends.
/// The persistent state itself travels in the host-owned [`Context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Scene to activate once any narrative script has played.
    pub destination: SceneId,
    /// Narrative script to play first, if any. The script may override the
    /// destination with its own `next` key.
    pub script: Option<String>,
}

impl TransitionRequest {
    pub fn to_scene(destination: SceneId) -> Self {
        Self {
            destination,
            script: None,
        }
    }

    pub fn through_script(script: impl Into<String>, destination: SceneId) -> Self {
        Self {
            destination,
            script: Some(script.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Transition(TransitionRequest),
}

/// The capability set every mini-game exposes to its host. The host holds a
/// boxed instance and drives one update and one draw pass per frame.
pub trait Challenge: std::fmt::Debug {
    /// Consumes one discrete input event. Intent capture only.
    fn handle_event(&mut self, event: &InputEvent, ctx: &mut Context);

    /// Advances the simulation by `dt` seconds. Returns a transition
    /// command at most once per instance, on the terminal frame.
    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand;

    /// Paints the current world state. Must not mutate simulation state;
    /// the context is mutable only for resource cache fills.
    fn draw(&self, frame: &mut Frame, ctx: &mut Context);

    fn outcome(&self) -> Outcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scene_key_round_trips() {
        let mut ids = vec![SceneId::Menu, SceneId::Epilogue];
        ids.extend(ChallengeId::ALL.iter().map(|id| SceneId::Challenge(*id)));
        for id in ids {
            assert_eq!(SceneId::from_key(id.key()), Ok(id));
        }
    }

    #[test]
    fn unknown_scene_key_fails_loudly() {
        let error = SceneId::from_key("ch99").expect_err("unknown key");
        assert_eq!(error, UnknownSceneKey("ch99".to_string()));
        assert!(error.to_string().contains("ch99"));
    }

    #[test]
    fn transition_request_constructors() {
        let direct = TransitionRequest::to_scene(SceneId::Challenge(ChallengeId::Maze));
        assert_eq!(direct.script, None);

        let scripted = TransitionRequest::through_script(
            "arena_end.json",
            SceneId::Challenge(ChallengeId::Stack),
        );
        assert_eq!(scripted.script.as_deref(), Some("arena_end.json"));
        assert_eq!(scripted.destination, SceneId::Challenge(ChallengeId::Stack));
    }
}
