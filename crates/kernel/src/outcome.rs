//! Terminal outcome state machine.
//!
//! `ongoing -> {won, lost}`, terminal, no further transitions. Settling
//! performs the full end-of-challenge sequence exactly once: unlocked
//! achievements go into the progress store, the store is saved
//! synchronously, an optional toast is queued, and a single transition
//! request is returned. Every later attempt is a no-op.

use tracing::{info, warn};

use crate::context::Context;
use crate::scene::{SceneCommand, TransitionRequest};
use crate::toast::ToastSpec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Ongoing,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }
}

/// The full effect of entering a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct Conclusion {
    pub outcome: Outcome,
    pub achievement: Option<&'static str>,
    pub chapter: Option<u32>,
    pub toast: Option<ToastSpec>,
    pub request: TransitionRequest,
}

impl Conclusion {
    pub fn won(request: TransitionRequest) -> Self {
        Self {
            outcome: Outcome::Won,
            achievement: None,
            chapter: None,
            toast: None,
            request,
        }
    }

    pub fn lost(request: TransitionRequest) -> Self {
        Self {
            outcome: Outcome::Lost,
            achievement: None,
            chapter: None,
            toast: None,
            request,
        }
    }

    pub fn with_achievement(mut self, key: &'static str) -> Self {
        self.achievement = Some(key);
        self
    }

    pub fn with_chapter(mut self, chapter: u32) -> Self {
        self.chapter = Some(chapter);
        self
    }

    pub fn with_toast(mut self, toast: ToastSpec) -> Self {
        self.toast = Some(toast);
        self
    }
}

#[derive(Debug, Default)]
pub struct OutcomeCell {
    outcome: Outcome,
}

impl OutcomeCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Outcome {
        self.outcome
    }

    pub fn is_ongoing(&self) -> bool {
        self.outcome == Outcome::Ongoing
    }

    /// Enters a terminal state. Returns the transition command on the first
    /// call only; once terminal, later conclusions are ignored.
    pub fn conclude(&mut self, ctx: &mut Context, conclusion: Conclusion) -> SceneCommand {
        debug_assert!(conclusion.outcome.is_terminal());
        if self.outcome.is_terminal() {
            return SceneCommand::None;
        }
        self.outcome = conclusion.outcome;

        if let Some(chapter) = conclusion.chapter {
            ctx.progress.set_chapter(chapter);
        }
        if let Some(key) = conclusion.achievement {
            if ctx.progress.award(key) {
                info!(achievement = key, "achievement_unlocked");
            }
        }
        if let Err(error) = ctx.progress.save() {
            warn!(%error, "progress_save_failed");
        }
        if let Some(toast) = conclusion.toast {
            ctx.toasts.push(toast);
        }

        info!(
            outcome = ?conclusion.outcome,
            destination = conclusion.request.destination.key(),
            script = conclusion.request.script.as_deref().unwrap_or(""),
            "challenge_concluded"
        );
        SceneCommand::Transition(conclusion.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ChallengeId, SceneId};
    use crate::AppPaths;

    fn test_context() -> (tempfile::TempDir, Context) {
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

    fn win_request() -> TransitionRequest {
        TransitionRequest::through_script("arena_end.json", SceneId::Challenge(ChallengeId::Stack))
    }

    #[test]
    fn outcome_starts_ongoing() {
        let cell = OutcomeCell::new();
        assert!(cell.is_ongoing());
        assert!(!cell.get().is_terminal());
    }

    #[test]
    fn first_conclusion_issues_exactly_one_transition() {
        let (_dir, mut ctx) = test_context();
        let mut cell = OutcomeCell::new();

        let first = cell.conclude(&mut ctx, Conclusion::won(win_request()));
        assert_eq!(first, SceneCommand::Transition(win_request()));
        assert_eq!(cell.get(), Outcome::Won);

        let second = cell.conclude(&mut ctx, Conclusion::won(win_request()));
        assert_eq!(second, SceneCommand::None);
    }

    #[test]
    fn terminal_state_never_changes_again() {
        let (_dir, mut ctx) = test_context();
        let mut cell = OutcomeCell::new();
        cell.conclude(&mut ctx, Conclusion::lost(win_request()));
        assert_eq!(cell.get(), Outcome::Lost);

        cell.conclude(&mut ctx, Conclusion::won(win_request()));
        assert_eq!(cell.get(), Outcome::Lost);
    }

    #[test]
    fn conclusion_awards_saves_and_toasts_once() {
        let (_dir, mut ctx) = test_context();
        let mut cell = OutcomeCell::new();
        let conclusion = Conclusion::won(win_request())
            .with_achievement("crowd_surfer")
            .with_chapter(2)
            .with_toast(ToastSpec::new("Achievement: Crowd Surfer"));

        cell.conclude(&mut ctx, conclusion.clone());
        assert!(ctx.progress.has("crowd_surfer"));
        assert_eq!(ctx.progress.chapter(), 2);
        assert_eq!(ctx.toasts.len(), 1);
        assert!(ctx.progress.has_save());

        cell.conclude(&mut ctx, conclusion);
        assert_eq!(ctx.toasts.len(), 1);
    }

    #[test]
    fn loss_without_achievement_still_saves_progress() {
        let (_dir, mut ctx) = test_context();
        let mut cell = OutcomeCell::new();
        cell.conclude(
            &mut ctx,
            Conclusion::lost(TransitionRequest::through_script(
                "arena_retry.json",
                SceneId::Challenge(ChallengeId::Arena),
            )),
        );
        assert!(ctx.progress.has_save());
        assert_eq!(ctx.progress.achievements().count(), 0);
    }
}
