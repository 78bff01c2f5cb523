//! Explicit session context threaded through every challenge.
//!
//! Everything a challenge touches outside its own world state lives here:
//! the persistent progress store, the resource cache, the toast stack and
//! the held-input snapshot. Lifecycle is tied to the application session;
//! there is no ambient global state.

use std::path::PathBuf;

use crate::input::{InputEvent, InputState};
use crate::persist::ProgressStore;
use crate::resources::Resources;
use crate::toast::ToastStack;
use crate::AppPaths;

pub struct Context {
    pub progress: ProgressStore,
    pub resources: Resources,
    pub toasts: ToastStack,
    pub input: InputState,
    data_dir: PathBuf,
}

impl Context {
    pub fn new(paths: &AppPaths) -> Self {
        Self {
            progress: ProgressStore::new(&paths.saves_dir),
            resources: Resources::new(paths.assets_dir.clone()),
            toasts: ToastStack::default(),
            input: InputState::empty(),
            data_dir: paths.data_dir.clone(),
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Folds a discrete event into the held-key snapshot. Hosts call this
    /// before forwarding the event to the active challenge.
    pub fn apply_event(&mut self, event: &InputEvent) {
        self.input.apply(event);
    }

    /// Per-frame housekeeping independent of any challenge.
    pub fn tick(&mut self, dt: f32) {
        self.toasts.update(dt);
    }
}
