//! Persistent progress: chapter marker plus unlocked achievement keys.
//!
//! Saves are versioned JSON replaced atomically (write to a temp file, then
//! rename into place). A missing or unreadable save resets to defaults and
//! reports failure instead of raising; only the outcome machinery writes
//! here, at most once per terminal transition.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const SAVE_VERSION: u32 = 1;
const DEFAULT_SLOT: &str = "slot1.json";
const DEFAULT_CHAPTER: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SaveFile {
    save_version: u32,
    chapter: u32,
    achievements: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write save file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    chapter: u32,
    achievements: BTreeSet<String>,
}

impl ProgressStore {
    pub fn new(saves_dir: &Path) -> Self {
        Self::with_slot(saves_dir, DEFAULT_SLOT)
    }

    pub fn with_slot(saves_dir: &Path, slot: &str) -> Self {
        Self {
            path: saves_dir.join(slot),
            chapter: DEFAULT_CHAPTER,
            achievements: BTreeSet::new(),
        }
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn set_chapter(&mut self, chapter: u32) {
        self.chapter = chapter;
    }

    /// Unlocks an achievement. Returns true only the first time.
    pub fn award(&mut self, key: &str) -> bool {
        self.achievements.insert(key.to_string())
    }

    pub fn has(&self, key: &str) -> bool {
        self.achievements.contains(key)
    }

    pub fn achievements(&self) -> impl Iterator<Item = &str> {
        self.achievements.iter().map(String::as_str)
    }

    pub fn has_save(&self) -> bool {
        fs::metadata(&self.path)
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    pub fn save(&self) -> Result<(), SaveError> {
        let data = SaveFile {
            save_version: SAVE_VERSION,
            chapter: self.chapter,
            achievements: self.achievements.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&data)?;
        write_bytes_atomic(&self.path, json.as_bytes()).map_err(|source| SaveError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads the slot. On a missing or corrupt file the store resets to
    /// defaults and returns false; it never raises.
    pub fn load(&mut self) -> bool {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                self.reset();
                return false;
            }
            Err(error) => {
                if error.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), %error, "save_read_failed");
                }
                self.reset();
                return false;
            }
        };

        match serde_json::from_str::<SaveFile>(&text) {
            Ok(data) => {
                self.chapter = data.chapter;
                self.achievements = data.achievements.into_iter().collect();
                true
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "save_corrupt_resetting");
                self.reset();
                false
            }
        }
    }

    fn reset(&mut self) {
        self.chapter = DEFAULT_CHAPTER;
        self.achievements.clear();
    }
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    match fs::remove_file(final_path) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(tmp_path);
            return Err(error);
        }
    }

    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("save.tmp");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
