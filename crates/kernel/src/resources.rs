//! Caching resource loader.
//!
//! Every lookup is cached by key, including failures, so a missing optional
//! asset costs one disk probe and one warning. Callers branch on presence;
//! nothing here is fatal.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::warn;

use crate::frame::{Color, Frame};
use crate::text;

#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Raw encoded audio bytes. Playback belongs to the host's audio sink.
#[derive(Debug, Clone)]
pub struct SoundClip {
    pub bytes: Vec<u8>,
}

/// Text renderer resolved through the font cache. The glyphs themselves are
/// the built-in bitmap set; a missing font file only changes the log, never
/// the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFace {
    scale: i32,
}

impl FontFace {
    pub fn measure(&self, text: &str) -> (i32, i32) {
        text::measure(text, self.scale)
    }

    pub fn line_height(&self) -> i32 {
        text::line_advance(self.scale)
    }

    pub fn draw(&self, frame: &mut Frame, x: i32, y: i32, text: &str, color: Color) {
        text::draw_text(frame, x, y, text, self.scale, color);
    }
}

#[derive(Debug)]
pub struct Resources {
    asset_root: PathBuf,
    images: HashMap<String, Option<ImageData>>,
    sounds: HashMap<String, Option<SoundClip>>,
    fonts: HashMap<(String, u32), FontFace>,
    warned_missing: HashSet<String>,
}

impl Resources {
    pub fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            images: HashMap::new(),
            sounds: HashMap::new(),
            fonts: HashMap::new(),
            warned_missing: HashSet::new(),
        }
    }

    /// Decoded image from `assets/img/<name>`, or None when absent/broken.
    pub fn image(&mut self, name: &str) -> Option<&ImageData> {
        if !self.images.contains_key(name) {
            let path = self.asset_root.join("img").join(name);
            let loaded = match load_image_rgba(&path) {
                Ok(image) => Some(image),
                Err(reason) => {
                    warn_once(&mut self.warned_missing, "image", name, &path, &reason);
                    None
                }
            };
            self.images.insert(name.to_string(), loaded);
        }
        self.images.get(name).and_then(Option::as_ref)
    }

    /// Sound bytes from `assets/sfx/<name>`, or None when absent.
    pub fn sound(&mut self, name: &str) -> Option<&SoundClip> {
        if !self.sounds.contains_key(name) {
            let path = self.asset_root.join("sfx").join(name);
            let loaded = match fs::read(&path) {
                Ok(bytes) => Some(SoundClip { bytes }),
                Err(error) => {
                    warn_once(
                        &mut self.warned_missing,
                        "sound",
                        name,
                        &path,
                        &error.to_string(),
                    );
                    None
                }
            };
            self.sounds.insert(name.to_string(), loaded);
        }
        self.sounds.get(name).and_then(Option::as_ref)
    }

    /// Text renderer for the requested face and pixel size, cached by key.
    /// Always succeeds: an absent font file logs once and falls back to the
    /// built-in glyphs.
    pub fn font(&mut self, name: &str, size: u32) -> FontFace {
        let key = (name.to_string(), size);
        if let Some(face) = self.fonts.get(&key) {
            return *face;
        }
        let path = self.asset_root.join("fonts").join(name);
        if !path.is_file() {
            warn_once(
                &mut self.warned_missing,
                "font",
                name,
                &path,
                "file not found, using built-in glyphs",
            );
        }
        let scale = (size as i32 / (text::GLYPH_HEIGHT + 2)).max(1);
        let face = FontFace { scale };
        self.fonts.insert(key, face);
        face
    }

    #[cfg(test)]
    fn cached_image_misses(&self) -> usize {
        self.images.values().filter(|slot| slot.is_none()).count()
    }
}

fn load_image_rgba(path: &Path) -> Result<ImageData, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(ImageData {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_once(
    warned: &mut HashSet<String>,
    kind: &'static str,
    name: &str,
    path: &Path,
    reason: &str,
) {
    let key = format!("{kind}:{name}");
    if !warned.insert(key) {
        return;
    }
    warn!(
        kind,
        name,
        path = %path.display(),
        reason,
        "resource_load_failed_degrading"
    );
}
