//! Narrative script data: ordered slide records loaded by filename.
//!
//! Playback belongs to the host. The kernel only parses the data and
//! resolves the optional `next` scene-key override through the closed
//! scene table, so a broken content reference fails loudly at load time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::scene::{SceneId, UnknownSceneKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    #[default]
    Plain,
    Dialog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideFx {
    Fade,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Slide {
    #[serde(rename = "type", default)]
    pub kind: SlideKind,
    #[serde(default)]
    pub bg: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub portrait: Option<String>,
    #[serde(default)]
    pub side: Option<SlideSide>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub fx: Option<SlideFx>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    slides: Vec<Slide>,
    next: Option<String>,
}

impl Script {
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Destination after this script: the script's own `next` key when
    /// present (resolved through the closed scene table), otherwise the
    /// caller's fallback.
    pub fn resolved_next(&self, fallback: SceneId) -> Result<SceneId, UnknownSceneKey> {
        match &self.next {
            Some(key) => SceneId::from_key(key),
            None => Ok(fallback),
        }
    }
}

// Scripts historically shipped either as a bare slide array or wrapped with
// metadata; both forms stay readable.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Wrapped {
        slides: Vec<Slide>,
        #[serde(default)]
        next: Option<String>,
    },
    Bare(Vec<Slide>),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse script {path} at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("script {path} has no slides")]
    Empty { path: PathBuf },
}

pub fn load_script(data_dir: &Path, file: &str) -> Result<Script, ScriptError> {
    let path = data_dir.join(file);
    let text = fs::read_to_string(&path).map_err(|source| ScriptError::Read {
        path: path.clone(),
        source,
    })?;
    parse_script(&text, &path)
}

fn parse_script(text: &str, path: &Path) -> Result<Script, ScriptError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let parsed: ScriptFile =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let location = error.path().to_string();
            ScriptError::Parse {
                path: path.to_path_buf(),
                location,
                source: error.into_inner(),
            }
        })?;

    let script = match parsed {
        ScriptFile::Wrapped { slides, next } => Script { slides, next },
        ScriptFile::Bare(slides) => Script { slides, next: None },
    };
    if script.slides.is_empty() {
        return Err(ScriptError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ChallengeId;

    fn parse(text: &str) -> Result<Script, ScriptError> {
        parse_script(text, Path::new("test.json"))
    }

    #[test]
    fn wrapped_scripts_parse_with_next_override() {
        let script = parse(
            r#"{
                "slides": [
                    { "bg": "alley.png", "text": "It is raining again.", "fx": "fade" },
                    { "type": "dialog", "speaker": "Mara", "portrait": "portraits/mara.png",
                      "side": "left", "text": "Keep moving." }
                ],
                "next": "storm"
            }"#,
        )
        .expect("parses");

        assert_eq!(script.slides().len(), 2);
        assert_eq!(script.slides()[0].kind, SlideKind::Plain);
        assert_eq!(script.slides()[0].fx, Some(SlideFx::Fade));
        assert_eq!(script.slides()[1].kind, SlideKind::Dialog);
        assert_eq!(script.slides()[1].side, Some(SlideSide::Left));
        assert_eq!(
            script.resolved_next(SceneId::Menu),
            Ok(SceneId::Challenge(ChallengeId::Storm))
        );
    }

    #[test]
    fn bare_slide_arrays_still_parse() {
        let script = parse(r#"[ { "text": "The hall empties out." } ]"#).expect("parses");
        assert_eq!(script.slides().len(), 1);
        assert_eq!(script.resolved_next(SceneId::Epilogue), Ok(SceneId::Epilogue));
    }

    #[test]
    fn unknown_next_key_fails_loudly() {
        let script = parse(
            r#"{ "slides": [ { "text": "..." } ], "next": "chapter_99" }"#,
        )
        .expect("parses");
        assert_eq!(
            script.resolved_next(SceneId::Menu),
            Err(UnknownSceneKey("chapter_99".to_string()))
        );
    }

    #[test]
    fn empty_scripts_are_a_content_error() {
        let error = parse(r#"{ "slides": [] }"#).expect_err("empty");
        assert!(matches!(error, ScriptError::Empty { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let error = parse(r#"{ "slides": [ { "fx": "#).expect_err("truncated");
        assert!(matches!(error, ScriptError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = load_script(dir.path(), "nope.json").expect_err("missing");
        assert!(matches!(error, ScriptError::Read { .. }));
    }

    #[test]
    fn load_reads_from_the_data_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("intro.json"),
            r#"{ "slides": [ { "text": "hello" } ] }"#,
        )
        .expect("write");
        let script = load_script(dir.path(), "intro.json").expect("loads");
        assert_eq!(script.slides()[0].text, "hello");
    }
}
