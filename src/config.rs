//! Booth configuration, loaded once at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    chroma::{INTENSITY_MAX, INTENSITY_MIN},
    code::{DEFAULT_CODE_MARGIN, DEFAULT_CODE_SIZE_PX},
    foundation::error::{BoothError, BoothResult},
    preview::capture::DEFAULT_CAPTURE_QUALITY,
    strip::{DEFAULT_JPEG_QUALITY, output::DEFAULT_FILENAME_PREFIX},
};

/// What to do when a request names a template the catalog does not know.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTemplatePolicy {
    /// Use the default template and log a warning.
    #[default]
    Fallback,
    /// Fail the request with `InvalidInput`.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// Directory finished strips are written to.
    pub output_dir: PathBuf,
    /// Base URL under which `output_dir` is served; encoded into the QR code.
    pub public_base_url: String,
    /// Root holding `frames/`, `backgrounds/` and `logos/`.
    pub asset_root: PathBuf,
    /// Template registry JSON; the built-in registry is used when unset.
    pub templates_path: Option<PathBuf>,
    /// Overrides the registry's default template.
    pub default_template: Option<String>,
    pub unknown_template: UnknownTemplatePolicy,
    pub output: OutputConfig,
    pub code: CodeConfig,
    pub preview: PreviewConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub jpeg_quality: u8,
    pub filename_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub size_px: u32,
    pub margin: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub intensity: f64,
    pub capture_quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `"info"` or `"boothkit=debug,warn"`. `RUST_LOG` wins when set.
    pub level: String,
    pub json: bool,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("public/outputs"),
            public_base_url: "http://localhost:3001/static/outputs".to_owned(),
            asset_root: PathBuf::from("public"),
            templates_path: None,
            default_template: None,
            unknown_template: UnknownTemplatePolicy::default(),
            output: OutputConfig::default(),
            code: CodeConfig::default(),
            preview: PreviewConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_owned(),
        }
    }
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            size_px: DEFAULT_CODE_SIZE_PX,
            margin: DEFAULT_CODE_MARGIN,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            intensity: 50.0,
            capture_quality: DEFAULT_CAPTURE_QUALITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl BoothConfig {
    /// Read a JSON config file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> BoothResult<Self> {
        let cfg = match path {
            None => Self::default(),
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| BoothError::io(format!("read config '{}'", path.display()), e))?;
                serde_json::from_str(&json).map_err(|e| {
                    BoothError::validation(format!("config '{}' is not valid: {e}", path.display()))
                })?
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> BoothResult<()> {
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(BoothError::validation(format!(
                "output.jpeg_quality must be in 1..=100, got {}",
                self.output.jpeg_quality
            )));
        }
        if !(1..=100).contains(&self.preview.capture_quality) {
            return Err(BoothError::validation(format!(
                "preview.capture_quality must be in 1..=100, got {}",
                self.preview.capture_quality
            )));
        }
        if self.output.filename_prefix.is_empty()
            || self
                .output
                .filename_prefix
                .contains(|c: char| c == '/' || c == '\\' || c == '.')
        {
            return Err(BoothError::validation(
                "output.filename_prefix must be a non-empty plain name",
            ));
        }
        if self.code.size_px == 0 {
            return Err(BoothError::validation("code.size_px must be > 0"));
        }
        if !(INTENSITY_MIN..=INTENSITY_MAX).contains(&self.preview.intensity) {
            return Err(BoothError::validation(format!(
                "preview.intensity must be in {INTENSITY_MIN}..={INTENSITY_MAX}, got {}",
                self.preview.intensity
            )));
        }
        if self.public_base_url.trim().is_empty() {
            return Err(BoothError::validation("public_base_url must be non-empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn defaults_match_booth_constants() {
        let cfg = BoothConfig::load(None).unwrap();
        assert_eq!(cfg.output.jpeg_quality, 95);
        assert_eq!(cfg.code.size_px, 300);
        assert_eq!(cfg.code.margin, 2);
        assert_eq!(cfg.unknown_template, UnknownTemplatePolicy::Fallback);
        assert_eq!(cfg.output.filename_prefix, "photostrip");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.json");
        std::fs::write(
            &path,
            r#"{"unknown_template": "reject", "output": {"jpeg_quality": 80}}"#,
        )
        .unwrap();
        let cfg = BoothConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.unknown_template, UnknownTemplatePolicy::Reject);
        assert_eq!(cfg.output.jpeg_quality, 80);
        assert_eq!(cfg.output.filename_prefix, "photostrip");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut cfg = BoothConfig::default();
        cfg.output.jpeg_quality = 0;
        assert_eq!(cfg.validate().unwrap_err().kind(), ErrorKind::Validation);

        let mut cfg = BoothConfig::default();
        cfg.preview.intensity = 120.0;
        assert!(cfg.validate().is_err());

        let mut cfg = BoothConfig::default();
        cfg.output.filename_prefix = "../evil".to_owned();
        assert!(cfg.validate().is_err());

        let mut cfg = BoothConfig::default();
        cfg.code.size_px = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unreadable_or_malformed_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(
            BoothConfig::load(Some(&missing)).unwrap_err().kind(),
            ErrorKind::IoFailure
        );

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert_eq!(
            BoothConfig::load(Some(&bad)).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
