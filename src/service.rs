//! Request boundary: turns a compose request into a stored strip.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    assets::{AssetKind, AssetLibrary, Graphic},
    chroma::BackgroundSpec,
    code::CodeEncoder,
    config::{BoothConfig, UnknownTemplatePolicy},
    foundation::error::{BoothError, BoothResult},
    layout::{LayoutCatalog, LayoutTemplate},
    preview::session::PreviewOpts,
    strip::{CompositionResult, Overlays, StripCompositor, output::OutputStore},
};

/// One compose call: encoded stills in slot order plus optional asset ids.
#[derive(Clone, Debug, Default)]
pub struct ComposeRequest {
    pub images: Vec<Vec<u8>>,
    /// Empty selects the catalog default.
    pub template_id: String,
    pub frame_id: Option<String>,
    /// Accepted for parity with the capture flow; the background is applied live, not here.
    pub background_id: Option<String>,
    pub logo_id: Option<String>,
}

/// JSON form of [`ComposeRequest`], with image paths relative to the file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequestFile {
    pub images: Vec<PathBuf>,
    #[serde(default, alias = "template")]
    pub template_id: Option<String>,
    #[serde(default, alias = "frame")]
    pub frame_id: Option<String>,
    #[serde(default, alias = "background")]
    pub background_id: Option<String>,
    #[serde(default, alias = "logo")]
    pub logo_id: Option<String>,
}

impl ComposeRequestFile {
    pub fn load(path: &Path) -> BoothResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| BoothError::io(format!("read request '{}'", path.display()), e))?;
        serde_json::from_str(&json)
            .map_err(|e| BoothError::invalid_input(format!("malformed request: {e}")))
    }

    /// Read every referenced image, resolving relative paths against `base_dir`.
    pub fn into_request(self, base_dir: &Path) -> BoothResult<ComposeRequest> {
        let images = self
            .images
            .iter()
            .map(|p| {
                let path = if p.is_absolute() {
                    p.clone()
                } else {
                    base_dir.join(p)
                };
                std::fs::read(&path)
                    .map_err(|e| BoothError::io(format!("read photo '{}'", path.display()), e))
            })
            .collect::<BoothResult<Vec<_>>>()?;

        Ok(ComposeRequest {
            images,
            template_id: self.template_id.unwrap_or_default(),
            frame_id: self.frame_id,
            background_id: self.background_id,
            logo_id: self.logo_id,
        })
    }
}

/// Everything needed to serve compose requests, built once from [`BoothConfig`].
#[derive(Clone, Debug)]
pub struct Booth {
    config: BoothConfig,
    catalog: LayoutCatalog,
    assets: AssetLibrary,
    compositor: StripCompositor,
}

impl Booth {
    pub fn from_config(config: BoothConfig) -> BoothResult<Self> {
        config.validate()?;
        let catalog = match &config.templates_path {
            Some(path) => LayoutCatalog::from_path(path)?,
            None => LayoutCatalog::builtin()?,
        };
        let catalog = match &config.default_template {
            Some(id) => catalog.with_default(id)?,
            None => catalog,
        };
        Ok(Self::with_catalog(config, catalog))
    }

    pub fn with_catalog(config: BoothConfig, catalog: LayoutCatalog) -> Self {
        let store = OutputStore::new(&config.output_dir, &config.public_base_url)
            .with_filename_prefix(&config.output.filename_prefix);
        let compositor = StripCompositor::new(
            store,
            CodeEncoder::new(config.code.size_px, config.code.margin),
        )
        .with_jpeg_quality(config.output.jpeg_quality);

        tracing::info!(
            templates = catalog.templates().len(),
            default_template = catalog.default_id(),
            output_dir = %config.output_dir.display(),
            "booth ready"
        );
        Self {
            assets: AssetLibrary::new(&config.asset_root),
            config,
            catalog,
            compositor,
        }
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    pub fn catalog(&self) -> &LayoutCatalog {
        &self.catalog
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    /// Resolve a requested template id under the configured unknown-template policy.
    pub fn resolve_template(&self, id: &str) -> BoothResult<&LayoutTemplate> {
        if id.trim().is_empty() {
            return Ok(self.catalog.default_template());
        }
        match self.config.unknown_template {
            UnknownTemplatePolicy::Fallback => Ok(self.catalog.resolve(id)),
            UnknownTemplatePolicy::Reject => self.catalog.resolve_strict(id),
        }
    }

    /// Preview settings for capturing photos for `template_id`.
    pub fn preview_opts(&self, template_id: &str) -> BoothResult<PreviewOpts> {
        let template = self.resolve_template(template_id)?;
        Ok(PreviewOpts {
            capture_count: template.capture_count,
            intensity: self.config.preview.intensity,
            keying: false,
            capture_quality: self.config.preview.capture_quality,
        })
    }

    /// Background for live replacement, by asset id.
    pub fn background(&self, id: &str) -> BoothResult<BackgroundSpec> {
        self.assets.load_background(id)
    }

    #[tracing::instrument(skip_all, fields(template = %request.template_id, supplied = request.images.len()))]
    pub fn process(&self, request: &ComposeRequest) -> BoothResult<CompositionResult> {
        let template = self.resolve_template(&request.template_id)?;
        if !template.accepts(request.images.len()) {
            return Err(BoothError::invalid_input(format!(
                "template '{}' needs {} photos, {} supplied",
                template.id,
                template.select_count,
                request.images.len()
            )));
        }
        if let Some(bg) = &request.background_id {
            tracing::debug!(background = %bg, "background was applied at capture time");
        }

        let frame = if template.has_frame {
            self.overlay(AssetKind::Frame, request.frame_id.as_deref())
        } else {
            None
        };
        let logo = if template.logo_position.is_some() {
            self.overlay(AssetKind::Logo, request.logo_id.as_deref())
        } else {
            None
        };

        self.compositor.compose(
            &request.images,
            template,
            Overlays {
                logo: logo.as_ref(),
                frame: frame.as_ref(),
            },
        )
    }

    // Overlays never fail a request.
    fn overlay(&self, kind: AssetKind, id: Option<&str>) -> Option<Graphic> {
        match self.assets.load_optional(kind, id) {
            Ok(g) => g,
            Err(err) => {
                tracing::warn!(kind = kind.dir_name(), error = %err, "overlay unreadable, skipping");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn booth(dir: &Path, policy: UnknownTemplatePolicy) -> Booth {
        let cfg = BoothConfig {
            output_dir: dir.join("out"),
            asset_root: dir.join("assets"),
            unknown_template: policy,
            ..BoothConfig::default()
        };
        Booth::from_config(cfg).unwrap()
    }

    #[test]
    fn template_policy_controls_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let lenient = booth(dir.path(), UnknownTemplatePolicy::Fallback);
        assert_eq!(lenient.resolve_template("nope").unwrap().id, "classic-2x3");
        assert_eq!(lenient.resolve_template("").unwrap().id, "classic-2x3");

        let strict = booth(dir.path(), UnknownTemplatePolicy::Reject);
        assert_eq!(
            strict.resolve_template("nope").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(strict.resolve_template("").unwrap().id, "classic-2x3");
    }

    #[test]
    fn preview_opts_follow_template() {
        let dir = tempfile::tempdir().unwrap();
        let b = booth(dir.path(), UnknownTemplatePolicy::Fallback);
        assert_eq!(b.preview_opts("horizontal-single").unwrap().capture_count, 5);
        assert_eq!(b.preview_opts("classic-2x3").unwrap().capture_count, 8);
    }

    #[test]
    fn short_request_fails_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let b = booth(dir.path(), UnknownTemplatePolicy::Fallback);
        let req = ComposeRequest {
            images: vec![vec![0u8; 4]; 5],
            template_id: "classic-2x3".to_owned(),
            ..ComposeRequest::default()
        };
        assert_eq!(b.process(&req).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn request_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"aaa").unwrap();
        let json = r#"{"images": ["a.jpg"], "template": "horizontal-single", "frame": "gold"}"#;
        std::fs::write(dir.path().join("req.json"), json).unwrap();

        let file = ComposeRequestFile::load(&dir.path().join("req.json")).unwrap();
        let req = file.into_request(dir.path()).unwrap();
        assert_eq!(req.images, vec![b"aaa".to_vec()]);
        assert_eq!(req.template_id, "horizontal-single");
        assert_eq!(req.frame_id.as_deref(), Some("gold"));

        let missing = ComposeRequestFile {
            images: vec![PathBuf::from("missing.jpg")],
            ..ComposeRequestFile::default()
        };
        assert_eq!(
            missing.into_request(dir.path()).unwrap_err().kind(),
            ErrorKind::IoFailure
        );
    }

    #[test]
    fn custom_registry_and_default_override() {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("templates.json");
        std::fs::write(&registry, include_str!("layout/builtin.json")).unwrap();
        let cfg = BoothConfig {
            templates_path: Some(registry),
            default_template: Some("horizontal-single".to_owned()),
            ..BoothConfig::default()
        };
        let b = Booth::from_config(cfg).unwrap();
        assert_eq!(b.catalog().default_id(), "horizontal-single");

        let cfg = BoothConfig {
            default_template: Some("missing".to_owned()),
            ..BoothConfig::default()
        };
        assert_eq!(
            Booth::from_config(cfg).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
