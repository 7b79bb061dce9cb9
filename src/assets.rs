use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    chroma::BackgroundSpec,
    foundation::error::{BoothError, BoothResult},
};

pub mod decode;
pub mod encode;
pub mod svg_raster;

/// Overlay artwork (frames, logos, backgrounds) in either raster or vector form.
#[derive(Clone, Debug)]
pub enum Graphic {
    /// Straight-alpha RGBA as decoded.
    Raster(Arc<image::RgbaImage>),
    Svg(Arc<usvg::Tree>),
}

impl Graphic {
    pub fn intrinsic_size(&self) -> BoothResult<(u32, u32)> {
        match self {
            Self::Raster(img) => Ok(img.dimensions()),
            Self::Svg(tree) => svg_raster::svg_intrinsic_size(tree),
        }
    }

    /// Render to exactly `width x height` as premultiplied RGBA8, ignoring aspect ratio.
    pub fn render_premul(&self, width: u32, height: u32) -> BoothResult<image::RgbaImage> {
        match self {
            Self::Svg(tree) => svg_raster::rasterize_svg_to_premul_rgba8(tree, width, height),
            Self::Raster(img) => {
                if width == 0 || height == 0 {
                    return Err(BoothError::invalid_input(format!(
                        "cannot render graphic at {width}x{height}"
                    )));
                }
                let mut premul = img.as_ref().clone();
                decode::premultiply_rgba8_in_place(&mut premul);
                if premul.dimensions() == (width, height) {
                    return Ok(premul);
                }
                let mut out = image::imageops::resize(
                    &premul,
                    width,
                    height,
                    image::imageops::FilterType::Lanczos3,
                );
                // Lanczos ringing can push colour above alpha.
                for px in out.pixels_mut() {
                    let a = px[3];
                    px[0] = px[0].min(a);
                    px[1] = px[1].min(a);
                    px[2] = px[2].min(a);
                }
                Ok(out)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Frame,
    Background,
    Logo,
}

impl AssetKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Frame => "frames",
            Self::Background => "backgrounds",
            Self::Logo => "logos",
        }
    }
}

const ASSET_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "svg"];

/// Resolves asset ids to files under `{root}/{frames|backgrounds|logos}/`.
#[derive(Clone, Debug)]
pub struct AssetLibrary {
    root: PathBuf,
}

impl AssetLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the file for `id`. An id may carry its extension; otherwise the known extensions
    /// are tried in order.
    pub fn locate(&self, kind: AssetKind, id: &str) -> BoothResult<PathBuf> {
        let rel = normalize_rel_path(id)?;
        let dir = self.root.join(kind.dir_name());

        let direct = dir.join(&rel);
        if direct.is_file() {
            return Ok(direct);
        }
        for ext in ASSET_EXTENSIONS {
            let candidate = dir.join(format!("{rel}.{ext}"));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(BoothError::asset_missing(format!(
            "{} '{id}' not found under '{}'",
            kind.dir_name(),
            dir.display()
        )))
    }

    pub fn load(&self, kind: AssetKind, id: &str) -> BoothResult<Graphic> {
        let path = self.locate(kind, id)?;
        let bytes = std::fs::read(&path)
            .map_err(|e| BoothError::io(format!("read asset '{}'", path.display()), e))?;
        decode::decode_graphic(&bytes)
    }

    /// Like [`AssetLibrary::load`], but a missing asset is logged and yields `None`.
    pub fn load_optional(&self, kind: AssetKind, id: Option<&str>) -> BoothResult<Option<Graphic>> {
        let Some(id) = id.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        match self.load(kind, id) {
            Ok(g) => Ok(Some(g)),
            Err(err @ BoothError::AssetMissing(_)) => {
                tracing::warn!(kind = kind.dir_name(), id, error = %err, "asset missing, skipping");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Load a background for live replacement. Vector art is flattened onto white.
    pub fn load_background(&self, id: &str) -> BoothResult<BackgroundSpec> {
        match self.load(AssetKind::Background, id)? {
            Graphic::Raster(img) => Ok(BackgroundSpec::Image(img)),
            Graphic::Svg(tree) => {
                let (w, h) = svg_raster::svg_intrinsic_size(&tree)?;
                let mut img = svg_raster::rasterize_svg_to_premul_rgba8(&tree, w, h)?;
                for px in img.pixels_mut() {
                    let inv = 255 - px[3];
                    px[0] = px[0].saturating_add(inv);
                    px[1] = px[1].saturating_add(inv);
                    px[2] = px[2].saturating_add(inv);
                    px[3] = 255;
                }
                Ok(BackgroundSpec::image(img))
            }
        }
    }
}

pub(crate) fn normalize_rel_path(source: &str) -> BoothResult<String> {
    let s = source.trim().replace('\\', "/");
    if s.is_empty() {
        return Err(BoothError::invalid_input("asset id must be non-empty"));
    }
    if s.starts_with('/') || s.contains(':') {
        return Err(BoothError::invalid_input("asset ids must be relative"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(BoothError::invalid_input("asset ids must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(BoothError::invalid_input("asset id must contain a file name"));
    }
    Ok(out.join("/"))
}
