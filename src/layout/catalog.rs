use std::{collections::BTreeMap, path::Path};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{BoothError, BoothResult},
    layout::{FrameSize, LayoutTemplate},
};

const BUILTIN_REGISTRY: &str = include_str!("builtin.json");

/// On-disk registry document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryFile {
    /// Template used when a lookup misses.
    pub default: String,
    pub templates: Vec<LayoutTemplate>,
}

/// Public listing entry for a template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capture_count: usize,
    pub select_count: usize,
    pub frame_size: FrameSize,
}

/// Validated, immutable set of layout templates.
#[derive(Clone, Debug)]
pub struct LayoutCatalog {
    // Registry order is kept for listings.
    templates: Vec<LayoutTemplate>,
    index: BTreeMap<String, usize>,
    default_idx: usize,
}

impl LayoutCatalog {
    /// The two templates shipped with the booth; `classic-2x3` is the default.
    pub fn builtin() -> BoothResult<Self> {
        Self::from_json(BUILTIN_REGISTRY)
    }

    pub fn from_json(json: &str) -> BoothResult<Self> {
        let file: RegistryFile = serde_json::from_str(json)
            .map_err(|e| BoothError::validation(format!("template registry is not valid: {e}")))?;
        Self::from_templates(file.templates, &file.default)
    }

    pub fn from_path(path: &Path) -> BoothResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read template registry '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn from_templates(templates: Vec<LayoutTemplate>, default_id: &str) -> BoothResult<Self> {
        if templates.is_empty() {
            return Err(BoothError::validation("template registry is empty"));
        }

        let mut index = BTreeMap::new();
        for (i, t) in templates.iter().enumerate() {
            t.validate()?;
            if index.insert(t.id.clone(), i).is_some() {
                return Err(BoothError::validation(format!(
                    "duplicate template id '{}'",
                    t.id
                )));
            }
        }
        let default_idx = *index.get(default_id).ok_or_else(|| {
            BoothError::validation(format!("default template '{default_id}' is not registered"))
        })?;

        tracing::debug!(templates = templates.len(), default = default_id, "layout catalog loaded");
        Ok(Self {
            templates,
            index,
            default_idx,
        })
    }

    /// Same templates with a different default.
    pub fn with_default(mut self, default_id: &str) -> BoothResult<Self> {
        self.default_idx = *self.index.get(default_id).ok_or_else(|| {
            BoothError::validation(format!("default template '{default_id}' is not registered"))
        })?;
        Ok(self)
    }

    pub fn default_id(&self) -> &str {
        &self.templates[self.default_idx].id
    }

    pub fn default_template(&self) -> &LayoutTemplate {
        &self.templates[self.default_idx]
    }

    pub fn get(&self, id: &str) -> Option<&LayoutTemplate> {
        self.index.get(id).map(|&i| &self.templates[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up `id`, falling back to the default template when it is unknown.
    pub fn resolve(&self, id: &str) -> &LayoutTemplate {
        match self.get(id) {
            Some(t) => t,
            None => {
                tracing::warn!(
                    requested = id,
                    fallback = self.default_id(),
                    "unknown template, using default"
                );
                self.default_template()
            }
        }
    }

    /// Look up `id` without fallback.
    pub fn resolve_strict(&self, id: &str) -> BoothResult<&LayoutTemplate> {
        self.get(id)
            .ok_or_else(|| BoothError::invalid_input(format!("unknown template '{id}'")))
    }

    /// Whether `supplied` photos satisfy the (resolved) template.
    pub fn validate(&self, id: &str, supplied: usize) -> bool {
        self.resolve(id).accepts(supplied)
    }

    pub fn templates(&self) -> &[LayoutTemplate] {
        &self.templates
    }

    pub fn summaries(&self) -> Vec<TemplateSummary> {
        self.templates.iter().map(LayoutTemplate::summary).collect()
    }
}
