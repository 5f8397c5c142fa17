//! Run configuration (`samplegen.json`).
//!
//! ```json
//! {
//!   "output": "out/samples.json",
//!   "models": "models/custom.json",
//!   "extension": "fakers.json",
//!   "users": 3,
//!   "products": ["tradle.CurrentAccount"],
//!   "seed": 42
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use samplegen_models::{ModelRegistry, RegistryBuilder};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModelsSource {
    /// JSON file holding a registry.
    Path(PathBuf),
    /// Registry written inline (object keyed by id, or array).
    Inline(serde_json::Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub output: Option<PathBuf>,
    /// Custom models layered over the bundled base registry.
    pub models: Option<ModelsSource>,
    /// `{ "<directive>": [choice, ...] }` pick-one fakers.
    pub extension: Option<PathBuf>,
    /// Exact number of samples per model id.
    pub types: Option<BTreeMap<String, usize>>,
    /// Number of simulated users (full application workflows).
    pub users: Option<usize>,
    pub products: Option<Vec<String>>,
    pub seed: Option<u64>,
    pub organization: Option<String>,
    /// Directory of `{"dataUri": ...}` face images.
    pub faces: Option<PathBuf>,
    #[serde(default)]
    pub form_requests: bool,
    pub max_array_items: Option<usize>,
    /// Fixed clock, for reproducible dates.
    pub now: Option<DateTime<Utc>>,
}

/// What a run generates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Types(BTreeMap<String, usize>),
    Users(usize),
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        let paths = [
            self.output.as_mut(),
            self.extension.as_mut(),
            self.faces.as_mut(),
        ];
        for path in paths.into_iter().flatten() {
            resolve(path);
        }
        if let Some(ModelsSource::Path(p)) = self.models.as_mut() {
            resolve(p);
        }
    }

    pub fn plan(&self) -> Result<Plan> {
        match (&self.types, self.users) {
            (Some(_), Some(_)) => bail!("config sets both `types` and `users`; pick one"),
            (Some(types), None) => Ok(Plan::Types(types.clone())),
            (None, Some(users)) => Ok(Plan::Users(users)),
            (None, None) => bail!("config needs either `types` or `users`"),
        }
    }

    /// Base registry with the configured custom models layered on top.
    pub fn registry(&self) -> Result<ModelRegistry> {
        let base = ModelRegistry::base().context("bundled base models are invalid")?;
        let custom = match &self.models {
            None => return Ok(base),
            Some(ModelsSource::Path(path)) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read models {}", path.display()))?;
                ModelRegistry::from_json_str(&text)
                    .with_context(|| format!("invalid models in {}", path.display()))?
            }
            Some(ModelsSource::Inline(value)) => {
                ModelRegistry::from_value(value.clone()).context("invalid inline models")?
            }
        };
        tracing::debug!(custom = custom.len(), "layering custom models");
        Ok(RegistryBuilder::new().add(base).add(custom).build())
    }

    pub fn extension(&self) -> Result<Option<serde_json::Value>> {
        let Some(path) = &self.extension else {
            return Ok(None);
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read faker extension {}", path.display()))?;
        let value = serde_json::from_str(&text)
            .with_context(|| format!("invalid faker extension {}", path.display()))?;
        Ok(Some(value))
    }

    pub fn output(&self) -> Result<&Path> {
        self.output
            .as_deref()
            .ok_or_else(|| anyhow!("no output path: set `output` in the config or pass --output"))
    }
}
