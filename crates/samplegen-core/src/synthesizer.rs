//! The synthesizer: a normalized model registry, a faker vocabulary, an asset
//! pool and one seeded RNG.
//!
//! Value- and resource-level operations live in `value.rs` and `resource.rs`;
//! this module holds the shared state and the small types they exchange.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::{Map, Value};

use samplegen_models::{Model, ModelRegistry, Resource};

use crate::assets::{AssetPool, RoundRobinPool};
use crate::error::Result;
use crate::fakers::{FakerContext, FakerRegistry};

/// Nesting limit for references. Optional references stop one level below
/// the top-level resource, so only cycles through inlined or required
/// references reach it.
pub const MAX_REFERENCE_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Upper bound for the number of elements in a synthesized array
    /// property. Each array gets between 1 and this many elements.
    pub max_array_items: usize,
    /// Clock for every date and timestamp faker.
    pub now: DateTime<Utc>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            max_array_items: 1,
            now: Utc::now(),
        }
    }
}

/// A value plus the standalone resources created to back its references.
///
/// Side effects are ordered so that every resource appears after the
/// resources it references.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized<T> {
    pub value: T,
    pub side_effects: Vec<Resource>,
}

impl<T> Synthesized<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            side_effects: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Synthesized<U> {
        Synthesized {
            value: f(self.value),
            side_effects: self.side_effects,
        }
    }

    /// Take over `other`'s side effects and hand back its value.
    pub fn absorb<U>(&mut self, other: Synthesized<U>) -> U {
        self.side_effects.extend(other.side_effects);
        other.value
    }
}

impl Synthesized<Resource> {
    /// Side effects first, then the resource itself.
    pub fn flatten(self) -> Vec<Resource> {
        let mut out = self.side_effects;
        out.push(self.value);
        out
    }
}

/// A fake person. Applied to every user-authored resource whose model
/// declares name fields, so one user's forms agree on who they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
}

const GIVEN_NAME_FIELDS: &[&str] = &["firstName", "givenName"];
const FAMILY_NAME_FIELDS: &[&str] = &["lastName", "surname"];

impl Profile {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Overwrite the name fields `model` declares.
    pub fn apply(&self, model: &Model, resource: &mut Resource) {
        for (fields, value) in [
            (GIVEN_NAME_FIELDS, &self.first_name),
            (FAMILY_NAME_FIELDS, &self.last_name),
        ] {
            for field in fields {
                if model.properties.contains_key(*field) {
                    resource.insert(*field, Value::String(value.clone()));
                }
            }
        }
    }
}

/// Who a resource (and everything synthesized for it) is attributed to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Authorship {
    /// Author identifier. Drawn from the `author` faker when unset.
    pub author: Option<String>,
    pub profile: Option<Profile>,
}

impl Authorship {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn by(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            profile: None,
        }
    }

    pub fn user(author: impl Into<String>, profile: Profile) -> Self {
        Self {
            author: Some(author.into()),
            profile: Some(profile),
        }
    }
}

/// Caller-side knobs for one resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceRequest {
    /// Properties to leave out.
    pub exclude: Vec<String>,
    /// Values fixed by the caller; applied before the link is computed.
    pub overrides: Map<String, Value>,
    pub authorship: Authorship,
}

impl ResourceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, property: impl Into<String>) -> Self {
        self.exclude.push(property.into());
        self
    }

    pub fn set(mut self, property: impl Into<String>, value: Value) -> Self {
        self.overrides.insert(property.into(), value);
        self
    }

    pub fn authored(mut self, authorship: Authorship) -> Self {
        self.authorship = authorship;
        self
    }
}

pub struct Synthesizer {
    pub(crate) models: Arc<ModelRegistry>,
    pub(crate) fakers: FakerRegistry,
    pub(crate) assets: Arc<dyn AssetPool>,
    pub(crate) options: SynthesisOptions,
    pub(crate) rng: StdRng,
    pub(crate) depth: usize,
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("models", &self.models.len())
            .field("fakers", &self.fakers)
            .field("assets", &self.assets.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Synthesizer {
    /// `models` must already be normalized.
    pub fn new(models: Arc<ModelRegistry>, seed: u64) -> Self {
        Self {
            models,
            fakers: FakerRegistry::builtin(),
            assets: Arc::new(RoundRobinPool::empty()),
            options: SynthesisOptions::default(),
            rng: StdRng::seed_from_u64(seed),
            depth: 0,
        }
    }

    pub fn with_fakers(mut self, fakers: FakerRegistry) -> Self {
        self.fakers = fakers;
        self
    }

    pub fn with_assets(mut self, assets: Arc<dyn AssetPool>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_options(mut self, options: SynthesisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn shared_models(&self) -> Arc<ModelRegistry> {
        Arc::clone(&self.models)
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    pub fn fakers_mut(&mut self) -> &mut FakerRegistry {
        &mut self.fakers
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Run one faker directive.
    pub fn fake(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let mut ctx = FakerContext {
            rng: &mut self.rng,
            assets: self.assets.as_ref(),
            now: self.options.now,
        };
        self.fakers.invoke(name, &mut ctx, args)
    }

    /// `fake` for directives known to yield strings.
    pub(crate) fn fake_string(&mut self, name: &str) -> Result<String> {
        Ok(match self.fake(name, &[])? {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }
}
