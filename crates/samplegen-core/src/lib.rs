//! samplegen synthesis engine
//!
//! Turns a model registry into realistic fake resources:
//!
//! - `fakers`: the named value generators behind faker directives
//! - `value`: property-level synthesis (directives, enums, references)
//! - `resource`: whole resources, inlined values, stubs and side effects
//! - `verification`: organization-signed verifications of forms
//! - `workflow`: application and user assembly across products
//! - `assets`: the round-robin image pool behind the `face` directive
//!
//! ```no_run
//! use samplegen_core::{Samples, SamplesConfig};
//! use samplegen_models::ModelRegistry;
//!
//! let models = ModelRegistry::base()?;
//! let mut samples = Samples::new(&models, SamplesConfig::default())?;
//! let resources = samples.users(2)?;
//! println!("{}", serde_json::to_string_pretty(&resources)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assets;
pub mod error;
pub mod fakers;
pub mod resource;
pub mod synthesizer;
pub mod value;
pub mod verification;
pub mod workflow;

mod words;

pub use assets::{AssetError, AssetPool, RoundRobinPool, PLACEHOLDER_IMAGE};
pub use error::{Result, SynthesisError};
pub use fakers::{FakerContext, FakerError, FakerFn, FakerRegistry};
pub use synthesizer::{
    Authorship, Profile, ResourceRequest, SynthesisOptions, Synthesized, Synthesizer,
};
pub use verification::VerificationProvider;
pub use workflow::{
    eligible_products, ApplicationGraph, FormAnswer, Outcome, Samples, SamplesConfig,
};
