//! samplegen model layer
//!
//! Everything the synthesis engine needs to know about *schemas* and the
//! *shape* of finished resources, without any of the faking logic:
//!
//! - `model`: typed models, properties and faking directives
//! - `registry`: layered model registries (base + custom + user overrides)
//! - `normalize`: one-shot preprocessing of every model in a registry
//! - `resource`: resources, stubs, titles and virtual fields
//! - `digest`: content-addressed links for signed resources
//! - `validate`: the structural validator used as a pass/fail oracle

pub mod digest;
pub mod ids;
pub mod model;
pub mod normalize;
pub mod registry;
pub mod resource;
pub mod validate;

pub use model::{Directive, EnumValue, Items, Model, Property, PropertyType};
pub use normalize::normalize_model;
pub use registry::{ModelError, ModelRegistry, RegistryBuilder};
pub use resource::Resource;
pub use validate::{StructuralValidator, ValidationError, Validator};
