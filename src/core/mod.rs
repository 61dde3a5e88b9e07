//! Core domain types: version, recipe, build configuration and publish gate.

pub mod configuration;
pub mod errors;
pub mod publish;
pub mod recipe;
pub mod version;

pub use configuration::BuildConfiguration;
pub use errors::{BuildError, PackagingError, PublishError};
pub use publish::{PublishGate, PublishTarget};
pub use recipe::{PackageIdentity, PackageLayout, PackageRecipe};
