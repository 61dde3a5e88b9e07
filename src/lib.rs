//! tsl-release - release driver for header-only C++ libraries
//!
//! Resolves the library version from its `CMakeLists.txt`, stages the
//! package described by the recipe, builds it across a matrix of compiler
//! configurations and uploads the result when a release is triggered.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use crate::core::{
    configuration::BuildConfiguration,
    publish::{PublishGate, PublishTarget},
    recipe::{PackageIdentity, PackageRecipe},
};

pub use crate::builder::matrix::{BuildMatrix, MatrixFilter};
pub use crate::util::context::GlobalContext;
