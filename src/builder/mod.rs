//! Build layer: matrix generation, CMake integration and per-configuration
//! execution.

pub mod cmake;
pub mod executor;
pub mod matrix;

pub use executor::{BuiltPackage, ConfigurationBuilder, LocalBuilder};
pub use matrix::{generate_default_matrix, BuildMatrix, MatrixFilter};
