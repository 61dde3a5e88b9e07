//! Command implementations

pub mod completions;
pub mod info;
pub mod matrix;
pub mod package;
pub mod run;
pub mod version;
