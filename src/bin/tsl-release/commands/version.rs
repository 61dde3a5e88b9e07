//! `tsl-release version` command

use anyhow::Result;

use tsl_release::core::version::{display_version, resolve_version};
use tsl_release::GlobalContext;

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let package = &ctx.config().package;
    let metadata = ctx.source_dir().join(&package.metadata);
    let version = resolve_version(&metadata, Some(&package.name));

    println!("{}", display_version(version.as_deref()));
    Ok(())
}
