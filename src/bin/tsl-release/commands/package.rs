//! `tsl-release package` command

use anyhow::Result;

use crate::cli::PackageArgs;
use tsl_release::{GlobalContext, PackageRecipe};

pub fn execute(ctx: &GlobalContext, args: PackageArgs) -> Result<()> {
    let recipe = PackageRecipe::load(ctx.source_dir(), &ctx.config().package);
    let layout = recipe.package(&args.output)?;

    eprintln!(
        "    Packaged {} v{} -> {} ({} headers)",
        recipe.name(),
        recipe.display_version(),
        layout.root.display(),
        layout.headers.len()
    );

    Ok(())
}
