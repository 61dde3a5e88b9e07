//! `tsl-release info` command

use anyhow::Result;

use crate::cli::InfoArgs;
use tsl_release::{GlobalContext, PackageRecipe};

pub fn execute(ctx: &GlobalContext, args: InfoArgs) -> Result<()> {
    let recipe = PackageRecipe::load(ctx.source_dir(), &ctx.config().package);
    let exported = recipe.exported_sources()?;

    if args.json {
        let mut value = serde_json::to_value(&recipe)?;
        if let Some(fields) = value.as_object_mut() {
            fields.insert("exported_files".to_string(), serde_json::to_value(&exported)?);
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("name:        {}", recipe.name());
    println!("version:     {}", recipe.display_version());
    println!("license:     {}", recipe.license());
    println!("url:         {}", recipe.url());
    println!("description: {}", recipe.description());
    println!("sources:     {}", recipe.exports_sources().join(", "));
    println!(
        "identity:    {}",
        if recipe.is_configuration_invariant() {
            "configuration-invariant (header-only)"
        } else {
            "per configuration"
        }
    );
    println!("exported:    {} file(s)", exported.len());
    for file in &exported {
        println!("  {}", file.display());
    }

    Ok(())
}
