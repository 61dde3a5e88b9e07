//! `tsl-release matrix` command

use anyhow::Result;

use crate::cli::{MatrixArgs, MatrixSelection};
use tsl_release::ops::{plan_matrix, MatrixOptions};
use tsl_release::{GlobalContext, PackageRecipe};

impl From<MatrixSelection> for MatrixOptions {
    fn from(selection: MatrixSelection) -> Self {
        MatrixOptions {
            full_matrix: selection.full_matrix,
            filters: selection.filters,
        }
    }
}

pub fn execute(ctx: &GlobalContext, args: MatrixArgs) -> Result<()> {
    let recipe = PackageRecipe::load(ctx.source_dir(), &ctx.config().package);
    let plan = plan_matrix(&ctx.config().matrix, &recipe, &args.selection.into())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan.matrix)?);
        return Ok(());
    }

    for config in plan.matrix.iter() {
        println!("{}", config);
    }
    eprintln!(
        "    {} of {} configurations{}",
        plan.matrix.len(),
        plan.generated,
        if plan.representative {
            " (representative of a configuration-invariant package)"
        } else {
            ""
        }
    );

    Ok(())
}
