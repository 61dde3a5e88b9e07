//! The release driver.
//!
//! A run moves through the phases `Start → VersionResolved →
//! MatrixGenerated → MatrixNarrowed → Executed → (Published | Skipped)`
//! without going back. The first failure ends the run.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::builder::executor::{BuiltPackage, ConfigurationBuilder};
use crate::builder::matrix::{generate_default_matrix, BuildMatrix, MatrixFilter};
use crate::core::publish::PublishTarget;
use crate::core::recipe::PackageRecipe;
use crate::ops::upload::{UploadReceipt, Uploader};
use crate::util::config::{Config, MatrixConfig};
use crate::util::GlobalContext;

/// Phases of a release run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Start,
    VersionResolved,
    MatrixGenerated,
    MatrixNarrowed,
    Executed,
    Published,
    Skipped,
}

/// How the matrix is selected.
#[derive(Debug, Clone, Default)]
pub struct MatrixOptions {
    /// Build every configuration even for a configuration-invariant recipe
    pub full_matrix: bool,
    pub filters: Vec<MatrixFilter>,
}

/// Result of matrix planning.
#[derive(Debug, Clone)]
pub struct MatrixPlan {
    /// Size of the generated matrix before narrowing
    pub generated: usize,
    pub matrix: BuildMatrix,
    /// Whether the matrix was reduced to a single representative
    pub representative: bool,
}

/// Generate the default matrix, apply filters, then reduce it to one
/// representative when the recipe's identity does not depend on the
/// configuration.
pub fn plan_matrix(
    axes: &MatrixConfig,
    recipe: &PackageRecipe,
    opts: &MatrixOptions,
) -> Result<MatrixPlan> {
    let generated = generate_default_matrix(axes);
    let generated_len = generated.len();
    tracing::debug!("generated {} configurations", generated_len);

    let matrix = generated.filter(&opts.filters);
    if matrix.is_empty() {
        bail!(
            "no build configuration left to build ({} generated, {} filter(s) applied)",
            generated_len,
            opts.filters.len()
        );
    }

    let representative = recipe.is_configuration_invariant() && !opts.full_matrix;
    let matrix = if representative {
        let matrix = matrix.first_only();
        if let Some(first) = matrix.first() {
            // The representative is whatever enumeration order puts first.
            tracing::info!(
                "{} is configuration-invariant; building one representative: {}",
                recipe.name(),
                first
            );
        }
        matrix
    } else {
        matrix
    };

    Ok(MatrixPlan {
        generated: generated_len,
        matrix,
        representative,
    })
}

/// What a matrix run produced.
#[derive(Debug, Clone, Default)]
pub struct MatrixOutcome {
    pub built: Vec<BuiltPackage>,
    pub uploaded: Vec<UploadReceipt>,
}

/// Build every configuration in order and upload each new package when a
/// target is given. Stops at the first failure.
pub fn run_matrix(
    matrix: BuildMatrix,
    recipe: &PackageRecipe,
    builder: &mut dyn ConfigurationBuilder,
    uploader: &mut dyn Uploader,
    target: Option<&PublishTarget>,
) -> Result<MatrixOutcome> {
    let mut outcome = MatrixOutcome::default();
    let mut published = BTreeSet::new();

    for config in matrix {
        let package = builder.build(recipe, &config)?;

        if let Some(target) = target {
            if published.contains(&package.identity) {
                tracing::info!(
                    "package {} already uploaded in this run, skipping",
                    package.identity
                );
            } else {
                let receipt = uploader
                    .upload(recipe, &package, target)
                    .with_context(|| format!("failed to publish package built for {}", config))?;
                published.insert(package.identity.clone());
                outcome.uploaded.push(receipt);
            }
        }

        outcome.built.push(package);
    }

    Ok(outcome)
}

/// Options for a full release run.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    pub matrix: MatrixOptions,
    /// Never publish, whatever the trigger says
    pub dry_run: bool,
}

/// Summary of a release run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub version: Option<String>,
    pub phases: Vec<Phase>,
    pub target: Option<PublishTarget>,
    pub built: Vec<BuiltPackage>,
    pub uploaded: Vec<UploadReceipt>,
}

impl RunReport {
    pub fn published(&self) -> bool {
        self.phases.contains(&Phase::Published)
    }
}

/// Run a release: resolve the version, plan the matrix, build it and
/// publish to `target` if one is given.
pub fn release(
    ctx: &GlobalContext,
    opts: &ReleaseOptions,
    target: Option<PublishTarget>,
    builder: &mut dyn ConfigurationBuilder,
    uploader: &mut dyn Uploader,
) -> Result<RunReport> {
    let config: &Config = ctx.config();
    let mut phases = vec![Phase::Start];

    let recipe = PackageRecipe::load(ctx.source_dir(), &config.package);
    phases.push(Phase::VersionResolved);
    tracing::info!("Releasing {} v{}", recipe.name(), recipe.display_version());

    let plan = plan_matrix(&config.matrix, &recipe, &opts.matrix)?;
    phases.push(Phase::MatrixGenerated);
    phases.push(Phase::MatrixNarrowed);

    let target = if opts.dry_run {
        if target.is_some() {
            tracing::info!("dry run: not publishing");
        }
        None
    } else {
        target
    };

    let outcome = run_matrix(plan.matrix, &recipe, builder, uploader, target.as_ref())?;
    phases.push(Phase::Executed);
    phases.push(if target.is_some() {
        Phase::Published
    } else {
        Phase::Skipped
    });

    Ok(RunReport {
        version: recipe.version().map(str::to_string),
        phases,
        target,
        built: outcome.built,
        uploaded: outcome.uploaded,
    })
}
