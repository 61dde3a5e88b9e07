//! `tsl-release run` command

use anyhow::Result;

use crate::cli::RunArgs;
use tsl_release::builder::LocalBuilder;
use tsl_release::ops::{release, HttpUploader, ReleaseOptions};
use tsl_release::{GlobalContext, PublishGate};

pub fn execute(ctx: &GlobalContext, args: RunArgs) -> Result<()> {
    let output_dir = args.output.unwrap_or_else(|| ctx.output_dir());

    let gate = PublishGate::new(ctx.config().publish.clone());
    let target = gate.decide_from_env();

    let dry_run = args.dry_run;
    let opts = ReleaseOptions {
        matrix: args.selection.into(),
        dry_run,
    };

    let mut builder = LocalBuilder::new(output_dir).with_test_folder(ctx.test_folder());
    let mut uploader = HttpUploader::new();

    let report = release(ctx, &opts, target, &mut builder, &mut uploader)?;

    for package in &report.built {
        eprintln!(
            "    Finished `{}` -> {}",
            package.configuration,
            package.layout.root.display()
        );
    }
    eprintln!("    Built {} configuration(s)", report.built.len());

    if report.published() {
        for receipt in &report.uploaded {
            eprintln!("    Uploaded {} -> {}", receipt.reference, receipt.url);
        }
    } else if dry_run {
        eprintln!("    Skipping upload (dry run)");
    } else {
        eprintln!("    Skipping upload (no release trigger)");
    }

    Ok(())
}
