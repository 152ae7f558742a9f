//! Implementation of the `formulary deps` command.

use anyhow::Result;
use std::path::PathBuf;

use formulary_core::{Dependency, Manifest, PlatformContext, ReleaseTrack, Resolver, VariantSpec};

/// Options for the deps command.
#[derive(Debug)]
pub struct DepsOptions {
    /// Path to the formula file.
    pub file: PathBuf,
    /// Platform to resolve against.
    pub context: PlatformContext,
    /// Release track to inspect.
    pub track: ReleaseTrack,
    /// Include build and test dependencies.
    pub include_build: bool,
    /// Emit JSON instead of text.
    pub json: bool,
}

/// Resolve a formula file and print the dependency list of one track.
pub fn list_dependencies(options: DepsOptions) -> Result<()> {
    let formula = Manifest::from_path(&options.file)?.into_formula()?;
    let resolved = Resolver::new(&options.context).resolve(&formula)?;
    let selected = select_dependencies(resolved.track(options.track), options.include_build);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }
    for dependency in selected {
        println!("{}", dependency.name);
    }
    Ok(())
}

/// The runtime dependency view, widened to everything on request.
fn select_dependencies(spec: &VariantSpec, include_build: bool) -> Vec<&Dependency> {
    spec.dependencies()
        .iter()
        .filter(|d| include_build || d.is_runtime())
        .collect()
}
