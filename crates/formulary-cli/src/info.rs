//! Implementation of the `formulary info` command.

use anyhow::Result;
use std::path::PathBuf;

use formulary_core::{
    Dependency, Manifest, PlatformContext, ReleaseTrack, ResolvedFormula, Resolver, VariantSpec,
};

/// Options for the info command.
#[derive(Debug)]
pub struct InfoOptions {
    /// Path to the formula file.
    pub file: PathBuf,
    /// Platform to resolve against.
    pub context: PlatformContext,
    /// Restrict output to one release track.
    pub track: Option<ReleaseTrack>,
    /// Emit JSON instead of text.
    pub json: bool,
}

/// Resolve a formula file and print its metadata and downloads.
pub fn show_formula(options: InfoOptions) -> Result<()> {
    let formula = Manifest::from_path(&options.file)?.into_formula()?;
    let resolved = Resolver::new(&options.context).resolve(&formula)?;

    if options.json {
        let output = match options.track {
            Some(track) => serde_json::to_string_pretty(resolved.track(track))?,
            None => serde_json::to_string_pretty(&resolved)?,
        };
        println!("{output}");
        return Ok(());
    }

    print_header(&resolved);
    match options.track {
        Some(track) => print_track(track, resolved.track(track)),
        None => {
            // Broadcast makes devel and head copies of stable unless a
            // block narrowed them, so only differing tracks are shown.
            for (track, spec) in resolved.tracks() {
                if track == ReleaseTrack::Stable || spec != resolved.stable() {
                    print_track(track, spec);
                }
            }
        }
    }
    Ok(())
}

fn print_header(resolved: &ResolvedFormula) {
    match resolved.description() {
        Some(description) => println!("{}: {description}", resolved.name()),
        None => println!("{}", resolved.name()),
    }
    if let Some(homepage) = resolved.homepage() {
        println!("homepage: {homepage}");
    }
    if let Some(license) = resolved.license() {
        println!("license: {license}");
    }
}

fn print_track(track: ReleaseTrack, spec: &VariantSpec) {
    println!();
    println!("{track}:");
    if let Some(url) = spec.url() {
        println!("  url: {url}");
    }
    for mirror in spec.mirrors() {
        println!("  mirror: {mirror}");
    }
    if let Some(sha256) = spec.sha256() {
        println!("  sha256: {sha256}");
    }
    if let Some(version) = spec.version() {
        println!("  version: {version}");
    }
    if !spec.dependencies().is_empty() {
        let list: Vec<String> = spec.dependencies().iter().map(format_dependency).collect();
        println!("  dependencies: {}", list.join(", "));
    }
    if !spec.provided_by_platform().is_empty() {
        println!(
            "  provided by macos: {}",
            spec.provided_by_platform().join(", ")
        );
    }
    for patch in spec.patches() {
        println!("  patch ({}): {}", patch.strip, patch.url);
    }
    let resources: Vec<&str> = spec.resources().map(|r| r.name()).collect();
    if !resources.is_empty() {
        println!("  resources: {}", resources.join(", "));
    }
}

fn format_dependency(dependency: &Dependency) -> String {
    if dependency.tags.is_empty() {
        dependency.name.clone()
    } else {
        let tags: Vec<&str> = dependency.tags.iter().map(|t| t.as_str()).collect();
        format!("{} ({})", dependency.name, tags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulary_core::{DependencyTag, Formula, Milestone};

    #[test]
    fn test_format_dependency_with_tags() {
        let dependency = Dependency::new("pkg-config").with_tag(DependencyTag::Build);
        assert_eq!(format_dependency(&dependency), "pkg-config (build)");

        let plain = Dependency::new("openssl");
        assert_eq!(format_dependency(&plain), "openssl");
    }

    #[test]
    fn test_only_narrowed_tracks_differ_from_stable() {
        let formula = Formula::define("foo", |f| {
            f.url("https://example.com/foo-1.0.tar.gz");
            f.devel(|f| {
                f.depends_on("autoconf");
            });
        });
        let resolved = formula
            .resolve(&PlatformContext::macos(Milestone::Ventura.version()))
            .unwrap();

        assert_ne!(resolved.devel(), resolved.stable());
        assert_eq!(resolved.head(), resolved.stable());
    }
}
