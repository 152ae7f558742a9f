//! Implementation of the `formulary check` command.

use anyhow::Result;
use std::path::{Path, PathBuf};

use formulary_core::{Manifest, PlatformContext, Resolver};

/// Options for the check command.
#[derive(Debug)]
pub struct CheckOptions {
    /// Formula files to check.
    pub files: Vec<PathBuf>,
    /// Platform to resolve against.
    pub context: PlatformContext,
}

/// Parse and resolve every given formula file, reporting failures.
pub fn check_formulas(options: CheckOptions) -> Result<()> {
    if options.files.is_empty() {
        anyhow::bail!("no formula files given");
    }

    let mut failures = 0usize;
    for file in &options.files {
        match check_one(file, &options.context) {
            Ok(name) => println!("ok: {name}"),
            Err(err) => {
                eprintln!("error: {}: {err}", file.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} formula files failed", options.files.len());
    }
    println!(
        "checked {} formula files for {}",
        options.files.len(),
        options.context
    );
    Ok(())
}

fn check_one(file: &Path, context: &PlatformContext) -> Result<String> {
    let formula = Manifest::from_path(file)?.into_formula()?;
    let resolved = Resolver::new(context).resolve(&formula)?;
    Ok(resolved.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulary_core::Milestone;

    fn write_formula(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_check_one_accepts_a_valid_formula() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_formula(
            dir.path(),
            "hello.toml",
            r#"
            [formula]
            name = "hello"
            url = "https://example.com/hello-1.0.tar.gz"
            "#,
        );

        let context = PlatformContext::macos(Milestone::Ventura.version());
        assert_eq!(check_one(&path, &context).unwrap(), "hello");
    }

    #[test]
    fn test_check_one_reports_configuration_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_formula(
            dir.path(),
            "broken.toml",
            r#"
            [formula]
            name = "broken"

            [[uses-from-macos]]
            name = "zlib"
            since = "snow_leopard"
            "#,
        );

        let context = PlatformContext::linux();
        let err = check_one(&path, &context).unwrap_err();
        assert!(err.to_string().contains("snow_leopard"));
    }

    #[test]
    fn test_check_one_reports_missing_files() {
        let context = PlatformContext::linux();
        assert!(check_one(Path::new("/nonexistent/x.toml"), &context).is_err());
    }
}
