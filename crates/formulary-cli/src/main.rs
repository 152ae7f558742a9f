//! Formulary CLI - resolve and inspect package formula definitions

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use formulary_core::{MacVersion, OsFamily, PlatformContext, ReleaseTrack, VersionThreshold};

mod check;
mod deps;
mod info;

#[derive(Parser)]
#[command(name = "formulary")]
#[command(version = formulary_core::VERSION)]
#[command(about = "Resolve and inspect Formulary package definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a formula's resolved metadata, downloads, and dependencies
    Info {
        /// Path to the formula file
        file: PathBuf,

        #[command(flatten)]
        platform: PlatformArgs,

        /// Show a single release track (stable, devel, or head)
        #[arg(long)]
        track: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the dependencies a formula resolves to
    Deps {
        /// Path to the formula file
        file: PathBuf,

        #[command(flatten)]
        platform: PlatformArgs,

        /// Release track to inspect
        #[arg(long, default_value = "stable")]
        track: String,

        /// Include build and test dependencies
        #[arg(long)]
        include_build: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Resolve formula files and report definition errors
    Check {
        /// Formula files to check
        files: Vec<PathBuf>,

        #[command(flatten)]
        platform: PlatformArgs,
    },
}

/// Platform override flags shared by every command.
#[derive(Args)]
struct PlatformArgs {
    /// Resolve for this platform family (macos or linux) instead of the host
    #[arg(long, value_name = "FAMILY")]
    os: Option<String>,

    /// macOS version or milestone name to resolve against
    #[arg(long, value_name = "VERSION")]
    os_version: Option<String>,
}

impl PlatformArgs {
    /// Build the platform context these flags describe.
    fn context(&self) -> Result<PlatformContext> {
        let version = self.os_version.as_deref().map(parse_version).transpose()?;

        let context = match self.os.as_deref() {
            Some(name) => {
                let family: OsFamily = name.parse()?;
                match family {
                    OsFamily::Macos => match version {
                        Some(v) => PlatformContext::macos(v),
                        None => PlatformContext::macos_unversioned(),
                    },
                    OsFamily::Linux => {
                        if version.is_some() {
                            anyhow::bail!("--os-version only applies to macos");
                        }
                        PlatformContext::linux()
                    }
                }
            }
            None => {
                let current = PlatformContext::current();
                match version {
                    Some(v) => {
                        if current.family() != Some(OsFamily::Macos) {
                            anyhow::bail!("--os-version only applies to macos");
                        }
                        current.with_version(v)
                    }
                    None => current,
                }
            }
        };
        Ok(context)
    }
}

/// Parse a macOS version or milestone name into a version number.
fn parse_version(input: &str) -> Result<MacVersion> {
    let threshold: VersionThreshold = input.parse()?;
    Ok(threshold.version())
}

fn parse_track(track: Option<&str>) -> Result<Option<ReleaseTrack>> {
    Ok(track.map(str::parse).transpose()?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info {
            file,
            platform,
            track,
            json,
        } => {
            let options = info::InfoOptions {
                file,
                context: platform.context()?,
                track: parse_track(track.as_deref())?,
                json,
            };
            info::show_formula(options)?;
        }

        Commands::Deps {
            file,
            platform,
            track,
            include_build,
            json,
        } => {
            let options = deps::DepsOptions {
                file,
                context: platform.context()?,
                track: track.parse::<ReleaseTrack>()?,
                include_build,
                json,
            };
            deps::list_dependencies(options)?;
        }

        Commands::Check { files, platform } => {
            let options = check::CheckOptions {
                files,
                context: platform.context()?,
            };
            check::check_formulas(options)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulary_core::Milestone;

    fn args(os: Option<&str>, os_version: Option<&str>) -> PlatformArgs {
        PlatformArgs {
            os: os.map(str::to_string),
            os_version: os_version.map(str::to_string),
        }
    }

    #[test]
    fn test_explicit_macos_with_milestone() {
        let context = args(Some("macos"), Some("sierra")).context().unwrap();
        assert_eq!(context, PlatformContext::macos(Milestone::Sierra.version()));
    }

    #[test]
    fn test_explicit_macos_with_numeric_version() {
        let context = args(Some("macos"), Some("13.2")).context().unwrap();
        assert_eq!(context.version(), Some(MacVersion::new(13, 2)));
    }

    #[test]
    fn test_explicit_macos_without_version() {
        let context = args(Some("macos"), None).context().unwrap();
        assert_eq!(context, PlatformContext::macos_unversioned());
    }

    #[test]
    fn test_explicit_linux() {
        let context = args(Some("linux"), None).context().unwrap();
        assert_eq!(context, PlatformContext::linux());
    }

    #[test]
    fn test_linux_rejects_os_version() {
        assert!(args(Some("linux"), Some("13")).context().is_err());
    }

    #[test]
    fn test_unknown_family_is_rejected() {
        assert!(args(Some("windows"), None).context().is_err());
    }

    #[test]
    fn test_bad_version_is_rejected() {
        assert!(args(Some("macos"), Some("snow_leopard")).context().is_err());
    }

    #[test]
    fn test_track_parsing() {
        assert_eq!(parse_track(None).unwrap(), None);
        assert_eq!(
            parse_track(Some("devel")).unwrap(),
            Some(ReleaseTrack::Devel)
        );
        assert!(parse_track(Some("nightly")).is_err());
    }
}
