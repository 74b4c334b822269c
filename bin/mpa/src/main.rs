//! mpa CLI
//!
//! Split-build multi-page static site generator.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for mpa.
#[derive(Parser)]
#[command(
    name = "mpa",
    version,
    about = "A split-build multi-page static site generator"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mpa.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build pages in a single process
    Build {
        /// Pages to build: `**/*`, a glob, or `prefix[a,b,...]`
        #[arg(short, long)]
        page: Option<String>,
        /// Override the output directory
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Build all pages across parallel processes
    Split {
        /// Number of parallel groups (defaults to split.groups)
        #[arg(short, long)]
        groups: Option<usize>,
    },
    /// Serve the output with live reload, rebuilding on changes
    Watch {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },
    /// Validate configuration and report pages and entries
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    mpa::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { page, output } => {
            mpa::cmd::build::run(&cli.config, page.as_deref(), output.as_deref())?;
        }
        Commands::Split { groups } => {
            mpa::cmd::split::run(&cli.config, groups, cli.verbose).await?;
        }
        Commands::Watch { port, open } => {
            mpa::cmd::watch::run(&cli.config, port, open).await?;
        }
        Commands::Check { strict } => {
            mpa::cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["mpa", "build"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("mpa.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build { page, output } => {
                assert!(page.is_none());
                assert!(output.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_with_page_list() {
        let args = ["mpa", "build", "--page", "[index,b/c]", "--output", "out"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Build { page, output } => {
                assert_eq!(page.as_deref(), Some("[index,b/c]"));
                assert_eq!(output, Some(std::path::PathBuf::from("out")));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_split_command_parsing() {
        let cli = Cli::parse_from(["mpa", "split"]);
        match cli.command {
            Commands::Split { groups } => assert!(groups.is_none()),
            _ => panic!("Expected Split command"),
        }

        let cli = Cli::parse_from(["mpa", "split", "--groups", "8"]);
        match cli.command {
            Commands::Split { groups } => assert_eq!(groups, Some(8)),
            _ => panic!("Expected Split command"),
        }
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let args = ["mpa", "check", "--strict"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check { strict } => {
                assert!(strict);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_watch_command_parsing() {
        let cli = Cli::parse_from(["mpa", "watch"]);
        match cli.command {
            Commands::Watch { port, open } => {
                assert_eq!(port, 3000);
                assert!(!open);
            }
            _ => panic!("Expected Watch command"),
        }

        let cli = Cli::parse_from(["mpa", "watch", "--port", "8080", "--open"]);
        match cli.command {
            Commands::Watch { port, open } => {
                assert_eq!(port, 8080);
                assert!(open);
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["mpa", "-vvv", "build"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let args = ["mpa", "--config", "site.toml", "build"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, std::path::PathBuf::from("site.toml"));
    }

    #[test]
    fn test_cli_child_invocation() {
        // Shape of the command line the split driver hands to each group.
        let args = ["mpa", "--config", "mpa.toml", "-vv", "build", "--page", "[a,b/c]"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Build { page, .. } => assert_eq!(page.as_deref(), Some("[a,b/c]")),
            _ => panic!("Expected Build command"),
        }
    }
}
