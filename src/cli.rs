use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the web server (default)
    Serve,
    /// Report which directory and email settings are present
    CheckConfig,
    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["credential-reset"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_check_config_subcommand() {
        let cli = Cli::try_parse_from(["credential-reset", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
    }
}
