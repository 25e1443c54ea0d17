// Command line interface
// Startup flags only; everything else lives in the config file

use clap::Parser;

/// Top-level CLI for the draftpad editor server.
#[derive(Debug, Parser)]
#[command(name = "draftpad")]
#[command(about = "draftpad: web-based text file editor", long_about = None)]
pub struct Cli {
    /// Bind an OS-assigned port instead of the configured one and write
    /// the chosen port to the port file.
    #[arg(long)]
    pub addr: bool,

    /// Configuration file to load (extension optional).
    #[arg(long, default_value = "config", value_name = "FILE")]
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["draftpad"]);
        assert!(!cli.addr);
        assert_eq!(cli.config, "config");
    }

    #[test]
    fn test_addr_and_config_flags() {
        let cli = Cli::parse_from(["draftpad", "--addr", "--config", "dev"]);
        assert!(cli.addr);
        assert_eq!(cli.config, "dev");
    }
}
