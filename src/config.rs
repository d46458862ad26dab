//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "room-timer")]
#[command(about = "A server-authoritative countdown timer shared across WebSocket rooms")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// JSON file to persist timer records in; records stay in memory when omitted
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["room-timer"]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert_eq!(config.log_level(), "info");
        assert!(config.data_file.is_none());
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "room-timer", "-p", "8080", "--host", "127.0.0.1", "--data-file", "timers.json", "-v",
        ])
        .unwrap();
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.data_file, Some(PathBuf::from("timers.json")));
    }
}
