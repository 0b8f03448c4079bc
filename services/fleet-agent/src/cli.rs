//! Command line interface for the fleet agent.

use clap::Parser;

/// Per-host inventory agent reporting to a central controller.
#[derive(Debug, Parser)]
#[command(name = "outpost-fleet-agent", version, about)]
pub struct Cli {
    /// Controller API endpoint, e.g. `https://controller.example.com/api/agent`.
    #[arg(long)]
    pub url: String,

    /// Shared agent token presented on every call.
    #[arg(long, env = "AGENT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Seconds between reporting iterations.
    #[arg(long, default_value_t = 60)]
    pub interval: u64,

    /// Run one register plus report cycle, then exit.
    #[arg(long)]
    pub once: bool,

    /// Free-form label attached to the registration; repeatable.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_full_flag_set() {
        let cli = Cli::try_parse_from([
            "outpost-fleet-agent",
            "--url",
            "http://controller.local/api/agent",
            "--token",
            "secret",
            "--interval",
            "15",
            "--once",
            "--tag",
            "edge",
            "--tag",
            "lab",
        ])
        .unwrap();
        assert_eq!(cli.url, "http://controller.local/api/agent");
        assert_eq!(cli.token, "secret");
        assert_eq!(cli.interval, 15);
        assert!(cli.once);
        assert_eq!(cli.tags, vec!["edge", "lab"]);
    }

    #[test]
    fn interval_defaults_to_sixty_seconds() {
        let cli = Cli::try_parse_from([
            "outpost-fleet-agent",
            "--url",
            "http://controller.local/api/agent",
            "--token",
            "secret",
        ])
        .unwrap();
        assert_eq!(cli.interval, 60);
        assert!(!cli.once);
        assert!(cli.tags.is_empty());
    }

    #[test]
    fn url_is_required() {
        let result = Cli::try_parse_from(["outpost-fleet-agent", "--token", "secret"]);
        assert!(result.is_err());
    }
}
