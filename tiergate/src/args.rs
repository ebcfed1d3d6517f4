use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tiergate_config::Config;

/// Complexity-based LLM tier router
#[derive(Debug, Parser)]
#[command(
    name = "tiergate",
    about = "Routes chat completions to pro, mid, or low backends by estimated complexity"
)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tiergate.toml", env = "TIERGATE_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "TIERGATE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the score at or above which requests go to the pro tier
    #[arg(long, env = "TIERGATE_PRO_THRESHOLD", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub pro_threshold: Option<u8>,

    /// Override the score at or above which requests go to the mid tier
    #[arg(long, env = "TIERGATE_MID_THRESHOLD", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub mid_threshold: Option<u8>,

    /// Override the `tracing` filter directive
    #[arg(long, env = "TIERGATE_LOG")]
    pub log_filter: Option<String>,
}

impl Args {
    /// Apply command-line overrides and re-validate
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(listen) = self.listen {
            config.server.listen_address = Some(listen);
        }
        if let Some(pro) = self.pro_threshold {
            config.router.thresholds.pro = pro;
        }
        if let Some(mid) = self.mid_threshold {
            config.router.thresholds.mid = mid;
        }
        if let Some(filter) = &self.log_filter {
            config.telemetry.log_filter.clone_from(filter);
        }

        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [tiers.pro]
        model = "big"
        [tiers.mid]
        model = "medium"
        [tiers.low]
        model = "small"
    "#;

    #[test]
    fn thresholds_override_independently() {
        let mut config = Config::from_toml(CONFIG).unwrap();
        let args = Args::try_parse_from(["tiergate", "--pro-threshold", "80"]).unwrap();
        args.apply(&mut config).unwrap();
        assert_eq!(config.router.thresholds.pro, 80);
        assert_eq!(config.router.thresholds.mid, 35);

        let args = Args::try_parse_from(["tiergate", "--mid-threshold", "20"]).unwrap();
        args.apply(&mut config).unwrap();
        assert_eq!(config.router.thresholds.pro, 80);
        assert_eq!(config.router.thresholds.mid, 20);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = Config::from_toml(CONFIG).unwrap();
        let args = Args::try_parse_from(["tiergate", "--mid-threshold", "90"]).unwrap();
        assert!(args.apply(&mut config).is_err());
    }

    #[test]
    fn out_of_range_threshold_fails_to_parse() {
        assert!(Args::try_parse_from(["tiergate", "--pro-threshold", "101"]).is_err());
    }

    #[test]
    fn listen_override() {
        let mut config = Config::from_toml(CONFIG).unwrap();
        let args = Args::try_parse_from(["tiergate", "--listen", "127.0.0.1:8080"]).unwrap();
        args.apply(&mut config).unwrap();
        assert_eq!(config.server.listen_address, Some(SocketAddr::from(([127, 0, 0, 1], 8080))));
    }
}
