use clap::Parser;
use std::net::SocketAddr;

use crate::db::models::{Service, Sport};

/// DFS projection aggregator service
#[derive(Parser, Debug, Clone)]
#[command(name = "dfs-projections", version, about)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Object-storage root serving the feed blobs over HTTP
    #[arg(long, env = "FEED_BASE_URL")]
    pub feed_base_url: Option<String>,

    /// Local directory holding the feed blobs (alternative to FEED_BASE_URL)
    #[arg(long, env = "FEED_DIR")]
    pub feed_dir: Option<String>,

    /// SQLite crosswalk database path
    #[arg(long, env = "CROSSWALK_DB_PATH", default_value = "crosswalk.db")]
    pub crosswalk_db_path: String,

    /// JSON file of crosswalk mappings imported at startup
    #[arg(long, env = "CROSSWALK_SEED")]
    pub crosswalk_seed: Option<String>,

    /// Seconds a fetched feed blob is reused (0 disables caching)
    #[arg(long, env = "FEED_CACHE_TTL_SECS", default_value = "60")]
    pub feed_cache_ttl_secs: u64,

    /// Attempts per feed fetch before giving up
    #[arg(long, env = "FEED_MAX_ATTEMPTS", default_value = "3")]
    pub feed_max_attempts: u32,

    /// Sport used when a request omits `sport`
    #[arg(long, env = "DEFAULT_SPORT", default_value = "nfl")]
    pub default_sport: String,

    /// Service used when a request omits `service`
    #[arg(long, env = "DEFAULT_SERVICE", default_value = "draftkings")]
    pub default_service: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match (&self.feed_base_url, &self.feed_dir) {
            (None, None) => anyhow::bail!("one of FEED_BASE_URL or FEED_DIR is required"),
            (Some(_), Some(_)) => {
                anyhow::bail!("FEED_BASE_URL and FEED_DIR are mutually exclusive")
            }
            _ => {}
        }
        if !(1..=10).contains(&self.feed_max_attempts) {
            anyhow::bail!("feed_max_attempts must be between 1 and 10");
        }
        self.listen_socket()?;
        self.sport()?;
        self.service()?;
        Ok(())
    }

    pub fn listen_socket(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen_addr '{}': {}", self.listen_addr, e))
    }

    pub fn sport(&self) -> anyhow::Result<Sport> {
        self.default_sport.parse().map_err(anyhow::Error::msg)
    }

    pub fn service(&self) -> anyhow::Result<Service> {
        self.default_service.parse().map_err(anyhow::Error::msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["dfs-projections"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_local_feed_dir_is_valid() {
        let cfg = config(&["--feed-dir", "/var/lib/feeds"]);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sport().unwrap(), Sport::Nfl);
        assert_eq!(cfg.service().unwrap(), Service::DraftKings);
    }

    #[test]
    fn test_feed_source_required_and_exclusive() {
        assert!(config(&[]).validate().is_err());
        let both = config(&[
            "--feed-dir",
            "/var/lib/feeds",
            "--feed-base-url",
            "https://storage.example.com/feeds",
        ]);
        assert!(both.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(config(&["--feed-dir", "f", "--feed-max-attempts", "0"])
            .validate()
            .is_err());
        assert!(config(&["--feed-dir", "f", "--listen-addr", "localhost"])
            .validate()
            .is_err());
        assert!(config(&["--feed-dir", "f", "--default-sport", "cricket"])
            .validate()
            .is_err());
    }
}
