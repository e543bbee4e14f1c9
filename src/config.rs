use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub assets_dir: String,
    pub scan_interval: Duration,
    pub scan_success_probability: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            assets_dir: "assets".to_string(),
            scan_interval: Duration::from_millis(1000),
            scan_success_probability: 0.7,
        }
    }
}

impl AppConfig {
    /// Reads `HOST`, `PORT`, `ASSETS_DIR`, `SCAN_INTERVAL_MS` and
    /// `SCAN_SUCCESS_PROBABILITY`; unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self::from_lookup(|key| env::var(key).ok(), defaults)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, defaults: Self) -> Self {
        let host = lookup("HOST")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.host);
        let port = lookup("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port);
        let assets_dir = lookup("ASSETS_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.assets_dir);
        let scan_interval = lookup("SCAN_INTERVAL_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.scan_interval);
        let scan_success_probability = lookup("SCAN_SUCCESS_PROBABILITY")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0))
            .unwrap_or(defaults.scan_success_probability);

        Self {
            host,
            port,
            assets_dir,
            scan_interval,
            scan_success_probability,
        }
    }
}
