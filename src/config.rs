use anyhow::{anyhow, Context};
use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_GAME_PORT: u16 = 61357;

/// Runtime settings, read once at start-up and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Address advertised in place of private reporter addresses.
    pub public_ip: Option<IpAddr>,
    pub trust_forwarded_for: bool,
    pub default_game_port: u16,
    pub stale_after: Duration,
    /// Zero disables the background sweep; lazy reaping still runs per request.
    pub reaper_interval: Duration,
    pub probe_timeout: Duration,
    pub probe_delay: Duration,
    pub probe_read: Duration,
    pub legacy_version_threshold: String,
    pub completed_game_max_minutes: f64,
    pub geoip_database: Option<String>,
    pub product_name: String,
    pub product_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let public_ip = match get("PUBLIC_IP") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<IpAddr>()
                    .with_context(|| format!("PUBLIC_IP is not an IP address: {}", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            database_url,
            max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "SERVER_PORT", 3000)?,
            public_ip,
            trust_forwarded_for: parse_or(&get, "TRUST_FORWARDED_FOR", false)?,
            default_game_port: parse_or(&get, "DEFAULT_GAME_PORT", DEFAULT_GAME_PORT)?,
            stale_after: Duration::from_secs(parse_or(&get, "STALE_SERVER_SECS", 60)?),
            reaper_interval: Duration::from_secs(parse_or(&get, "REAPER_INTERVAL_SECS", 30)?),
            probe_timeout: Duration::from_secs(parse_or(&get, "PROBE_TIMEOUT_SECS", 10)?),
            probe_delay: Duration::from_millis(parse_or(&get, "PROBE_DELAY_MS", 0)?),
            probe_read: Duration::from_millis(parse_or(&get, "PROBE_READ_MS", 500)?),
            legacy_version_threshold: get("LEGACY_VERSION_THRESHOLD")
                .unwrap_or_else(|| "v3.4.0-dev".to_string()),
            completed_game_max_minutes: parse_or(&get, "COMPLETED_GAME_MAX_MINUTES", 5.0)?,
            geoip_database: get("GEOIP_DATABASE"),
            product_name: get("PRODUCT_NAME").unwrap_or_else(|| "MegaGlest".to_string()),
            product_url: get("PRODUCT_URL").unwrap_or_else(|| "https://megaglest.org/".to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address private reporters are listed under: `PUBLIC_IP`, else the
    /// bind host when it names a single routable address.
    pub fn public_address(&self) -> Option<IpAddr> {
        self.public_ip.or_else(|| {
            self.host
                .trim()
                .parse::<IpAddr>()
                .ok()
                .filter(|ip| !ip.is_unspecified() && !ip.is_loopback())
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("invalid value for {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Settings for tests: no delays, short probe timeout, no GeoIP.
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mysql://localhost/test".to_string()),
            "PROBE_TIMEOUT_SECS" => Some("2".to_string()),
            "PROBE_READ_MS" => Some("50".to_string()),
            _ => None,
        })
        .expect("test config")
    }
}
