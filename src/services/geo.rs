use maxminddb::{geoip2, Reader};
use std::net::IpAddr;

enum Source {
    Database(Reader<Vec<u8>>),
    /// Answers every lookup with one country.
    #[cfg(test)]
    Fixed(String),
}

/// Country lookup over an optional GeoLite2/GeoIP2 country database.
pub struct GeoLocator {
    source: Option<Source>,
}

impl GeoLocator {
    pub fn disabled() -> Self {
        Self { source: None }
    }

    pub fn open(path: &str) -> anyhow::Result<Self> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            source: Some(Source::Database(reader)),
        })
    }

    #[cfg(test)]
    pub fn fixed(country: &str) -> Self {
        Self {
            source: Some(Source::Fixed(country.to_string())),
        }
    }

    /// Opens the configured database; a missing or unreadable file only disables lookups.
    pub fn from_path(path: Option<&str>) -> Self {
        match path {
            Some(path) => match Self::open(path) {
                Ok(geo) => {
                    tracing::info!("GeoIP database loaded from {}", path);
                    geo
                }
                Err(e) => {
                    tracing::warn!("GeoIP database {} unavailable, countries stay empty: {}", path, e);
                    Self::disabled()
                }
            },
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// ISO country code for `ip`, or an empty string.
    pub fn country_code(&self, ip: IpAddr) -> String {
        let reader = match &self.source {
            Some(Source::Database(reader)) => reader,
            #[cfg(test)]
            Some(Source::Fixed(country)) => return country.clone(),
            None => return String::new(),
        };
        match reader.lookup::<geoip2::Country>(ip) {
            Ok(record) => record
                .country
                .and_then(|c| c.iso_code)
                .unwrap_or_default()
                .to_string(),
            Err(e) => {
                tracing::debug!("No country for {}: {}", ip, e);
                String::new()
            }
        }
    }
}
