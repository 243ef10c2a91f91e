use std::net::{IpAddr, SocketAddr};

use crate::config::Config;
use crate::models::server::ServerReport;
use crate::services::geo::GeoLocator;
use crate::services::probe::probe_endpoint;
use crate::store::Store;
use crate::utils::version;

/// What a presence report does to its `(ip, port)` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Remove,
    Refresh,
    Probe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Removed,
    Refreshed,
    Admitted,
    /// The probe failed; carries the diagnostic returned to the reporter.
    Unreachable(String),
}

impl RegistrationOutcome {
    pub fn body(&self) -> String {
        match self {
            Self::Unreachable(diagnostic) => diagnostic.clone(),
            _ => "OK".to_string(),
        }
    }
}

pub fn classify(report: &ServerReport, listed: bool, legacy_threshold: &str) -> Transition {
    // Old builds never report a started game, so a full lobby is the last we hear of them.
    let legacy_full = version::is_older(&report.glest_version, legacy_threshold)
        && report.connected_clients == report.network_slots;

    if legacy_full || report.is_game_over() {
        Transition::Remove
    } else if listed {
        Transition::Refresh
    } else {
        Transition::Probe
    }
}

/// Address to list a reporter under: private IPv4 reporters sit behind the
/// service's own NAT, so they get the service's public address.
pub fn advertised_ip(reporter: IpAddr, public_ip: Option<IpAddr>) -> IpAddr {
    let reporter = reporter.to_canonical();
    match (reporter, public_ip) {
        (IpAddr::V4(v4), Some(public)) if v4.is_private() => public,
        _ => reporter,
    }
}

pub async fn register(
    store: &dyn Store,
    geo: &GeoLocator,
    config: &Config,
    report: &ServerReport,
) -> anyhow::Result<RegistrationOutcome> {
    let ip = report.ip_string();
    let listed = store.server_exists(&ip, report.port).await?;

    match classify(report, listed, &config.legacy_version_threshold) {
        Transition::Remove => {
            let removed = store.remove_server(&ip, report.port).await?;
            tracing::info!("Delisted {}:{} ({} rows)", ip, report.port, removed);
            Ok(RegistrationOutcome::Removed)
        }
        Transition::Refresh => {
            store.refresh_server(report).await?;
            tracing::debug!("Refreshed {}:{}", ip, report.port);
            Ok(RegistrationOutcome::Refreshed)
        }
        Transition::Probe => {
            let attempt = format!("Trying to connect to '{}' using port '{}'...", ip, report.port);

            let port = match u16::try_from(report.port) {
                Ok(port) if port != 0 => port,
                _ => {
                    let reason = format!("Invalid port {}", report.port);
                    tracing::info!("Not listing {}:{}: {}", ip, report.port, reason);
                    return Ok(RegistrationOutcome::Unreachable(format!(
                        "{}\n{}\nwrong router setup",
                        attempt, reason
                    )));
                }
            };

            if !config.probe_delay.is_zero() {
                tokio::time::sleep(config.probe_delay).await;
            }

            let address = SocketAddr::new(report.ip, port);
            if let Err(reason) = probe_endpoint(address, config.probe_timeout, config.probe_read).await {
                tracing::info!("Not listing {}: {}", address, reason);
                return Ok(RegistrationOutcome::Unreachable(format!(
                    "{}\n{}\nwrong router setup",
                    attempt, reason
                )));
            }

            let country = if report.privacy_please {
                String::new()
            } else {
                geo.country_code(report.ip)
            };

            store.admit_server(report, &country).await?;
            tracing::info!("Listed new server {} '{}' [{}]", address, report.server_title, country);
            Ok(RegistrationOutcome::Admitted)
        }
    }
}
