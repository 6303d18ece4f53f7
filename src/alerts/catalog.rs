//! Built-in alert data and the simulated web search

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::{relevance, Alert, UserProfile, FOR_YOU_ABOVE};

const BASE_ALERTS_YAML: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/data/alerts.yaml"
));
const WEB_ALERTS_YAML: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/data/web_alerts.yaml"
));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("alert catalog is malformed: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub fn base_alerts() -> Result<Vec<Alert>, CatalogError> {
    Ok(serde_yaml::from_str(BASE_ALERTS_YAML)?)
}

pub fn web_alerts() -> Result<Vec<Alert>, CatalogError> {
    let mut alerts: Vec<Alert> = serde_yaml::from_str(WEB_ALERTS_YAML)?;
    for alert in &mut alerts {
        alert.from_web = true;
    }
    Ok(alerts)
}

/// Pretend to search the web: wait `delay`, then return the fixed web alerts.
/// A configured profile only keeps results it finds relevant.
pub async fn web_search(profile: &UserProfile, delay: Duration) -> Result<Vec<Alert>, CatalogError> {
    debug!(delay_ms = delay.as_millis() as u64, "starting web alert search");
    tokio::time::sleep(delay).await;
    let found = web_alerts()?;
    let total = found.len();
    let kept = keep_relevant(found, profile);
    info!(found = total, kept = kept.len(), "web alert search finished");
    Ok(kept)
}

fn keep_relevant(found: Vec<Alert>, profile: &UserProfile) -> Vec<Alert> {
    if !profile.configured {
        return found;
    }
    found
        .into_iter()
        .filter(|alert| relevance(alert, profile) > FOR_YOU_ABOVE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{Category, ProducerSize, Severity};

    #[test]
    fn builtin_catalog_parses() {
        let alerts = base_alerts().unwrap();
        assert_eq!(alerts.len(), 9);
        assert!(alerts.iter().all(|a| !a.from_web));
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[8].category, Category::Market);
        assert!(alerts[6].affected_crops.is_none());
    }

    #[test]
    fn web_alerts_are_flagged() {
        let alerts = web_alerts().unwrap();
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.from_web));
    }

    #[tokio::test]
    async fn unconfigured_search_returns_everything() {
        let found = web_search(&UserProfile::default(), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn configured_search_keeps_relevant_results() {
        let profile = UserProfile::configure("Puno", ["papa"], ProducerSize::Small).unwrap();
        let found = web_search(&profile, Duration::ZERO).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["web1", "web2"]);
    }

    #[test]
    fn configured_profile_drops_low_relevance_results() {
        let profile = UserProfile::configure("Tarija", ["uva"], ProducerSize::Small).unwrap();
        let mut found = web_alerts().unwrap();
        // informational with no location or crop match scores 50
        found[1].location = "Cusco".into();
        found[1].affected_crops = Some(vec!["cafe".into()]);

        let kept = keep_relevant(found.clone(), &profile);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "web1");

        assert_eq!(keep_relevant(found, &UserProfile::default()).len(), 2);
    }
}
