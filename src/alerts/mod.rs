//! Agricultural advisories ranked against a producer profile

pub mod catalog;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::risk::tables::normalize;

/// Relevance above this puts an alert in the "for you" tab.
pub const FOR_YOU_ABOVE: u8 = 60;

const BASE_RELEVANCE: u8 = 50;
const LOCATION_MATCH: u8 = 30;
const CROP_MATCH: u8 = 25;
const NATIONAL: &str = "nacional";
const ALL_CROPS: &str = "todos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "climatica")]
    Climate,
    #[serde(alias = "suministro")]
    Supply,
    #[serde(alias = "precios")]
    Prices,
    #[serde(alias = "infraestructura")]
    Infrastructure,
    #[serde(alias = "normativa")]
    Regulatory,
    #[serde(alias = "mercado")]
    Market,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "climate" | "climatica" => Ok(Category::Climate),
            "supply" | "suministro" => Ok(Category::Supply),
            "prices" | "precios" => Ok(Category::Prices),
            "infrastructure" | "infraestructura" => Ok(Category::Infrastructure),
            "regulatory" | "normativa" => Ok(Category::Regulatory),
            "market" | "mercado" => Ok(Category::Market),
            other => Err(format!("unknown alert category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[serde(alias = "critica")]
    Critical,
    #[serde(alias = "alta")]
    High,
    #[serde(alias = "media")]
    Medium,
    #[serde(alias = "baja")]
    Low,
    #[serde(alias = "informativa")]
    Informational,
}

impl Severity {
    pub fn weight(self) -> u8 {
        match self {
            Severity::Critical => 20,
            Severity::High => 15,
            Severity::Medium => 10,
            Severity::Low => 5,
            Severity::Informational => 0,
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "critical" | "critica" => Ok(Severity::Critical),
            "high" | "alta" => Ok(Severity::High),
            "medium" | "media" => Ok(Severity::Medium),
            "low" | "baja" => Ok(Severity::Low),
            "informational" | "informativa" => Ok(Severity::Informational),
            other => Err(format!("unknown alert severity '{other}'")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Informational => "informational",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub location: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub source: String,
    #[serde(default)]
    pub impact: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub contact: Option<AlertContact>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub verified: bool,
    /// `None` means the alert doesn't name crops; `todos` means every crop.
    #[serde(default)]
    pub affected_crops: Option<Vec<String>>,
    #[serde(default)]
    pub from_web: bool,
}

fn default_true() -> bool {
    true
}

impl Alert {
    pub fn is_national(&self) -> bool {
        normalize(&self.location) == NATIONAL
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expiry| expiry < now)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile location is required")]
    MissingLocation,
    #[error("profile needs at least one crop")]
    NoCrops,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerSize {
    #[default]
    #[serde(alias = "pequeno", alias = "pequeño")]
    Small,
    #[serde(alias = "mediano")]
    Medium,
    #[serde(alias = "grande")]
    Large,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub location: String,
    pub crops: Vec<String>,
    pub producer_size: ProducerSize,
    pub configured: bool,
}

impl UserProfile {
    /// Build a configured profile. Blank crop names are dropped, and a location
    /// made only of separators counts as missing.
    pub fn configure(
        location: &str,
        crops: impl IntoIterator<Item = impl Into<String>>,
        producer_size: ProducerSize,
    ) -> Result<Self, ProfileError> {
        let location = location.trim();
        if normalize(location).is_empty() {
            return Err(ProfileError::MissingLocation);
        }
        let crops: Vec<String> = crops
            .into_iter()
            .map(Into::into)
            .filter(|crop: &String| !crop.trim().is_empty())
            .collect();
        if crops.is_empty() {
            return Err(ProfileError::NoCrops);
        }
        Ok(Self {
            location: location.to_string(),
            crops,
            producer_size,
            configured: true,
        })
    }
}

/// Additive relevance of `alert` for `profile`, capped at 100.
pub fn relevance(alert: &Alert, profile: &UserProfile) -> u8 {
    if !profile.configured {
        return BASE_RELEVANCE;
    }
    let mut score = BASE_RELEVANCE;

    let alert_location = normalize(&alert.location);
    if alert_location.contains(&normalize(&profile.location)) || alert.is_national() {
        score += LOCATION_MATCH;
    }

    if let Some(affected) = &alert.affected_crops {
        let affected: Vec<String> = affected.iter().map(|crop| normalize(crop)).collect();
        let overlaps = affected.iter().any(|crop| crop == ALL_CROPS)
            || profile
                .crops
                .iter()
                .any(|crop| affected.contains(&normalize(crop)));
        if overlaps {
            score += CROP_MATCH;
        }
    }

    (score + alert.severity.weight()).min(100)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAlert {
    #[serde(flatten)]
    pub alert: Alert,
    pub relevance: u8,
}

/// Score every alert and sort by relevance, highest first. Ties keep input order.
pub fn personalize<'a>(
    alerts: impl IntoIterator<Item = &'a Alert>,
    profile: &UserProfile,
) -> Vec<ScoredAlert> {
    let mut scored: Vec<ScoredAlert> = alerts
        .into_iter()
        .map(|alert| ScoredAlert {
            relevance: relevance(alert, profile),
            alert: alert.clone(),
        })
        .collect();
    scored.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    scored
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    All,
    ForYou,
    Web,
    Category(Category),
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "" | "all" | "todas" => Ok(Tab::All),
            "for you" | "personalizadas" => Ok(Tab::ForYou),
            "web" => Ok(Tab::Web),
            other => other
                .parse()
                .map(Tab::Category)
                .map_err(|_| format!("unknown alert tab '{value}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub tab: Tab,
    pub severity: Option<Severity>,
    pub location: Option<String>,
    pub query: Option<String>,
    /// When set, inactive alerts and alerts expired by this instant are hidden.
    pub current_at: Option<DateTime<Utc>>,
}

impl AlertFilter {
    pub fn matches(&self, scored: &ScoredAlert) -> bool {
        let alert = &scored.alert;
        let tab = match self.tab {
            Tab::All => true,
            Tab::ForYou => scored.relevance > FOR_YOU_ABOVE,
            Tab::Web => alert.from_web,
            Tab::Category(category) => alert.category == category,
        };
        let severity = self.severity.map_or(true, |s| alert.severity == s);
        let location = self.location.as_deref().map_or(true, |needle| {
            normalize(&alert.location).contains(&normalize(needle))
        });
        let query = self.query.as_deref().map_or(true, |needle| {
            let needle = normalize(needle);
            normalize(&alert.title).contains(&needle)
                || normalize(&alert.description).contains(&needle)
        });
        let current = self
            .current_at
            .map_or(true, |now| alert.active && !alert.is_expired(now));
        tab && severity && location && query && current
    }

    pub fn apply(&self, alerts: Vec<ScoredAlert>) -> Vec<ScoredAlert> {
        alerts.into_iter().filter(|a| self.matches(a)).collect()
    }
}

/// Header badge counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub critical: usize,
    pub for_you: usize,
    pub web: usize,
}

pub fn summarize(alerts: &[ScoredAlert]) -> AlertSummary {
    AlertSummary {
        critical: alerts
            .iter()
            .filter(|a| a.alert.active && a.alert.severity == Severity::Critical)
            .count(),
        for_you: alerts
            .iter()
            .filter(|a| a.relevance > FOR_YOU_ABOVE)
            .count(),
        web: alerts.iter().filter(|a| a.alert.from_web).count(),
    }
}

/// Built-in alerts plus the results of the latest web search.
#[derive(Debug, Clone, Default)]
pub struct AlertFeed {
    base: Vec<Alert>,
    web: Vec<Alert>,
}

impl AlertFeed {
    pub fn new(base: Vec<Alert>) -> Self {
        Self {
            base,
            web: Vec::new(),
        }
    }

    pub fn builtin() -> Result<Self, catalog::CatalogError> {
        Ok(Self::new(catalog::base_alerts()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.base.iter().chain(self.web.iter())
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.web.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace earlier web results; base alerts always come first.
    pub fn set_web_results(&mut self, web: Vec<Alert>) {
        self.web = web;
    }

    pub fn personalized(&self, profile: &UserProfile) -> Vec<ScoredAlert> {
        personalize(self.iter(), profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(location: &str, crops: Option<&[&str]>, severity: Severity) -> Alert {
        Alert {
            id: "t".into(),
            title: "Heladas".into(),
            description: "Temperaturas bajo cero".into(),
            category: Category::Climate,
            severity,
            location: location.into(),
            created_at: DateTime::<Utc>::default(),
            expires_at: None,
            source: "SENAMHI".into(),
            impact: Vec::new(),
            recommendations: Vec::new(),
            contact: None,
            active: true,
            verified: true,
            affected_crops: crops.map(|c| c.iter().map(|s| s.to_string()).collect()),
            from_web: false,
        }
    }

    fn profile() -> UserProfile {
        UserProfile::configure("La Paz", ["papa", "Quinua"], ProducerSize::Small).unwrap()
    }

    #[test]
    fn unconfigured_profile_scores_fifty() {
        let frost = alert("La Paz - Altiplano", Some(&["papa"]), Severity::Critical);
        assert_eq!(relevance(&frost, &UserProfile::default()), 50);
    }

    #[test]
    fn location_crop_and_severity_add_up_to_the_cap() {
        let frost = alert("La Paz - Altiplano", Some(&["papa", "quinua"]), Severity::Critical);
        assert_eq!(relevance(&frost, &profile()), 100);

        let drought = alert("Santa Cruz - Chaco", Some(&["soya", "maíz"]), Severity::Critical);
        assert_eq!(relevance(&drought, &profile()), 70);
    }

    #[test]
    fn national_alerts_and_all_crops_match_everyone() {
        let fuel = alert("Nacional", Some(&["todos"]), Severity::Medium);
        assert_eq!(relevance(&fuel, &profile()), 100);

        let rule = alert("Nacional", None, Severity::Medium);
        assert_eq!(relevance(&rule, &profile()), 90);
    }

    #[test]
    fn crop_names_compare_case_insensitively() {
        let price = alert("Altiplano", Some(&["QUINUA"]), Severity::Informational);
        assert_eq!(relevance(&price, &profile()), 75);
    }

    #[test]
    fn personalize_sorts_descending_and_keeps_ties_stable() {
        let mut a = alert("Cochabamba", None, Severity::Medium);
        a.id = "a".into();
        let mut b = alert("La Paz", None, Severity::Low);
        b.id = "b".into();
        let mut c = alert("Oruro", None, Severity::Medium);
        c.id = "c".into();
        let alerts = vec![a, b, c];

        let ranked = personalize(&alerts, &profile());
        let ids: Vec<&str> = ranked.iter().map(|s| s.alert.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn configure_requires_location_and_crops() {
        assert_eq!(
            UserProfile::configure("  ", ["papa"], ProducerSize::Small),
            Err(ProfileError::MissingLocation)
        );
        assert_eq!(
            UserProfile::configure("Puno", Vec::<String>::new(), ProducerSize::Small),
            Err(ProfileError::NoCrops)
        );
        assert_eq!(
            UserProfile::configure("Puno", [" "], ProducerSize::Large),
            Err(ProfileError::NoCrops)
        );
    }

    #[test]
    fn separator_only_location_is_missing() {
        for location in ["-", " _ - ", "--"] {
            assert_eq!(
                UserProfile::configure(location, ["uva"], ProducerSize::Small),
                Err(ProfileError::MissingLocation)
            );
        }
    }

    #[test]
    fn current_filter_hides_expired_and_inactive_alerts() {
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
        let mut expired = alert("Oruro", None, Severity::High);
        expired.id = "expired".into();
        expired.expires_at = Some(Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
        let mut upcoming = alert("Potosi", None, Severity::High);
        upcoming.id = "upcoming".into();
        upcoming.expires_at = Some(Utc.with_ymd_and_hms(2024, 6, 13, 0, 0, 0).unwrap());
        let mut withdrawn = alert("Tarija", None, Severity::High);
        withdrawn.id = "withdrawn".into();
        withdrawn.active = false;
        let open_ended = alert("Beni", None, Severity::High);

        assert!(expired.is_expired(now));
        assert!(!upcoming.is_expired(now));
        assert!(!open_ended.is_expired(now));

        let alerts = personalize(&[expired, upcoming, withdrawn, open_ended], &profile());
        assert_eq!(AlertFilter::default().apply(alerts.clone()).len(), 4);

        let current = AlertFilter {
            current_at: Some(now),
            ..AlertFilter::default()
        };
        let ids: Vec<String> = current
            .apply(alerts)
            .into_iter()
            .map(|a| a.alert.id)
            .collect();
        assert_eq!(ids, vec!["upcoming".to_string(), "t".to_string()]);
    }

    #[test]
    fn tabs_parse_english_and_spanish_names() {
        assert_eq!("todas".parse::<Tab>(), Ok(Tab::All));
        assert_eq!("for_you".parse::<Tab>(), Ok(Tab::ForYou));
        assert_eq!(
            "climatica".parse::<Tab>(),
            Ok(Tab::Category(Category::Climate))
        );
        assert!("weather".parse::<Tab>().is_err());
    }

    #[test]
    fn filter_combines_every_criterion() {
        let mut web = alert("Altiplano", Some(&["papa"]), Severity::High);
        web.from_web = true;
        web.title = "Nueva plaga en papa".into();
        let alerts = personalize(
            &[
                alert("La Paz - Altiplano", Some(&["papa"]), Severity::Critical),
                alert("Santa Cruz", None, Severity::Low),
                web,
            ],
            &profile(),
        );

        let web_only = AlertFilter {
            tab: Tab::Web,
            ..AlertFilter::default()
        };
        assert_eq!(web_only.apply(alerts.clone()).len(), 1);

        let for_you = AlertFilter {
            tab: Tab::ForYou,
            ..AlertFilter::default()
        };
        assert_eq!(for_you.apply(alerts.clone()).len(), 2);

        let search = AlertFilter {
            severity: Some(Severity::High),
            location: Some("altiplano".into()),
            query: Some("PLAGA".into()),
            ..AlertFilter::default()
        };
        assert_eq!(search.apply(alerts.clone()).len(), 1);

        let summary = summarize(&alerts);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.for_you, 2);
        assert_eq!(summary.web, 1);
    }
}
