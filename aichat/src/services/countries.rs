//! Country and dial-code lookup for the login screen.
//!
//! [`HttpCountryDirectory`] queries the REST Countries API; a failure there
//! is never fatal. [`load_countries`] turns it into an empty list and an
//! error notice.

use std::time::Duration;

use serde::Deserialize;

use aichat_proto::user::{Country, validate_country_code};

use crate::notify::Notifier;

/// Public endpoint returning every country with its name, dial code and flag.
pub const DEFAULT_ENDPOINT: &str = "https://restcountries.com/v3.1/all?fields=name,idd,flag";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while fetching the country list.
#[derive(Debug, thiserror::Error)]
pub enum CountryError {
    /// The request could not be sent or the body could not be read.
    #[error("country lookup failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("country lookup returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Lists the countries offered in the dial-code selector.
pub trait CountryDirectory: Send + Sync {
    /// Returns countries sorted by name.
    fn countries(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Country>, CountryError>> + Send;
}

#[derive(Deserialize)]
struct RestCountry {
    name: RestName,
    #[serde(default)]
    idd: RestIdd,
    #[serde(default)]
    flag: Option<String>,
}

#[derive(Deserialize)]
struct RestName {
    common: String,
}

#[derive(Default, Deserialize)]
struct RestIdd {
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    suffixes: Vec<String>,
}

impl RestCountry {
    /// Flattens into a selector entry. Entries without a usable dial code
    /// are skipped.
    fn into_country(self) -> Option<Country> {
        let root = self.idd.root?;
        let dial_code = dial_code(&root, &self.idd.suffixes)?;
        Some(Country {
            name: self.name.common,
            dial_code,
            flag: self.flag.filter(|f| !f.is_empty()),
        })
    }
}

/// Combines an IDD root and its suffixes into one dial code.
///
/// A root with several suffixes is itself the dial code when it is `+1` or
/// already carries two or more digits (area codes follow). Otherwise the
/// first suffix that completes a valid code is appended.
fn dial_code(root: &str, suffixes: &[String]) -> Option<String> {
    let root_digits = root.trim_start_matches('+').len();
    let shared_root = suffixes.len() > 1 && (root == "+1" || root_digits >= 2);
    if suffixes.is_empty() || shared_root {
        return validate_country_code(root).ok().map(|()| root.to_string());
    }
    suffixes
        .iter()
        .map(|suffix| format!("{root}{suffix}"))
        .find(|code| validate_country_code(code).is_ok())
}

fn flatten(raw: Vec<RestCountry>) -> Vec<Country> {
    let mut countries: Vec<Country> = raw
        .into_iter()
        .filter_map(RestCountry::into_country)
        .collect();
    countries.sort_by(|a, b| a.name.cmp(&b.name));
    countries
}

/// Directory backed by the REST Countries HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCountryDirectory {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCountryDirectory {
    /// Creates a directory querying `endpoint` with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CountryError::Http`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CountryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CountryDirectory for HttpCountryDirectory {
    async fn countries(&self) -> Result<Vec<Country>, CountryError> {
        let response = self.client.get(&self.endpoint).send().await?;
        if !response.status().is_success() {
            return Err(CountryError::Status(response.status()));
        }
        let raw: Vec<RestCountry> = response.json().await?;
        let countries = flatten(raw);
        tracing::debug!(count = countries.len(), "country list fetched");
        Ok(countries)
    }
}

/// Directory serving a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticCountryDirectory {
    countries: Vec<Country>,
}

impl StaticCountryDirectory {
    /// Serves `countries`, sorted by name.
    #[must_use]
    pub fn new(mut countries: Vec<Country>) -> Self {
        countries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { countries }
    }

    /// A short built-in list used when running offline.
    #[must_use]
    pub fn builtin() -> Self {
        let entry = |name: &str, dial_code: &str, flag: &str| Country {
            name: name.to_string(),
            dial_code: dial_code.to_string(),
            flag: Some(flag.to_string()),
        };
        Self::new(vec![
            entry("United States", "+1", "🇺🇸"),
            entry("United Kingdom", "+44", "🇬🇧"),
            entry("India", "+91", "🇮🇳"),
            entry("Germany", "+49", "🇩🇪"),
            entry("France", "+33", "🇫🇷"),
            entry("Japan", "+81", "🇯🇵"),
            entry("Brazil", "+55", "🇧🇷"),
            entry("Australia", "+61", "🇦🇺"),
            entry("Nigeria", "+234", "🇳🇬"),
            entry("Canada", "+1", "🇨🇦"),
        ])
    }
}

impl CountryDirectory for StaticCountryDirectory {
    async fn countries(&self) -> Result<Vec<Country>, CountryError> {
        Ok(self.countries.clone())
    }
}

/// Either directory, chosen at startup from configuration.
#[derive(Debug, Clone)]
pub enum AnyCountryDirectory {
    /// Network lookup.
    Http(HttpCountryDirectory),
    /// Fixed list.
    Static(StaticCountryDirectory),
}

impl CountryDirectory for AnyCountryDirectory {
    async fn countries(&self) -> Result<Vec<Country>, CountryError> {
        match self {
            Self::Http(d) => d.countries().await,
            Self::Static(d) => d.countries().await,
        }
    }
}

/// Fetches the country list, degrading to an empty list and an error
/// notice on failure.
pub async fn load_countries<D: CountryDirectory>(
    directory: &D,
    notifier: &Notifier,
) -> Vec<Country> {
    match directory.countries().await {
        Ok(countries) => countries,
        Err(e) => {
            tracing::warn!(error = %e, "could not load country list");
            notifier.error("Could not load the country list");
            Vec::new()
        }
    }
}
