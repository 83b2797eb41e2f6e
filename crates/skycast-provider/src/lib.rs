pub mod date;

pub use date::DateSpec;

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use skycast_types::location::LocationRef;
use tracing::error;

pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

const DEFAULT_INCLUDE: &str = "days,hours,current";
const DEFAULT_FORECAST_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to fetch weather data: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("weather provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to parse weather provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pass-through client for the upstream weather API. Builds the request
/// path from a [`LocationRef`] and a date range, and hands the response
/// back as opaque JSON. No retries at this layer — that is the caller's
/// (or the job runner's) concern — and no explicit timeout beyond the
/// transport's defaults.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    unit_group: String,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            unit_group: "metric".into(),
        }
    }

    /// Reads `SKYCAST_WEATHER_BASE_URL`, `SKYCAST_WEATHER_API_KEY` and
    /// `SKYCAST_WEATHER_UNIT_GROUP`; the key is mandatory.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var("SKYCAST_WEATHER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let api_key = std::env::var("SKYCAST_WEATHER_API_KEY")
            .map_err(|_| anyhow::anyhow!("SKYCAST_WEATHER_API_KEY is not set"))?;

        let mut client = Self::new(base_url, api_key);
        if let Ok(unit_group) = std::env::var("SKYCAST_WEATHER_UNIT_GROUP") {
            client.unit_group = unit_group;
        }
        Ok(client)
    }

    /// Fetches weather for a date range. Defaults: start = today,
    /// end = today + 7 days.
    pub async fn fetch(
        &self,
        location: &LocationRef,
        start: Option<DateSpec>,
        end: Option<DateSpec>,
    ) -> Result<Value, ProviderError> {
        let (default_start, default_end) = default_window();
        let start = start.unwrap_or(DateSpec::On(default_start));
        let end = end.unwrap_or(DateSpec::On(default_end));

        self.request(location, start, end, DEFAULT_INCLUDE).await
    }

    /// Current conditions only.
    pub async fn fetch_current(&self, location: &LocationRef) -> Result<Value, ProviderError> {
        self.request(location, DateSpec::Today, DateSpec::Today, "current").await
    }

    /// One historical day.
    pub async fn fetch_historical(
        &self,
        location: &LocationRef,
        date: chrono::NaiveDate,
    ) -> Result<Value, ProviderError> {
        self.request(location, DateSpec::On(date), DateSpec::On(date), DEFAULT_INCLUDE).await
    }

    async fn request(
        &self,
        location: &LocationRef,
        start: DateSpec,
        end: DateSpec,
        include: &str,
    ) -> Result<Value, ProviderError> {
        let url = self.request_url(location, start, end);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("unitGroup", self.unit_group.as_str()),
                ("include", include),
                ("key", self.api_key.as_str()),
                ("contentType", "json"),
            ])
            .send()
            .await
            .inspect_err(|e| error!("Error fetching weather data: {}", e))?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            error!("Weather provider returned {}: {}", status, truncate_body(&body));
            return Err(ProviderError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// `{base}/{location}/{start}/{end}` — the location segment is either
    /// a `lat,lon` pair or a free-text address.
    fn request_url(&self, location: &LocationRef, start: DateSpec, end: DateSpec) -> String {
        format!("{}/{}/{}/{}", self.base_url, location.path_segment(), start, end)
    }
}

fn default_window() -> (chrono::NaiveDate, chrono::NaiveDate) {
    let today = Utc::now().date_naive();
    (today, today + chrono::Duration::days(DEFAULT_FORECAST_DAYS))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn client() -> WeatherClient {
        WeatherClient::new("https://example.test/timeline", "KEY")
    }

    #[test]
    fn url_for_coordinates() {
        let loc = LocationRef::Coordinates {
            lat: Decimal::from_str("50.450100").unwrap(),
            lon: Decimal::from_str("30.523400").unwrap(),
        };
        let start = DateSpec::On(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
        let end = DateSpec::On(NaiveDate::from_ymd_opt(2026, 8, 9).unwrap());

        assert_eq!(
            client().request_url(&loc, start, end),
            "https://example.test/timeline/50.450100,30.523400/2026-08-06/2026-08-09"
        );
    }

    #[test]
    fn url_for_address_with_today_keyword() {
        let loc = LocationRef::Address("Kyiv".into());

        assert_eq!(
            client().request_url(&loc, DateSpec::Today, DateSpec::Today),
            "https://example.test/timeline/Kyiv/today/today"
        );
    }

    #[test]
    fn default_window_spans_seven_days() {
        let (start, end) = default_window();
        assert_eq!(end - start, chrono::Duration::days(7));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }
}
