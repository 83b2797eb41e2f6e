use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A date as the upstream API's path accepts it: the literal `today`
/// keyword or a concrete `YYYY-MM-DD`. Serialized as that string, so job
/// payloads carry exactly what would appear in the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Today,
    On(NaiveDate),
}

impl std::fmt::Display for DateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateSpec::Today => f.write_str("today"),
            DateSpec::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl std::str::FromStr for DateSpec {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "today" {
            return Ok(DateSpec::Today);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(DateSpec::On)
    }
}

impl Serialize for DateSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_today_keyword_and_dates() {
        assert_eq!(DateSpec::Today.to_string(), "today");
        assert_eq!(
            DateSpec::On(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()).to_string(),
            "2026-08-06"
        );
    }

    #[test]
    fn parses_both_forms() {
        assert_eq!("today".parse::<DateSpec>().unwrap(), DateSpec::Today);
        assert_eq!(
            "2026-08-06".parse::<DateSpec>().unwrap(),
            DateSpec::On(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap())
        );
        assert!("not-a-date".parse::<DateSpec>().is_err());
    }

    #[test]
    fn serde_uses_the_path_form() {
        let json = serde_json::to_string(&DateSpec::Today).unwrap();
        assert_eq!(json, "\"today\"");

        let back: DateSpec = serde_json::from_str("\"2026-08-06\"").unwrap();
        assert_eq!(back, DateSpec::On(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()));
    }
}
