use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the upstream weather API is queried for: either a stored location's
/// coordinate pair or a free-text address. The variant decides how the
/// request path is formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRef {
    Coordinates { lat: Decimal, lon: Decimal },
    Address(String),
}

impl LocationRef {
    /// The path segment the provider expects: `"{lat},{lon}"` for a
    /// coordinate pair, the address text otherwise.
    pub fn path_segment(&self) -> String {
        match self {
            LocationRef::Coordinates { lat, lon } => format!("{},{}", lat, lon),
            LocationRef::Address(address) => address.clone(),
        }
    }
}

impl std::fmt::Display for LocationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn coordinates_format_as_comma_pair() {
        let loc = LocationRef::Coordinates {
            lat: Decimal::from_str("50.450100").unwrap(),
            lon: Decimal::from_str("30.523400").unwrap(),
        };
        assert_eq!(loc.path_segment(), "50.450100,30.523400");
    }

    #[test]
    fn address_formats_as_text() {
        let loc = LocationRef::Address("Kyiv, Ukraine".into());
        assert_eq!(loc.path_segment(), "Kyiv, Ukraine");
    }

    #[test]
    fn serde_roundtrip() {
        let loc = LocationRef::Coordinates {
            lat: Decimal::from_str("-33.868800").unwrap(),
            lon: Decimal::from_str("151.209300").unwrap(),
        };
        let json = serde_json::to_string(&loc).unwrap();
        let back: LocationRef = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}
