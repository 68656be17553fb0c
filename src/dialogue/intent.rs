use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ObservationError;

/// Top-level user goal. Closed set; the wire label is snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    GetBeerRecommendation,
    GetBeerInfo,
    ListBeersByBrewery,
    GetTopRated,
    RateBeer,
    OutOfContext,
    TerminateSystem,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::GetBeerRecommendation,
        Intent::GetBeerInfo,
        Intent::ListBeersByBrewery,
        Intent::GetTopRated,
        Intent::RateBeer,
        Intent::OutOfContext,
        Intent::TerminateSystem,
    ];

    /// Static slot table. Order here is the order slots are serialized in.
    pub fn slots(&self) -> &'static [&'static str] {
        match self {
            Intent::GetBeerRecommendation => &["style", "abv", "ibu", "rating"],
            Intent::GetBeerInfo => &["name", "brewery"],
            Intent::ListBeersByBrewery => &["brewery"],
            Intent::GetTopRated => &["style"],
            Intent::RateBeer => &["name", "rating", "comment"],
            Intent::OutOfContext => &[],
            Intent::TerminateSystem => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Intent::GetBeerRecommendation => "get_beer_recommendation",
            Intent::GetBeerInfo => "get_beer_info",
            Intent::ListBeersByBrewery => "list_beers_by_brewery",
            Intent::GetTopRated => "get_top_rated",
            Intent::RateBeer => "rate_beer",
            Intent::OutOfContext => "out_of_context",
            Intent::TerminateSystem => "terminate_system",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Intent {
    type Err = ObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Intent::ALL
            .iter()
            .copied()
            .find(|i| i.label() == label)
            .ok_or_else(|| ObservationError::UnknownIntent(label.to_string()))
    }
}

/// A set slot value. "Unset" is always `Option::None` around this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Text(String),
    Number(f64),
    Flag(bool),
    List(Vec<SlotValue>),
}

impl SlotValue {
    /// Numeric reading: numbers as-is, text if it parses.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SlotValue::Number(n) => Some(*n),
            SlotValue::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text reading used by the text filters.
    pub fn as_text(&self) -> String {
        match self {
            SlotValue::Text(t) => t.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Text(t) => f.write_str(t),
            SlotValue::Number(n) => write!(f, "{}", n),
            SlotValue::Flag(b) => write!(f, "{}", b),
            SlotValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}
