use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Clinical significance classification level.
///
/// Ordering follows significance: tier I is the strongest call. The
/// derived `Ord` puts `I` first, which makes "most significant" the
/// minimum; keep that in mind when sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    I,
    II,
    III,
    IV,
    Unclassified,
}

impl Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::I => "I",
            Tier::II => "II",
            Tier::III => "III",
            Tier::IV => "IV",
            Tier::Unclassified => "unclassified",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "I" | "1" => Ok(Tier::I),
            "II" | "2" => Ok(Tier::II),
            "III" | "3" => Ok(Tier::III),
            "IV" | "4" => Ok(Tier::IV),
            "unclassified" | "U" => Ok(Tier::Unclassified),
            other => Err(format!("unknown tier: {other:?}")),
        }
    }
}
