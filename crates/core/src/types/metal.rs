//! Precious metals and purity grades.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Metal a piece of jewelry (or a savings plan) is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.metal_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MetalType {
    Gold,
    Silver,
    Platinum,
}

impl std::fmt::Display for MetalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gold => write!(f, "gold"),
            Self::Silver => write!(f, "silver"),
            Self::Platinum => write!(f, "platinum"),
        }
    }
}

impl std::str::FromStr for MetalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gold" => Ok(Self::Gold),
            "silver" => Ok(Self::Silver),
            "platinum" => Ok(Self::Platinum),
            _ => Err(format!("invalid metal: {s}")),
        }
    }
}

/// Purity grade. Karats for gold, millesimal fineness for silver and platinum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.purity", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Purity {
    K24,
    K22,
    K18,
    K14,
    Silver999,
    Silver925,
    Pt950,
}

impl Purity {
    /// All purity grades.
    pub const ALL: [Self; 7] = [
        Self::K24,
        Self::K22,
        Self::K18,
        Self::K14,
        Self::Silver999,
        Self::Silver925,
        Self::Pt950,
    ];

    /// The metal this grade belongs to.
    #[must_use]
    pub const fn metal(self) -> MetalType {
        match self {
            Self::K24 | Self::K22 | Self::K18 | Self::K14 => MetalType::Gold,
            Self::Silver999 | Self::Silver925 => MetalType::Silver,
            Self::Pt950 => MetalType::Platinum,
        }
    }

    /// Whether this grade can describe the given metal.
    #[must_use]
    pub fn is_valid_for(self, metal: MetalType) -> bool {
        self.metal() == metal
    }

    /// Fraction of pure metal, as hallmarked (22K is 916 fineness).
    #[must_use]
    pub fn fineness(self) -> Decimal {
        let per_mille = match self {
            Self::K24 | Self::Silver999 => 999,
            Self::K22 => 916,
            Self::K18 => 750,
            Self::K14 => 585,
            Self::Silver925 => 925,
            Self::Pt950 => 950,
        };
        Decimal::new(per_mille, 3)
    }
}

impl std::fmt::Display for Purity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::K24 => "k24",
            Self::K22 => "k22",
            Self::K18 => "k18",
            Self::K14 => "k14",
            Self::Silver999 => "silver999",
            Self::Silver925 => "silver925",
            Self::Pt950 => "pt950",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Purity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.to_string() == s)
            .ok_or_else(|| format!("invalid purity: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_purity_metal_mapping() {
        assert_eq!(Purity::K22.metal(), MetalType::Gold);
        assert_eq!(Purity::Silver925.metal(), MetalType::Silver);
        assert_eq!(Purity::Pt950.metal(), MetalType::Platinum);
        assert!(Purity::K18.is_valid_for(MetalType::Gold));
        assert!(!Purity::K18.is_valid_for(MetalType::Silver));
    }

    #[test]
    fn test_fineness() {
        assert_eq!(Purity::K22.fineness(), Decimal::new(916, 3));
        assert_eq!(Purity::Silver925.fineness(), Decimal::new(925, 3));
    }

    #[test]
    fn test_purity_string_roundtrip() {
        for purity in Purity::ALL {
            assert_eq!(purity.to_string().parse::<Purity>().unwrap(), purity);
        }
        assert!("k21".parse::<Purity>().is_err());
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&Purity::Silver999).unwrap();
        assert_eq!(json, "\"silver999\"");
        let json = serde_json::to_string(&MetalType::Platinum).unwrap();
        assert_eq!(json, "\"platinum\"");
    }
}
