pub mod catalog;
pub mod clock;
pub mod distance;
pub mod names;
pub mod price;
pub mod provider;
pub mod ranker;
pub mod source;
pub mod spatial;
pub mod station;
pub mod text;

use std::fmt::Display;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

pub use crate::catalog::{postcodes_from_town_id, CatalogIndex};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::names::StationNames;
pub use crate::price::Price;
pub use crate::provider::{DataProvider, Generation, ProviderConfig};
pub use crate::ranker::{PriceRanker, RankingConfig};
pub use crate::source::{Decoder, Fetcher, JsonDecoder, UrlFetcher};
pub use crate::spatial::SpatialIndex;
pub use crate::station::{Position, Station};
pub use crate::text::{normalise_address, normalise_station_name, normalise_town};

#[derive(Eq, PartialEq, Hash, Debug, Copy, Clone, Serialize, Deserialize)]
pub enum FuelType {
    Unknown = 0,
    Diesel = 1,
    Unleaded95 = 2,
    E85 = 3,
    Lpg = 4,
    E10 = 5,
    Unleaded98 = 6,
}

impl FuelType {
    pub const ALL: [FuelType; 7] = [
        FuelType::Unknown,
        FuelType::Diesel,
        FuelType::Unleaded95,
        FuelType::E85,
        FuelType::Lpg,
        FuelType::E10,
        FuelType::Unleaded98,
    ];

    /// Upstream feeds identify fuels by their numeric id; anything we do not
    /// know about is kept as `Unknown` rather than rejected.
    pub fn from_id(id: u8) -> Self {
        Self::ALL
            .get(id as usize)
            .copied()
            .unwrap_or(FuelType::Unknown)
    }

    pub fn speech_text(&self) -> &'static str {
        match self {
            FuelType::Unknown => "du carburant inconnu",
            FuelType::Diesel => "du gazole",
            FuelType::Unleaded95 => "du sans plomb 95",
            FuelType::E85 => "de l'E85",
            FuelType::Lpg => "du GPL",
            FuelType::E10 => "de l'E10",
            FuelType::Unleaded98 => "du sans plomb 98",
        }
    }
}

impl Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuelType::Unknown => write!(f, "Inconnu"),
            FuelType::Diesel => write!(f, "Gazole"),
            FuelType::Unleaded95 => write!(f, "Sans Plomb 95"),
            FuelType::E85 => write!(f, "E85"),
            FuelType::Lpg => write!(f, "GPL"),
            FuelType::E10 => write!(f, "E10"),
            FuelType::Unleaded98 => write!(f, "Sans Plomb 98"),
        }
    }
}

impl FromStr for FuelType {
    type Err = EcoPompeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u8>() {
            return match Self::ALL.get(id as usize) {
                Some(fuel) => Ok(*fuel),
                None => Err(EcoPompeError::UnknownFuel(s.to_string())),
            };
        }

        let normalised = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalised.as_str() {
            "diesel" | "gazole" => Ok(FuelType::Diesel),
            "sp95" | "unleaded95" | "sansplomb95" => Ok(FuelType::Unleaded95),
            "sp98" | "unleaded98" | "sansplomb98" => Ok(FuelType::Unleaded98),
            "e10" => Ok(FuelType::E10),
            "e85" => Ok(FuelType::E85),
            "lpg" | "gpl" => Ok(FuelType::Lpg),
            _ => Err(EcoPompeError::UnknownFuel(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EcoPompeError {
    #[error("invalid data location {location}: {message}")]
    Location { location: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid price value for {0}")]
    InvalidPrice(FuelType),

    #[error("unknown fuel type {0}")]
    UnknownFuel(String),
}

#[cfg(test)]
mod tests {
    use crate::FuelType;

    #[test]
    fn fuel_type_from_id_falls_back_to_unknown() {
        assert_eq!(FuelType::from_id(1), FuelType::Diesel);
        assert_eq!(FuelType::from_id(6), FuelType::Unleaded98);
        assert_eq!(FuelType::from_id(42), FuelType::Unknown);
    }

    #[test]
    fn fuel_type_parses_names_and_ids() {
        assert_eq!("gazole".parse::<FuelType>().unwrap(), FuelType::Diesel);
        assert_eq!("Sans Plomb 95".parse::<FuelType>().unwrap(), FuelType::Unleaded95);
        assert_eq!("sp-98".parse::<FuelType>().unwrap(), FuelType::Unleaded98);
        assert_eq!("GPL".parse::<FuelType>().unwrap(), FuelType::Lpg);
        assert_eq!("5".parse::<FuelType>().unwrap(), FuelType::E10);
        assert!("9".parse::<FuelType>().is_err());
        assert!("kerosene".parse::<FuelType>().is_err());
    }

    #[test]
    fn fuel_type_display_names() {
        assert_eq!(FuelType::Diesel.to_string(), "Gazole");
        assert_eq!(FuelType::Unleaded95.to_string(), "Sans Plomb 95");
        assert_eq!(FuelType::E85.speech_text(), "de l'E85");
    }
}
