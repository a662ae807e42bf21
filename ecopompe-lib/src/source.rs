//! Where station data comes from and how it is turned into stations.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use chrono::NaiveDate;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Deserializer};
use url::Url;
use crate::price::Price;
use crate::station::Station;
use crate::{EcoPompeError, FuelType};

static USER_AGENT_VALUE: &str = concat!("ecopompe/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub trait Fetcher: Send + Sync {
    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>, EcoPompeError>;
}

pub trait Decoder: Send + Sync {
    /// An empty list means the source holds no stations, which is not an error.
    fn decode(&self, reader: &mut dyn Read) -> Result<Vec<Station>, EcoPompeError>;
}

/// Opens `http(s)://` locations over HTTP and everything else from disk.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    client: reqwest::blocking::Client,
}

impl UrlFetcher {
    pub fn new(timeout: Duration) -> Result<Self, EcoPompeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self, EcoPompeError> {
        Self::new(DEFAULT_TIMEOUT)
    }

    fn open_path(path: PathBuf) -> Result<Box<dyn Read + Send>, EcoPompeError> {
        debug!("opening station data file {}", path.display());
        Ok(Box::new(File::open(path)?))
    }
}

impl Fetcher for UrlFetcher {
    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>, EcoPompeError> {
        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => return Self::open_path(PathBuf::from(location)),
            Err(err) => {
                return Err(EcoPompeError::Location {
                    location: location.to_string(),
                    message: err.to_string(),
                });
            }
        };

        match url.scheme() {
            "http" | "https" => {
                debug!("requesting station data from {}", url);
                let response = self.client.get(url).send()?.error_for_status()?;
                Ok(Box::new(response))
            }
            "file" => {
                let path = url.to_file_path().map_err(|_| EcoPompeError::Location {
                    location: location.to_string(),
                    message: "not a local file path".to_string(),
                })?;
                Self::open_path(path)
            }
            scheme => Err(EcoPompeError::Location {
                location: location.to_string(),
                message: format!("unsupported scheme {}", scheme),
            }),
        }
    }
}

/// Decodes a JSON array of station records as published upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

#[derive(Deserialize)]
struct StationRecord {
    id: String,
    latitude: f64,
    longitude: f64,
    #[serde(rename = "cp", alias = "postcode")]
    postcode: String,
    #[serde(rename = "ville", alias = "town", default)]
    town: String,
    #[serde(rename = "adresse", alias = "address", default)]
    address: String,
    #[serde(rename = "prix", alias = "prices", default)]
    prices: Vec<PriceRecord>,
}

#[derive(Deserialize)]
struct PriceRecord {
    #[serde(rename = "id", alias = "fuel")]
    fuel: u8,
    #[serde(rename = "maj", alias = "updated", deserialize_with = "deserialize_day")]
    updated: NaiveDate,
    #[serde(rename = "valeur", alias = "value")]
    value: f32,
}

/// Timestamps such as `2018-04-04T10:01:02` or `2018-04-04 10:01:02` only
/// matter to the day.
fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

impl StationRecord {
    fn into_station(self) -> Result<Station, EcoPompeError> {
        let prices = self
            .prices
            .into_iter()
            .map(|p| Price::try_new(FuelType::from_id(p.fuel), p.updated, p.value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Station::new(
            self.id,
            self.latitude,
            self.longitude,
            self.postcode,
            self.town,
            self.address,
            prices,
        ))
    }
}

impl Decoder for JsonDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Vec<Station>, EcoPompeError> {
        let mut body = String::new();
        reader.read_to_string(&mut body)?;
        if body.trim().is_empty() {
            return Ok(vec![]);
        }

        let records: Vec<StationRecord> = serde_json::from_str(&body)?;
        records.into_iter().map(StationRecord::into_station).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use chrono::NaiveDate;
    use crate::source::{Decoder, Fetcher, JsonDecoder, UrlFetcher};
    use crate::{EcoPompeError, FuelType};

    const SAMPLE: &str = r#"[
        {"id": "1", "latitude": 4356000, "longitude": 407500, "cp": "75001", "ville": "Paris",
         "adresse": "Place Vendome", "prix": [{"id": 1, "maj": "2018-04-04T10:01:02", "valeur": 1.336}]},
        {"id": "2", "latitude": 43.561, "longitude": 4.076, "postcode": "75014", "town": "paris",
         "address": "Montparnasse", "prices": [
            {"fuel": 2, "updated": "2018-04-04 08:00:00", "value": 1.266},
            {"fuel": 6, "updated": "2018-04-04", "value": 1.442}
         ]},
        {"id": "3", "latitude": 43.562, "longitude": 4.077, "cp": "73100"}
    ]"#;

    fn decode(body: &str) -> Result<Vec<crate::Station>, EcoPompeError> {
        JsonDecoder.decode(&mut Cursor::new(body.as_bytes()))
    }

    #[test]
    fn decodes_upstream_and_english_field_names() {
        let stations = decode(SAMPLE).unwrap();
        assert_eq!(stations.len(), 3);

        let first = &stations[0];
        assert_eq!(first.latitude, 43.56);
        assert_eq!(first.longitude, 4.075);
        assert_eq!(first.town, "Paris");
        let diesel = first.price_for(FuelType::Diesel).unwrap();
        assert_eq!(diesel.updated, NaiveDate::from_ymd_opt(2018, 4, 4).unwrap());
        assert_eq!(diesel.value.into_inner(), 1.336);

        let second = &stations[1];
        assert_eq!(second.postcode, "75014");
        assert_eq!(second.prices.len(), 2);
        assert!(second.price_for(FuelType::Unleaded98).is_some());

        let third = &stations[2];
        assert!(third.prices.is_empty());
        assert_eq!(third.town, "");
    }

    #[test]
    fn blank_body_is_an_empty_list() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("  \n").unwrap().is_empty());
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(matches!(decode("<pdv_liste/>"), Err(EcoPompeError::Decode(_))));
        assert!(matches!(decode(r#"[{"id": "1"}]"#), Err(EcoPompeError::Decode(_))));
    }

    #[test]
    fn unknown_fuel_ids_are_kept_as_unknown() {
        let body = r#"[{"id": "1", "latitude": 45.0, "longitude": 2.0, "cp": "01000",
            "prix": [{"id": 12, "maj": "2018-04-04", "valeur": 1.1}]}]"#;
        let stations = decode(body).unwrap();
        assert!(stations[0].price_for(FuelType::Unknown).is_some());
    }

    #[test]
    fn opens_bare_paths_and_file_urls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let fetcher = UrlFetcher::with_default_timeout().unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let mut reader = fetcher.open(&path).unwrap();
        assert_eq!(JsonDecoder.decode(&mut reader).unwrap().len(), 3);

        let url = url::Url::from_file_path(file.path()).unwrap();
        let mut reader = fetcher.open(url.as_str()).unwrap();
        assert_eq!(JsonDecoder.decode(&mut reader).unwrap().len(), 3);
    }

    #[test]
    fn rejects_unsupported_locations() {
        let fetcher = UrlFetcher::with_default_timeout().unwrap();
        assert!(matches!(fetcher.open("ftp://example.org/data"), Err(EcoPompeError::Location { .. })));
        assert!(matches!(fetcher.open("/nonexistent/stations.json"), Err(EcoPompeError::Io(_))));
    }
}
