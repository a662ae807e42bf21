use serde::Serialize;
use crate::price::Price;
use crate::FuelType;

/// Upstream feeds have been seen publishing coordinates multiplied by this factor.
const COORDINATE_SCALE_DOWN_FACTOR: f64 = 100000.0;

const DEPARTMENT_LEN: usize = 2;

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Station {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub postcode: String,
    pub town: String,
    pub address: String,
    pub prices: Vec<Price>,
}

impl Station {
    /// Builds a station, repairing the coordinate quirks of the upstream feed:
    /// axes are swapped back when longitude has the larger magnitude, and both
    /// values are scaled down when latitude falls outside -90..90.
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        postcode: impl Into<String>,
        town: impl Into<String>,
        address: impl Into<String>,
        prices: Vec<Price>,
    ) -> Self {
        let (latitude, longitude) = normalise_coordinates(latitude, longitude);
        Self {
            id: id.into(),
            latitude,
            longitude,
            postcode: postcode.into(),
            town: town.into(),
            address: address.into(),
            prices,
        }
    }

    pub fn price_for(&self, fuel: FuelType) -> Option<&Price> {
        self.prices.iter().find(|p| p.fuel == fuel)
    }

    /// French departments are the first two characters of the postcode.
    pub fn department(&self) -> &str {
        match self.postcode.char_indices().nth(DEPARTMENT_LEN) {
            Some((end, _)) => &self.postcode[..end],
            None => &self.postcode,
        }
    }
}

fn normalise_coordinates(latitude: f64, longitude: f64) -> (f64, f64) {
    let (latitude, longitude) = if longitude.abs() > latitude.abs() {
        (longitude, latitude)
    } else {
        (latitude, longitude)
    };

    if latitude.abs() > 90.0 {
        (
            latitude / COORDINATE_SCALE_DOWN_FACTOR,
            longitude / COORDINATE_SCALE_DOWN_FACTOR,
        )
    } else {
        (latitude, longitude)
    }
}

#[derive(Copy, Clone, Serialize, Debug, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::price::Price;
    use crate::station::Station;
    use crate::FuelType;

    #[test]
    fn scales_down_coordinates_in_wrong_order_of_magnitude() {
        let station = Station::new("1", 4356100.0, -107600.0, "75001", "Paris", "rue Cler", vec![]);
        assert_eq!(station.latitude, 43.561);
        assert_eq!(station.longitude, -1.076);
    }

    #[test]
    fn swaps_inverted_axes() {
        let station = Station::new("1", 4.076, 43.561, "75001", "Paris", "rue Cler", vec![]);
        assert_eq!(station.latitude, 43.561);
        assert_eq!(station.longitude, 4.076);
    }

    #[test]
    fn swaps_then_scales_inverted_raw_coordinates() {
        let station = Station::new("1", 407600.0, 4356100.0, "75001", "Paris", "rue Cler", vec![]);
        assert_eq!(station.latitude, 43.561);
        assert_eq!(station.longitude, 4.076);
    }

    #[test]
    fn keeps_well_formed_coordinates() {
        let station = Station::new("1", 45.0, 2.0, "01000", "t", "a", vec![]);
        assert_eq!(station.latitude, 45.0);
        assert_eq!(station.longitude, 2.0);
    }

    #[test]
    fn returns_price_for_fuel_type() {
        let price1 = Price::try_new(FuelType::E85, NaiveDate::from_ymd_opt(2018, 4, 4).unwrap(), 1.0).unwrap();
        let price2 = Price::try_new(FuelType::Unleaded98, NaiveDate::from_ymd_opt(2018, 4, 5).unwrap(), 1.0).unwrap();
        let station = Station::new("1", 4.076, 43.561, "75001", "Paris", "rue Cler", vec![price1, price2]);

        assert_eq!(station.price_for(FuelType::E85), Some(&price1));
        assert_eq!(station.price_for(FuelType::Unleaded98), Some(&price2));
        assert_eq!(station.price_for(FuelType::Diesel), None);
    }

    #[test]
    fn department_is_postcode_prefix() {
        let station = Station::new("1", 45.69, 5.91, "73100", "Aix-les-Bains", "A41", vec![]);
        assert_eq!(station.department(), "73");

        let corsica = Station::new("2", 41.92, 8.73, "20000", "Ajaccio", "cours Napoleon", vec![]);
        assert_eq!(corsica.department(), "20");
    }

    #[test]
    fn equality_is_structural() {
        let a = Station::new("1", 45.0, 2.0, "01000", "t", "a", vec![]);
        let b = Station::new("1", 45.0, 2.0, "01000", "t", "a", vec![]);
        let c = Station::new("1", 45.0, 2.0, "01000", "t", "other", vec![]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
