use std::borrow::Borrow;
use std::sync::Arc;
use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use crate::clock::{Clock, SystemClock};
use crate::price::Price;
use crate::station::Station;
use crate::FuelType;

const DEFAULT_PRICE_STALENESS_DAYS: i64 = 7;

// Larger than any real fuel price, so a stale price ranks behind every fresh one.
const DEFAULT_STALE_PRICE_PENALTY: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    pub staleness_threshold_days: i64,
    pub stale_price_penalty: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_days: DEFAULT_PRICE_STALENESS_DAYS,
            stale_price_penalty: DEFAULT_STALE_PRICE_PENALTY,
        }
    }
}

#[derive(Clone)]
pub struct PriceRanker {
    clock: Arc<dyn Clock>,
    config: RankingConfig,
}

impl PriceRanker {
    pub fn new(config: RankingConfig) -> Self {
        Self::with_clock(Arc::new(SystemClock), config)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, config: RankingConfig) -> Self {
        Self { clock, config }
    }

    /// Stable sort, cheapest first. Prices older than the staleness threshold
    /// are penalised; stations without a price for `fuel` go last.
    pub fn sort_by_increasing_price<S: Borrow<Station>>(&self, stations: &mut [S], fuel: FuelType) {
        let today = self.clock.today();
        stations.sort_by_cached_key(|station| {
            let station: &Station = station.borrow();
            OrderedFloat(self.ranking_key(station, fuel, today))
        });
    }

    fn ranking_key(&self, station: &Station, fuel: FuelType, today: NaiveDate) -> f64 {
        match station.price_for(fuel) {
            Some(price) if self.is_stale(price, today) => {
                f64::from(price.value.into_inner()) + self.config.stale_price_penalty
            }
            Some(price) => f64::from(price.value.into_inner()),
            None => f64::INFINITY,
        }
    }

    fn is_stale(&self, price: &Price, today: NaiveDate) -> bool {
        price.age_in_days(today) > self.config.staleness_threshold_days
    }
}
