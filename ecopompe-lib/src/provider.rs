//! Staleness-gated access to the current station generation.
//!
//! Queries check whether the data has gone stale and, if so, fetch and decode
//! a fresh copy before answering. Any failure along the way is logged and the
//! previous generation keeps being served: an upstream outage must never turn
//! into "no stations found".
//!
//! The generation lives behind an `Arc` so readers can hold on to a snapshot
//! while a reload happens. A new generation, refresh time included, is built
//! next to the current one and swapped in as a whole: the write lock is only
//! taken for that swap, never across fetching or decoding.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};
use std::time::Duration;
use log::{debug, error, info, warn};
use crate::catalog::CatalogIndex;
use crate::clock::{Clock, SystemClock};
use crate::source::{Decoder, Fetcher, JsonDecoder, UrlFetcher};
use crate::spatial::SpatialIndex;
use crate::station::{Position, Station};
use crate::EcoPompeError;

const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub location: String,
    pub staleness_threshold: Duration,
}

impl ProviderConfig {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            staleness_threshold: DEFAULT_STALENESS_THRESHOLD,
        }
    }

    pub fn with_staleness_threshold(mut self, staleness_threshold: Duration) -> Self {
        self.staleness_threshold = staleness_threshold;
        self
    }
}

/// One consistent snapshot of the station set and every view derived from it.
#[derive(Clone, Debug, Default)]
pub struct Generation {
    spatial: SpatialIndex,
    catalog: CatalogIndex,
    refreshed_at: Option<i64>,
}

impl Generation {
    /// `stations` must be sorted by ascending latitude.
    fn reload(&mut self, stations: Vec<Arc<Station>>, refreshed_at: i64) {
        self.catalog.reload(&stations);
        self.spatial.reload(stations);
        self.refreshed_at = Some(refreshed_at);
    }

    /// Millis since the epoch at which these stations were loaded, `None`
    /// before the first successful load.
    pub fn refreshed_at(&self) -> Option<i64> {
        self.refreshed_at
    }

    pub fn len(&self) -> usize {
        self.spatial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spatial.is_empty()
    }

    pub fn by_postcodes<S: AsRef<str>>(&self, codes: &[S]) -> Cow<'_, [Arc<Station>]> {
        self.catalog.by_postcodes(codes)
    }

    pub fn by_department(&self, code: &str) -> &[Arc<Station>] {
        self.catalog.by_department(code)
    }

    pub fn within_radius(&self, point: Position, radius_km: u32) -> Vec<Arc<Station>> {
        self.spatial.within_radius(point, radius_km)
    }
}

pub struct DataProvider {
    config: ProviderConfig,
    fetcher: Box<dyn Fetcher>,
    decoder: Box<dyn Decoder>,
    clock: Arc<dyn Clock>,
    generation: RwLock<Arc<Generation>>,
    // Held for the whole fetch/decode/swap so refreshes never overlap.
    refreshing: Mutex<()>,
}

impl DataProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, EcoPompeError> {
        let fetcher = UrlFetcher::with_default_timeout()?;
        Ok(Self::with_parts(
            config,
            Box::new(fetcher),
            Box::new(JsonDecoder),
            Arc::new(SystemClock),
        ))
    }

    pub fn with_parts(
        config: ProviderConfig,
        fetcher: Box<dyn Fetcher>,
        decoder: Box<dyn Decoder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            fetcher,
            decoder,
            clock,
            generation: RwLock::new(Arc::new(Generation::default())),
            refreshing: Mutex::new(()),
        }
    }

    pub fn get_by_postcodes<S: AsRef<str>>(&self, codes: &[S]) -> Vec<Arc<Station>> {
        self.ensure_fresh();
        self.snapshot().by_postcodes(codes).into_owned()
    }

    pub fn get_by_department(&self, code: &str) -> Vec<Arc<Station>> {
        self.ensure_fresh();
        self.snapshot().by_department(code).to_vec()
    }

    pub fn get_within_radius(&self, point: Position, radius_km: u32) -> Vec<Arc<Station>> {
        self.ensure_fresh();
        self.snapshot().within_radius(point, radius_km)
    }

    /// The generation queries are currently answered from, without any
    /// staleness check.
    pub fn snapshot(&self) -> Arc<Generation> {
        let generation = self.generation.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*generation)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn last_refresh_millis(&self) -> Option<i64> {
        self.snapshot().refreshed_at()
    }

    /// Refreshes the data if it is stale. Never fails: errors are logged and
    /// the current generation stays in place until the next attempt.
    pub fn ensure_fresh(&self) {
        let _refreshing = match self.refreshing.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!("station data refresh already in progress, serving current generation");
                return;
            }
        };

        if !self.is_stale(self.last_refresh_millis()) {
            return;
        }

        if let Err(err) = self.fetch_decode_and_reload() {
            error!(
                "failed to refresh station data from {}, keeping {} stations: {}",
                self.config.location,
                self.len(),
                err
            );
        }
    }

    /// Fetches and reloads regardless of staleness, waiting for any refresh
    /// already in progress. Returns the number of stations loaded, zero when
    /// the source was empty and nothing was replaced.
    pub fn refresh(&self) -> Result<usize, EcoPompeError> {
        let _refreshing = self.refreshing.lock().unwrap_or_else(PoisonError::into_inner);
        self.fetch_decode_and_reload()
    }

    fn is_stale(&self, last_refresh: Option<i64>) -> bool {
        match last_refresh {
            None => true,
            Some(millis) => {
                let threshold = i64::try_from(self.config.staleness_threshold.as_millis()).unwrap_or(i64::MAX);
                self.clock.now_millis().saturating_sub(millis) >= threshold
            }
        }
    }

    fn fetch_decode_and_reload(&self) -> Result<usize, EcoPompeError> {
        info!("retrieving station data from {}", self.config.location);
        let mut reader = self.fetcher.open(&self.config.location)?;
        let stations = self.decoder.decode(&mut reader)?;

        if stations.is_empty() {
            warn!("station data from {} is empty, keeping current generation", self.config.location);
            return Ok(0);
        }

        let mut stations: Vec<Arc<Station>> = stations.into_iter().map(Arc::new).collect();
        stations.sort_by(|a, b| a.latitude.total_cmp(&b.latitude));
        let count = stations.len();

        // Starting from a copy of the current generation keeps the catalog keys.
        let mut next = Generation::clone(&self.snapshot());
        next.reload(stations, self.clock.now_millis());
        *self.generation.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        info!("loaded {} stations", count);
        Ok(count)
    }
}
