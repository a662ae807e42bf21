//! Radius queries over two sorted views of the same station set.
//!
//! Stations are kept sorted by latitude as handed over by the provider. A
//! second view, sorted by longitude, is materialised on the first radius query
//! after a reload and holds positions into the latitude view rather than
//! copies of the stations. A query narrows both views to the bounding square
//! of the search circle with two binary searches each, intersects them, then
//! keeps what actually lies inside the circle.

use std::ops::Range;
use std::sync::{Arc, OnceLock};
use log::debug;
use crate::distance::{lat_degrees_for_distance, lon_degrees_for_distance, squared_distance_km2};
use crate::station::{Position, Station};

#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    by_lat: Vec<Arc<Station>>,
    // Unset until a radius query needs it; reset on reload.
    by_lon: OnceLock<Vec<usize>>,
}

impl SpatialIndex {
    /// `stations` must already be sorted by ascending latitude.
    pub fn reload(&mut self, stations: Vec<Arc<Station>>) {
        self.by_lat = stations;
        self.by_lon = OnceLock::new();
    }

    pub fn len(&self) -> usize {
        self.by_lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lat.is_empty()
    }

    /// Stations within `radius_km` of `point`, in ascending latitude order.
    pub fn within_radius(&self, point: Position, radius_km: u32) -> Vec<Arc<Station>> {
        let by_lon = self.by_lon.get_or_init(|| self.sort_by_longitude());

        let radius = f64::from(radius_km);
        let lat_span = lat_degrees_for_distance(radius);
        let lon_span = lon_degrees_for_distance(radius, point.lat);

        let lat_range = range_between(
            &self.by_lat,
            point.lat - lat_span,
            point.lat + lat_span,
            |s| s.latitude,
        );
        let lon_range = range_between(
            by_lon,
            point.lon - lon_span,
            point.lon + lon_span,
            |&i| self.by_lat[i].longitude,
        );

        // Both views refer to positions in `by_lat`, so the intersection is the
        // set of longitude candidates whose position falls in the latitude range.
        let mut common: Vec<usize> = by_lon[lon_range]
            .iter()
            .copied()
            .filter(|i| lat_range.contains(i))
            .collect();
        common.sort_unstable();

        let squared_radius = radius * radius;
        common
            .into_iter()
            .map(|i| &self.by_lat[i])
            .filter(|s| squared_distance_km2(s.latitude, s.longitude, point.lat, point.lon) <= squared_radius)
            .cloned()
            .collect()
    }

    fn sort_by_longitude(&self) -> Vec<usize> {
        debug!("sorting {} stations by longitude", self.by_lat.len());
        let mut by_lon: Vec<usize> = (0..self.by_lat.len()).collect();
        by_lon.sort_by(|&a, &b| self.by_lat[a].longitude.total_cmp(&self.by_lat[b].longitude));
        by_lon
    }
}

/// Positions of the elements with `min < coordinate <= max`.
///
/// The second search resumes where the first one stopped: everything before
/// the lower frontier is already known to be at or below `min <= max`.
fn range_between<T>(sorted: &[T], min: f64, max: f64, coordinate: impl Fn(&T) -> f64) -> Range<usize> {
    let lower = smallest_index_over_bound(sorted, min, 0, &coordinate);
    let upper = smallest_index_over_bound(sorted, max, lower, &coordinate);
    lower..upper
}

/// Smallest index at or after `start` whose coordinate is strictly greater
/// than `bound`, or `sorted.len()` when there is none.
fn smallest_index_over_bound<T>(
    sorted: &[T],
    bound: f64,
    start: usize,
    coordinate: &impl Fn(&T) -> f64,
) -> usize {
    let start = start.min(sorted.len());
    start + sorted[start..].partition_point(|item| coordinate(item) <= bound)
}
