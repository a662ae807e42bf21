use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use crate::station::Station;

// Sizing hints for the French dataset.
const UNIQUE_POSTCODES: usize = 4266;
const TOTAL_DEPARTMENTS: usize = 96;

// Town ids are a short hash and a separator followed by postcodes, e.g. `acc,20600,20200`.
const TOWN_ID_HASH_OFFSET: usize = 4;
const TOWN_ID_SEPARATOR: char = ',';

#[derive(Clone, Debug)]
pub struct CatalogIndex {
    by_postcode: HashMap<String, Vec<Arc<Station>>>,
    by_department: HashMap<String, Vec<Arc<Station>>>,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self {
            by_postcode: HashMap::with_capacity(UNIQUE_POSTCODES),
            by_department: HashMap::with_capacity(TOTAL_DEPARTMENTS),
        }
    }
}

impl CatalogIndex {
    pub fn reload(&mut self, stations: &[Arc<Station>]) {
        // Keys survive a reload with emptied lists so their allocations get reused.
        self.by_postcode.values_mut().for_each(Vec::clear);
        self.by_department.values_mut().for_each(Vec::clear);

        for station in stations {
            match self.by_postcode.get_mut(&station.postcode) {
                Some(list) => list.push(station.clone()),
                None => {
                    self.by_postcode.insert(station.postcode.clone(), vec![station.clone()]);
                }
            }
            match self.by_department.get_mut(station.department()) {
                Some(list) => list.push(station.clone()),
                None => {
                    self.by_department.insert(station.department().to_string(), vec![station.clone()]);
                }
            }
        }
    }

    /// A single postcode borrows the stored list; several are concatenated in
    /// the order given, without removing duplicates.
    pub fn by_postcodes<S: AsRef<str>>(&self, codes: &[S]) -> Cow<'_, [Arc<Station>]> {
        match codes {
            [code] => Cow::Borrowed(self.by_postcode(code.as_ref())),
            _ => Cow::Owned(
                codes
                    .iter()
                    .flat_map(|code| self.by_postcode(code.as_ref()).iter().cloned())
                    .collect(),
            ),
        }
    }

    pub fn by_department(&self, code: &str) -> &[Arc<Station>] {
        self.by_department.get(code).map(Vec::as_slice).unwrap_or_default()
    }

    fn by_postcode(&self, code: &str) -> &[Arc<Station>] {
        self.by_postcode.get(code).map(Vec::as_slice).unwrap_or_default()
    }
}

pub fn postcodes_from_town_id(town_id: &str) -> Vec<&str> {
    town_id
        .get(TOWN_ID_HASH_OFFSET..)
        .unwrap_or_default()
        .split(TOWN_ID_SEPARATOR)
        .filter(|code| !code.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::sync::Arc;
    use crate::catalog::{postcodes_from_town_id, CatalogIndex};
    use crate::station::Station;

    fn station(id: &str, postcode: &str) -> Arc<Station> {
        Arc::new(Station::new(id, 43.56, 4.07, postcode, "t", "a", vec![]))
    }

    fn ids(stations: &[Arc<Station>]) -> Vec<&str> {
        stations.iter().map(|s| s.id.as_str()).collect()
    }

    fn catalog() -> CatalogIndex {
        let mut catalog = CatalogIndex::default();
        catalog.reload(&[
            station("1", "75001"),
            station("2", "75014"),
            station("3", "73100"),
            station("4", "75001"),
        ]);
        catalog
    }

    #[test]
    fn single_postcode_borrows_stored_list() {
        let catalog = catalog();
        let stations = catalog.by_postcodes(&["75001"]);
        assert!(matches!(stations, Cow::Borrowed(_)));
        assert_eq!(ids(&stations), vec!["1", "4"]);
    }

    #[test]
    fn multiple_postcodes_concatenate_in_argument_order() {
        let catalog = catalog();
        assert_eq!(ids(&catalog.by_postcodes(&["75014", "75001"])), vec!["2", "1", "4"]);
        assert_eq!(ids(&catalog.by_postcodes(&["75001", "75014"])), vec!["1", "4", "2"]);
        assert_eq!(ids(&catalog.by_postcodes(&["75014", "75014"])), vec!["2", "2"]);
    }

    #[test]
    fn missing_postcodes_yield_nothing() {
        let catalog = catalog();
        assert!(catalog.by_postcodes(&["58400"]).is_empty());
        assert_eq!(ids(&catalog.by_postcodes(&["58400", "73100"])), vec!["3"]);
        assert!(catalog.by_postcodes::<&str>(&[]).is_empty());
    }

    #[test]
    fn groups_by_department() {
        let catalog = catalog();
        assert_eq!(ids(catalog.by_department("75")), vec!["1", "2", "4"]);
        assert_eq!(ids(catalog.by_department("73")), vec!["3"]);
        assert!(catalog.by_department("97").is_empty());
    }

    #[test]
    fn reload_empties_previous_keys() {
        let mut catalog = catalog();
        catalog.reload(&[station("5", "06130")]);

        assert!(catalog.by_postcodes(&["75001"]).is_empty());
        assert!(catalog.by_department("75").is_empty());
        assert_eq!(ids(catalog.by_department("06")), vec!["5"]);
    }

    #[test]
    fn extracts_postcodes_from_town_id() {
        assert_eq!(postcodes_from_town_id("acc,20600,20200"), vec!["20600", "20200"]);
        assert_eq!(postcodes_from_town_id("b1f,75001"), vec!["75001"]);
        assert_eq!(postcodes_from_town_id("b1f,,75001,"), vec!["75001"]);
        assert!(postcodes_from_town_id("ab").is_empty());
    }
}
