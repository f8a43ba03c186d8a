//! Brand grouping and the enabled/disabled brand filter.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use fuelmap_core::StationRecord;

/// Display brands the user has switched off. Disabled groups are excluded
/// from classification entirely, not merely hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandFilter {
    disabled: BTreeSet<String>,
}

impl BrandFilter {
    #[must_use]
    pub fn is_enabled(&self, brand: &str) -> bool {
        !self.disabled.contains(brand)
    }

    pub fn disable(&mut self, brand: &str) {
        self.disabled.insert(brand.to_string());
    }

    pub fn enable(&mut self, brand: &str) {
        self.disabled.remove(brand);
    }

    /// Flip a brand's state; returns whether it is enabled afterwards.
    pub fn toggle(&mut self, brand: &str) -> bool {
        if self.disabled.remove(brand) {
            true
        } else {
            self.disabled.insert(brand.to_string());
            false
        }
    }

    pub fn enable_all(&mut self) {
        self.disabled.clear();
    }

    pub fn disabled(&self) -> impl Iterator<Item = &str> {
        self.disabled.iter().map(String::as_str)
    }

    #[must_use]
    pub fn admits(&self, station: &StationRecord) -> bool {
        self.is_enabled(&station.display_brand)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandGroup {
    pub name: String,
    pub stations: usize,
}

/// Brand groups present in an aggregate result, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandDirectory {
    groups: Vec<BrandGroup>,
}

impl BrandDirectory {
    #[must_use]
    pub fn from_stations(stations: &[StationRecord]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<BrandGroup> = Vec::new();
        for station in stations {
            let brand = station.display_brand.as_str();
            if let Some(&slot) = index.get(brand) {
                groups[slot].stations += 1;
            } else {
                index.insert(brand, groups.len());
                groups.push(BrandGroup {
                    name: brand.to_string(),
                    stations: 1,
                });
            }
        }
        Self { groups }
    }

    #[must_use]
    pub fn groups(&self) -> &[BrandGroup] {
        &self.groups
    }

    /// Groups ordered alphabetically, ignoring case.
    #[must_use]
    pub fn sorted(&self) -> Vec<&BrandGroup> {
        let mut sorted: Vec<&BrandGroup> = self.groups.iter().collect();
        sorted.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        sorted
    }

    #[must_use]
    pub fn contains(&self, brand: &str) -> bool {
        self.groups.iter().any(|g| g.name == brand)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelmap_core::Location;
    use serde_json::json;

    fn station(brand: &str, source: &str) -> StationRecord {
        let fields = json!({"brand": brand}).as_object().cloned().unwrap();
        StationRecord::from_raw(fields, source, Location::new(52.0, -1.0), None)
    }

    #[test]
    fn toggle_round_trips() {
        let mut filter = BrandFilter::default();
        assert!(filter.is_enabled("Shell"));
        assert!(!filter.toggle("Shell"));
        assert!(!filter.is_enabled("Shell"));
        assert!(filter.toggle("Shell"));
        assert!(filter.is_enabled("Shell"));
    }

    #[test]
    fn filter_matches_display_brand() {
        let mut filter = BrandFilter::default();
        filter.disable("Tesco");
        assert!(!filter.admits(&station("", "Tesco")));
        assert!(filter.admits(&station("TESCO", "Tesco")));
        filter.enable_all();
        assert_eq!(filter.disabled().count(), 0);
    }

    #[test]
    fn directory_keeps_first_seen_order_and_counts() {
        let stations = [
            station("shell", "Shell"),
            station("ASDA", "Asda"),
            station("shell", "Shell"),
            station("", "BP"),
        ];
        let directory = BrandDirectory::from_stations(&stations);
        let names: Vec<_> = directory.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["shell", "ASDA", "BP"]);
        assert_eq!(directory.groups()[0].stations, 2);
        assert!(directory.contains("BP"));

        let sorted: Vec<_> = directory.sorted().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(sorted, ["ASDA", "BP", "shell"]);
    }
}
