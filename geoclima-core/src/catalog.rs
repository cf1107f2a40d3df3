//! Read-only collection of validated location records.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::model::{Coordinates, LocationRecord};

/// Categorical columns that can drive a selection widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Department,
    Province,
    District,
    Level,
}

impl Field {
    pub const fn all() -> &'static [Field] {
        &[Field::Department, Field::Province, Field::District, Field::Level]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Department => "department",
            Field::Province => "province",
            Field::District => "district",
            Field::Level => "level",
        }
    }

    pub fn value_of<'a>(&self, record: &'a LocationRecord) -> &'a str {
        match self {
            Field::Department => &record.department,
            Field::Province => &record.province,
            Field::District => &record.district,
            Field::Level => &record.level,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted values per field. A field with no values is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    fields: HashMap<Field, HashSet<String>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .entry(field)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.fields.values().all(HashSet::is_empty)
    }

    pub fn admits(&self, record: &LocationRecord) -> bool {
        self.fields
            .iter()
            .all(|(field, accepted)| {
                accepted.is_empty() || accepted.contains(field.value_of(record))
            })
    }
}

/// Headline figures for a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub levels: usize,
    pub districts: usize,
    pub provinces: usize,
}

impl Stats {
    pub fn of<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a LocationRecord>,
    {
        let mut total = 0;
        let mut levels = HashSet::new();
        let mut districts = HashSet::new();
        let mut provinces = HashSet::new();

        for record in records {
            total += 1;
            levels.insert(record.level.as_str());
            districts.insert(record.district.as_str());
            provinces.insert(record.province.as_str());
        }

        Self {
            total,
            levels: levels.len(),
            districts: districts.len(),
            provinces: provinces.len(),
        }
    }
}

/// Immutable after construction; hand out `&Catalog` to consumers.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<LocationRecord>,
}

impl Catalog {
    pub fn new(records: Vec<LocationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LocationRecord> {
        self.records.get(index)
    }

    /// Case-insensitive exact match on the institution name.
    pub fn find_by_name(&self, name: &str) -> Option<(usize, &LocationRecord)> {
        let wanted = name.trim().to_lowercase();
        self.records
            .iter()
            .enumerate()
            .find(|(_, r)| r.name.to_lowercase() == wanted)
    }

    /// Distinct values of `field` in order of first appearance.
    pub fn unique_values(&self, field: Field) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| field.value_of(r))
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Records admitted by every constrained field, in catalog order.
    pub fn filter(&self, selection: &Selection) -> Vec<&LocationRecord> {
        self.records.iter().filter(|r| selection.admits(r)).collect()
    }

    /// First distinct value of each field, the initial state of the filter widgets.
    pub fn default_selection(&self) -> Selection {
        Field::all().iter().fold(Selection::new(), |selection, field| {
            selection.with(*field, self.unique_values(*field).into_iter().take(1))
        })
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.records)
    }

    /// Mean position, used to centre a map. `None` for an empty catalog.
    pub fn centroid(&self) -> Option<Coordinates> {
        if self.records.is_empty() {
            return None;
        }

        let n = self.records.len() as f64;
        let (lat, lon) = self.records.iter().fold((0.0, 0.0), |(lat, lon), r| {
            (lat + r.coordinates.latitude(), lon + r.coordinates.longitude())
        });

        Coordinates::new(lat / n, lon / n).ok()
    }
}
