use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// The record files shipped inside the Yelp dataset tar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Business,
    Checkin,
    Review,
    User,
    Tip,
    Photo,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Business,
        RecordKind::Checkin,
        RecordKind::Review,
        RecordKind::User,
        RecordKind::Tip,
        RecordKind::Photo,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Business => "yelp_academic_dataset_business.json",
            Self::Checkin => "yelp_academic_dataset_checkin.json",
            Self::Review => "yelp_academic_dataset_review.json",
            Self::User => "yelp_academic_dataset_user.json",
            Self::Tip => "yelp_academic_dataset_tip.json",
            Self::Photo => "yelp_academic_dataset_photo.json",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.file_name() == name)
    }

    /// Kinds whose records reference a business and are filtered by the business index.
    pub fn depends_on_index(self) -> bool {
        matches!(
            self,
            Self::Checkin | Self::Review | Self::Tip | Self::Photo
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Business => "businesses",
            Self::Checkin => "check-ins",
            Self::Review => "reviews",
            Self::User => "users",
            Self::Tip => "tips",
            Self::Photo => "photos",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-kind processing cap. Signed configuration values map as
/// `< 0` unbounded, `0` skip, `> 0` limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Cap {
    Skip,
    Limit(u64),
    #[default]
    Unbounded,
}

impl Cap {
    pub fn from_signed(value: i64) -> Self {
        match value {
            v if v < 0 => Self::Unbounded,
            0 => Self::Skip,
            v => Self::Limit(v as u64),
        }
    }

    pub fn as_signed(self) -> i64 {
        match self {
            Self::Skip => 0,
            Self::Limit(limit) => i64::try_from(limit).unwrap_or(i64::MAX),
            Self::Unbounded => -1,
        }
    }

    pub fn is_skip(self) -> bool {
        matches!(self, Self::Skip)
    }

    /// Short label used in chart notes: `all`, `cap=1,000` or `skipped`.
    pub fn note(self) -> String {
        match self {
            Self::Skip => "skipped".to_string(),
            Self::Limit(limit) => format!("cap={}", group_thousands(limit)),
            Self::Unbounded => "all".to_string(),
        }
    }
}

impl From<i64> for Cap {
    fn from(value: i64) -> Self {
        Self::from_signed(value)
    }
}

impl From<Cap> for i64 {
    fn from(cap: Cap) -> Self {
        cap.as_signed()
    }
}

/// Caps for every record kind that can be limited. Businesses are never capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Caps {
    pub checkins: Cap,
    pub reviews: Cap,
    pub users: Cap,
    pub tips: Cap,
    pub photos: Cap,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            checkins: Cap::Unbounded,
            reviews: Cap::Unbounded,
            users: Cap::Unbounded,
            tips: Cap::Unbounded,
            photos: Cap::Skip,
        }
    }
}

impl Caps {
    pub fn for_kind(&self, kind: RecordKind) -> Cap {
        match kind {
            RecordKind::Business => Cap::Unbounded,
            RecordKind::Checkin => self.checkins,
            RecordKind::Review => self.reviews,
            RecordKind::User => self.users,
            RecordKind::Tip => self.tips,
            RecordKind::Photo => self.photos,
        }
    }
}

/// Business filter set, normalised on construction. Deserialised values go
/// through [`Filters::new`] as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FilterParts")]
pub struct Filters {
    states: BTreeSet<String>,
    cities: BTreeSet<String>,
    category_substrings: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FilterParts {
    states: Vec<String>,
    cities: Vec<String>,
    category_substrings: Vec<String>,
}

impl From<FilterParts> for Filters {
    fn from(parts: FilterParts) -> Self {
        Self::new(parts.states, parts.cities, parts.category_substrings)
    }
}

impl Filters {
    pub fn new<S, C, K>(states: S, cities: C, categories: K) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let states = states
            .into_iter()
            .map(|value| value.as_ref().trim().to_uppercase())
            .filter(|value| !value.is_empty())
            .collect();
        let cities = cities
            .into_iter()
            .map(|value| value.as_ref().trim().to_lowercase())
            .filter(|value| !value.is_empty())
            .collect();
        let mut category_substrings: Vec<String> = Vec::new();
        for value in categories {
            let value = value.as_ref().trim().to_lowercase();
            if !value.is_empty() && !category_substrings.contains(&value) {
                category_substrings.push(value);
            }
        }
        Self {
            states,
            cities,
            category_substrings,
        }
    }

    /// Upper-cased state codes.
    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    /// Lower-cased city names.
    pub fn cities(&self) -> &BTreeSet<String> {
        &self.cities
    }

    /// Lower-cased, de-duplicated, in the order given.
    pub fn category_substrings(&self) -> &[String] {
        &self.category_substrings
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.cities.is_empty() && self.category_substrings.is_empty()
    }

    pub fn describe(&self) -> String {
        fn list<'a>(values: impl Iterator<Item = &'a String>) -> String {
            let values: Vec<&str> = values.map(String::as_str).collect();
            if values.is_empty() {
                "∅".to_string()
            } else {
                format!("[{}]", values.join(", "))
            }
        }
        format!(
            "states={}, cities={}, category substrings={}",
            list(self.states.iter()),
            list(self.cities.iter()),
            list(self.category_substrings.iter())
        )
    }
}

/// Frequency counter keyed by any ordered key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter<K: Ord> {
    counts: BTreeMap<K, u64>,
    total: u64,
}

impl<K: Ord> Default for Counter<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<K: Ord> Counter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: K, count: u64) {
        let slot = self.counts.entry(key).or_insert(0);
        *slot = slot.saturating_add(count);
        self.total = self.total.saturating_add(count);
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(key, count)| (key, *count))
    }

    /// Entries by descending count, ties broken by key order.
    pub fn most_common(&self, limit: Option<usize>) -> Vec<(&K, u64)> {
        let mut entries: Vec<(&K, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }
}

impl<K: Ord + Serialize> Serialize for Counter<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.most_common(None);
        let mut seq = serializer.serialize_seq(Some(entries.len()))?;
        for entry in entries {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

/// Descriptive statistics over a numeric buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BufferStats {
    pub count: usize,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
}

/// Linear-interpolated quantile over sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Append-only buffer of small numeric values. Never holds raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericBuffer<T> {
    values: Vec<T>,
}

impl<T> Default for NumericBuffer<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T: Copy + Into<f64>> NumericBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    fn sorted(&self) -> Vec<f64> {
        let mut sorted: Vec<f64> = self
            .values
            .iter()
            .map(|value| (*value).into())
            .filter(|value: &f64| value.is_finite())
            .collect();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    pub fn quantile(&self, q: f64) -> Option<f64> {
        quantile(&self.sorted(), q)
    }

    pub fn describe(&self) -> Option<BufferStats> {
        let sorted = self.sorted();
        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let sum: f64 = sorted.iter().sum();
        Some(BufferStats {
            count: sorted.len(),
            min,
            p25: quantile(&sorted, 0.25)?,
            median: quantile(&sorted, 0.5)?,
            p75: quantile(&sorted, 0.75)?,
            p95: quantile(&sorted, 0.95)?,
            max,
            mean: sum / sorted.len() as f64,
        })
    }
}

impl<T: Copy + Into<f64>> Serialize for NumericBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.describe().serialize(serializer)
    }
}

/// Day-of-week (Monday = 0) by hour-of-day counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckinMatrix {
    cells: [[u64; 24]; 7],
    total: u64,
}

impl CheckinMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and leaves the matrix untouched when out of range.
    pub fn increment(&mut self, day: usize, hour: usize) -> bool {
        let Some(cell) = self.cells.get_mut(day).and_then(|row| row.get_mut(hour)) else {
            return false;
        };
        *cell = cell.saturating_add(1);
        self.total = self.total.saturating_add(1);
        true
    }

    pub fn get(&self, day: usize, hour: usize) -> u64 {
        self.cells
            .get(day)
            .and_then(|row| row.get(hour))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn rows(&self) -> &[[u64; 24]; 7] {
        &self.cells
    }

    pub fn day_totals(&self) -> [u64; 7] {
        let mut totals = [0u64; 7];
        for (day, row) in self.cells.iter().enumerate() {
            totals[day] = row.iter().sum();
        }
        totals
    }

    pub fn hour_totals(&self) -> [u64; 24] {
        let mut totals = [0u64; 24];
        for row in &self.cells {
            for (hour, count) in row.iter().enumerate() {
                totals[hour] += count;
            }
        }
        totals
    }
}

/// Output chart descriptor handed to the renderer and the manifest writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub filename: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ChartSpec {
    pub fn new(filename: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Formats an integer with comma thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
