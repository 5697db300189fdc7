use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use serde::Serialize;
use serde_json::Value;
use yelp_core::{CheckinMatrix, Counter, NumericBuffer};

use crate::parser::{
    Record, attributes, categories, field_count, field_f64, field_str, parse_int,
    parse_iso_datetime,
};

const PRICE_ATTRIBUTE: &str = "RestaurantsPriceRange2";
const BUSINESS_KEY_FIELDS: [&str; 7] = [
    "stars",
    "review_count",
    "city",
    "state",
    "latitude",
    "longitude",
    "categories",
];

/// Result of offering one record to an aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    Counted,
    /// A required field was missing or unparsable; nothing was recorded.
    Invalid,
}

/// Per-kind accumulator state. Records are never retained.
pub trait Aggregator {
    fn observe(&mut self, record: &Record) -> Observed;
}

fn month_key(raw: &str) -> Option<String> {
    parse_iso_datetime(raw).map(|dt| dt.format("%Y-%m").to_string())
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn populated_hours(record: &Record) -> u32 {
    let Some(Value::Object(hours)) = record.get("hours") else {
        return 0;
    };
    hours.values().filter(|value| !is_blank(Some(value))).count() as u32
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BusinessAggregate {
    pub category_counts: Counter<String>,
    pub category_star_sum: BTreeMap<String, f64>,
    pub category_review_sum: BTreeMap<String, f64>,
    pub state_counts: Counter<String>,
    pub city_counts: Counter<String>,
    pub city_state_counts: Counter<(String, String)>,
    /// Populated `hours` entries per business (0 when absent).
    pub days_open_counts: Counter<u32>,
    pub categories_per_business: Counter<u32>,
    pub open_counts: Counter<bool>,
    pub price_range_counts: Counter<i64>,
    pub stars_by_price: BTreeMap<i64, NumericBuffer<f32>>,
    pub stars_open: NumericBuffer<f32>,
    pub stars_closed: NumericBuffer<f32>,
    pub stars: NumericBuffer<f32>,
    pub review_counts: NumericBuffer<u32>,
    pub located: u64,
    pub missing_fields: Counter<String>,
}

impl BusinessAggregate {
    pub fn average_stars(&self, category: &str) -> Option<f64> {
        let count = self.category_counts.get(&category.to_string());
        let sum = self.category_star_sum.get(category)?;
        (count > 0).then(|| sum / count as f64)
    }
}

impl Aggregator for BusinessAggregate {
    fn observe(&mut self, record: &Record) -> Observed {
        let stars = field_f64(record, "stars");
        let review_count = field_count(record, "review_count");

        let tokens = categories(record);
        for category in &tokens {
            self.category_counts.increment(category.clone());
            if let Some(stars) = stars {
                *self.category_star_sum.entry(category.clone()).or_insert(0.0) += stars;
            }
            *self
                .category_review_sum
                .entry(category.clone())
                .or_insert(0.0) += f64::from(review_count);
        }
        self.categories_per_business.increment(tokens.len() as u32);

        let state = field_str(record, "state").to_uppercase();
        let city = field_str(record, "city");
        if !state.is_empty() {
            self.state_counts.increment(state.clone());
        }
        if !city.is_empty() {
            self.city_counts.increment(city.clone());
            self.city_state_counts.increment((city, state));
        }

        self.days_open_counts.increment(populated_hours(record));

        let is_open = record
            .get("is_open")
            .and_then(parse_int)
            .is_some_and(|value| value != 0);
        self.open_counts.increment(is_open);

        if let Some(stars) = stars {
            self.stars.push(stars as f32);
            if is_open {
                self.stars_open.push(stars as f32);
            } else {
                self.stars_closed.push(stars as f32);
            }
        }
        self.review_counts.push(review_count);

        let price = attributes(record)
            .and_then(|attrs| attrs.get(PRICE_ATTRIBUTE))
            .and_then(parse_int);
        if let Some(price) = price {
            self.price_range_counts.increment(price);
            if let (1..=4, Some(stars)) = (price, stars) {
                self.stars_by_price.entry(price).or_default().push(stars as f32);
            }
        }

        if field_f64(record, "latitude").is_some() && field_f64(record, "longitude").is_some() {
            self.located += 1;
        }
        for key in BUSINESS_KEY_FIELDS {
            if is_blank(record.get(key)) {
                self.missing_fields.increment(key.to_string());
            }
        }
        Observed::Counted
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckinAggregate {
    pub matrix: CheckinMatrix,
    pub unparsable_timestamps: u64,
}

impl Aggregator for CheckinAggregate {
    /// The `date` field holds comma-separated local timestamps. Bad fragments
    /// are skipped one by one; a record without any date is invalid.
    fn observe(&mut self, record: &Record) -> Observed {
        let dates = field_str(record, "date");
        if dates.is_empty() {
            return Observed::Invalid;
        }
        for fragment in dates.split(',').map(str::trim) {
            if fragment.is_empty() {
                continue;
            }
            match parse_iso_datetime(fragment) {
                Some(dt) => {
                    let day = dt.weekday().num_days_from_monday() as usize;
                    self.matrix.increment(day, dt.hour() as usize);
                }
                None => self.unparsable_timestamps += 1,
            }
        }
        Observed::Counted
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewAggregate {
    pub month_counts: Counter<String>,
    /// Star values 1..=5 only.
    pub star_counts: Counter<u8>,
    pub lengths: NumericBuffer<u32>,
    pub lengths_by_star: BTreeMap<u8, NumericBuffer<u32>>,
    pub useful: NumericBuffer<u32>,
    pub funny: NumericBuffer<u32>,
    pub cool: NumericBuffer<u32>,
}

impl Aggregator for ReviewAggregate {
    fn observe(&mut self, record: &Record) -> Observed {
        let Some(month) = month_key(&field_str(record, "date")) else {
            return Observed::Invalid;
        };
        self.month_counts.increment(month);

        let star = field_f64(record, "stars")
            .map(f64::trunc)
            .filter(|value| (1.0..=5.0).contains(value))
            .map(|value| value as u8);
        let length = field_str(record, "text").chars().count() as u32;
        self.lengths.push(length);
        if let Some(star) = star {
            self.star_counts.increment(star);
            self.lengths_by_star.entry(star).or_default().push(length);
        }

        self.useful.push(field_count(record, "useful"));
        self.funny.push(field_count(record, "funny"));
        self.cool.push(field_count(record, "cool"));
        Observed::Counted
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserAggregate {
    pub join_year_counts: Counter<i32>,
    pub unparsable_join_dates: u64,
    pub review_counts: NumericBuffer<u32>,
    pub fans: NumericBuffer<u32>,
    /// Finite ratings only.
    pub average_stars: NumericBuffer<f32>,
}

impl Aggregator for UserAggregate {
    fn observe(&mut self, record: &Record) -> Observed {
        let joined = field_str(record, "yelping_since");
        if !joined.is_empty() {
            match parse_iso_datetime(&joined) {
                Some(dt) => self.join_year_counts.increment(dt.year()),
                None => self.unparsable_join_dates += 1,
            }
        }
        self.review_counts.push(field_count(record, "review_count"));
        self.fans.push(field_count(record, "fans"));
        if let Some(stars) = field_f64(record, "average_stars") {
            self.average_stars.push(stars.max(0.0) as f32);
        }
        Observed::Counted
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TipAggregate {
    pub month_counts: Counter<String>,
    pub undated: u64,
    pub compliments: NumericBuffer<u32>,
}

impl Aggregator for TipAggregate {
    fn observe(&mut self, record: &Record) -> Observed {
        match month_key(&field_str(record, "date")) {
            Some(month) => self.month_counts.increment(month),
            None => self.undated += 1,
        }
        self.compliments.push(field_count(record, "compliment_count"));
        Observed::Counted
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PhotoAggregate {
    pub label_counts: Counter<String>,
}

impl Aggregator for PhotoAggregate {
    fn observe(&mut self, record: &Record) -> Observed {
        let label = field_str(record, "label");
        let label = if label.is_empty() {
            "Unknown".to_string()
        } else {
            label
        };
        self.label_counts.increment(label);
        Observed::Counted
    }
}
