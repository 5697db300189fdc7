use std::path::{Path, PathBuf};

use ingest::{BusinessAggregate, DatasetSummary};
use log::debug;
use serde::Serialize;
use yelp_core::{CheckinMatrix, Counter, DAY_LABELS};

use crate::error::Result;
use crate::geography::country_counts;

/// Categories with fewer businesses are too noisy to rank by average stars.
pub const MIN_CATEGORY_BUSINESSES: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: String,
    pub businesses: u64,
    pub avg_stars: f64,
}

/// Highest average star ratings among categories with at least
/// `min_businesses` businesses. Ties keep alphabetical order.
pub fn top_categories_by_average_stars(
    business: &BusinessAggregate,
    min_businesses: u64,
    limit: usize,
) -> Vec<CategoryAverage> {
    let mut rows: Vec<CategoryAverage> = business
        .category_counts
        .iter()
        .filter(|(_, count)| *count >= min_businesses && *count > 0)
        .map(|(category, count)| {
            let sum = business.category_star_sum.get(category).copied().unwrap_or(0.0);
            CategoryAverage {
                category: category.clone(),
                businesses: count,
                avg_stars: sum / count as f64,
            }
        })
        .filter(|row| row.avg_stars.is_finite())
        .collect();
    rows.sort_by(|a, b| b.avg_stars.total_cmp(&a.avg_stars));
    rows.truncate(limit);
    rows
}

fn share(count: u64, total: u64) -> String {
    if total == 0 {
        return "0".to_string();
    }
    format!("{:.6}", count as f64 / total as f64)
}

fn write_distribution<K, F>(path: &Path, header: &[&str], counter: &Counter<K>, key: F) -> Result<()>
where
    K: Ord,
    F: Fn(&K) -> Vec<String>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for (value, count) in counter.most_common(None) {
        let mut record = key(value);
        record.push(count.to_string());
        record.push(share(count, counter.total()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_monthly(path: &Path, column: &str, months: &Counter<String>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["month", column])?;
    for (month, count) in months.iter() {
        writer.write_record([month.clone(), count.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_checkin_matrix(path: &Path, matrix: &CheckinMatrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["day".to_string()];
    header.extend((0..24).map(|hour| hour.to_string()));
    writer.write_record(&header)?;
    for (label, row) in DAY_LABELS.iter().zip(matrix.rows()) {
        let mut record = vec![label.to_string()];
        record.extend(row.iter().map(u64::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes every CSV table whose source accumulator is non-empty and returns
/// the paths written, in file-name order.
pub fn write_tables(out_dir: &Path, summary: &DatasetSummary, top_n: usize) -> Result<Vec<PathBuf>> {
    let business = &summary.business;
    let mut written = Vec::new();

    if !business.state_counts.is_empty() {
        let path = out_dir.join("state_distribution.csv");
        write_distribution(
            &path,
            &["state", "businesses", "share"],
            &business.state_counts,
            |state| vec![state.clone()],
        )?;
        written.push(path);

        let path = out_dir.join("country_distribution.csv");
        write_distribution(
            &path,
            &["country", "businesses", "share"],
            &country_counts(&business.state_counts),
            |country| vec![country.clone()],
        )?;
        written.push(path);
    }
    if !business.city_counts.is_empty() {
        let path = out_dir.join("city_distribution.csv");
        write_distribution(
            &path,
            &["city", "businesses", "share"],
            &business.city_counts,
            |city| vec![city.clone()],
        )?;
        written.push(path);
    }
    if !business.city_state_counts.is_empty() {
        let path = out_dir.join("city_state_distribution.csv");
        write_distribution(
            &path,
            &["city", "state", "businesses", "share"],
            &business.city_state_counts,
            |(city, state)| vec![city.clone(), state.clone()],
        )?;
        written.push(path);
    }

    let top = top_categories_by_average_stars(business, MIN_CATEGORY_BUSINESSES, top_n);
    if !top.is_empty() {
        let path = out_dir.join("table_top_categories_by_avg_stars.csv");
        let mut writer = csv::Writer::from_path(&path)?;
        for row in &top {
            writer.serialize(row)?;
        }
        writer.flush()?;
        written.push(path);
    }

    if summary.checkins.matrix.total() > 0 {
        let path = out_dir.join("checkins_by_day_hour.csv");
        write_checkin_matrix(&path, &summary.checkins.matrix)?;
        written.push(path);
    }
    if !summary.reviews.month_counts.is_empty() {
        let path = out_dir.join("reviews_per_month.csv");
        write_monthly(&path, "reviews", &summary.reviews.month_counts)?;
        written.push(path);
    }
    if !summary.tips.month_counts.is_empty() {
        let path = out_dir.join("tips_per_month.csv");
        write_monthly(&path, "tips", &summary.tips.month_counts)?;
        written.push(path);
    }

    written.sort();
    debug!("wrote {} tables to {}", written.len(), out_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business_with(categories: &[(&str, u64, f64)]) -> BusinessAggregate {
        let mut business = BusinessAggregate::default();
        for (category, count, star_sum) in categories {
            business.category_counts.add(category.to_string(), *count);
            business
                .category_star_sum
                .insert(category.to_string(), *star_sum);
        }
        business
    }

    #[test]
    fn ranks_categories_with_enough_businesses() {
        let business = business_with(&[
            ("Bakeries", 60, 270.0),
            ("Bars", 100, 350.0),
            ("Tiny", 10, 50.0),
            ("Cafes", 50, 225.0),
        ]);
        let top = top_categories_by_average_stars(&business, MIN_CATEGORY_BUSINESSES, 20);
        let names: Vec<&str> = top.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(names, vec!["Bakeries", "Cafes", "Bars"]);
        assert_eq!(top[2].businesses, 100);
        assert!((top[2].avg_stars - 3.5).abs() < 1e-9);

        let top = top_categories_by_average_stars(&business, MIN_CATEGORY_BUSINESSES, 1);
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn share_handles_empty_totals() {
        assert_eq!(share(0, 0), "0");
        assert_eq!(share(1, 4), "0.250000");
    }
}
