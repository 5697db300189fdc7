mod charts;
mod error;
mod geography;
mod manifest;
mod summary;
mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use ingest::DatasetSummary;
use log::info;
use yelp_core::ChartSpec;

pub use charts::plan_charts;
pub use error::{ReportError, Result};
pub use geography::{CANADA, OTHER_COUNTRY, UNITED_STATES, country_counts, country_for_state};
pub use manifest::{MANIFEST_FILE, context_lines, render_manifest, write_manifest};
pub use summary::{SUMMARY_FILE, write_summary_json};
pub use tables::{
    CategoryAverage, MIN_CATEGORY_BUSINESSES, top_categories_by_average_stars, write_tables,
};

/// Everything written for one run.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub out_dir: PathBuf,
    pub charts: Vec<ChartSpec>,
    pub tables: Vec<PathBuf>,
    pub manifest: PathBuf,
    pub summary: PathBuf,
}

/// Writes tables, `summary.json` and `manifest.md` for a finished run.
pub fn write_report(out_dir: &Path, summary: &DatasetSummary, top_n: usize) -> Result<ReportOutput> {
    fs::create_dir_all(out_dir)?;
    let tables = write_tables(out_dir, summary, top_n)?;
    let charts = plan_charts(summary, top_n);
    let summary_path = write_summary_json(out_dir, summary, &charts)?;

    let table_names: Vec<String> = tables
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    let manifest = write_manifest(out_dir, &charts, &context_lines(summary), &table_names)?;
    info!(
        "Planned {} charts, wrote {} tables to {}",
        charts.len(),
        tables.len(),
        out_dir.display()
    );

    Ok(ReportOutput {
        out_dir: out_dir.to_path_buf(),
        charts,
        tables,
        manifest,
        summary: summary_path,
    })
}

#[cfg(test)]
mod test_support {
    use ingest::{
        Aggregator, BusinessAggregate, CheckinAggregate, DatasetSummary, PassStats,
        PhotoAggregate, Record, ReviewAggregate, TipAggregate, TraversalStats, UserAggregate,
    };
    use serde_json::{Value, json};
    use yelp_core::{Cap, Filters, RecordKind};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn observe_all<A: Aggregator>(aggregate: &mut A, values: Vec<Value>) {
        for value in values {
            aggregate.observe(&record(value));
        }
    }

    fn pass(kind: RecordKind, cap: Cap, processed: u64) -> PassStats {
        let mut stats = PassStats::new(kind, cap);
        stats.processed = processed;
        stats.completed = !cap.is_skip();
        stats
    }

    /// Two businesses with one record of most other kinds.
    pub fn summary_fixture() -> DatasetSummary {
        let mut business = BusinessAggregate::default();
        observe_all(
            &mut business,
            vec![
                json!({"business_id": "b1", "state": "ON", "city": "Toronto", "stars": 4.0,
                       "review_count": 10, "is_open": 1, "categories": "Coffee, Cafes",
                       "latitude": 43.6, "longitude": -79.4,
                       "hours": {"Monday": "8:0-17:0", "Tuesday": "8:0-17:0"},
                       "attributes": {"RestaurantsPriceRange2": "2"}}),
                json!({"business_id": "b2", "state": "AZ", "city": "Phoenix", "stars": 3.5,
                       "review_count": 4, "is_open": 0, "categories": "Coffee"}),
            ],
        );
        let mut checkins = CheckinAggregate::default();
        observe_all(
            &mut checkins,
            vec![json!({"business_id": "b1", "date": "2021-01-04 08:00:00, 2021-01-04 08:05:00"})],
        );
        let mut reviews = ReviewAggregate::default();
        observe_all(
            &mut reviews,
            vec![
                json!({"business_id": "b1", "stars": 5, "date": "2019-05-01 10:00:00",
                       "text": "great coffee", "useful": 2}),
                json!({"business_id": "b2", "stars": 3, "date": "2019-06-11 18:30:00",
                       "text": "ok", "funny": 1}),
            ],
        );
        let mut users = UserAggregate::default();
        observe_all(
            &mut users,
            vec![json!({"user_id": "u1", "yelping_since": "2012-03-01 10:00:00",
                        "review_count": 3, "fans": 1, "average_stars": 4.2})],
        );
        let mut tips = TipAggregate::default();
        observe_all(
            &mut tips,
            vec![json!({"business_id": "b1", "date": "2020-02-02 12:00:00",
                        "compliment_count": 1})],
        );
        let mut photos = PhotoAggregate::default();
        observe_all(&mut photos, vec![json!({"business_id": "b1", "label": "food"})]);

        DatasetSummary {
            archive: "Yelp-JSON.zip".to_string(),
            filters: Filters::default(),
            selected_businesses: 2,
            business,
            checkins,
            reviews,
            users,
            tips,
            photos,
            passes: vec![
                pass(RecordKind::Business, Cap::Unbounded, 2),
                pass(RecordKind::Checkin, Cap::Unbounded, 1),
                pass(RecordKind::Review, Cap::Limit(2), 2),
                pass(RecordKind::User, Cap::Unbounded, 1),
                pass(RecordKind::Tip, Cap::Unbounded, 1),
                pass(RecordKind::Photo, Cap::Limit(10), 1),
            ],
            traversal: TraversalStats::default(),
        }
    }
}
