use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ingest::DatasetSummary;
use serde::Serialize;
use yelp_core::ChartSpec;

use crate::error::Result;

pub const SUMMARY_FILE: &str = "summary.json";

/// `summary.json` layout: every accumulator (buffers as descriptive
/// statistics) followed by the planned chart list.
#[derive(Serialize)]
struct SummaryFile<'a> {
    #[serde(flatten)]
    dataset: &'a DatasetSummary,
    charts: &'a [ChartSpec],
}

pub fn write_summary_json(
    out_dir: &Path,
    summary: &DatasetSummary,
    charts: &[ChartSpec],
) -> Result<PathBuf> {
    let path = out_dir.join(SUMMARY_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(
        &mut writer,
        &SummaryFile {
            dataset: summary,
            charts,
        },
    )?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(path)
}
