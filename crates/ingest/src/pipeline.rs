use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;
use yelp_core::{Cap, Caps, Filters, RecordKind, group_thousands};

use crate::aggregate::{
    Aggregator, BusinessAggregate, CheckinAggregate, Observed, PhotoAggregate, ReviewAggregate,
    TipAggregate, UserAggregate,
};
use crate::archive::{ArchiveEntry, DATASET_TAR_SUFFIX, DatasetArchive, TraversalStats, Visit};
use crate::cap::should_continue;
use crate::filter::passes;
use crate::index::{BusinessIndex, IndexBuilder, require_index};
use crate::parser::{RecordLines, business_id, decode_lines};
use crate::types::{IngestError, PassStats, Result};

const ENTRY_BUFFER: usize = 1 << 20;

/// Caller-configurable knobs for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    pub filters: Filters,
    pub caps: Caps,
    pub skip_checkins: bool,
}

impl RunOptions {
    pub fn cap_for(&self, kind: RecordKind) -> Cap {
        if kind == RecordKind::Checkin && self.skip_checkins {
            return Cap::Skip;
        }
        self.caps.for_kind(kind)
    }
}

/// Final accumulator state handed to the report writer.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub archive: String,
    pub filters: Filters,
    pub selected_businesses: usize,
    pub business: BusinessAggregate,
    pub checkins: CheckinAggregate,
    pub reviews: ReviewAggregate,
    pub users: UserAggregate,
    pub tips: TipAggregate,
    pub photos: PhotoAggregate,
    pub passes: Vec<PassStats>,
    pub traversal: TraversalStats,
}

impl DatasetSummary {
    pub fn pass(&self, kind: RecordKind) -> Option<&PassStats> {
        self.passes.iter().find(|stats| stats.kind == kind)
    }
}

/// Runs the business pass over a decoded stream: filters, deduplicates by id,
/// aggregates and returns the frozen index.
pub fn business_pass<R: BufRead>(
    records: &mut RecordLines<R>,
    filters: &Filters,
    aggregate: &mut BusinessAggregate,
    stats: &mut PassStats,
) -> Result<BusinessIndex> {
    let mut builder = IndexBuilder::new();
    while should_continue(stats.processed, stats.cap) {
        let Some(record) = records.next() else {
            break;
        };
        let record = record?;
        if !passes(&record, filters) {
            stats.skipped_unmatched += 1;
            continue;
        }
        let Some(id) = business_id(&record) else {
            stats.skipped_invalid += 1;
            continue;
        };
        if !builder.insert(id.to_string()) {
            stats.skipped_invalid += 1;
            continue;
        }
        if aggregate.observe(&record) == Observed::Counted {
            stats.processed += 1;
        }
    }
    stats.completed = true;

    if builder.duplicates() > 0 {
        warn!(
            "ignored {} duplicate business ids",
            group_thousands(builder.duplicates())
        );
    }
    if builder.is_empty() {
        return Err(IngestError::NoMatchingRecords {
            filters: filters.describe(),
        });
    }
    Ok(builder.freeze())
}

/// Feeds records to `aggregate` until the stream ends or the cap is reached.
/// With an index, records whose business is not in it are rejected before
/// any other field is looked at.
pub fn aggregate_records<R, A>(
    records: &mut RecordLines<R>,
    aggregate: &mut A,
    index: Option<&BusinessIndex>,
    stats: &mut PassStats,
) -> Result<()>
where
    R: BufRead,
    A: Aggregator + ?Sized,
{
    while should_continue(stats.processed, stats.cap) {
        let Some(record) = records.next() else {
            break;
        };
        let record = record?;
        if let Some(index) = index {
            let matched = business_id(&record).is_some_and(|id| index.contains(id));
            if !matched {
                stats.skipped_unmatched += 1;
                continue;
            }
        }
        match aggregate.observe(&record) {
            Observed::Counted => stats.processed += 1,
            Observed::Invalid => stats.skipped_invalid += 1,
        }
    }
    stats.completed = true;
    Ok(())
}

struct RunState<'a> {
    options: &'a RunOptions,
    index: Option<BusinessIndex>,
    business: BusinessAggregate,
    checkins: CheckinAggregate,
    reviews: ReviewAggregate,
    users: UserAggregate,
    tips: TipAggregate,
    photos: PhotoAggregate,
    passes: BTreeMap<RecordKind, PassStats>,
}

impl<'a> RunState<'a> {
    fn new(options: &'a RunOptions) -> Self {
        let passes = RecordKind::ALL
            .into_iter()
            .map(|kind| (kind, PassStats::new(kind, options.cap_for(kind))))
            .collect();
        Self {
            options,
            index: None,
            business: BusinessAggregate::default(),
            checkins: CheckinAggregate::default(),
            reviews: ReviewAggregate::default(),
            users: UserAggregate::default(),
            tips: TipAggregate::default(),
            photos: PhotoAggregate::default(),
            passes,
        }
    }

    fn has_pending(&self) -> bool {
        self.passes
            .values()
            .any(|stats| !stats.cap.is_skip() && !stats.completed)
    }

    fn next_visit(&self) -> Visit {
        if self.has_pending() {
            Visit::Continue
        } else {
            debug!("all enabled passes finished; stopping traversal");
            Visit::Stop
        }
    }

    fn visit(&mut self, entry: ArchiveEntry<'_>) -> Result<Visit> {
        let Some(kind) = RecordKind::from_file_name(&entry.name) else {
            debug!("ignoring archive entry {}", entry.path);
            return Ok(Visit::Continue);
        };
        let Some(stats) = self.passes.get_mut(&kind) else {
            return Ok(Visit::Continue);
        };
        if stats.cap.is_skip() {
            info!("Skipping {kind}.");
            return Ok(self.next_visit());
        }
        if stats.completed {
            warn!("{} appears more than once; ignoring {}", kind.file_name(), entry.path);
            return Ok(self.next_visit());
        }
        if kind.depends_on_index() {
            require_index(self.index.as_ref(), kind)?;
        }
        if entry.size == 0 {
            warn!("{} is empty", entry.path);
        }

        match stats.cap {
            Cap::Limit(limit) => info!("Parsing {kind} (up to {})…", group_thousands(limit)),
            _ => info!("Parsing {kind} (all)…"),
        }
        let started = Instant::now();
        let reader = BufReader::with_capacity(ENTRY_BUFFER, entry.reader);
        let mut records = decode_lines(reader).with_source(entry.path.clone());
        let index = self.index.as_ref();
        match kind {
            RecordKind::Business => {
                let built =
                    business_pass(&mut records, &self.options.filters, &mut self.business, stats)?;
                info!("Selected businesses: {}", group_thousands(built.len() as u64));
                self.index = Some(built);
            }
            RecordKind::Checkin => {
                aggregate_records(&mut records, &mut self.checkins, index, stats)?
            }
            RecordKind::Review => aggregate_records(&mut records, &mut self.reviews, index, stats)?,
            RecordKind::User => aggregate_records(&mut records, &mut self.users, None, stats)?,
            RecordKind::Tip => aggregate_records(&mut records, &mut self.tips, index, stats)?,
            RecordKind::Photo => aggregate_records(&mut records, &mut self.photos, index, stats)?,
        }
        debug!(
            "{}: processed={} unmatched={} invalid={} lines={} elapsed={}ms",
            entry.path,
            stats.processed,
            stats.skipped_unmatched,
            stats.skipped_invalid,
            records.lines_read(),
            started.elapsed().as_millis()
        );
        Ok(self.next_visit())
    }

    fn finish(self, archive: String, traversal: TraversalStats) -> Result<DatasetSummary> {
        let Some(index) = self.index else {
            return Err(IngestError::NotFound {
                what: format!("{} inside {archive}", RecordKind::Business.file_name()),
            });
        };
        for stats in self.passes.values() {
            if !stats.cap.is_skip() && !stats.completed {
                warn!("{} not found in archive", stats.kind.file_name());
            }
        }
        Ok(DatasetSummary {
            archive,
            filters: self.options.filters.clone(),
            selected_businesses: index.len(),
            business: self.business,
            checkins: self.checkins,
            reviews: self.reviews,
            users: self.users,
            tips: self.tips,
            photos: self.photos,
            passes: self.passes.into_values().collect(),
            traversal,
        })
    }
}

/// Drains an opened dataset archive in member order and aggregates every enabled kind.
pub fn run_dataset(archive: &mut DatasetArchive, options: &RunOptions) -> Result<DatasetSummary> {
    let started = Instant::now();
    let mut state = RunState::new(options);
    let traversal = archive.visit_entries(|entry| state.visit(entry))?;
    debug!(
        "archive traversal: seen={} visited={} stopped_early={} total={}ms",
        traversal.entries_seen,
        traversal.entries_visited,
        traversal.stopped_early,
        started.elapsed().as_millis()
    );
    state.finish(archive.path().display().to_string(), traversal)
}

/// Opens `Yelp-JSON.zip`-style archives, runs every pass and releases all handles.
pub fn analyze_archive(path: &Path, options: &RunOptions) -> Result<DatasetSummary> {
    info!("Reading archive: {}", path.display());
    let mut archive = DatasetArchive::open(path, DATASET_TAR_SUFFIX)?;
    let summary = run_dataset(&mut archive, options);
    archive.close();
    summary
}
