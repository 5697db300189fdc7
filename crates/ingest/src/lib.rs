mod aggregate;
mod archive;
mod cap;
mod extract;
mod filter;
mod index;
mod parser;
mod paths;
mod pipeline;
mod types;

pub use aggregate::{
    Aggregator, BusinessAggregate, CheckinAggregate, Observed, PhotoAggregate, ReviewAggregate,
    TipAggregate, UserAggregate,
};
pub use archive::{
    ArchiveEntry, DATASET_TAR_SUFFIX, DatasetArchive, EntryInfo, PHOTOS_TAR_SUFFIX,
    TraversalStats, Visit,
};
pub use cap::should_continue;
pub use extract::{
    DOCS_SUFFIX, DocsTarget, ExtractStats, extract_archive, extract_docs, extract_entries,
    safe_join,
};
pub use filter::passes;
pub use index::{BusinessIndex, IndexBuilder, require_index};
pub use parser::{
    Record, RecordLines, attributes, business_id, categories, categories_text, decode_lines,
    field_count, field_f64, field_str, parse_int, parse_iso_datetime,
};
pub use paths::default_archive_path;
pub use pipeline::{
    DatasetSummary, RunOptions, aggregate_records, analyze_archive, business_pass, run_dataset,
};
pub use types::{IngestError, PassStats, Result};
