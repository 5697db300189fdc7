use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use yelp_core::group_thousands;

use crate::archive::{DatasetArchive, Visit};
use crate::types::{IngestError, Result};

/// Documentation shipped next to the tar member in each zip.
pub const DOCS_SUFFIX: &str = ".pdf";

const COPY_BUFFER: usize = 1 << 20;
const PROGRESS_EVERY: u64 = 25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub extracted_files: u64,
    /// Files already on disk with the size the tar header declares.
    pub skipped_files: u64,
    pub extracted_bytes: u64,
    pub docs_copied: u64,
}

/// Where the zip's PDF documentation goes, and the prefix that keeps the
/// JSON and photo archives' copies apart.
#[derive(Debug, Clone, Copy)]
pub struct DocsTarget<'a> {
    pub dir: &'a Path,
    pub prefix: &'a str,
}

/// Resolves a member name under `root`. Backslashes count as separators,
/// empty and `.` components are dropped and any `..` is refused.
pub fn safe_join(root: &Path, member: &str) -> Result<PathBuf> {
    let normalized = member.replace('\\', "/");
    let mut joined = root.to_path_buf();
    for part in normalized.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(IngestError::UnsafePath {
                    path: member.to_string(),
                });
            }
            part => joined.push(part),
        }
    }
    Ok(joined)
}

/// Unpacks the opened archive's tar member below `out_root`, keeping member
/// paths. A positive `max_files` stops after that many files were written.
pub fn extract_entries(
    archive: &mut DatasetArchive,
    out_root: &Path,
    max_files: u64,
) -> Result<ExtractStats> {
    fs::create_dir_all(out_root)?;
    let limit_reached = |stats: &ExtractStats| max_files > 0 && stats.extracted_files >= max_files;
    let mut stats = ExtractStats::default();
    if limit_reached(&stats) {
        return Ok(stats);
    }
    let traversal = archive.visit_entries(|entry| {
        let target = safe_join(out_root, &entry.path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if already_extracted(&target, entry.size) {
            stats.skipped_files += 1;
            return Ok(Visit::Continue);
        }
        copy_to(entry.reader, &target)?;
        stats.extracted_files += 1;
        stats.extracted_bytes += entry.size;
        if stats.extracted_files % PROGRESS_EVERY == 0 {
            info!("… extracted {} files", group_thousands(stats.extracted_files));
        }
        if limit_reached(&stats) {
            Ok(Visit::Stop)
        } else {
            Ok(Visit::Continue)
        }
    })?;
    debug!(
        "{}: {} entries seen, stopped early: {}",
        archive.member_name(),
        traversal.entries_seen,
        traversal.stopped_early
    );
    Ok(stats)
}

/// Copies every PDF member of the outer zip to `docs.dir` as
/// `<prefix>_<file name>`. Returns how many files were written.
pub fn extract_docs(archive: &mut DatasetArchive, docs: DocsTarget<'_>) -> Result<u64> {
    fs::create_dir_all(docs.dir)?;
    let mut copied = 0;
    archive.visit_members(DOCS_SUFFIX, |entry| {
        let target = safe_join(docs.dir, &format!("{}_{}", docs.prefix, entry.name))?;
        if already_extracted(&target, entry.size) {
            return Ok(Visit::Continue);
        }
        copy_to(entry.reader, &target)?;
        copied += 1;
        Ok(Visit::Continue)
    })?;
    Ok(copied)
}

/// Opens `zip_path`, copies its docs when asked, then unpacks the member
/// ending with `member_suffix` below `out_root`.
pub fn extract_archive(
    zip_path: &Path,
    member_suffix: &str,
    out_root: &Path,
    docs: Option<DocsTarget<'_>>,
    max_files: u64,
) -> Result<ExtractStats> {
    let mut archive = DatasetArchive::open(zip_path, member_suffix)?;
    let docs_copied = match docs {
        Some(docs) => {
            info!("Extracting docs from: {}", zip_path.display());
            extract_docs(&mut archive, docs)?
        }
        None => 0,
    };
    info!("Extracting {} from: {}", archive.member_name(), zip_path.display());
    let stats = extract_entries(&mut archive, out_root, max_files)?;
    archive.close();
    Ok(ExtractStats {
        docs_copied,
        ..stats
    })
}

fn already_extracted(path: &Path, size: u64) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() == size)
}

fn copy_to(reader: &mut dyn Read, target: &Path) -> Result<()> {
    let file = File::create(target)?;
    let mut out = BufWriter::with_capacity(COPY_BUFFER, file);
    io::copy(reader, &mut out)?;
    out.flush()?;
    Ok(())
}
