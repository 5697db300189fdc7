use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::debug;
use serde::Serialize;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::types::{IngestError, Result, StreamFault};

/// Suffix of the packed dataset member inside `Yelp-JSON.zip`.
pub const DATASET_TAR_SUFFIX: &str = "yelp_dataset.tar";
/// Suffix of the packed photo member inside `Yelp-Photos.zip`.
pub const PHOTOS_TAR_SUFFIX: &str = "yelp_photos.tar";

const JUNK_PREFIX: &str = "__MACOSX/";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const STREAM_BUFFER: usize = 1 << 20;

/// Returned by an entry visitor to keep walking or stop the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// A regular file inside the packed tar. Only valid for the duration of the visit.
pub struct ArchiveEntry<'a> {
    /// Final path component, e.g. `yelp_academic_dataset_review.json`.
    pub name: String,
    pub path: String,
    /// Size declared by the tar header.
    pub size: u64,
    pub reader: &'a mut dyn Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    pub entries_seen: usize,
    pub entries_visited: usize,
    pub stopped_early: bool,
}

/// A zip archive holding one (normally gzip-compressed) tar member.
///
/// Handles are opened outer to inner: the zip file, the member stream, then
/// the decompressor and tar reader. The inner three live only inside
/// [`DatasetArchive::visit_entries`] and are released innermost first on every
/// exit path, including errors returned by the visitor. The zip handle is
/// released when the archive is dropped or [`DatasetArchive::close`]d.
pub struct DatasetArchive {
    path: PathBuf,
    member_index: usize,
    member_name: String,
    zip: ZipArchive<BufReader<File>>,
}

impl DatasetArchive {
    /// Locates the first member whose name ends with `member_suffix`
    /// (case-insensitive), ignoring anything under `__MACOSX/`.
    pub fn open(archive_path: &Path, member_suffix: &str) -> Result<Self> {
        let display = archive_path.display().to_string();
        let file = File::open(archive_path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                IngestError::NotFound {
                    what: format!("archive file {display}"),
                }
            } else {
                IngestError::Io(err)
            }
        })?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|err| zip_error(&display, err))?;

        let suffix = member_suffix.to_lowercase();
        let mut found = None;
        for index in 0..zip.len() {
            let member = zip.by_index_raw(index).map_err(|err| zip_error(&display, err))?;
            let name = member.name();
            if member.is_dir() || name.starts_with(JUNK_PREFIX) {
                continue;
            }
            if name.to_lowercase().ends_with(&suffix) {
                found = Some((index, name.to_string()));
                break;
            }
        }
        let Some((member_index, member_name)) = found else {
            return Err(IngestError::NotFound {
                what: format!("{member_suffix} inside {display}"),
            });
        };
        debug!("opened {display}, dataset member {member_name}");

        Ok(Self {
            path: archive_path.to_path_buf(),
            member_index,
            member_name,
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    /// Streams the tar member entry by entry, in archive order.
    pub fn visit_entries<F>(&mut self, mut visit: F) -> Result<TraversalStats>
    where
        F: FnMut(ArchiveEntry<'_>) -> Result<Visit>,
    {
        let display = self.path.display().to_string();
        let member = self
            .zip
            .by_index(self.member_index)
            .map_err(|err| zip_error(&display, err))?;
        let mut buffered = BufReader::with_capacity(STREAM_BUFFER, member);
        let is_gzip = buffered
            .fill_buf()
            .map_err(|err| stream_error(&display, err))?
            .starts_with(&GZIP_MAGIC);
        // Every gzip member is read, not just the first.
        let stream: Box<dyn Read + '_> = if is_gzip {
            Box::new(MultiGzDecoder::new(buffered))
        } else {
            debug!("{} is not gzip-compressed; reading as plain tar", self.member_name);
            Box::new(buffered)
        };
        let mut tar = tar::Archive::new(stream);

        let mut stats = TraversalStats::default();
        let entries = tar.entries().map_err(|err| corrupt(&display, err))?;
        for entry in entries {
            let mut entry = entry.map_err(|err| corrupt(&display, err))?;
            stats.entries_seen += 1;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry
                .path()
                .map_err(|err| corrupt(&display, err))?
                .to_string_lossy()
                .into_owned();
            let name = file_name_of(&path);
            let size = entry.size();
            stats.entries_visited += 1;

            let mut reader = FaultTagging {
                inner: &mut entry,
                archive: &display,
                entry: path.clone(),
            };
            let next = visit(ArchiveEntry {
                name,
                path,
                size,
                reader: &mut reader,
            })?;
            if next == Visit::Stop {
                stats.stopped_early = true;
                break;
            }
        }
        Ok(stats)
    }

    /// Visits members of the outer zip itself (not the packed tar) whose name
    /// ends with `suffix`, case-insensitive. Directories and `__MACOSX/`
    /// resource forks are skipped. Returns how many members were visited.
    pub fn visit_members<F>(&mut self, suffix: &str, mut visit: F) -> Result<usize>
    where
        F: FnMut(ArchiveEntry<'_>) -> Result<Visit>,
    {
        let display = self.path.display().to_string();
        let suffix = suffix.to_lowercase();
        let mut visited = 0;
        for index in 0..self.zip.len() {
            let path = {
                let member = self
                    .zip
                    .by_index_raw(index)
                    .map_err(|err| zip_error(&display, err))?;
                let name = member.name();
                if member.is_dir()
                    || name.starts_with(JUNK_PREFIX)
                    || !name.to_lowercase().ends_with(&suffix)
                {
                    continue;
                }
                name.to_string()
            };
            let mut member = self
                .zip
                .by_index(index)
                .map_err(|err| zip_error(&display, err))?;
            let size = member.size();
            visited += 1;
            let mut reader = FaultTagging {
                inner: &mut member,
                archive: &display,
                entry: path.clone(),
            };
            let next = visit(ArchiveEntry {
                name: file_name_of(&path),
                path,
                size,
                reader: &mut reader,
            })?;
            if next == Visit::Stop {
                break;
            }
        }
        Ok(visited)
    }

    /// Regular-file entries with their declared sizes, without reading contents.
    pub fn list_entries(&mut self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::new();
        self.visit_entries(|entry| {
            entries.push(EntryInfo {
                path: entry.path,
                size: entry.size,
            });
            Ok(Visit::Continue)
        })?;
        Ok(entries)
    }

    /// Releases the outer zip handle.
    pub fn close(self) {
        debug!("closed {}", self.path.display());
    }
}

/// Tags read failures from the decompressor or tar framing so the decoder
/// reports them as archive corruption rather than plain I/O.
struct FaultTagging<'a, R> {
    inner: R,
    archive: &'a str,
    entry: String,
}

impl<R: Read> Read for FaultTagging<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|err| {
            if err.kind() == io::ErrorKind::Interrupted {
                return err;
            }
            io::Error::new(
                err.kind(),
                StreamFault {
                    archive: self.archive.to_string(),
                    message: format!("{}: {err}", self.entry),
                },
            )
        })
    }
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn corrupt(archive: &str, err: io::Error) -> IngestError {
    IngestError::CorruptArchive {
        archive: archive.to_string(),
        message: err.to_string(),
    }
}

fn zip_error(archive: &str, err: ZipError) -> IngestError {
    match err {
        ZipError::Io(err) => stream_error(archive, err),
        other => IngestError::CorruptArchive {
            archive: archive.to_string(),
            message: other.to_string(),
        },
    }
}

fn stream_error(archive: &str, err: io::Error) -> IngestError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
            IngestError::CorruptArchive {
                archive: archive.to_string(),
                message: err.to_string(),
            }
        }
        _ => IngestError::Io(err),
    }
}
