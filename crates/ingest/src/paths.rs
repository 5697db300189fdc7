use std::path::PathBuf;

pub fn default_archive_path() -> PathBuf {
    if let Ok(path) = std::env::var("YELP_ARCHIVE") {
        return PathBuf::from(path);
    }
    PathBuf::from("data").join("Yelp-JSON.zip")
}
