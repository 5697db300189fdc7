use std::fs;
use std::path::{Path, PathBuf};

use ingest::{RunOptions, default_archive_path};
use serde::{Deserialize, Serialize};
use yelp_core::{Cap, Caps, Filters};

use crate::args::RunArgs;

const CONFIG_FILE_NAME: &str = "yelp-eda.toml";
const DEFAULT_OUT_DIR: &str = "outputs/yelp_eda";
const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Falls back to `YELP_ARCHIVE`, then `data/Yelp-JSON.zip`.
    pub archive: Option<PathBuf>,
    pub out: PathBuf,
    pub top_n: usize,
    pub no_checkins: bool,
    pub filters: FilterConfig,
    pub caps: Caps,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            archive: None,
            out: PathBuf::from(DEFAULT_OUT_DIR),
            top_n: DEFAULT_TOP_N,
            no_checkins: false,
            filters: FilterConfig::default(),
            caps: Caps::default(),
        }
    }
}

impl RunConfig {
    /// Command-line values win over the file. Repeated filter flags replace
    /// the file's list for that dimension.
    pub fn apply(&mut self, args: &RunArgs) {
        if let Some(zip) = &args.zip {
            self.archive = Some(zip.clone());
        }
        if let Some(out) = &args.out {
            self.out = out.clone();
        }
        if let Some(top_n) = args.top_n {
            self.top_n = top_n;
        }
        if !args.states.is_empty() {
            self.filters.states = args.states.clone();
        }
        if !args.cities.is_empty() {
            self.filters.cities = args.cities.clone();
        }
        if !args.categories.is_empty() {
            self.filters.categories = args.categories.clone();
        }
        let overrides = [
            (args.max_checkins, &mut self.caps.checkins),
            (args.max_reviews, &mut self.caps.reviews),
            (args.max_users, &mut self.caps.users),
            (args.max_tips, &mut self.caps.tips),
            (args.max_photos, &mut self.caps.photos),
        ];
        for (value, cap) in overrides {
            if let Some(value) = value {
                *cap = Cap::from_signed(value);
            }
        }
        self.no_checkins |= args.no_checkins;
    }

    pub fn archive_path(&self) -> PathBuf {
        self.archive.clone().unwrap_or_else(default_archive_path)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            filters: Filters::new(
                &self.filters.states,
                &self.filters.cities,
                &self.filters.categories,
            ),
            caps: self.caps,
            skip_checkins: self.no_checkins,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: RunConfig,
    /// The file the config came from, if any.
    pub file: Option<PathBuf>,
}

/// An explicit path must exist; otherwise `./yelp-eda.toml` is read when
/// present and built-in defaults apply when it is not.
pub fn load(explicit: Option<&Path>) -> Result<ConfigLoad, String> {
    let file = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(format!("config file not found: {}", path.display()));
            }
            Some(path.to_path_buf())
        }
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            local.exists().then_some(local)
        }
    };
    let Some(file) = file else {
        return Ok(ConfigLoad {
            config: RunConfig::default(),
            file: None,
        });
    };
    let config = read_config(&file)?;
    Ok(ConfigLoad {
        config,
        file: Some(file),
    })
}

fn read_config(path: &Path) -> Result<RunConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("read config {}: {}", path.display(), err))?;
    toml::from_str(&contents).map_err(|err| format!("parse config {}: {}", path.display(), err))
}

pub fn to_toml(config: &RunConfig) -> Result<String, String> {
    toml::to_string_pretty(config).map_err(|err| format!("serialize config: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_documented_values() {
        let config = RunConfig::default();
        assert_eq!(config.out, PathBuf::from("outputs/yelp_eda"));
        assert_eq!(config.top_n, 20);
        assert_eq!(config.caps.reviews, Cap::Unbounded);
        assert_eq!(config.caps.photos, Cap::Skip);
        assert!(!config.no_checkins);
    }

    #[test]
    fn reads_partial_file_with_signed_caps() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
archive = "/data/Yelp-JSON.zip"
top_n = 5

[filters]
states = ["on", " az "]
categories = ["Coffee"]

[caps]
reviews = 200000
tips = 0
"#,
        )
        .expect("write config");

        let loaded = load(Some(path.as_path())).expect("load config");
        assert_eq!(loaded.file.as_deref(), Some(path.as_path()));
        let config = loaded.config;
        assert_eq!(config.archive_path(), PathBuf::from("/data/Yelp-JSON.zip"));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.out, PathBuf::from("outputs/yelp_eda"));
        assert_eq!(config.caps.reviews, Cap::Limit(200_000));
        assert_eq!(config.caps.tips, Cap::Skip);
        assert_eq!(config.caps.users, Cap::Unbounded);

        let options = config.run_options();
        assert!(options.filters.states().contains("ON"));
        assert!(options.filters.states().contains("AZ"));
        assert_eq!(options.filters.category_substrings(), ["coffee".to_string()]);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let err = load(Some(dir.path().join("absent.toml").as_path())).expect_err("missing");
        assert!(err.contains("config file not found"));
    }

    #[test]
    fn args_override_file_values() {
        let mut config = RunConfig {
            top_n: 5,
            filters: FilterConfig {
                states: vec!["AZ".to_string()],
                ..FilterConfig::default()
            },
            ..RunConfig::default()
        };
        let args = RunArgs {
            zip: Some(PathBuf::from("other.zip")),
            states: vec!["ON".to_string()],
            max_reviews: Some(10),
            max_photos: Some(-1),
            no_checkins: true,
            ..RunArgs::default()
        };
        config.apply(&args);
        assert_eq!(config.archive, Some(PathBuf::from("other.zip")));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.filters.states, vec!["ON"]);
        assert_eq!(config.caps.reviews, Cap::Limit(10));
        assert_eq!(config.caps.photos, Cap::Unbounded);

        let options = config.run_options();
        assert!(options.skip_checkins);
        assert_eq!(options.cap_for(yelp_core::RecordKind::Checkin), Cap::Skip);
    }

    #[test]
    fn config_serializes_back_to_toml() {
        let text = to_toml(&RunConfig::default()).expect("toml");
        let parsed: RunConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, RunConfig::default());
    }
}
