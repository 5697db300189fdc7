use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Streaming exploratory statistics over the Yelp Open Dataset archive.
#[derive(Parser, Debug)]
#[command(name = "yelp-eda", version)]
pub struct Cli {
    /// TOML config file; `./yelp-eda.toml` is used when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate the archive and write tables, summary.json and manifest.md (default).
    Run(RunArgs),
    /// List the regular-file entries of the packed dataset with their sizes.
    Entries(EntriesArgs),
    /// Unpack the dataset (and optionally photo) archives to browsable folders.
    Extract(ExtractArgs),
}

impl Default for Command {
    fn default() -> Self {
        Self::Run(RunArgs::default())
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Path to Yelp-JSON.zip.
    #[arg(long, value_name = "PATH")]
    pub zip: Option<PathBuf>,
    /// Output directory.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
    /// Keep businesses in this state/province code (repeatable).
    #[arg(long = "state", value_name = "CODE")]
    pub states: Vec<String>,
    /// Keep businesses in this city (repeatable, case-insensitive).
    #[arg(long = "city", value_name = "CITY")]
    pub cities: Vec<String>,
    /// Keep businesses whose categories contain this text (repeatable).
    #[arg(long = "category", value_name = "TEXT")]
    pub categories: Vec<String>,
    /// Check-in records to process: -1 all, 0 skip, N cap.
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub max_checkins: Option<i64>,
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub max_reviews: Option<i64>,
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub max_users: Option<i64>,
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub max_tips: Option<i64>,
    /// Photo records to process; skipped unless set.
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub max_photos: Option<i64>,
    /// Skip the check-in pass regardless of --max-checkins.
    #[arg(long)]
    pub no_checkins: bool,
    /// Rows shown in top-N charts.
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct EntriesArgs {
    #[arg(long, value_name = "PATH")]
    pub zip: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExtractTarget {
    #[default]
    Json,
    Photos,
    Both,
}

impl ExtractTarget {
    pub fn json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    pub fn photos(self) -> bool {
        matches!(self, Self::Photos | Self::Both)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Path to Yelp-JSON.zip; falls back to the configured archive.
    #[arg(long, value_name = "PATH")]
    pub zip: Option<PathBuf>,
    #[arg(long, value_name = "PATH", default_value = "data/Yelp-Photos.zip")]
    pub photos_zip: PathBuf,
    /// Root for yelp_json/, yelp_photos/ and docs/.
    #[arg(long, value_name = "DIR", default_value = "data/yelp_extracted")]
    pub out: PathBuf,
    #[arg(long, value_enum, default_value_t = ExtractTarget::Json)]
    pub what: ExtractTarget,
    /// Stop after writing this many files per archive; 0 extracts everything.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub max_files: u64,
    /// Do not copy the PDF documentation out of the zips.
    #[arg(long)]
    pub no_docs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("yelp-eda").chain(args.iter().copied()))
            .expect("parse args")
    }

    #[test]
    fn run_flags_repeat_and_accept_negative_caps() {
        let cli = parse(&[
            "run",
            "--state",
            "ON",
            "--state",
            "AZ",
            "--category",
            "coffee",
            "--max-reviews",
            "-1",
            "--max-tips",
            "0",
            "--no-checkins",
        ]);
        let Some(Command::Run(run)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run.states, vec!["ON", "AZ"]);
        assert_eq!(run.categories, vec!["coffee"]);
        assert_eq!(run.max_reviews, Some(-1));
        assert_eq!(run.max_tips, Some(0));
        assert!(run.no_checkins);
        assert!(run.max_users.is_none());
    }

    #[test]
    fn config_is_global_and_subcommand_optional() {
        let cli = parse(&["--config", "custom.toml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));

        let cli = parse(&["entries", "--zip", "a.zip", "--config", "b.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("b.toml")));
        assert!(matches!(cli.command, Some(Command::Entries(_))));
    }

    #[test]
    fn extract_defaults_and_targets() {
        let cli = parse(&["extract"]);
        let Some(Command::Extract(extract)) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(extract.what, ExtractTarget::Json);
        assert_eq!(extract.out, PathBuf::from("data/yelp_extracted"));
        assert_eq!(extract.photos_zip, PathBuf::from("data/Yelp-Photos.zip"));
        assert_eq!(extract.max_files, 0);
        assert!(extract.zip.is_none());
        assert!(!extract.no_docs);

        let cli = parse(&["extract", "--what", "both", "--max-files", "25", "--no-docs"]);
        let Some(Command::Extract(extract)) = cli.command else {
            panic!("expected extract");
        };
        assert!(extract.what.json() && extract.what.photos());
        assert_eq!(extract.max_files, 25);
        assert!(extract.no_docs);

        assert!(Cli::try_parse_from(["yelp-eda", "extract", "--what", "videos"]).is_err());
        assert!(Cli::try_parse_from(["yelp-eda", "extract", "--max-files", "-1"]).is_err());
    }

    #[test]
    fn rejects_unknown_flags() {
        let result = Cli::try_parse_from(["yelp-eda", "run", "--port", "80"]);
        assert!(result.is_err());
    }
}
