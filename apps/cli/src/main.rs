mod args;
mod config;
mod logging;

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use ingest::{
    DATASET_TAR_SUFFIX, DatasetArchive, DocsTarget, ExtractStats, PHOTOS_TAR_SUFFIX,
    analyze_archive, default_archive_path, extract_archive,
};
use log::{debug, info};
use yelp_core::group_thousands;

use crate::args::{Cli, Command, EntriesArgs, ExtractArgs};
use crate::config::RunConfig;

fn main() -> Result<(), Box<dyn Error>> {
    logging::init_logging();
    let cli = Cli::parse();

    let loaded = config::load(cli.config.as_deref()).map_err(io::Error::other)?;
    if let Some(file) = &loaded.file {
        info!("Using config {}", file.display());
    }
    let mut config = loaded.config;

    match cli.command.unwrap_or_default() {
        Command::Run(run) => {
            config.apply(&run);
            run_analysis(&config)
        }
        Command::Entries(entries) => list_entries(&entries, &config),
        Command::Extract(extract) => extract_archives(&extract, &config),
    }
}

fn run_analysis(config: &RunConfig) -> Result<(), Box<dyn Error>> {
    let started = Instant::now();
    debug!(
        "effective config:\n{}",
        config::to_toml(config).map_err(io::Error::other)?
    );
    let archive = config.archive_path();
    let options = config.run_options();
    info!("Filters: {}", options.filters.describe());

    let summary = analyze_archive(&archive, &options)?;
    let output = yelp_report::write_report(&config.out, &summary, config.top_n)?;

    for line in yelp_report::context_lines(&summary) {
        info!("{line}");
    }
    println!(
        "Wrote {} chart descriptors and {} tables to {}",
        output.charts.len(),
        output.tables.len(),
        output.out_dir.display()
    );
    println!("Manifest: {}", output.manifest.display());
    println!("Summary: {}", output.summary.display());
    info!("Done in {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}

fn list_entries(args: &EntriesArgs, config: &RunConfig) -> Result<(), Box<dyn Error>> {
    let path = args
        .zip
        .clone()
        .or_else(|| config.archive.clone())
        .unwrap_or_else(default_archive_path);
    print_entries(&path)
}

fn print_entries(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut archive = DatasetArchive::open(path, DATASET_TAR_SUFFIX)?;
    println!("{} :: {}", path.display(), archive.member_name());
    let entries = archive.list_entries()?;
    archive.close();
    for entry in &entries {
        println!("{:>15}  {}", group_thousands(entry.size), entry.path);
    }
    Ok(())
}

fn extract_archives(args: &ExtractArgs, config: &RunConfig) -> Result<(), Box<dyn Error>> {
    let json_zip = args
        .zip
        .clone()
        .or_else(|| config.archive.clone())
        .unwrap_or_else(default_archive_path);
    let docs_dir = args.out.join("docs");
    let mut jobs: Vec<(&str, PathBuf, &str, PathBuf)> = Vec::new();
    if args.what.json() {
        jobs.push(("JSON", json_zip, DATASET_TAR_SUFFIX, args.out.join("yelp_json")));
    }
    if args.what.photos() {
        jobs.push((
            "Photos",
            args.photos_zip.clone(),
            PHOTOS_TAR_SUFFIX,
            args.out.join("yelp_photos"),
        ));
    }

    for (label, zip, suffix, out_root) in jobs {
        let prefix = format!("yelp_{}", label.to_lowercase());
        let docs = (!args.no_docs).then(|| DocsTarget {
            dir: &docs_dir,
            prefix: &prefix,
        });
        let stats = extract_archive(&zip, suffix, &out_root, docs, args.max_files)?;
        print_extract_stats(label, &stats, &out_root);
    }
    if !args.no_docs {
        println!("Docs → {}", docs_dir.display());
    }
    Ok(())
}

fn print_extract_stats(label: &str, stats: &ExtractStats, out_root: &Path) {
    const GIB: f64 = (1u64 << 30) as f64;
    println!(
        "{label} extracted: {} files ({:.2} GiB), skipped: {}",
        group_thousands(stats.extracted_files),
        stats.extracted_bytes as f64 / GIB,
        group_thousands(stats.skipped_files)
    );
    if stats.docs_copied > 0 {
        debug!("{label}: copied {} docs", stats.docs_copied);
    }
    println!("→ {}", out_root.display());
}
