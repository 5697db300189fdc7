use std::fs;
use std::path::{Path, PathBuf};

use ingest::DatasetSummary;
use yelp_core::{ChartSpec, RecordKind, group_thousands};

use crate::error::Result;

pub const MANIFEST_FILE: &str = "manifest.md";
const TITLE: &str = "# Yelp exploratory figures";

/// Run context shown at the top of the manifest.
pub fn context_lines(summary: &DatasetSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Businesses selected: {}",
            group_thousands(summary.selected_businesses as u64)
        ),
        format!("Filters: {}", summary.filters.describe()),
    ];
    // The check-in unit is a parsed timestamp, not a record.
    if let Some(stats) = summary.pass(RecordKind::Checkin) {
        lines.push(stats.context_line_counting(summary.checkins.matrix.total()));
    }
    for kind in [
        RecordKind::Review,
        RecordKind::User,
        RecordKind::Tip,
    ] {
        if let Some(stats) = summary.pass(kind) {
            lines.push(stats.context_line());
        }
    }
    if let Some(stats) = summary.pass(RecordKind::Photo)
        && !stats.cap.is_skip()
    {
        lines.push(stats.context_line());
    }
    lines
}

pub fn render_manifest(specs: &[ChartSpec], context: &[String], tables: &[String]) -> String {
    let mut lines = vec![TITLE.to_string(), String::new()];
    if !context.is_empty() {
        lines.push("## Context".to_string());
        lines.extend(context.iter().map(|line| format!("- {line}")));
        lines.push(String::new());
    }
    lines.push("## Figures".to_string());
    for spec in specs {
        let extra = spec
            .notes
            .as_deref()
            .map(|notes| format!(" ({notes})"))
            .unwrap_or_default();
        lines.push(format!("- `{}` — {}{extra}", spec.filename, spec.title));
    }
    lines.push(String::new());
    if !tables.is_empty() {
        lines.push("## Tables".to_string());
        lines.extend(tables.iter().map(|name| format!("- `{name}`")));
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn write_manifest(
    out_dir: &Path,
    specs: &[ChartSpec],
    context: &[String],
    tables: &[String],
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(MANIFEST_FILE);
    fs::write(&path, render_manifest(specs, context, tables))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::summary_fixture;

    #[test]
    fn renders_sections_in_order() {
        let specs = vec![
            ChartSpec::new("01_a.png", "First?"),
            ChartSpec::new("02_b.png", "Second?").with_notes("cap=10"),
        ];
        let text = render_manifest(
            &specs,
            &["Businesses selected: 2".to_string()],
            &["state_distribution.csv".to_string()],
        );
        let expected = "# Yelp exploratory figures\n\n\
## Context\n- Businesses selected: 2\n\n\
## Figures\n- `01_a.png` — First?\n- `02_b.png` — Second? (cap=10)\n\n\
## Tables\n- `state_distribution.csv`\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn omits_empty_context_and_tables() {
        let text = render_manifest(&[], &[], &[]);
        assert_eq!(text, "# Yelp exploratory figures\n\n## Figures\n");
    }

    #[test]
    fn context_reports_caps_and_skips() {
        let mut summary = summary_fixture();
        for stats in &mut summary.passes {
            if stats.kind == RecordKind::Tip {
                stats.cap = yelp_core::Cap::Skip;
            }
        }
        let lines = context_lines(&summary);
        assert_eq!(lines[0], "Businesses selected: 2");
        assert_eq!(
            lines[1],
            "Filters: states=∅, cities=∅, category substrings=∅"
        );
        assert!(lines.contains(&"Check-ins counted: 2 (all)".to_string()));
        assert!(lines.contains(&"Reviews counted: 2 (max_reviews=2)".to_string()));
        assert!(lines.contains(&"Tips: skipped".to_string()));
        assert!(lines.iter().any(|line| line.starts_with("Photos counted: 1")));
    }
}
