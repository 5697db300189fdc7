use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use ingest::{BusinessAggregate, PassStats, business_pass, decode_lines};
use yelp_core::{Cap, Filters, RecordKind};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: jsonl_summary <business.json|-> [STATE...]");
        std::process::exit(2);
    }

    let path = &args[1];
    let reader: Box<dyn BufRead> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path).unwrap_or_else(|err| {
            eprintln!("failed to open {}: {}", path, err);
            std::process::exit(1);
        });
        Box::new(BufReader::new(file))
    };

    let none: [&str; 0] = [];
    let filters = Filters::new(&args[2..], none, none);
    let mut records = decode_lines(reader).with_source(path.as_str());
    let mut aggregate = BusinessAggregate::default();
    let mut stats = PassStats::new(RecordKind::Business, Cap::Unbounded);
    let index = business_pass(&mut records, &filters, &mut aggregate, &mut stats)
        .unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(3);
        });

    println!("lines {}", records.lines_read());
    println!("selected_businesses {}", index.len());
    println!("skipped_unmatched {}", stats.skipped_unmatched);
    println!("skipped_invalid {}", stats.skipped_invalid);
    for (category, count) in aggregate.category_counts.most_common(Some(10)) {
        let average = aggregate
            .average_stars(category)
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!("category {} {} {}", category, count, average);
    }
}
