use std::io::Write;

use env_logger::Env;
use log::warn;

/// Level `info` by default; `RUST_LOG` overrides it.
pub fn init_logging() {
    if env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let t = chrono::Utc::now();
            let level_style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} {}",
                t.format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .is_err()
    {
        warn!("Unable to initialize logging -- has it already been initialized?")
    }
}
