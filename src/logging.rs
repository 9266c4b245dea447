use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

/// Set up terminal logging, plus a `run_<timestamp>.log` file when `log_dir` is given.
///
/// Returns the log file path if one was opened. A log file that can't be
/// created is reported and skipped.
pub fn init(level: LevelFilter, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("newsletter")
        .set_time_format_rfc3339()
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let mut log_path = None;
    if let Some(dir) = log_dir {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("run_{stamp}.log"));

        match std::fs::create_dir_all(dir).and_then(|_| File::create(&path)) {
            Ok(file) => {
                loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
                log_path = Some(path);
            }
            Err(e) => eprintln!("Could not open log file {}: {e}", path.display()),
        }
    }

    CombinedLogger::init(loggers)?;
    Ok(log_path)
}
