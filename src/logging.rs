use log::LevelFilter;

pub use log::LevelFilter::{Debug, Error, Info, Trace, Warn};

/// Install the global logger. Safe to call more than once; later calls are
/// ignored (the first installed dispatch wins).
pub fn setup_logging(verbosity: LevelFilter) {
    let _ = fern::Dispatch::new()
        .level(verbosity)
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}: {}", record.level(), record.target(), message))
        })
        .chain(std::io::stdout())
        .apply();
}
