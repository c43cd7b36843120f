use log::{Level, LevelFilter, Log, Metadata, Record};

/// Plain stderr logger: `warning:`/`error:` prefixes like the rest of the
/// CLI output, bare lines for info, `debug:` for generation steps.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => eprintln!("error: {}", record.args()),
            Level::Warn => eprintln!("warning: {}", record.args()),
            Level::Info => eprintln!("{}", record.args()),
            Level::Debug | Level::Trace => eprintln!("debug: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

/// `--verbose` wins over `--silent`.
pub fn level(verbose: bool, silent: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if silent {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

pub fn init(verbose: bool, silent: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level(verbose, silent));
    }
}
