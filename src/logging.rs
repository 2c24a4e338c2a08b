//! Log setup: every event goes to stdout and is appended to a log file.
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "batch.log";

const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Open `path` for appending, creating it if missing.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Both sinks behind one filter. Each line carries the default timestamp.
pub fn subscriber<W>(filter: EnvFilter, stdout: W, file: File) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(stdout))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
}

/// Install the global subscriber. Filter comes from `RUST_LOG`, default `info,sqlx=warn`.
pub fn init(log_file: &Path) -> io::Result<()> {
    let file = open_log_file(log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    subscriber(filter, io::stdout, file)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn open_log_file_appends() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("logs").join("batch.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn events_reach_both_sinks_with_timestamps() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("batch.log");
        let stdout = SharedBuf::default();
        let sink = stdout.clone();

        let sub = subscriber(
            EnvFilter::new(DEFAULT_FILTER),
            move || sink.clone(),
            open_log_file(&path).unwrap(),
        );
        tracing::subscriber::with_default(sub, || {
            tracing::info!(repository_id = 7, "reconciliation complete");
            tracing::debug!("filtered out");
        });

        let file = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = file.lines().collect();
        assert_eq!(lines.len(), 1);
        let line = lines[0];
        assert!(line.contains("reconciliation complete"));
        assert!(line.contains("repository_id=7"));
        assert!(!line.contains('\u{1b}'));
        // RFC 3339 timestamp first, e.g. `2026-10-16T09:30:00.000000Z`.
        assert!(line[..4].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(&line[4..5], "-");
        assert_eq!(&line[10..11], "T");

        let console = String::from_utf8(stdout.0.lock().unwrap().clone()).unwrap();
        assert!(console.contains("reconciliation complete"));
        assert!(!console.contains("filtered out"));
    }
}
