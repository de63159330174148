use crate::tail::ChartTail;
use chrono::{NaiveDate, Utc};
use nv_schemas::UnifiedEvent;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, SeekFrom};
use tokio::sync::{mpsc, watch};

/// IO failure reading or seeking a chart's daily file (spec §7 `IoError`).
/// Never fatal: the tailer backs off and retries (spec §4.1 "Errors").
#[derive(Debug)]
pub enum IoError {
    Open(PathBuf, String),
    Seek(PathBuf, String),
    Read(PathBuf, String),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::Open(p, e) => write!(f, "open {}: {e}", p.display()),
            IoError::Seek(p, e) => write!(f, "seek {}: {e}", p.display()),
            IoError::Read(p, e) => write!(f, "read {}: {e}", p.display()),
        }
    }
}

impl std::error::Error for IoError {}

#[derive(Debug, Clone)]
pub struct ChartTailConfig {
    pub chart_id: i32,
    pub data_dir: PathBuf,
    pub dedupe_window: usize,
    pub poll_interval: Duration,
}

impl ChartTailConfig {
    pub fn new(chart_id: i32, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            chart_id,
            data_dir: data_dir.into(),
            dedupe_window: 10_000,
            poll_interval: Duration::from_millis(50),
        }
    }
}

fn chart_file_path(dir: &Path, chart_id: i32, date: NaiveDate) -> PathBuf {
    dir.join(format!("chart_{chart_id}_{}.jsonl", date.format("%Y%m%d")))
}

/// Read any lines appended since `offset`, advancing it past each complete
/// line. A trailing partial line (writer mid-flush) is left unconsumed so
/// it is re-read whole on the next poll.
async fn read_new_lines(path: &Path, offset: &mut u64) -> Result<Vec<String>, IoError> {
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(IoError::Open(path.to_path_buf(), e.to_string())),
    };
    file.seek(SeekFrom::Start(*offset))
        .await
        .map_err(|e| IoError::Seek(path.to_path_buf(), e.to_string()))?;

    let mut reader = BufReader::new(file);
    let mut lines = Vec::new();
    loop {
        let mut buf = String::new();
        let n = reader
            .read_line(&mut buf)
            .await
            .map_err(|e| IoError::Read(path.to_path_buf(), e.to_string()))?;
        if n == 0 {
            break;
        }
        if buf.ends_with('\n') {
            *offset += n as u64;
            lines.push(buf);
        } else {
            break;
        }
    }
    Ok(lines)
}

/// Drive one chart's `ChartTail` against its rotating daily file: poll for
/// new lines, hand parsed events to `tx`, reset the byte offset at UTC
/// midnight rollover, and back off exponentially (100ms -> 5s cap) on IO
/// errors (spec §4.1 "Errors", §5 concurrency model).
pub async fn run_chart_tail(
    config: ChartTailConfig,
    tx: mpsc::Sender<(i32, UnifiedEvent)>,
    mut shutdown: watch::Receiver<bool>,
) {
    let chart_id = config.chart_id;
    let mut tail = ChartTail::new(config.chart_id, config.dedupe_window);
    let mut backoff = Duration::from_millis(100);
    let mut current_date = Utc::now().date_naive();
    let mut offset: u64 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let path = chart_file_path(&config.data_dir, config.chart_id, current_date);
        match read_new_lines(&path, &mut offset).await {
            Ok(lines) => {
                backoff = Duration::from_millis(100);
                for line in lines {
                    if let Some(event) = tail.process_line(&line, Utc::now()) {
                        if tx.send((chart_id, event)).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    chart_id = config.chart_id,
                    error = %e,
                    backoff_ms = backoff.as_millis() as u64,
                    "chart tail IO error, backing off"
                );
                if wait_or_shutdown(backoff, &mut shutdown).await {
                    break;
                }
                backoff = (backoff * 2).min(Duration::from_secs(5));
                continue;
            }
        }

        let today = Utc::now().date_naive();
        if today != current_date {
            tracing::info!(chart_id = config.chart_id, %today, "rotating to new daily file");
            current_date = today;
            offset = 0;
        }

        if wait_or_shutdown(config.poll_interval, &mut shutdown).await {
            break;
        }
    }

    tracing::info!(
        chart_id = config.chart_id,
        accepted = tail.stats.accepted,
        parse_errors = tail.stats.parse_errors,
        unknown_type_count = tail.stats.unknown_type_count,
        revisions = tail.stats.revisions,
        "chart tail stopped"
    );
}

/// Sleep for `dur` unless a shutdown is signalled first. Returns `true` if
/// the loop should stop.
async fn wait_or_shutdown(dur: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(dur) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
