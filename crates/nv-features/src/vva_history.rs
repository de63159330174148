use chrono::{DateTime, NaiveDate, Utc};
use nv_schemas::VvaLevels;

/// Tracks current vs. previous session Volume Value Area (spec §4.2: "VVA
/// current + previous session"). A session boundary is detected as a UTC
/// calendar-date change on the record's timestamp; this mirrors how the
/// upstream chart export itself rolls VVA at session close.
#[derive(Debug, Clone, Default)]
pub struct VvaHistory {
    session_date: Option<NaiveDate>,
    current: Option<VvaLevels>,
    previous: Option<VvaLevels>,
}

impl VvaHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, levels: VvaLevels, ts: DateTime<Utc>) {
        let date = ts.date_naive();
        if self.session_date != Some(date) {
            self.previous = self.current;
            self.session_date = Some(date);
        }
        self.current = Some(levels);
    }

    pub fn current(&self) -> Option<VvaLevels> {
        self.current
    }

    pub fn previous(&self) -> Option<VvaLevels> {
        self.previous
    }
}
