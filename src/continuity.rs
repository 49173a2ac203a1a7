use std::collections::HashMap;

use tracing::{info, warn};

use crate::weekly_log::{block_staff_name, normalize_email, WeeklyLog};

/// Email → staff member who had the student in the previous week.
#[derive(Debug, Clone, Default)]
pub struct ContinuityMap {
    by_email: HashMap<String, String>,
}

impl ContinuityMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Walks the log top to bottom, attributing every email in `column` to
    /// the block header above it. Later rows overwrite earlier ones.
    pub fn from_column(log: &WeeklyLog, column: usize) -> Self {
        let mut by_email = HashMap::new();
        let mut current_staff: Option<String> = None;

        for row in 0..log.row_count() {
            if let Some(staff) = block_staff_name(log.cell(row, 0)) {
                current_staff = Some(staff);
                continue;
            }
            let email = normalize_email(log.cell(row, column));
            if let (Some(staff), false) = (&current_staff, email.is_empty()) {
                by_email.insert(email, staff.clone());
            }
        }

        Self { by_email }
    }

    /// Continuity from the previous week's column. A missing label or column
    /// disables continuity and the run falls back to round robin.
    pub fn resolve(log: &WeeklyLog, previous_week: Option<&str>) -> Self {
        let Some(label) = previous_week else {
            warn!("no previous week label; assigning by round robin only");
            return Self::empty();
        };

        match log.find_week_column(label) {
            Some(column) => {
                let map = Self::from_column(log, column);
                if map.is_empty() {
                    warn!(week = label, "previous week column is empty");
                } else {
                    info!(week = label, students = map.len(), "loaded previous week assignments");
                }
                map
            }
            None => {
                warn!(week = label, "previous week column not found; assigning by round robin only");
                Self::empty()
            }
        }
    }

    pub fn staff_for(&self, email: &str) -> Option<&str> {
        self.by_email.get(&normalize_email(email)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}
