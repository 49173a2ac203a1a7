use std::fmt;

use serde::{Deserialize, Serialize};

/// One gradebook row, lifted out of positional cells once at ingestion.
#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub email: String,
    pub display_name: String,
    pub role: String,
    /// Raw score cells keyed by gradebook column position (0-based).
    pub raw_scores: Vec<String>,
}

impl StudentRecord {
    pub fn score_at(&self, column: usize) -> Option<&str> {
        self.raw_scores.get(column).map(String::as_str)
    }
}

/// Gradebook header plus typed student rows.
#[derive(Debug, Clone, Default)]
pub struct Gradebook {
    pub headers: Vec<String>,
    pub students: Vec<StudentRecord>,
}

impl Gradebook {
    /// Lifts raw rows (first row = labels) into records using 0-based
    /// email/name/role positions.
    pub fn from_rows(rows: Vec<Vec<String>>, email: usize, name: usize, role: usize) -> Self {
        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        let cell = |cells: &[String], index: usize| {
            cells.get(index).map(|c| c.trim().to_string()).unwrap_or_default()
        };

        let students = rows
            .map(|cells| StudentRecord {
                email: cell(&cells, email),
                display_name: cell(&cells, name),
                role: cell(&cells, role),
                raw_scores: cells,
            })
            .collect();

        Self { headers, students }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    VideoQuiz,
    Homework,
    Exam,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 3] = [Self::VideoQuiz, Self::Homework, Self::Exam];
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::VideoQuiz => "video_quiz",
            Self::Homework => "homework",
            Self::Exam => "exam",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSource {
    Continuity,
    RoundRobin,
}

impl fmt::Display for AssignmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuity => f.write_str("continuity"),
            Self::RoundRobin => f.write_str("round robin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub email: String,
    pub staff: String,
    pub source: AssignmentSource,
    /// 0-based row in the weekly log where the email was written.
    pub row: usize,
}

/// Where a gradebook row ended up after passing through the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StudentOutcome {
    SkippedNoName,
    SkippedOffRoster,
    SkippedStaffRow,
    SkippedNotStruggling,
    /// Struggling, but the gradebook row has no email to log.
    SkippedNoEmail,
    SkippedDuplicate,
    Written(Assignment),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_read: usize,
    pub skipped_staff: usize,
    pub skipped_off_roster: usize,
    pub struggling: usize,
    pub written: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &StudentOutcome) {
        self.rows_read += 1;
        match outcome {
            StudentOutcome::SkippedNoName | StudentOutcome::SkippedNotStruggling => {}
            StudentOutcome::SkippedOffRoster => self.skipped_off_roster += 1,
            StudentOutcome::SkippedStaffRow => self.skipped_staff += 1,
            StudentOutcome::SkippedNoEmail | StudentOutcome::SkippedDuplicate => {
                self.struggling += 1
            }
            StudentOutcome::Written(_) => {
                self.struggling += 1;
                self.written += 1;
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {}, staff {}, off-roster {}, struggling {}, written {}",
            self.rows_read, self.skipped_staff, self.skipped_off_roster, self.struggling, self.written
        )
    }
}
