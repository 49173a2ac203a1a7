use std::fmt::Write;

use crate::continuity::ContinuityMap;
use crate::error::EngineResult;
use crate::weekly_log::{normalize_email, WeeklyLog};

#[derive(Debug, Clone, PartialEq)]
pub struct CaseloadEntry {
    pub email: String,
    pub carried_over: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Caseload {
    pub staff: String,
    pub students: Vec<CaseloadEntry>,
}

/// Students per staff block for one week, flagged when the same staff member
/// also had them the week before.
pub fn summarize_week(
    log: &WeeklyLog,
    week_label: &str,
    previous_week: Option<&str>,
) -> EngineResult<Vec<Caseload>> {
    let column = log.require_week_column(week_label)?;
    let previous = previous_week
        .and_then(|label| log.find_week_column(label))
        .map(|prev| ContinuityMap::from_column(log, prev))
        .unwrap_or_default();

    Ok(log
        .blocks()
        .into_iter()
        .map(|block| {
            let students = block
                .data_rows()
                .map(|row| normalize_email(log.cell(row, column)))
                .filter(|email| !email.is_empty())
                .map(|email| CaseloadEntry {
                    carried_over: previous
                        .staff_for(&email)
                        .is_some_and(|staff| staff.eq_ignore_ascii_case(&block.staff)),
                    email,
                })
                .collect();
            Caseload {
                staff: block.staff,
                students,
            }
        })
        .collect())
}

pub fn build_report(
    log: &WeeklyLog,
    week_label: &str,
    previous_week: Option<&str>,
) -> EngineResult<String> {
    let caseloads = summarize_week(log, week_label, previous_week)?;
    let total: usize = caseloads.iter().map(|c| c.students.len()).sum();
    let carried: usize = caseloads
        .iter()
        .flat_map(|c| &c.students)
        .filter(|s| s.carried_over)
        .count();

    let mut output = String::new();
    let _ = writeln!(output, "# Weekly Mentor Assignments");
    let _ = writeln!(
        output,
        "{} students assigned for {} ({} continuing from {})",
        total,
        week_label,
        carried,
        previous_week.unwrap_or("no previous week")
    );

    for caseload in &caseloads {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} ({})", caseload.staff, caseload.students.len());
        if caseload.students.is_empty() {
            let _ = writeln!(output, "No students this week.");
            continue;
        }
        for student in &caseload.students {
            let marker = if student.carried_over { " (continuing)" } else { "" };
            let _ = writeln!(output, "- {}{}", student.email, marker);
        }
    }

    Ok(output)
}
