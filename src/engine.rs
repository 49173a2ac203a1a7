use tracing::{debug, info, warn};

use crate::allocator::RoundRobin;
use crate::columns::ColumnClassifier;
use crate::config::Config;
use crate::continuity::ContinuityMap;
use crate::error::EngineResult;
use crate::models::{
    Assignment, AssignmentSource, Gradebook, RunSummary, StudentOutcome, StudentRecord,
};
use crate::risk::ThresholdEvaluator;
use crate::roster::{EnrolledRoster, StaffRoster};
use crate::weekly_log::{normalize_email, PlacementGuard, WeeklyLog};

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub assignments: Vec<Assignment>,
    /// Rotation pointer to persist, already reduced modulo the roster length.
    pub pointer: u64,
}

/// Everything a run needs besides the weekly log it writes into.
pub struct RunInputs<'a> {
    pub gradebook: &'a Gradebook,
    pub enrolled: &'a EnrolledRoster,
    pub staff: StaffRoster,
    pub pointer: u64,
}

/// Scans the gradebook and writes every newly struggling student into the
/// current week's column of `log`.
///
/// Writes happen in gradebook order. A fatal error returns immediately and
/// leaves the rows written so far in `log`; the pointer in that case is lost
/// on purpose, so it must only be persisted from an `Ok` outcome.
pub fn run(config: &Config, inputs: RunInputs<'_>, log: &mut WeeklyLog) -> EngineResult<RunOutcome> {
    config.validate()?;
    let classifier = ColumnClassifier::from_config(config)?;
    let columns = classifier.classify(&inputs.gradebook.headers);
    debug!(
        video_quiz = columns.video_quiz.len(),
        homework = columns.homework.len(),
        exam = columns.exam.len(),
        "classified gradebook columns"
    );
    let evaluator =
        ThresholdEvaluator::new(columns, config.cutoffs.clone(), config.aggregates.clone());

    let continuity = ContinuityMap::resolve(log, config.previous_week().as_deref());
    let mut guard = PlacementGuard::open(log, &config.week_label)?;
    let mut allocator = RoundRobin::new(inputs.staff, inputs.pointer);

    let mut summary = RunSummary::default();
    let mut assignments = Vec::new();
    let marker = config.staff_role_marker.to_lowercase();

    for student in &inputs.gradebook.students {
        let outcome = process_student(
            student,
            inputs.enrolled,
            &marker,
            &evaluator,
            &continuity,
            &mut allocator,
            &mut guard,
        )?;
        summary.record(&outcome);
        if let StudentOutcome::Written(assignment) = outcome {
            assignments.push(assignment);
        }
    }

    info!(
        week = %config.week_label,
        rows_read = summary.rows_read,
        skipped_staff = summary.skipped_staff,
        skipped_off_roster = summary.skipped_off_roster,
        struggling = summary.struggling,
        written = summary.written,
        "{summary}"
    );

    Ok(RunOutcome {
        summary,
        assignments,
        pointer: allocator.into_pointer(),
    })
}

fn process_student(
    student: &StudentRecord,
    enrolled: &EnrolledRoster,
    staff_marker: &str,
    evaluator: &ThresholdEvaluator,
    continuity: &ContinuityMap,
    allocator: &mut RoundRobin,
    guard: &mut PlacementGuard<'_>,
) -> EngineResult<StudentOutcome> {
    if student.display_name.is_empty() {
        return Ok(StudentOutcome::SkippedNoName);
    }
    if !enrolled.contains(&student.display_name) {
        return Ok(StudentOutcome::SkippedOffRoster);
    }
    if !staff_marker.is_empty() && student.role.to_lowercase().contains(staff_marker) {
        return Ok(StudentOutcome::SkippedStaffRow);
    }
    if !evaluator.is_struggling(student) {
        return Ok(StudentOutcome::SkippedNotStruggling);
    }

    let email = normalize_email(&student.email);
    if email.is_empty() {
        warn!(name = %student.display_name, "struggling student has no email; not logged");
        return Ok(StudentOutcome::SkippedNoEmail);
    }
    if guard.contains(&email) {
        debug!(email = %email, "already logged this week");
        return Ok(StudentOutcome::SkippedDuplicate);
    }

    let (staff, source) = match continuity.staff_for(&email) {
        Some(staff) => (staff.to_string(), AssignmentSource::Continuity),
        None => (allocator.next(), AssignmentSource::RoundRobin),
    };

    let row = guard.place(&email, &staff)?;
    debug!(email = %email, staff = %staff, source = %source, row, "assigned student");

    Ok(StudentOutcome::Written(Assignment {
        email,
        staff,
        source,
        row,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn gradebook(rows: &[&[&str]]) -> Gradebook {
        let mut all = vec![vec![
            "Email".to_string(),
            "ID".to_string(),
            "Name".to_string(),
            "Role".to_string(),
            "VQ1".to_string(),
            "HW1".to_string(),
        ]];
        all.extend(strings(rows));
        Gradebook::from_rows(all, 0, 2, 3)
    }

    fn config(week: &str) -> Config {
        Config {
            week_label: week.to_string(),
            ..Config::default()
        }
    }

    fn log_two_staff() -> WeeklyLog {
        WeeklyLog::new(strings(&[
            &["", "Week 1", "Week 2"],
            &["A's Students", "", ""],
            &["", "", ""],
            &["B's Students", "", ""],
            &["", "", ""],
        ]))
    }

    fn run_with(
        config: &Config,
        book: &Gradebook,
        enrolled: &EnrolledRoster,
        pointer: u64,
        log: &mut WeeklyLog,
    ) -> EngineResult<RunOutcome> {
        let inputs = RunInputs {
            gradebook: book,
            enrolled,
            staff: StaffRoster::new(["A", "B"]).unwrap(),
            pointer,
        };
        run(config, inputs, log)
    }

    fn struggling_trio() -> (Gradebook, EnrolledRoster) {
        let book = gradebook(&[
            &["s1@x.edu", "1", "Student One", "Student", "10", "90"],
            &["s2@x.edu", "2", "Student Two", "Student", "20", "90"],
            &["s3@x.edu", "3", "Student Three", "Student", "30", "90"],
        ]);
        let enrolled = EnrolledRoster::from_names(["One, Student", "Two Student", "student three"]);
        (book, enrolled)
    }

    #[test]
    fn round_robin_spreads_new_students() {
        let (book, enrolled) = struggling_trio();
        let mut log = log_two_staff();
        let outcome = run_with(&config("Week 1"), &book, &enrolled, 0, &mut log).unwrap();

        let staff: Vec<&str> = outcome.assignments.iter().map(|a| a.staff.as_str()).collect();
        assert_eq!(staff, ["A", "B", "A"]);
        assert!(outcome
            .assignments
            .iter()
            .all(|a| a.source == AssignmentSource::RoundRobin));
        assert_eq!(outcome.pointer, 1);
        assert_eq!(outcome.summary.written, 3);

        assert_eq!(log.cell(2, 1), "s1@x.edu");
        assert_eq!(log.cell(3, 1), "s3@x.edu");
        assert_eq!(log.cell(4, 0), "B's Students");
        assert_eq!(log.cell(5, 1), "s2@x.edu");
    }

    #[test]
    fn rerun_writes_nothing_new() {
        let (book, enrolled) = struggling_trio();
        let mut log = log_two_staff();
        let cfg = config("Week 1");
        run_with(&cfg, &book, &enrolled, 0, &mut log).unwrap();
        let after_first = log.clone();

        let second = run_with(&cfg, &book, &enrolled, 1, &mut log).unwrap();
        assert_eq!(second.summary.written, 0);
        assert_eq!(second.summary.struggling, 3);
        assert_eq!(second.pointer, 1);
        assert_eq!(log, after_first);
    }

    #[test]
    fn continuity_beats_rotation_and_keeps_pointer() {
        let (book, enrolled) = struggling_trio();
        let mut log = log_two_staff();
        run_with(&config("Week 1"), &book, &enrolled, 0, &mut log).unwrap();

        let outcome = run_with(&config("Week 2"), &book, &enrolled, 1, &mut log).unwrap();
        let placed: Vec<(&str, &str)> = outcome
            .assignments
            .iter()
            .map(|a| (a.email.as_str(), a.staff.as_str()))
            .collect();
        assert_eq!(placed, [("s1@x.edu", "A"), ("s2@x.edu", "B"), ("s3@x.edu", "A")]);
        assert!(outcome
            .assignments
            .iter()
            .all(|a| a.source == AssignmentSource::Continuity));
        assert_eq!(outcome.pointer, 1);
    }

    #[test]
    fn skips_off_roster_staff_and_passing_rows() {
        let book = gradebook(&[
            &["gone@x.edu", "1", "Dropped Student", "Student", "0", "0"],
            &["ta@x.edu", "2", "Teaching Assistant", "Staff - TA", "0", "0"],
            &["fine@x.edu", "3", "Fine Student", "Student", "60", "70"],
            &["", "4", "", "Student", "0", "0"],
            &["low@x.edu", "5", "Low Student", "Student", "59.9", "100"],
        ]);
        let enrolled =
            EnrolledRoster::from_names(["Assistant, Teaching", "Fine Student", "Low Student"]);
        let mut log = log_two_staff();
        let outcome = run_with(&config("Week 1"), &book, &enrolled, 0, &mut log).unwrap();

        assert_eq!(
            outcome.summary,
            RunSummary {
                rows_read: 5,
                skipped_staff: 1,
                skipped_off_roster: 1,
                struggling: 1,
                written: 1,
            }
        );
        assert_eq!(outcome.assignments[0].email, "low@x.edu");
        assert!(log.column_emails(1).all(|email| email != "gone@x.edu"));
    }

    #[test]
    fn missing_exam_columns_never_flag() {
        let book = gradebook(&[&["ok@x.edu", "1", "Ok Student", "Student", "95", "95"]]);
        let enrolled = EnrolledRoster::from_names(["Ok Student"]);
        let mut log = log_two_staff();
        let outcome = run_with(&config("Week 1"), &book, &enrolled, 0, &mut log).unwrap();
        assert_eq!(outcome.summary.struggling, 0);
    }

    #[test]
    fn missing_week_column_is_fatal() {
        let (book, enrolled) = struggling_trio();
        let mut log = log_two_staff();
        let err = run_with(&config("Week 9"), &book, &enrolled, 0, &mut log).unwrap_err();
        assert!(matches!(err, EngineError::WeekColumnNotFound(label) if label == "Week 9"));
    }

    #[test]
    fn missing_block_aborts_but_keeps_earlier_writes() {
        let (book, enrolled) = struggling_trio();
        let mut log = WeeklyLog::new(strings(&[&["", "Week 1"], &["A's Students", ""], &["", ""]]));
        let err = run_with(&config("Week 1"), &book, &enrolled, 0, &mut log).unwrap_err();

        assert!(matches!(err, EngineError::StaffBlockNotFound(name) if name == "B"));
        assert_eq!(log.cell(2, 1), "s1@x.edu");
    }

    #[test]
    fn first_week_has_no_continuity() {
        let (book, enrolled) = struggling_trio();
        let mut log = WeeklyLog::new(strings(&[
            &["", "Week 1"],
            &["A's Students", ""],
            &["B's Students", ""],
        ]));
        let outcome = run_with(&config("Week 1"), &book, &enrolled, 1, &mut log).unwrap();
        let staff: Vec<&str> = outcome.assignments.iter().map(|a| a.staff.as_str()).collect();
        assert_eq!(staff, ["B", "A", "B"]);
        assert_eq!(outcome.pointer, 0);
        assert_eq!(log.row_count(), 6);
        assert_eq!(log.cell(1, 0), "A's Students");
        assert_eq!(log.cell(2, 1), "s2@x.edu");
        assert_eq!(log.cell(3, 0), "B's Students");
        assert_eq!(log.cell(4, 1), "s1@x.edu");
        assert_eq!(log.cell(5, 1), "s3@x.edu");
    }

    #[test]
    fn blank_email_is_skipped_without_turning_the_rotation() {
        let book = gradebook(&[
            &["", "1", "Student One", "Student", "10", "90"],
            &["  ", "2", "Student Two", "Student", "10", "90"],
            &["s3@x.edu", "3", "Student Three", "Student", "10", "90"],
        ]);
        let (_, enrolled) = struggling_trio();
        let mut log = WeeklyLog::new(strings(&[
            &["", "Week 1"],
            &["A's Students", ""],
            &["B's Students", ""],
        ]));
        let outcome = run_with(&config("Week 1"), &book, &enrolled, 0, &mut log).unwrap();

        assert_eq!(outcome.summary.struggling, 3);
        assert_eq!(outcome.summary.written, 1);
        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.assignments[0].email, "s3@x.edu");
        assert_eq!(outcome.assignments[0].staff, "A");
        assert_eq!(outcome.pointer, 1);
        assert_eq!(log.row_count(), 4);
        assert!(log.column_emails(1).all(|email| email == "s3@x.edu"));
    }

    #[test]
    fn pointer_moves_only_for_round_robin_placements() {
        let mut log = WeeklyLog::new(strings(&[
            &["", "Week 1", "Week 2"],
            &["A's Students", "", ""],
            &["", "", ""],
            &["B's Students", "", ""],
            &["", "s2@x.edu", ""],
        ]));
        let (book, enrolled) = struggling_trio();
        let outcome = run_with(&config("Week 2"), &book, &enrolled, 0, &mut log).unwrap();

        let placed: Vec<(&str, &str, AssignmentSource)> = outcome
            .assignments
            .iter()
            .map(|a| (a.email.as_str(), a.staff.as_str(), a.source))
            .collect();
        assert_eq!(
            placed,
            [
                ("s1@x.edu", "A", AssignmentSource::RoundRobin),
                ("s2@x.edu", "B", AssignmentSource::Continuity),
                ("s3@x.edu", "B", AssignmentSource::RoundRobin),
            ]
        );
        assert_eq!(outcome.pointer, 0);
    }
}
