use tracing::trace;

use crate::columns::CategoryColumns;
use crate::config::{Aggregate, Aggregates, Cutoffs};
use crate::models::{ScoreCategory, StudentRecord};
use crate::percent::parse_percent;

/// Decides whether a student is below the cutoff in any present category.
pub struct ThresholdEvaluator {
    columns: CategoryColumns,
    cutoffs: Cutoffs,
    aggregates: Aggregates,
}

impl ThresholdEvaluator {
    pub fn new(columns: CategoryColumns, cutoffs: Cutoffs, aggregates: Aggregates) -> Self {
        Self {
            columns,
            cutoffs,
            aggregates,
        }
    }

    /// Aggregate for one category. No columns or no parseable values give 1.0.
    pub fn category_score(&self, student: &StudentRecord, category: ScoreCategory) -> f64 {
        let values: Vec<f64> = self
            .columns
            .for_category(category)
            .iter()
            .filter_map(|&column| {
                let raw = student.score_at(column).unwrap_or("");
                let parsed = parse_percent(raw);
                if parsed.is_none() && !raw.trim().is_empty() {
                    trace!(email = %student.email, column, raw, "unparseable score cell");
                }
                parsed
            })
            .collect();

        aggregate(&values, self.aggregates.for_category(category)).unwrap_or(1.0)
    }

    pub fn is_struggling(&self, student: &StudentRecord) -> bool {
        ScoreCategory::ALL.into_iter().any(|category| {
            !self.columns.for_category(category).is_empty()
                && self.category_score(student, category) < self.cutoffs.for_category(category)
        })
    }
}

fn aggregate(values: &[f64], method: Aggregate) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match method {
        Aggregate::Average => Some(values.iter().sum::<f64>() / values.len() as f64),
        Aggregate::Minimum => values.iter().copied().reduce(f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(scores: &[&str]) -> StudentRecord {
        StudentRecord {
            email: "avery.lee@school.edu".to_string(),
            display_name: "Avery Lee".to_string(),
            role: "Student".to_string(),
            raw_scores: scores.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn evaluator(columns: CategoryColumns) -> ThresholdEvaluator {
        ThresholdEvaluator::new(columns, Cutoffs::default(), Aggregates::default())
    }

    fn vq_only() -> CategoryColumns {
        CategoryColumns {
            video_quiz: vec![0, 1],
            ..CategoryColumns::default()
        }
    }

    #[test]
    fn cutoff_is_strictly_less_than() {
        let eval = evaluator(vq_only());
        assert!(!eval.is_struggling(&student(&["60", "60"])));
        assert!(!eval.is_struggling(&student(&["0.6", "60%"])));
        assert!(eval.is_struggling(&student(&["59.9", "59.9"])));
    }

    #[test]
    fn unparseable_cells_are_excluded_not_zeroed() {
        let eval = evaluator(vq_only());
        let record = student(&["80%", "excused"]);
        assert!((eval.category_score(&record, ScoreCategory::VideoQuiz) - 0.8).abs() < 1e-9);
        assert!(!eval.is_struggling(&record));
    }

    #[test]
    fn no_parseable_values_counts_as_passing() {
        let eval = evaluator(vq_only());
        assert!(!eval.is_struggling(&student(&["", ""])));
        assert!(!eval.is_struggling(&student(&[])));
    }

    #[test]
    fn exam_uses_the_lowest_score() {
        let eval = evaluator(CategoryColumns {
            exam: vec![0, 1, 2],
            ..CategoryColumns::default()
        });
        assert!(eval.is_struggling(&student(&["95", "65", "90"])));
        assert!(!eval.is_struggling(&student(&["95", "70", ""])));
    }

    #[test]
    fn absent_exam_category_never_flags() {
        let eval = evaluator(CategoryColumns {
            video_quiz: vec![0],
            homework: vec![1],
            exam: Vec::new(),
        });
        assert!(!eval.is_struggling(&student(&["90", "90", "0"])));
        assert_eq!(eval.category_score(&student(&["90", "90"]), ScoreCategory::Exam), 1.0);
    }

    #[test]
    fn homework_aggregate_is_configurable() {
        let columns = CategoryColumns {
            homework: vec![0, 1],
            ..CategoryColumns::default()
        };
        let record = student(&["100", "50"]);

        let average = evaluator(columns.clone());
        assert!(!average.is_struggling(&record));

        let minimum = ThresholdEvaluator::new(
            columns,
            Cutoffs::default(),
            Aggregates {
                homework: Aggregate::Minimum,
                ..Aggregates::default()
            },
        );
        assert!(minimum.is_struggling(&record));
    }

    #[test]
    fn zero_score_pulls_average_down() {
        let eval = evaluator(vq_only());
        assert!(eval.is_struggling(&student(&["0", "100"])));
    }
}
