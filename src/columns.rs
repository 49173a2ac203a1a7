use regex::Regex;

use crate::config::Config;
use crate::error::EngineResult;
use crate::models::ScoreCategory;

/// Gradebook column positions (0-based) grouped by score category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryColumns {
    pub video_quiz: Vec<usize>,
    pub homework: Vec<usize>,
    pub exam: Vec<usize>,
}

impl CategoryColumns {
    pub fn for_category(&self, category: ScoreCategory) -> &[usize] {
        match category {
            ScoreCategory::VideoQuiz => &self.video_quiz,
            ScoreCategory::Homework => &self.homework,
            ScoreCategory::Exam => &self.exam,
        }
    }

    fn push(&mut self, category: ScoreCategory, column: usize) {
        match category {
            ScoreCategory::VideoQuiz => self.video_quiz.push(column),
            ScoreCategory::Homework => self.homework.push(column),
            ScoreCategory::Exam => self.exam.push(column),
        }
    }
}

/// Ordered (category, pattern) rules; the first rule that matches a header wins.
pub struct ColumnClassifier {
    rules: Vec<(ScoreCategory, Regex)>,
    reserved: Vec<usize>,
}

impl ColumnClassifier {
    pub fn new(rules: Vec<(ScoreCategory, Regex)>) -> Self {
        Self {
            rules,
            reserved: Vec::new(),
        }
    }

    /// Builds the classifier from configuration, reserving the identity
    /// columns so an "Email" or "Attendance"-style label there is never scored.
    pub fn from_config(config: &Config) -> EngineResult<Self> {
        let (email, name, role) = config.columns.indexes()?;
        let mut classifier = Self::new(config.compiled_rules()?);
        classifier.reserved = vec![email, name, role];
        Ok(classifier)
    }

    pub fn category_of(&self, header: &str) -> Option<ScoreCategory> {
        let header = header.trim();
        self.rules
            .iter()
            .find(|(_, pattern)| pattern.is_match(header))
            .map(|(category, _)| *category)
    }

    pub fn classify<S: AsRef<str>>(&self, headers: &[S]) -> CategoryColumns {
        let mut columns = CategoryColumns::default();
        for (index, header) in headers.iter().enumerate() {
            if self.reserved.contains(&index) {
                continue;
            }
            if let Some(category) = self.category_of(header.as_ref()) {
                columns.push(category, index);
            }
        }
        columns
    }
}
