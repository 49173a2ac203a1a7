//! Run configuration.
//!
//! Every field has a default so an empty TOML file is a valid configuration.
//! Column positions are 1-based, the way they read in the spreadsheet.

use std::path::Path;

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::ScoreCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Average,
    Minimum,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cutoffs {
    pub video_quiz: f64,
    pub homework: f64,
    pub exam: f64,
}

impl Default for Cutoffs {
    fn default() -> Self {
        Self {
            video_quiz: 0.60,
            homework: 0.70,
            exam: 0.70,
        }
    }
}

impl Cutoffs {
    pub fn for_category(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::VideoQuiz => self.video_quiz,
            ScoreCategory::Homework => self.homework,
            ScoreCategory::Exam => self.exam,
        }
    }
}

/// How each category collapses its columns into one number.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Aggregates {
    pub video_quiz: Aggregate,
    pub homework: Aggregate,
    pub exam: Aggregate,
}

impl Default for Aggregates {
    fn default() -> Self {
        Self {
            video_quiz: Aggregate::Average,
            homework: Aggregate::Average,
            exam: Aggregate::Minimum,
        }
    }
}

impl Aggregates {
    pub fn for_category(&self, category: ScoreCategory) -> Aggregate {
        match category {
            ScoreCategory::VideoQuiz => self.video_quiz,
            ScoreCategory::Homework => self.homework,
            ScoreCategory::Exam => self.exam,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRule {
    pub category: ScoreCategory,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub email: usize,
    pub name: usize,
    pub role: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            email: 1,
            name: 3,
            role: 4,
        }
    }
}

impl ColumnLayout {
    /// Converts the 1-based layout to 0-based indexes.
    pub fn indexes(&self) -> EngineResult<(usize, usize, usize)> {
        let zero_based = |field: &str, position: usize| {
            position.checked_sub(1).ok_or_else(|| EngineError::InvalidColumn {
                field: field.to_string(),
            })
        };
        Ok((
            zero_based("email", self.email)?,
            zero_based("name", self.name)?,
            zero_based("role", self.role)?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub week_label: String,
    pub previous_week_label: Option<String>,
    pub cutoffs: Cutoffs,
    pub aggregates: Aggregates,
    pub column_rules: Vec<ColumnRule>,
    pub columns: ColumnLayout,
    pub staff_role_marker: String,
    pub default_staff: Vec<String>,
    pub pointer_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            week_label: "Week 1".to_string(),
            previous_week_label: None,
            cutoffs: Cutoffs::default(),
            aggregates: Aggregates::default(),
            column_rules: default_column_rules(),
            columns: ColumnLayout::default(),
            staff_role_marker: "staff".to_string(),
            default_staff: Vec::new(),
            pointer_key: "STAFF_PTR".to_string(),
        }
    }
}

fn default_column_rules() -> Vec<ColumnRule> {
    [
        (ScoreCategory::VideoQuiz, r"^VQ\d*"),
        (ScoreCategory::Homework, r"^(LAB|HW|A)\d*"),
        (ScoreCategory::Exam, r"^(EX|EXAM)\d*"),
    ]
    .into_iter()
    .map(|(category, pattern)| ColumnRule {
        category,
        pattern: pattern.to_string(),
    })
    .collect()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        for category in ScoreCategory::ALL {
            let value = self.cutoffs.for_category(category);
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidCutoff {
                    category: category.to_string(),
                    value,
                });
            }
        }
        self.columns.indexes()?;
        self.compiled_rules()?;
        Ok(())
    }

    /// Column rules compiled case-insensitively, in evaluation order.
    pub fn compiled_rules(&self) -> EngineResult<Vec<(ScoreCategory, Regex)>> {
        self.column_rules
            .iter()
            .map(|rule| {
                regex::RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| (rule.category, regex))
                    .map_err(|source| EngineError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// The label whose column seeds continuity. An explicit override wins;
    /// otherwise the first number in the current label is decremented.
    pub fn previous_week(&self) -> Option<String> {
        if let Some(label) = &self.previous_week_label {
            return Some(label.clone());
        }
        previous_week_label(&self.week_label)
    }
}

pub fn previous_week_label(current: &str) -> Option<String> {
    let digits = Regex::new(r"\d+").ok()?;
    let found = digits.find(current)?;
    let number: u32 = found.as_str().parse().ok()?;
    let previous = number.checked_sub(1)?;
    Some(format!(
        "{}{}{}",
        &current[..found.start()],
        previous,
        &current[found.end()..]
    ))
}
