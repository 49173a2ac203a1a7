use std::collections::HashSet;

use crate::error::{EngineError, EngineResult};

/// Comparison key for a display name: letters only, lowercase, tokens sorted.
/// "Smith, John" and "john SMITH" produce the same key.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Comparison key for a staff name: trimmed, straight apostrophes, lowercase.
pub fn staff_key(name: &str) -> String {
    name.trim()
        .replace(['\u{2018}', '\u{2019}'], "'")
        .to_lowercase()
}

/// Set of currently enrolled students, keyed by normalised name.
#[derive(Debug, Default)]
pub struct EnrolledRoster {
    keys: HashSet<String>,
}

impl EnrolledRoster {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = names
            .into_iter()
            .map(|name| normalize_name(name.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();
        Self { keys }
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.keys.contains(&normalize_name(display_name))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Ordered staff list, de-duplicated by [`staff_key`] keeping the first
/// spelling. Order is the rotation order.
#[derive(Debug, Clone)]
pub struct StaffRoster {
    names: Vec<String>,
}

impl StaffRoster {
    pub fn new<I, S>(names: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if seen.insert(staff_key(name)) {
                ordered.push(name.to_string());
            }
        }

        if ordered.is_empty() {
            return Err(EngineError::EmptyStaffRoster);
        }
        Ok(Self { names: ordered })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn get(&self, index: usize) -> &str {
        &self.names[index % self.names.len()]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
