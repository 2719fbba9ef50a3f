//! Dashboard filtering over the in-memory student list.
//!
//! A student is shown when its name contains the search text (ignoring case)
//! and its disability level matches the selected level, or any level for
//! [`LevelFilter::All`]. Linear scan; the lists are small.

use std::fmt;
use std::str::FromStr;

use crate::models::{DisabilityLevel, Student};
use crate::utils::contains_ignore_case;

/// Level selector of the dashboard, `"all"` or one disability level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(DisabilityLevel),
}

impl LevelFilter {
    pub fn matches(&self, level: DisabilityLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => *wanted == level,
        }
    }

    /// Cycle All -> Mild -> Moderate -> Severe -> All.
    pub fn next(&self) -> Self {
        match self {
            LevelFilter::All => LevelFilter::Only(DisabilityLevel::Mild),
            LevelFilter::Only(DisabilityLevel::Severe) => LevelFilter::All,
            LevelFilter::Only(level) => LevelFilter::Only(level.next()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LevelFilter::All => "All Levels",
            LevelFilter::Only(level) => level.as_str(),
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelFilter::All => f.write_str("all"),
            LevelFilter::Only(level) => f.write_str(level.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelFilterError(String);

impl fmt::Display for ParseLevelFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown level filter: {:?}", self.0)
    }
}

impl std::error::Error for ParseLevelFilterError {}

impl FromStr for LevelFilter {
    type Err = ParseLevelFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(LevelFilter::All);
        }
        DisabilityLevel::parse(s)
            .map(LevelFilter::Only)
            .ok_or_else(|| ParseLevelFilterError(s.to_string()))
    }
}

/// Search text plus level selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub search: String,
    pub level: LevelFilter,
}

impl StudentFilter {
    pub fn new(search: impl Into<String>, level: LevelFilter) -> Self {
        Self {
            search: search.into(),
            level,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.level != LevelFilter::All
    }

    pub fn matches(&self, student: &Student) -> bool {
        contains_ignore_case(&student.name, &self.search) && self.level.matches(student.disability_level)
    }

    /// Students passing the filter, in their original order.
    pub fn apply<'a>(&self, students: &'a [Student]) -> Vec<&'a Student> {
        students.iter().filter(|s| self.matches(s)).collect()
    }
}

/// Convenience wrapper over [`StudentFilter::apply`].
pub fn filter_students<'a>(students: &'a [Student], search: &str, level: LevelFilter) -> Vec<&'a Student> {
    StudentFilter::new(search, level).apply(students)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_students;

    fn names(students: &[&Student]) -> Vec<String> {
        students.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_all_returns_everything() {
        let students = sample_students();
        let filtered = filter_students(&students, "", LevelFilter::All);
        assert_eq!(filtered.len(), students.len());
    }

    #[test]
    fn test_name_search_is_case_insensitive_substring() {
        let students = sample_students();

        let filtered = filter_students(&students, "JOHN", LevelFilter::All);
        assert_eq!(names(&filtered), vec!["John Doe", "Michael Johnson"]);

        let filtered = filter_students(&students, "avi", LevelFilter::All);
        assert_eq!(names(&filtered), vec!["David Brown", "Sarah Davis"]);

        assert!(filter_students(&students, "zzz", LevelFilter::All).is_empty());
    }

    #[test]
    fn test_level_is_exact_match() {
        let students = sample_students();

        let severe = filter_students(&students, "", LevelFilter::Only(DisabilityLevel::Severe));
        assert_eq!(names(&severe), vec!["Emily Williams"]);

        let mild = filter_students(&students, "", LevelFilter::Only(DisabilityLevel::Mild));
        assert_eq!(names(&mild), vec!["Jane Smith", "Michael Johnson"]);
    }

    #[test]
    fn test_search_and_level_combine() {
        let students = sample_students();
        let filtered = filter_students(&students, "john", LevelFilter::Only(DisabilityLevel::Mild));
        assert_eq!(names(&filtered), vec!["Michael Johnson"]);
    }

    #[test]
    fn test_level_filter_parse() {
        assert_eq!("all".parse::<LevelFilter>(), Ok(LevelFilter::All));
        assert_eq!("ALL".parse::<LevelFilter>(), Ok(LevelFilter::All));
        assert_eq!(
            "Moderate".parse::<LevelFilter>(),
            Ok(LevelFilter::Only(DisabilityLevel::Moderate))
        );
        assert!("extreme".parse::<LevelFilter>().is_err());
    }

    #[test]
    fn test_level_filter_cycle() {
        let mut filter = LevelFilter::All;
        let mut seen = vec![];
        for _ in 0..4 {
            filter = filter.next();
            seen.push(filter.to_string());
        }
        assert_eq!(seen, vec!["Mild", "Moderate", "Severe", "all"]);
    }

    #[test]
    fn test_is_active() {
        assert!(!StudentFilter::default().is_active());
        assert!(StudentFilter::new("a", LevelFilter::All).is_active());
        assert!(StudentFilter::new("", LevelFilter::Only(DisabilityLevel::Mild)).is_active());
    }
}
