//! Value objects for the student domain.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StudentError;

/// A letter grade.
///
/// Parsing is strict: only the exact letters are accepted, anything else is
/// rejected rather than mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Every grade, best first.
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// Returns the grade letter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl FromStr for Grade {
    type Err = StudentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .into_iter()
            .find(|grade| grade.as_str() == s)
            .ok_or_else(|| StudentError::InvalidGrade(s.to_string()))
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog course, identified by its unique name.
///
/// Courses are reference data owned by the catalog; the roster only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    name: String,
    credits: u32,
}

impl Course {
    /// Creates a course.
    pub fn new(name: impl Into<String>, credits: u32) -> Self {
        Self {
            name: name.into(),
            credits,
        }
    }

    /// Returns the course name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the credit count.
    pub fn credits(&self) -> u32 {
        self.credits
    }

    /// Returns the standard course catalog.
    pub fn default_catalog() -> Vec<Course> {
        vec![
            Course::new("Calculus", 5),
            Course::new("Chemistry", 3),
            Course::new("Composition", 3),
            Course::new("Literature", 4),
            Course::new("Trigonometry", 4),
            Course::new("Microeconomics", 3),
        ]
    }
}

impl std::fmt::Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
