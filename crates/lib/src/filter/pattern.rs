use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use super::FilterError;

/// An ordered, de-duplicated list of anchored path patterns.
///
/// Serializes as the plain list of pattern strings; the compiled set is
/// rebuilt on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PatternSet {
  patterns: Vec<String>,
  compiled: RegexSet,
}

impl PatternSet {
  /// Compile a pattern list. Duplicate patterns are dropped, first occurrence wins.
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FilterError> {
    let mut unique: Vec<String> = Vec::with_capacity(patterns.len());
    for pattern in patterns {
      let pattern = pattern.as_ref();
      if !unique.iter().any(|p| p == pattern) {
        unique.push(pattern.to_string());
      }
    }
    Self::compile(unique)
  }

  /// A set that matches nothing.
  pub fn empty() -> Self {
    Self {
      patterns: Vec::new(),
      compiled: RegexSet::empty(),
    }
  }

  fn compile(patterns: Vec<String>) -> Result<Self, FilterError> {
    let mut anchored = Vec::with_capacity(patterns.len());
    for pattern in &patterns {
      let source = anchor(pattern);
      // Compile individually so the error names the offending pattern.
      Regex::new(&source).map_err(|source| FilterError::InvalidPattern {
        pattern: pattern.clone(),
        source,
      })?;
      anchored.push(source);
    }

    let compiled = RegexSet::new(&anchored).map_err(|source| FilterError::InvalidPattern {
      pattern: patterns.join(", "),
      source,
    })?;

    Ok(Self { patterns, compiled })
  }

  /// Union with `more`, keeping this set's order and appending unseen patterns.
  pub fn union<S: AsRef<str>>(&self, more: &[S]) -> Result<Self, FilterError> {
    let mut merged = self.patterns.clone();
    for pattern in more {
      let pattern = pattern.as_ref();
      if !merged.iter().any(|p| p == pattern) {
        merged.push(pattern.to_string());
      }
    }
    if merged.len() == self.patterns.len() {
      return Ok(self.clone());
    }
    Self::compile(merged)
  }

  /// Whether any pattern matches the relative path.
  pub fn is_match(&self, rel_path: &str) -> bool {
    self.compiled.is_match(rel_path)
  }

  pub fn patterns(&self) -> &[String] {
    &self.patterns
  }

  pub fn is_empty(&self) -> bool {
    self.patterns.is_empty()
  }
}

fn anchor(pattern: &str) -> String {
  format!("^(?:{})$", pattern)
}

impl PartialEq for PatternSet {
  fn eq(&self, other: &Self) -> bool {
    self.patterns == other.patterns
  }
}

impl Eq for PatternSet {}

impl TryFrom<Vec<String>> for PatternSet {
  type Error = FilterError;

  fn try_from(patterns: Vec<String>) -> Result<Self, Self::Error> {
    Self::new(&patterns)
  }
}

impl From<PatternSet> for Vec<String> {
  fn from(set: PatternSet) -> Self {
    set.patterns
  }
}
