//! Placeholder parsing and substitution for override environment values.
//!
//! Overrides often need the location of something that only exists once the
//! plan is assembled, such as the joined store path of a native library.
//! Environment values may reference these with placeholders that the planner
//! substitutes.
//!
//! # Placeholder Formats
//!
//! - `$${native:NAME}` - store path of the joined native dependency `NAME`
//! - `$${store}` - the store directory itself
//!
//! # Shell Variables
//!
//! Single `$` characters pass through unchanged, so `$HOME` and `$PATH`
//! work without escaping.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use lockplan_lib::placeholder::{parse, Placeholder, Segment};
//!
//! let segments = parse("$${native:libtorch}/lib:$LD_LIBRARY_PATH").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Placeholder(Placeholder::Native("libtorch".to_string())),
//!     Segment::Literal("/lib:$LD_LIBRARY_PATH".to_string()),
//! ]);
//! ```

use std::collections::BTreeSet;

use thiserror::Error;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${native:NAME}`
  Native(String),

  /// `$${store}`
  Store,
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be resolved
  Placeholder(Placeholder),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("unresolved native dependency: {0}")]
  UnresolvedNative(String),
}

/// Supplies values for placeholders.
pub trait Resolver {
  fn resolve_native(&self, name: &str) -> Result<&str, PlaceholderError>;

  fn resolve_store(&self) -> Result<&str, PlaceholderError>;
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is unclosed, of an unknown type or
/// missing its argument.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    if !matches!(chars.peek(), Some((_, '$'))) {
      // Lone $, shell variables pass through
      literal.push('$');
      continue;
    }
    chars.next();

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();
        if matches!(chars.peek(), Some((_, '{'))) {
          chars.next();
          literal.push_str("$${");
        } else {
          literal.push_str("$$$");
        }
      }
      Some((_, '{')) => {
        chars.next();

        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let mut content = String::new();
        let mut found_close = false;
        for (_, c) in chars.by_ref() {
          if c == '}' {
            found_close = true;
            break;
          }
          content.push(c);
        }

        if !found_close {
          return Err(PlaceholderError::Unclosed(pos));
        }

        segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
      }
      _ => literal.push_str("$$"),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content between `$${` and `}`.
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  if content == "store" {
    return Ok(Placeholder::Store);
  }

  let (kind, rest) = content
    .split_once(':')
    .ok_or_else(|| PlaceholderError::Malformed(format!("missing colon in '{content}'")))?;

  match kind {
    "native" if rest.is_empty() => Err(PlaceholderError::Malformed(format!(
      "native placeholder missing name: '{content}'"
    ))),
    "native" => Ok(Placeholder::Native(rest.to_string())),
    _ => Err(PlaceholderError::UnknownType(kind.to_string())),
  }
}

/// Names of all native dependencies referenced by `input`.
pub fn native_references(input: &str) -> Result<BTreeSet<String>, PlaceholderError> {
  Ok(
    parse(input)?
      .into_iter()
      .filter_map(|segment| match segment {
        Segment::Placeholder(Placeholder::Native(name)) => Some(name),
        _ => None,
      })
      .collect(),
  )
}

/// Parse and substitute in one step.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(Placeholder::Native(name)) => result.push_str(resolver.resolve_native(name)?),
      Segment::Placeholder(Placeholder::Store) => result.push_str(resolver.resolve_store()?),
    }
  }

  Ok(result)
}
