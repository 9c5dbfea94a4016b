//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`UnitName`] - Normalized, fully-qualified unit identifier
//! - [`Fingerprint`] - Content hash of a recipe payload plus its resolved schema
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Identity vs. matching
//!
//! Equality and hashing of [`UnitName`] are exact on the normalized,
//! quoted form. Case-insensitive *matching* (used by selection globs)
//! operates on the unquoted text returned by [`UnitName::text`] and is a
//! separate operation from identity.
//!
//! # Examples
//!
//! ```
//! use meshwork::core::types::UnitName;
//!
//! let name = UnitName::from_segments(vec!["db".into(), "orders".into()]).unwrap();
//! assert_eq!(name.to_string(), r#""db"."orders""#);
//! assert_eq!(name.text(), "db.orders");
//!
//! // Invalid constructions fail at creation time
//! assert!(UnitName::from_segments(vec![]).is_err());
//! assert!(UnitName::from_segments(vec!["".into()]).is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid unit name: {0}")]
    InvalidUnitName(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// A normalized, fully-qualified unit name.
///
/// Stored as namespace segments (e.g. catalog, schema, table). The canonical
/// rendering quotes every segment with `"` and joins with `.`:
/// `"db"."orders"`. Segment case is preserved; two names are equal only if
/// their segments match exactly.
///
/// # Example
///
/// ```
/// use meshwork::core::types::UnitName;
///
/// let a = UnitName::from_segments(vec!["db".into(), "Orders".into()]).unwrap();
/// let b = UnitName::from_segments(vec!["db".into(), "orders".into()]).unwrap();
///
/// // Identity is case-sensitive
/// assert_ne!(a, b);
///
/// // Matching text is the unquoted dotted form
/// assert_eq!(a.text(), "db.Orders");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitName {
    segments: Vec<String>,
}

impl UnitName {
    /// Create a unit name from pre-split namespace segments.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidUnitName` if there are no segments, or if
    /// any segment is empty or contains a `"` quote character.
    pub fn from_segments(segments: Vec<String>) -> Result<Self, TypeError> {
        if segments.is_empty() {
            return Err(TypeError::InvalidUnitName(
                "unit name must have at least one segment".into(),
            ));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(TypeError::InvalidUnitName(
                    "unit name segment cannot be empty".into(),
                ));
            }
            if segment.contains('"') {
                return Err(TypeError::InvalidUnitName(
                    "unit name segment cannot contain '\"'".into(),
                ));
            }
        }
        Ok(Self { segments })
    }

    /// Parse a name in canonical quoted form, e.g. `"db"."orders"`.
    ///
    /// This is the inverse of [`std::fmt::Display`] and is used for serde.
    /// Raw (user-authored) names go through [`crate::core::naming::normalize`]
    /// instead, which knows about quoting dialects and default namespaces.
    pub fn parse_canonical(raw: &str) -> Result<Self, TypeError> {
        let mut segments = Vec::new();
        let mut chars = raw.chars().peekable();

        loop {
            match chars.next() {
                Some('"') => {}
                _ => {
                    return Err(TypeError::InvalidUnitName(format!(
                        "expected quoted segment in '{raw}'"
                    )))
                }
            }
            let mut segment = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(c) => segment.push(c),
                    None => {
                        return Err(TypeError::InvalidUnitName(format!(
                            "unterminated quote in '{raw}'"
                        )))
                    }
                }
            }
            segments.push(segment);
            match chars.next() {
                None => break,
                Some('.') => continue,
                Some(c) => {
                    return Err(TypeError::InvalidUnitName(format!(
                        "unexpected '{c}' in '{raw}'"
                    )))
                }
            }
        }

        Self::from_segments(segments)
    }

    /// The namespace segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The unquoted dotted text used for case-insensitive matching.
    ///
    /// This is *not* the identity of the name; see the module docs.
    pub fn text(&self) -> String {
        self.segments.join(".")
    }
}

impl TryFrom<String> for UnitName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse_canonical(&s)
    }
}

impl From<UnitName> for String {
    fn from(name: UnitName) -> Self {
        name.to_string()
    }
}

impl std::fmt::Display for UnitName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "\"{segment}\"")?;
            first = false;
        }
        Ok(())
    }
}

/// A UTC timestamp in RFC3339 format.
///
/// # Example
///
/// ```
/// use meshwork::core::types::UtcTimestamp;
///
/// let past = UtcTimestamp::from_rfc3339("2023-01-01T00:00:00Z").unwrap();
/// assert!(past < UtcTimestamp::now());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Parse an RFC3339 timestamp string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTimestamp` if the string is not RFC3339.
    pub fn from_rfc3339(raw: &str) -> Result<Self, TypeError> {
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| Self(dt.with_timezone(&chrono::Utc)))
            .map_err(|e| TypeError::InvalidTimestamp(format!("{raw}: {e}")))
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A stable hash over a recipe's content payload and its resolved
/// structural schema.
///
/// Two runs that resolve to the same (payload, schema) pair always produce
/// the same fingerprint; recomputing the schema while leaving the payload
/// untouched still changes the fingerprint.
///
/// # Example
///
/// ```
/// use meshwork::core::types::Fingerprint;
///
/// let a = Fingerprint::compute("SELECT 1 AS a", ["db.parent\0a\0INT"]);
/// let b = Fingerprint::compute("SELECT 1 AS a", ["db.parent\0a\0INT"]);
/// let c = Fingerprint::compute("SELECT 1 AS a", ["db.parent\0b\0INT"]);
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from a payload and a set of schema lines.
    ///
    /// The lines are sorted before hashing to ensure determinism regardless
    /// of input order.
    pub fn compute<I, S>(payload: &str, schema_lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines: Vec<String> = schema_lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        lines.sort();

        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher.update(b"\0");
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }

        let result = hasher.finalize();
        Self(hex::encode(result))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
