//! core::naming
//!
//! Unit name normalization rules.
//!
//! # Features
//!
//! - Split dotted/quoted raw names into namespace segments per dialect
//! - Apply a default namespace to unqualified names
//! - Normalize selection patterns with the same rules
//!
//! The default namespace and quoting dialect are always passed explicitly;
//! there is no ambient configuration.

use crate::core::types::{TypeError, UnitName};

/// Quoting convention for raw (user-authored) names.
///
/// The canonical form always uses ANSI double quotes; the dialect only
/// affects how raw input is split into segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `"` quotes an identifier; dots inside quotes are part of the segment.
    #[default]
    Ansi,
    /// `` ` `` quotes an identifier; dots inside quotes still split path
    /// segments, so `` `db.orders` `` names a two-segment path.
    BigQuery,
}

impl Dialect {
    fn quote_char(self) -> char {
        match self {
            Dialect::Ansi => '"',
            Dialect::BigQuery => '`',
        }
    }

    fn dots_split_inside_quotes(self) -> bool {
        matches!(self, Dialect::BigQuery)
    }
}

/// Canonicalize a raw unit name.
///
/// Splits the name into namespace segments honoring the dialect's quoting
/// convention, then applies `default_namespace` as a prefix when the name is
/// a two-segment path (a schema-qualified name gaining a catalog).
/// One-segment names stay unqualified: a namespace cannot be attached
/// without an intermediate schema segment.
///
/// # Errors
///
/// Returns `TypeError::InvalidUnitName` for empty names, empty segments,
/// or unterminated quotes.
///
/// # Example
///
/// ```
/// use meshwork::core::naming::{normalize, Dialect};
///
/// let plain = normalize("db.orders", None, Dialect::Ansi).unwrap();
/// assert_eq!(plain.to_string(), r#""db"."orders""#);
///
/// let qualified = normalize("db.orders", Some("prod"), Dialect::Ansi).unwrap();
/// assert_eq!(qualified.to_string(), r#""prod"."db"."orders""#);
///
/// let bq = normalize("`db.Order_Facts`", None, Dialect::BigQuery).unwrap();
/// assert_eq!(bq.to_string(), r#""db"."Order_Facts""#);
/// ```
pub fn normalize(
    raw: &str,
    default_namespace: Option<&str>,
    dialect: Dialect,
) -> Result<UnitName, TypeError> {
    let segments = qualify(split_segments(raw, dialect)?, default_namespace);
    UnitName::from_segments(segments)
}

/// Normalize a selection pattern into its case-preserving matching text.
///
/// Applies the same segmentation and default-namespace rules as
/// [`normalize`], but the result is a dotted string for glob matching
/// rather than an identity. Glob metacharacters pass through untouched.
///
/// # Example
///
/// ```
/// use meshwork::core::naming::{normalize_pattern, Dialect};
///
/// assert_eq!(
///     normalize_pattern("db.orders*", Some("prod"), Dialect::Ansi).unwrap(),
///     "prod.db.orders*"
/// );
/// assert_eq!(
///     normalize_pattern("*_facts", Some("prod"), Dialect::Ansi).unwrap(),
///     "*_facts"
/// );
/// ```
pub fn normalize_pattern(
    raw: &str,
    default_namespace: Option<&str>,
    dialect: Dialect,
) -> Result<String, TypeError> {
    let segments = qualify(split_segments(raw, dialect)?, default_namespace);
    Ok(segments.join("."))
}

fn qualify(mut segments: Vec<String>, default_namespace: Option<&str>) -> Vec<String> {
    if segments.len() == 2 {
        if let Some(namespace) = default_namespace {
            segments.insert(0, namespace.to_string());
        }
    }
    segments
}

fn split_segments(raw: &str, dialect: Dialect) -> Result<Vec<String>, TypeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TypeError::InvalidUnitName("name cannot be empty".into()));
    }

    let quote = dialect.quote_char();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in raw.chars() {
        if c == quote {
            in_quotes = !in_quotes;
        } else if c == '.' && (!in_quotes || dialect.dots_split_inside_quotes()) {
            if current.is_empty() {
                return Err(TypeError::InvalidUnitName(format!(
                    "empty segment in '{raw}'"
                )));
            }
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    if in_quotes {
        return Err(TypeError::InvalidUnitName(format!(
            "unterminated quote in '{raw}'"
        )));
    }
    if current.is_empty() {
        return Err(TypeError::InvalidUnitName(format!(
            "empty segment in '{raw}'"
        )));
    }
    segments.push(current);

    Ok(segments)
}
