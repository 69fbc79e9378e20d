use std::fmt;

use crate::error::StoreError;
use crate::record::{DESTINATIONS, ID_KEY, TIME_QUEUED};

/// Delimiter used when a path is rendered for logs and error messages.
pub const PATH_DELIMITER: char = '.';

// ═══════════════════════════════════════════════════════════════
//  Segment
// ═══════════════════════════════════════════════════════════════

/// One validated key of a field path.
///
/// Caller-supplied fragments (destination id, message id, field name)
/// pass through [`Segment::new`], so a fragment can never inject extra
/// levels into the addressed path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment(String);

impl Segment {
    pub fn new(raw: &str) -> Result<Self, StoreError> {
        if raw.is_empty() {
            return Err(StoreError::malformed_path("empty path segment"));
        }
        if raw.contains(PATH_DELIMITER) {
            return Err(StoreError::malformed_path(format!(
                "segment '{raw}' contains '{PATH_DELIMITER}'"
            )));
        }
        if raw.starts_with('$') {
            return Err(StoreError::malformed_path(format!(
                "segment '{raw}' starts with '$'"
            )));
        }
        if raw.contains('\0') {
            return Err(StoreError::malformed_path("segment contains NUL"));
        }
        Ok(Self(raw.to_string()))
    }

    /// Known-good literal key (`destinations`, `timeQueued`).
    fn literal(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ═══════════════════════════════════════════════════════════════
//  FieldPath
// ═══════════════════════════════════════════════════════════════

/// Address of a single leaf inside a correlation record.
///
/// Always has at least one segment: the leaf. `parents` lists the
/// object levels above it, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    parents: Vec<Segment>,
    leaf: Segment,
}

impl FieldPath {
    /// Top-level `timeQueued`.
    pub fn time_queued() -> Self {
        Self {
            parents: Vec::new(),
            leaf: Segment::literal(TIME_QUEUED),
        }
    }

    /// Arbitrary top-level field. The id key is immutable and rejected.
    pub fn field(name: &str) -> Result<Self, StoreError> {
        let leaf = Segment::new(name)?;
        if leaf.as_str() == ID_KEY {
            return Err(StoreError::malformed_path(format!(
                "'{ID_KEY}' is immutable"
            )));
        }
        Ok(Self {
            parents: Vec::new(),
            leaf,
        })
    }

    /// `destinations.<destination_id>.<message_id>.timeQueued`
    pub fn destination_time_queued(
        destination_id: &str,
        message_id: &str,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            parents: destination_parents(destination_id, message_id)?,
            leaf: Segment::literal(TIME_QUEUED),
        })
    }

    /// `destinations.<destination_id>.<message_id>.<field>`
    pub fn destination_field(
        destination_id: &str,
        message_id: &str,
        field: &str,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            parents: destination_parents(destination_id, message_id)?,
            leaf: Segment::new(field)?,
        })
    }

    pub fn parents(&self) -> &[Segment] {
        &self.parents
    }

    pub fn leaf(&self) -> &Segment {
        &self.leaf
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.parents.iter().chain(std::iter::once(&self.leaf))
    }

    /// Dotted rendering of the first `depth` segments.
    pub fn prefix(&self, depth: usize) -> String {
        let delimiter = PATH_DELIMITER.to_string();
        self.segments()
            .take(depth)
            .map(Segment::as_str)
            .collect::<Vec<_>>()
            .join(delimiter.as_str())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.parents.len() + 1))
    }
}

fn destination_parents(destination_id: &str, message_id: &str) -> Result<Vec<Segment>, StoreError> {
    Ok(vec![
        Segment::literal(DESTINATIONS),
        Segment::new(destination_id)?,
        Segment::new(message_id)?,
    ])
}
