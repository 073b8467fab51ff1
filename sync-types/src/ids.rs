//! Identity and addressing types for studysync.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{DataType, TypesError};

/// An opaque, stable user identifier supplied by the authentication layer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a UserId, rejecting empty or whitespace-only values.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TypesError::EmptyUserId);
        }
        Ok(Self(raw))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// Normalize an id for comparison.
///
/// Older records stored ids as JSON numbers, so `"1712000000000.0"`,
/// `1712000000000` and `"1712000000000"` must all compare equal.
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('.') {
        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_finite() && value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
                return format!("{}", value as i64);
            }
        }
    }
    trimmed.to_string()
}

/// Accepts an id encoded as either a JSON string or a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Uint(n) => n.to_string(),
            RawId::Float(n) => normalize_id(&n.to_string()),
        }
    }
}

/// Deserialize a string field that legacy data may hold as a number.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RawId::into_string)
}

/// Identifier of a quiz.
///
/// New ids are UUID v4. Ids loaded from storage are kept verbatim and
/// compared through [`normalize_id`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QuizId(String);

impl QuizId {
    /// Generate a fresh, collision-resistant id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing id string.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the id as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The normalized comparison form of this id.
    pub fn normalized(&self) -> String {
        normalize_id(&self.0)
    }

    /// Compare against a raw id using normalized forms.
    pub fn matches(&self, other: &str) -> bool {
        self.normalized() == normalize_id(other)
    }
}

impl Default for QuizId {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de> Deserialize<'de> for QuizId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        string_or_number(deserializer).map(Self)
    }
}

impl From<&str> for QuizId {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizId({})", self.0)
    }
}

/// Address of one slice: one user's data for one data type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SliceKey {
    /// Owner of the slice.
    pub user: UserId,
    /// Which logical data type the slice holds.
    pub data_type: DataType,
}

impl SliceKey {
    /// Create a new slice key.
    pub fn new(user: UserId, data_type: DataType) -> Self {
        Self { user, data_type }
    }

    /// Device-local storage key for this slice, namespaced per user and slice.
    pub fn storage_key(&self, suffix: &str) -> String {
        format!("studysync/{}/{}/{}", self.user, self.data_type, suffix)
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.data_type)
    }
}
