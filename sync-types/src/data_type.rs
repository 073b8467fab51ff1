//! The fixed enumeration of per-user data slices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Logical data type of a slice.
///
/// Each user owns exactly one remote record per data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// All of the user's quizzes, as one array.
    Quizzes,
    /// Per-question answer history (question id → records).
    AnswerHistory,
    /// Study calendar events.
    CalendarEvents,
    /// Snapshot of the user's question catalog. Grows by bulk append.
    QuestionBank,
}

impl DataType {
    /// Every known data type.
    pub const ALL: [DataType; 4] = [
        DataType::Quizzes,
        DataType::AnswerHistory,
        DataType::CalendarEvents,
        DataType::QuestionBank,
    ];

    /// Stable name used in storage keys and remote paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Quizzes => "quizzes",
            DataType::AnswerHistory => "answer_history",
            DataType::CalendarEvents => "calendar_events",
            DataType::QuestionBank => "question_bank",
        }
    }

    /// Whether the slice value is a map rather than a list.
    pub fn is_map(&self) -> bool {
        matches!(self, DataType::AnswerHistory)
    }

    /// The default value of this slice, as JSON.
    pub fn empty_value(&self) -> serde_json::Value {
        if self.is_map() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::Value::Array(Vec::new())
        }
    }

    /// Whether failed writes are mirrored into the device-local backup and
    /// merged back on load.
    pub fn supports_local_backup(&self) -> bool {
        matches!(self, DataType::QuestionBank | DataType::AnswerHistory)
    }

    /// Whether the slice accepts incremental appends.
    pub fn supports_append(&self) -> bool {
        matches!(self, DataType::QuestionBank)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| TypesError::UnknownDataType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().unwrap(), dt);
        }
        assert!("nope".parse::<DataType>().is_err());
    }

    #[test]
    fn serde_name_matches_storage_name() {
        for dt in DataType::ALL {
            let json = serde_json::to_string(&dt).unwrap();
            assert_eq!(json, format!("\"{}\"", dt.as_str()));
        }
    }

    #[test]
    fn empty_value_depends_on_shape() {
        assert_eq!(DataType::AnswerHistory.empty_value(), serde_json::json!({}));
        assert_eq!(DataType::Quizzes.empty_value(), serde_json::json!([]));
    }

    #[test]
    fn only_question_bank_supports_append() {
        let appendable: Vec<_> = DataType::ALL
            .into_iter()
            .filter(DataType::supports_append)
            .collect();
        assert_eq!(appendable, vec![DataType::QuestionBank]);
        assert!(DataType::QuestionBank.supports_local_backup());
        assert!(!DataType::Quizzes.supports_local_backup());
    }
}
