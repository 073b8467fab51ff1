//! Records held by the non-quiz slices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::string_or_number;
use crate::Keyed;

/// One answer given to a question, kept in the answer history slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// The quiz the answer was given in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    /// The chosen answer.
    pub answer: String,
    /// Whether it was correct.
    pub is_correct: bool,
    /// When it was answered.
    pub answered_at: DateTime<Utc>,
}

/// A study calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event id.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Title shown in the calendar.
    pub title: String,
    /// Scheduled date.
    pub date: DateTime<Utc>,
    /// Planned quiz this event refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
}

impl Keyed for CalendarEvent {
    fn key(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnswerHistory, CalendarEvents, SliceData};

    #[test]
    fn calendar_events_merge_by_id() {
        let at = Utc::now();
        let event = |id: &str| CalendarEvent {
            id: id.into(),
            title: format!("event {id}"),
            date: at,
            quiz_id: None,
        };
        let mut events: CalendarEvents = vec![event("1")];
        assert_eq!(events.merge_missing(vec![event("1"), event("2")]), 1);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn answer_history_is_a_map_slice() {
        let mut history = AnswerHistory::new();
        history.insert(
            "q1".into(),
            vec![AnswerRecord {
                quiz_id: None,
                answer: "B".into(),
                is_correct: true,
                answered_at: Utc::now(),
            }],
        );
        assert_eq!(history.item_count(), 1);
        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_object());
    }
}
