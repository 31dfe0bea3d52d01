//! Row shapes for the study sets database.
//!
//! These types mirror the tables the frontend reads. They carry no
//! validation: whatever the store returns is taken as-is, timestamps
//! included.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Table holding study sets.
pub const STUDY_SETS_TABLE: &str = "study_sets";

/// Schema every table lives in.
pub const PUBLIC_SCHEMA: &str = "public";

/// Creation timestamp column, shared by all tables.
pub const CREATED_AT: &str = "created_at";

/// A named collection of study material, the primary sidebar item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySet {
    /// Store-assigned identifier
    pub id: i64,
    /// Creation timestamp as returned by the store (RFC 3339)
    pub created_at: String,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StudySet {
    /// Create a study set row.
    pub fn new(id: i64, created_at: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id,
            created_at: created_at.into(),
            name,
        }
    }

    /// Name shown in the sidebar.
    ///
    /// Falls back to `Study Set #{id}` when no name is stored or the stored
    /// name is empty. Whitespace is not trimmed.
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Study Set #{}", self.id),
        }
    }

    /// Calendar date of `created_at`, in the offset the store reported.
    pub fn created_date(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|ts| ts.date_naive())
    }

    /// Calendar date of `created_at` as seen from `offset`.
    pub fn created_date_at(&self, offset: FixedOffset) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|ts| ts.with_timezone(&offset).date_naive())
    }

    /// Short `M/D/YYYY` creation date, or the raw timestamp if it won't parse.
    pub fn created_label(&self) -> String {
        self.label(self.created_date())
    }

    /// Like [`created_label`](Self::created_label), for a viewer at `offset`.
    pub fn created_label_at(&self, offset: FixedOffset) -> String {
        self.label(self.created_date_at(offset))
    }

    fn label(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!("{}/{}/{}", date.month(), date.day(), date.year()),
            None => self.created_at.clone(),
        }
    }
}

/// An uploaded piece of material attached to a study set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyMaterial {
    /// Material identifier (UUID)
    pub id: String,
    pub created_at: String,
    /// Owning study set
    pub study_set: i64,
}

/// Running score for one question category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Absent until the row is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub category_name: String,
    pub questions_right: i64,
    pub questions_solved: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Running score for a whole study set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySetScore {
    pub id: i64,
    pub questions_right: i64,
    pub questions_solved: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_uses_stored_name() {
        let set = StudySet::new(7, "2024-03-05T14:22:10+00:00", Some("Biology".to_string()));
        assert_eq!(set.display_name(), "Biology");
    }

    #[test]
    fn test_display_name_falls_back_when_missing_or_empty() {
        let missing = StudySet::new(3, "2024-03-05T14:22:10+00:00", None);
        let empty = StudySet::new(4, "2024-03-05T14:22:10+00:00", Some(String::new()));

        assert_eq!(missing.display_name(), "Study Set #3");
        assert_eq!(empty.display_name(), "Study Set #4");
    }

    #[test]
    fn test_display_name_keeps_whitespace_names() {
        let set = StudySet::new(5, "2024-03-05T14:22:10+00:00", Some(" ".to_string()));
        assert_eq!(set.display_name(), " ");
    }

    #[test]
    fn test_created_label_formats_store_timestamp() {
        let set = StudySet::new(1, "2024-03-05T14:22:10.123456+00:00", None);

        assert_eq!(set.created_date(), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(set.created_label(), "3/5/2024");
    }

    #[test]
    fn test_created_label_at_viewer_offset() {
        let set = StudySet::new(1, "2024-03-05T02:30:00+00:00", None);
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        assert_eq!(set.created_label_at(new_york), "3/4/2024");
        assert_eq!(set.created_label_at(tokyo), "3/5/2024");
        assert_eq!(set.created_label(), "3/5/2024");
    }

    #[test]
    fn test_created_label_at_falls_back_to_raw_value() {
        let set = StudySet::new(1, "yesterday", None);
        let offset = FixedOffset::east_opt(0).unwrap();

        assert_eq!(set.created_label_at(offset), "yesterday");
    }

    #[test]
    fn test_created_label_falls_back_to_raw_value() {
        let set = StudySet::new(1, "yesterday", None);

        assert!(set.created_date().is_none());
        assert_eq!(set.created_label(), "yesterday");
    }

    #[test]
    fn test_study_set_deserializes_without_name() {
        let json = r#"{"id": 9, "created_at": "2024-01-15T10:30:00+00:00"}"#;
        let set: StudySet = serde_json::from_str(json).unwrap();

        assert_eq!(set.id, 9);
        assert!(set.name.is_none());
    }

    #[test]
    fn test_study_set_deserializes_null_name() {
        let json = r#"{"id": 9, "created_at": "2024-01-15T10:30:00+00:00", "name": null}"#;
        let set: StudySet = serde_json::from_str(json).unwrap();

        assert!(set.name.is_none());
        assert_eq!(set.display_name(), "Study Set #9");
    }

    #[test]
    fn test_category_score_omits_unset_fields() {
        let score = CategoryScore {
            id: None,
            category_name: "Cell Biology".to_string(),
            questions_right: 3,
            questions_solved: 5,
            created_at: None,
        };

        let json = serde_json::to_value(&score).unwrap();

        assert!(json.get("id").is_none());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["questions_solved"], 5);
    }

    #[test]
    fn test_study_material_references_set() {
        let json = r#"{"id": "4f1c", "created_at": "2024-01-15T10:30:00+00:00", "study_set": 2}"#;
        let material: StudyMaterial = serde_json::from_str(json).unwrap();

        assert_eq!(material.study_set, 2);
    }
}
