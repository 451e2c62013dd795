//! Course lesson model, DTOs and the access-gated view.

use eduportal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `course_lessons` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseLesson {
    pub id: DbId,
    pub topic_id: DbId,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_secs: Option<i32>,
    pub is_preview: bool,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLesson {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub content: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    pub duration_secs: Option<i32>,
    pub is_preview: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLesson {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub content: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    pub duration_secs: Option<i32>,
    pub is_preview: Option<bool>,
}

/// Lesson as shown to a viewer. Locked lessons omit `content` and `video_url`.
#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub id: DbId,
    pub topic_id: DbId,
    pub title: String,
    pub duration_secs: Option<i32>,
    pub is_preview: bool,
    pub order: i32,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl LessonView {
    /// Build the view. Preview lessons are always unlocked.
    pub fn new(lesson: CourseLesson, has_access: bool) -> Self {
        let unlocked = has_access || lesson.is_preview;
        Self {
            id: lesson.id,
            topic_id: lesson.topic_id,
            title: lesson.title,
            duration_secs: lesson.duration_secs,
            is_preview: lesson.is_preview,
            order: lesson.sort_order,
            locked: !unlocked,
            content: unlocked.then_some(lesson.content),
            video_url: if unlocked { lesson.video_url } else { None },
        }
    }
}
