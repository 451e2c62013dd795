//! Course topic model and DTOs.

use eduportal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::lesson::LessonView;

/// A row from the `course_topics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseTopic {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTopic {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTopic {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Body of a bulk reorder: every child id of the parent, in the new order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReorderRequest {
    pub ids: Vec<DbId>,
}

/// A topic with its lessons, as rendered in a course curriculum.
#[derive(Debug, Clone, Serialize)]
pub struct CurriculumTopic {
    #[serde(flatten)]
    pub topic: CourseTopic,
    pub lessons: Vec<LessonView>,
}
