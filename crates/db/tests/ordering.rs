//! Integration tests for contiguous topic and lesson ordering.
//!
//! Exercises the repository layer against a real database:
//! - Appends take the next order key
//! - Reorders apply a full permutation atomically
//! - Deletes close the gap left behind
//! - Invalid permutations leave the stored order untouched

use assert_matches::assert_matches;
use eduportal_core::error::CoreError;
use eduportal_db::models::course::CreateCourse;
use eduportal_db::models::lesson::CreateLesson;
use eduportal_db::models::topic::CreateTopic;
use eduportal_db::repositories::{CourseRepo, LessonRepo, TopicRepo};
use eduportal_db::DbError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_course(title: &str) -> CreateCourse {
    CreateCourse {
        title: title.to_string(),
        slug: None,
        summary: None,
        description: None,
        thumbnail_url: None,
        pricing_model: None,
        price_paise: None,
        sale_price_paise: None,
        currency: None,
        status: None,
        category_id: None,
    }
}

fn new_topic(title: &str) -> CreateTopic {
    CreateTopic {
        title: title.to_string(),
        description: None,
    }
}

fn new_lesson(title: &str) -> CreateLesson {
    CreateLesson {
        title: title.to_string(),
        content: None,
        video_url: None,
        duration_secs: None,
        is_preview: None,
    }
}

async fn course(pool: &PgPool, slug: &str) -> i64 {
    CourseRepo::create(pool, &new_course(slug), slug)
        .await
        .unwrap()
        .id
}

async fn topic_order(pool: &PgPool, course_id: i64) -> Vec<(String, i32)> {
    TopicRepo::list_by_course(pool, course_id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.title, t.sort_order))
        .collect()
}

async fn lesson_order(pool: &PgPool, topic_id: i64) -> Vec<(String, i32)> {
    LessonRepo::list_by_topic(pool, topic_id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| (l.title, l.sort_order))
        .collect()
}

fn owned(items: &[(&str, i32)]) -> Vec<(String, i32)> {
    items.iter().map(|(t, o)| (t.to_string(), *o)).collect()
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn topics_append_in_order(pool: PgPool) {
    let course_id = course(&pool, "appends").await;
    for title in ["A", "B", "C"] {
        TopicRepo::create(&pool, course_id, &new_topic(title)).await.unwrap();
    }

    assert_eq!(
        topic_order(&pool, course_id).await,
        owned(&[("A", 0), ("B", 1), ("C", 2)])
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn topics_are_ordered_per_course(pool: PgPool) {
    let first = course(&pool, "first").await;
    let second = course(&pool, "second").await;

    TopicRepo::create(&pool, first, &new_topic("F1")).await.unwrap();
    TopicRepo::create(&pool, first, &new_topic("F2")).await.unwrap();
    TopicRepo::create(&pool, second, &new_topic("S1")).await.unwrap();

    assert_eq!(topic_order(&pool, second).await, owned(&[("S1", 0)]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reorder_swaps_without_constraint_errors(pool: PgPool) {
    let course_id = course(&pool, "swaps").await;
    let a = TopicRepo::create(&pool, course_id, &new_topic("A")).await.unwrap();
    let b = TopicRepo::create(&pool, course_id, &new_topic("B")).await.unwrap();
    let c = TopicRepo::create(&pool, course_id, &new_topic("C")).await.unwrap();

    let topics = TopicRepo::reorder(&pool, course_id, &[c.id, b.id, a.id])
        .await
        .unwrap();
    let titles: Vec<&str> = topics.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "B", "A"]);
    assert_eq!(
        topic_order(&pool, course_id).await,
        owned(&[("C", 0), ("B", 1), ("A", 2)])
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reorder_rejects_foreign_and_missing_ids(pool: PgPool) {
    let course_id = course(&pool, "strict").await;
    let other = course(&pool, "other").await;
    let a = TopicRepo::create(&pool, course_id, &new_topic("A")).await.unwrap();
    let b = TopicRepo::create(&pool, course_id, &new_topic("B")).await.unwrap();
    let foreign = TopicRepo::create(&pool, other, &new_topic("X")).await.unwrap();

    let err = TopicRepo::reorder(&pool, course_id, &[b.id, foreign.id])
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation(_)));

    let err = TopicRepo::reorder(&pool, course_id, &[b.id]).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation(_)));

    let err = TopicRepo::reorder(&pool, 999_999, &[a.id]).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::NotFound { entity: "Course", .. }));

    assert_eq!(topic_order(&pool, course_id).await, owned(&[("A", 0), ("B", 1)]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_topic_closes_the_gap(pool: PgPool) {
    let course_id = course(&pool, "gaps").await;
    TopicRepo::create(&pool, course_id, &new_topic("A")).await.unwrap();
    let b = TopicRepo::create(&pool, course_id, &new_topic("B")).await.unwrap();
    TopicRepo::create(&pool, course_id, &new_topic("C")).await.unwrap();

    assert!(TopicRepo::delete(&pool, b.id).await.unwrap());
    assert!(!TopicRepo::delete(&pool, b.id).await.unwrap());

    assert_eq!(topic_order(&pool, course_id).await, owned(&[("A", 0), ("C", 1)]));

    // The next append follows the closed sequence.
    TopicRepo::create(&pool, course_id, &new_topic("D")).await.unwrap();
    assert_eq!(
        topic_order(&pool, course_id).await,
        owned(&[("A", 0), ("C", 1), ("D", 2)])
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn topic_for_missing_course_is_not_found(pool: PgPool) {
    let err = TopicRepo::create(&pool, 424_242, &new_topic("Lost")).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::NotFound { entity: "Course", id: 424_242 }));
}

// ---------------------------------------------------------------------------
// Lessons
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn lessons_follow_the_same_rules(pool: PgPool) {
    let course_id = course(&pool, "lessons").await;
    let topic = TopicRepo::create(&pool, course_id, &new_topic("T")).await.unwrap();

    let one = LessonRepo::create(&pool, topic.id, &new_lesson("One")).await.unwrap();
    let two = LessonRepo::create(&pool, topic.id, &new_lesson("Two")).await.unwrap();
    let three = LessonRepo::create(&pool, topic.id, &new_lesson("Three")).await.unwrap();
    assert_eq!(three.sort_order, 2);
    assert_eq!(one.content, "");
    assert!(!one.is_preview);

    LessonRepo::reorder(&pool, topic.id, &[three.id, one.id, two.id])
        .await
        .unwrap();
    assert!(LessonRepo::delete(&pool, one.id).await.unwrap());

    assert_eq!(lesson_order(&pool, topic.id).await, owned(&[("Three", 0), ("Two", 1)]));
    assert_eq!(
        LessonRepo::course_id_for_lesson(&pool, two.id).await.unwrap(),
        Some(course_id)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn course_lessons_come_back_grouped_by_topic(pool: PgPool) {
    let course_id = course(&pool, "grouped").await;
    let first = TopicRepo::create(&pool, course_id, &new_topic("First")).await.unwrap();
    let second = TopicRepo::create(&pool, course_id, &new_topic("Second")).await.unwrap();

    LessonRepo::create(&pool, second.id, &new_lesson("S-a")).await.unwrap();
    LessonRepo::create(&pool, first.id, &new_lesson("F-a")).await.unwrap();
    LessonRepo::create(&pool, first.id, &new_lesson("F-b")).await.unwrap();

    // Move the second topic to the front; lessons follow their topic.
    TopicRepo::reorder(&pool, course_id, &[second.id, first.id])
        .await
        .unwrap();

    let titles: Vec<String> = LessonRepo::list_by_course(&pool, course_id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.title)
        .collect();
    assert_eq!(titles, vec!["S-a", "F-a", "F-b"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_course_cascades(pool: PgPool) {
    let course_id = course(&pool, "cascade").await;
    let topic = TopicRepo::create(&pool, course_id, &new_topic("T")).await.unwrap();
    let lesson = LessonRepo::create(&pool, topic.id, &new_lesson("L")).await.unwrap();

    assert!(CourseRepo::delete(&pool, course_id).await.unwrap());

    assert!(TopicRepo::find_by_id(&pool, topic.id).await.unwrap().is_none());
    assert!(LessonRepo::find_by_id(&pool, lesson.id).await.unwrap().is_none());
}
