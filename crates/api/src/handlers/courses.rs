//! Handlers for the `/courses` resource and the gated curriculum view.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::payment::validate_pricing;
use eduportal_core::slug::resolve_slug;
use eduportal_core::status::{CourseStatus, PricingModel};
use eduportal_core::types::{DbId, MinorUnits};
use eduportal_db::models::course::{Course, CourseListParams, CreateCourse, UpdateCourse};
use eduportal_db::models::lesson::LessonView;
use eduportal_db::models::topic::CurriculumTopic;
use eduportal_db::repositories::{CourseRepo, EnrollmentRepo, LessonRepo, TopicRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A course with the price a buyer would pay today.
#[derive(Debug, Serialize)]
pub struct CourseResponse {
    #[serde(flatten)]
    pub course: Course,
    pub effective_price_paise: MinorUnits,
}

impl TryFrom<Course> for CourseResponse {
    type Error = CoreError;

    fn try_from(course: Course) -> Result<Self, Self::Error> {
        let effective_price_paise = course.price_to_pay()?;
        Ok(Self {
            course,
            effective_price_paise,
        })
    }
}

/// Curriculum of a course as seen by the current viewer.
#[derive(Debug, Serialize)]
pub struct CurriculumResponse {
    pub course_id: DbId,
    /// Whether the viewer can open every lesson.
    pub has_access: bool,
    pub topics: Vec<CurriculumTopic>,
}

// ---------------------------------------------------------------------------
// Access helpers
// ---------------------------------------------------------------------------

/// Load a course by slug. Unpublished courses only resolve for admins.
async fn visible_course(state: &AppState, slug: String, is_admin: bool) -> AppResult<Course> {
    CourseRepo::find_by_slug(&state.pool, &slug)
        .await?
        .filter(|c| is_admin || c.is_published())
        .ok_or(AppError::Core(CoreError::NotFoundBySlug {
            entity: "Course",
            slug,
        }))
}

/// Admins and enrolled users can open every lesson of a course.
pub(crate) async fn has_course_access(
    state: &AppState,
    viewer: Option<&AuthUser>,
    course_id: DbId,
) -> AppResult<bool> {
    match viewer {
        None => Ok(false),
        Some(user) if user.is_admin() => Ok(true),
        Some(user) => Ok(EnrollmentRepo::exists(&state.pool, user.user_id, course_id).await?),
    }
}

/// Resolve and validate the pricing triple a course would end up with.
fn check_pricing(
    model: Option<&str>,
    price: MinorUnits,
    sale_price: Option<MinorUnits>,
) -> Result<(), CoreError> {
    let model: PricingModel = model.unwrap_or(PricingModel::Free.as_str()).parse()?;
    let sale_price = match model {
        PricingModel::Free => None,
        PricingModel::Paid => sale_price,
    };
    validate_pricing(model, price, sale_price)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/courses?category=&limit=&offset=
///
/// Drafts and archived courses are listed for admins only.
pub async fn list(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(params): Query<CourseListParams>,
) -> AppResult<impl IntoResponse> {
    let is_admin = viewer.as_ref().is_some_and(AuthUser::is_admin);
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let courses = CourseRepo::list(
        &state.pool,
        !is_admin,
        params.category.as_deref(),
        limit,
        offset,
    )
    .await?;

    let data = courses
        .into_iter()
        .map(CourseResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/courses/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let is_admin = viewer.as_ref().is_some_and(AuthUser::is_admin);
    let course = visible_course(&state, slug, is_admin).await?;
    Ok(Json(DataResponse {
        data: CourseResponse::try_from(course)?,
    }))
}

/// GET /api/v1/courses/{slug}/curriculum
///
/// Every topic and lesson in order. Lesson content and video are included
/// only for preview lessons, enrolled users and admins.
pub async fn curriculum(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let is_admin = viewer.as_ref().is_some_and(AuthUser::is_admin);
    let course = visible_course(&state, slug, is_admin).await?;
    let has_access = has_course_access(&state, viewer.as_ref(), course.id).await?;

    let topics = TopicRepo::list_by_course(&state.pool, course.id).await?;
    let mut lessons = LessonRepo::list_by_course(&state.pool, course.id)
        .await?
        .into_iter()
        .peekable();

    // Lessons arrive grouped by topic in topic order.
    let mut curriculum = Vec::with_capacity(topics.len());
    for topic in topics {
        let mut views = Vec::new();
        while let Some(lesson) = lessons.next_if(|l| l.topic_id == topic.id) {
            views.push(LessonView::new(lesson, has_access));
        }
        curriculum.push(CurriculumTopic {
            topic,
            lessons: views,
        });
    }

    Ok(Json(DataResponse {
        data: CurriculumResponse {
            course_id: course.id,
            has_access,
            topics: curriculum,
        },
    }))
}

/// POST /api/v1/courses
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(input): ValidatedJson<CreateCourse>,
) -> AppResult<impl IntoResponse> {
    let slug = resolve_slug(input.slug.as_deref(), &input.title)?;
    if let Some(status) = input.status.as_deref() {
        status.parse::<CourseStatus>()?;
    }
    check_pricing(
        input.pricing_model.as_deref(),
        input.price_paise.unwrap_or(0),
        input.sale_price_paise,
    )?;

    let course = CourseRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(
        course_id = course.id,
        user_id = admin.user_id,
        pricing = %course.pricing_model,
        "Course created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CourseResponse::try_from(course)?,
        }),
    ))
}

/// PUT /api/v1/courses/{id}
///
/// Pricing is validated against the merged result, so switching to `paid`
/// requires a price in the same request or already on the course. Switching
/// to `free` clears a price the request does not set.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(mut input): ValidatedJson<UpdateCourse>,
) -> AppResult<impl IntoResponse> {
    let existing = CourseRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id,
        }))?;

    let slug = input
        .slug
        .as_deref()
        .map(|s| resolve_slug(Some(s), ""))
        .transpose()?;
    if let Some(status) = input.status.as_deref() {
        status.parse::<CourseStatus>()?;
    }

    let model: PricingModel = input
        .pricing_model
        .as_deref()
        .unwrap_or(&existing.pricing_model)
        .parse()?;
    if model == PricingModel::Free && input.price_paise.is_none() {
        input.price_paise = Some(0);
    }
    check_pricing(
        Some(model.as_str()),
        input.price_paise.unwrap_or(existing.price_paise),
        input.sale_price_paise.or(existing.sale_price_paise),
    )?;

    let course = CourseRepo::update(&state.pool, id, &input, slug.as_deref())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id,
        }))?;
    Ok(Json(DataResponse {
        data: CourseResponse::try_from(course)?,
    }))
}

/// DELETE /api/v1/courses/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CourseRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id,
        }));
    }
    tracing::info!(course_id = id, user_id = admin.user_id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}
