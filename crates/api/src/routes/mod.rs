pub mod auth;
pub mod carousel;
pub mod categories;
pub mod courses;
pub mod deploy;
pub mod files;
pub mod forms;
pub mod health;
pub mod lessons;
pub mod me;
pub mod payments;
pub mod posts;
pub mod tags;
pub mod topics;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh       public
/// /auth/logout, /auth/me                           requires auth
///
/// /categories, /tags, /posts                       public reads, admin writes
/// /carousel                                        public reads, admin writes
/// /uploads/images                                  admin
///
/// /courses                                         catalogue + curriculum
/// /courses/{course}/topics[/reorder]               topic ordering (admin)
/// /courses/{course}/purchase, /enrollment          purchase flow (auth)
/// /topics/{topic}[/lessons[/reorder]]              topic + lesson ordering (admin)
/// /lessons/{id}                                    gated read (auth), admin writes
/// /me/enrollments                                  caller's courses (auth)
///
/// /payments/verify                                 course checkout (auth)
/// /payments/webhook                                gateway webhook (signed)
///
/// /files                                           catalogue, purchase, download
/// /forms                                           definitions, submissions
/// /deploy                                          deploy hook (shared secret)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        // Content taxonomy and blog.
        .nest("/categories", categories::router())
        .nest("/tags", tags::router())
        .nest("/posts", posts::router())
        // Home page and editor uploads.
        .nest("/carousel", carousel::router())
        .nest("/uploads", uploads::router())
        // Courses, curriculum and enrollment.
        .nest("/courses", courses::router())
        .nest("/topics", topics::router())
        .nest("/lessons", lessons::router())
        .nest("/me", me::router())
        .nest("/payments", payments::router())
        // Downloadable files and dynamic forms.
        .nest("/files", files::router())
        .nest("/forms", forms::router())
        .nest("/deploy", deploy::router())
}
