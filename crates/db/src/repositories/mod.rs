//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Multi-statement writes open
//! their own transaction.

pub mod carousel_repo;
pub mod category_repo;
pub mod course_repo;
pub mod enrollment_repo;
pub mod file_repo;
pub mod form_repo;
pub mod lesson_repo;
pub mod payment_repo;
pub mod post_repo;
pub mod session_repo;
pub mod tag_repo;
pub mod topic_repo;
pub mod user_repo;

pub use carousel_repo::CarouselRepo;
pub use category_repo::CategoryRepo;
pub use course_repo::CourseRepo;
pub use enrollment_repo::EnrollmentRepo;
pub use file_repo::{FileRepo, PurchasedFileRepo};
pub use form_repo::{FormRepo, SubmissionRepo};
pub use lesson_repo::LessonRepo;
pub use payment_repo::{CoursePaymentRepo, FilePaymentRepo, FormPaymentRepo, Settlement};
pub use post_repo::{PostFilter, PostRepo};
pub use session_repo::SessionRepo;
pub use tag_repo::TagRepo;
pub use topic_repo::TopicRepo;
pub use user_repo::UserRepo;
