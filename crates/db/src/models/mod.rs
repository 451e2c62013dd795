//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - A `Deserialize` + `Validate` update DTO (all `Option` fields) for patches

pub mod carousel;
pub mod category;
pub mod course;
pub mod enrollment;
pub mod file;
pub mod form;
pub mod lesson;
pub mod payment;
pub mod post;
pub mod tag;
pub mod topic;
pub mod user;
