//! Request handlers, one module per resource.

pub mod auth;
pub mod carousel;
pub mod categories;
pub mod checkout;
pub mod courses;
pub mod deploy;
pub mod enrollment;
pub mod files;
pub mod forms;
pub mod lessons;
pub mod multipart;
pub mod payments;
pub mod posts;
pub mod tags;
pub mod topics;
pub mod uploads;
