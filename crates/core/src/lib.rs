//! Pure domain logic for the education portal.
//!
//! Nothing in this crate performs I/O: the database and HTTP layers call into
//! these helpers for ordering, pricing, payment signatures, slugs, form
//! validation and upload naming.

pub mod error;
pub mod forms;
pub mod ordering;
pub mod payment;
pub mod roles;
pub mod slug;
pub mod status;
pub mod types;
pub mod uploads;
