//! Request extractors that identify the caller.
//!
//! Handlers pick the guard they need: [`auth::AuthUser`] for signed-in
//! endpoints, [`auth::MaybeAuthUser`] for public pages that show more to
//! admins or enrolled users, and [`rbac::RequireAdmin`] for content management.

pub mod auth;
pub mod rbac;
