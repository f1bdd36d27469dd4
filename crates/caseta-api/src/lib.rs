//! HTTP client for the remote community API: auth, visit and worker CRUD,
//! guard roster, and verification submission.

pub mod client;

pub use client::{ApiError, CommunityApi};
