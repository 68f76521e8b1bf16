//! launchpad: publish-and-serve core for a browser cloud IDE.
//!
//! A signed-in user submits HTML/CSS/JS from the in-browser editor; launchpad
//! persists it as a static artifact set and serves it back under
//! `/{username}/{project}`.
//!
//! - Storage: Sled KV with JSON (Serde) records for users and the project
//!   registry
//! - Publishing: staged artifact writes with an atomic directory swap,
//!   serialized per (owner, project)
//! - Serving: path-safe static resolution of deployed mini-sites
//! - Networking: Axum + Tokio HTTP surface with JWT-backed sessions

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod publish;
pub mod rest;
pub mod serve;
pub mod storage;
