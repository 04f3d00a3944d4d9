//! Tour Wizard: step-gated tour creation over a REST backend.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod wizard;
