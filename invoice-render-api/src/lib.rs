//! HTTP boundary for the invoice render pipeline.
//!
//! Exposes `POST /api/generate-pdf`: the caller's credential is checked
//! against the configured secret, the body is parsed into a render request,
//! and one isolated browser session produces the PDF. See
//! [`routes::router`] for the wiring and [`config::Config`] for the
//! environment knobs.

pub mod auth;
pub mod cli;
pub mod config;
pub mod emit;
pub mod routes;
