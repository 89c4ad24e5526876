// src/lib.rs
//! In-memory session model for a classroom live-polling tool.
//!
//! [`session::PollSession`] is the state machine. The remaining modules
//! expose it over HTTP: one server owns the canonical session and each
//! client talks to it through request/response calls.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod results;
pub mod routes;
pub mod session;
pub mod timer;

pub use error::{PollError, RejectedTransition, ValidationError};
pub use session::{PollSession, SessionConfig, SessionSnapshot};
