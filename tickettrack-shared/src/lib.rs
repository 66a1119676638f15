//! # TicketTrack Shared Library
//!
//! Data model, persistence port and the board/ticket engines used by the
//! TicketTrack API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, boards, tickets and response views
//! - `store`: Persistence trait with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, JWTs, request authentication, board access control
//! - `services`: Membership, invitation and ticket lifecycle operations
//! - `db`: Connection pool and migrations
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the TicketTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
