//! # TicketTrack API Server Library
//!
//! HTTP surface for the kanban board core in `tickettrack-shared`.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration management
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: security headers
//! - `routes`: REST handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
