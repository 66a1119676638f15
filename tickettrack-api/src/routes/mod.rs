/// REST handlers, one module per resource
///
/// - `health`: store connectivity
/// - `auth`: signup, signin, token refresh, current user
/// - `boards`: board creation, listing, invitations
/// - `tickets`: ticket lifecycle and comments

pub mod auth;
pub mod boards;
pub mod health;
pub mod tickets;
