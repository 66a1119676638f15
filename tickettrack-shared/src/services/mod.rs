/// Board, membership and ticket operations
///
/// - `boards`: board aggregate creation, listing and raw fetch
/// - `membership`: invitations and their acceptance
/// - `tickets`: ticket lifecycle (create, update, transition, comment, delete, list)
///
/// Operations return [`crate::error::DomainError`] and read/write only
/// through [`crate::store::Store`].

pub mod boards;
pub mod membership;
pub mod tickets;
