/// Tower middleware for the API server
///
/// Authentication lives in `tickettrack_shared::auth::middleware`; this module
/// holds transport-only layers.

pub mod security;
