/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: access/refresh token issuance and validation
/// - [`middleware`]: bearer-token request authentication
/// - [`authorization`]: board capability checks
///
/// # Example
///
/// ```
/// use tickettrack_shared::auth::password::{hash_password, verify_password};
/// use tickettrack_shared::auth::jwt::{issue_token_pair, validate_access_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let secret = "a-secret-of-at-least-thirty-two-bytes!";
/// let pair = issue_token_pair(Uuid::new_v4(), secret)?;
/// validate_access_token(&pair.access_token, secret)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
