/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and signup password rules
/// - [`jwt`]: access/refresh token issuance and validation
/// - [`middleware`]: the authenticated caller and the Bearer-token middleware
/// - [`authorization`]: access policy predicates
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::auth::jwt::{issue_token_pair, TokenLifetimes};
/// use softdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = issue_token_pair(1, false, "secret-key", &TokenLifetimes::default())?;
/// println!("{}", tokens.access);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
