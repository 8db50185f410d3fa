/// Password hashing and validation
///
/// Hashing uses Argon2id (64 MB memory, 3 iterations, 4 lanes, 32-byte
/// output) and produces PHC strings that embed their own parameters.
///
/// Validation applies the signup rules:
/// - at least [`MIN_LENGTH`] characters
/// - not entirely numeric
/// - not a commonly used password
/// - not too similar to the username, email or names of the account
///
/// # Example
///
/// ```
/// use softdesk_shared::auth::password::{hash_password, verify_password, validate_password, UserAttributes};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let attrs = UserAttributes { username: "ada", ..Default::default() };
/// assert!(validate_password("correct horse battery", &attrs).is_ok());
///
/// let hash = hash_password("correct horse battery")?;
/// assert!(verify_password("correct horse battery", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum accepted password length, in characters
pub const MIN_LENGTH: usize = 8;

/// Similarity ratio at or above which a password is rejected
pub const MAX_SIMILARITY: f64 = 0.7;

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "12345678", "123456789", "1234567890", "password", "password1",
    "password123", "qwerty", "qwertyuiop", "qwerty123", "abc123", "111111",
    "1q2w3e4r", "iloveyou", "admin", "admin123", "welcome", "welcome1",
    "letmein", "monkey", "dragon", "football", "baseball", "sunshine",
    "princess", "trustno1", "superman", "starwars", "whatever", "azerty",
    "passw0rd", "p@ssw0rd", "changeme", "secret", "master", "shadow",
    "michael", "jennifer", "computer", "internet", "zaq12wsx", "1qaz2wsx",
];

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Account attributes a password must not resemble
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAttributes<'a> {
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Hashes a password using Argon2id
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC hash in constant time
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch
///
/// # Errors
///
/// Returns an error if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Validates a candidate password against the signup rules
///
/// Every rule is checked so the caller can report all problems at once.
///
/// # Returns
///
/// `Ok(())` if the password is acceptable, otherwise one message per failed rule
pub fn validate_password(password: &str, attrs: &UserAttributes<'_>) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_LENGTH {
        errors.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_LENGTH
        ));
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("This password is entirely numeric.".to_string());
    }

    if is_common(password) {
        errors.push("This password is too common.".to_string());
    }

    if let Some(field) = similar_attribute(password, attrs) {
        errors.push(format!("The password is too similar to the {}.", field));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_common(password: &str) -> bool {
    let lowered = password.trim().to_lowercase();
    COMMON_PASSWORDS.contains(&lowered.as_str())
}

/// Returns the name of the first attribute the password is too similar to
///
/// Emails are compared both whole and by their local part; names are also
/// compared word by word.
fn similar_attribute(password: &str, attrs: &UserAttributes<'_>) -> Option<&'static str> {
    let password = password.to_lowercase();

    let email_parts: Vec<&str> = attrs
        .email
        .map(|email| {
            let mut parts = vec![email];
            if let Some((local, _)) = email.split_once('@') {
                parts.push(local);
            }
            parts
        })
        .unwrap_or_default();

    let candidates: [(&'static str, Vec<&str>); 4] = [
        ("username", vec![attrs.username]),
        ("email address", email_parts),
        ("first name", attrs.first_name.split_whitespace().collect()),
        ("last name", attrs.last_name.split_whitespace().collect()),
    ];

    candidates.into_iter().find_map(|(field, values)| {
        values
            .into_iter()
            .filter(|value| !value.is_empty())
            .any(|value| {
                strsim::normalized_levenshtein(&password, &value.to_lowercase()) >= MAX_SIMILARITY
            })
            .then_some(field)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> UserAttributes<'static> {
        UserAttributes {
            username: "margaret",
            email: Some("mhamilton@example.com"),
            first_name: "Margaret",
            last_name: "Hamilton",
        }
    }

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").unwrap();

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());

        // Parses as a PHC string but can never match
        assert!(!matches!(
            verify_password("password", "$argon2id$invalid"),
            Ok(true)
        ));
    }

    #[test]
    fn test_validate_password_accepts_reasonable_password() {
        assert!(validate_password("orbital-rendezvous-42", &attrs()).is_ok());
    }

    #[test]
    fn test_validate_password_too_short() {
        let errors = validate_password("k9#Lm2", &attrs()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("too short"));
    }

    #[test]
    fn test_validate_password_entirely_numeric() {
        let errors = validate_password("80417265903", &attrs()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("entirely numeric")));
    }

    #[test]
    fn test_validate_password_common() {
        let errors = validate_password("Password123", &UserAttributes::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("too common")));
    }

    #[test]
    fn test_validate_password_similar_to_username() {
        let errors = validate_password("margaret1", &attrs()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("username")));
    }

    #[test]
    fn test_validate_password_similar_to_email_local_part() {
        let attrs = UserAttributes {
            username: "someone",
            email: Some("skywalker77@example.com"),
            ..Default::default()
        };
        let errors = validate_password("skywalker78", &attrs).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("email address")));
    }

    #[test]
    fn test_validate_password_reports_every_failure() {
        let errors = validate_password("123456", &UserAttributes::default()).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
