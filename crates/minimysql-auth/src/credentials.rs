//! Credential types for authentication.

use zeroize::Zeroizing;

/// Account credentials for a MySQL connection.
///
/// The password is held in a [`Zeroizing`] wrapper so its bytes are wiped
/// when the credentials are dropped, and it never appears in debug output.
#[derive(Clone)]
pub struct Credentials {
    user: String,
    password: Zeroizing<String>,
    database: Option<String>,
}

impl Credentials {
    /// Create credentials for the given account.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Zeroizing::new(password.into()),
            database: None,
        }
    }

    /// Select a default database to use after authentication.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// The account user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The default database, if one was selected.
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Whether the account has no password set.
    #[must_use]
    pub fn password_is_empty(&self) -> bool {
        self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose sensitive data in debug output
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let creds = Credentials::new("app", "secret").with_database("inventory");
        assert_eq!(creds.user(), "app");
        assert_eq!(creds.password(), "secret");
        assert_eq!(creds.database(), Some("inventory"));
        assert!(!creds.password_is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("app", "secret");
        let output = format!("{creds:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("secret"));
    }

    #[test]
    fn test_empty_password() {
        let creds = Credentials::new("app", "");
        assert!(creds.password_is_empty());
        assert_eq!(creds.database(), None);
    }
}
