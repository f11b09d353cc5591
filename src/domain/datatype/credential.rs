use serde::{Deserialize, Serialize};

/// Opaque account credential.
///
/// Stored exactly as supplied; hashing policy belongs to the authentication
/// collaborator, not to this service. The `Debug` output is redacted so the
/// value never lands in request logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Password {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl<'a> From<&'a str> for Password {
    fn from(secret: &'a str) -> Self {
        Self::new(secret.into())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Password;

    #[test]
    fn debug_output_is_redacted() {
        let pwd = Password::from("hunter2");
        assert_eq!(format!("{pwd:?}"), "Password(***)");
    }

    #[test]
    fn credential_is_kept_verbatim() {
        let pwd = Password::from("s3cure:12345678");
        assert_eq!(pwd.expose(), "s3cure:12345678");
    }
}
