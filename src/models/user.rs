//! Authenticated actor and catalog capabilities
//!
//! Users are owned by the external identity provider. The catalog only sees
//! the claims carried by the bearer token: who the user is and which
//! `catalog.<codename>` permissions they hold.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Permission codenames understood by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Renew loans and see every outstanding loan
    MarkReturned,
    AddAuthor,
    ChangeAuthor,
    DeleteAuthor,
    AddBook,
    ChangeBook,
    DeleteBook,
    AddGenre,
    AddLanguage,
    AddBookInstance,
    ChangeBookInstance,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::MarkReturned => "catalog.can_mark_returned",
            Capability::AddAuthor => "catalog.add_author",
            Capability::ChangeAuthor => "catalog.change_author",
            Capability::DeleteAuthor => "catalog.delete_author",
            Capability::AddBook => "catalog.add_book",
            Capability::ChangeBook => "catalog.change_book",
            Capability::DeleteBook => "catalog.delete_book",
            Capability::AddGenre => "catalog.add_genre",
            Capability::AddLanguage => "catalog.add_language",
            Capability::AddBookInstance => "catalog.add_bookinstance",
            Capability::ChangeBookInstance => "catalog.change_bookinstance",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "catalog.can_mark_returned" => Ok(Capability::MarkReturned),
            "catalog.add_author" => Ok(Capability::AddAuthor),
            "catalog.change_author" => Ok(Capability::ChangeAuthor),
            "catalog.delete_author" => Ok(Capability::DeleteAuthor),
            "catalog.add_book" => Ok(Capability::AddBook),
            "catalog.change_book" => Ok(Capability::ChangeBook),
            "catalog.delete_book" => Ok(Capability::DeleteBook),
            "catalog.add_genre" => Ok(Capability::AddGenre),
            "catalog.add_language" => Ok(Capability::AddLanguage),
            "catalog.add_bookinstance" => Ok(Capability::AddBookInstance),
            "catalog.change_bookinstance" => Ok(Capability::ChangeBookInstance),
            _ => Err(format!("Unknown capability: {}", s)),
        }
    }
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorClaims {
    pub sub: String,
    pub user_id: i32,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl ActorClaims {
    pub fn new(user_id: i32, username: &str, permissions: &[Capability], valid_for: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: username.to_string(),
            user_id,
            is_superuser: false,
            permissions: permissions.iter().map(|c| c.as_str().to_string()).collect(),
            exp: (now + valid_for).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// The user on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub username: String,
    pub is_superuser: bool,
    pub capabilities: Vec<Capability>,
}

impl Actor {
    pub fn new(user_id: i32, username: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_superuser: false,
            capabilities,
        }
    }

    pub fn holds(&self, capability: Capability) -> bool {
        self.is_superuser || self.capabilities.contains(&capability)
    }
}

impl From<ActorClaims> for Actor {
    fn from(claims: ActorClaims) -> Self {
        let capabilities = claims
            .permissions
            .iter()
            .filter_map(|p| match p.parse::<Capability>() {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::debug!("Ignoring permission for user {}: {}", claims.user_id, e);
                    None
                }
            })
            .collect();

        Self {
            user_id: claims.user_id,
            username: claims.sub,
            is_superuser: claims.is_superuser,
            capabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_keeps_capabilities() {
        let claims = ActorClaims::new(
            12,
            "librarian",
            &[Capability::MarkReturned, Capability::AddAuthor],
            Duration::hours(1),
        );
        let token = claims.create_token("secret").unwrap();

        let actor = Actor::from(ActorClaims::from_token(&token, "secret").unwrap());
        assert_eq!(actor.user_id, 12);
        assert_eq!(actor.username, "librarian");
        assert!(actor.holds(Capability::MarkReturned));
        assert!(!actor.holds(Capability::DeleteBook));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = ActorClaims::new(1, "reader", &[], Duration::hours(1))
            .create_token("secret")
            .unwrap();
        assert!(ActorClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_unknown_permissions_are_dropped() {
        let mut claims = ActorClaims::new(1, "reader", &[Capability::AddBook], Duration::hours(1));
        claims.permissions.push("auth.add_user".to_string());
        let actor = Actor::from(claims);
        assert_eq!(actor.capabilities, vec![Capability::AddBook]);
    }

    #[test]
    fn test_superuser_holds_everything() {
        let mut actor = Actor::new(1, "admin", vec![]);
        actor.is_superuser = true;
        assert!(actor.holds(Capability::DeleteAuthor));
    }
}
