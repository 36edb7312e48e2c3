//! Capability checks
//!
//! Services never inspect the actor's permissions directly; they ask the
//! injected `Authorizer`, so tests can substitute their own policy.

use crate::{
    error::{AppError, AppResult},
    models::{Actor, Capability},
};

#[cfg_attr(test, mockall::automock)]
pub trait Authorizer: Send + Sync {
    fn has_capability(&self, actor: &Actor, capability: Capability) -> bool;
}

/// Grants exactly the capabilities carried by the actor's token
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenAuthorizer;

impl Authorizer for TokenAuthorizer {
    fn has_capability(&self, actor: &Actor, capability: Capability) -> bool {
        actor.holds(capability)
    }
}

/// Fail with `Unauthorized` unless `actor` holds `capability`
pub fn require(authorizer: &dyn Authorizer, actor: &Actor, capability: Capability) -> AppResult<()> {
    if authorizer.has_capability(actor, capability) {
        Ok(())
    } else {
        tracing::warn!(
            "User {} ({}) denied: missing {}",
            actor.username,
            actor.user_id,
            capability
        );
        Err(AppError::Unauthorized(format!("Missing permission {}", capability)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_authorizer_follows_claims() {
        let actor = Actor::new(3, "librarian", vec![Capability::MarkReturned]);
        assert!(require(&TokenAuthorizer, &actor, Capability::MarkReturned).is_ok());

        let err = require(&TokenAuthorizer, &actor, Capability::DeleteBook).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_require_consults_the_authorizer() {
        let mut authorizer = MockAuthorizer::new();
        authorizer
            .expect_has_capability()
            .withf(|_, cap| *cap == Capability::AddGenre)
            .times(1)
            .return_const(true);

        let nobody = Actor::new(9, "nobody", vec![]);
        assert!(require(&authorizer, &nobody, Capability::AddGenre).is_ok());
    }
}
