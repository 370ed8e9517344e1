use uuid::Uuid;

use crate::auth::config::OwnershipMode;
use crate::auth::guards::AuthUser;
use crate::auth::{AuthError, AuthResult};

/// Owning identity of a resource, as stored alongside it.
#[derive(Debug, Clone, Copy)]
pub struct ResourceOwner<'a> {
    pub id: Uuid,
    pub email: &'a str,
}

/// Reject the operation unless `caller` owns the resource.
///
/// Comparison uses the owner's email in the primary configuration and the
/// stable id in the alternate mode; both keys are immutable once assigned.
pub fn assert_owner(
    owner: ResourceOwner<'_>,
    caller: &AuthUser,
    mode: OwnershipMode,
    denial: &str,
) -> AuthResult<()> {
    let owned = match mode {
        OwnershipMode::Email => owner.email == caller.email,
        OwnershipMode::Id => owner.id == caller.id,
    };

    if owned {
        Ok(())
    } else {
        Err(AuthError::Forbidden(denial.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: Uuid, email: &str) -> AuthUser {
        AuthUser {
            id,
            email: email.to_string(),
        }
    }

    #[test]
    fn owner_passes_in_both_modes() {
        let id = Uuid::new_v4();
        let user = caller(id, "a@x.com");
        let owner = ResourceOwner {
            id,
            email: "a@x.com",
        };

        assert!(assert_owner(owner, &user, OwnershipMode::Email, "denied").is_ok());
        assert!(assert_owner(owner, &user, OwnershipMode::Id, "denied").is_ok());
    }

    #[test]
    fn foreign_caller_is_forbidden() {
        let user = caller(Uuid::new_v4(), "a@x.com");
        let owner = ResourceOwner {
            id: Uuid::new_v4(),
            email: "b@x.com",
        };

        let err = assert_owner(owner, &user, OwnershipMode::Email, "not yours").unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
        assert_eq!(err.to_string(), "not yours");
    }

    #[test]
    fn modes_compare_different_keys() {
        let id = Uuid::new_v4();
        // Same email, different id: email mode allows, id mode rejects.
        let user = caller(Uuid::new_v4(), "a@x.com");
        let owner = ResourceOwner {
            id,
            email: "a@x.com",
        };

        assert!(assert_owner(owner, &user, OwnershipMode::Email, "denied").is_ok());
        assert!(assert_owner(owner, &user, OwnershipMode::Id, "denied").is_err());
    }
}
