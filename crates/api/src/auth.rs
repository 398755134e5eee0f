// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Actor identity for audit attribution.
//!
//! Session management belongs to the surrounding back office. Requests name
//! the acting user and this module only checks that a name was given.

use manifest_guard_audit::Actor;

use crate::error::AuthError;

/// The back-office user a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The user's identifier in the back office.
    pub id: String,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self { id }
    }

    /// Converts this actor into the identity recorded on audit entries.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::user(&self.id)
    }
}

/// Stub authentication.
///
/// Accepts any non-blank actor id. Credentials are verified upstream before
/// a request reaches this service.
///
/// # Errors
///
/// Returns an error if the actor id is blank.
pub fn authenticate_stub(actor_id: &str) -> Result<AuthenticatedActor, AuthError> {
    let actor_id: &str = actor_id.trim();
    if actor_id.is_empty() {
        return Err(AuthError::AuthenticationFailed {
            reason: String::from("Actor ID cannot be empty"),
        });
    }
    Ok(AuthenticatedActor::new(actor_id.to_string()))
}
