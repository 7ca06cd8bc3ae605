//! Request-scoped identity and access policies
//!
//! Authentication happens upstream of this service. Each request carries the
//! already-verified identity explicitly in headers, and handlers receive it as
//! an [`AuthContext`] extractor argument:
//!
//! - `x-user-id`: the caller's user id (UUID)
//! - `x-user-role`: optional, `admin` grants the administrative capability
//!
//! There is no process-wide token or session state.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::core::error::BookstoreError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const ADMIN_ROLE: &str = "admin";

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated customer
    User { user_id: Uuid, roles: Vec<String> },

    /// Store administrator
    Admin { admin_id: Uuid },

    /// No identity supplied (public access)
    Anonymous,
}

impl AuthContext {
    /// Check if context represents an admin
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthContext::Admin { .. })
    }

    /// Get the acting user id if available
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Admin { admin_id } => Some(*admin_id),
            AuthContext::Anonymous => None,
        }
    }

    /// Enforce [`AuthPolicy::Authenticated`] and return the acting user id
    pub fn require_user(&self) -> Result<Uuid, BookstoreError> {
        self.require(AuthPolicy::Authenticated)?;
        self.user_id()
            .ok_or_else(|| BookstoreError::Unauthorized("Authentication required".to_string()))
    }

    /// Enforce `policy` for this caller
    pub fn require(&self, policy: AuthPolicy) -> Result<(), BookstoreError> {
        if policy.check(self) {
            return Ok(());
        }
        match self {
            AuthContext::Anonymous => Err(BookstoreError::Unauthorized(
                "Authentication required".to_string(),
            )),
            _ => Err(BookstoreError::Forbidden(
                "Administrator access required".to_string(),
            )),
        }
    }
}

/// Authorization policy for an operation
///
/// Public routes take no [`AuthContext`] at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Any authenticated caller
    Authenticated,

    /// Admin only
    AdminOnly,
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Authenticated => !matches!(context, AuthContext::Anonymous),
            AuthPolicy::AdminOnly => context.is_admin(),
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = BookstoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw_id) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(AuthContext::Anonymous);
        };

        let user_id = raw_id
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| {
                BookstoreError::Unauthorized(format!("Invalid {} header", USER_ID_HEADER))
            })?;

        let roles: Vec<String> = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|r| r.trim().to_lowercase())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if roles.iter().any(|r| r == ADMIN_ROLE) {
            Ok(AuthContext::Admin { admin_id: user_id })
        } else {
            Ok(AuthContext::User { user_id, roles })
        }
    }
}
