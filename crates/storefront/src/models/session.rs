//! Session-related types.
//!
//! The session is the only ambient state at the HTTP boundary; handlers map
//! it to explicit arguments before calling into services.

use serde::{Deserialize, Serialize};

use verdant_core::UserId;

/// Session-stored user identity.
///
/// Written by the external authentication collaborator; its absence means
/// guest checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the opaque cart token.
    pub const CART_TOKEN: &str = "cart_token";
}
