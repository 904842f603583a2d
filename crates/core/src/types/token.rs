//! Opaque cart handle.
//!
//! A [`CartToken`] identifies a shopping cart across requests. It is the only
//! client-visible cart identity: a random UUIDv4, so tokens are unguessable
//! and carry no meaning beyond uniqueness. The HTTP boundary persists the
//! token in the session; every service takes it as an explicit parameter.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error parsing a cart token from its string form.
#[derive(Debug, thiserror::Error)]
#[error("invalid cart token: {0}")]
pub struct CartTokenError(#[from] uuid::Error);

/// Opaque handle identifying a shopping cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartToken(Uuid);

impl CartToken {
    /// Generate a fresh, unguessable token for a new cart.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse a token from its canonical string form.
    ///
    /// # Errors
    ///
    /// Returns `CartTokenError` if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, CartTokenError> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for CartToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CartToken {
    type Err = CartTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "sqlite")]
impl sqlx::Type<sqlx::Sqlite> for CartToken {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <&str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

#[cfg(feature = "sqlite")]
impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for CartToken {
    fn decode(
        value: sqlx::sqlite::SqliteValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<'r, sqlx::Sqlite>>::decode(value)?;
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(feature = "sqlite")]
impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for CartToken {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<'q, sqlx::Sqlite>>::encode_by_ref(&self.0.to_string(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique() {
        assert_ne!(CartToken::generate(), CartToken::generate());
    }

    #[test]
    fn token_round_trips_through_string() {
        let token = CartToken::generate();
        let parsed: CartToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(CartToken::parse("not-a-uuid").is_err());
    }
}
