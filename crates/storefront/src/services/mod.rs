//! Business logic services.
//!
//! Services sit between the HTTP boundary and the repositories. They take
//! the cart token and user identity as explicit arguments; only the boundary
//! knows about sessions and cookies.

pub mod cart;
pub mod catalog;
pub mod checkout;

pub use cart::{CartError, CartService};
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, CheckoutOutcome, CheckoutService};
