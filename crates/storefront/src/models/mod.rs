//! Domain models for the storefront.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem};
pub use product::{Category, Product, ProductDetail};
pub use session::{CurrentUser, keys};
