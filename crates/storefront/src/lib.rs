//! Verdant storefront library.
//!
//! The storefront backend as a library, so the HTTP surface and the services
//! beneath it can be exercised from integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
