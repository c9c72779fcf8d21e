//! # Order fulfillment gateway server
//! This crate hosts the HTTP surface of the order fulfillment gateway. It is responsible for:
//! Listening for incoming webhook requests from the storefront, the payment processor and fulfillment vendors.
//! Verifying webhook signatures before any payload is interpreted.
//! Handing the parsed payloads to the fulfillment engine, and translating engine outcomes into HTTP responses.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/checkout`: New orders from the storefront.
//! * `/webhook/payment`: Payment status events from the payment processor (HMAC-signed).
//! * `/webhook/vendor`: Fulfillment progress notifications from vendors (HMAC-signed).
//! * `/api/orders/...`: Admin-keyed order queries and manual status overrides.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod middleware;
pub mod review_worker;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
