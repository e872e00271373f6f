//! API Module
//!
//! HTTP handlers and routing for the demo server.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `POST /refresh/:key` - Extend a sliding expiration
//! - `DELETE /del/:key` - Delete a key
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
