//! HTTP server: route table, handlers and the `ServerBuilder`

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
