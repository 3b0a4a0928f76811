#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "Ownership-scoped todo lists: the stores, the access-control layer that keeps"]
#![doc = "them consistent, authentication, routing configuration and error handling."]
#![doc = "The binary (`main.rs`) wires these together into an HTTP server."]

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use access::AccessControl;
pub use error::AppError;
