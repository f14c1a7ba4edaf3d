//! Request handler module
//!
//! Routes each request to a fixed data response or a mounted directory.

pub mod router;

pub use router::{handle_request, respond};
