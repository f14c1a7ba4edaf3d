//! Filesystem content over HTTP.
//!
//! Maps URL path segments onto files and directories below a served root,
//! answers byte-range requests (single and multipart), honours conditional
//! GET and renders directory listings. Bodies are produced by pull-driven
//! producers, so a slow client never causes unbounded buffering.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resource;
pub mod server;
pub mod stream;

pub use error::ServeError;
