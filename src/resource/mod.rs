//! Resource module
//!
//! Everything that maps a request path below a mount onto the filesystem and
//! renders the result.

pub mod data;
pub mod file;
pub mod listing;
pub mod path;
pub mod processor;
pub mod root;
pub mod target;

pub use data::StaticData;
pub use file::FileResource;
pub use listing::{DirectoryEntry, DirectoryLister};
pub use path::{is_insecure, resolve_segment, traverse, FileNode, Resolution};
pub use processor::{ProcessorKind, ProcessorRegistry};
pub use root::ServingRoot;
pub use target::ResolvedTarget;

use hyper::http::request::Parts;
use hyper::Response;
use std::sync::Arc;

use crate::error::ServeError;
use crate::http::body::ServeBody;
use crate::http::response::build_404_response;

/// Resolve `segments` below `root` and render whatever they name
pub async fn serve_path(
    root: Arc<ServingRoot>,
    segments: &[String],
    req: &Parts,
) -> Result<Response<ServeBody>, ServeError> {
    match traverse(root, segments).await {
        Resolution::Node(node) => FileResource::new(node).render(req).await,
        Resolution::Listing(node) => Ok(DirectoryLister::new(node).render(req).await),
        Resolution::Processor {
            kind: ProcessorKind::Asis,
            node,
        } => processor::render_asis(node.path(), req).await,
        Resolution::Processor {
            kind: kind @ ProcessorKind::Source,
            node,
        } => {
            FileResource::new(node)
                .with_media(kind.media_override())
                .render(req)
                .await
        }
        Resolution::NotFound | Resolution::Insecure => Ok(build_404_response()),
    }
}
