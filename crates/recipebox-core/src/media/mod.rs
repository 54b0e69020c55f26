//! Media domain module: image payloads and the blob store they go to.

mod model;
mod store;

pub use model::{MediaAsset, ObjectHandle, UploadedMedia, object_path, sanitize_file_name};
pub use store::BlobStore;
