//! Service layer
//!
//! Contains the object store adapter used by the HTTP handlers.

mod gateway;
mod mime;

pub use gateway::{ObjectGateway, UploadedObject};
pub use mime::content_type_for;
