pub mod local;

pub use local::{LocalImageStore, ALLOWED_EXTENSIONS, MAX_IMAGE_BYTES};
