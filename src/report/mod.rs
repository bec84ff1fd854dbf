//! Feed digest rendering.

mod digest;

pub use digest::{generate_json_digest, generate_markdown_digest};
