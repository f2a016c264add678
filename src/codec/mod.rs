//! Byte-level and textual encodings used to move records to and from wire
//! form.

pub mod escape;
pub mod text;
