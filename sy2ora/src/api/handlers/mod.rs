//! HTTP request handlers.
//!
//! - [`conversions`]: multipart batch upload and conversion

pub mod conversions;
