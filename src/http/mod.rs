//! HTTP protocol layer module
//!
//! Range header parsing, the byte-range LRU cache, and response builders,
//! decoupled from request routing and server lifecycle.

pub mod cache;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use cache::RangeCache;
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use response::ResponseBody;
