//! Response Validation
//!
//! JSON extraction/repair for untrusted completion output.

mod json_repair;

pub use json_repair::extract_json_from_response;
