//! Provider-agnostic request and response models.
//!
//! - `request`: the normalized chat request every provider accepts.
//! - `response`: the provider's normalized completion and the decorated
//!   response handed back to gateway callers.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod request;
pub mod response;

pub use request::{ChatMessage, ChatRequest, Role};
pub use response::{ChatResponse, Completion};
