//! Quota-and-cache middleware wrapped around a provider call.
//!
//! [`GatewayMiddleware::handle`] runs every request through the same steps:
//! quota gate, cache lookup, upstream call, cache write, quota consume.
//! Cache hits never consume quota; an identifier over its quota cannot read
//! the cache either.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod middleware;

pub use middleware::GatewayMiddleware;
