// quotagate - Quota-enforcing, response-caching gateway for LLM chat APIs
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod quota;
pub mod server;
pub mod utils;
