// Fixed-window request quota module
// Author: kelexine (https://github.com/kelexine)

pub mod counter;
pub mod models;

pub use counter::{FileQuotaCounter, QuotaCounter};
pub use models::{QuotaPolicy, QuotaWindow};
