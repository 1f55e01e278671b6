//! Session-aware calls against the WebAPI

mod client;
mod query;

pub use client::SessionClient;
pub use query::{merge_field_keys, rows_to_objects, BillQuery};
