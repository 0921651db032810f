#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Network adapter exposing a running session over newline-delimited JSON.

pub mod arena;
pub mod cli;
pub mod protocol;

mod connection;

pub use connection::{handle_connection, serve};
