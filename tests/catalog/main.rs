//! catalog integration tests.

mod coordination;
mod pagination;

#[cfg(feature = "http")]
mod http;
