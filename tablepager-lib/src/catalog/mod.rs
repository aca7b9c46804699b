//! Catalog REST endpoint.
//!
//! A small hyper server that answers
//! `GET /{resource}?limit={5|10|20}&offset={n}&filterBy={json}` with
//! `{"<resource>": [...]}`. It is the data source the HTTP fetcher talks to in
//! the demo binary and in the end-to-end tests.

mod product;
mod query;
mod server;

pub use product::*;
pub use query::*;
pub use server::*;
