//! Test support: an in-process fake of the remote service and the
//! end-to-end scenarios that run the catalogue against it.

mod fake_server;
mod scenarios;

pub use fake_server::{FakeServer, SEED_EMAIL, SEED_ID, SEED_PASSWORD};
