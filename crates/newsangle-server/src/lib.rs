// Library root: re-exports the HTTP layer so integration tests can build
// the router without starting the binary.

pub mod api;
pub mod error;
pub mod ui;
