pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{MockTransport, LOCAL_PUBKEY, REMOTE_PUBKEY};
#[allow(unused_imports)]
pub use setup::{eventually, Recorder, RoomSetup, RoomSetupBuilder, KIND, SECRET};
