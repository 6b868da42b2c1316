//! Testing infrastructure for mods integration tests.
//!
//! - `StubStore`: in-process `TraceStore` that records every request it receives
//! - `fixtures`: builders for call records, usage summaries and object versions

pub mod fixtures;
pub mod stub;

pub use fixtures::{CallBuilder, PROJECT_ID, obj_uri, obj_version, op_uri};
pub use stub::StubStore;
