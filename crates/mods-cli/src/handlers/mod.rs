pub mod calls;
pub mod import;
pub mod objs;
pub mod ops;
pub mod resolve;
