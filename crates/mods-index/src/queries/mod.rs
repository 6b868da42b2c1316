pub mod calls;
pub mod objects;
pub mod refs;
