//! Turns trace-store records into flat tables.
//!
//! Nested call records are flattened into dotted-key columns, the `op_name`
//! reference is split into its components, and per-model usage columns are
//! merged into one column per metric.

pub mod calls;
pub mod dtype;
pub mod error;
pub mod normalize;
pub mod table;
pub mod usage;

pub use calls::{Calls, Column};
pub use dtype::{ColumnType, detect_dtype, friendly_dtypes};
pub use error::{Error, Result};
pub use normalize::{NormalizeOptions, OP_NAME_COLUMN, normalize_calls, split_ref_column};
pub use table::{KEY_SEPARATOR, SCALAR_COLUMN, Table};
pub use usage::{DEFAULT_USAGE_PREFIX, UsageAggregation, merge_usage_columns};
