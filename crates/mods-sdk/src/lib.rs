//! mods-sdk: query adapters over a trace store.
//!
//! # Overview
//!
//! `mods-sdk` turns the records of a trace store (logged calls, versioned ops
//! and data objects, reference URIs) into flat tables that dashboards and
//! scripts can consume directly. Every adapter goes through an explicit
//! [`Client`], which wraps one [`TraceStore`] handle and a [`Config`].
//!
//! # Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use mods_sdk::{Client, ColumnType, TraceStore};
//!
//! # fn run(store: Arc<dyn TraceStore>) -> mods_sdk::Result<()> {
//! let client = Client::new(store);
//!
//! // All versions of the "predict" op, newest first, at most 1000 rows
//! let calls = client
//!     .calls()
//!     .op("predict")
//!     .sort_by(vec![mods_sdk::SortBy::desc("started_at")])
//!     .limit(1000)
//!     .fetch()?;
//! for column in calls.columns(Some(&[ColumnType::Int, ColumnType::Float])) {
//!     println!("{}: {}", column.name, column.dtype);
//! }
//!
//! // Resolve the datasets those calls read, one batch request
//! let refs: Vec<String> = calls
//!     .table()
//!     .column("inputs.dataset")
//!     .into_iter()
//!     .flatten()
//!     .filter_map(|v| v.as_str().map(str::to_string))
//!     .collect();
//! let datasets = client.resolve_refs(&refs)?;
//! println!("{} rows", datasets.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Adapters
//!
//! - [`CallsQuery`] / [`CallsIter`]: paginated call queries. Pages are pulled
//!   lazily, the row limit is a hard cap, and results normalize into
//!   [`Calls`] with `op_name` components and merged usage columns.
//! - [`Client::get_ops`], [`Client::get_op_versions`], [`Client::get_objs`]:
//!   object listings, always deduplicated to the latest version client-side
//!   when `latest_only` is requested.
//! - [`Client::resolve_refs`]: batch reference resolution into a [`Table`]
//!   indexed by the input refs.
//! - [`QueryCache`]: optional result cache with memory or disk storage.
//!
//! # Architecture
//!
//! This SDK is a facade over:
//! - `mods-types`: records, filters, reference URIs, and the `TraceStore` seam
//! - `mods-engine`: table flattening, dtype detection, usage merging

pub mod cache;
pub mod calls;
pub mod client;
pub mod config;
pub mod error;
mod latest;
pub mod objs;
pub mod ops;
pub mod refs;

pub use cache::{CacheKey, CacheStore, DiskCache, MemoryCache, QueryCache};
pub use calls::{CallsIter, CallsQuery, OpSelector, ProgressFn};
pub use client::Client;
pub use config::{CacheBackend, CacheConfig, Config, resolve_data_dir};
pub use error::{Error, Result};
pub use objs::Obj;
pub use ops::Op;
pub use refs::simple_val;

// Re-export the types callers need alongside the adapters
pub use mods_engine::{Calls, Column, ColumnType, Table, UsageAggregation};
pub use mods_types::{
    Call, CallsFilter, ObjectRef, RefKind, SortBy, SortDirection, TraceStore, nice_ref,
};
