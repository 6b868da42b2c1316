pub mod call;
pub mod error;
pub mod filter;
pub mod object;
pub mod reference;
pub mod store;

pub use call::{Call, CallSchema, extract_refs, extract_value_refs};
pub use error::{Error, Result};
pub use filter::{CallsFilter, ObjectVersionFilter, SortBy, SortDirection};
pub use object::ObjSchema;
pub use reference::{
    ObjectRef, OpNameParts, REF_PREFIX, REF_SCHEME, RefKind, is_ref, nice_ref, parse_uri,
    split_op_name, split_project_id,
};
pub use store::{
    CallsQueryReq, CallsQueryRes, ObjQueryReq, ObjQueryRes, RefsReadBatchReq, RefsReadBatchRes,
    TraceStore,
};
