//! Trace query adapter.
//!
//! [`CallsQuery`] resolves op names and filters into one `CallsFilter`, then
//! [`CallsIter`] pages through `calls_query` lazily: a page is only requested
//! when the consumer pulls past the buffered records, so stopping early stops
//! pagination.

use crate::cache::{CacheKey, QueryCache};
use crate::client::Client;
use crate::ops::Op;
use crate::{Error, Result};
use mods_engine::Calls;
use mods_types::{
    Call, CallSchema, CallsFilter, CallsQueryReq, RefKind, SortBy, TraceStore, is_ref,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Progress callback; receives the running total of records fetched.
pub type ProgressFn<'a> = Box<dyn FnMut(usize) + 'a>;

/// Which ops a call query is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OpSelector {
    /// No op restriction.
    #[default]
    All,
    /// Bare names get `:*` and the project prefix; reference URIs pass through.
    Names(Vec<String>),
    /// Exact op versions.
    Ops(Vec<Op>),
}

impl OpSelector {
    /// Fully qualified op reference URIs, or `None` for no restriction.
    fn resolve(&self, client: &Client) -> Option<Vec<String>> {
        let uris: Vec<String> = match self {
            OpSelector::All => return None,
            OpSelector::Names(names) => names
                .iter()
                .map(|name| {
                    if is_ref(name) {
                        name.clone()
                    } else {
                        client.to_ref(name, RefKind::Op)
                    }
                })
                .collect(),
            OpSelector::Ops(ops) => ops.iter().map(Op::uri).collect(),
        };
        if uris.is_empty() { None } else { Some(uris) }
    }
}

impl From<&str> for OpSelector {
    fn from(name: &str) -> Self {
        OpSelector::Names(vec![name.to_string()])
    }
}

impl From<String> for OpSelector {
    fn from(name: String) -> Self {
        OpSelector::Names(vec![name])
    }
}

impl From<Vec<String>> for OpSelector {
    fn from(names: Vec<String>) -> Self {
        OpSelector::Names(names)
    }
}

impl From<Vec<&str>> for OpSelector {
    fn from(names: Vec<&str>) -> Self {
        OpSelector::Names(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Op> for OpSelector {
    fn from(op: Op) -> Self {
        OpSelector::Ops(vec![op])
    }
}

impl From<Vec<Op>> for OpSelector {
    fn from(ops: Vec<Op>) -> Self {
        OpSelector::Ops(ops)
    }
}

impl From<&[Op]> for OpSelector {
    fn from(ops: &[Op]) -> Self {
        OpSelector::Ops(ops.to_vec())
    }
}

/// Builder for one call query.
///
/// # Example
/// ```no_run
/// # use mods_sdk::Client;
/// # fn run(client: &Client) -> mods_sdk::Result<()> {
/// let calls = client
///     .calls()
///     .op("predict")
///     .trace_roots_only(true)
///     .limit(500)
///     .on_progress(|n| eprintln!("fetched {}", n))
///     .fetch()?;
/// println!("{}", calls);
/// # Ok(())
/// # }
/// ```
pub struct CallsQuery<'a> {
    client: &'a Client,
    op: OpSelector,
    input_refs: Option<Vec<String>>,
    filter: Option<CallsFilter>,
    trace_roots_only: Option<bool>,
    limit: Option<usize>,
    columns: Option<Vec<String>>,
    sort_by: Option<Vec<SortBy>>,
    on_progress: Option<ProgressFn<'a>>,
}

/// Normalized parameters that identify a query for caching.
#[derive(Serialize)]
struct QueryParams<'p> {
    filter: &'p CallsFilter,
    limit: usize,
    columns: &'p Option<Vec<String>>,
    sort_by: &'p Option<Vec<SortBy>>,
    usage_prefix: &'p str,
    usage_aggregation: mods_engine::UsageAggregation,
}

impl<'a> CallsQuery<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            op: OpSelector::All,
            input_refs: None,
            filter: None,
            trace_roots_only: None,
            limit: None,
            columns: None,
            sort_by: None,
            on_progress: None,
        }
    }

    pub fn op(mut self, op: impl Into<OpSelector>) -> Self {
        self.op = op.into();
        self
    }

    pub fn input_ref(mut self, uri: impl Into<String>) -> Self {
        self.input_refs.get_or_insert_with(Vec::new).push(uri.into());
        self
    }

    pub fn input_refs<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_refs
            .get_or_insert_with(Vec::new)
            .extend(uris.into_iter().map(Into::into));
        self
    }

    /// Explicit filter; when set, `op`, `input_refs` and `trace_roots_only` are ignored.
    pub fn filter(mut self, filter: CallsFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn trace_roots_only(mut self, roots_only: bool) -> Self {
        self.trace_roots_only = Some(roots_only);
        self
    }

    /// Hard cap on returned rows (defaults to `Config::default_limit`).
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restrict the fields the store returns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort_by(mut self, sort_by: Vec<SortBy>) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(usize) + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(self.client.config().default_limit)
    }

    /// The filter actually sent to the store.
    pub fn build_filter(&self) -> CallsFilter {
        if let Some(filter) = &self.filter {
            if self.op != OpSelector::All
                || self.input_refs.is_some()
                || self.trace_roots_only.is_some()
            {
                tracing::debug!(
                    "explicit calls filter given; ignoring op, input_refs and trace_roots_only"
                );
            }
            return filter.clone();
        }

        CallsFilter {
            op_names: self.op.resolve(self.client),
            input_refs: self.input_refs.clone().filter(|refs| !refs.is_empty()),
            trace_roots_only: self.trace_roots_only,
            ..CallsFilter::default()
        }
    }

    /// Lazy record iterator; no request is made until the first pull.
    pub fn iter(self) -> Result<CallsIter<'a>> {
        let config = self.client.config();
        config.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;

        let limit = self.effective_limit();
        let template = CallsQueryReq {
            project_id: self.client.project_id().to_string(),
            filter: self.build_filter(),
            offset: 0,
            limit: None,
            columns: self.columns,
            sort_by: self.sort_by,
        };
        Ok(CallsIter::new(
            Arc::clone(self.client.store()),
            template,
            config.page_size,
            limit,
            self.on_progress,
        ))
    }

    /// Fetch every page (up to the limit) and normalize into a `Calls` table.
    pub fn fetch(self) -> Result<Calls> {
        let options = self.client.normalize_options();
        let calls = self.iter()?.collect::<Result<Vec<Call>>>()?;
        Ok(Calls::from_calls(&calls, &options)?)
    }

    /// Key identifying this query in a [`QueryCache`].
    pub fn cache_key(&self) -> Result<CacheKey> {
        let options = self.client.normalize_options();
        let filter = self.build_filter();
        let params = QueryParams {
            filter: &filter,
            limit: self.effective_limit(),
            columns: &self.columns,
            sort_by: &self.sort_by,
            usage_prefix: &options.usage_prefix,
            usage_aggregation: options.usage_aggregation,
        };
        CacheKey::new("calls", self.client.project_id(), &params)
    }

    /// [`fetch`](Self::fetch) through `cache`; the progress callback only fires on a miss.
    pub fn fetch_cached(self, cache: &QueryCache) -> Result<Calls> {
        let key = self.cache_key()?;
        cache.get_or_compute(&key, || self.fetch())
    }
}

/// Pull-based pager over `calls_query`.
///
/// Yields at most `limit` calls. A backend error is yielded once, after which
/// the iterator is exhausted.
pub struct CallsIter<'a> {
    store: Arc<dyn TraceStore>,
    template: CallsQueryReq,
    page_size: usize,
    limit: usize,
    fetched: usize,
    buffer: VecDeque<CallSchema>,
    exhausted: bool,
    on_progress: Option<ProgressFn<'a>>,
}

impl<'a> CallsIter<'a> {
    pub(crate) fn new(
        store: Arc<dyn TraceStore>,
        template: CallsQueryReq,
        page_size: usize,
        limit: usize,
        on_progress: Option<ProgressFn<'a>>,
    ) -> Self {
        Self {
            store,
            template,
            page_size: page_size.max(1),
            limit,
            fetched: 0,
            buffer: VecDeque::new(),
            exhausted: limit == 0,
            on_progress,
        }
    }

    /// Records fetched from the store so far.
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// The `n`-th call (0-based), pulling pages only as far as needed.
    pub fn nth_call(&mut self, n: usize) -> Result<Call> {
        for (i, call) in self.by_ref().enumerate() {
            let call = call?;
            if i == n {
                return Ok(call);
            }
        }
        Err(Error::InvalidInput(format!("Index {} out of range", n)))
    }

    fn fetch_page(&mut self) -> Result<()> {
        let req = CallsQueryReq {
            offset: self.fetched,
            limit: Some(self.page_size),
            ..self.template.clone()
        };
        let mut page = self.store.calls_query(&req)?.calls;

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        let remaining = self.limit - self.fetched;
        if page.len() >= remaining {
            page.truncate(remaining);
            self.exhausted = true;
        }

        self.fetched += page.len();
        tracing::debug!(
            offset = req.offset,
            page_len = page.len(),
            total = self.fetched,
            "fetched calls page"
        );
        if let Some(callback) = self.on_progress.as_mut() {
            callback(self.fetched);
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for CallsIter<'_> {
    type Item = Result<Call>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(schema) = self.buffer.pop_front() {
                return Some(Call::from_schema(schema).map_err(Error::from));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}

impl Client {
    /// Shorthand for `self.calls().op(op).fetch()`.
    pub fn get_calls(&self, op: impl Into<OpSelector>) -> Result<Calls> {
        self.calls().op(op).fetch()
    }
}
