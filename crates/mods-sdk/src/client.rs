use crate::Config;
use crate::calls::{CallsIter, CallsQuery};
use mods_engine::NormalizeOptions;
use mods_types::{Call, CallsFilter, CallsQueryReq, REF_PREFIX, RefKind, TraceStore};
use std::sync::Arc;

/// Explicit context handed to every adapter: one store handle plus settings.
///
/// Cloning is cheap; clones share the underlying store.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn TraceStore>,
    config: Config,
}

impl Client {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self {
            store,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn TraceStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn project_id(&self) -> &str {
        self.store.project_id()
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        self.config.normalize_options()
    }

    /// `weave:///{project_id}/{kind}/{name}`, adding `:*` when `name` has no version.
    pub fn to_ref(&self, name: &str, kind: RefKind) -> String {
        let name = if name.contains(':') {
            name.to_string()
        } else {
            format!("{}:*", name)
        };
        format!("{}{}/{}/{}", REF_PREFIX, self.project_id(), kind, name)
    }

    /// Start a call query against this client's project.
    pub fn calls(&self) -> CallsQuery<'_> {
        CallsQuery::new(self)
    }

    /// Direct children of `call`, fetched lazily.
    pub fn children(&self, call: &Call) -> CallsIter<'static> {
        let template = CallsQueryReq {
            project_id: call.project_id.clone(),
            filter: CallsFilter::new().parent_ids(vec![call.id.clone()]),
            ..Default::default()
        };
        CallsIter::new(
            Arc::clone(&self.store),
            template,
            self.config.page_size,
            self.config.default_limit,
            None,
        )
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("project_id", &self.project_id())
            .field("config", &self.config)
            .finish()
    }
}
