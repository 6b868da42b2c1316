mod cache;
mod calls_pagination;
mod calls_query;
mod objects;
mod refs;

use mods_sdk::{Client, Config};
use mods_testing::StubStore;
use std::sync::Arc;

/// Client over `store` with a small page size so tests cross page boundaries.
pub fn client_with_pages(store: &Arc<StubStore>, page_size: usize) -> Client {
    let config = Config {
        page_size,
        ..Config::default()
    };
    Client::new(Arc::clone(store) as Arc<dyn mods_sdk::TraceStore>).with_config(config)
}
