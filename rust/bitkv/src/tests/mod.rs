mod aggregator_tests;

use std::sync::Arc;

use bitkv_store::memory_store::MemoryStore;

use crate::Bitmap;

pub(crate) fn memory_bitmap() -> (Bitmap, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let bitmap = Bitmap::new(store.clone()).unwrap();
    (bitmap, store)
}
