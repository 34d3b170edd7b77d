// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

pub(crate) use std::sync::Arc;

// Synchronous lock for state that is never held across an await point.
pub(crate) use parking_lot::Mutex;

// Tokio Mutex - needed when the guard is held across an await point.
pub(crate) use tokio::sync::Mutex as TokioMutex;

// A call to this function will compile only if T is Send + Sync.
#[cfg(test)]
pub fn is_sync_send<T: Send + Sync>() {}

#[test]
fn test_is_sync_send() {
  is_sync_send::<Mutex<u32>>();
  is_sync_send::<TokioMutex<u32>>();
  is_sync_send::<Arc<TokioMutex<Vec<String>>>>();
}
