//! Completion-handler adapter.
//!
//! Every client call is a future. Hosts that want node-style completion
//! handlers wrap the future with [`deliver`]; the handler runs exactly once,
//! with the success value or the error.

use std::future::Future;

pub async fn deliver<T, E>(fut: impl Future<Output = Result<T, E>>, handler: impl FnOnce(Result<T, E>)) {
    handler(fut.await)
}

/// `(err, result)` pair in the order a node-style callback takes them.
pub fn split<T, E>(result: Result<T, E>) -> (Option<E>, Option<T>) {
    match result {
        Ok(value) => (None, Some(value)),
        Err(err) => (Some(err), None),
    }
}
