// SPDX-License-Identifier: MPL-2.0

//! Shared async runtime for all network operations.
//!
//! The verification pipeline is synchronous towards its caller; the social and
//! classification clients are async, so every call funnels through this runtime.

use once_cell::sync::Lazy;
use std::future::Future;
use tokio::runtime::Runtime;

/// Two workers are plenty for one in-flight request at a time.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("knowyourfan-async")
        .build()
        .expect("failed to create async runtime")
});

/// Execute a future on the shared runtime, blocking until completion.
/// Must not be called from inside an async context.
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}
