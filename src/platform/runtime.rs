use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Platform-independent helper to spawn an async task that runs in the background.
#[cfg(target_arch = "wasm32")]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Platform-independent helper to spawn an async task that runs in the background.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    use std::sync::LazyLock;
    use tokio::runtime::{Builder, Handle, Runtime};

    static BACKGROUND_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("monitor-background")
            .enable_all()
            .build()
            .expect("failed to build background tokio runtime")
    });

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
    } else {
        let _ = BACKGROUND_RUNTIME.spawn(future);
    }
}

/// Asynchronously waits for the provided duration in a platform-compatible way.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }

    sleep_impl(duration).await;
}

/// Gives up the current scheduling turn so the work that triggered the caller settles first.
pub async fn yield_now() {
    yield_impl().await;
}

/// Returned by [`with_timeout`] when the deadline elapses before the future completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutElapsed;

impl fmt::Display for TimeoutElapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation timed out")
    }
}

impl std::error::Error for TimeoutElapsed {}

/// Runs `future` to completion unless `timeout` elapses first.
pub async fn with_timeout<F>(future: F, timeout: Duration) -> Result<F::Output, TimeoutElapsed>
where
    F: Future,
{
    timeout_impl(future, timeout).await
}

#[cfg(target_arch = "wasm32")]
async fn sleep_impl(duration: Duration) {
    use gloo_timers::future::sleep;
    sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_impl(duration: Duration) {
    use tokio::time::sleep;
    sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
async fn yield_impl() {
    // setTimeout(0) defers past the current event dispatch.
    gloo_timers::future::TimeoutFuture::new(0).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn yield_impl() {
    tokio::task::yield_now().await;
}

#[cfg(target_arch = "wasm32")]
async fn timeout_impl<F>(future: F, timeout: Duration) -> Result<F::Output, TimeoutElapsed>
where
    F: Future,
{
    use futures::future::{select, Either};

    let work = Box::pin(future);
    let deadline = Box::pin(sleep_impl(timeout));
    match select(work, deadline).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(_) => Err(TimeoutElapsed),
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn timeout_impl<F>(future: F, timeout: Duration) -> Result<F::Output, TimeoutElapsed>
where
    F: Future,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| TimeoutElapsed)
}
