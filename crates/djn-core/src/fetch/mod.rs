// ── Fetch adapters ──
//
// The per-kind step that produces a fresh list of records. Everything
// else about a refresh (single-flight, caching, fan-out) is shared and
// lives in `refresh`.

pub mod gateway;
pub mod spoof;

use std::future::Future;

use futures_util::future::BoxFuture;
use thiserror::Error;

/// Why a single fetch attempt failed. Always recoverable: the previous
/// snapshot stays published and the next tick tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not connected to the Cluster Gateway")]
    NotConnected,

    #[error(transparent)]
    Api(#[from] djn_api::Error),

    #[error("{message}")]
    Failed { message: String },
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Produces the complete current list of one resource kind.
pub trait Fetcher<T>: Send + Sync + 'static {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<T>, FetchError>>;
}

/// A [`Fetcher`] backed by an async closure.
pub struct FnFetcher<F>(F);

/// Wrap an async closure as a [`Fetcher`].
pub fn fetch_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher(f)
}

impl<T, F, Fut> Fetcher<T> for FnFetcher<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
{
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<T>, FetchError>> {
        Box::pin((self.0)())
    }
}
