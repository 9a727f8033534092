//! Cancellation helper shared by the chat and quiz flows.

use tokio_util::sync::CancellationToken;

use academaide_core::error::{Error, Result};

/// Race `work` against the caller's cancellation. An already cancelled
/// token wins without polling `work`.
pub(crate) async fn cancellable<T>(cancel: &CancellationToken, work: impl Future<Output = T>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        value = work => Ok(value),
    }
}
