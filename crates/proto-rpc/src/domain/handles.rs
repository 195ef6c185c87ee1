//! Result handles: the settle-once channel between the engine and a caller.
//!
//! The engine only ever sees raw response bytes. The caller's deserializer
//! travels inside the handle, so parsing happens at settlement time and a
//! parse failure still settles the call (as `FailedToParse`).

use crate::codec::{decode_payload, CodecError};
use crate::domain::errors::RpcError;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

type Completer = Box<dyn FnOnce(Result<Vec<u8>, RpcError>) + Send>;

/// Engine-side half of a call's result.
///
/// Consumed on settlement, so a handle settles at most once.
pub struct ResultHandles {
    request_id: String,
    complete: Completer,
}

impl ResultHandles {
    /// Handles whose response body is decoded as `T` with the payload codec.
    pub fn typed<T>(request_id: impl Into<String>) -> (Self, PendingCall<T>)
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::with_parser(request_id, |bytes| decode_payload::<T>(bytes))
    }

    /// Handles for a notification. The body is ignored.
    pub fn for_notification(request_id: impl Into<String>) -> (Self, PendingCall<()>) {
        Self::with_parser(request_id, |_| Ok(()))
    }

    /// Handles with a caller-supplied body parser.
    pub fn with_parser<T, P>(request_id: impl Into<String>, parser: P) -> (Self, PendingCall<T>)
    where
        T: Send + 'static,
        P: FnOnce(&[u8]) -> Result<T, CodecError> + Send + 'static,
    {
        let request_id = request_id.into();
        let (sender, receiver) = oneshot::channel();

        let complete: Completer = Box::new(move |outcome: Result<Vec<u8>, RpcError>| {
            let result = outcome.and_then(|body| {
                parser(&body).map_err(|e| {
                    debug!(error = %e, "Could not parse response body");
                    RpcError::FailedToParse(e.to_string())
                })
            });
            // The caller may have dropped its PendingCall.
            let _ = sender.send(result);
        });

        let pending = PendingCall {
            request_id: request_id.clone(),
            receiver,
        };
        (
            Self {
                request_id,
                complete,
            },
            pending,
        )
    }

    /// Correlation id these handles belong to.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Settle successfully with a response body.
    pub fn resolve(self, body: Vec<u8>) {
        (self.complete)(Ok(body));
    }

    /// Settle with a failure.
    pub fn reject(self, error: RpcError) {
        (self.complete)(Err(error));
    }
}

impl fmt::Debug for ResultHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandles")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Caller-side half of a call's result.
///
/// Resolves to the parsed response or the call's single classified failure.
#[derive(Debug)]
pub struct PendingCall<T> {
    request_id: String,
    receiver: oneshot::Receiver<Result<T, RpcError>>,
}

impl<T> PendingCall<T> {
    /// Correlation id of the call, usable with `RpcCommunicator::cancel`.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl<T> Future for PendingCall<T> {
    type Output = Result<T, RpcError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RpcError::ClientError(
                "Result handle dropped before settlement".to_string(),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}
