//! Client transport - typed calls over an `RpcCommunicator`.
//!
//! Builds the request envelope, allocates a fresh correlation id, creates the
//! result handles and hands all three to the engine's outbound path.

use crate::codec::encode_payload;
use crate::domain::{PendingCall, ResultHandles, RpcError};
use crate::service::RpcCommunicator;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{CallContext, RpcMessage};
use uuid::Uuid;

/// Typed call interface.
#[derive(Debug, Clone)]
pub struct ClientTransport {
    communicator: RpcCommunicator,
}

impl ClientTransport {
    /// Create a client bound to `communicator`.
    #[must_use]
    pub fn new(communicator: RpcCommunicator) -> Self {
        Self { communicator }
    }

    /// Issue a request and return the pending result.
    ///
    /// The request is handed to the transport before this returns. A request
    /// that cannot be encoded rejects with `CLIENT_ERROR`.
    pub async fn call<Req, Res>(
        &self,
        method: &str,
        request: &Req,
        context: Option<CallContext>,
    ) -> PendingCall<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send + 'static,
    {
        let request_id = new_request_id();
        let (handles, pending) = ResultHandles::typed::<Res>(request_id.clone());

        match encode_payload(request) {
            Ok(body) => {
                let message = RpcMessage::request(request_id, method, body);
                self.communicator
                    .handle_outgoing_call(message, context, Some(handles))
                    .await;
            }
            Err(e) => handles.reject(RpcError::ClientError(e.to_string())),
        }

        pending
    }

    /// Issue a request and wait for its result.
    pub async fn request<Req, Res>(
        &self,
        method: &str,
        request: &Req,
        context: Option<CallContext>,
    ) -> Result<Res, RpcError>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send + 'static,
    {
        self.call(method, request, context).await.await
    }

    /// Send a notification.
    ///
    /// The returned call settles once the transport accepted the envelope;
    /// the remote handler's outcome is never reported.
    pub async fn notify<Req>(
        &self,
        method: &str,
        notification: &Req,
        context: Option<CallContext>,
    ) -> PendingCall<()>
    where
        Req: Serialize + Sync,
    {
        let request_id = new_request_id();
        let (handles, pending) = ResultHandles::for_notification(request_id.clone());

        match encode_payload(notification) {
            Ok(body) => {
                let message = RpcMessage::notification(request_id, method, body);
                let context = context.unwrap_or_default();
                self.communicator
                    .handle_outgoing_call(
                        message,
                        Some(CallContext {
                            notification: true,
                            ..context
                        }),
                        Some(handles),
                    )
                    .await;
            }
            Err(e) => handles.reject(RpcError::ClientError(e.to_string())),
        }

        pending
    }

    /// The communicator this client issues calls through.
    #[must_use]
    pub fn communicator(&self) -> &RpcCommunicator {
        &self.communicator
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}
