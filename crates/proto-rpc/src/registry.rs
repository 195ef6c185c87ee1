//! Server registry - method name to typed handler.
//!
//! Handlers are registered with concrete request/response types and stored
//! type-erased as `bytes -> bytes` futures. Payloads go through the codec in
//! [`crate::codec`]. Every dispatch runs under the method's timeout; the
//! registry lock is released before the handler is awaited.

use crate::codec::{decode_payload, encode_payload};
use crate::domain::errors::HandlerError;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{CallContext, RpcMessage};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

type HandlerFuture = BoxFuture<'static, Result<Vec<u8>, HandlerError>>;
type MethodHandler = Arc<dyn Fn(Vec<u8>, CallContext) -> HandlerFuture + Send + Sync>;

/// Per-method registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodOptions {
    /// Handler timeout. `None` uses the registry default.
    pub timeout: Option<Duration>,
}

impl MethodOptions {
    /// Options with an explicit handler timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

struct RegisteredMethod {
    handler: MethodHandler,
    timeout: Duration,
}

/// Registry of methods a communicator serves.
pub struct ServerRegistry {
    methods: RwLock<HashMap<String, RegisteredMethod>>,
    default_timeout: Duration,
}

impl ServerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            methods: RwLock::new(HashMap::new()),
            default_timeout,
        }
    }

    /// Register a method that answers with a response.
    ///
    /// Re-registering a name replaces the previous handler.
    pub fn register_rpc_method<Req, Res, F, Fut>(
        &self,
        name: impl Into<String>,
        handler: F,
        options: MethodOptions,
    ) where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: MethodHandler = Arc::new(move |bytes: Vec<u8>, context: CallContext| -> HandlerFuture {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let request: Req = decode_payload(&bytes)?;
                let response = handler(request, context).await?;
                encode_payload(&response).map_err(|e| HandlerError::failed(e.to_string()))
            })
        });
        self.insert(name.into(), erased, options);
    }

    /// Register a notification handler. Its result is never sent back.
    pub fn register_rpc_notification<Req, F, Fut>(
        &self,
        name: impl Into<String>,
        handler: F,
        options: MethodOptions,
    ) where
        Req: DeserializeOwned + Send + 'static,
        F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: MethodHandler = Arc::new(move |bytes: Vec<u8>, context: CallContext| -> HandlerFuture {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let request: Req = decode_payload(&bytes)?;
                handler(request, context).await?;
                Ok::<_, HandlerError>(Vec::new())
            })
        });
        self.insert(name.into(), erased, options);
    }

    fn insert(&self, name: String, handler: MethodHandler, options: MethodOptions) {
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        trace!(method = %name, timeout_ms = timeout.as_millis(), "Registered rpc method");
        self.methods
            .write()
            .insert(name, RegisteredMethod { handler, timeout });
    }

    /// Remove a method. Returns `false` if it was not registered.
    pub fn remove_method(&self, name: &str) -> bool {
        self.methods.write().remove(name).is_some()
    }

    /// Whether a method is registered under `name`.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    /// Whether no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }

    /// Dispatch a request and return the encoded response body.
    pub async fn handle_request(
        &self,
        message: &RpcMessage,
        context: CallContext,
    ) -> Result<Vec<u8>, HandlerError> {
        self.dispatch(message, context).await
    }

    /// Dispatch a notification.
    pub async fn handle_notification(
        &self,
        message: &RpcMessage,
        context: CallContext,
    ) -> Result<(), HandlerError> {
        self.dispatch(message, context).await.map(|_| ())
    }

    async fn dispatch(
        &self,
        message: &RpcMessage,
        context: CallContext,
    ) -> Result<Vec<u8>, HandlerError> {
        let method = message.method().unwrap_or_default();
        let (handler, timeout) = {
            let methods = self.methods.read();
            let entry = methods
                .get(method)
                .ok_or_else(|| HandlerError::UnknownMethod(method.to_string()))?;
            (Arc::clone(&entry.handler), entry.timeout)
        };

        let body = message.body.clone().unwrap_or_default();
        match tokio::time::timeout(timeout, handler(body, context)).await {
            Ok(result) => result,
            Err(_) => Err(HandlerError::Timeout {
                method: method.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

impl std::fmt::Debug for ServerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods = self.methods.read();
        let mut names: Vec<&String> = methods.keys().collect();
        names.sort();
        f.debug_struct("ServerRegistry")
            .field("methods", &names)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}
