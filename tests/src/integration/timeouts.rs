//! Client-side and server-side timeouts.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use proto_rpc::{
        encode_payload, CallContext, HandlerError, MethodOptions, RpcCommunicator,
        RpcCommunicatorConfig, RpcError, RpcErrorKind, RpcMessage,
    };
    use std::time::Duration;

    #[tokio::test]
    async fn test_silent_peer_times_out() {
        let comm = RpcCommunicator::new();
        let transport = RecordingTransport::new();
        comm.set_outgoing_message_listener(transport.clone());

        let context = CallContext::new().with_timeout(Duration::from_millis(50));
        let err = comm
            .client()
            .request::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 1 }, Some(context))
            .await
            .unwrap_err();

        assert_eq!(err, RpcError::ClientTimeout);
        assert_eq!(err.kind(), RpcErrorKind::ClientTimeout);
        assert_eq!(comm.pending_count(), 0);
        assert_eq!(comm.stats().total_timeouts, 1);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_late_response_is_ignored() {
        let comm = RpcCommunicator::new();
        let transport = RecordingTransport::new();
        comm.set_outgoing_message_listener(transport.clone());

        let context = CallContext::new().with_timeout(Duration::from_millis(20));
        let err = comm
            .client()
            .request::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 9 }, Some(context))
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::ClientTimeout);

        let request = transport.last().unwrap();
        let late = RpcMessage::success_response(
            &request,
            encode_payload(&PingResponse { nonce: 9 }).unwrap(),
        );
        comm.handle_incoming_message(late, None).await;

        let stats = comm.stats();
        assert_eq!(stats.total_timeouts, 1);
        assert_eq!(stats.total_completed, 0);
    }

    #[tokio::test]
    async fn test_default_timeout_from_config() {
        let comm = RpcCommunicator::with_config(
            RpcCommunicatorConfig::default().with_rpc_request_timeout(Duration::from_millis(30)),
        )
        .unwrap();
        comm.set_outgoing_message_listener(RecordingTransport::new());

        let started = tokio::time::Instant::now();
        let err = comm
            .client()
            .request::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 0 }, None)
            .await
            .unwrap_err();

        assert_eq!(err, RpcError::ClientTimeout);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_slow_handler_is_server_timeout() {
        let pair = PeerPair::new();
        pair.remote.register_rpc_method(
            "slow",
            |_: (), _ctx| async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, HandlerError>(())
            },
            MethodOptions::with_timeout(Duration::from_millis(30)),
        );

        let err = pair
            .local
            .client()
            .request::<_, ()>("slow", &(), None)
            .await
            .unwrap_err();

        assert_eq!(err, RpcError::ServerTimeout);
        assert_eq!(err.kind(), RpcErrorKind::ServerTimeout);

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_gives_up_before_handler_finishes() {
        let pair = PeerPair::new();
        pair.remote.register_rpc_method(
            "sluggish",
            |_: (), _ctx| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, HandlerError>(1u8)
            },
            MethodOptions::with_timeout(Duration::from_secs(5)),
        );

        let context = CallContext::new().with_timeout(Duration::from_millis(40));
        let err = pair
            .local
            .client()
            .request::<_, u8>("sluggish", &(), Some(context))
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::ClientTimeout);

        // The eventual response finds no pending call.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(pair.local.pending_count(), 0);
        assert_eq!(pair.local.stats().total_completed, 0);

        pair.shutdown().await;
    }
}
