//! Error propagation from server to caller.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use proto_rpc::domain::FAILED_TO_PARSE;
    use proto_rpc::{RpcCommunicator, RpcError, RpcErrorKind, RpcErrorType, RpcMessage};

    #[tokio::test]
    async fn test_unknown_method() {
        let pair = PeerPair::new();
        register_dht_methods(&pair.remote);

        let err = pair
            .local
            .client()
            .request::<_, ()>("storeValue", &(), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), RpcErrorKind::UnknownRpcMethod);
        assert_eq!(
            err,
            RpcError::UnknownRpcMethod {
                method: "storeValue".to_string()
            }
        );

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_handler_failure_carries_diagnostics() {
        let pair = PeerPair::new();
        register_dht_methods(&pair.remote);

        let err = pair
            .local
            .client()
            .request::<_, ClosestPeersResponse>(
                METHOD_CLOSEST_PEERS,
                &ClosestPeersRequest {
                    target: [0; 32],
                    limit: 0,
                },
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RpcError::ServerError {
                message: "limit must be positive".to_string(),
                class_name: Some("InvalidArgument".to_string()),
                code: Some("E_LIMIT".to_string()),
            }
        );
        assert_eq!(err.kind(), RpcErrorKind::ServerError);

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_server_cannot_parse_request() {
        let pair = PeerPair::new();
        register_dht_methods(&pair.remote);

        // An empty body is not a PingRequest.
        let err = pair
            .local
            .client()
            .request::<_, PingResponse>(METHOD_PING, &(), None)
            .await
            .unwrap_err();

        match err {
            RpcError::ServerError { class_name, .. } => {
                assert_eq!(class_name.as_deref(), Some(FAILED_TO_PARSE));
            }
            other => panic!("unexpected error {:?}", other),
        }

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_cannot_parse_response() {
        let pair = PeerPair::new();
        register_dht_methods(&pair.remote);

        // PingResponse is eight bytes; a peer list needs more.
        let err = pair
            .local
            .client()
            .request::<_, ClosestPeersResponse>(METHOD_PING, &PingRequest { nonce: 4 }, None)
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::FailedToParse(_)));
        assert_eq!(err.kind(), RpcErrorKind::ServerError);

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_side_error_type_in_response_is_unknown() {
        let comm = RpcCommunicator::new();
        let transport = RecordingTransport::new();
        comm.set_outgoing_message_listener(transport.clone());

        let pending = comm
            .client()
            .call::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 1 }, None)
            .await;
        let request = transport.last().unwrap();

        let bogus =
            RpcMessage::error_response(&request, RpcErrorType::ClientTimeout, None, None, None);
        comm.handle_incoming_message(bogus, None).await;

        match pending.await.unwrap_err() {
            RpcError::ServerError { message, .. } => assert_eq!(message, "Unknown RPC Error"),
            other => panic!("unexpected error {:?}", other),
        }
        comm.stop();
    }

    #[tokio::test]
    async fn test_send_failure_rejects_call() {
        let comm = RpcCommunicator::new();
        let transport = RecordingTransport::new();
        transport.set_failing(true);
        comm.set_outgoing_message_listener(transport);

        let err = comm
            .client()
            .request::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 1 }, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), RpcErrorKind::ClientError);
        assert_eq!(comm.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_client_error_and_cancel() {
        let comm = RpcCommunicator::new();
        comm.set_outgoing_message_listener(RecordingTransport::new());
        let client = comm.client();

        let first = client
            .call::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 1 }, None)
            .await;
        let second = client
            .call::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 2 }, None)
            .await;

        assert!(comm.handle_client_error(first.request_id(), "peer disconnected"));
        assert!(comm.cancel(second.request_id()));
        assert!(!comm.cancel("never-issued"));

        assert_eq!(
            first.await.unwrap_err(),
            RpcError::ClientError("peer disconnected".to_string())
        );
        assert_eq!(second.await.unwrap_err(), RpcError::Cancelled);
        assert_eq!(comm.stats().total_cancelled, 2);
    }
}
