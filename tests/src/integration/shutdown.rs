//! Stopping a communicator with calls in flight.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use futures::StreamExt;
    use proto_rpc::{RpcCommunicator, RpcError};
    use shared_bus::{EventFilter, RpcEvent};
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_rejects_in_flight_calls() {
        let comm = RpcCommunicator::new();
        comm.set_outgoing_message_listener(RecordingTransport::new());
        let client = comm.client();

        let mut pending = Vec::new();
        for nonce in 0..5u64 {
            pending.push(
                client
                    .call::<_, PingResponse>(METHOD_PING, &PingRequest { nonce }, None)
                    .await,
            );
        }
        assert_eq!(comm.pending_count(), 5);

        comm.stop();

        for call in futures::future::join_all(pending).await {
            assert_eq!(call.unwrap_err(), RpcError::Stopped);
        }
        assert_eq!(comm.pending_count(), 0);
        assert!(comm.is_stopped());
    }

    #[tokio::test]
    async fn test_calls_after_stop() {
        let comm = RpcCommunicator::new();
        let transport = RecordingTransport::new();
        comm.set_outgoing_message_listener(transport.clone());
        comm.stop();
        comm.stop();

        let err = comm
            .client()
            .request::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 1 }, None)
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::Stopped);

        let err = comm
            .client()
            .notify(METHOD_LEAVE, &LeaveNotice { node_id: [0; 32] }, None)
            .await
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::Stopped);

        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_peer_goes_quiet() {
        let pair = PeerPair::new();
        register_dht_methods(&pair.remote);
        pair.remote.stop();

        let err = pair
            .local
            .client()
            .request::<_, PingResponse>(
                METHOD_PING,
                &PingRequest { nonce: 1 },
                Some(proto_rpc::CallContext::new().with_timeout(Duration::from_millis(50))),
            )
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::ClientTimeout);

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_event_stream_ends_after_stop() {
        let comm = RpcCommunicator::new();
        let mut stream = comm.event_stream(EventFilter::all());

        comm.stop();

        assert!(matches!(stream.next().await, Some(RpcEvent::Stopped)));
        assert!(stream.next().await.is_none());
    }
}
