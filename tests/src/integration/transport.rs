//! Event bus observers and the channel transport.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use proto_rpc::adapters::{spawn_inbound_pump, ChannelTransport};
    use proto_rpc::{CallContext, RpcCommunicator, RpcMessage};
    use shared_bus::{EventFilter, RpcEvent};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_observer_sees_request_and_context() {
        let comm = RpcCommunicator::new();
        comm.set_outgoing_message_listener(RecordingTransport::new());
        let mut events = comm.subscribe(EventFilter::outgoing());

        let context = CallContext::new().with_metadata("peer", "node-7");
        let pending = comm
            .client()
            .call::<_, PingResponse>(METHOD_PING, &PingRequest { nonce: 3 }, Some(context))
            .await;

        match events.recv().await.unwrap() {
            RpcEvent::OutgoingMessage {
                message,
                request_id,
                context,
            } => {
                assert_eq!(request_id, pending.request_id());
                assert_eq!(message.method(), Some(METHOD_PING));
                assert_eq!(context.unwrap().metadata("peer"), Some("node-7"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        comm.stop();
    }

    #[tokio::test]
    async fn test_server_sees_pump_context() {
        let server = RpcCommunicator::new();
        server.register_rpc_method(
            "whoami",
            |_: (), ctx: CallContext| async move {
                Ok::<_, proto_rpc::HandlerError>(ctx.metadata("peer").unwrap_or("?").to_string())
            },
            proto_rpc::MethodOptions::default(),
        );

        let (replies, mut reply_rx) = ChannelTransport::channel(8);
        server.set_outgoing_message_listener(replies);

        let (inbound_tx, inbound_rx) = tokio::sync::mpsc::channel(8);
        let pump = spawn_inbound_pump(
            inbound_rx,
            Arc::new(server.clone()),
            Some(CallContext::new().with_metadata("peer", "node-9")),
        );

        let request = RpcMessage::request("w1", "whoami", proto_rpc::encode_payload(&()).unwrap());
        inbound_tx.send(request.to_bytes().unwrap()).await.unwrap();

        let reply = RpcMessage::from_bytes(&reply_rx.recv().await.unwrap()).unwrap();
        assert_eq!(reply.request_id, "w1");
        let who: String = proto_rpc::decode_payload(reply.body.as_deref().unwrap()).unwrap();
        assert_eq!(who, "node-9");

        drop(inbound_tx);
        pump.await.unwrap();
        server.stop();
    }

    #[tokio::test]
    async fn test_responses_are_not_correlated_locally() {
        let pair = PeerPair::new();
        register_dht_methods(&pair.remote);

        let _: PingResponse = pair
            .local
            .client()
            .request(METHOD_PING, &PingRequest { nonce: 5 }, None)
            .await
            .unwrap();

        // Answering never registers a call on the serving side.
        assert_eq!(pair.remote.pending_count(), 0);
        assert_eq!(pair.remote.stats().total_registered, 0);

        pair.shutdown().await;
    }
}
