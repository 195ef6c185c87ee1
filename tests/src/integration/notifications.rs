//! Fire-and-forget notifications.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use proto_rpc::{CallContext, HandlerError, MethodOptions, RpcCommunicator, RpcError};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_notification_reaches_handler() {
        let pair = PeerPair::new();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        pair.remote.register_rpc_notification(
            METHOD_LEAVE,
            move |notice: LeaveNotice, ctx: CallContext| {
                let seen_tx = seen_tx.clone();
                async move {
                    let _ = seen_tx.send((notice, ctx.notification));
                    Ok::<_, HandlerError>(())
                }
            },
            MethodOptions::default(),
        );

        pair.local
            .client()
            .notify(METHOD_LEAVE, &LeaveNotice { node_id: [5; 32] }, None)
            .await
            .await
            .unwrap();

        let (notice, _) = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.node_id, [5; 32]);
        assert_eq!(pair.local.pending_count(), 0);

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_failing_notification_handler_is_silent() {
        let pair = PeerPair::new();
        pair.remote.register_rpc_notification(
            METHOD_LEAVE,
            |_: LeaveNotice, _ctx| async move { Err(HandlerError::failed("not a member")) },
            MethodOptions::default(),
        );

        let mut outgoing = pair.remote.subscribe(shared_bus::EventFilter::outgoing());

        pair.local
            .client()
            .notify(METHOD_LEAVE, &LeaveNotice { node_id: [1; 32] }, None)
            .await
            .await
            .unwrap();

        // The remote never answers a notification, even when its handler fails.
        let answered = tokio::time::timeout(Duration::from_millis(100), outgoing.recv()).await;
        assert!(answered.is_err());

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_notification_to_unknown_method_is_dropped() {
        let pair = PeerPair::new();
        let mut outgoing = pair.remote.subscribe(shared_bus::EventFilter::outgoing());

        pair.local
            .client()
            .notify("nobodyListens", &(), None)
            .await
            .await
            .unwrap();

        let answered = tokio::time::timeout(Duration::from_millis(100), outgoing.recv()).await;
        assert!(answered.is_err());

        pair.shutdown().await;
    }

    #[tokio::test]
    async fn test_notification_send_failure_rejects() {
        let comm = RpcCommunicator::new();
        let transport = RecordingTransport::new();
        transport.set_failing(true);
        comm.set_outgoing_message_listener(transport);

        let err = comm
            .client()
            .notify(METHOD_LEAVE, &LeaveNotice { node_id: [2; 32] }, None)
            .await
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::ClientError(ref msg) if msg.contains("link down")));
        assert_eq!(comm.pending_count(), 0);
    }
}
