//! Single-component scenarios over a hand-built transport link.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use abc_component::{Component, MessagePredicate};

    use crate::{init_tracing, make_inbound, spawn_rejector, test_link, Anyone};

    const WAIT: Duration = Duration::from_secs(5);

    fn attributes(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_backlog_offered_in_order_after_first_subscription() {
        init_tracing();
        let (link, transport) = test_link(0, 3);
        let component = Component::connect(link);
        let handle = component.handle();

        // Ids 0..2 arrive before anyone subscribes; nothing may move yet.
        for id in 0..3 {
            transport
                .inbound
                .send(make_inbound(id, format!("m{id}")))
                .await
                .unwrap();
        }

        let mut subscription = handle.subscribe().await.unwrap();
        for expected in 0..3 {
            let offer = timeout(WAIT, subscription.next_offer())
                .await
                .expect("offer")
                .expect("component alive");
            assert_eq!(offer.message.id, expected);
            assert_eq!(offer.message.payload, format!("m{expected}"));
            offer.reject();
        }
    }

    #[tokio::test]
    async fn test_first_subscription_clears_a_waiting_send_immediately() {
        let (link, mut transport) = test_link(0, 0);
        let component = Component::connect(link);
        let handle = component.handle();

        let _subscription = handle.subscribe().await.unwrap();

        let grant = timeout(WAIT, handle.request_send())
            .await
            .expect("clearance")
            .unwrap();
        let receipt = grant.abort().await.unwrap();
        assert_eq!(receipt.id, 0);
        assert!(receipt.update.is_some(), "withdrawn sends get an update handle");

        let outbound = timeout(WAIT, transport.outbound.recv())
            .await
            .expect("sentinel")
            .expect("component alive");
        assert_eq!(outbound.id, 0);
        assert!(outbound.is_sentinel());
        assert!(outbound.payload.is_empty());
    }

    #[tokio::test]
    async fn test_acceptance_commits_and_fires_the_update_event() {
        let (link, transport) = test_link(0, 1);
        let component = Component::connect_with_attributes(link, attributes(&[("x", "1")]));
        let handle = component.handle();

        let mut first = handle.subscribe().await.unwrap();
        let mut second = handle.subscribe().await.unwrap();
        let mut update = handle.update_handle();

        transport.inbound.send(make_inbound(0, "hello")).await.unwrap();

        // First subscriber inspects and rejects.
        let offer = timeout(WAIT, first.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        assert_eq!(offer.message.payload, "hello");
        assert_eq!(offer.attributes.get("x"), Some("1".to_string()));
        offer.reject();

        // Second subscriber updates the environment and accepts.
        let offer = timeout(WAIT, second.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        offer.attributes.set("x", "2");
        offer.accept();

        assert!(timeout(WAIT, update.changed()).await.expect("update event"));

        // The cursor moved on: the next message is offered, with the
        // committed environment visible.
        transport.inbound.send(make_inbound(1, "next")).await.unwrap();
        let offer = timeout(WAIT, first.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        assert_eq!(offer.message.id, 1);
        assert_eq!(offer.attributes.get("x"), Some("2".to_string()));
        offer.reject();
    }

    #[tokio::test]
    async fn test_clearance_waits_for_buffered_lower_ids() {
        let (link, mut transport) = test_link(3, 5);
        let component = Component::connect(link);
        let handle = component.handle();

        let subscription = handle.subscribe().await.unwrap();
        let mut seen = spawn_rejector(subscription);

        // Ids 3 and 4 are ahead of the send's reserved id 5.
        transport.inbound.send(make_inbound(3, "m3")).await.unwrap();
        transport.inbound.send(make_inbound(4, "m4")).await.unwrap();

        let grant = timeout(WAIT, handle.request_send())
            .await
            .expect("clearance")
            .unwrap();

        // Both buffered messages were dispatched before clearance fired.
        assert_eq!(seen.try_recv().unwrap().0, 3);
        assert_eq!(seen.try_recv().unwrap().0, 4);

        let receipt = grant
            .submit(MessagePredicate::send("ping", Arc::new(Anyone)))
            .await
            .unwrap();
        assert_eq!(receipt.id, 5);
        assert!(receipt.update.is_none());

        let outbound = timeout(WAIT, transport.outbound.recv())
            .await
            .expect("outbound")
            .expect("component alive");
        assert_eq!(outbound.id, 5);
        assert_eq!(outbound.payload, "ping");
        assert!(!outbound.is_sentinel());
    }

    #[tokio::test]
    async fn test_process_subscribing_mid_dispatch_is_not_offered_the_message() {
        let (link, transport) = test_link(0, 1);
        let component = Component::connect(link);
        let handle = component.handle();

        let mut first = handle.subscribe().await.unwrap();
        transport.inbound.send(make_inbound(0, "m0")).await.unwrap();

        let offer = timeout(WAIT, first.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        assert_eq!(offer.message.id, 0);

        // Subscribed while the message is in flight: too late for it.
        let mut second = handle.subscribe().await.unwrap();
        offer.reject();

        assert!(
            timeout(Duration::from_millis(200), second.next_offer())
                .await
                .is_err(),
            "late subscriber must not see the in-flight message"
        );

        // It is a full recipient for the next one.
        transport.inbound.send(make_inbound(1, "m1")).await.unwrap();
        let offer = timeout(WAIT, first.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        assert_eq!(offer.message.id, 1);
        offer.reject();
        let offer = timeout(WAIT, second.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        assert_eq!(offer.message.id, 1);
        offer.reject();
    }

    #[tokio::test]
    async fn test_unsubscribe_during_offer_counts_as_reject() {
        let (link, transport) = test_link(0, 1);
        let component = Component::connect_with_attributes(link, attributes(&[("x", "1")]));
        let handle = component.handle();

        let mut first = handle.subscribe().await.unwrap();
        let mut second = handle.subscribe().await.unwrap();

        transport.inbound.send(make_inbound(0, "m0")).await.unwrap();

        // The first subscriber receives the offer, tentatively writes, and
        // walks away without answering.
        let abandoned = timeout(WAIT, first.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        abandoned.attributes.set("x", "tainted");
        handle.unsubscribe(first.id()).await.unwrap();

        // The next recipient is offered the message with the write rolled
        // back; nothing was committed.
        let offer = timeout(WAIT, second.next_offer())
            .await
            .expect("offer")
            .expect("component alive");
        assert_eq!(offer.message.id, 0);
        assert_eq!(offer.attributes.get("x"), Some("1".to_string()));
        offer.reject();

        drop(abandoned);
    }

    #[tokio::test]
    async fn test_withdrawn_send_rolls_back_and_hands_out_update_handle() {
        let (link, mut transport) = test_link(0, 0);
        let component = Component::connect_with_attributes(link, attributes(&[("x", "1")]));
        let handle = component.handle();

        let _subscription = handle.subscribe().await.unwrap();

        let grant = timeout(WAIT, handle.request_send())
            .await
            .expect("clearance")
            .unwrap();
        grant.attributes().set("x", "tmp");
        assert_eq!(grant.attributes().get("x"), Some("tmp".to_string()));

        let receipt = grant.abort().await.unwrap();
        assert_eq!(receipt.id, 0);
        let mut update = receipt.update.expect("update handle after withdrawal");

        let sentinel = timeout(WAIT, transport.outbound.recv())
            .await
            .expect("sentinel")
            .expect("component alive");
        assert_eq!(sentinel.id, 0);
        assert!(sentinel.is_sentinel());

        // A second grant sees the rolled-back environment...
        let grant = timeout(WAIT, handle.request_send())
            .await
            .expect("clearance")
            .unwrap();
        assert_eq!(grant.attributes().get("x"), Some("1".to_string()));

        // ...and committing through it wakes the handle from the receipt.
        grant.attributes().set("x", "final");
        let receipt = grant
            .submit(MessagePredicate::send("done", Arc::new(Anyone)))
            .await
            .unwrap();
        assert_eq!(receipt.id, 1);
        assert!(timeout(WAIT, update.changed()).await.expect("update event"));
    }
}
