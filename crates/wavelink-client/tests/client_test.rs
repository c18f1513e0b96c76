//! Client driver behavior against a scripted in-process server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::mpsc;
use wavelink_client::{
    Client, ClientConfig, EventSink, MemoryConnector, MemoryLink, TransportSignal,
};
use wavelink_core::{LinkState, LinkStateEvent};
use wavelink_proto::{
    ErrorCode, EventFrame, EventKind, InboundFrame, RequestFrame, ResultFrame,
    events::{MessageEvent, TokenEvent, TokenEventType},
    payload::to_payload,
    types::{PublishOptions, SubscribeOptions},
};

/// Scripted server: acknowledges every request (when `ack`), records the
/// frames it saw, and exposes the push side of each accepted link.
struct TestServer {
    frames: mpsc::UnboundedReceiver<RequestFrame>,
    pushers: Arc<Mutex<Vec<mpsc::Sender<TransportSignal>>>>,
}

impl TestServer {
    fn spawn(mut links: mpsc::Receiver<MemoryLink>, ack: bool) -> Self {
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let pushers = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::clone(&pushers);

        tokio::spawn(async move {
            while let Some(mut link) = links.recv().await {
                accepted.lock().unwrap().push(link.to_client.clone());
                let frames_tx = frames_tx.clone();
                tokio::spawn(async move {
                    let _ = link.to_client.send(TransportSignal::Connected).await;
                    while let Some(frame) = link.from_client.recv().await {
                        let request_id = frame.request_id;
                        let _ = frames_tx.send(frame);
                        if ack {
                            let result =
                                InboundFrame::Result(ResultFrame::ok(request_id));
                            if link.to_client.send(TransportSignal::Frame(result)).await.is_err() {
                                break;
                            }
                        }
                    }
                });
            }
        });

        Self { frames, pushers }
    }

    async fn push(&self, signal: TransportSignal) {
        let pusher = self.pushers.lock().unwrap().first().cloned().unwrap();
        pusher.send(signal).await.unwrap();
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<MessageEvent>>,
    tokens: Mutex<Vec<TokenEvent>>,
    link_states: Mutex<Vec<LinkStateEvent>>,
}

impl EventSink for RecordingSink {
    fn on_message(&self, event: &MessageEvent) {
        self.messages.lock().unwrap().push(event.clone());
    }

    fn on_token(&self, event: &TokenEvent) {
        self.tokens.lock().unwrap().push(event.clone());
    }

    fn on_link_state(&self, event: &LinkStateEvent) {
        self.link_states.lock().unwrap().push(event.clone());
    }
}

fn fast_config(user: &str) -> ClientConfig {
    let mut config = ClientConfig::new(user);
    config.session.request_timeout = Duration::from_millis(200);
    config.tick_interval = Duration::from_millis(20);
    config
}

async fn logged_in_client(
    ack: bool,
) -> (Client<MemoryConnector>, TestServer, Arc<RecordingSink>) {
    let (connector, links) = MemoryConnector::new(32);
    let server = TestServer::spawn(links, ack);
    let sink = Arc::new(RecordingSink::default());
    let client = Client::new(fast_config("alice"), connector, sink.clone());

    let login = client.login("token").await.unwrap();
    if ack {
        assert!(login.outcome().await.unwrap().is_ok());
    }
    (client, server, sink)
}

#[tokio::test]
async fn login_then_publish_round_trip() {
    let (client, mut server, _sink) = logged_in_client(true).await;

    let login_frame = server.frames.recv().await.unwrap();
    assert_eq!(login_frame.op, wavelink_proto::OpKind::Login);

    let handle = client
        .publish("lobby", b"hello", &PublishOptions::default())
        .await
        .unwrap();
    let outcome = handle.outcome().await.unwrap();
    assert_eq!(outcome.code, ErrorCode::Ok);

    let publish_frame = server.frames.recv().await.unwrap();
    assert_eq!(publish_frame.op, wavelink_proto::OpKind::Publish);
    assert_eq!(publish_frame.request_id, outcome.request_id);
}

#[tokio::test]
async fn oversized_publish_is_rejected_locally() {
    let (client, _server, _sink) = logged_in_client(true).await;
    let big = vec![0u8; wavelink_proto::MAX_MESSAGE_PAYLOAD + 1];
    assert!(client.publish("lobby", &big, &PublishOptions::default()).await.is_err());
}

#[tokio::test]
async fn channel_events_reach_the_sink_in_order() {
    let (client, server, sink) = logged_in_client(true).await;

    let handle = client
        .subscribe("lobby", &SubscribeOptions::messages_and_presence())
        .await
        .unwrap();
    assert!(handle.outcome().await.unwrap().is_ok());

    for n in 0..3u8 {
        let event = MessageEvent {
            channel_type: wavelink_proto::ChannelType::Message,
            channel_name: "lobby".to_owned(),
            topic: None,
            payload: vec![n],
            publisher: "bob".to_owned(),
            custom_type: None,
            timestamp: u64::from(n) + 1,
        };
        server
            .push(TransportSignal::Frame(InboundFrame::Event(EventFrame {
                kind: EventKind::Message,
                channel: Some("lobby".to_owned()),
                payload: to_payload(&event).unwrap(),
                timestamp: event.timestamp,
            })))
            .await;
    }

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if sink.messages.lock().unwrap().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let payloads: Vec<u8> =
        sink.messages.lock().unwrap().iter().map(|m| m.payload[0]).collect();
    assert_eq!(payloads, [0, 1, 2]);
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let (client, mut server, _sink) = logged_in_client(false).await;

    // Login itself is never acked with a silent server.
    let frame = server.frames.recv().await.unwrap();
    assert_eq!(frame.op, wavelink_proto::OpKind::Login);

    let handle = client
        .publish("lobby", b"hello", &PublishOptions::default())
        .await
        .unwrap();
    let outcome = handle.outcome().await.unwrap();
    assert_eq!(outcome.code, ErrorCode::OperationTimeout);
}

#[tokio::test]
async fn revoked_token_aborts_the_session() {
    let (client, server, sink) = logged_in_client(true).await;

    let revoked = TokenEvent {
        event_type: TokenEventType::Revoked,
        reason: Some("revoked by admin".to_owned()),
        timestamp: 10,
    };
    server
        .push(TransportSignal::Frame(InboundFrame::Event(EventFrame {
            kind: EventKind::Token,
            channel: None,
            payload: to_payload(&revoked).unwrap(),
            timestamp: 10,
        })))
        .await;

    // The abort lands asynchronously; poll until new work is refused.
    let outcome = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let handle = client
                .publish("lobby", b"hello", &PublishOptions::default())
                .await
                .unwrap();
            let outcome = handle.outcome().await.unwrap();
            if outcome.code != ErrorCode::Ok {
                break outcome;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(outcome.code, ErrorCode::LinkAborted);
    assert_eq!(sink.tokens.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn abort_link_state_reaches_the_sink_with_a_full_event_queue() {
    // Depth 1 leaves no slack: if the delivery loop ever queued the
    // abort's own link state events it would block on itself.
    let (connector, links) = MemoryConnector::new(32);
    let server = TestServer::spawn(links, true);
    let sink = Arc::new(RecordingSink::default());
    let mut config = fast_config("alice");
    config.event_queue_depth = 1;
    let client = Client::new(config, connector, sink.clone());

    let login = client.login("token").await.unwrap();
    assert!(login.outcome().await.unwrap().is_ok());

    let revoked = TokenEvent {
        event_type: TokenEventType::Revoked,
        reason: Some("revoked by admin".to_owned()),
        timestamp: 10,
    };
    server
        .push(TransportSignal::Frame(InboundFrame::Event(EventFrame {
            kind: EventKind::Token,
            channel: None,
            payload: to_payload(&revoked).unwrap(),
            timestamp: 10,
        })))
        .await;

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let aborted = sink
                .link_states
                .lock()
                .unwrap()
                .iter()
                .any(|event| event.current == LinkState::Aborted);
            if aborted {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("sink never observed the aborted link state");

    // The driver is still responsive after the abort.
    let handle = client
        .publish("lobby", b"hello", &PublishOptions::default())
        .await
        .unwrap();
    assert_eq!(handle.outcome().await.unwrap().code, ErrorCode::LinkAborted);
}

#[tokio::test]
async fn stream_channel_handle_survives_and_releases() {
    let (client, mut server, _sink) = logged_in_client(true).await;

    let channel = client.create_stream_channel("arena").unwrap();
    let join = channel.join(Default::default()).await.unwrap();
    assert!(join.outcome().await.unwrap().is_ok());

    // Skip the login frame, then expect the join on the stream link.
    let mut saw_join = false;
    while let Ok(frame) = server.frames.try_recv() {
        if frame.op == wavelink_proto::OpKind::Join {
            saw_join = true;
        }
    }
    assert!(saw_join);

    let publish = channel
        .publish_topic_message("motion", b"x", PublishOptions::default())
        .await
        .unwrap();
    assert!(publish.outcome().await.unwrap().is_ok());

    drop(client);
    // Driver tasks wind down once the last strong handle is gone.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(
        channel.leave().await,
        Err(wavelink_client::ClientError::Released)
    ));
}

#[tokio::test]
async fn logout_completes_and_cancels_pending() {
    let (client, _server, _sink) = logged_in_client(false).await;

    let publish = client
        .publish("lobby", b"hello", &PublishOptions::default())
        .await
        .unwrap();
    let logout = client.logout().await.unwrap();

    assert_eq!(
        publish.outcome().await.unwrap().code,
        ErrorCode::OperationCancelled
    );
    assert!(logout.outcome().await.unwrap().is_ok());
}
