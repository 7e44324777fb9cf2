//! Loopback tests for the UDP sender and listener.

use std::{num::NonZeroUsize, time::Duration};

use rstest::{fixture, rstest};
use tokio::{sync::mpsc, time::timeout};
use tokio_util::sync::CancellationToken;
use wirefrag::{
    DatagramListener,
    DatagramSender,
    FragmentationConfig,
    InboundMessage,
    Message,
    MessageId,
    TransportError,
    fragment::FragmentationError,
};

const FRAGMENT_SIZE: usize = 64;
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

#[fixture]
fn config() -> FragmentationConfig {
    FragmentationConfig::new(FRAGMENT_SIZE)
        .expect("valid size")
        .with_sweep_interval(Duration::from_millis(20))
}

struct Harness {
    sender: DatagramSender,
    listener_addr: std::net::SocketAddr,
    inbound: mpsc::Receiver<InboundMessage>,
    shutdown: CancellationToken,
    worker: tokio::task::JoinHandle<Result<(), TransportError>>,
}

async fn harness(config: FragmentationConfig) -> Harness {
    let listener = DatagramListener::bind("127.0.0.1:0", &config)
        .await
        .expect("bind listener");
    let listener_addr = listener.local_addr().expect("listener addr");
    let sender = DatagramSender::bind("127.0.0.1:0", config.fragmenter())
        .await
        .expect("bind sender");
    let shutdown = CancellationToken::new();
    let (tx, inbound) = mpsc::channel(8);
    let worker = tokio::spawn(listener.run(tx, shutdown.clone()));
    Harness {
        sender,
        listener_addr,
        inbound,
        shutdown,
        worker,
    }
}

async fn next_message(inbound: &mut mpsc::Receiver<InboundMessage>) -> InboundMessage {
    timeout(RECEIVE_TIMEOUT, inbound.recv())
        .await
        .expect("message before timeout")
        .expect("listener still running")
}

#[rstest]
#[tokio::test]
async fn large_tagged_message_crosses_loopback(config: FragmentationConfig) {
    let mut h = harness(config).await;
    let payload: Vec<u8> = (0..=u8::MAX).cycle().take(1000).collect();

    let id = h
        .sender
        .send(payload.clone(), ["host=a", "sev=warn"], h.listener_addr)
        .await
        .expect("send message");
    let inbound = next_message(&mut h.inbound).await;

    assert_eq!(inbound.sender, h.sender.local_addr().expect("sender addr"));
    assert_eq!(
        inbound.message,
        Message::new(id, payload).with_tags(["host=a", "sev=warn"])
    );

    h.shutdown.cancel();
    h.worker
        .await
        .expect("listener task")
        .expect("listener exits cleanly");
}

#[rstest]
#[tokio::test]
async fn sender_assigns_consecutive_ids(config: FragmentationConfig) {
    let mut h = harness(config).await;
    h.sender = h.sender.with_first_message_id(MessageId::new(u32::MAX));

    let first = h
        .sender
        .send(&b"one"[..], Vec::<String>::new(), h.listener_addr)
        .await
        .expect("send first");
    let second = h
        .sender
        .send(&b"two"[..], Vec::<String>::new(), h.listener_addr)
        .await
        .expect("send second");

    assert_eq!(first, MessageId::new(u32::MAX));
    assert_eq!(second, MessageId::new(0));
    let mut ids = vec![
        next_message(&mut h.inbound).await.message.message_id(),
        next_message(&mut h.inbound).await.message.message_id(),
    ];
    ids.sort();
    assert_eq!(ids, vec![MessageId::new(0), MessageId::new(u32::MAX)]);
    h.shutdown.cancel();
}

#[rstest]
#[tokio::test]
async fn rate_limited_sender_still_delivers(config: FragmentationConfig) {
    let mut h = harness(config).await;
    let rate = NonZeroUsize::new(1000).expect("non-zero rate");
    h.sender = h.sender.with_rate_limit(rate);

    let count = h
        .sender
        .send_message(
            &Message::new(MessageId::new(5), vec![3_u8; 300]),
            h.listener_addr,
        )
        .await
        .expect("send message");

    assert!(count > 1);
    let inbound = next_message(&mut h.inbound).await;
    assert_eq!(inbound.message.payload().len(), 300);
    h.shutdown.cancel();
}

#[rstest]
#[tokio::test]
async fn unencodable_message_sends_nothing(config: FragmentationConfig) {
    let h = harness(config).await;
    let wide_tag = "x".repeat(FRAGMENT_SIZE);

    let err = h
        .sender
        .send(&b"payload"[..], [wide_tag], h.listener_addr)
        .await
        .expect_err("tag wider than a fragment");

    assert!(matches!(
        err,
        TransportError::Fragmentation(FragmentationError::TagsTooLarge { .. })
    ));
    h.shutdown.cancel();
}

#[rstest]
#[tokio::test]
async fn listener_skips_malformed_datagrams(config: FragmentationConfig) {
    let mut h = harness(config).await;
    let raw = tokio::net::UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("bind raw socket");
    raw.send_to(b"garbage", h.listener_addr)
        .await
        .expect("send garbage");

    let id = h
        .sender
        .send(&b"after garbage"[..], ["ok"], h.listener_addr)
        .await
        .expect("send message");

    let inbound = next_message(&mut h.inbound).await;
    assert_eq!(inbound.message.message_id(), id);
    assert_eq!(inbound.message.payload().as_ref(), b"after garbage");
    h.shutdown.cancel();
}

#[rstest]
#[tokio::test]
async fn listener_stops_when_sink_closes(config: FragmentationConfig) {
    let h = harness(config).await;
    drop(h.inbound);

    h.sender
        .send(&b"nobody listening"[..], Vec::<String>::new(), h.listener_addr)
        .await
        .expect("send message");

    timeout(RECEIVE_TIMEOUT, h.worker)
        .await
        .expect("listener stops")
        .expect("listener task")
        .expect("listener exits cleanly");
}
