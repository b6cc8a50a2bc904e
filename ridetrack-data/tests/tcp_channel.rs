//! Integration tests for [`TcpChannelSession`] against a loopback peer.

mod support;

use ridetrack_core::{ChannelError, ChannelSession, ChannelState, Delivery, RiderIdentity};
use ridetrack_data::channel::{JOIN_EVENT, TcpChannelSession};
use rstest::{fixture, rstest};
use serde_json::json;
use support::{Peer, WAIT, loopback_listener};

#[fixture]
fn identity() -> RiderIdentity {
    RiderIdentity::new("rider-7", "42").expect("valid identity")
}

async fn wait_for_state(session: &TcpChannelSession, target: ChannelState) {
    let mut states = session.subscribe_state();
    tokio::time::timeout(WAIT, async {
        while session.state() != target {
            if let Err(tokio::sync::broadcast::error::RecvError::Closed) = states.recv().await {
                panic!("session dropped its transition channel");
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("channel never reached {target:?}"));
}

#[rstest]
#[tokio::test]
async fn announces_the_rider_before_any_update(identity: RiderIdentity) {
    let (listener, address) = loopback_listener().await;
    let session = TcpChannelSession::new();

    session.connect(&address, &identity);
    let mut peer = Peer::accept(&listener).await;
    wait_for_state(&session, ChannelState::Connected).await;
    let delivery = session.send("updateLocation", json!({"id": "rider-7"}));

    let join = peer.next_frame().await;
    assert_eq!(join["event"], JOIN_EVENT);
    assert_eq!(join["data"], json!({"id": "rider-7", "busLine": "42"}));
    let update = peer.next_frame().await;
    assert_eq!(update["event"], "updateLocation");
    assert_eq!(delivery, Delivery::Dispatched);
}

#[rstest]
#[tokio::test]
async fn sends_while_disconnected_are_dropped() {
    let session = TcpChannelSession::new();

    assert_eq!(session.send("updateLocation", json!({})), Delivery::Dropped);
    assert_eq!(session.dropped_sends(), 1);
    assert_eq!(session.state(), ChannelState::Disconnected);
}

#[rstest]
#[tokio::test]
async fn connect_while_connecting_is_ignored(identity: RiderIdentity) {
    let (listener, address) = loopback_listener().await;
    let session = TcpChannelSession::new();

    session.connect(&address, &identity);
    session.connect(&address, &identity);
    let _peer = Peer::accept(&listener).await;
    wait_for_state(&session, ChannelState::Connected).await;

    let second = tokio::time::timeout(std::time::Duration::from_millis(200), listener.accept()).await;
    assert!(second.is_err(), "a second connection was opened");
}

#[rstest]
#[tokio::test]
async fn disconnect_closes_the_stream(identity: RiderIdentity) {
    let (listener, address) = loopback_listener().await;
    let session = TcpChannelSession::new();
    session.connect(&address, &identity);
    let mut peer = Peer::accept(&listener).await;
    wait_for_state(&session, ChannelState::Connected).await;
    peer.next_frame().await;

    assert_eq!(session.disconnect(), Ok(()));

    assert_eq!(session.state(), ChannelState::Disconnected);
    assert_eq!(peer.next_line().await, None);
    assert_eq!(session.send("updateLocation", json!({})), Delivery::Dropped);
    assert_eq!(session.last_error(), None);
}

#[rstest]
#[tokio::test]
async fn peer_closing_moves_the_session_to_disconnected(identity: RiderIdentity) {
    let (listener, address) = loopback_listener().await;
    let session = TcpChannelSession::new();
    session.connect(&address, &identity);
    let peer = Peer::accept(&listener).await;
    wait_for_state(&session, ChannelState::Connected).await;

    drop(peer);
    wait_for_state(&session, ChannelState::Disconnected).await;

    assert!(matches!(
        session.last_error(),
        Some(ChannelError::Transport { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn refused_connection_is_recorded(identity: RiderIdentity) {
    let (listener, address) = loopback_listener().await;
    drop(listener);
    let session = TcpChannelSession::new();

    session.connect(&address, &identity);
    tokio::time::timeout(WAIT, async {
        while session.last_error().is_none() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("connection failure recorded");

    assert_eq!(session.state(), ChannelState::Disconnected);
    assert!(matches!(
        session.last_error(),
        Some(ChannelError::Transport { ref endpoint, .. }) if *endpoint == address
    ));
}

#[rstest]
#[tokio::test]
async fn stalled_peer_drops_fixes_instead_of_buffering(identity: RiderIdentity) {
    let (listener, address) = loopback_listener().await;
    let session = TcpChannelSession::new();
    session.connect(&address, &identity);
    let _stalled = Peer::accept(&listener).await;
    wait_for_state(&session, ChannelState::Connected).await;

    let filler = "x".repeat(10 * 1024);
    let total = 4000_u64;
    let mut dispatched = 0_u64;
    for seq in 0..total {
        if session.send("updateLocation", json!({"seq": seq, "filler": filler}))
            == Delivery::Dispatched
        {
            dispatched += 1;
        }
        tokio::task::yield_now().await;
    }

    assert!(session.dropped_sends() > 0, "no fix was dropped");
    assert_eq!(dispatched + session.dropped_sends(), total);
    assert_eq!(session.state(), ChannelState::Connected);
}
