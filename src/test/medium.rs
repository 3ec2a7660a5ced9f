use crate::net::{FrameId, Medium, MediumId, RouterId};
use crate::sim::{Clock, SimTime};

fn bus() -> Medium {
    Medium::new_bus(MediumId(0), "bus0", SimTime(20), 100_000_000)
}

#[test]
fn medium_flags_follow_transmitter_count() {
    let mut m = bus();
    assert!(m.can_access());

    m.claim();
    assert!(!m.resolve_status());
    assert!(m.is_busy());
    assert!(!m.has_collision());
    assert!(!m.can_access());

    m.claim();
    assert!(m.resolve_status(), "1 -> 2 is a fresh collision");
    assert!(m.has_collision());

    // 碰撞持续期间不再重复报告
    m.claim();
    assert!(!m.resolve_status());
    assert!(m.has_collision());

    m.release();
    m.release();
    assert!(!m.resolve_status());
    assert!(m.is_busy());
    assert!(!m.has_collision());

    m.release();
    assert!(!m.resolve_status());
    assert!(!m.is_busy());
    assert!(m.can_access());
}

#[test]
fn medium_reports_a_new_collision_after_it_clears() {
    let mut m = bus();
    m.claim();
    m.claim();
    assert!(m.resolve_status());
    m.release();
    assert!(!m.resolve_status());
    m.claim();
    assert!(m.resolve_status());
}

#[test]
fn medium_delivers_frames_exactly_at_round_trip() {
    let mut clock = Clock::new(SimTime(50), SimTime(1_000));
    let mut m = bus();
    m.claim();
    m.resolve_status();

    assert_eq!(m.put_on_bus(FrameId(3), &mut clock), SimTime(20));
    assert_eq!(m.in_flight_len(), 1);
    assert!(m.check_if_frames_done(SimTime(19)).is_empty());

    while clock.now() < SimTime(20) {
        clock.advance().unwrap();
    }
    assert_eq!(m.check_if_frames_done(clock.now()), vec![FrameId(3)]);
    assert_eq!(m.in_flight_len(), 0);
    assert_eq!(m.transmitters(), 0);
    m.resolve_status();
    assert!(!m.is_busy());
}

#[test]
fn medium_tx_time_rounds_up_to_microseconds() {
    let m = bus();
    assert_eq!(m.tx_time(8_000), SimTime(80));
    assert_eq!(m.tx_time(8_001), SimTime(81));
    let link = Medium::new_link(MediumId(1), "link0", (RouterId(0), RouterId(1)), SimTime(20), 1_000_000_000);
    assert_eq!(link.tx_time(8_000), SimTime(8));
}

#[test]
fn link_tracks_cost_and_peers() {
    let mut link = Medium::new_link(MediumId(1), "link0", (RouterId(0), RouterId(1)), SimTime(20), 1_000_000_000);
    assert!(link.is_link());
    assert!(link.can_access());
    assert_eq!(link.cost(), Some(1));
    link.set_cost(7);
    assert_eq!(link.cost(), Some(7));
    assert_eq!(link.peer_of(RouterId(0)), Some(RouterId(1)));
    assert_eq!(link.peer_of(RouterId(1)), Some(RouterId(0)));
    assert_eq!(link.peer_of(RouterId(2)), None);

    // 链路上的多发送者不影响代价接口，标志照常刷新
    link.claim();
    link.claim();
    assert!(link.resolve_status());
    assert!(link.can_access());

    let mut b = bus();
    b.set_cost(9);
    assert_eq!(b.cost(), None);
}
