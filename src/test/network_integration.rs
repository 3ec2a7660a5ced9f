use crate::config::SimConfig;
use crate::error::SimError;
use crate::net::{EndpointId, MediumId, Network, StationState};
use crate::report::{ReportEventKind, ReportLog};
use crate::sim::SimTime;
use crate::topo::single_bus::{SingleBusOpts, build_single_bus};
use crate::topo::two_segment::{TwoSegmentOpts, build_two_segment};

fn quiet_config(duration_us: u64) -> SimConfig {
    SimConfig {
        duration_us,
        arrival_mean: 0.0,
        ..SimConfig::default()
    }
}

#[test]
fn two_stations_same_slot_collide_once_and_back_off() {
    let mut net = Network::new(quiet_config(21));
    let (bus, stations) = build_single_bus(&mut net, &SingleBusOpts { stations: 2 }).unwrap();
    for s in &stations {
        net.station_mut(*s).push_outstanding(1);
    }
    let log = ReportLog::default();
    net.set_sink(log.clone());

    let summary = net.run().unwrap();

    assert_eq!(net.stats.collisions, 1);
    assert_eq!(summary.total_collisions, 1);
    assert_eq!(
        log.count(|k| matches!(k, ReportEventKind::CollisionDetected { .. })),
        1
    );

    let backoffs: Vec<u32> = log
        .events()
        .iter()
        .filter_map(|ev| match ev.kind {
            ReportEventKind::Collision { backoff_slots, .. } => Some(backoff_slots),
            _ => None,
        })
        .collect();
    assert_eq!(backoffs.len(), 2);
    assert!(backoffs.iter().all(|b| (1..=2).contains(b)), "{backoffs:?}");

    for s in &stations {
        let st = net.station(*s);
        assert!(st.retry_frame().is_some());
        assert_eq!(st.outstanding(), 1);
        assert_eq!(st.consecutive_collisions(), 1);
        assert_eq!(st.sent(), 0);
        assert_eq!(st.state(), StationState::BackingOff);
    }
    assert_eq!(log.count(|k| matches!(k, ReportEventKind::Delivery { .. })), 0);
    assert!(!net.medium(bus).has_collision());
    assert!(!net.medium(bus).is_busy());
}

#[test]
fn lone_sender_on_single_bus_delivers_every_frame() {
    let mut net = Network::new(quiet_config(2_000));
    let (_, stations) = build_single_bus(&mut net, &SingleBusOpts { stations: 2 }).unwrap();
    net.station_mut(stations[0]).push_outstanding(3);

    let summary = net.run().unwrap();

    let sender = net.station(stations[0]);
    let receiver = net.station(stations[1]);
    assert_eq!(sender.sent(), 3);
    assert_eq!(sender.outstanding(), 0);
    assert_eq!(sender.consecutive_collisions(), 0);
    assert_eq!(receiver.received(), 3);
    assert_eq!(summary.frames_delivered, 3);
    assert_eq!(summary.total_collisions, 0);
    assert_eq!(net.frames().in_use(), 0);
}

#[test]
fn contention_eventually_resolves_and_acks_reset_collision_counter() {
    let mut net = Network::new(SimConfig {
        seed: 3,
        ..quiet_config(50_000)
    });
    let (_, stations) = build_single_bus(&mut net, &SingleBusOpts { stations: 2 }).unwrap();
    for s in &stations {
        net.station_mut(*s).push_outstanding(2);
    }

    let summary = net.run().unwrap();

    assert!(summary.total_collisions >= 1);
    assert_eq!(summary.frames_delivered, 4);
    for s in &stations {
        let st = net.station(*s);
        assert_eq!(st.sent(), 2);
        assert_eq!(st.outstanding(), 0);
        assert_eq!(st.consecutive_collisions(), 0);
    }
}

#[test]
fn two_segment_frames_cross_routers() {
    let mut net = Network::new(quiet_config(3_000));
    let topo = build_two_segment(&mut net, &TwoSegmentOpts::default()).unwrap();
    let a0 = topo.segments[0][0];
    let b0 = topo.segments[1][0];
    net.station_mut(a0).push_outstanding(1);
    let log = ReportLog::default();
    net.set_sink(log.clone());

    let summary = net.run().unwrap();

    assert_eq!(net.station(a0).sent(), 1);
    assert_eq!(net.station(b0).received(), 1);
    assert_eq!(summary.frames_delivered, 1);
    assert_eq!(summary.hop_deliveries, 3);
    assert_eq!(net.frames().in_use(), 0);
    assert_eq!(net.router(topo.routers[0]).forwarded(), 1);
    assert_eq!(net.router(topo.routers[1]).forwarded(), 1);

    // 三跳：a0 -> r0 -> r1 -> b0
    let hops: Vec<(EndpointId, EndpointId)> = log
        .events()
        .iter()
        .filter_map(|ev| match ev.kind {
            ReportEventKind::Delivery { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        hops,
        vec![
            (EndpointId::from(a0), EndpointId::from(topo.routers[0])),
            (EndpointId::from(topo.routers[0]), EndpointId::from(topo.routers[1])),
            (EndpointId::from(topo.routers[1]), EndpointId::from(b0)),
        ]
    );

    // t=0 与 t=2000 各一次，每次两个路由器
    assert_eq!(
        log.count(|k| matches!(k, ReportEventKind::RouteSnapshot { .. })),
        4
    );
    assert_eq!(net.stats.route_updates, 2);
    for r in topo.routers {
        let row = net.router(r).routing_table().default_route().copied().unwrap();
        assert!(topo.links.contains(&row.link));
        let cost = net.medium(row.link).cost().unwrap();
        assert_eq!(row.cost, cost);
        let cheapest = topo.links.iter().filter_map(|l| net.medium(*l).cost()).min().unwrap();
        assert_eq!(row.cost, cheapest);
    }
}

#[test]
fn link_costs_stay_in_configured_range() {
    let mut net = Network::new(SimConfig {
        link_cost_min: 3,
        link_cost_max: 5,
        ..quiet_config(10_000)
    });
    let topo = build_two_segment(
        &mut net,
        &TwoSegmentOpts {
            stations_per_segment: 1,
            parallel_links: 4,
        },
    )
    .unwrap();
    let log = ReportLog::default();
    net.set_sink(log.clone());
    net.run().unwrap();

    let costs: Vec<u32> = log
        .events()
        .iter()
        .filter_map(|ev| match ev.kind {
            ReportEventKind::LinkCost { cost, .. } => Some(cost),
            _ => None,
        })
        .collect();
    // 5 个路由边界（0, 2000, ..., 8000），每次 4 条链路
    assert_eq!(costs.len(), 20);
    assert!(costs.iter().all(|c| (3..=5).contains(c)));
    for l in &topo.links {
        assert!((3..=5).contains(&net.medium(*l).cost().unwrap()));
    }
}

#[test]
fn same_seed_gives_same_run() {
    let run = |seed| {
        let mut net = Network::new(SimConfig {
            seed,
            arrival_mean: 0.05,
            duration_us: 20_000,
            ..SimConfig::default()
        });
        build_two_segment(&mut net, &TwoSegmentOpts::default()).unwrap();
        let log = ReportLog::default();
        net.set_sink(log.clone());
        let summary = net.run().unwrap();
        (summary, log.events())
    };
    assert_eq!(run(11), run(11));
}

#[test]
fn lone_station_has_no_destination() {
    let mut net = Network::new(quiet_config(1_000));
    let (_, stations) = build_single_bus(&mut net, &SingleBusOpts { stations: 1 }).unwrap();
    net.station_mut(stations[0]).push_outstanding(1);

    let err = net.run().unwrap_err();
    assert!(matches!(err, SimError::NoDestination { station } if station == stations[0]));
}

#[test]
fn station_without_gateway_has_no_viable_path() {
    let mut net = Network::new(quiet_config(1_000));
    let a = net.add_station("a");
    let b = net.add_station("b");
    net.add_bus("busA", &[a.into()]).unwrap();
    net.add_bus("busB", &[b.into()]).unwrap();
    net.set_destination(a, b).unwrap();
    net.station_mut(a).push_outstanding(1);

    let err = net.run().unwrap_err();
    assert!(matches!(err, SimError::NoViablePath { to, .. } if to == b));
}

#[test]
fn topology_registration_rejects_bad_wiring() {
    let mut net = Network::new(quiet_config(1_000));
    let s = net.add_station("s");
    let r0 = net.add_router("r0");
    let r1 = net.add_router("r1");

    assert!(matches!(net.add_link("loop", r0, r0), Err(SimError::InvalidTopology(_))));
    let link = net.add_link("link0", r0, r1).unwrap();
    assert!(matches!(net.attach(link, s.into()), Err(SimError::InvalidTopology(_))));
    assert!(matches!(
        net.attach(MediumId(99), s.into()),
        Err(SimError::UnknownMedium(MediumId(99)))
    ));

    net.add_bus("bus0", &[r0.into()]).unwrap();
    assert!(matches!(
        net.add_bus("bus1", &[r0.into()]),
        Err(SimError::InvalidTopology(_))
    ));
    assert!(matches!(net.set_destination(s, s), Err(SimError::InvalidTopology(_))));
}

#[test]
fn router_and_station_collide_on_destination_bus() {
    let mut net = Network::new(quiet_config(10_000));
    let topo = build_two_segment(&mut net, &TwoSegmentOpts::default()).unwrap();
    let a0 = topo.segments[0][0];
    let b0 = topo.segments[1][0];
    let r1 = topo.routers[1];
    let bus_b = topo.buses[1];
    net.station_mut(a0).push_outstanding(1);
    let log = ReportLog::default();
    net.set_sink(log.clone());

    // a0 的帧在 t=128 到达 r1，r1 在 t=150 的时隙上总线；让 b0 在同一时隙发自己的帧
    loop {
        net.tick().unwrap();
        if net.now() == SimTime(100) {
            net.station_mut(b0).push_outstanding(1);
        }
        if !net.advance().unwrap() {
            break;
        }
    }

    let events = log.events();
    let detected: Vec<u64> = events
        .iter()
        .filter_map(|ev| match ev.kind {
            ReportEventKind::CollisionDetected { medium, transmitters } if medium == bus_b => {
                assert_eq!(transmitters, 2);
                Some(ev.t_us)
            }
            _ => None,
        })
        .collect();
    assert_eq!(detected.first(), Some(&150));

    let first_round: Vec<(EndpointId, u32)> = events
        .iter()
        .filter(|ev| ev.t_us == 170)
        .filter_map(|ev| match ev.kind {
            ReportEventKind::Collision {
                endpoint,
                medium,
                backoff_slots,
            } if medium == bus_b => Some((endpoint, backoff_slots)),
            _ => None,
        })
        .collect();
    assert_eq!(first_round.len(), 2, "{first_round:?}");
    assert_eq!(first_round[0].0, EndpointId::from(b0));
    assert_eq!(first_round[1].0, EndpointId::from(r1));
    assert!(first_round.iter().all(|(_, b)| (1..=2).contains(b)));

    let router = net.router(r1);
    assert!(router.total_collisions() >= 1);
    assert_eq!(router.backoff(), 0);
    assert!(!router.is_bus_busy());
    assert_eq!(router.link_queue_len(), 0);

    // 两帧最终都送达
    assert_eq!(net.station(b0).received(), 1);
    assert_eq!(net.station(a0).received(), 1);
    assert_eq!(net.station(a0).sent(), 1);
    assert_eq!(net.station(b0).sent(), 1);
    assert_eq!(net.stats.frames_delivered, 2);
    assert_eq!(net.frames().in_use(), 0);
}

#[test]
fn routes_are_computed_once_without_a_routing_period() {
    let mut net = Network::new(SimConfig {
        routing_period_us: 0,
        ..quiet_config(3_000)
    });
    let topo = build_two_segment(&mut net, &TwoSegmentOpts::default()).unwrap();
    let a0 = topo.segments[0][0];
    let b0 = topo.segments[1][0];
    net.station_mut(a0).push_outstanding(1);

    let summary = net.run().unwrap();

    assert_eq!(net.stats.route_updates, 1);
    assert_eq!(summary.frames_delivered, 1);
    assert_eq!(net.station(b0).received(), 1);
    for r in topo.routers {
        assert!(net.router(r).routing_table().default_route().is_some());
    }
}

#[test]
fn run_rejects_config_that_would_stall_the_clock() {
    for config in [
        SimConfig {
            slot_us: 0,
            ..quiet_config(1_000)
        },
        SimConfig {
            segment_length_m: 0,
            ..quiet_config(1_000)
        },
        SimConfig {
            bus_bandwidth_bps: 0,
            ..quiet_config(1_000)
        },
    ] {
        let mut net = Network::new(config);
        build_single_bus(&mut net, &SingleBusOpts::default()).unwrap();
        let err = net.run().unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)), "{err}");
    }
}
