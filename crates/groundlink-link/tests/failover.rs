use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use groundlink_frame::{decode_frames, encode_update};
use groundlink_link::GroundLink;
use groundlink_registry::{Registry, Update, Value};
use groundlink_transport::{
    memory_link, spawn_transport, status_channel, MemoryPeer, MemoryRemote, TransportConfig,
};

const WAIT: Duration = Duration::from_secs(3);

fn config() -> TransportConfig {
    TransportConfig {
        retry_interval: Duration::from_millis(15),
        write_timeout: Duration::from_millis(200),
        handoff_timeout: Duration::from_millis(100),
    }
}

fn wait_for(status: &Receiver<String>, expected: &str) {
    let deadline = Instant::now() + WAIT;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match status.recv_timeout(left) {
            Ok(line) if line == expected => return,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    panic!("status line '{expected}' never arrived");
}

fn received(peer: &MemoryPeer, registry: &Registry) -> Vec<Update> {
    let packet = peer.recv_timeout(WAIT).expect("no packet on link");
    decode_frames(&packet, registry)
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

struct Bench {
    registry: Arc<Registry>,
    link: GroundLink,
    primary: MemoryRemote,
    backup: MemoryRemote,
}

fn bench() -> Bench {
    let registry = Arc::new(Registry::reference());
    let (sink, status) = status_channel();
    let (primary_medium, primary) = memory_link("primary", 20);
    let (backup_medium, backup) = memory_link("backup", 256);

    let handles = vec![
        spawn_transport(primary_medium, config(), sink.clone()).unwrap(),
        spawn_transport(backup_medium, config(), sink.clone()).unwrap(),
    ];
    let link = GroundLink::start_with_status(Arc::clone(&registry), handles, sink, status).unwrap();
    assert_eq!(link.links(), ["primary", "backup"]);

    Bench {
        registry,
        link,
        primary,
        backup,
    }
}

#[test]
fn priority_failover_end_to_end() {
    let bench = bench();
    let registry = &bench.registry;
    let kill = registry
        .bind("switches", "softKill", Some(Value::Bool(true)))
        .unwrap();

    // Only the backup is up.
    let backup = bench.backup.connect();
    wait_for(bench.link.status(), "active link: backup");
    bench.link.send(vec![kill.clone()]).unwrap();
    assert_eq!(received(&backup, registry), vec![kill.clone()]);

    // The primary comes up and takes over.
    let primary = bench.primary.connect();
    wait_for(bench.link.status(), "active link: primary");
    let enable = registry
        .bind("controller", "enabled", Some(Value::Bool(true)))
        .unwrap();
    bench.link.send(vec![enable.clone()]).unwrap();
    assert_eq!(received(&primary, registry), vec![enable]);
    assert!(backup.drain().is_empty());

    // Updates from the vehicle arrive over the active link.
    let voltage = registry
        .bind("power", "voltage", Some(Value::Float(11.5)))
        .unwrap();
    primary.send(encode_update(&voltage).unwrap()).unwrap();
    assert_eq!(bench.link.updates().recv_timeout(WAIT).unwrap(), voltage);

    // The primary drops; traffic falls back.
    primary.disconnect();
    wait_for(bench.link.status(), "active link: backup");
    bench.link.send(vec![kill.clone()]).unwrap();
    assert_eq!(received(&backup, registry), vec![kill.clone()]);

    // Both down: sends are dropped without blocking.
    backup.disconnect();
    wait_for(bench.link.status(), "no active link");
    let started = Instant::now();
    for _ in 0..10 {
        bench.link.send(vec![kill.clone()]).unwrap();
    }
    assert!(started.elapsed() < WAIT);
}

#[test]
fn small_mtu_link_splits_batches_into_packets() {
    let bench = bench();
    let registry = &bench.registry;
    let primary = bench.primary.connect();
    wait_for(bench.link.status(), "active link: primary");

    let batch: Vec<Update> = ["yaw", "pitch", "roll", "force"]
        .iter()
        .map(|name| {
            registry
                .bind("desires", name, Some(Value::Int(2)))
                .unwrap()
        })
        .collect();
    bench.link.send(batch.clone()).unwrap();

    let mut delivered = Vec::new();
    while delivered.len() < batch.len() {
        let packet = primary.recv_timeout(WAIT).expect("missing packet");
        assert!(packet.len() <= 20);
        delivered.extend(decode_frames(&packet, registry).into_iter().map(|r| r.unwrap()));
    }
    // Ints widen to the declared float kind.
    assert_eq!(delivered, batch);
    assert_eq!(delivered[0].value(), Some(Value::Float(2.0)));
}

#[test]
fn queries_round_trip_as_queries() {
    let bench = bench();
    let registry = &bench.registry;
    let backup = bench.backup.connect();
    wait_for(bench.link.status(), "active link: backup");

    let query = registry.bind("led", "brightness", None).unwrap();
    backup.send(encode_update(&query).unwrap()).unwrap();
    let update = bench.link.updates().recv_timeout(WAIT).unwrap();
    assert!(update.is_query());
    assert_eq!(update.name(), "brightness");
}
