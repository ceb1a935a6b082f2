use crate::fake_node::{test_config, FakeNetwork, FakeNode};
use chrono::Utc;
use nodemap::callsign::Callsign;
use nodemap::config::CrawlMode;
use nodemap::crawler::{Coordinator, CrawlOptions};
use nodemap::parser::parse_routes;
use nodemap::storage::{load_snapshot, JsonFileStorage, NodeRecord, RunStatus, Storage, TopologyStore};
use tempfile::TempDir;

const A: &str = "KC1JMH-15";
const B: &str = "KS1R-15";
const C: &str = "N1CCC-15";
const D: &str = "N1DDD-15";

fn call(s: &str) -> Callsign {
    s.parse().unwrap()
}

/// A reaches B directly; C is only reachable through B; D is blocked at A;
/// E is heard at A without an SSID.
fn abc_network() -> Vec<FakeNode> {
    vec![
        FakeNode::new(A, "BURG")
            .routes("> 1 KS1R-15   200 6\n> 1 N1DDD-15  0 0")
            .nodes("SHOP:KS1R-15  FAR:N1CCC-15  DEAD:N1DDD-15")
            .heard(1, "KS1R-15    00:00:01:00\nW1EEE      00:00:02:00")
            .link("C 1 KS1R-15", B)
            .link("C SHOP", B),
        FakeNode::new(B, "SHOP")
            .routes("> 1 KC1JMH-15 200 6\n> 2 N1CCC-15  200 3")
            .nodes("BURG:KC1JMH-15  FAR:N1CCC-15")
            .heard(1, "KC1JMH-15  00:00:00:30")
            .info("Shop node in Camden, ME  Grid: FN54sf")
            .link("C 1 KC1JMH-15", A)
            .link("C 2 N1CCC-15", C)
            .link("C FAR", C),
        FakeNode::new(C, "FAR")
            .routes("> 1 KS1R-15   200 3")
            .nodes("SHOP:KS1R-15"),
    ]
}

fn edges(topology: &TopologyStore) -> Vec<(String, String)> {
    topology
        .connections()
        .iter()
        .map(|c| (c.from.clone(), c.to.clone()))
        .collect()
}

fn edge(from: &str, to: &str) -> (String, String) {
    (from.to_string(), to.to_string())
}

#[tokio::test]
async fn test_far_node_reached_through_neighbor() {
    let network = FakeNetwork::start(abc_network()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(network.addr, A, dir.path());

    let mut coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.failed, 0);
    assert!(!summary.interrupted);

    let topology = coordinator.topology();
    let edges = edges(topology);
    assert_eq!(edges.len(), 4);
    assert!(edges.contains(&edge(A, B)));
    assert!(edges.contains(&edge(B, A)));
    assert!(edges.contains(&edge(B, C)));
    assert!(edges.contains(&edge(C, B)));

    let a = topology.get(A).unwrap();
    let b = topology.get(B).unwrap();
    let c = topology.get(C).unwrap();
    assert_eq!(a.hop_distance, Some(0));
    assert_eq!(b.hop_distance, Some(1));
    assert_eq!(c.hop_distance, Some(2));
    assert_eq!(c.path, vec![B.to_string()]);
    assert!(c.is_complete());

    assert_eq!(b.primary_alias.as_deref(), Some("SHOP"));
    assert!(b.gridsquare.is_some());
    assert!(b.applications.contains(&"BBS".to_string()));
    assert_eq!(b.neighbor_ports.get("N1CCC"), Some(&2));

    // C is only ever reached from B
    assert!(network
        .commands_at(A)
        .iter()
        .all(|command| !command.contains("N1CCC") && !command.contains("FAR")));
    assert!(network
        .commands_at(B)
        .contains(&"C 2 N1CCC-15".to_string()));

    let saved = load_snapshot(&dir.path().join("topology.json")).unwrap();
    assert_eq!(saved.connections(), topology.connections());
    assert_eq!(saved.metadata.status, RunStatus::Completed);
    assert_eq!(saved.metadata.visited_count, 3);

    let csv = std::fs::read_to_string(dir.path().join("connections.csv")).unwrap();
    assert_eq!(csv.lines().count(), 5);
    assert!(csv.contains("KS1R-15,N1CCC-15,2,200,false"));
}

#[tokio::test]
async fn test_blocked_route_is_not_an_edge() {
    let network = FakeNetwork::start(abc_network()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(network.addr, A, dir.path());

    let mut coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    let topology = coordinator.topology();
    let a = topology.get(A).unwrap();
    assert_eq!(a.quality_to("N1DDD"), Some(0));
    assert!(!a.neighbors.contains("N1DDD"));
    assert!(!a.unexplored_neighbors.contains(&call(D)));
    assert!(topology.find(&call(D)).is_none());
    assert!(topology
        .connections()
        .iter()
        .all(|c| c.from != D && c.to != D));
    assert!(network
        .commands()
        .iter()
        .all(|(_, command)| !command.contains("N1DDD") && !command.contains("DEAD")));
}

#[tokio::test]
async fn test_heard_station_without_ssid_is_ignored() {
    let network = FakeNetwork::start(abc_network()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(network.addr, A, dir.path());

    let mut coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    let topology = coordinator.topology();
    for record in topology.records() {
        assert_ne!(record.callsign.base(), "W1EEE");
        assert!(!record.neighbors.contains("W1EEE"));
        assert!(record
            .unexplored_neighbors
            .iter()
            .all(|n| n.base() != "W1EEE"));
    }
    assert!(network
        .commands()
        .iter()
        .all(|(_, command)| !command.contains("W1EEE")));
}

#[tokio::test]
async fn test_failed_connect_is_recorded_as_intermittent() {
    let network = FakeNetwork::start(vec![
        FakeNode::new(A, "BURG").routes("> 1 KS1R-15   200 6"),
        FakeNode::new(B, "SHOP").routes("> 1 KC1JMH-15 200 6"),
    ])
    .await;
    let dir = TempDir::new().unwrap();
    let config = test_config(network.addr, A, dir.path());

    let mut coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(summary.visited, 1);
    assert_eq!(summary.failed, 1);

    let topology = coordinator.topology();
    assert_eq!(topology.intermittent().failures(A, B).len(), 1);
    assert!(topology.get(A).unwrap().intermittent_neighbors.contains("KS1R"));
    // Still known, just not reached
    assert!(topology.get(B).unwrap().is_stub());
    assert!(topology.connections().is_empty());
}

#[tokio::test]
async fn test_interrupt_exports_partial_then_resume_finishes() {
    let dir = TempDir::new().unwrap();

    let mut stalling = abc_network();
    stalling[1] = stalling[1].clone().stall_on("INFO");
    let network = FakeNetwork::start(stalling).await;
    let stalled = network.stalled();

    let config = test_config(network.addr, A, dir.path());
    let mut coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    let summary = coordinator
        .run_until(async move { stalled.notified().await })
        .await
        .unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.visited, 1);
    assert_eq!(summary.partial, 1);
    drop(network);

    let saved = load_snapshot(&dir.path().join("topology.json")).unwrap();
    assert!(saved.metadata.interrupted);
    assert_eq!(saved.metadata.status, RunStatus::Interrupted);
    assert!(saved.get(A).unwrap().is_complete());
    let b = saved.get(B).unwrap();
    assert!(b.partial);
    assert!(!b.visited);
    assert_eq!(b.quality_to("N1CCC"), Some(200));
    assert_eq!(b.unexplored_neighbors, vec![call(C)]);

    // Resume against a healthy network
    let network = FakeNetwork::start(abc_network()).await;
    let config = test_config(network.addr, A, dir.path());
    let options = CrawlOptions {
        resume: true,
        ..Default::default()
    };
    let mut coordinator = Coordinator::new(config, options).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(summary.visited, 2);
    assert!(!network.commands_at(A).contains(&"PORTS".to_string()));
    assert!(network
        .commands_at(B)
        .contains(&"C 2 N1CCC-15".to_string()));

    let topology = coordinator.topology();
    assert!(topology.get(B).unwrap().is_complete());
    assert!(topology.get(C).unwrap().is_complete());
    assert_eq!(edges(topology).len(), 4);
}

#[tokio::test]
async fn test_resume_does_not_resurrect_blocked_neighbor() {
    let dir = TempDir::new().unwrap();

    let mut a = NodeRecord::new(call(A));
    a.visited = true;
    a.last_visited = Some(Utc::now());
    a.hop_distance = Some(0);
    a.set_routes(parse_routes("> 1 KS1R-15 200 6\n> 1 N1DDD-15 0 0\n"));
    a.unexplored_neighbors = vec![call(B), call(D)];
    let mut snapshot = TopologyStore::new();
    snapshot.merge(a);
    JsonFileStorage::new(dir.path().join("topology.json"))
        .save(&snapshot)
        .unwrap();

    let network = FakeNetwork::start(vec![
        FakeNode::new(A, "BURG")
            .routes("> 1 KS1R-15   200 6\n> 1 N1DDD-15  0 0")
            .link("C 1 KS1R-15", B)
            .link("C 1 N1DDD-15", D),
        FakeNode::new(B, "SHOP").routes("> 1 KC1JMH-15 200 6"),
        FakeNode::new(D, "DEAD").routes("> 1 KC1JMH-15 200 6"),
    ])
    .await;
    let config = test_config(network.addr, A, dir.path());
    let options = CrawlOptions {
        resume: true,
        ..Default::default()
    };

    let mut coordinator = Coordinator::new(config, options).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(summary.visited, 1);
    assert!(network
        .commands_at(A)
        .contains(&"C 1 KS1R-15".to_string()));
    assert!(network.commands_at(D).is_empty());
    assert!(network
        .commands()
        .iter()
        .all(|(_, command)| !command.contains("N1DDD")));
}

#[tokio::test]
async fn test_update_mode_skips_known_nodes_and_reaudit_revisits() {
    let network = FakeNetwork::start(abc_network()).await;
    let dir = TempDir::new().unwrap();

    let config = test_config(network.addr, A, dir.path());
    let mut coordinator = Coordinator::new(config.clone(), CrawlOptions::default()).unwrap();
    coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();
    let after_first = network.commands().len();

    let mut coordinator = Coordinator::new(config.clone(), CrawlOptions::default()).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(summary.visited, 0);
    assert_eq!(summary.skipped, 3);
    assert_eq!(network.commands().len(), after_first);
    assert_eq!(edges(coordinator.topology()).len(), 4);

    let options = CrawlOptions {
        mode: Some(CrawlMode::Reaudit),
        ..Default::default()
    };
    let mut coordinator = Coordinator::new(config, options).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(summary.visited, 3);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn test_new_only_mode_visits_only_stubs() {
    let dir = TempDir::new().unwrap();

    // First pass: B cannot reach C, which is left behind as a stub
    let mut broken = abc_network();
    broken[1] = FakeNode::new(B, "SHOP")
        .routes("> 1 KC1JMH-15 200 6\n> 2 N1CCC-15  200 3")
        .nodes("BURG:KC1JMH-15  FAR:N1CCC-15")
        .link("C 1 KC1JMH-15", A);
    let network = FakeNetwork::start(broken).await;
    let config = test_config(network.addr, A, dir.path());
    let mut coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(summary.visited, 2);
    assert_eq!(summary.failed, 1);
    assert!(coordinator.topology().get(C).unwrap().is_stub());
    drop(network);

    let network = FakeNetwork::start(abc_network()).await;
    let config = test_config(network.addr, A, dir.path());
    let options = CrawlOptions {
        mode: Some(CrawlMode::NewOnly),
        ..Default::default()
    };
    let mut coordinator = Coordinator::new(config, options).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(summary.visited, 1);
    assert_eq!(summary.skipped, 2);
    assert!(!network.commands_at(A).contains(&"PORTS".to_string()));
    assert!(!network.commands_at(B).contains(&"PORTS".to_string()));
    assert!(network.commands_at(C).contains(&"PORTS".to_string()));
    assert!(network
        .commands_at(B)
        .contains(&"C 2 N1CCC-15".to_string()));

    let topology = coordinator.topology();
    let c = topology.get(C).unwrap();
    assert!(c.is_complete());
    assert_eq!(c.hop_distance, Some(2));
    assert_eq!(edges(topology).len(), 4);
}

#[tokio::test]
async fn test_explicit_start_node_seeds_the_crawl() {
    let network = FakeNetwork::start(abc_network()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(network.addr, A, dir.path());
    let options = CrawlOptions {
        start: Some(B.to_string()),
        ..Default::default()
    };

    let mut coordinator = Coordinator::new(config, options).unwrap();
    let summary = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(summary.visited, 2);
    assert!(!network.commands_at(A).contains(&"PORTS".to_string()));
    assert!(network
        .commands_at(B)
        .contains(&"C 2 N1CCC-15".to_string()));

    let topology = coordinator.topology();
    let b = topology.get(B).unwrap();
    let c = topology.get(C).unwrap();
    assert_eq!(b.hop_distance, Some(1));
    assert_eq!(c.hop_distance, Some(2));
    assert_eq!(c.path, vec![B.to_string()]);
    // The local node is known from B's routes but never visited
    assert!(topology.get(A).unwrap().is_stub());

    let edges = edges(topology);
    assert_eq!(edges.len(), 2);
    assert!(edges.contains(&edge(B, C)));
    assert!(edges.contains(&edge(C, B)));
    assert_eq!(topology.metadata.start_node.as_deref(), Some(B));
}

#[tokio::test]
async fn test_rejected_login_aborts_and_records_failure() {
    let network = FakeNetwork::start(abc_network()).await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(network.addr, A, dir.path());
    config.node.password = "wrong".to_string();

    let mut coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    let result = coordinator
        .run_until(std::future::pending::<()>())
        .await;
    assert!(result.is_err());

    let saved = load_snapshot(&dir.path().join("topology.json")).unwrap();
    assert_eq!(saved.metadata.status, RunStatus::Failed);
    assert!(network.commands().is_empty());
}
