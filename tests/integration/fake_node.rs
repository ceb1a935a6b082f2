//! In-process fake packet network
//!
//! One TCP listener plays the local node's telnet console. Connect commands
//! move the session to other fake nodes, the way a real node hands a session
//! across the radio link.

use nodemap::config::{Config, CrawlMode, CrawlerConfig, NodeConfig, OutputConfig, TimeoutConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "hunter2";

/// One node of the fake network
#[derive(Debug, Clone)]
pub struct FakeNode {
    pub call: String,
    pub alias: String,
    pub ports: String,
    pub nodes: String,
    pub routes: String,
    pub heard: HashMap<u8, String>,
    pub info: String,
    pub help: String,
    /// Upper-cased connect command -> callsign of the node it reaches
    pub links: HashMap<String, String>,
    /// Stop answering (but keep the link up) when this command arrives
    pub stall_on: Option<String>,
}

impl FakeNode {
    pub fn new(call: &str, alias: &str) -> Self {
        Self {
            call: call.to_string(),
            alias: alias.to_string(),
            ports: "  1 145.050 MHz 1200 baud\n  2 AXIP link".to_string(),
            nodes: String::new(),
            routes: String::new(),
            heard: HashMap::new(),
            info: format!("LinBPQ node {}", alias),
            help: "CONNECT BYE INFO NODES PORTS ROUTES MHEARD USERS BBS CHAT".to_string(),
            links: HashMap::new(),
            stall_on: None,
        }
    }

    pub fn routes(mut self, routes: &str) -> Self {
        self.routes = routes.to_string();
        self
    }

    pub fn nodes(mut self, nodes: &str) -> Self {
        self.nodes = nodes.to_string();
        self
    }

    pub fn heard(mut self, port: u8, heard: &str) -> Self {
        self.heard.insert(port, heard.to_string());
        self
    }

    pub fn info(mut self, info: &str) -> Self {
        self.info = info.to_string();
        self
    }

    pub fn link(mut self, command: &str, target: &str) -> Self {
        self.links
            .insert(command.to_uppercase(), target.to_string());
        self
    }

    pub fn stall_on(mut self, command: &str) -> Self {
        self.stall_on = Some(command.to_string());
        self
    }

    fn id(&self) -> String {
        format!("{}:{}", self.alias, self.call)
    }

    fn header(&self, title: &str) -> String {
        format!("{}}} {}\r", self.id(), title)
    }
}

/// A running fake network
pub struct FakeNetwork {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<(String, String)>>>,
    stalled: Arc<Notify>,
    accept: JoinHandle<()>,
}

impl FakeNetwork {
    /// Starts the network; the first node is the local node
    pub async fn start(nodes: Vec<FakeNode>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let local = nodes[0].call.clone();
        let nodes: Arc<HashMap<String, FakeNode>> =
            Arc::new(nodes.into_iter().map(|n| (n.call.clone(), n)).collect());
        let log = Arc::new(Mutex::new(Vec::new()));
        let stalled = Arc::new(Notify::new());

        let accept = {
            let log = log.clone();
            let stalled = stalled.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(
                        stream,
                        local.clone(),
                        nodes.clone(),
                        log.clone(),
                        stalled.clone(),
                    ));
                }
            })
        };

        Self {
            addr,
            log,
            stalled,
            accept,
        }
    }

    /// Every (node, command) pair received, in order
    pub fn commands(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }

    /// Commands received while the session sat at `node`
    pub fn commands_at(&self, node: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|(at, _)| at == node)
            .map(|(_, command)| command)
            .collect()
    }

    /// Resolves once a node has stalled
    pub fn stalled(&self) -> Arc<Notify> {
        self.stalled.clone()
    }
}

impl Drop for FakeNetwork {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

async fn serve(
    stream: TcpStream,
    local: String,
    nodes: Arc<HashMap<String, FakeNode>>,
    log: Arc<Mutex<Vec<(String, String)>>>,
    stalled: Arc<Notify>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    if writer.write_all(b"user: ").await.is_err() {
        return;
    }
    if read_line(&mut reader).await.is_none() {
        return;
    }
    if writer.write_all(b"password: ").await.is_err() {
        return;
    }
    let Some(password) = read_line(&mut reader).await else {
        return;
    };
    if password != PASSWORD {
        let _ = writer.write_all(b"Invalid password\r").await;
        return;
    }

    let mut current = local;
    let welcome = format!("Welcome to the test network\r{}", nodes[&current].header(""));
    if writer.write_all(welcome.as_bytes()).await.is_err() {
        return;
    }

    while let Some(line) = read_line(&mut reader).await {
        let node = &nodes[&current];
        log.lock().unwrap().push((current.clone(), line.clone()));

        if node.stall_on.as_deref() == Some(line.as_str()) {
            stalled.notify_one();
            std::future::pending::<()>().await;
        }

        let upper = line.to_uppercase();
        let mut words = upper.split_whitespace();
        let reply = match words.next() {
            Some("BYE") => return,
            Some("PORTS") => format!("{}{}\r", node.header("Ports"), node.ports),
            Some("NODES") => format!("{}{}\r", node.header("Nodes"), node.nodes),
            Some("ROUTES") => format!("{}{}\r", node.header("Routes"), node.routes),
            Some("MH") => {
                let port = words.next().and_then(|p| p.parse::<u8>().ok()).unwrap_or(0);
                let heard = node.heard.get(&port).cloned().unwrap_or_default();
                format!("{}{}\r", node.header(&format!("Heard List for Port {}", port)), heard)
            }
            Some("INFO") => format!("{}{}\r", node.header(""), node.info),
            Some("?") => format!("{}{}\r", node.header(""), node.help),
            Some("C") => match node.links.get(&upper) {
                Some(target) => {
                    let reply = format!(
                        "{}Connected to {}\r",
                        node.header(""),
                        nodes[target].id()
                    );
                    current = target.clone();
                    reply
                }
                None => format!("{}Failure with {}\r", node.header(""), upper.get(2..).unwrap_or("")),
            },
            _ => format!("{}Invalid command\r", node.header("")),
        };

        if writer
            .write_all(reply.replace('\n', "\r").as_bytes())
            .await
            .is_err()
        {
            return;
        }
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\r', &mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        let line = String::from_utf8_lossy(&buf).trim().to_string();
        if !line.is_empty() {
            return Some(line);
        }
    }
}

/// A configuration pointing at `addr` with test-sized timeouts
pub fn test_config(addr: SocketAddr, local: &str, dir: &Path) -> Config {
    Config {
        node: NodeConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            callsign: local.to_string(),
            username: "tester".to_string(),
            password: PASSWORD.to_string(),
        },
        crawler: CrawlerConfig {
            max_hops: 5,
            mode: CrawlMode::Update,
            politeness_delay: 0,
            heard_stale_after: 86_400,
            ssid_freshness: 604_800,
            start: None,
        },
        timeouts: TimeoutConfig {
            connect_base: 2_000,
            connect_per_hop: 500,
            connect_ceiling: 5_000,
            command: 2_000,
            poll_interval: 20,
            stable_polls: 3,
            visit_base: 15_000,
            visit_per_hop: 5_000,
        },
        output: OutputConfig {
            topology_path: dir.join("topology.json").to_string_lossy().into_owned(),
            connections_csv_path: dir.join("connections.csv").to_string_lossy().into_owned(),
        },
    }
}
