//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a topology crawl, including:
//! - Seeding the traversal queue (local node, explicit start, or resume)
//! - Applying the crawl-mode policy to every dequeued node
//! - Driving each visit through its phases over one console session
//! - Recording failures, partial visits and discovered neighbors
//! - Checkpointing the topology and exporting it on interrupt

use crate::callsign::Callsign;
use crate::config::{Config, CrawlMode};
use crate::crawler::scheduler::{EnqueueRejection, PathfindingQueue, TraversalCandidate};
use crate::output::export_all;
use crate::parser::{
    parse_commands, parse_info, parse_mheard, parse_nodes, parse_ports, parse_prompt_identity,
    parse_routes,
};
use crate::resolver::{AddressResolver, ConnectPlan};
use crate::state::VisitPhase;
use crate::storage::{JsonFileStorage, NodeRecord, RunStatus, Storage, TopologyStore};
use crate::transport::{Connector, ReadEnd, Session, TransportError, TransportResult};
use crate::Result;
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Per-run overrides on top of the configuration file
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Overrides `crawler.mode`
    pub mode: Option<CrawlMode>,

    /// Continue from the unexplored neighbors of the existing snapshot
    pub resume: bool,

    /// Overrides `crawler.start`
    pub start: Option<String>,

    /// Overrides `crawler.max-hops`
    pub max_hops: Option<u32>,

    /// Hash of the configuration file, stored in crawl metadata
    pub config_hash: Option<String>,
}

/// What a crawl run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub visited: usize,
    pub partial: usize,
    pub failed: usize,
    pub skipped: usize,
    pub interrupted: bool,
    pub total_nodes: usize,
    pub total_connections: usize,
}

/// Result of one visit attempt
#[derive(Debug)]
enum VisitOutcome {
    /// Every phase ran
    Complete(NodeRecord),

    /// Connected, but the visit ended early
    Partial {
        record: NodeRecord,
        phase: VisitPhase,
        reason: String,
    },

    /// Never reached the node
    Failed(TransportError),
}

/// The visit in flight, kept outside the visit future so an interrupt can
/// still persist what was collected
#[derive(Debug)]
struct ActiveVisit {
    record: NodeRecord,
    phase: VisitPhase,
}

/// Main crawler coordinator structure
///
/// Owns all crawl state: there is exactly one console session open at a
/// time and nodes are visited strictly one after another.
pub struct Coordinator {
    config: Config,
    mode: CrawlMode,
    local: Callsign,
    start: Option<Callsign>,
    max_hops: u32,
    resume: bool,
    connector: Connector,
    resolver: AddressResolver,
    queue: PathfindingQueue,
    topology: TopologyStore,
    snapshot: TopologyStore,
    storage: JsonFileStorage,
    csv_path: PathBuf,
    /// Base callsigns finished (or skipped by policy) this run
    visited: HashSet<String>,
    active: Option<ActiveVisit>,
    summary: CrawlSummary,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Loads the existing topology document, if any. It serves as the
    /// snapshot the crawl mode is judged against and as the starting point
    /// of the new topology.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `options` - Command-line overrides
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(NodemapError)` - Bad callsign or unreadable snapshot
    pub fn new(config: Config, options: CrawlOptions) -> Result<Self> {
        let local: Callsign = config.node.callsign.parse()?;
        let mode = options.mode.unwrap_or(config.crawler.mode);
        let max_hops = options.max_hops.unwrap_or(config.crawler.max_hops);

        let start = match options.start.as_ref().or(config.crawler.start.as_ref()) {
            Some(raw) => {
                let start: Callsign = raw.parse()?;
                // Starting at ourselves is the default crawl
                (!start.same_base(&local)).then_some(start)
            }
            None => None,
        };

        let storage = JsonFileStorage::new(&config.output.topology_path);
        let snapshot = storage.load()?.unwrap_or_default();
        if !snapshot.is_empty() {
            tracing::info!(
                "Loaded snapshot with {} nodes from {}",
                snapshot.len(),
                storage.location().display()
            );
        }

        let mut topology = snapshot.clone();
        let meta = &mut topology.metadata;
        meta.started_at = Some(Utc::now());
        meta.finished_at = None;
        meta.status = RunStatus::Running;
        meta.mode = Some(mode.as_str().to_string());
        meta.local_node = Some(local.to_string());
        meta.start_node = start.as_ref().map(ToString::to_string);
        meta.max_hops = Some(max_hops);
        meta.config_hash = options.config_hash.clone();
        meta.interrupted = false;

        let heard_stale_after = config.crawler.heard_stale_after();
        let resolver = AddressResolver::new(config.crawler.ssid_freshness(), heard_stale_after);
        let queue = PathfindingQueue::new(local.clone(), max_hops, heard_stale_after);
        let connector = Connector::new(&config.node, local.clone(), config.timeouts.clone());
        let csv_path = PathBuf::from(&config.output.connections_csv_path);

        Ok(Self {
            config,
            mode,
            local,
            start,
            max_hops,
            resume: options.resume,
            connector,
            resolver,
            queue,
            topology,
            snapshot,
            storage,
            csv_path,
            visited: HashSet::new(),
            active: None,
            summary: CrawlSummary::default(),
        })
    }

    /// The topology as collected so far
    pub fn topology(&self) -> &TopologyStore {
        &self.topology
    }

    /// Runs the crawl until the queue drains or the operator hits Ctrl-C
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the crawl until the queue drains or `shutdown` resolves
    ///
    /// Every visit and every politeness pause is raced against `shutdown`.
    /// When it wins, the visit in flight is kept as a partial record and the
    /// topology is exported before returning.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let start_time = std::time::Instant::now();
        tracing::info!(
            "Starting {} crawl from {} (max {} hops)",
            self.mode.as_str(),
            self.start.as_ref().unwrap_or(&self.local),
            self.max_hops
        );

        self.seed();

        let delay = self.config.crawler.politeness_delay();
        let mut first = true;
        let mut interrupted = false;

        while let Some(candidate) = self.queue.pop() {
            if self.skip_by_policy(&candidate) {
                continue;
            }

            if !first && !delay.is_zero() {
                tokio::select! {
                    _ = &mut shutdown => {
                        interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            first = false;

            let outcome = tokio::select! {
                _ = &mut shutdown => None,
                outcome = self.visit(&candidate) => Some(outcome),
            };

            let Some(outcome) = outcome else {
                interrupted = true;
                self.keep_interrupted_visit(&candidate);
                break;
            };

            if let Err(fatal) = self.apply_outcome(&candidate, outcome) {
                tracing::error!("Aborting crawl: {}", fatal);
                self.finish(RunStatus::Failed)?;
                return Err(fatal.into());
            }

            self.checkpoint()?;

            tracing::info!(
                "Progress: {} visited, {} partial, {} failed, {} queued",
                self.summary.visited,
                self.summary.partial,
                self.summary.failed,
                self.queue.len()
            );
        }

        let status = if interrupted {
            tracing::warn!("Crawl interrupted; exporting what was collected");
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        self.finish(status)?;

        tracing::info!(
            "Crawl {}: {} nodes, {} connections in {:?}",
            status.as_str(),
            self.summary.total_nodes,
            self.summary.total_connections,
            start_time.elapsed()
        );

        Ok(self.summary.clone())
    }

    /// Puts the first candidates on the queue
    fn seed(&mut self) {
        if self.resume {
            let restored = self.resolver.rehydrate(&self.snapshot);
            tracing::info!("Rehydrated {} SSID resolutions from snapshot", restored);

            let reseeded = self.reseed_from_snapshot();
            if reseeded > 0 {
                tracing::info!("Resuming with {} unexplored neighbors", reseeded);
                return;
            }
            tracing::info!("Nothing left to resume; starting over");
        }

        let candidate = match &self.start {
            Some(start) => {
                let target = self.resolver.resolve_ssid(start).unwrap_or_else(|| start.clone());
                TraversalCandidate::start(target)
            }
            None => TraversalCandidate::local(self.local.clone()),
        };
        if let Err(reason) = self.queue.enqueue(candidate) {
            tracing::warn!("Could not seed the crawl: {}", reason);
        }
    }

    /// Re-queues the unexplored neighbors recorded in the snapshot
    ///
    /// A neighbor is only resurrected if its parent's own route table still
    /// shows a non-zero route to it.
    fn reseed_from_snapshot(&mut self) -> usize {
        // Nodes completed during the interrupted run are done
        let run_started = self.snapshot.metadata.started_at;
        for record in self.snapshot.records() {
            let this_run = match (record.last_visited, run_started) {
                (Some(visited), Some(started)) => visited >= started,
                _ => false,
            };
            if record.is_complete() && this_run {
                self.visited.insert(record.callsign.base().to_string());
            }
        }

        let mut candidates = Vec::new();
        for parent in self.snapshot.records().filter(|r| !r.is_stub()) {
            let prefix = self.prefix_below(parent);

            for neighbor in &parent.unexplored_neighbors {
                if self.visited.contains(neighbor.base()) {
                    continue;
                }
                match parent.quality_to(neighbor.base()) {
                    Some(quality) if quality > 0 => {
                        let last_heard = self.resolver.last_heard(neighbor.base());
                        candidates.push(
                            TraversalCandidate::new(neighbor.clone(), prefix.clone(), quality)
                                .with_last_heard(last_heard),
                        );
                    }
                    _ => tracing::debug!(
                        "Not resuming {}: {} no longer routes to it",
                        neighbor,
                        parent.callsign
                    ),
                }
            }
        }

        let mut reseeded = 0;
        for candidate in candidates {
            let target = candidate.target.clone();
            match self.queue.enqueue(candidate) {
                Ok(()) => reseeded += 1,
                Err(reason) => tracing::debug!("Not resuming {}: {}", target, reason),
            }
        }
        reseeded
    }

    /// Path prefix for children of a stored record
    fn prefix_below(&self, record: &NodeRecord) -> Vec<Callsign> {
        if record.callsign.same_base(&self.local) || record.hop_distance == Some(0) {
            return Vec::new();
        }
        let mut prefix: Vec<Callsign> = record.path.iter().filter_map(|hop| hop.parse().ok()).collect();
        prefix.push(record.callsign.clone());
        prefix
    }

    /// Applies the crawl mode to a dequeued candidate
    ///
    /// Returns true if the node is not to be visited. Skipped nodes are
    /// expanded through their stored route table so the crawl still reaches
    /// what lies beyond them.
    fn skip_by_policy(&mut self, candidate: &TraversalCandidate) -> bool {
        let base = candidate.target.base();
        if self.visited.contains(base) {
            tracing::debug!("{} already visited this run", candidate.target);
            return true;
        }

        let Some(previous) = self.snapshot.find(&candidate.target) else {
            return false;
        };
        let skip = match self.mode {
            CrawlMode::Reaudit => false,
            CrawlMode::Update => previous.is_complete(),
            CrawlMode::NewOnly => !previous.is_stub(),
        };
        if !skip {
            return false;
        }

        let previous = previous.clone();
        tracing::info!(
            "Skipping {} ({} mode): already in snapshot",
            previous.callsign,
            self.mode.as_str()
        );
        self.visited.insert(base.to_string());
        self.summary.skipped += 1;

        let observed = previous.last_visited.unwrap_or_else(Utc::now);
        for route in &previous.routes {
            self.resolver.observe_route(&previous.callsign, route, observed);
        }

        let prefix = self.child_prefix(candidate, &previous.callsign);
        let queued = self.expand(&prefix, &previous);
        tracing::debug!("Expanded {} stored neighbors of {}", queued.len(), previous.callsign);
        true
    }

    /// Prefix for the children of `node`, reached through `candidate`
    fn child_prefix(&self, candidate: &TraversalCandidate, node: &Callsign) -> Vec<Callsign> {
        if candidate.is_local {
            return Vec::new();
        }
        let mut prefix = candidate.path_prefix.clone();
        prefix.push(node.clone());
        prefix
    }

    /// Queues the direct route-table neighbors of `record`
    ///
    /// Returns the neighbors that were accepted onto the queue.
    fn expand(&mut self, prefix: &[Callsign], record: &NodeRecord) -> Vec<Callsign> {
        let mut accepted = Vec::new();

        for route in record.routes.iter().filter(|r| r.direct) {
            let target = self
                .resolver
                .resolve_ssid(&route.callsign)
                .unwrap_or_else(|| route.callsign.clone());

            if !route.is_blocked() {
                self.topology.ensure_stub(&target);
            }
            if self.visited.contains(target.base()) {
                continue;
            }

            let candidate = TraversalCandidate::new(target.clone(), prefix.to_vec(), route.quality)
                .with_last_heard(self.resolver.last_heard(target.base()));
            match self.queue.enqueue(candidate) {
                // Already pending over the same path
                Ok(()) | Err(EnqueueRejection::Duplicate) => accepted.push(target),
                Err(reason) => {
                    tracing::debug!("Not queueing {} from {}: {}", target, record.callsign, reason)
                }
            }
        }

        accepted
    }

    /// One plan per hop of the candidate's connect path
    fn plans_for(&self, candidate: &TraversalCandidate) -> Vec<ConnectPlan> {
        let mut via = self.local.clone();
        candidate
            .connect_path()
            .into_iter()
            .map(|hop| {
                let plan = self.resolver.resolve(&hop, &via);
                via = plan.target().clone();
                plan
            })
            .collect()
    }

    /// Visits one node
    ///
    /// The connect chain is bounded by the per-hop timeouts; everything after
    /// it is bounded by the visit deadline, which scales with hop count.
    async fn visit(&mut self, candidate: &TraversalCandidate) -> VisitOutcome {
        let hops = candidate.hops();
        let budget = self.config.timeouts.visit_budget(hops);
        let deadline = Instant::now() + budget;

        let mut record = NodeRecord::new(candidate.target.clone());
        record.hop_distance = Some(hops as u32);
        record.path = candidate.path_prefix.iter().map(ToString::to_string).collect();
        self.active = Some(ActiveVisit {
            record,
            phase: VisitPhase::Connect,
        });

        let plans = self.plans_for(candidate);
        tracing::info!(
            "Visiting {} ({} hop(s), budget {:?})",
            candidate.target,
            hops,
            budget
        );
        for (i, plan) in plans.iter().enumerate() {
            tracing::debug!("  hop {}: {}", i + 1, plan);
        }

        let mut session = match self.connector.connect(&plans, deadline).await {
            Ok(session) => session,
            Err(e) => {
                self.active = None;
                return VisitOutcome::Failed(e);
            }
        };
        self.set_phase(VisitPhase::Ports);

        let collected = tokio::time::timeout_at(deadline, self.collect(&mut session)).await;
        let reason = match collected {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("visit deadline of {:?} reached", budget)),
        };

        self.connector.disconnect(&mut session).await;

        let Some(active) = self.active.take() else {
            return VisitOutcome::Failed(TransportError::LinkLost {
                command: "visit".to_string(),
            });
        };

        match reason {
            None if active.phase.has_all_data() => {
                let mut record = active.record;
                record.visited = true;
                record.partial = false;
                record.last_visited = Some(Utc::now());
                VisitOutcome::Complete(record)
            }
            reason => VisitOutcome::Partial {
                record: active.record,
                phase: active.phase,
                reason: reason.unwrap_or_else(|| "visit ended early".to_string()),
            },
        }
    }

    /// Runs the command phases of a visit over an open session
    async fn collect(&mut self, session: &mut Session<TcpStream>) -> TransportResult<()> {
        let mut phase = VisitPhase::Ports;

        while !phase.has_all_data() {
            match phase.command() {
                Some(command) => {
                    let text = self.run_command(session, command).await?;
                    self.absorb(phase, &text);
                }
                None => self.read_heard_lists(session).await?,
            }
            phase = phase.next().unwrap_or(VisitPhase::Disconnect);
            self.set_phase(phase);
        }

        Ok(())
    }

    /// Folds one command response into the resolver and the visit record
    fn absorb(&mut self, phase: VisitPhase, text: &str) {
        let now = Utc::now();

        match phase {
            VisitPhase::Ports => {
                let ports = parse_ports(text);
                let identity = parse_prompt_identity(text);
                tracing::debug!("{} ports", ports.len());
                self.update(|record| {
                    if let Some(me) = identity.filter(|i| i.callsign.same_base(&record.callsign)) {
                        if me.callsign.has_ssid() {
                            record.callsign = me.callsign;
                        }
                        if me.alias.is_some() {
                            record.primary_alias = me.alias;
                        }
                    }
                    record.ports = ports;
                });
            }
            VisitPhase::Aliases => {
                let aliases = parse_nodes(text);
                tracing::debug!("{} alias entries", aliases.len());
                for entry in &aliases {
                    self.resolver.observe_alias(entry, now);
                }
            }
            VisitPhase::Routes => {
                let routes = parse_routes(text);
                tracing::debug!("{} routes", routes.len());
                let node = self.current_callsign();
                for route in &routes {
                    self.resolver.observe_route(&node, route, now);
                }
                self.update(|record| record.set_routes(routes));
            }
            VisitPhase::Info => {
                let info = parse_info(text);
                self.update(|record| {
                    record.gridsquare = info.gridsquare;
                    record.city = info.city;
                    record.state = info.state;
                    record.node_types = info.node_types;
                });
            }
            VisitPhase::Commands => {
                let list = parse_commands(text);
                tracing::debug!(
                    "{} commands, {} applications",
                    list.commands.len(),
                    list.applications.len()
                );
                self.update(|record| record.applications = list.applications);
            }
            _ => {}
        }
    }

    /// Reads the heard list of every RF port found by `PORTS`
    async fn read_heard_lists(&mut self, session: &mut Session<TcpStream>) -> TransportResult<()> {
        let rf_ports: Vec<u8> = self
            .active
            .as_ref()
            .map(|a| a.record.ports.iter().filter(|p| p.is_rf).map(|p| p.number).collect())
            .unwrap_or_default();

        for port in rf_ports {
            let text = self.run_command(session, &format!("MH {}", port)).await?;
            let now = Utc::now();
            let heard = parse_mheard(&text);
            tracing::debug!("{} stations heard on port {}", heard.len(), port);
            for entry in &heard {
                self.resolver.observe_heard(entry, now);
            }
        }
        Ok(())
    }

    /// Sends one command; a closed stream ends the visit
    async fn run_command(
        &self,
        session: &mut Session<TcpStream>,
        command: &str,
    ) -> TransportResult<String> {
        let reply = session
            .command(command, self.config.timeouts.command_timeout())
            .await?;
        match reply.end {
            ReadEnd::Eof => Err(TransportError::LinkLost {
                command: command.to_string(),
            }),
            ReadEnd::Deadline if reply.text.trim().is_empty() => {
                tracing::warn!("No response to {}", command);
                Ok(reply.text)
            }
            _ => Ok(reply.text),
        }
    }

    fn set_phase(&mut self, phase: VisitPhase) {
        if let Some(active) = self.active.as_mut() {
            active.phase = phase;
        }
    }

    /// Applies collected data to the visit record
    fn update(&mut self, apply: impl FnOnce(&mut NodeRecord)) {
        if let Some(active) = self.active.as_mut() {
            apply(&mut active.record);
        }
    }

    fn current_callsign(&self) -> Callsign {
        self.active
            .as_ref()
            .map(|a| a.record.callsign.clone())
            .unwrap_or_else(|| self.local.clone())
    }

    /// Folds a finished visit into the topology
    ///
    /// Only a rejected login is fatal; every other failure ends just this
    /// visit.
    fn apply_outcome(
        &mut self,
        candidate: &TraversalCandidate,
        outcome: VisitOutcome,
    ) -> std::result::Result<(), TransportError> {
        match outcome {
            VisitOutcome::Complete(mut record) => {
                let now = Utc::now();
                self.resolver.assert_identity(&record.callsign, now);

                let prefix = self.child_prefix(candidate, &record.callsign);
                record.unexplored_neighbors = self.expand(&prefix, &record);

                tracing::info!(
                    "Visited {}: {} neighbors, {} queued",
                    record.callsign,
                    record.neighbors.len(),
                    record.unexplored_neighbors.len()
                );
                self.visited.insert(record.callsign.base().to_string());
                self.summary.visited += 1;
                self.merge(record);
            }

            VisitOutcome::Partial {
                mut record,
                phase,
                reason,
            } => {
                tracing::warn!(
                    "Visit to {} cut short during {}: {}",
                    record.callsign,
                    phase,
                    reason
                );
                self.mark_partial(candidate, &mut record, phase);
                self.summary.partial += 1;
                self.merge(record);
            }

            VisitOutcome::Failed(e) => {
                if matches!(e, TransportError::AuthFailed { .. }) {
                    return Err(e);
                }
                tracing::warn!("Could not reach {}: {}", candidate.target, e);
                self.summary.failed += 1;

                if let Some((from, to)) = failing_link(&self.local, candidate, e.hop()) {
                    self.topology.record_failure(&from, &to, Utc::now());
                }
            }
        }

        Ok(())
    }

    /// Turns collected data into a partial record
    ///
    /// Neighbors are still expanded when the route table was read.
    fn mark_partial(&mut self, candidate: &TraversalCandidate, record: &mut NodeRecord, phase: VisitPhase) {
        record.partial = true;
        record.visited = false;
        record.last_visited = Some(Utc::now());
        if phase > VisitPhase::Routes {
            let prefix = self.child_prefix(candidate, &record.callsign);
            record.unexplored_neighbors = self.expand(&prefix, record);
        }
    }

    /// Keeps whatever the interrupted visit collected
    fn keep_interrupted_visit(&mut self, candidate: &TraversalCandidate) {
        let Some(active) = self.active.take() else {
            return;
        };
        if active.phase == VisitPhase::Connect {
            return;
        }

        let mut record = active.record;
        tracing::warn!(
            "Keeping partial record for {} (interrupted during {})",
            record.callsign,
            active.phase
        );
        self.mark_partial(candidate, &mut record, active.phase);
        self.summary.partial += 1;
        self.merge(record);
    }

    fn merge(&mut self, record: NodeRecord) {
        let key = record.key();
        let outcome = self.topology.merge(record);
        tracing::debug!("Merged {}: {:?}", key, outcome);
    }

    /// Writes the topology document and CSV export
    fn checkpoint(&mut self) -> Result<()> {
        self.topology.refresh_counts();
        export_all(&self.storage, &self.topology, &self.csv_path)?;
        Ok(())
    }

    /// Stamps the run status and performs the final export
    fn finish(&mut self, status: RunStatus) -> Result<()> {
        let meta = &mut self.topology.metadata;
        meta.finished_at = Some(Utc::now());
        meta.status = status;
        meta.interrupted = status == RunStatus::Interrupted;
        self.summary.interrupted = meta.interrupted;

        self.checkpoint()?;
        self.summary.total_nodes = self.topology.len();
        self.summary.total_connections = self.topology.connections().len();

        tracing::info!(
            "Topology written to {} and {}",
            self.storage.location().display(),
            self.csv_path.display()
        );
        Ok(())
    }
}

/// The (from, to) link that failed at `hop` of the candidate's connect path
///
/// Hop 0 is the login to the local node and names no link.
fn failing_link(
    local: &Callsign,
    candidate: &TraversalCandidate,
    hop: Option<usize>,
) -> Option<(Callsign, Callsign)> {
    let path = candidate.connect_path();
    let hop = hop.filter(|h| *h >= 1 && *h <= path.len())?;
    let to = path[hop - 1].clone();
    let from = if hop == 1 {
        local.clone()
    } else {
        path[hop - 2].clone()
    };
    Some((from, to))
}
