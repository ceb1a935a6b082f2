use crate::callsign::Callsign;
use crate::config::{NodeConfig, TimeoutConfig};
use crate::parser::{parse_nodes, parse_routes};
use crate::resolver::{ConnectMethod, ConnectPlan};
use crate::transport::keywords::{self, ConnectOutcome};
use crate::transport::session::{ReadEnd, ReadTiming, Session};
use crate::transport::{hop_timeout, TransportError, TransportResult};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Opens console sessions and chains connects through intermediate nodes
///
/// Only the local node is logged into; every further hop rides on that
/// authenticated session.
#[derive(Debug, Clone)]
pub struct Connector {
    host: String,
    port: u16,
    username: String,
    password: String,
    local: Callsign,
    timeouts: TimeoutConfig,
}

impl Connector {
    /// Creates a connector for the local node
    ///
    /// # Arguments
    ///
    /// * `node` - Local node console settings
    /// * `local` - The local node's callsign
    /// * `timeouts` - Transport timing
    pub fn new(node: &NodeConfig, local: Callsign, timeouts: TimeoutConfig) -> Self {
        Self {
            host: node.host.clone(),
            port: node.port,
            username: node.username.clone(),
            password: node.password.clone(),
            local,
            timeouts,
        }
    }

    pub fn timing(&self) -> ReadTiming {
        ReadTiming {
            poll_interval: self.timeouts.poll_interval(),
            stable_polls: self.timeouts.stable_polls,
        }
    }

    /// Logs in and connects through every hop of `plans`, in order
    ///
    /// An empty plan list yields a session on the local node itself.
    ///
    /// # Arguments
    ///
    /// * `plans` - One plan per hop, ending with the target
    /// * `deadline` - No hop may wait past this instant
    pub async fn connect(
        &self,
        plans: &[ConnectPlan],
        deadline: Instant,
    ) -> TransportResult<Session<TcpStream>> {
        let mut session = self.login(plans.len(), deadline).await?;

        for (index, plan) in plans.iter().enumerate() {
            let hop = index + 1;
            let remaining = plans.len() - index;
            tracing::debug!("Hop {}/{}: {}", hop, plans.len(), plan);

            if let Err(e) = self.connect_hop(&mut session, hop, remaining, plan, deadline).await {
                self.disconnect(&mut session).await;
                return Err(e);
            }
        }

        Ok(session)
    }

    /// Opens the TCP connection and answers the console login prompts
    async fn login(&self, hops: usize, deadline: Instant) -> TransportResult<Session<TcpStream>> {
        let timeout = Self::capped(hop_timeout(&self.timeouts, hops), deadline);
        let target = self.local.to_string();
        let timed_out = || TransportError::Timeout {
            hop: 0,
            target: target.clone(),
            method: ConnectMethod::Login,
        };
        let lost = link_lost(0, &self.local, ConnectMethod::Login);

        let stream = tokio::time::timeout(timeout, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| timed_out())?
            .map_err(&lost)?;
        let mut session = Session::new(stream, self.timing());

        let prompt = session
            .read_until(timeout, false, |t| {
                keywords::is_user_prompt(t) || keywords::is_password_prompt(t)
            })
            .await
            .map_err(&lost)?;
        match prompt.end {
            ReadEnd::Matched => {}
            ReadEnd::Eof => return Err(self.auth_failed("connection closed at prompt")),
            _ => return Err(timed_out()),
        }

        if keywords::is_user_prompt(&prompt.text) {
            session.send_line(&self.username).await.map_err(&lost)?;
            let prompt = session
                .read_until(timeout, false, keywords::is_password_prompt)
                .await
                .map_err(&lost)?;
            match prompt.end {
                ReadEnd::Matched => {}
                ReadEnd::Eof => return Err(self.auth_failed("connection closed at password prompt")),
                _ => return Err(timed_out()),
            }
        }

        session.send_line(&self.password).await.map_err(&lost)?;
        let welcome = session
            .read_until(timeout, true, |t| {
                keywords::login_rejection(t).is_some() || t.contains('}')
            })
            .await
            .map_err(&lost)?;

        if let Some(reason) = keywords::login_rejection(&welcome.text) {
            return Err(self.auth_failed(&reason));
        }
        if welcome.end == ReadEnd::Eof {
            return Err(self.auth_failed("connection closed after password"));
        }

        tracing::debug!("Logged in to {} at {}:{}", self.local, self.host, self.port);
        Ok(session)
    }

    /// Makes one hop from the node currently connected
    ///
    /// # Arguments
    ///
    /// * `hop` - 1-based hop index
    /// * `remaining` - Hops still to make, this one included
    pub async fn connect_hop<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        session: &mut Session<S>,
        hop: usize,
        remaining: usize,
        plan: &ConnectPlan,
        deadline: Instant,
    ) -> TransportResult<()> {
        let budget = Self::capped(hop_timeout(&self.timeouts, remaining), deadline);
        let target = plan.target();

        match plan {
            ConnectPlan::DirectPort {
                fallback_alias, ..
            } => {
                let command = plan.command().unwrap_or_default();
                let result = self
                    .attempt(session, hop, target, ConnectMethod::DirectPort, &command, budget)
                    .await;

                match (result, fallback_alias) {
                    (Err(TransportError::Timeout { .. }), Some(alias)) => {
                        let left = deadline.saturating_duration_since(Instant::now());
                        tracing::warn!(
                            "Hop {}: direct connect to {} timed out, retrying as {} with {:?} left",
                            hop,
                            target,
                            alias,
                            left
                        );
                        self.attempt(
                            session,
                            hop,
                            target,
                            ConnectMethod::NetromAlias,
                            &format!("C {}", alias),
                            left,
                        )
                        .await
                    }
                    (result, _) => result,
                }
            }
            ConnectPlan::NetromAlias { .. } | ConnectPlan::BestEffort { .. } => {
                let command = plan.command().unwrap_or_default();
                self.attempt(session, hop, target, plan.method(), &command, budget)
                    .await
            }
            ConnectPlan::DiscoveryFallback { .. } => {
                self.discover(session, hop, target, Instant::now() + budget)
                    .await
            }
        }
    }

    /// Looks the target up on the live hop, then connects
    ///
    /// The alias table is consulted first; failing that, the hop's route
    /// table is probed for a direct, unblocked route.
    async fn discover<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        session: &mut Session<S>,
        hop: usize,
        target: &Callsign,
        hop_deadline: Instant,
    ) -> TransportResult<()> {
        let method = ConnectMethod::Discovery;
        let lost = link_lost(hop, target, method);

        let left = hop_deadline.saturating_duration_since(Instant::now());
        let nodes = session
            .command("NODES", self.timeouts.command_timeout().min(left))
            .await
            .map_err(&lost)?;
        if nodes.end == ReadEnd::Eof {
            return Err(lost(eof()));
        }

        let found = parse_nodes(&nodes.text)
            .into_iter()
            .filter(|entry| entry.callsign.same_base(target))
            .max_by_key(|entry| (entry.callsign == *target, entry.alias.is_some()));

        let command = match found {
            Some(entry) => {
                tracing::debug!("Hop {}: found {} in alias table", hop, entry.callsign);
                match entry.alias {
                    Some(alias) => format!("C {}", alias),
                    None => format!("C {}", entry.callsign),
                }
            }
            None => {
                let left = hop_deadline.saturating_duration_since(Instant::now());
                let routes = session
                    .command("ROUTES", self.timeouts.command_timeout().min(left))
                    .await
                    .map_err(&lost)?;
                if routes.end == ReadEnd::Eof {
                    return Err(lost(eof()));
                }
                let Some(route) = parse_routes(&routes.text)
                    .into_iter()
                    .find(|r| r.direct && !r.is_blocked() && r.callsign.same_base(target))
                else {
                    return Err(TransportError::Rejected {
                        hop,
                        target: target.to_string(),
                        method,
                        keyword: "unresolved".to_string(),
                    });
                };
                tracing::debug!("Hop {}: found {} in route table", hop, route.callsign);
                format!("C {} {}", route.port, route.callsign)
            }
        };

        let left = hop_deadline.saturating_duration_since(Instant::now());
        self.attempt(session, hop, target, method, &command, left)
            .await
    }

    /// Sends one connect command and classifies the reply
    async fn attempt<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        session: &mut Session<S>,
        hop: usize,
        target: &Callsign,
        method: ConnectMethod,
        command: &str,
        timeout: Duration,
    ) -> TransportResult<()> {
        let lost = link_lost(hop, target, method);
        session.send_line(command).await.map_err(&lost)?;
        let reply = session
            .read_until(timeout, false, |t| keywords::classify_connect(t).is_some())
            .await
            .map_err(&lost)?;

        match keywords::classify_connect(&reply.text) {
            Some(ConnectOutcome::Connected) => {
                tracing::debug!("Hop {}: connected to {} ({})", hop, target, command);
                Ok(())
            }
            Some(ConnectOutcome::Rejected(keyword)) => Err(TransportError::Rejected {
                hop,
                target: target.to_string(),
                method,
                keyword,
            }),
            None if reply.end == ReadEnd::Eof => Err(lost(eof())),
            None => Err(TransportError::Timeout {
                hop,
                target: target.to_string(),
                method,
            }),
        }
    }

    /// Leaves the current node and closes the session
    ///
    /// Failures here are logged only; the visit's data is already collected.
    pub async fn disconnect<S: AsyncRead + AsyncWrite + Unpin>(&self, session: &mut Session<S>) {
        if let Err(e) = session.send_line("BYE").await {
            tracing::debug!("BYE not sent: {}", e);
            return;
        }
        let linger = self.timeouts.poll_interval() * self.timeouts.stable_polls.max(1);
        if let Err(e) = session.read_response(linger).await {
            tracing::debug!("Error draining after BYE: {}", e);
        }
        if let Err(e) = session.shutdown().await {
            tracing::debug!("Error closing session: {}", e);
        }
    }

    fn capped(timeout: Duration, deadline: Instant) -> Duration {
        timeout.min(deadline.saturating_duration_since(Instant::now()))
    }

    fn auth_failed(&self, reason: &str) -> TransportError {
        TransportError::AuthFailed {
            target: self.local.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Maps an I/O failure during `hop` to a lost link naming the hop and method
fn link_lost(
    hop: usize,
    target: &Callsign,
    method: ConnectMethod,
) -> impl Fn(io::Error) -> TransportError + '_ {
    move |e| {
        tracing::debug!("Hop {}: {} via {}: {}", hop, target, method, e);
        TransportError::Lost {
            hop,
            target: target.to_string(),
            method,
        }
    }
}

fn eof() -> io::Error {
    io::Error::from(io::ErrorKind::UnexpectedEof)
}
