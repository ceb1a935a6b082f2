use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

const IAC: u8 = 255;
const SB: u8 = 250;
const SE: u8 = 240;
const WILL: u8 = 251;
const DONT: u8 = 254;

/// Polling parameters for the stabilization read
#[derive(Debug, Clone, Copy)]
pub struct ReadTiming {
    /// How long one poll waits for new bytes
    pub poll_interval: Duration,
    /// Consecutive empty polls after which a non-empty response is complete
    pub stable_polls: u32,
}

/// Why a read stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEnd {
    /// The stop predicate matched
    Matched,
    /// The buffer stopped growing
    Stable,
    /// The deadline passed
    Deadline,
    /// The peer closed the stream
    Eof,
}

/// Text accumulated by one read
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub text: String,
    pub end: ReadEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Telnet {
    Data,
    Iac,
    Option,
    Sub,
    SubIac,
}

/// One console session over any byte stream
///
/// Received text has telnet negotiation removed and line endings normalized
/// to `\n`. Only one session is ever open at a time.
pub struct Session<S> {
    stream: S,
    timing: ReadTiming,
    telnet: Telnet,
    /// Leading bytes of a UTF-8 character split across reads
    pending: Vec<u8>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    pub fn new(stream: S, timing: ReadTiming) -> Self {
        Self {
            stream,
            timing,
            telnet: Telnet::Data,
            pending: Vec::new(),
        }
    }

    /// Sends one command line terminated with CR
    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        tracing::trace!("> {}", line);
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r").await?;
        self.stream.flush().await
    }

    /// Reads until `stop` matches, the deadline passes, or the peer closes
    ///
    /// With `settle` set, a non-empty buffer that stops growing for the
    /// configured number of polls also ends the read. Slow RF links deliver
    /// responses in bursts, so one quiet poll is not enough.
    pub async fn read_until<F>(&mut self, timeout: Duration, settle: bool, stop: F) -> io::Result<ReadOutcome>
    where
        F: Fn(&str) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut text = String::new();
        let mut quiet_polls = 0;
        let mut chunk = [0u8; 1024];

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(ReadOutcome {
                    text,
                    end: ReadEnd::Deadline,
                });
            }
            let wait = self.timing.poll_interval.min(deadline - now);

            match tokio::time::timeout(wait, self.stream.read(&mut chunk)).await {
                Ok(Ok(0)) => {
                    if !self.pending.is_empty() {
                        text.push_str(&String::from_utf8_lossy(&std::mem::take(&mut self.pending)));
                    }
                    return Ok(ReadOutcome {
                        text,
                        end: ReadEnd::Eof,
                    })
                }
                Ok(Ok(n)) => {
                    let decoded = self.decode(&chunk[..n]);
                    if !decoded.is_empty() {
                        quiet_polls = 0;
                        text.push_str(&decoded);
                        if stop(&text) {
                            return Ok(ReadOutcome {
                                text,
                                end: ReadEnd::Matched,
                            });
                        }
                    }
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    if settle && !text.is_empty() {
                        quiet_polls += 1;
                        if quiet_polls >= self.timing.stable_polls {
                            return Ok(ReadOutcome {
                                text,
                                end: ReadEnd::Stable,
                            });
                        }
                    }
                }
            }
        }
    }

    /// Reads a command response until it stabilizes
    pub async fn read_response(&mut self, timeout: Duration) -> io::Result<ReadOutcome> {
        self.read_until(timeout, true, |_| false).await
    }

    /// Sends a command and reads its response
    pub async fn command(&mut self, command: &str, timeout: Duration) -> io::Result<ReadOutcome> {
        self.send_line(command).await?;
        let outcome = self.read_response(timeout).await?;
        tracing::trace!(
            "< {} bytes for {} ({:?})",
            outcome.text.len(),
            command,
            outcome.end
        );
        Ok(outcome)
    }

    /// Closes the write side of the stream
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }

    /// Strips telnet negotiation and normalizes line endings
    ///
    /// Negotiation state and any partial UTF-8 character carry over
    /// between chunks.
    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.pending);
        data.reserve(bytes.len());
        for &byte in bytes {
            self.telnet = match (self.telnet, byte) {
                (Telnet::Data, IAC) => Telnet::Iac,
                (Telnet::Data, b) => {
                    data.push(b);
                    Telnet::Data
                }
                (Telnet::Iac, IAC) => {
                    data.push(IAC);
                    Telnet::Data
                }
                (Telnet::Iac, SB) => Telnet::Sub,
                (Telnet::Iac, WILL..=DONT) => Telnet::Option,
                (Telnet::Iac, _) => Telnet::Data,
                (Telnet::Option, _) => Telnet::Data,
                (Telnet::Sub, IAC) => Telnet::SubIac,
                (Telnet::Sub, _) => Telnet::Sub,
                (Telnet::SubIac, SE) => Telnet::Data,
                (Telnet::SubIac, _) => Telnet::Sub,
            };
        }

        let split = data.len() - incomplete_tail(&data);
        self.pending = data.split_off(split);

        String::from_utf8_lossy(&data)
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\0', "")
    }
}

/// Length of an unfinished UTF-8 sequence at the end of `bytes`
fn incomplete_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let needed = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return 0,
        };
        return if needed > back { back } else { 0 };
    }
    0
}
