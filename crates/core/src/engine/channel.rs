//! Asynchronous channel to a UCI evaluation engine
//!
//! Spawns the engine as a subprocess and drives the UCI protocol from a
//! dedicated task, correlating streamed replies with their requests.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use super::score::Score;
use super::Evaluator;
use crate::error::{Error, Result};
use crate::position::Position;

/// Search depth used when the configuration does not pick a limit.
pub const DEFAULT_SEARCH_DEPTH: u8 = 12;

/// How long each search request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    /// Fixed search depth in plies.
    Depth(u8),
    /// Fixed search time in milliseconds.
    MoveTime(u64),
}

impl SearchLimit {
    fn go_command(&self) -> String {
        match self {
            SearchLimit::Depth(depth) => format!("go depth {}", depth),
            SearchLimit::MoveTime(millis) => format!("go movetime {}", millis),
        }
    }
}

/// Configuration for spawning an engine channel.
///
/// # Example
/// ```ignore
/// let config = EngineConfig::new("stockfish").depth(18).hash_mb(256);
/// let channel = EngineChannel::spawn(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the engine binary (or "stockfish" if in PATH).
    pub path: String,
    /// Per-request search limit.
    pub limit: SearchLimit,
    /// Optional hash table size, sent as a UCI option at startup.
    pub hash_mb: Option<u32>,
    /// Optional worker thread count, sent as a UCI option at startup.
    pub threads: Option<u32>,
    /// Optional per-call answer deadline; calls exceeding it fail with
    /// [`Error::Timeout`] instead of pending forever.
    pub deadline: Option<Duration>,
}

impl EngineConfig {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            limit: SearchLimit::Depth(DEFAULT_SEARCH_DEPTH),
            hash_mb: None,
            threads: None,
            deadline: None,
        }
    }

    pub fn depth(mut self, depth: u8) -> Self {
        self.limit = SearchLimit::Depth(depth);
        self
    }

    pub fn move_time(mut self, millis: u64) -> Self {
        self.limit = SearchLimit::MoveTime(millis);
        self
    }

    pub fn hash_mb(mut self, megabytes: u32) -> Self {
        self.hash_mb = Some(megabytes);
        self
    }

    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Result of one completed engine search.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Evaluation of the searched position, White-positive, in pawns.
    pub eval: f64,
    /// The engine's chosen move in UCI notation; absent when the position
    /// has no legal moves.
    pub best_move: Option<String>,
}

struct EvalRequest {
    fen: String,
    turn: Color,
    reply: oneshot::Sender<Result<Analysis>>,
}

/// Handle to one long-lived engine process.
///
/// The process is spawned once and reused across calls. Cloning the
/// handle shares the same process; the process is shut down when the
/// last handle is dropped. Requests are serialized: issuing a new call
/// while an earlier one is still running supersedes the earlier call,
/// which fails with [`Error::Superseded`], and the engine's output for
/// it is discarded.
#[derive(Clone)]
pub struct EngineChannel {
    tx: mpsc::UnboundedSender<EvalRequest>,
    deadline: Option<Duration>,
}

impl EngineChannel {
    /// Spawns the engine binary and completes the UCI handshake.
    pub async fn spawn(config: EngineConfig) -> Result<Self> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::EngineUnavailable(format!("failed to start {}: {}", config.path, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::EngineUnavailable("engine stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::EngineUnavailable("engine stdout not captured".into()))?;

        let deadline = config.deadline;
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(run_channel(config, Some(child), stdout, stdin, rx, ready_tx));

        match ready_rx.await {
            Ok(result) => result.map(|_| Self { tx, deadline }),
            Err(_) => Err(Error::EngineUnavailable(
                "engine task exited during handshake".into(),
            )),
        }
    }

    /// Connects the channel to an arbitrary transport instead of a
    /// spawned process. The handshake result arrives on the returned
    /// receiver once the peer has answered it.
    #[cfg(test)]
    fn from_io<R, W>(
        config: EngineConfig,
        reader: R,
        writer: W,
    ) -> (Self, oneshot::Receiver<Result<()>>)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let deadline = config.deadline;
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(run_channel(config, None, reader, writer, rx, ready_tx));
        (Self { tx, deadline }, ready_rx)
    }

    /// Evaluates a position, resolving with a White-positive score in
    /// pawn units.
    ///
    /// Resolves exactly once: with the last score streamed before the
    /// engine's terminal message, with 0.0 if the engine produced no
    /// score, or with an error. Dropping the returned future abandons
    /// the request; its eventual result is discarded.
    pub async fn evaluate(&self, position: &Position) -> Result<f64> {
        Ok(self.search(position).await?.eval)
    }

    /// Runs a full search, returning the evaluation together with the
    /// engine's chosen move.
    pub async fn search(&self, position: &Position) -> Result<Analysis> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = EvalRequest {
            fen: position.fen().to_string(),
            turn: position.turn(),
            reply: reply_tx,
        };
        self.tx
            .send(request)
            .map_err(|_| Error::EngineUnavailable("engine channel closed".into()))?;

        match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, reply_rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(Error::EngineUnavailable(
                    "engine stopped before answering".into(),
                )),
                Err(_) => Err(Error::Timeout(deadline)),
            },
            None => reply_rx.await.unwrap_or_else(|_| {
                Err(Error::EngineUnavailable(
                    "engine stopped before answering".into(),
                ))
            }),
        }
    }
}

#[async_trait]
impl Evaluator for EngineChannel {
    async fn evaluate(&self, position: &Position) -> Result<f64> {
        EngineChannel::evaluate(self, position).await
    }
}

/// A request the engine has been told to search but has not finished.
struct Pending {
    seq: u64,
    turn: Color,
    last_score: Option<Score>,
    reply: Option<oneshot::Sender<Result<Analysis>>>,
}

async fn run_channel<R, W>(
    config: EngineConfig,
    child: Option<Child>,
    reader: R,
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<EvalRequest>,
    ready: oneshot::Sender<Result<()>>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    if let Err(e) = handshake(&config, &mut writer, &mut lines).await {
        error!(error = %e, path = %config.path, "engine handshake failed");
        let _ = ready.send(Err(e));
        return;
    }
    debug!(path = %config.path, "engine ready");
    let _ = ready.send(Ok(()));

    let mut pending: VecDeque<Pending> = VecDeque::new();
    let mut next_seq: u64 = 0;

    loop {
        tokio::select! {
            request = rx.recv() => match request {
                Some(request) => {
                    // A new request supersedes every outstanding one; the
                    // queue entries stay to absorb their terminal messages.
                    for stale in pending.iter_mut() {
                        if let Some(tx) = stale.reply.take() {
                            debug!(seq = stale.seq, "superseding outstanding evaluation");
                            let _ = tx.send(Err(Error::Superseded));
                        }
                    }
                    let mut commands = String::new();
                    if !pending.is_empty() {
                        commands.push_str("stop\n");
                    }
                    commands.push_str(&format!("position fen {}\n", request.fen));
                    commands.push_str(&config.limit.go_command());

                    next_seq += 1;
                    if let Err(e) = send(&mut writer, &commands).await {
                        let reason = format!("engine stdin closed: {}", e);
                        let _ = request
                            .reply
                            .send(Err(Error::EngineUnavailable(reason.clone())));
                        fail_pending(&mut pending, &reason);
                        break;
                    }
                    debug!(seq = next_seq, fen = %request.fen, "search started");
                    pending.push_back(Pending {
                        seq: next_seq,
                        turn: request.turn,
                        last_score: None,
                        reply: Some(request.reply),
                    });
                }
                // All handles dropped; shut the engine down.
                None => break,
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(line.trim(), &mut pending),
                Ok(None) => {
                    warn!("engine closed its output");
                    fail_pending(&mut pending, "engine closed its output");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "engine read failed");
                    fail_pending(&mut pending, &format!("engine read failed: {}", e));
                    break;
                }
            },
        }
    }

    if let Some(mut child) = child {
        let _ = send(&mut writer, "quit").await;
        // Give it a moment to exit before killing.
        if tokio::time::timeout(Duration::from_millis(100), child.wait())
            .await
            .is_err()
        {
            let _ = child.kill().await;
        }
    }
}

fn handle_line(line: &str, pending: &mut VecDeque<Pending>) {
    if line.starts_with("bestmove") {
        let best_move = line
            .split_whitespace()
            .nth(1)
            .filter(|mv| *mv != "(none)")
            .map(str::to_string);
        match pending.pop_front() {
            Some(mut done) => {
                // Terminal with no preceding score resolves even.
                let eval = done
                    .last_score
                    .map(|score| score.white_pov(done.turn))
                    .unwrap_or(0.0);
                match done.reply.take() {
                    Some(tx) => {
                        let _ = tx.send(Ok(Analysis { eval, best_move }));
                    }
                    None => debug!(seq = done.seq, "discarding stale engine result"),
                }
            }
            None => warn!(%line, "terminal message with no outstanding request"),
        }
    } else if line.starts_with("info") {
        match parse_score(line) {
            Ok(Some(score)) => {
                if let Some(current) = pending.front_mut() {
                    current.last_score = Some(score);
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(%line, "malformed score from engine");
                if let Some(current) = pending.front_mut() {
                    if let Some(tx) = current.reply.take() {
                        let _ = tx.send(Err(e));
                    }
                }
            }
        }
    }
}

fn fail_pending(pending: &mut VecDeque<Pending>, reason: &str) {
    for mut stale in pending.drain(..) {
        if let Some(tx) = stale.reply.take() {
            let _ = tx.send(Err(Error::EngineUnavailable(reason.to_string())));
        }
    }
}

async fn handshake<R, W>(
    config: &EngineConfig,
    writer: &mut W,
    lines: &mut Lines<BufReader<R>>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    send(writer, "uci").await.map_err(unavailable)?;
    read_until(lines, "uciok").await?;

    if let Some(megabytes) = config.hash_mb {
        send(writer, &format!("setoption name Hash value {}", megabytes))
            .await
            .map_err(unavailable)?;
    }
    if let Some(threads) = config.threads {
        send(writer, &format!("setoption name Threads value {}", threads))
            .await
            .map_err(unavailable)?;
    }

    send(writer, "isready").await.map_err(unavailable)?;
    read_until(lines, "readyok").await?;
    Ok(())
}

/// Reads lines until one starts with the expected token.
async fn read_until<R>(lines: &mut Lines<BufReader<R>>, expected: &str) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        match lines.next_line().await.map_err(unavailable)? {
            Some(line) if line.trim().starts_with(expected) => return Ok(()),
            Some(_) => continue,
            None => {
                return Err(Error::EngineUnavailable(format!(
                    "engine exited before {}",
                    expected
                )))
            }
        }
    }
}

async fn send<W>(writer: &mut W, command: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(command.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

fn unavailable(e: std::io::Error) -> Error {
    Error::EngineUnavailable(e.to_string())
}

/// Pulls the score out of an `info` line, if it carries one.
fn parse_score(line: &str) -> Result<Option<Score>> {
    let mut parts = line.split_whitespace();
    while let Some(token) = parts.next() {
        if token != "score" {
            continue;
        }
        return match (parts.next(), parts.next()) {
            (Some("cp"), Some(value)) => value
                .parse::<i32>()
                .map(|cp| Some(Score::Centipawns(cp)))
                .map_err(|_| Error::MalformedScore(format!("bad centipawn value '{}'", value))),
            (Some("mate"), Some(value)) => value
                .parse::<i32>()
                .map(|moves| Some(Score::Mate(moves)))
                .map_err(|_| Error::MalformedScore(format!("bad mate value '{}'", value))),
            (Some(kind), _) => Err(Error::MalformedScore(format!(
                "unknown score kind '{}'",
                kind
            ))),
            (None, _) => Err(Error::MalformedScore("truncated score".into())),
        };
    }
    Ok(None)
}
