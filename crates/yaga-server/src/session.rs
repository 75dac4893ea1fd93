//! Per-connection session.
//!
//! A session moves through `Handshaking → Active → Closed`:
//!
//! - `Handshaking`: the first frame is the display name. On success the
//!   session registers itself, records the name in the users store and turns
//!   `Active`.
//! - `Active`: read a frame, run it past the moderator, hand it to the
//!   broadcaster, repeat. A forbidden word ends the session without the
//!   message being persisted or delivered.
//! - `Closed`: leave the registry, close the output, free the admission slot.
//!
//! [`Session::run`] consumes the session, and every exit path (clean EOF, I/O
//! error, protocol error, moderation kick, rejected join) funnels into one
//! teardown, so resources are released exactly once.

use std::{fmt, sync::Arc};

use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
};
use yaga_proto::{Frame, ProtocolError, read_frame, write_frame};

use crate::{
    broadcaster::Broadcaster,
    config::DuplicateNamePolicy,
    moderator::Moderator,
    persistence::PersistenceLog,
    registry::{Admission, Registry, SessionId},
};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared side of a registered session: identity plus the output stream.
///
/// The output sits behind the session's own write lock, taken independently by
/// public broadcast and private delivery, so two writers never interleave bytes
/// on one connection while writes to different sessions proceed in parallel.
pub struct SessionHandle {
    id: SessionId,
    name: String,
    /// Write lock over the output. `None` once the session has closed.
    writer: Mutex<Option<BoxedWriter>>,
}

impl SessionHandle {
    /// Create a handle writing frames to `writer`.
    pub fn new(
        id: SessionId,
        name: impl Into<String>,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self { id, name: name.into(), writer: Mutex::new(Some(Box::new(writer))) }
    }

    /// Server-assigned ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display name from the handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write one frame under the session's write lock.
    ///
    /// # Errors
    ///
    /// `ProtocolError::ConnectionClosed` after [`close`](Self::close), or the
    /// underlying write error.
    pub async fn send(&self, text: &str) -> Result<(), ProtocolError> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(w) => write_frame(w, &Frame::new(text)).await,
            None => Err(ProtocolError::ConnectionClosed),
        }
    }

    /// Shut the output down. Later sends fail; repeated calls are no-ops.
    pub async fn close(&self) {
        let writer = self.writer.lock().await.take();
        if let Some(mut w) = writer {
            if let Err(e) = w.shutdown().await {
                tracing::debug!("Shutdown of session {} output failed: {}", self.id, e);
            }
        }
    }

    /// Whether [`close`](Self::close) has run.
    pub async fn is_closed(&self) -> bool {
        self.writer.lock().await.is_none()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.id).field("name", &self.name).finish()
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the display name
    Handshaking,
    /// Registered and relaying messages
    Active,
    /// Torn down
    Closed,
}

/// Why a session ended.
#[derive(Debug)]
pub enum CloseReason {
    /// Peer closed or reset the connection.
    Disconnected,
    /// Read failed for another reason (bad frame, invalid UTF-8, I/O error).
    ReadFailed(ProtocolError),
    /// Name already taken and duplicate names are rejected.
    DuplicateName,
    /// Message contained a forbidden word.
    ModerationViolation {
        /// The forbidden entry that matched
        word: String,
    },
}

impl CloseReason {
    fn from_read_error(err: ProtocolError) -> Self {
        if err.is_disconnect() { Self::Disconnected } else { Self::ReadFailed(err) }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::ReadFailed(err) => write!(f, "read failed: {err}"),
            Self::DuplicateName => write!(f, "name already in use"),
            Self::ModerationViolation { word } => write!(f, "forbidden word '{word}'"),
        }
    }
}

/// Collaborators every session shares.
#[derive(Clone)]
pub struct SessionContext {
    /// Live sessions and admission counter
    pub registry: Arc<Registry>,
    /// Message router
    pub broadcaster: Broadcaster,
    /// Forbidden-word checker
    pub moderator: Moderator,
    /// Users/messages writer
    pub persistence: PersistenceLog,
    /// Name collision handling
    pub duplicate_names: DuplicateNamePolicy,
    /// Drop the user's store records when the session ends
    pub prune_users_on_leave: bool,
}

/// One client connection, from handshake to teardown.
pub struct Session {
    id: SessionId,
    peer: String,
    state: SessionState,
    reader: BoxedReader,
    /// Output before the handshake; moves into the [`SessionHandle`] after it.
    writer: Option<BoxedWriter>,
    ctx: SessionContext,
    /// Held for the session's whole life; dropping it frees the slot.
    _admission: Admission,
}

impl Session {
    /// Create a session over an arbitrary duplex stream.
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        peer: impl Into<String>,
        ctx: SessionContext,
        admission: Admission,
    ) -> Self {
        Self {
            id: ctx.registry.next_session_id(),
            peer: peer.into(),
            state: SessionState::Handshaking,
            reader: Box::new(reader),
            writer: Some(Box::new(writer)),
            ctx,
            _admission: admission,
        }
    }

    /// Create a session over an accepted TCP connection.
    pub fn from_tcp(stream: TcpStream, ctx: SessionContext, admission: Admission) -> Self {
        let peer = stream.peer_addr().map_or_else(|_| "unknown".to_string(), |a| a.to_string());
        let (reader, writer) = stream.into_split();
        Self::new(reader, writer, peer, ctx, admission)
    }

    /// Server-assigned ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to completion and report why it ended.
    pub async fn run(mut self) -> CloseReason {
        let handle = match self.handshake().await {
            Ok(handle) => handle,
            Err(reason) => {
                self.close_unregistered().await;
                return reason;
            },
        };

        let reason = self.receive_loop(&handle).await;
        self.teardown(&handle, &reason).await;
        reason
    }

    async fn handshake(&mut self) -> Result<Arc<SessionHandle>, CloseReason> {
        debug_assert_eq!(self.state, SessionState::Handshaking);

        let name = read_frame(&mut self.reader)
            .await
            .map_err(CloseReason::from_read_error)?
            .into_string();

        let Some(writer) = self.writer.take() else {
            return Err(CloseReason::Disconnected);
        };
        let handle = Arc::new(SessionHandle::new(self.id, name, writer));

        if let Err(e) =
            self.ctx.registry.register(Arc::clone(&handle), self.ctx.duplicate_names).await
        {
            tracing::info!(session = %self.id, peer = %self.peer, "Join refused: {}", e);
            handle.close().await;
            return Err(CloseReason::DuplicateName);
        }

        self.ctx.persistence.record_user(handle.name());
        self.transition(SessionState::Active);

        tracing::info!(session = %self.id, peer = %self.peer, "{} joined", handle.name());

        Ok(handle)
    }

    async fn receive_loop(&mut self, handle: &SessionHandle) -> CloseReason {
        loop {
            let text = match read_frame(&mut self.reader).await {
                Ok(frame) => frame.into_string(),
                Err(e) => return CloseReason::from_read_error(e),
            };

            if let Some(word) = self.ctx.moderator.first_violation(&text).await {
                tracing::warn!(
                    session = %self.id,
                    "Disconnecting {} for forbidden word '{}'",
                    handle.name(),
                    word
                );
                return CloseReason::ModerationViolation { word };
            }

            let outcome = self.ctx.broadcaster.dispatch(&text, handle).await;
            tracing::debug!(session = %self.id, ?outcome, "Dispatched message");
        }
    }

    async fn teardown(mut self, handle: &SessionHandle, reason: &CloseReason) {
        self.transition(SessionState::Closed);

        self.ctx.registry.remove(self.id).await;
        if self.ctx.prune_users_on_leave {
            self.ctx.persistence.remove_user(handle.name());
        }
        handle.close().await;

        tracing::info!(session = %self.id, peer = %self.peer, "{} left: {}", handle.name(), reason);
    }

    async fn close_unregistered(mut self) {
        self.transition(SessionState::Closed);

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!("Shutdown of session {} output failed: {}", self.id, e);
            }
        }

        tracing::debug!(session = %self.id, peer = %self.peer, "Closed before joining");
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            matches!(
                (self.state, next),
                (SessionState::Handshaking, SessionState::Active | SessionState::Closed)
                    | (SessionState::Active, SessionState::Closed)
            ),
            "illegal session transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}
