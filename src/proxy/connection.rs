use crate::http::TargetInfo;
use crate::net::{TcpListener, TcpStream};
use crate::utils::Handle;

use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

/// Which side of a proxied session a half-connection is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Listener,
    Client,
    Target,
}

/// Position of a half-connection in the dispatcher state machine.
///
/// `Closed` has no variant: a closed half-connection is no longer in the
/// registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// The listening socket, waiting for connections.
    Listening,

    /// A client that has not sent its request yet.
    AwaitingRequest,

    /// A client whose request was handed to a target.
    Forwarded,

    /// A target whose non-blocking connect is in flight.
    Connecting,

    /// A target that sent its request and relays the response.
    AwaitingResponse,
}

/// One side of a proxied session.
pub enum HalfConnection {
    Listener(Listener),
    Client(Client),
    Target(Target),
}

/// The listening socket.
pub struct Listener {
    pub(crate) socket: TcpListener,
}

/// A client-facing connection.
pub struct Client {
    pub(crate) stream: TcpStream,
    pub(crate) addr: SocketAddr,
    pub(crate) peer: Option<Handle>,
    pub(crate) phase: ClientPhase,
}

/// What a client is waiting for.
pub enum ClientPhase {
    AwaitingRequest,

    /// The request was parsed; the target it names is kept for logging.
    Forwarded(TargetInfo),
}

/// An origin-facing connection.
pub struct Target {
    pub(crate) stream: TcpStream,
    pub(crate) peer: Option<Handle>,
    pub(crate) info: TargetInfo,
    pub(crate) phase: TargetPhase,
}

/// What a target is waiting for.
pub enum TargetPhase {
    /// Connect in flight; holds the rewritten request to send once writable.
    Connecting { request: Vec<u8> },

    /// Request sent; counts bytes relayed back to the client.
    AwaitingResponse { relayed: usize },
}

impl HalfConnection {
    pub fn role(&self) -> Role {
        match self {
            HalfConnection::Listener(_) => Role::Listener,
            HalfConnection::Client(_) => Role::Client,
            HalfConnection::Target(_) => Role::Target,
        }
    }

    pub fn state(&self) -> State {
        match self {
            HalfConnection::Listener(_) => State::Listening,
            HalfConnection::Client(client) => match client.phase {
                ClientPhase::AwaitingRequest => State::AwaitingRequest,
                ClientPhase::Forwarded(_) => State::Forwarded,
            },
            HalfConnection::Target(target) => match target.phase {
                TargetPhase::Connecting { .. } => State::Connecting,
                TargetPhase::AwaitingResponse { .. } => State::AwaitingResponse,
            },
        }
    }

    /// The paired half-connection, if any. Not checked for liveness.
    pub fn peer(&self) -> Option<Handle> {
        match self {
            HalfConnection::Listener(_) => None,
            HalfConnection::Client(client) => client.peer,
            HalfConnection::Target(target) => target.peer,
        }
    }

    /// Forgets `peer` if it is the current pairing.
    pub(crate) fn detach(&mut self, peer: Handle) {
        let slot = match self {
            HalfConnection::Listener(_) => return,
            HalfConnection::Client(client) => &mut client.peer,
            HalfConnection::Target(target) => &mut target.peer,
        };

        if *slot == Some(peer) {
            *slot = None;
        }
    }

    /// The target this half-connection serves, once known.
    pub fn target_info(&self) -> Option<&TargetInfo> {
        match self {
            HalfConnection::Listener(_) => None,
            HalfConnection::Client(client) => match &client.phase {
                ClientPhase::AwaitingRequest => None,
                ClientPhase::Forwarded(info) => Some(info),
            },
            HalfConnection::Target(target) => Some(&target.info),
        }
    }
}

impl AsRawFd for HalfConnection {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            HalfConnection::Listener(listener) => listener.socket.as_raw_fd(),
            HalfConnection::Client(client) => client.stream.as_raw_fd(),
            HalfConnection::Target(target) => target.stream.as_raw_fd(),
        }
    }
}

impl Client {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}
