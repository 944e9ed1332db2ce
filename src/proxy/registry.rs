//! Connection registry.
//!
//! The registry is the single owner of every live half-connection and the
//! only place that maps poller tokens back to them. Each entry records the
//! interest it is registered with, so the poller and the registry never
//! disagree about what a descriptor is waiting for.
//!
//! Pairing is symmetric: a target is always created against exactly one
//! client, and destroying either side clears the link on the survivor.

use super::connection::{Client, ClientPhase, HalfConnection, Listener, Role, State, Target, TargetPhase};
use crate::error::Error;
use crate::http::TargetInfo;
use crate::net::{TcpListener, TcpStream};
use crate::reactor::{Interest, Poller};
use crate::utils::{Handle, Slab};

use std::io;
use std::net::SocketAddr;
use std::os::fd::AsRawFd;
use std::time::Instant;
use tracing::warn;

struct Slot {
    conn: HalfConnection,
    interest: Interest,
    last_active: Instant,
}

/// Owner of all live half-connections.
pub struct Registry {
    slots: Slab<Slot>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            slots: Slab::with_capacity(64),
        }
    }

    fn insert(&mut self, poller: &Poller, conn: HalfConnection, interest: Interest) -> io::Result<Handle> {
        let fd = conn.as_raw_fd();
        let handle = self.slots.insert(Slot {
            conn,
            interest,
            last_active: Instant::now(),
        });

        if let Err(err) = poller.register(fd, handle.token(), interest) {
            self.slots.remove(handle);
            return Err(err);
        }

        Ok(handle)
    }

    /// Registers the listening socket for readable interest.
    pub(crate) fn register_listener(&mut self, poller: &Poller, socket: TcpListener) -> io::Result<Handle> {
        self.insert(
            poller,
            HalfConnection::Listener(Listener { socket }),
            Interest::Readable,
        )
    }

    /// Registers a freshly accepted client, waiting for its request.
    pub(crate) fn register_client(
        &mut self,
        poller: &Poller,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> io::Result<Handle> {
        let client = Client {
            stream,
            addr,
            peer: None,
            phase: ClientPhase::AwaitingRequest,
        };

        self.insert(poller, HalfConnection::Client(client), Interest::Readable)
    }

    /// Registers a connecting target for writable interest and pairs it
    /// with `client`.
    ///
    /// Fails without registering anything if the request is empty, `client`
    /// is not a live client, or the client already has a peer. The stream
    /// is closed in that case.
    pub(crate) fn register_target(
        &mut self,
        poller: &Poller,
        stream: TcpStream,
        client: Handle,
        info: TargetInfo,
        request: Vec<u8>,
    ) -> Result<Handle, Error> {
        let pairing = |reason| Error::Pairing { client, reason };

        if request.is_empty() {
            return Err(pairing("request is empty"));
        }

        match self.slots.get(client).map(|slot| &slot.conn) {
            Some(HalfConnection::Client(c)) if c.peer.is_some() => {
                return Err(pairing("client already has a peer"));
            }
            Some(HalfConnection::Client(_)) => {}
            _ => return Err(pairing("not a live client")),
        }

        let target = Target {
            stream,
            peer: Some(client),
            info,
            phase: TargetPhase::Connecting { request },
        };

        let handle = self.insert(poller, HalfConnection::Target(target), Interest::Writable)?;

        if let Some(HalfConnection::Client(c)) = self.get_mut(client) {
            c.peer = Some(handle);
        }

        Ok(handle)
    }

    /// Switches the readiness a half-connection is watched for.
    pub(crate) fn update_interest(&mut self, poller: &Poller, handle: Handle, interest: Interest) -> io::Result<()> {
        let slot = self
            .slots
            .get_mut(handle)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "stale handle"))?;

        poller.reregister(slot.conn.as_raw_fd(), handle.token(), interest)?;
        slot.interest = interest;

        Ok(())
    }

    /// Removes a half-connection, deregisters and closes its descriptor.
    ///
    /// The peer, if any, stays alive with its link cleared. Returns the role
    /// of the destroyed half-connection, or `None` for a stale handle.
    pub(crate) fn destroy(&mut self, poller: &Poller, handle: Handle) -> Option<Role> {
        let slot = self.slots.remove(handle)?;

        if let Err(err) = poller.deregister(slot.conn.as_raw_fd()) {
            warn!(%handle, error = %err, "failed to deregister descriptor");
        }

        if let Some(peer) = slot.conn.peer() {
            if let Some(survivor) = self.slots.get_mut(peer) {
                survivor.conn.detach(handle);
            }
        }

        Some(slot.conn.role())
    }

    /// Maps a poller token back to a live handle.
    pub(crate) fn resolve_token(&self, token: u64) -> Option<Handle> {
        let handle = Handle::from_token(token);
        self.slots.contains(handle).then_some(handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&HalfConnection> {
        self.slots.get(handle).map(|slot| &slot.conn)
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut HalfConnection> {
        self.slots.get_mut(handle).map(|slot| &mut slot.conn)
    }

    pub fn state(&self, handle: Handle) -> Option<State> {
        self.get(handle).map(HalfConnection::state)
    }

    pub fn interest(&self, handle: Handle) -> Option<Interest> {
        self.slots.get(handle).map(|slot| slot.interest)
    }

    /// The live peer of `handle`.
    ///
    /// Returns `None` when unpaired or when the recorded peer is gone.
    pub fn peer_of(&self, handle: Handle) -> Option<Handle> {
        self.get(handle)?
            .peer()
            .filter(|peer| self.slots.contains(*peer))
    }

    /// Records I/O progress for idle eviction.
    pub(crate) fn touch(&mut self, handle: Handle) {
        if let Some(slot) = self.slots.get_mut(handle) {
            slot.last_active = Instant::now();
        }
    }

    pub(crate) fn last_active(&self, handle: Handle) -> Option<Instant> {
        self.slots.get(handle).map(|slot| slot.last_active)
    }

    /// Number of live half-connections, listener included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    pub fn count(&self, role: Role) -> usize {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.conn.role() == role)
            .count()
    }

    pub fn count_state(&self, state: State) -> usize {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.conn.state() == state)
            .count()
    }

    /// Handles of every live half-connection.
    pub(crate) fn handles(&self) -> Vec<Handle> {
        self.slots.iter().map(|(handle, _)| handle).collect()
    }
}
