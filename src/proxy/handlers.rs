//! Relay handlers invoked by the dispatcher.
//!
//! Every handler performs at most one receive and one send per readiness
//! event. Would-block results are left for the next notification; any other
//! error destroys only the half-connection that hit it. A surviving peer is
//! cleaned up by its own next EOF, error or idle timeout.

use super::connection::{ClientPhase, HalfConnection, State, TargetPhase};
use super::{Proxy, Resolve};
use crate::error::{Error, is_transient};
use crate::http::{RequestError, RequestHead, TargetInfo};
use crate::net::TcpStream;
use crate::reactor::{Event, Interest};
use crate::utils::Handle;

use std::net::Shutdown;
use tracing::{debug, info, trace, warn};

impl<R: Resolve> Proxy<R> {
    /// Routes one readiness event by the state of its half-connection.
    pub(super) fn dispatch(&mut self, event: Event) {
        let Some(handle) = self.registry.resolve_token(event.token) else {
            trace!(token = event.token, "event for a closed half-connection");
            return;
        };

        let Some(state) = self.registry.state(handle) else {
            return;
        };

        match state {
            State::Listening if event.readable => self.on_accept(handle),
            State::AwaitingRequest | State::Forwarded if event.readable => self.on_client_read(handle),
            State::Connecting if event.writable => self.on_target_write(handle),
            State::AwaitingResponse if event.readable => self.on_target_read(handle),
            _ => debug!(
                %handle,
                ?state,
                readable = event.readable,
                writable = event.writable,
                "unexpected readiness"
            ),
        }
    }

    fn on_accept(&mut self, listener: Handle) {
        let Some(HalfConnection::Listener(l)) = self.registry.get(listener) else {
            return;
        };

        match l.socket.accept() {
            Ok((stream, addr)) => match self.registry.register_client(&self.poller, stream, addr) {
                Ok(client) => {
                    info!(%client, %addr, "accepted connection");
                    self.arm_idle_timer(client);
                }
                Err(err) => warn!(%addr, error = %err, "failed to register client"),
            },
            Err(err) if is_transient(&err) => trace!("accept would block"),
            Err(err) => warn!(error = %err, "accept failed"),
        }
    }

    fn on_client_read(&mut self, handle: Handle) {
        let Some(HalfConnection::Client(client)) = self.registry.get(handle) else {
            return;
        };

        let awaiting = matches!(client.phase, ClientPhase::AwaitingRequest);
        let addr = client.addr();

        match client.stream.recv(&mut self.buffer) {
            Ok(0) => {
                debug!(%handle, %addr, "client closed connection");
                self.destroy(handle);
            }
            Ok(n) if awaiting => {
                self.registry.touch(handle);

                if let Err(err) = self.open_target(handle, n) {
                    info!(%handle, %addr, error = %err, "rejecting request");
                    self.destroy(handle);
                }
            }
            Ok(n) => {
                if let Some(info) = self.registry.get(handle).and_then(HalfConnection::target_info) {
                    debug!(%handle, target = %info, bytes = n, "ignoring data received after the request");
                }
                self.registry.touch(handle);
            }
            Err(err) if is_transient(&err) => trace!(%handle, "client read would block"),
            Err(err) => {
                warn!(%handle, %addr, error = %err, "client read failed");
                self.destroy(handle);
            }
        }
    }

    /// Parses the request in the first `len` bytes of the buffer and starts
    /// the target connection.
    ///
    /// An `Err` means the client must be destroyed. A connect that fails
    /// immediately is not an error: the client is left unpaired, as it would
    /// be after a refused non-blocking connect.
    fn open_target(&mut self, client: Handle, len: usize) -> Result<(), Error> {
        let head = RequestHead::parse(&self.buffer[..len])?;

        if !head.is_get() {
            return Err(RequestError::UnsupportedMethod(head.method.to_owned()).into());
        }

        let info = TargetInfo::parse(head.target)?;
        let request = head.rewrite(&info.path)?;

        let addr = self
            .resolver
            .resolve(&info.host, info.port)
            .map_err(|source| Error::Resolve {
                host: info.host.clone(),
                source,
            })?;

        info!(%client, method = head.method, target = %info, %addr, "forwarding request");

        if let Some(HalfConnection::Client(c)) = self.registry.get_mut(client) {
            c.phase = ClientPhase::Forwarded(info.clone());
        }

        let stream = match TcpStream::connect(addr) {
            Ok(stream) => stream,
            Err(err) => {
                warn!(%client, target = %info, error = %err, "connect to target failed");
                return Ok(());
            }
        };

        let target = self
            .registry
            .register_target(&self.poller, stream, client, info, request)?;

        debug!(%client, %target, "target connecting");
        self.arm_idle_timer(target);

        Ok(())
    }

    fn on_target_write(&mut self, handle: Handle) {
        let Some(HalfConnection::Target(target)) = self.registry.get_mut(handle) else {
            return;
        };

        let TargetPhase::Connecting { request } = &target.phase else {
            return;
        };

        if let Err(err) = target.stream.take_error() {
            warn!(%handle, target = %target.info, error = %err, "connect to target failed");
            self.destroy(handle);
            return;
        }

        let total = request.len();

        match target.stream.send(request) {
            Ok(sent) => {
                // Single-shot send: a short write loses the tail of the request.
                if sent < total {
                    warn!(%handle, sent, total, "short write to target");
                }

                debug!(%handle, target = %target.info, bytes = sent, "request sent");
                target.phase = TargetPhase::AwaitingResponse { relayed: 0 };
                self.registry.touch(handle);

                if let Err(err) = self
                    .registry
                    .update_interest(&self.poller, handle, Interest::Readable)
                {
                    warn!(%handle, error = %err, "failed to watch target for reading");
                    self.destroy(handle);
                }
            }
            Err(err) if is_transient(&err) => trace!(%handle, "target write would block"),
            Err(err) => {
                warn!(%handle, target = %target.info, error = %err, "sending request failed");
                self.destroy(handle);
            }
        }
    }

    fn on_target_read(&mut self, handle: Handle) {
        let Some(HalfConnection::Target(target)) = self.registry.get(handle) else {
            return;
        };

        match target.stream.recv(&mut self.buffer) {
            Ok(0) => {
                let relayed = match target.phase {
                    TargetPhase::AwaitingResponse { relayed } => relayed,
                    TargetPhase::Connecting { .. } => 0,
                };
                info!(%handle, target = %target.info, bytes = relayed, "response complete");
                self.finish_response(handle);
            }
            Ok(n) => self.relay(handle, n),
            Err(err) if is_transient(&err) => trace!(%handle, "target read would block"),
            Err(err) => {
                warn!(%handle, target = %target.info, error = %err, "target read failed");
                self.destroy(handle);
            }
        }
    }

    /// Forwards the first `len` bytes of the buffer to the target's client.
    fn relay(&mut self, target: Handle, len: usize) {
        let Some(client) = self.registry.peer_of(target) else {
            debug!(%target, "client is gone, dropping target");
            self.destroy(target);
            return;
        };

        let Some(HalfConnection::Client(c)) = self.registry.get(client) else {
            return;
        };

        // Single-shot send: whatever the client socket does not take is lost.
        match c.stream.send(&self.buffer[..len]) {
            Ok(sent) if sent < len => warn!(%client, sent, received = len, "short write to client"),
            Ok(sent) => trace!(%client, %target, bytes = sent, "relayed"),
            Err(err) if is_transient(&err) => warn!(%client, bytes = len, "client not writable, chunk dropped"),
            Err(err) => warn!(%client, error = %err, "relay to client failed"),
        }

        self.registry.touch(client);
        self.registry.touch(target);

        if let Some(HalfConnection::Target(t)) = self.registry.get_mut(target) {
            if let TargetPhase::AwaitingResponse { relayed } = &mut t.phase {
                *relayed += len;
            }
        }
    }

    /// Destroys a target after origin EOF and half-closes its client so the
    /// client sees the end of the response.
    fn finish_response(&mut self, target: Handle) {
        let client = self.registry.peer_of(target);
        self.destroy(target);

        let Some(client) = client else {
            return;
        };

        if let Some(HalfConnection::Client(c)) = self.registry.get(client) {
            if let Err(err) = c.stream.shutdown(Shutdown::Write) {
                debug!(%client, error = %err, "failed to half-close client");
            }
        }
    }
}
