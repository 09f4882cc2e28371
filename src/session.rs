//! Switch session lifecycle
//!
//! A [`Session`] owns the TCP socket exclusively for its whole lifetime:
//! connect, authenticate, exchange commands one at a time, deauthenticate,
//! close. The protocol is half-duplex at the application level: `&mut self`
//! on [`Session::exchange`] is what enforces the one-outstanding-command
//! discipline, and consuming `self` in [`Session::logout`] guarantees the
//! socket is closed exactly once on every exit path.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, trace};

use crate::commands;
use crate::config::SwitchConfig;
use crate::error::{Result, Tl1Error};
use crate::policy::ErrorPolicy;
use crate::response::{ResponseBlock, ResponseReader};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// TCP connected, not yet authenticated
    Connected,
    /// `act-user` accepted
    Authenticated,
    /// `canc-user` sent, socket about to close
    Closed,
}

/// An authenticated TL1 session with one switch.
#[derive(Debug)]
pub struct Session {
    stream: TcpStream,
    config: SwitchConfig,
    state: SessionState,
}

impl Session {
    /// Open the TCP connection to the switch.
    ///
    /// An unreachable or unresolvable address fails with
    /// [`Tl1Error::ConnectionFailure`]; there is no recovery path from it.
    pub fn connect(config: SwitchConfig) -> Result<Self> {
        debug!("connecting to switch {}:{}", config.host, config.port);

        let addr = format!("{}:{}", config.host, config.port);
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| Tl1Error::ConnectionFailure(addr.clone(), e.to_string()))?
            .next()
            .ok_or_else(|| {
                Tl1Error::ConnectionFailure(addr.clone(), "no address resolved".to_string())
            })?;

        let domain = if socket_addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

        // Command/response traffic is tiny and latency bound.
        socket.set_nodelay(true)?;

        socket
            .connect_timeout(&socket_addr.into(), config.connect_timeout)
            .map_err(|e| Tl1Error::ConnectionFailure(addr, e.to_string()))?;

        let stream: TcpStream = socket.into();
        stream.set_read_timeout(Some(config.read_timeout))?;

        debug!("connected to {}", socket_addr);
        Ok(Self {
            stream,
            config,
            state: SessionState::Connected,
        })
    }

    /// The configuration this session was opened with.
    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Whether `act-user` has been accepted.
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Write one encoded command and drain its response block under the
    /// given policy. The single entry point for all command traffic.
    pub fn exchange(&mut self, command: &str, policy: ErrorPolicy) -> Result<ResponseBlock> {
        trace!("sending: {}", command.trim_end());
        self.stream.write_all(command.as_bytes())?;
        self.stream.flush()?;
        ResponseReader::new(&mut self.stream, policy).read_block()
    }

    /// Authenticate with the credentials from the configuration.
    ///
    /// After a successful `act-user` the observed protocol fires an
    /// equipment-state probe whose raw reply is read but never classified.
    pub fn login(&mut self, policy: ErrorPolicy) -> Result<()> {
        debug!("logging in as {}", self.config.username);

        let cmd = commands::act_user(&self.config.username, &self.config.password);
        self.exchange(&cmd, policy)?;
        self.state = SessionState::Authenticated;

        // Best-effort probe; a failure here never fails the login.
        let probe = commands::opr_arc_eqpt();
        let mut scratch = [0u8; 1024];
        let _ = self
            .stream
            .write_all(probe.as_bytes())
            .and_then(|_| self.stream.flush())
            .and_then(|_| self.stream.read(&mut scratch));

        debug!("login successful");
        Ok(())
    }

    /// Deauthenticate and close.
    ///
    /// The socket is released on every path out of this function, success or
    /// failure, because `self` is consumed.
    pub fn logout(mut self, policy: ErrorPolicy) -> Result<()> {
        debug!("logging out {}", self.config.username);

        let cmd = commands::canc_user(&self.config.username);
        let result = self.exchange(&cmd, policy).map(|_| ());
        self.state = SessionState::Closed;
        result
    }
}
