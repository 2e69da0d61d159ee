//! The live session engine: one authenticated TCP connection to the gateway
//! with a double-buffered io_uring receive loop.

mod framing;
pub mod multi;
mod protocol;
mod ring;

use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::os::fd::AsRawFd;

use log::{debug, error, info};
use socket2::{Domain, Protocol as SockProtocol, Socket, Type};

use crate::{
    enums::{SType, Schema},
    error::{Error, Result},
    record::ErrorMsg,
    record_ref::RecordRef,
};
use framing::FrameAssembler;
pub use multi::MultiClient;
use ring::RecvRing;

pub(crate) use protocol::ALL_SYMBOLS;

/// The receive buffer size requested from the kernel, which is also the size
/// of each userland receive buffer. Sessions fail to connect when the kernel
/// grants less (see `net.core.rmem_max`).
pub const RECV_BUFFER_SIZE: usize = 1024 * 1024 * 64;

/// A handler for the records and errors of one session.
///
/// Records are borrowed views into the session's receive buffers: they are
/// valid only for the duration of the callback and can't be retained, which
/// the `RecordRef` lifetime enforces.
pub trait SessionHandler: Send {
    /// Called with every record received, in wire order.
    fn on_record(&mut self, record: RecordRef);

    /// Called when an error occurs. If [`Error::is_fatal`] returns `true`,
    /// further communication over the session is unlikely to succeed and the
    /// operation that observed the error will also return it.
    fn on_error(&mut self, error: &Error) {
        let _ = error;
    }
}

/// A no-op handler, for sessions driven only for their side effects.
impl SessionHandler for () {
    fn on_record(&mut self, _record: RecordRef) {}
}

/// The streaming half of a session, which only exists between a successful
/// [`Session::start`] and [`Session::close`].
struct Streaming {
    ring: RecvRing,
    assembler: FrameAssembler,
}

/// A single live data session. The owning thread drives the session through
/// [`connect`](Self::connect), [`start`](Self::start), repeated
/// [`get`](Self::get) calls, and [`close`](Self::close); all callbacks run
/// on that thread.
pub struct Session<H> {
    handler: H,
    dataset: String,
    stream: Option<TcpStream>,
    streaming: Option<Streaming>,
    capacity: usize,
}

impl<H: SessionHandler> Session<H> {
    /// Creates a new unconnected session dispatching to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            dataset: String::new(),
            stream: None,
            streaming: None,
            capacity: 0,
        }
    }

    /// Returns a reference to the configured handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns a mutable reference to the configured handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Connects to the live gateway for `dataset` and authenticates with
    /// `api_key`. If `send_ts_out` is `true`, the gateway will append a
    /// sending timestamp to every record.
    ///
    /// # Errors
    /// This function returns an error if the socket can't be created or
    /// connected, if the kernel grants a receive buffer smaller than
    /// [`RECV_BUFFER_SIZE`], or if the gateway rejects authentication. All
    /// errors are also reported to the handler.
    pub fn connect(&mut self, api_key: &str, dataset: &str, send_ts_out: bool) -> Result<()> {
        let host = protocol::gateway_host(dataset);
        let addr = (host.as_str(), protocol::LIVE_GATEWAY_PORT);
        match self.try_connect(addr, api_key, dataset, send_ts_out) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.report(e)),
        }
    }

    /// Connects to the live gateway at an explicit `addr`. Most callers
    /// want [`connect()`](Self::connect), which derives the address from
    /// the dataset name; this entry point exists for pointing a session at
    /// a non-standard gateway.
    ///
    /// # Errors
    /// This function returns an error under the same conditions as
    /// [`connect()`](Self::connect).
    pub fn connect_with_addr(
        &mut self,
        addr: impl ToSocketAddrs,
        api_key: &str,
        dataset: &str,
        send_ts_out: bool,
    ) -> Result<()> {
        match self.try_connect(addr, api_key, dataset, send_ts_out) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.report(e)),
        }
    }

    fn try_connect(
        &mut self,
        addr: impl ToSocketAddrs,
        api_key: &str,
        dataset: &str,
        send_ts_out: bool,
    ) -> Result<()> {
        if api_key.len() < protocol::BUCKET_ID_LENGTH || !api_key.is_ascii() {
            return Err(Error::bad_argument("api_key", "malformed API key"));
        }
        if self.stream.is_some() {
            return Err(Error::bad_argument("session", "already connected"));
        }
        self.dataset = dataset.to_owned();

        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(SockProtocol::TCP))
            .map_err(|e| Error::io(e, "creating socket"))?;
        socket
            .set_recv_buffer_size(RECV_BUFFER_SIZE)
            .map_err(|e| Error::io(e, "setting socket buffer size"))?;
        // The kernel may round the granted size up or clamp it down. Size
        // the userland buffers to whatever it actually granted.
        let granted = socket
            .recv_buffer_size()
            .map_err(|e| Error::io(e, "reading socket buffer size"))?;
        if granted < RECV_BUFFER_SIZE {
            return Err(Error::io(
                std::io::Error::new(
                    std::io::ErrorKind::OutOfMemory,
                    format!("socket receive buffer limited to {granted} bytes"),
                ),
                "setting socket buffer size",
            ));
        }
        self.capacity = granted;

        let addr = resolve_ipv4(addr)?;
        debug!("[{dataset}] Connecting to gateway at {addr}");
        socket
            .connect(&addr.into())
            .map_err(|e| Error::io(e, format!("connecting to gateway at {addr}")))?;
        let stream: TcpStream = socket.into();

        protocol::authenticate(&mut (&stream), &mut (&stream), api_key, dataset, send_ts_out)?;
        info!("[{dataset}] Authenticated");
        self.stream = Some(stream);
        Ok(())
    }

    /// Subscribes to `schema` for `symbols` (an empty list subscribes to all
    /// symbols) and starts the binary stream. `suffix` is appended to every
    /// symbol, e.g. `".OPT"`. If `replay` is `true`, the gateway replays the
    /// current day's worth of data before switching to live data.
    ///
    /// # Errors
    /// This function returns an error if the session is not connected, if a
    /// subscription request can't be sent, or if the stream preamble is
    /// malformed. All errors are also reported to the handler.
    pub fn start(
        &mut self,
        schema: Schema,
        stype_in: SType,
        symbols: &[String],
        suffix: &str,
        replay: bool,
    ) -> Result<()> {
        match self.try_start(schema, stype_in, symbols, suffix, replay) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.report(e)),
        }
    }

    fn try_start(
        &mut self,
        schema: Schema,
        stype_in: SType,
        symbols: &[String],
        suffix: &str,
        replay: bool,
    ) -> Result<()> {
        let Some(stream) = self.stream.as_ref() else {
            return Err(Error::bad_argument("session", "not connected"));
        };
        protocol::write_subscriptions(&mut (&*stream), schema, stype_in, symbols, suffix, replay)?;
        protocol::write_session_start(&mut (&*stream))?;
        protocol::read_preamble(&mut (&*stream))?;

        let ring = RecvRing::new(stream.as_raw_fd(), self.capacity)
            .map_err(|e| Error::io(e, "initializing receive ring"))?;
        self.streaming = Some(Streaming {
            ring,
            assembler: FrameAssembler::new(self.capacity),
        });
        info!(
            "[{}] Streaming {schema} for {} symbol(s)",
            self.dataset,
            symbols.len()
        );
        Ok(())
    }

    /// Blocks until the next receive completion and dispatches every
    /// complete record in it to the handler. Returns the number of records
    /// dispatched, which is zero when the wait was interrupted by a signal
    /// or the completion held less than one full record.
    ///
    /// # Errors
    /// This function returns an error if the session is not started, the
    /// connection is lost, or the stream violates the framing. All errors
    /// are also reported to the handler.
    pub fn get(&mut self) -> Result<usize> {
        match self.try_get() {
            Ok(n) => Ok(n),
            Err(e) => Err(self.report(e)),
        }
    }

    fn try_get(&mut self) -> Result<usize> {
        let Some(streaming) = self.streaming.as_mut() else {
            return Err(Error::bad_argument("session", "not started"));
        };
        let handler = &mut self.handler;

        let completion = streaming
            .ring
            .wait()
            .map_err(|e| Error::io(e, "waiting on receive ring"))?;
        let Some((index, received)) = completion else {
            // Interrupted by a signal.
            return Ok(0);
        };
        if received == 0 {
            return Err(Error::ConnectionLost);
        }

        let buffer = streaming.ring.buffer_mut(index);
        let num_records = streaming.assembler.drain(buffer, received, |record| {
            // A gateway error record is dispatched like any other, then
            // surfaced through the error callback without interrupting the
            // stream.
            let gateway_err = record
                .get::<ErrorMsg>()
                .map(|emsg| emsg.err().unwrap_or_default().to_owned());
            handler.on_record(record);
            if let Some(text) = gateway_err {
                handler.on_error(&Error::Gateway(text));
            }
        })?;

        streaming
            .ring
            .resubmit(index)
            .map_err(|e| Error::io(e, "resubmitting receive"))?;
        Ok(num_records)
    }

    /// Tears down the receive ring, closes the socket, and releases the
    /// buffers. Safe to call in any state, including after a failed
    /// [`connect`](Self::connect). Never invokes callbacks.
    pub fn close(&mut self) {
        self.streaming = None;
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!("[{}] Session closed", self.dataset);
        }
    }

    fn report(&mut self, err: Error) -> Error {
        if err.is_fatal() {
            error!("[{}] {err}", self.dataset);
        }
        self.handler.on_error(&err);
        err
    }
}

impl<H> Drop for Session<H> {
    fn drop(&mut self) {
        self.streaming = None;
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Resolves `addr` to the first IPv4 address.
fn resolve_ipv4(addr: impl ToSocketAddrs) -> Result<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|e| Error::io(e, "resolving gateway address"))?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| {
            Error::io(
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no IPv4 address for gateway",
                ),
                "resolving gateway address",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        errors: Vec<String>,
    }

    impl SessionHandler for Recorder {
        fn on_record(&mut self, _record: RecordRef) {}

        fn on_error(&mut self, error: &Error) {
            self.errors.push(error.to_string());
        }
    }

    #[test]
    fn get_before_start_reports_and_fails() {
        let mut session = Session::new(Recorder::default());
        assert!(matches!(session.get(), Err(Error::BadArgument { .. })));
        assert_eq!(session.handler().errors.len(), 1);
    }

    #[test]
    fn start_before_connect_reports_and_fails() {
        let mut session = Session::new(Recorder::default());
        let result = session.start(Schema::Definition, SType::Parent, &[], "", true);
        assert!(matches!(result, Err(Error::BadArgument { .. })));
        assert_eq!(session.handler().errors.len(), 1);
    }

    #[test]
    fn malformed_key_is_rejected() {
        let mut session = Session::new(Recorder::default());
        let result = session.connect("abc", "OPRA.PILLAR", false);
        assert!(matches!(result, Err(Error::BadArgument { .. })));
    }

    #[test]
    fn close_is_idempotent_in_any_state() {
        let mut session = Session::new(());
        session.close();
        session.close();
    }
}
