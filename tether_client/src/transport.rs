// Transport seam between the session and the wire.
//
// The session's duties reach the network through three small traits so that
// a deterministic fake can be injected in tests and the bundled TCP
// transport can be replaced by another frame transport without touching the
// session state machine. The reader half is owned by the receive duty and
// the writer half by the send duty; `FrameWriter::close` must unblock a
// reader parked in `read_frame` (the TCP impl shuts the socket down both
// ways).

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tether_protocol::framing;

use crate::config::Endpoint;

/// One inbound frame. The sync protocol is text-only; binary frames can
/// still arrive from a transport that distinguishes them, and the receive
/// duty ignores them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Blocking reader half of one physical connection.
pub trait FrameReader: Send {
    /// Block until a full frame is available. Any error means the
    /// connection is gone.
    fn read_frame(&mut self) -> io::Result<Frame>;
}

/// Writer half of one physical connection.
pub trait FrameWriter: Send {
    fn write_frame(&mut self, text: &str) -> io::Result<()>;

    /// Bounded-effort graceful close. Must also unblock the reader half.
    fn close(&mut self) -> io::Result<()>;
}

/// Creates one physical connection per call. Each `dial` is one connection
/// attempt; retrying is the supervisor's job, never the dialer's.
pub trait Dialer: Send {
    fn dial(&mut self) -> io::Result<(Box<dyn FrameReader>, Box<dyn FrameWriter>)>;
}

/// The bundled transport: length-delimited text frames over TCP.
pub struct TcpDialer {
    endpoint: Endpoint,
    io_timeout: Duration,
}

impl TcpDialer {
    /// `io_timeout` caps connect and per-write blocking; zero disables the
    /// cap and leaves OS defaults.
    pub fn new(endpoint: Endpoint, io_timeout: Duration) -> Self {
        Self {
            endpoint,
            io_timeout,
        }
    }
}

impl Dialer for TcpDialer {
    fn dial(&mut self) -> io::Result<(Box<dyn FrameReader>, Box<dyn FrameWriter>)> {
        let authority = self.endpoint.authority();
        let stream = if self.io_timeout.is_zero() {
            TcpStream::connect(authority.as_str())?
        } else {
            let addr = authority.as_str().to_socket_addrs()?.next().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address for {authority}"),
                )
            })?;
            TcpStream::connect_timeout(&addr, self.io_timeout)?
        };

        // Cap writes so a wedged peer cannot stall the handshake send (or a
        // drain) forever. Reads stay unbounded: the receive duty
        // legitimately blocks until traffic arrives or the socket closes.
        if !self.io_timeout.is_zero() {
            stream.set_write_timeout(Some(self.io_timeout))?;
        }

        let read_half = stream.try_clone()?;
        let write_half = stream.try_clone()?;
        Ok((
            Box::new(TcpFrameReader {
                reader: BufReader::new(read_half),
            }),
            Box::new(TcpFrameWriter {
                writer: BufWriter::new(write_half),
                stream,
            }),
        ))
    }
}

struct TcpFrameReader {
    reader: BufReader<TcpStream>,
}

impl FrameReader for TcpFrameReader {
    fn read_frame(&mut self) -> io::Result<Frame> {
        framing::read_frame(&mut self.reader).map(Frame::Text)
    }
}

struct TcpFrameWriter {
    writer: BufWriter<TcpStream>,
    // Kept unbuffered for shutdown; `writer` owns a clone of the same socket.
    stream: TcpStream,
}

impl FrameWriter for TcpFrameWriter {
    fn write_frame(&mut self, text: &str) -> io::Result<()> {
        framing::write_frame(&mut self.writer, text)
    }

    fn close(&mut self) -> io::Result<()> {
        // write_frame flushes per frame, so nothing is buffered here;
        // shutdown sends FIN both ways and unblocks the reader half.
        self.stream.shutdown(Shutdown::Both)
    }
}
