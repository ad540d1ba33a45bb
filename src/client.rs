//! Blocking client
//!
//! Opens a connection, writes one line per request and reads one response.

use std::io::BufReader;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{read_response, write_command, Response, RESPONSE_BUFFER_SIZE};

/// A connection to a LodeKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    /// Connect with `timeout` applied to reads and writes
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::with_capacity(RESPONSE_BUFFER_SIZE, stream),
            writer,
        })
    }

    /// Send one command line and wait for its response
    pub fn request(&mut self, line: &str) -> Result<Response> {
        write_command(&mut self.writer, line)?;
        read_response(&mut self.reader)
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.writer.peer_addr()?)
    }
}
