// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log shipping boundary: JSON log records as UDP datagrams, one per line.

use std::io;
use std::net::UdpSocket;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Ships whole log lines to a GELF UDP endpoint.
#[derive(Clone)]
pub struct GelfWriter {
    socket: Arc<UdpSocket>,
}

impl GelfWriter {
    pub fn connect(endpoint: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(endpoint)?;
        Ok(Self { socket: Arc::new(socket) })
    }
}

impl<'a> MakeWriter<'a> for GelfWriter {
    type Writer = DatagramWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DatagramWriter { socket: self.socket.clone(), buffer: Vec::new() }
    }
}

/// Buffers until a full line is available, then sends it as one datagram.
/// The formatter may hand over a record in several writes; the endpoint
/// must still receive exactly one datagram per record.
pub struct DatagramWriter {
    socket: Arc<UdpSocket>,
    buffer: Vec<u8>,
}

impl io::Write for DatagramWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = &line[..line.len() - 1];
            if !line.is_empty() {
                let _ = self.socket.send(line);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let _ = self.socket.send(&self.buffer);
            self.buffer.clear();
        }
        Ok(())
    }
}

impl Drop for DatagramWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

#[cfg(test)]
#[path = "gelf_tests.rs"]
mod tests;
