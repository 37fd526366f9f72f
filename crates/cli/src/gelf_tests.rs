// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

fn pair() -> (UdpSocket, GelfWriter) {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    let endpoint = receiver.local_addr().unwrap().to_string();
    (receiver, GelfWriter::connect(&endpoint).unwrap())
}

fn recv(receiver: &UdpSocket) -> String {
    let mut buf = [0u8; 4096];
    receiver
        .set_read_timeout(Some(std::time::Duration::from_secs(2)))
        .unwrap();
    let n = receiver.recv(&mut buf).unwrap();
    String::from_utf8(buf[..n].to_vec()).unwrap()
}

#[test]
fn one_datagram_per_line() {
    let (receiver, writer) = pair();
    let mut w = writer.make_writer();

    w.write_all(b"{\"msg\":\"first\"}\n{\"msg\":\"second\"}\n").unwrap();

    assert_eq!(recv(&receiver), "{\"msg\":\"first\"}");
    assert_eq!(recv(&receiver), "{\"msg\":\"second\"}");
}

#[test]
fn partial_writes_are_buffered_until_newline() {
    let (receiver, writer) = pair();
    let mut w = writer.make_writer();

    w.write_all(b"{\"msg\":").unwrap();
    w.write_all(b"\"split\"}").unwrap();
    w.write_all(b"\n").unwrap();

    assert_eq!(recv(&receiver), "{\"msg\":\"split\"}");
}

#[test]
fn flush_ships_incomplete_line() {
    let (receiver, writer) = pair();
    let mut w = writer.make_writer();

    w.write_all(b"tail without newline").unwrap();
    w.flush().unwrap();

    assert_eq!(recv(&receiver), "tail without newline");
}
