//! # One-shot HTTP Server for Fetcher Tests
//!
//! A plain `TcpListener` on 127.0.0.1 that answers a single request with a
//! canned response and hands back the request head it received, so the
//! fetchers can be checked against real status codes and timeouts without
//! leaving the machine.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

/// Raw HTTP/1.1 response with the given status line and body.
pub fn response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serve `reply` to the first connection.
///
/// Returns the base URL to point a config at, and a handle yielding the
/// request line and headers that were received.
pub fn serve_once(reply: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let head = read_head(&stream);
        stream.write_all(reply.as_bytes()).unwrap();
        head
    });
    (url, handle)
}

/// Accept the first connection and never answer it.
pub fn serve_silently() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_head(&stream);
        // Blocks until the client gives up and closes the connection
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
    });
    url
}

/// Request line and headers, up to the blank line.
fn read_head(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) if line == "\r\n" => break,
            Ok(_) => head.push_str(&line),
        }
    }
    head
}
