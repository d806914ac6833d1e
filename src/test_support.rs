//! Loopback HTTP server shared by the transport and end-to-end tests.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

/// Serve `count` connections on 127.0.0.1, answering each with the bytes
/// `respond` builds from the request head (request line plus headers).
/// Returns the base URL.
pub(crate) fn serve<F>(count: usize, respond: F) -> String
where
    F: Fn(&str) -> Vec<u8> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        for stream in listener.incoming().take(count) {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            let _ = stream.write_all(&respond(&head));
        }
    });
    base
}

/// Path of the request line in `head`.
pub(crate) fn request_path(head: &str) -> &str {
    head.split_whitespace().nth(1).unwrap_or("/")
}

/// `200 OK` with the extra `headers` (each ending in CRLF) and `body`.
pub(crate) fn ok(headers: &str, body: &str) -> Vec<u8> {
    format!("HTTP/1.1 200 OK\r\n{}Connection: close\r\n\r\n{}", headers, body).into_bytes()
}
