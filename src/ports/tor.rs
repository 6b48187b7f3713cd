//! Minimal Tor control-port NEWNYM signal sender. Opens a TCP connection to
//! `127.0.0.1:<port>`, authenticates (password or empty), and sends
//! `SIGNAL NEWNYM`. Any failure is logged and swallowed — non-fatal per the
//! configuration contract.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::warn;

/// Request a fresh Tor circuit. Returns `true` only on a clean `250 OK`
/// round trip for both AUTHENTICATE and SIGNAL NEWNYM.
pub fn request_new_identity(control_port: u16, control_password: Option<&str>) -> bool {
    match try_request_new_identity(control_port, control_password) {
        Ok(ok) => ok,
        Err(err) => {
            warn!(marker = "TOR_USAGE", %err, control_port, "failed to signal NEWNYM, continuing without a fresh circuit");
            false
        }
    }
}

fn try_request_new_identity(control_port: u16, control_password: Option<&str>) -> std::io::Result<bool> {
    let stream = TcpStream::connect(("127.0.0.1", control_port))?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.set_write_timeout(Some(Duration::from_secs(5)))?;

    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let auth_line = match control_password {
        Some(password) => format!("AUTHENTICATE \"{password}\"\r\n"),
        None => "AUTHENTICATE\r\n".to_string(),
    };
    writer.write_all(auth_line.as_bytes())?;
    let mut response = String::new();
    reader.read_line(&mut response)?;
    if !response.starts_with("250") {
        return Ok(false);
    }

    writer.write_all(b"SIGNAL NEWNYM\r\n")?;
    response.clear();
    reader.read_line(&mut response)?;
    Ok(response.starts_with("250"))
}
