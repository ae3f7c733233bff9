//! Text-Formate der Update-Verbindungen
//!
//! - `HttpUrl`: zerlegt `http://host[:port]/path` für den Release-Abruf
//! - `ResponseHead`: Statuszeile + `Content-Length` einer HTTP/1.x-Antwort
//! - `PushHeader`: Kopfzeile eines Push-Updates (`MVOTA <size> <password>`)
//!
//! Die Socket-Arbeit macht die Firmware, hier liegt nur das Parsing.

use crate::traits::TransportError;
use crate::update::PushError;

/// Ende des HTTP-Headers
const HEAD_END: &[u8] = b"\r\n\r\n";

/// Kennung der Push-Kopfzeile
const PUSH_MAGIC: &str = "MVOTA";

/// Zerlegte plain-HTTP URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpUrl<'a> {
    pub host: &'a str,
    pub port: u16,
    /// Pfad inkl. Query, mindestens "/"
    pub path: &'a str,
}

impl<'a> HttpUrl<'a> {
    pub fn parse(url: &'a str) -> Result<Self, TransportError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or(TransportError::UnsupportedUrl)?;

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>()
                    .map_err(|_| TransportError::UnsupportedUrl)?,
            ),
            None => (authority, 80),
        };

        if host.is_empty() {
            return Err(TransportError::UnsupportedUrl);
        }

        Ok(Self { host, port, path })
    }
}

/// Position direkt hinter `\r\n\r\n`, falls der Header vollständig ist
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_END.len())
        .position(|w| w == HEAD_END)
        .map(|pos| pos + HEAD_END.len())
}

/// Relevante Teile eines HTTP-Antwort-Headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_length: Option<u32>,
}

impl ResponseHead {
    /// Parst den Header (ohne Body). Status != 200 ist ein Fehler.
    pub fn parse(head: &[u8]) -> Result<Self, TransportError> {
        let text = core::str::from_utf8(head).map_err(|_| TransportError::Io)?;
        let mut lines = text.split("\r\n");

        let status_line = lines.next().ok_or(TransportError::Io)?;
        let mut parts = status_line.split(' ');
        let version = parts.next().unwrap_or("");
        if !version.starts_with("HTTP/1.") {
            return Err(TransportError::Io);
        }
        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or(TransportError::Io)?;

        let content_length = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<u32>().ok());

        if status != 200 {
            return Err(TransportError::Status(status));
        }

        Ok(Self {
            status,
            content_length,
        })
    }
}

/// Kopfzeile eines Push-Updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushHeader<'a> {
    /// Image-Größe in Bytes
    pub size: u32,
    pub password: &'a str,
}

impl<'a> PushHeader<'a> {
    /// Parst `MVOTA <size> [password]` (ohne Zeilenende)
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut parts = line.trim().split_ascii_whitespace();
        if parts.next()? != PUSH_MAGIC {
            return None;
        }
        let size = parts.next()?.parse::<u32>().ok().filter(|&size| size > 0)?;
        let password = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return None;
        }
        Some(Self { size, password })
    }

    /// Passwort-Prüfung, leeres `expected` akzeptiert alles
    pub fn authorize(&self, expected: &str) -> Result<(), PushError> {
        if expected.is_empty() || self.password == expected {
            Ok(())
        } else {
            Err(PushError::Auth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_port_and_path() {
        let url = HttpUrl::parse("http://updates.local:8080/releases/latest").unwrap();
        assert_eq!(url.host, "updates.local");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/releases/latest");
    }

    #[test]
    fn test_url_defaults() {
        let url = HttpUrl::parse("http://192.168.1.10").unwrap();
        assert_eq!(url.host, "192.168.1.10");
        assert_eq!(url.port, 80);
        assert_eq!(url.path, "/");
    }

    #[test]
    fn test_url_rejects_https_and_garbage() {
        assert_eq!(
            HttpUrl::parse("https://api.github.com/repos/x/y/releases/latest"),
            Err(TransportError::UnsupportedUrl)
        );
        assert_eq!(
            HttpUrl::parse("http://host:http/"),
            Err(TransportError::UnsupportedUrl)
        );
        assert_eq!(HttpUrl::parse("http:///x"), Err(TransportError::UnsupportedUrl));
    }

    #[test]
    fn test_head_end() {
        assert_eq!(find_head_end(b"HTTP/1.0 200 OK\r\n\r\nbody"), Some(19));
        assert_eq!(find_head_end(b"HTTP/1.0 200 OK\r\n"), None);
    }

    #[test]
    fn test_response_head_ok() {
        let head = ResponseHead::parse(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\ncontent-length: 1234\r\n\r\n",
        )
        .unwrap();
        assert_eq!(head.status, 200);
        assert_eq!(head.content_length, Some(1234));
    }

    #[test]
    fn test_response_head_without_length() {
        let head = ResponseHead::parse(b"HTTP/1.0 200 OK\r\nServer: x\r\n\r\n").unwrap();
        assert_eq!(head.content_length, None);
    }

    #[test]
    fn test_response_head_status_error() {
        assert_eq!(
            ResponseHead::parse(b"HTTP/1.1 404 Not Found\r\n\r\n"),
            Err(TransportError::Status(404))
        );
        assert_eq!(
            ResponseHead::parse(b"SSH-2.0-OpenSSH\r\n\r\n"),
            Err(TransportError::Io)
        );
    }

    #[test]
    fn test_push_header() {
        let header = PushHeader::parse("MVOTA 552672 secret\n").unwrap();
        assert_eq!(header.size, 552672);
        assert_eq!(header.password, "secret");
        assert_eq!(header.authorize("secret"), Ok(()));
        assert_eq!(header.authorize("other"), Err(PushError::Auth));

        let open = PushHeader::parse("MVOTA 1024").unwrap();
        assert_eq!(open.authorize(""), Ok(()));
        assert_eq!(open.authorize("secret"), Err(PushError::Auth));
    }

    #[test]
    fn test_push_header_invalid() {
        assert_eq!(PushHeader::parse("OTA 1024"), None);
        assert_eq!(PushHeader::parse("MVOTA"), None);
        assert_eq!(PushHeader::parse("MVOTA 0"), None);
        assert_eq!(PushHeader::parse("MVOTA abc"), None);
        assert_eq!(PushHeader::parse("MVOTA 10 a b"), None);
    }
}
