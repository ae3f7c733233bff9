// Minimaler HTTP/1.0 GET-Client über embassy-net
//
// HTTP/1.0 ohne Keep-Alive: der Server antwortet ohne Chunked-Encoding
// und schließt die Verbindung am Ende des Bodys.

use defmt::{Debug2Format, info};
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Ipv4Address, Stack};
use embassy_time::{Duration, with_timeout};
use embedded_io_async::Write;
use musicviz_core::{HttpUrl, ResponseHead, TransportError, net::find_head_end};

use crate::config::{DNS_TIMEOUT_SECS, OTA_SOCKET_TIMEOUT_SECS};

/// Geöffnete Antwort, Header bereits gelesen
pub struct HttpGet<'a> {
    socket: TcpSocket<'a>,
    head_buf: &'a mut [u8],
    /// Body-Bytes, die mit dem Header gelesen wurden
    pending: core::ops::Range<usize>,
    content_length: Option<u32>,
    received: u32,
}

impl<'a> HttpGet<'a> {
    /// Verbindet, sendet den Request und liest den Antwort-Header
    pub async fn open(
        stack: Stack<'static>,
        url: &str,
        rx_buf: &'a mut [u8],
        tx_buf: &'a mut [u8],
        head_buf: &'a mut [u8],
    ) -> Result<Self, TransportError> {
        let url = HttpUrl::parse(url)?;
        let addr = resolve_host(stack, url.host).await?;

        let mut socket = TcpSocket::new(stack, rx_buf, tx_buf);
        socket.set_timeout(Some(Duration::from_secs(OTA_SOCKET_TIMEOUT_SECS)));
        socket
            .connect((addr, url.port))
            .await
            .map_err(|_| TransportError::Connect)?;

        let mut request = heapless::Vec::<u8, 384>::new();
        for part in [
            b"GET ".as_slice(),
            url.path.as_bytes(),
            b" HTTP/1.0\r\nHost: ",
            url.host.as_bytes(),
            b"\r\nUser-Agent: esp-musicviz\r\nConnection: close\r\n\r\n",
        ] {
            request
                .extend_from_slice(part)
                .map_err(|_| TransportError::TooLarge)?;
        }
        socket
            .write_all(&request)
            .await
            .map_err(|_| TransportError::Io)?;

        let mut filled = 0;
        let body_start = loop {
            if filled >= head_buf.len() {
                return Err(TransportError::TooLarge);
            }
            let n = socket
                .read(&mut head_buf[filled..])
                .await
                .map_err(|_| TransportError::Io)?;
            if n == 0 {
                return Err(TransportError::Io);
            }
            filled += n;
            if let Some(end) = find_head_end(&head_buf[..filled]) {
                break end;
            }
        };

        let head = ResponseHead::parse(&head_buf[..body_start])?;
        info!(
            "HTTP GET: {} {} (length {})",
            url.path,
            head.status,
            Debug2Format(&head.content_length)
        );

        Ok(Self {
            socket,
            head_buf,
            pending: body_start..filled,
            content_length: head.content_length,
            received: 0,
        })
    }

    pub fn content_length(&self) -> Option<u32> {
        self.content_length
    }

    /// Liest den nächsten Body-Abschnitt, 0 = Ende
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.content_length.is_some_and(|len| self.received >= len) {
            return Ok(0);
        }

        let n = if !self.pending.is_empty() {
            let n = self.pending.len().min(buf.len());
            let start = self.pending.start;
            buf[..n].copy_from_slice(&self.head_buf[start..start + n]);
            self.pending.start += n;
            n
        } else {
            self.socket.read(buf).await.map_err(|_| TransportError::Io)?
        };

        if n == 0 && self.content_length.is_some() {
            // Verbindung vor dem angekündigten Ende geschlossen
            return Err(TransportError::Io);
        }
        self.received += n as u32;
        Ok(n)
    }

    /// Liest den ganzen Body nach `buf`
    pub async fn read_to_end(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut len = 0;
        loop {
            if len == buf.len() {
                // Voll: nur ok wenn der Body tatsächlich zu Ende ist
                let mut probe = [0u8; 1];
                return match self.read(&mut probe).await? {
                    0 => Ok(len),
                    _ => Err(TransportError::TooLarge),
                };
            }
            match self.read(&mut buf[len..]).await? {
                0 => return Ok(len),
                n => len += n,
            }
        }
    }
}

impl Drop for HttpGet<'_> {
    fn drop(&mut self) {
        self.socket.abort();
    }
}

/// Löst Hostname oder IP-Literal zu einer IPv4-Adresse auf
pub async fn resolve_host(stack: Stack<'static>, host: &str) -> Result<IpAddress, TransportError> {
    if let Ok(ip) = host.parse::<Ipv4Address>() {
        return Ok(IpAddress::Ipv4(ip));
    }

    match with_timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        stack.dns_query(host, DnsQueryType::A),
    )
    .await
    {
        Ok(Ok(addrs)) => addrs.first().copied().ok_or(TransportError::Dns),
        Ok(Err(_)) | Err(_) => Err(TransportError::Dns),
    }
}
