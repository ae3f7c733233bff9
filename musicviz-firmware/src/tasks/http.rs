// HTTP Server Task - Serviert HTML und reicht API-Anfragen an den Controller
//
// Die Handler kennen keine Gerätelogik: Methode, Pfad und Body gehen als
// `HttpRequest` an den Controller, die Antwort kommt über den Slot des
// Tasks zurück.

extern crate alloc;

use alloc::string::String;
use core::fmt::Arguments;
use core::str::FromStr;
use core::sync::atomic::{AtomicU32, Ordering};

use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::{Duration, with_timeout};
use musicviz_core::{ContentType, HttpReply, HttpRequest, Method};
use picoserve::io::embedded_io_async;
use picoserve::response::{IntoResponse, Response, StatusCode};
use picoserve::routing::{get, parse_path_segment};

use crate::config::*;
use crate::web::{INDEX_HTML, protocol::MusicAck};
use crate::{HttpReplySlots, HttpRequestSender};

/// Maximale Wartezeit auf den Controller (z.B. während eines Downloads)
///
/// Eine abgelaufene Anfrage bleibt in der Queue und wird trotzdem noch
/// ausgeführt; der Client bekommt nur kein Ergebnis.
const REPLY_TIMEOUT_SECS: u64 = 5;

/// Laufende Nummer aller weitergereichten Anfragen
static NEXT_SEQ: AtomicU32 = AtomicU32::new(0);

/// Ein Pfad-Segment wie `rainbow` in `/strip/mode/rainbow`
struct Segment(heapless::String<24>);

impl FromStr for Segment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segment = heapless::String::new();
        segment.push_str(s).map_err(|_| ())?;
        Ok(Self(segment))
    }
}

/// Handle auf Controller-Queue und eigenen Antwort-Slot
#[derive(Clone, Copy)]
struct Forwarder {
    slot: u8,
    requests: HttpRequestSender,
    replies: &'static HttpReplySlots,
}

impl Forwarder {
    /// Baut die Anfrage sofort, das Future hält keine Leihgaben
    fn forward(
        self,
        method: Method,
        path: Arguments<'_>,
        body: &str,
    ) -> impl Future<Output = ControllerReply> + use<> {
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        let request = HttpRequest::new(self.slot, method, path, body).with_seq(seq);
        async move {
            let reply_slot = &self.replies[usize::from(self.slot)];
            reply_slot.reset();
            self.requests.send(request).await;

            // Antworten auf früher abgelaufene Anfragen dieses Slots verwerfen
            let own_reply = async {
                loop {
                    let reply = reply_slot.wait().await;
                    if reply.answers(self.slot, seq) {
                        break reply;
                    }
                    warn!("HTTP: Dropping stale reply (slot {}, seq {})", self.slot, reply.seq);
                }
            };

            match with_timeout(Duration::from_secs(REPLY_TIMEOUT_SECS), own_reply).await {
                Ok(reply) => ControllerReply::Reply(reply),
                Err(_) => {
                    warn!("HTTP: Controller did not answer (slot {})", self.slot);
                    ControllerReply::Busy
                }
            }
        }
    }
}

/// Antwort des Controllers oder Timeout
enum ControllerReply {
    Reply(HttpReply),
    Busy,
}

impl IntoResponse for ControllerReply {
    async fn write_to<
        R: embedded_io_async::Read,
        W: picoserve::response::ResponseWriter<Error = R::Error>,
    >(
        self,
        connection: picoserve::response::Connection<'_, R>,
        response_writer: W,
    ) -> Result<picoserve::ResponseSent, W::Error> {
        let reply = match self {
            ControllerReply::Reply(reply) => reply,
            ControllerReply::Busy => {
                return Response::new(StatusCode::new(503), "Device busy")
                    .with_header("Retry-After", "5")
                    .write_to(connection, response_writer)
                    .await;
            }
        };

        let status = StatusCode::new(reply.status);
        match reply.content_type {
            ContentType::Json => {
                let ack = MusicAck::from_reply(reply.status, reply.body.as_str());
                let mut json_buffer = [0u8; JSON_ACK_BUFFER_SIZE];
                let n = serde_json_core::to_slice(&ack, &mut json_buffer).unwrap_or(0);
                let json = core::str::from_utf8(&json_buffer[..n]).unwrap_or("{}");
                Response::new(status, json)
                    .with_header("Content-Type", ContentType::Json.mime())
                    .write_to(connection, response_writer)
                    .await
            }
            ContentType::Text => {
                Response::new(status, reply.body.as_str())
                    .with_header("Content-Type", ContentType::Text.mime())
                    .write_to(connection, response_writer)
                    .await
            }
        }
    }
}

/// HTTP Server Task - läuft parallel zu anderen Tasks
///
/// Dieser Task stellt den HTTP-Server bereit:
/// - Serviert index.html auf GET /
/// - `/status`, `/info`, `/ping`, `/led/*`, `/strip/*`, `/auto-update/*`
/// - `POST /music/data` bzw. `/api/music` mit freiem Body
///
/// **Task Pool:** Diese Task wird `HTTP_TASK_COUNT`x gespawnt, jede
/// Instanz bedient eine Verbindung und besitzt einen Antwort-Slot.
///
/// # Parameter
/// - `task_id`: Eindeutige ID = Antwort-Slot
/// - `stack`: embassy-net Stack für Netzwerk-Zugriff
/// - `requests`: Queue zum Controller
/// - `replies`: Antwort-Slots aller HTTP-Tasks
#[embassy_executor::task(pool_size = HTTP_TASK_COUNT)]
pub async fn http_server_task(
    task_id: usize,
    stack: Stack<'static>,
    requests: HttpRequestSender,
    replies: &'static HttpReplySlots,
) {
    info!("HTTP: Server task {} starting on port 80...", task_id);

    let fwd = Forwarder {
        slot: task_id as u8,
        requests,
        replies,
    };

    let app = picoserve::Router::new()
        .route("/", get(serve_html))
        .route(
            "/status",
            get(move || fwd.forward(Method::Get, format_args!("/status"), "")),
        )
        .route(
            "/info",
            get(move || fwd.forward(Method::Get, format_args!("/info"), "")),
        )
        .route(
            "/ping",
            get(move || fwd.forward(Method::Get, format_args!("/ping"), "")),
        )
        .route(
            ("/led", parse_path_segment::<Segment>()),
            get(move |action: Segment| {
                fwd.forward(Method::Get, format_args!("/led/{}", action.0), "")
            }),
        )
        .route(
            ("/strip/mode", parse_path_segment::<Segment>()),
            get(move |mode: Segment| {
                fwd.forward(Method::Get, format_args!("/strip/mode/{}", mode.0), "")
            }),
        )
        .route(
            ("/strip/color", parse_path_segment::<Segment>()),
            get(move |color: Segment| {
                fwd.forward(Method::Get, format_args!("/strip/color/{}", color.0), "")
            }),
        )
        .route(
            ("/auto-update", parse_path_segment::<Segment>()),
            get(move |action: Segment| {
                fwd.forward(Method::Get, format_args!("/auto-update/{}", action.0), "")
            })
            .post(move |action: Segment| {
                fwd.forward(Method::Post, format_args!("/auto-update/{}", action.0), "")
            }),
        )
        .route(
            "/music/data",
            get(move || fwd.forward(Method::Get, format_args!("/music/data"), ""))
                .post(move |body: String| {
                    fwd.forward(Method::Post, format_args!("/music/data"), &body)
                }),
        )
        .route(
            "/api/music",
            get(move || fwd.forward(Method::Get, format_args!("/api/music"), ""))
                .post(move |body: String| {
                    fwd.forward(Method::Post, format_args!("/api/music"), &body)
                }),
        );

    // Server-Konfiguration
    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    // HTTP-Buffer für Requests/Responses
    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];

    // TCP-Buffers für Socket
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, stack, 80, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

/// Serviert die HTML-Hauptseite
async fn serve_html() -> impl IntoResponse {
    Response::new(StatusCode::OK, INDEX_HTML).with_header("Content-Type", "text/html; charset=utf-8")
}
