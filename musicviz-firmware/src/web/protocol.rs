// JSON-Antworten des HTTP-Servers
//
// Nur der Music-Endpoint antwortet mit JSON, alle anderen Routen mit
// derselben Textzeile wie die serielle Schnittstelle.

use serde::Serialize;

/// Status-Feld der Music-Quittung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Ok,
    Error,
}

/// Quittung für `POST /music/data`
///
/// `{"status":"ok","message":"Music data processed"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MusicAck<'a> {
    pub status: AckStatus,
    pub message: &'a str,
}

impl<'a> MusicAck<'a> {
    pub fn from_reply(http_status: u16, message: &'a str) -> Self {
        let status = if http_status == 200 {
            AckStatus::Ok
        } else {
            AckStatus::Error
        };
        Self { status, message }
    }
}
