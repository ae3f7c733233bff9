//! Zeilen-Framing für die serielle Kommando-Schnittstelle
//!
//! Druckbare ASCII-Zeichen werden gesammelt, `\n` oder `\r` schließt
//! eine Zeile ab. Zu lange Zeilen werden verworfen.

use core::fmt;

use heapless::String;

use crate::config::SERIAL_LINE_MAX;

/// Eine vollständige Eingabezeile
pub type SerialLine = String<SERIAL_LINE_MAX>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Mehr als `SERIAL_LINE_MAX` Zeichen ohne Zeilenende
    TooLong,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => f.write_str("Command too long"),
        }
    }
}

#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: SerialLine,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Nimmt ein Byte entgegen
    ///
    /// Liefert `Some(Ok(line))` bei Zeilenende mit nicht-leerem Puffer,
    /// `Some(Err(TooLong))` beim Überlauf (Puffer wird geleert), sonst `None`.
    pub fn push(&mut self, byte: u8) -> Option<Result<SerialLine, LineError>> {
        match byte {
            b'\n' | b'\r' => {
                if self.buf.is_empty() {
                    None
                } else {
                    Some(Ok(core::mem::take(&mut self.buf)))
                }
            }
            32..=126 => {
                if self.buf.push(char::from(byte)).is_err() {
                    self.buf.clear();
                    return Some(Err(LineError::TooLong));
                }
                None
            }
            _ => None,
        }
    }

    /// Bereits gesammelte, noch nicht abgeschlossene Eingabe
    pub fn pending(&self) -> &str {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(assembler: &mut LineAssembler, bytes: &[u8]) -> Option<Result<SerialLine, LineError>> {
        let mut last = None;
        for &b in bytes {
            if let Some(result) = assembler.push(b) {
                last = Some(result);
            }
        }
        last
    }

    #[test]
    fn test_crlf_yields_one_line() {
        let mut assembler = LineAssembler::new();
        let mut lines = 0;
        for &b in b"ping\r\n" {
            if let Some(Ok(line)) = assembler.push(b) {
                assert_eq!(line.as_str(), "ping");
                lines += 1;
            }
        }
        assert_eq!(lines, 1);
        assert_eq!(assembler.pending(), "");
    }

    #[test]
    fn test_control_bytes_dropped() {
        let mut assembler = LineAssembler::new();
        let line = feed(&mut assembler, b"re\x00d\x1b\n");
        assert_eq!(line.unwrap().unwrap().as_str(), "red");
    }

    #[test]
    fn test_overflow_discards_line() {
        let mut assembler = LineAssembler::new();
        let long = [b'a'; SERIAL_LINE_MAX + 1];
        assert_eq!(feed(&mut assembler, &long), Some(Err(LineError::TooLong)));
        assert_eq!(assembler.pending(), "");

        // Danach wird wieder normal gesammelt
        let line = feed(&mut assembler, b"status\n");
        assert_eq!(line.unwrap().unwrap().as_str(), "status");
    }
}
