// Pull-Update-Transport: Release-Dokument abrufen, Image flashen
//
// Implementiert `UpdateTransport` aus musicviz-core. Der Controller ruft
// beide Operationen aus seinem Tick auf; während des Flashens läuft der
// Tick nicht weiter.

use defmt::{info, warn};
use embassy_net::Stack;
use musicviz_core::{FlashError, ProgressSink, TransportError, UpdateTransport};

use crate::config::{
    DOWNLOAD_RX_BUFFER_SIZE, DOWNLOAD_TX_BUFFER_SIZE, HTTP_HEADER_BUFFER_SIZE, OTA_CHUNK_SIZE,
};
use crate::ota::OtaService;
use crate::ota::client::HttpGet;

pub struct HttpUpdateTransport {
    stack: Stack<'static>,
    ota: OtaService,
}

impl HttpUpdateTransport {
    pub fn new(stack: Stack<'static>, ota: OtaService) -> Self {
        Self { stack, ota }
    }
}

impl UpdateTransport for HttpUpdateTransport {
    async fn fetch_release(&mut self, url: &str, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut rx_buffer = [0u8; DOWNLOAD_RX_BUFFER_SIZE];
        let mut tx_buffer = [0u8; DOWNLOAD_TX_BUFFER_SIZE];
        let mut head_buffer = [0u8; HTTP_HEADER_BUFFER_SIZE];

        let mut response = HttpGet::open(
            self.stack,
            url,
            &mut rx_buffer,
            &mut tx_buffer,
            &mut head_buffer,
        )
        .await?;
        let len = response.read_to_end(buf).await?;
        info!("Update: Release document {} bytes", len);
        Ok(len)
    }

    async fn flash(
        &mut self,
        url: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), FlashError> {
        let mut rx_buffer = [0u8; DOWNLOAD_RX_BUFFER_SIZE];
        let mut tx_buffer = [0u8; DOWNLOAD_TX_BUFFER_SIZE];
        let mut head_buffer = [0u8; HTTP_HEADER_BUFFER_SIZE];

        let mut response = HttpGet::open(
            self.stack,
            url,
            &mut rx_buffer,
            &mut tx_buffer,
            &mut head_buffer,
        )
        .await?;

        let total = response.content_length().unwrap_or(0);
        let mut session = self.ota.begin_update(total)?;

        let mut chunk = [0u8; OTA_CHUNK_SIZE];
        loop {
            // Volle Sektoren sammeln, dann schreiben
            let mut filled = 0;
            while filled < chunk.len() {
                match response.read(&mut chunk[filled..]).await? {
                    0 => break,
                    n => filled += n,
                }
            }
            if filled == 0 {
                break;
            }
            session.write_chunk(&chunk[..filled])?;
            progress.on_progress(session.written(), total);
        }

        if session.written() == 0 {
            warn!("Update: Empty image");
            return Err(FlashError::Transport(TransportError::Io));
        }

        session.finalize()?;
        Ok(())
    }
}
