//! Update-Sequencer - Lebenszyklus eines Firmware-Updates
//!
//! Zustände:
//! `Idle → Checking → (Idle | UpdateAvailable) → Downloading → Applying → (Succeeded | Idle)`
//!
//! Zwei Pfade teilen sich dieselbe Sperre (`DeviceState::update_in_progress`):
//! - **Pull:** Versions-Prüfung über [`UpdateTransport`], danach Download + Flash
//! - **Push:** ein externes Flash-Tool liefert [`PushEvent`]s
//!
//! Es existiert höchstens eine [`UpdateSession`]; jeder weitere Start wird
//! mit [`UpdateError::AlreadyInProgress`] abgelehnt, nicht eingereiht.

use core::fmt;

use crate::arbiter::LedArbiter;
use crate::config::{DeviceInfo, RELEASE_BUFFER_SIZE, UPDATE_CHECK_INTERVAL_MS};
use crate::fmt::{info, warn};
use crate::release::{ReleaseError, is_current_version, parse_release};
use crate::timer::Interval;
use crate::traits::{
    FlashError, ProgressSink, SmartLedWriter, StatusLed, TransportError, UpdateTransport,
};
use crate::types::{DeviceState, UrlText};

/// Auslöser einer Update-Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateSource {
    WirelessPush,
    PullCheckAndApply,
    ManualNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdatePhase {
    #[default]
    Idle,
    Checking,
    UpdateAvailable,
    Downloading,
    Applying,
    /// Terminal: das Gerät startet neu
    Succeeded,
}

/// Fehler-Codes eines Push-Updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushError {
    Auth,
    Begin,
    Connect,
    Receive,
    End,
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => f.write_str("Auth Failed"),
            Self::Begin => f.write_str("Begin Failed"),
            Self::Connect => f.write_str("Connect Failed"),
            Self::Receive => f.write_str("Receive Failed"),
            Self::End => f.write_str("End Failed"),
        }
    }
}

/// Ereignisse des Push-Pfads (onStart/onProgress/onEnd/onError)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushEvent {
    Start,
    Progress { written: u32, total: u32 },
    End,
    Error(PushError),
}

/// Grund eines fehlgeschlagenen Updates oder einer fehlgeschlagenen Prüfung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureReason {
    NoNetwork,
    Fetch(TransportError),
    Parse(ReleaseError),
    Flash(FlashError),
    Push(PushError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNetwork => f.write_str("no network"),
            Self::Fetch(e) => write!(f, "{}", e),
            Self::Parse(e) => write!(f, "{}", e),
            Self::Flash(e) => write!(f, "{}", e),
            Self::Push(e) => write!(f, "{}", e),
        }
    }
}

/// Ergebnis eines abgeschlossenen Zyklus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateResult {
    Succeeded,
    NoUpdate,
    Failed(FailureReason),
}

/// Synchrone Ablehnung einer Update-Anfrage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateError {
    AlreadyInProgress,
    NoUpdateAvailable,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInProgress => f.write_str("Update already in progress"),
            Self::NoUpdateAvailable => f.write_str("No update available"),
        }
    }
}

/// Die eine laufende Download-/Flash-Session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSession {
    pub source: UpdateSource,
    /// Leer beim Push-Pfad (das Image kommt vom Flash-Tool)
    pub download_url: UrlText,
    pub progress_percent: u8,
    pub result: Option<UpdateResult>,
}

impl UpdateSession {
    fn new(source: UpdateSource, download_url: UrlText) -> Self {
        Self {
            source,
            download_url,
            progress_percent: 0,
            result: None,
        }
    }
}

/// Alles, was der Sequencer außer sich selbst anfasst
///
/// Der Sequencer schreibt nur die Update-Felder des Zustands.
pub struct UpdateContext<'a, L, S, const N: usize> {
    pub state: &'a mut DeviceState,
    pub arbiter: &'a mut LedArbiter<N>,
    pub strip: &'a mut L,
    pub status_led: &'a mut S,
}

impl<L: SmartLedWriter, S: StatusLed, const N: usize> UpdateContext<'_, L, S, N> {
    /// Eintritt in `Applying`: Rendern sperren, Strip löschen, Busy-LED an
    fn enter_applying(&mut self) {
        self.state.update_in_progress = true;
        self.arbiter.clear(&mut *self.strip);
        self.status_led.set(true);
        self.state.builtin_led_on = true;
    }

    /// Rückkehr nach `Idle` nach einem Fehler; das Gerät bleibt auf der alten Firmware
    fn leave_failed(&mut self) {
        self.state.update_in_progress = false;
        self.status_led.set(false);
        self.state.builtin_led_on = false;
    }
}

/// Fortschritt 0-100 aus Byte-Zählern
pub fn progress_percent(written: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    (u64::from(written) * 100 / u64::from(total)).min(100) as u8
}

/// Fortschritts-Empfänger für den Pull-Pfad
struct ApplyProgress<'a, S> {
    state: &'a mut DeviceState,
    status_led: &'a mut S,
    percent: &'a mut u8,
}

impl<S: StatusLed> ProgressSink for ApplyProgress<'_, S> {
    fn on_progress(&mut self, written: u32, total: u32) {
        let percent = progress_percent(written, total);
        *self.percent = percent;
        self.state
            .set_update_status(format_args!("Installing... {}%", percent));
        self.status_led.set(percent % 10 < 5);
    }
}

pub struct UpdateSequencer {
    info: DeviceInfo,
    phase: UpdatePhase,
    session: Option<UpdateSession>,
    /// Download-URL der zuletzt gefundenen neueren Version
    available_url: UrlText,
    check_interval: Interval,
    last_result: Option<UpdateResult>,
    release_buf: [u8; RELEASE_BUFFER_SIZE],
}

impl UpdateSequencer {
    /// Die erste periodische Prüfung fällt ein Intervall nach `boot_ms`
    pub fn new(info: DeviceInfo, boot_ms: u64) -> Self {
        Self {
            info,
            phase: UpdatePhase::Idle,
            session: None,
            available_url: UrlText::new(),
            check_interval: Interval::new(UPDATE_CHECK_INTERVAL_MS, boot_ms),
            last_result: None,
            release_buf: [0; RELEASE_BUFFER_SIZE],
        }
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub fn session(&self) -> Option<&UpdateSession> {
        self.session.as_ref()
    }

    pub fn last_result(&self) -> Option<UpdateResult> {
        self.last_result
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Prüfung oder Session aktiv
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            UpdatePhase::Checking
                | UpdatePhase::Downloading
                | UpdatePhase::Applying
                | UpdatePhase::Succeeded
        )
    }

    /// `update:check` - die eigentliche Abfrage läuft im nächsten Tick
    ///
    /// Ohne Netzwerk schlägt die Prüfung sofort fehl (Status "Check failed"),
    /// das gilt nicht als Ablehnung der Anfrage.
    pub fn request_check(&mut self, state: &mut DeviceState) -> Result<(), UpdateError> {
        if self.is_busy() || self.session.is_some() {
            return Err(UpdateError::AlreadyInProgress);
        }
        if state.ip_address.is_none() {
            warn!("Update: check without network");
            state.set_update_status(format_args!("Check failed"));
            self.finish(UpdateResult::Failed(FailureReason::NoNetwork));
            return Ok(());
        }
        self.phase = UpdatePhase::Checking;
        state.set_update_status(format_args!("Checking..."));
        info!("Update: checking {}", self.info.release_url);
        Ok(())
    }

    /// `update:now` - installiert die zuletzt gefundene Version
    pub fn start_now(&mut self, state: &mut DeviceState) -> Result<(), UpdateError> {
        if self.is_busy() || self.session.is_some() {
            return Err(UpdateError::AlreadyInProgress);
        }
        if state.latest_version.is_empty()
            || self.available_url.is_empty()
            || is_current_version(&state.latest_version, self.info.version)
        {
            return Err(UpdateError::NoUpdateAvailable);
        }
        self.start_download(UpdateSource::ManualNow, state);
        Ok(())
    }

    /// Verarbeitet ein Ereignis des Push-Pfads
    ///
    /// Nur `Start` kann abgelehnt werden; Ereignisse ohne passende
    /// Push-Session werden ignoriert.
    pub fn on_push<L: SmartLedWriter, S: StatusLed, const N: usize>(
        &mut self,
        event: PushEvent,
        ctx: &mut UpdateContext<'_, L, S, N>,
    ) -> Result<(), UpdateError> {
        if let PushEvent::Start = event {
            if self.is_busy() || self.session.is_some() {
                warn!("Update: push start rejected");
                return Err(UpdateError::AlreadyInProgress);
            }
            info!("Update: push started");
            self.session = Some(UpdateSession::new(
                UpdateSource::WirelessPush,
                UrlText::new(),
            ));
            self.phase = UpdatePhase::Applying;
            ctx.enter_applying();
            ctx.state
                .set_update_status(format_args!("Starting update..."));
            return Ok(());
        }

        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.source == UpdateSource::WirelessPush)
        else {
            warn!("Update: push event without session");
            return Ok(());
        };

        match event {
            PushEvent::Start => {}
            PushEvent::Progress { written, total } => {
                let percent = progress_percent(written, total);
                session.progress_percent = percent;
                ctx.state
                    .set_update_status(format_args!("Progress: {}%", percent));
                ctx.status_led.set(percent % 10 < 5);
            }
            PushEvent::End => {
                info!("Update: push complete");
                session.progress_percent = 100;
                session.result = Some(UpdateResult::Succeeded);
                self.phase = UpdatePhase::Succeeded;
                self.last_result = Some(UpdateResult::Succeeded);
                ctx.state
                    .set_update_status(format_args!("Update complete! Restarting..."));
            }
            PushEvent::Error(e) => {
                warn!("Update: push failed {}", e);
                ctx.state
                    .set_update_status(format_args!("Update failed: {}", e));
                ctx.leave_failed();
                self.session = None;
                self.finish(UpdateResult::Failed(FailureReason::Push(e)));
            }
        }
        Ok(())
    }

    /// Ein Scheduler-Tick: periodische Prüfung und Fortschritt des laufenden Zyklus
    ///
    /// Liefert ein Ergebnis, sobald ein Zyklus in diesem Tick abgeschlossen wurde.
    /// `Applying` läuft innerhalb eines Aufrufs bis Erfolg oder Fehler durch.
    pub async fn poll<T, L, S, const N: usize>(
        &mut self,
        now_ms: u64,
        transport: &mut T,
        ctx: &mut UpdateContext<'_, L, S, N>,
    ) -> Option<UpdateResult>
    where
        T: UpdateTransport,
        L: SmartLedWriter,
        S: StatusLed,
    {
        // Intervall läuft erst ab einer tatsächlich gestarteten Prüfung neu
        if self.check_interval.is_due(now_ms)
            && ctx.state.auto_update_enabled
            && ctx.state.ip_address.is_some()
            && !self.is_busy()
            && self.session.is_none()
        {
            info!("Update: periodic check");
            self.check_interval.reset(now_ms);
            self.phase = UpdatePhase::Checking;
            ctx.state.set_update_status(format_args!("Checking..."));
        }

        match self.phase {
            UpdatePhase::Checking => self.run_check(transport, &mut *ctx.state).await,
            UpdatePhase::Downloading => self.run_apply(transport, ctx).await,
            UpdatePhase::Idle
            | UpdatePhase::UpdateAvailable
            | UpdatePhase::Applying
            | UpdatePhase::Succeeded => None,
        }
    }

    async fn run_check<T: UpdateTransport>(
        &mut self,
        transport: &mut T,
        state: &mut DeviceState,
    ) -> Option<UpdateResult> {
        let len = match transport
            .fetch_release(self.info.release_url, &mut self.release_buf)
            .await
        {
            Ok(len) => len.min(self.release_buf.len()),
            Err(e) => {
                warn!("Update: fetch failed {}", e);
                state.set_update_status(format_args!("Check failed: {}", e));
                return Some(self.finish(UpdateResult::Failed(FailureReason::Fetch(e))));
            }
        };

        let release = match parse_release(&self.release_buf[..len]) {
            Ok(release) => release,
            Err(e) => {
                warn!("Update: release parse failed {}", e);
                state.set_update_status(format_args!("Check failed: {}", e));
                return Some(self.finish(UpdateResult::Failed(FailureReason::Parse(e))));
            }
        };

        state.latest_version = release.version.clone();
        if is_current_version(&release.version, self.info.version) {
            info!("Update: up to date");
            self.available_url.clear();
            state.set_update_status(format_args!("Up to date"));
            return Some(self.finish(UpdateResult::NoUpdate));
        }

        info!("Update: {} available", release.version.as_str());
        self.available_url = release.download_url;
        self.phase = UpdatePhase::UpdateAvailable;
        state.set_update_status(format_args!("Update available: {}", release.version));
        if state.auto_update_enabled {
            self.start_download(UpdateSource::PullCheckAndApply, state);
        }
        // Eine gefundene Version ist kein Abschluss des Zyklus
        None
    }

    async fn run_apply<T, L, S, const N: usize>(
        &mut self,
        transport: &mut T,
        ctx: &mut UpdateContext<'_, L, S, N>,
    ) -> Option<UpdateResult>
    where
        T: UpdateTransport,
        L: SmartLedWriter,
        S: StatusLed,
    {
        let Some(session) = self.session.as_mut() else {
            self.phase = UpdatePhase::Idle;
            return None;
        };

        self.phase = UpdatePhase::Applying;
        ctx.enter_applying();
        ctx.state
            .set_update_status(format_args!("Installing... 0%"));
        info!("Update: applying {}", session.download_url.as_str());

        let UpdateSession {
            download_url,
            progress_percent,
            ..
        } = session;
        let mut progress = ApplyProgress {
            state: &mut *ctx.state,
            status_led: &mut *ctx.status_led,
            percent: progress_percent,
        };
        let flashed = transport.flash(download_url.as_str(), &mut progress).await;

        match flashed {
            Ok(()) => {
                info!("Update: success, restarting");
                session.result = Some(UpdateResult::Succeeded);
                self.phase = UpdatePhase::Succeeded;
                self.last_result = Some(UpdateResult::Succeeded);
                ctx.state
                    .set_update_status(format_args!("Update successful"));
                Some(UpdateResult::Succeeded)
            }
            Err(e) => {
                warn!("Update: apply failed {}", e);
                ctx.state.set_update_status(format_args!("Failed: {}", e));
                ctx.leave_failed();
                self.session = None;
                Some(self.finish(UpdateResult::Failed(FailureReason::Flash(e))))
            }
        }
    }

    fn start_download(&mut self, source: UpdateSource, state: &mut DeviceState) {
        info!("Update: session {}", source);
        self.session = Some(UpdateSession::new(source, self.available_url.clone()));
        self.phase = UpdatePhase::Downloading;
        state.update_in_progress = true;
        state.set_update_status(format_args!("Downloading..."));
    }

    /// Abschluss ohne Neustart: zurück nach `Idle`
    fn finish(&mut self, result: UpdateResult) -> UpdateResult {
        self.phase = UpdatePhase::Idle;
        self.last_result = Some(result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(50, 200), 25);
        assert_eq!(progress_percent(300, 200), 100);
        assert_eq!(progress_percent(u32::MAX, u32::MAX), 100);
    }

    #[test]
    fn test_push_error_texts() {
        let mut text = heapless::String::<32>::new();
        fmt::write(&mut text, format_args!("{}", PushError::Receive)).unwrap();
        assert_eq!(text.as_str(), "Receive Failed");
    }
}
