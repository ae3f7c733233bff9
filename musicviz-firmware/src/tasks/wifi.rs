// WiFi Tasks - Station-Verbindung, Netzwerk-Stack und DHCP-Log
//
// Der Controller fragt die IP pro Tick direkt am Stack ab; diese Tasks
// halten nur die Verbindung am Leben.

use defmt::{Debug2Format, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{
    ClientConfig, ModeConfig, WifiController, WifiDevice, WifiError, WifiEvent,
};

use crate::config::{WIFI_PASSWORD, WIFI_RETRY_DELAY_SECS, WIFI_SSID};

/// Konfiguriert und startet den Station-Modus (nur wenn noch gestoppt)
async fn ensure_station(controller: &mut WifiController<'static>) -> Result<(), WifiError> {
    if !matches!(controller.is_started(), Ok(false)) {
        return Ok(());
    }

    let station = ClientConfig::default()
        .with_ssid(WIFI_SSID.into())
        .with_password(WIFI_PASSWORD.into());
    controller.set_config(&ModeConfig::Client(station))?;
    controller.start_async().await?;
    info!("WiFi: Station mode up");
    Ok(())
}

/// WiFi Connection Task
///
/// Hält die Station-Verbindung: nach jedem Fehler oder Disconnect wird
/// `WIFI_RETRY_DELAY_SECS` gewartet und neu verbunden.
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    let retry_delay = Duration::from_secs(WIFI_RETRY_DELAY_SECS);

    loop {
        if let Err(e) = ensure_station(&mut controller).await {
            warn!("WiFi: Station setup failed: {}", Debug2Format(&e));
            Timer::after(retry_delay).await;
            continue;
        }

        info!("WiFi: Joining '{}'", WIFI_SSID);
        match controller.connect_async().await {
            Ok(()) => {
                info!("WiFi: Associated");
                controller.wait_for_event(WifiEvent::StaDisconnected).await;
                warn!("WiFi: Link lost");
            }
            Err(e) => warn!("WiFi: Join failed: {}", Debug2Format(&e)),
        }
        Timer::after(retry_delay).await;
    }
}

/// Treibt den embassy-net Stack
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// DHCP-Log: jede neue Adresse und jeder Verlust
#[embassy_executor::task]
pub async fn dhcp_task(stack: Stack<'static>) {
    loop {
        stack.wait_config_up().await;
        match stack.config_v4() {
            Some(config) => info!(
                "WiFi: Address {} (gateway {})",
                Debug2Format(&config.address),
                Debug2Format(&config.gateway)
            ),
            None => info!("WiFi: Network up"),
        }

        stack.wait_config_down().await;
        warn!("WiFi: Address lost");
    }
}
