//! Integration Tests für das Kommando-Protokoll
//!
//! Serielle Zeilen und HTTP-Routen laufen über dieselbe Logik.

mod common;

use common::{INFO, device, http_request};
use musicviz_core::command::AVAILABLE_COMMANDS;
use musicviz_core::{ContentType, LedMode, Method, NamedColor};
use rgb::RGB8;

// ============================================================================
// Tests: Modus
// ============================================================================

#[test]
fn test_all_mode_tokens_set_mode() {
    let cases = [
        ("off", LedMode::Off),
        ("solid", LedMode::Solid),
        ("rainbow", LedMode::Rainbow),
        ("visualizer", LedMode::Visualizer),
        ("music", LedMode::Visualizer),
        ("  SOLID\r", LedMode::Solid),
        ("Rainbow", LedMode::Rainbow),
    ];

    for (token, mode) in cases {
        let mut dev = device();
        let response = dev.handle_line(token, 0);
        assert!(!response.is_error, "token {token:?}");
        assert!(!response.as_str().contains("ERROR"));
        assert_eq!(dev.state().mode, mode, "token {token:?}");
    }
}

#[test]
fn test_off_is_idempotent() {
    let mut dev = device();
    dev.handle_line("rainbow", 0);

    let first = dev.handle_line("off", 10);
    let after_once = dev.state().clone();
    let second = dev.handle_line("off", 20);

    assert_eq!(first, second);
    assert_eq!(dev.state(), &after_once);
    assert_eq!(first.as_str(), "Strip OFF");
}

// ============================================================================
// Tests: Farbe und Helligkeit
// ============================================================================

#[test]
fn test_solid_then_red_renders_red() {
    let mut dev = device();
    dev.handle_line("brightness:255", 0);
    dev.handle_line("solid", 0);
    let before = dev.strip().write_count;

    let response = dev.handle_line("red", 0);

    assert_eq!(response.as_str(), "Color Red");
    assert_eq!(dev.state().mode, LedMode::Solid);
    assert_eq!(dev.state().color, NamedColor::Red.rgb());
    assert_eq!(dev.strip().write_count, before + 1);
    assert!(dev.strip().last_frame_is(RGB8 { r: 255, g: 0, b: 0 }));
}

#[test]
fn test_color_outside_solid_does_not_render() {
    let mut dev = device();
    let response = dev.handle_line("green", 0);

    assert_eq!(response.as_str(), "Color Green");
    assert_eq!(dev.state().color, RGB8 { r: 0, g: 255, b: 0 });
    assert_eq!(dev.strip().write_count, 0);
}

#[test]
fn test_brightness_range() {
    let inputs: [(&str, Option<u8>); 9] = [
        ("brightness:0", Some(0)),
        ("brightness:1", Some(1)),
        ("brightness:200", Some(200)),
        ("brightness:255", Some(255)),
        ("brightness:256", None),
        ("brightness:300", None),
        ("brightness:-1", None),
        ("brightness:abc", None),
        ("brightness:", None),
    ];

    for (line, expected) in inputs {
        let mut dev = device();
        dev.handle_line("brightness:77", 0);
        let response = dev.handle_line(line, 0);

        match expected {
            Some(value) => {
                assert!(!response.is_error, "{line}");
                assert_eq!(dev.state().brightness, value, "{line}");
            }
            None => {
                assert!(response.as_str().contains("ERROR"), "{line}");
                assert_eq!(dev.state().brightness, 77, "{line}");
            }
        }
    }
}

#[test]
fn test_brightness_300_keeps_default() {
    let mut dev = device();
    let response = dev.handle_line("brightness:300", 0);

    assert_eq!(response.as_str(), "ERROR Invalid brightness (0-255)");
    assert_eq!(dev.state().brightness, 128);
}

// ============================================================================
// Tests: Status-LED, Status, Info
// ============================================================================

#[test]
fn test_builtin_led_commands() {
    let mut dev = device();

    assert_eq!(dev.handle_line("ledon", 0).as_str(), "LED ON");
    assert!(dev.status_led().on);
    assert_eq!(dev.handle_line("toggle", 0).as_str(), "LED OFF");
    assert!(!dev.state().builtin_led_on);
    assert_eq!(dev.handle_line("toggle", 0).as_str(), "LED ON");
    assert_eq!(dev.handle_line("ledoff", 0).as_str(), "LED OFF");
    assert!(!dev.status_led().on);
}

#[test]
fn test_status_line() {
    let mut dev = device();
    dev.handle_line("rainbow", 0);
    dev.handle_line("ledon", 0);

    let response = dev.handle_line("status", 0);
    assert_eq!(
        response.as_str(),
        "Mode=rainbow,LED=1,WiFi=disconnected,USB=disconnected,Version=1.0.0,Update=Ready"
    );
}

#[test]
fn test_info_line() {
    let mut dev = device();
    dev.handle_line("update:disable", 0);

    let response = dev.handle_line("info", 0);
    assert_eq!(
        response.as_str(),
        format!(
            "Device={},Version={},IP=0.0.0.0,AutoUpdate=0",
            INFO.name, INFO.version
        )
    );
}

#[test]
fn test_ping() {
    let mut dev = device();
    let before = dev.state().clone();
    assert_eq!(dev.handle_line("PING", 0).as_str(), "PONG");
    assert_eq!(dev.state(), &before);
}

// ============================================================================
// Tests: Musik-Daten
// ============================================================================

#[test]
fn test_music_data_ignored_outside_visualizer() {
    let mut dev = device();
    let response = dev.handle_line("music:80", 0);

    assert!(!response.is_error);
    assert_eq!(response.as_str(), "Music data ignored");
    assert_eq!(dev.arbiter().last_sample(), None);
}

#[test]
fn test_music_data_in_visualizer() {
    let mut dev = device();
    dev.handle_line("visualizer", 0);

    let response = dev.handle_line("music:100,3,4,1", 0);
    assert_eq!(response.as_str(), "Music data processed");
    let sample = dev.arbiter().last_sample().unwrap();
    assert_eq!(sample.intensity, 255);

    dev.handle_line("music:0", 0);
    assert_eq!(dev.arbiter().last_sample().unwrap().intensity, 50);
}

// ============================================================================
// Tests: Update-Kommandos
// ============================================================================

#[test]
fn test_update_now_without_known_version() {
    let mut dev = device();
    assert!(dev.state().latest_version.is_empty());

    let response = dev.handle_line("update:now", 0);

    assert_eq!(response.as_str(), "No update available");
    assert!(dev.updater().session().is_none());
    assert!(!dev.state().update_in_progress);
}

#[test]
fn test_auto_update_toggle() {
    let mut dev = device();
    assert!(dev.state().auto_update_enabled);

    assert_eq!(dev.handle_line("update:disable", 0).as_str(), "Auto-update disabled");
    assert!(!dev.state().auto_update_enabled);
    assert_eq!(dev.handle_line("update:enable", 0).as_str(), "Auto-update enabled");
    assert!(dev.state().auto_update_enabled);
}

#[test]
fn test_invalid_update_action() {
    let mut dev = device();
    let response = dev.handle_line("update:sometime", 0);
    assert_eq!(response.as_str(), "ERROR Invalid update command");
}

// ============================================================================
// Tests: Unbekannte Kommandos
// ============================================================================

#[test]
fn test_unknown_command_lists_commands() {
    let mut dev = device();
    let before = dev.state().clone();

    let response = dev.handle_line("frobnicate", 0);

    assert!(response.is_error);
    assert!(response.as_str().contains("frobnicate"));
    assert!(response.as_str().contains(AVAILABLE_COMMANDS));
    assert_eq!(dev.state(), &before);
}

// ============================================================================
// Tests: HTTP-Routen
// ============================================================================

#[test]
fn test_http_and_serial_share_responses() {
    let mut serial = device();
    let mut web = device();

    let line = serial.handle_line("solid", 0);
    let reply = web.handle_http(&http_request(1, Method::Get, "/strip/mode/solid", ""), 0);

    assert_eq!(reply.status, 200);
    assert_eq!(reply.slot, 1);
    assert_eq!(reply.body, line.text);
    assert_eq!(serial.state(), web.state());
}

#[test]
fn test_http_error_codes() {
    let mut dev = device();

    let reply = dev.handle_http(&http_request(0, Method::Get, "/strip/color/purple", ""), 0);
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body.as_str(), "Invalid color");

    let reply = dev.handle_http(&http_request(0, Method::Get, "/strip/mode/disco", ""), 0);
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body.as_str(), "Invalid mode");

    let reply = dev.handle_http(&http_request(0, Method::Get, "/music/data", ""), 0);
    assert_eq!(reply.status, 405);

    let reply = dev.handle_http(&http_request(0, Method::Get, "/does/not/exist", ""), 0);
    assert_eq!(reply.status, 404);
}

#[test]
fn test_http_music_post() {
    let mut dev = device();
    dev.handle_http(&http_request(2, Method::Get, "/strip/mode/visualizer", ""), 0);

    let reply = dev.handle_http(&http_request(2, Method::Post, "/api/music", "60"), 0);

    assert_eq!(reply.status, 200);
    assert_eq!(reply.content_type, ContentType::Json);
    assert_eq!(reply.body.as_str(), "Music data processed");
    assert!(dev.arbiter().last_sample().is_some());
}

#[test]
fn test_http_led_and_auto_update() {
    let mut dev = device();

    let reply = dev.handle_http(&http_request(0, Method::Get, "/led/toggle", ""), 0);
    assert_eq!(reply.body.as_str(), "LED ON");

    let reply = dev.handle_http(&http_request(0, Method::Post, "/auto-update/now", ""), 0);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body.as_str(), "No update available");
}
