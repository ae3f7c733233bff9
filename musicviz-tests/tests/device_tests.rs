//! Integration Tests für den Scheduler-Tick
//!
//! Serielle Eingabe, Liveness-Meldungen und HTTP-Weiterleitung

mod common;

use common::{MockBoard, device, http_request, tick};
use musicviz_core::{LedMode, Method, TickOutcome};

// ============================================================================
// Tests: Boot
// ============================================================================

#[test]
fn test_boot_reports_ready_and_clears_strip() {
    let mut dev = device();
    let mut board = MockBoard::new();

    dev.boot(&mut board);

    assert_eq!(board.serial_out, vec!["RESPONSE:READY".to_string()]);
    assert_eq!(dev.strip().write_count, 1);
    assert!(!dev.status_led().on);
}

// ============================================================================
// Tests: Serielle Eingabe
// ============================================================================

#[test]
fn test_serial_ping_connects_and_answers() {
    let mut dev = device();
    let mut board = MockBoard::new();
    board.type_line("ping");

    assert_eq!(tick(&mut dev, &mut board, 100), TickOutcome::Continue);

    assert_eq!(
        board.serial_out,
        vec![
            "RESPONSE:USB_CONNECTED".to_string(),
            "RESPONSE:PONG".to_string()
        ]
    );
    assert!(dev.state().serial_connected);
    assert_eq!(dev.state().last_serial_activity_ms, 100);
}

#[test]
fn test_serial_crlf_single_response() {
    let mut dev = device();
    let mut board = MockBoard::new();
    board.serial_in.extend(b"solid\r\n".iter().copied());

    tick(&mut dev, &mut board, 0);

    assert_eq!(board.count_out("RESPONSE:Strip Solid Color"), 1);
    assert_eq!(dev.state().mode, LedMode::Solid);
}

#[test]
fn test_serial_line_too_long() {
    let mut dev = device();
    let mut board = MockBoard::new();
    board.serial_in.extend(std::iter::repeat_n(b'x', 101));
    board.type_line("off");

    tick(&mut dev, &mut board, 0);

    assert_eq!(board.count_out("RESPONSE:ERROR Command too long"), 1);
    assert_eq!(board.count_out("RESPONSE:Strip OFF"), 1);
}

#[test]
fn test_serial_split_across_ticks() {
    let mut dev = device();
    let mut board = MockBoard::new();

    board.serial_in.extend(b"rain".iter().copied());
    tick(&mut dev, &mut board, 0);
    assert_eq!(dev.state().mode, LedMode::Off);

    board.serial_in.extend(b"bow\n".iter().copied());
    tick(&mut dev, &mut board, 10);
    assert_eq!(dev.state().mode, LedMode::Rainbow);
}

#[test]
fn test_serial_brightness_error_response() {
    let mut dev = device();
    let mut board = MockBoard::new();
    board.type_line("brightness:300");

    tick(&mut dev, &mut board, 0);

    assert_eq!(
        board.count_out("RESPONSE:ERROR Invalid brightness (0-255)"),
        1
    );
    assert_eq!(dev.state().brightness, 128);
}

// ============================================================================
// Tests: Liveness
// ============================================================================

#[test]
fn test_usb_timeout_exactly_once() {
    let mut dev = device();
    let mut board = MockBoard::new();
    board.type_line("ping");
    tick(&mut dev, &mut board, 1_000);

    tick(&mut dev, &mut board, 31_000);
    assert!(dev.state().serial_connected);
    assert_eq!(board.count_out("RESPONSE:USB_TIMEOUT"), 0);

    tick(&mut dev, &mut board, 31_001);
    assert!(!dev.state().serial_connected);
    for now in [40_000, 80_000, 500_000] {
        tick(&mut dev, &mut board, now);
    }
    assert_eq!(board.count_out("RESPONSE:USB_TIMEOUT"), 1);
}

#[test]
fn test_activity_keeps_connection() {
    let mut dev = device();
    let mut board = MockBoard::new();

    for i in 0..5u64 {
        board.type_line("ping");
        tick(&mut dev, &mut board, i * 20_000);
    }

    assert!(dev.state().serial_connected);
    assert_eq!(board.count_out("RESPONSE:USB_CONNECTED"), 1);
    assert_eq!(board.count_out("RESPONSE:USB_TIMEOUT"), 0);
}

#[test]
fn test_heartbeat_while_connected() {
    let mut dev = device();
    let mut board = MockBoard::new();
    board.type_line("ping");
    tick(&mut dev, &mut board, 0);

    tick(&mut dev, &mut board, 10_000);
    assert_eq!(board.count_out("RESPONSE:HEARTBEAT"), 0);
    tick(&mut dev, &mut board, 10_001);
    assert_eq!(board.count_out("RESPONSE:HEARTBEAT"), 1);
    tick(&mut dev, &mut board, 20_002);
    assert_eq!(board.count_out("RESPONSE:HEARTBEAT"), 2);

    // Nach dem Timeout keine Heartbeats mehr
    tick(&mut dev, &mut board, 30_001);
    tick(&mut dev, &mut board, 45_000);
    assert_eq!(board.count_out("RESPONSE:HEARTBEAT"), 2);
}

// ============================================================================
// Tests: HTTP
// ============================================================================

#[test]
fn test_http_requests_answered_in_tick() {
    let mut dev = device();
    let mut board = MockBoard::online();
    board
        .http_in
        .push_back(http_request(3, Method::Get, "/strip/mode/rainbow", ""));
    board
        .http_in
        .push_back(http_request(1, Method::Get, "/status", ""));

    tick(&mut dev, &mut board, 0);

    assert_eq!(board.http_out.len(), 2);
    assert_eq!(board.http_out[0].slot, 3);
    assert_eq!(board.http_out[0].body.as_str(), "Strip Rainbow");
    assert_eq!(board.http_out[1].slot, 1);
    assert!(
        board.http_out[1]
            .body
            .as_str()
            .starts_with("Mode=rainbow,LED=0,WiFi=192.168.1.42,")
    );
}

#[test]
fn test_http_reply_carries_request_sequence() {
    let mut dev = device();
    let mut board = MockBoard::online();
    // Verspätete Anfrage (seq 7) vor der aktuellen (seq 8) desselben Handlers
    board
        .http_in
        .push_back(http_request(2, Method::Get, "/led/on", "").with_seq(7));
    board
        .http_in
        .push_back(http_request(2, Method::Get, "/ping", "").with_seq(8));

    tick(&mut dev, &mut board, 0);

    assert_eq!(board.http_out.len(), 2);
    assert!(board.http_out[0].answers(2, 7));
    assert!(!board.http_out[0].answers(2, 8));
    assert!(board.http_out[1].answers(2, 8));
    assert_eq!(board.http_out[1].body.as_str(), "PONG");
}

#[test]
fn test_http_mode_rendered_same_tick() {
    let mut dev = device();
    let mut board = MockBoard::new();
    board
        .http_in
        .push_back(http_request(0, Method::Get, "/strip/mode/rainbow", ""));

    tick(&mut dev, &mut board, 0);

    assert_eq!(dev.strip().write_count, 1);
    assert_eq!(dev.arbiter().hue_phase(), 3);
}

// ============================================================================
// Tests: Rendering
// ============================================================================

#[test]
fn test_render_every_tick() {
    let mut dev = device();
    let mut board = MockBoard::new();

    for now in 0..10 {
        tick(&mut dev, &mut board, now * 10);
    }

    assert_eq!(dev.strip().write_count, 10);
}
