// Library-Root: Tasks, Hardware-Adapter und OTA für das ESP32-C6
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod ota;
pub mod tasks;
pub mod web;

// Embassy Channel-Typen
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;

use musicviz_core::{HttpReply, HttpRequest, PushEvent, UpdateError};

use crate::config::{HTTP_QUEUE_DEPTH, HTTP_TASK_COUNT, PUSH_QUEUE_DEPTH, SERIAL_PIPE_SIZE};

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================
//
// Alle Tasks laufen auf demselben Executor, daher reicht NoopRawMutex.
// Der Controller-Task ist der einzige Besitzer von `Device`; alle anderen
// Tasks reden nur über diese Kanäle mit ihm.

/// Channel für HTTP-Anfragen (HTTP-Tasks → Controller)
pub type HttpRequestChannel = Channel<NoopRawMutex, HttpRequest, HTTP_QUEUE_DEPTH>;

/// Sender für HTTP-Anfragen
pub type HttpRequestSender = Sender<'static, NoopRawMutex, HttpRequest, HTTP_QUEUE_DEPTH>;

/// Receiver für HTTP-Anfragen (Controller)
pub type HttpRequestReceiver = Receiver<'static, NoopRawMutex, HttpRequest, HTTP_QUEUE_DEPTH>;

/// Antwort-Signal eines HTTP-Tasks
pub type HttpReplySignal = Signal<NoopRawMutex, HttpReply>;

/// Ein Antwort-Slot pro HTTP-Task, Index = `HttpRequest::slot`
pub type HttpReplySlots = [HttpReplySignal; HTTP_TASK_COUNT];

/// Channel für Push-Update-Ereignisse (Push-Listener → Controller)
pub type PushEventChannel = Channel<NoopRawMutex, PushEvent, PUSH_QUEUE_DEPTH>;

/// Sender für Push-Update-Ereignisse
pub type PushEventSender = Sender<'static, NoopRawMutex, PushEvent, PUSH_QUEUE_DEPTH>;

/// Receiver für Push-Update-Ereignisse (Controller)
pub type PushEventReceiver = Receiver<'static, NoopRawMutex, PushEvent, PUSH_QUEUE_DEPTH>;

/// Quittung des Controllers für `PushEvent::Start`
pub type PushAckSignal = Signal<NoopRawMutex, Result<(), UpdateError>>;

/// Byte-Puffer zwischen UART-Task und Controller
pub type SerialPipe = Pipe<NoopRawMutex, SERIAL_PIPE_SIZE>;
