// Task-Modul: Enthält alle Embassy Tasks
//
// Der Controller-Task besitzt den Gerätezustand. UART, HTTP und
// Push-Updates reden über Embassy-Kanäle mit ihm.

pub mod controller;
pub mod http;
pub mod push_update;
pub mod serial;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use controller::{ChannelBoard, controller_task};
pub use http::http_server_task;
pub use push_update::push_update_task;
pub use serial::serial_task;
pub use wifi::{connection_task, dhcp_task, net_task};
