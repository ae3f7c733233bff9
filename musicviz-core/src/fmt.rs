//! Logging-Makros für die Core-Crate
//!
//! Mit Feature `defmt` werden die Aufrufe an defmt weitergereicht,
//! ohne Feature (Host-Tests) verschwinden sie vollständig.

#![allow(unused_macros)]

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)*);
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    }};
}

// `warn` kollidiert als Name mit dem eingebauten `#[warn]`-Attribut
pub(crate) use {debug, info, log_warn as warn};
