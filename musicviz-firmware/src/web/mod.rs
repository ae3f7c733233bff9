// Web-Modul: Steuerseite und JSON-Formate des HTTP-Servers

pub mod protocol;

/// Steuerseite für `GET /`, zur Compile-Zeit eingebettet
pub const INDEX_HTML: &str = include_str!("index.html");
