// Build-Script: Lädt Build-Konfiguration aus .env und setzt Linker-Skripte

/// Variablen, die zur Compile-Zeit in die Firmware eingebacken werden
/// (OTA_PASSWORD ist optional)
const BUILD_ENV: [&str; 4] = ["WIFI_SSID", "WIFI_PASSWORD", "RELEASE_URL", "OTA_PASSWORD"];

fn main() {
    // Fehlt .env, müssen die Variablen in der Umgebung stehen
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  .env file nicht gefunden: {}", e);
        eprintln!("   Setze WIFI_SSID, WIFI_PASSWORD und RELEASE_URL als Environment-Variablen");
    }

    for name in BUILD_ENV {
        if let Ok(value) = std::env::var(name) {
            println!("cargo:rustc-env={}={}", name, value);
        }
        println!("cargo:rerun-if-env-changed={}", name);
    }
    println!("cargo:rerun-if-changed=.env");

    linker_hints();

    // defmt.x: Symbole für defmt's binäres Log-Format
    println!("cargo:rustc-link-arg=-Tdefmt.x");
    // linkall.x: Flash/RAM-Layout, muss als LETZTES kommen
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

// Wird vom Linker als "--error-handling-script" aufgerufen und gibt
// Hinweise zu fehlenden Symbolen aus
fn linker_hints() {
    let args: Vec<String> = std::env::args().collect();

    if let [_, kind, what, ..] = args.as_slice() {
        if kind != "undefined-symbol" {
            std::process::exit(1);
        }

        let hint = match what.as_str() {
            w if w.starts_with("_defmt_") => {
                Some("`defmt` not found - is `defmt.x` added as a linker script?")
            }
            "_stack_start" => Some("Is the linker script `linkall.x` missing?"),
            w if w.starts_with("esp_rtos_") => {
                Some("`esp-radio` has no scheduler - was `esp_rtos::start` called?")
            }
            "malloc" | "free" | "calloc" => {
                Some("Did you forget the `esp-alloc` dependency?")
            }
            _ => None,
        };
        if let Some(hint) = hint {
            eprintln!();
            eprintln!("💡 {}", hint);
            eprintln!();
        }
        std::process::exit(0);
    }

    if let Ok(exe) = std::env::current_exe() {
        println!("cargo:rustc-link-arg=--error-handling-script={}", exe.display());
    }
}
