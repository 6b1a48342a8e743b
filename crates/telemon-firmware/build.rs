//! Bakes the agent's site configuration into the firmware image.
//!
//! Values come from the process environment or a `.env` file next to this
//! crate. Missing keys fall back to the defaults below.

const KEYS: &[(&str, &str)] = &[
    ("TELEMON_SSID", ""),
    ("TELEMON_PASSWORD", ""),
    ("TELEMON_COLLECTOR_URL", "http://192.168.1.100:3000/api/sensordata"),
];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    for (key, _) in KEYS {
        println!("cargo:rerun-if-env-changed={key}");
    }

    // A missing .env is fine; the environment alone may provide everything.
    let _ = dotenvy::dotenv();

    for (key, default) in KEYS {
        let value = std::env::var(key).unwrap_or_else(|_| (*default).to_owned());
        if value.is_empty() {
            println!("cargo:warning={key} is not set");
        }
        println!("cargo:rustc-env={key}={value}");
    }
}
