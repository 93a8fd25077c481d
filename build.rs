use dotenvy::dotenv_iter;
use embuild::espidf;

fn main() {
    load_dotenv_variables();
    espidf::sysenv::output();
}

/// Bakes the station's configuration from `.env` into the firmware image.
///
/// The device has no filesystem to read settings from after a deep-sleep
/// wake, so every key in `.env` is emitted as `cargo:rustc-env=KEY=VALUE`
/// and picked up by `env!`/`option_env!` in `src/config.rs`.
///
/// # Security Note
/// WiFi credentials, the weather token and the IoT Hub device key end up in
/// flash in plain text. Use flash encryption or NVS provisioning on devices
/// that leave your desk.
fn load_dotenv_variables() {
    // To ensure the build script re-runs if the secrets change
    println!("cargo:rerun-if-changed=.env");

    if let Ok(iter) = dotenv_iter() {
        for item in iter {
            let (key, value) = item.expect("Failed to read .env element");
            println!("cargo:rustc-env={}={}", key, value);
        }
    }
}
