fn main() {
    // Firmware variant and Wi-Fi credentials are baked in at build time.
    println!("cargo:rerun-if-env-changed=FOCUSER_VARIANT");
    println!("cargo:rerun-if-env-changed=FOCUSER_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=FOCUSER_WIFI_PASSWORD");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
