fn main() {
    // Provisioning document baked into the firmware image (see config.rs).
    println!("cargo:rerun-if-env-changed=SENSORFEED_CONFIG_JSON");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
