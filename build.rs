fn main() {
    println!("cargo:rerun-if-env-changed=VRPC_BUILD_TIMESTAMP");

    // Build timestamp feeds the derived broker credentials. Reproducible
    // builds can pin it through the environment.
    let timestamp = std::env::var("VRPC_BUILD_TIMESTAMP").unwrap_or_else(|_| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|_| "0".to_string())
    });
    println!("cargo:rustc-env=VRPC_BUILD_TIMESTAMP={timestamp}");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
