fn main() {
    println!("cargo:rerun-if-env-changed=TL_LSP_VERSION");
    if let Ok(version) = std::env::var("TL_LSP_VERSION") {
        println!("cargo:rustc-env=CARGO_PKG_VERSION={version}");
    }
}
