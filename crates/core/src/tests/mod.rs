#[cfg(not(target_arch = "wasm32"))]
pub mod default;

#[allow(dead_code)]
pub fn setup_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    // several tests may race to install it
    let _ = tracing::subscriber::set_global_default(subscriber);
}
