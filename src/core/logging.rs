//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g.
/// `RUST_LOG=voxray=debug` to see chunk rebuilds and volume resamples.
///
/// Only binaries should call this; the library itself only emits through
/// the `log` facade.
///
/// # Example
/// ```no_run
/// voxray::core::logging::init();
/// log::info!("Renderer started");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();
}
