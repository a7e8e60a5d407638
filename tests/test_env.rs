use std::path::PathBuf;

/// Directory of the flow definitions shipped with the crate
pub fn flows_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("flows")
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
