//! Version and build information for txscope

/// "txscope {version} ({commit} {date}) rustc {rustc_version}"
pub fn version() -> String {
    format!(
        "txscope {} ({} {}) rustc {}",
        env!("CARGO_PKG_VERSION"),
        build_commit(),
        build_date(),
        rustc_version()
    )
}

/// Returns "unknown" if not built with commit info
pub fn build_commit() -> &'static str {
    option_env!("TXSCOPE_COMMIT_SHA").unwrap_or("unknown")
}

pub fn build_date() -> &'static str {
    option_env!("TXSCOPE_BUILD_DATE").unwrap_or("unknown")
}

pub fn rustc_version() -> &'static str {
    option_env!("TXSCOPE_RUSTC_VERSION").unwrap_or("unknown")
}
