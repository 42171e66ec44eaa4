//! Build identification embedded by `build.rs`

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_DESCRIBE: &str = env!("FORGE_GIT_DESCRIBE");
pub const BUILD_TIMESTAMP: &str = env!("FORGE_BUILD_TIMESTAMP");
pub const BUILD_PROFILE: &str = env!("FORGE_BUILD_PROFILE");

/// One-line banner logged at startup
pub fn banner() -> String {
    format!(
        "forge-corpus v{} [{}] built {} ({})",
        VERSION, GIT_DESCRIBE, BUILD_TIMESTAMP, BUILD_PROFILE
    )
}
