/// Build information captured at compile time
pub struct BuildInfo;

impl BuildInfo {
    /// Get the package version from Cargo.toml
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Get the build timestamp in YYYYMMDD.HHMMSS format
    pub fn build_timestamp() -> &'static str {
        env!("BUILD_TIMESTAMP")
    }

    /// Get the short git commit hash (first 7 characters)
    pub fn git_hash_short() -> &'static str {
        env!("GIT_HASH_SHORT")
    }

    /// Get the target platform (arch-os)
    pub fn target_platform() -> &'static str {
        env!("TARGET_PLATFORM")
    }

    /// Get the build profile (debug/release)
    pub fn build_profile() -> &'static str {
        env!("BUILD_PROFILE")
    }

    /// Get the combined build string (version.timestamp)
    pub fn build_string() -> &'static str {
        env!("BUILD_STRING")
    }

    /// Detailed build information, logged once at startup
    pub fn detailed_info() -> String {
        format!(
            "Version: {} Build: {} Commit: {} Platform: {} Profile: {}",
            Self::version(),
            Self::build_timestamp(),
            Self::git_hash_short(),
            Self::target_platform(),
            Self::build_profile()
        )
    }
}
