//! Release channels

pub const RELEASE_EXPERIMENTAL: &str = "experimental";
pub const RELEASE_BETA: &str = "beta";
pub const RELEASE_GA: &str = "ga";

/// Release used when a manifest does not declare one
pub const DEFAULT_RELEASE: &str = RELEASE_EXPERIMENTAL;

/// License used when a package does not declare one
pub const DEFAULT_LICENSE: &str = "basic";

/// All recognised release channels
pub const RELEASE_TYPES: [&str; 3] = [RELEASE_EXPERIMENTAL, RELEASE_BETA, RELEASE_GA];

pub fn is_valid_release(release: &str) -> bool {
    RELEASE_TYPES.contains(&release)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_releases() {
        assert!(is_valid_release("experimental"));
        assert!(is_valid_release("beta"));
        assert!(is_valid_release("ga"));
    }

    #[test]
    fn test_invalid_releases() {
        for release in ["stable", "", "GA", "Beta", " beta"] {
            assert!(!is_valid_release(release), "{release:?} should be rejected");
        }
    }

    #[test]
    fn test_default_release_is_experimental() {
        assert_eq!(DEFAULT_RELEASE, "experimental");
        assert!(is_valid_release(DEFAULT_RELEASE));
    }
}
