// ABOUTME: Environment-driven configuration for the HPL runtime

use std::path::PathBuf;

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "HPL Interpreter";
pub const WELCOME_SUBTITLE: &str = "A structured-document scripting language, tree-walked in Rust";

/// Whether `HPL_DEBUG=1` is set, enabling verbose error reports (§6).
pub fn debug_enabled() -> bool {
    std::env::var("HPL_DEBUG")
        .map(|v| v == "1")
        .unwrap_or(false)
}

/// The module search path from `HPL_MODULE_PATHS` (a platform path-list,
/// e.g. colon-separated on Unix), falling back to `<home>/.hpl/packages`
/// when unset, per §6.
pub fn module_search_path() -> Vec<PathBuf> {
    if let Ok(raw) = std::env::var("HPL_MODULE_PATHS") {
        return std::env::split_paths(&raw).collect();
    }
    default_package_dir().into_iter().collect()
}

/// `<user home>/.hpl/packages`, the default the package-manager entry
/// point also installs into.
pub fn default_package_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".hpl").join("packages"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn debug_enabled_reads_env_var() {
        std::env::remove_var("HPL_DEBUG");
        assert!(!debug_enabled());
        std::env::set_var("HPL_DEBUG", "1");
        assert!(debug_enabled());
        std::env::remove_var("HPL_DEBUG");
    }

    #[test]
    #[serial]
    fn module_search_path_splits_env_var() {
        std::env::set_var("HPL_MODULE_PATHS", "/a/b:/c/d");
        let paths = module_search_path();
        assert_eq!(paths, vec![PathBuf::from("/a/b"), PathBuf::from("/c/d")]);
        std::env::remove_var("HPL_MODULE_PATHS");
    }

    #[test]
    #[serial]
    fn module_search_path_falls_back_to_default_package_dir() {
        std::env::remove_var("HPL_MODULE_PATHS");
        let paths = module_search_path();
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(
                paths,
                vec![PathBuf::from(home).join(".hpl").join("packages")]
            );
        }
    }
}
