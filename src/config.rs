use std::path::PathBuf;

pub struct AppPaths {
    pub base_dir: PathBuf,
    pub db_path: PathBuf,
    pub legacy_path: PathBuf,
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl AppPaths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .expect("Could not determine home directory")
            .join(".cinelog");
        Self::from_base(base)
    }

    pub fn from_base(base: PathBuf) -> Self {
        Self {
            db_path: base.join("cinelog.db"),
            legacy_path: base.join("legacy.json"),
            base_dir: base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_base() {
        let paths = AppPaths::from_base(PathBuf::from("/tmp/test-cinelog"));
        assert_eq!(paths.base_dir, PathBuf::from("/tmp/test-cinelog"));
        assert_eq!(paths.db_path, PathBuf::from("/tmp/test-cinelog/cinelog.db"));
        assert_eq!(
            paths.legacy_path,
            PathBuf::from("/tmp/test-cinelog/legacy.json")
        );
    }

    #[test]
    fn test_new_uses_home_dir() {
        let paths = AppPaths::new();
        assert!(paths.base_dir.ends_with(".cinelog"));
    }
}
