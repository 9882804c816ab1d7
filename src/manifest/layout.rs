//! Module source tree discovery
//!
//! A Poetry project keeps its package either under `src/<module>` or directly
//! at `<root>/<module>`. Rye expects the former, so the migration needs to
//! know where the module lives and whether it has to be moved.

use crate::domain::module_name;
use crate::error::{AppError, IoError, StructureError};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the conventional source root
pub const SRC_DIR: &str = "src";

/// Where the project's module lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLayout {
    /// Python module (package directory) name
    pub module_name: String,
    /// Current location of the module directory
    pub module_path: PathBuf,
    /// True when the module already sits under `src/`
    pub in_src: bool,
}

impl ModuleLayout {
    /// Where the module has to end up: `<root>/src/<module_name>`
    pub fn target_path(&self, root: &Path) -> PathBuf {
        root.join(SRC_DIR).join(&self.module_name)
    }
}

/// Locate the module directory of a project.
///
/// With `src/` present it must hold exactly one non-hidden directory.
/// Otherwise the module name is derived from the project name and the
/// directory must exist at the project root.
pub fn locate_module(root: &Path, project_name: &str) -> Result<ModuleLayout, AppError> {
    let src = root.join(SRC_DIR);
    if src.is_dir() {
        let mut candidates = module_candidates(&src)?;
        return match candidates.len() {
            0 => Err(StructureError::NoModule { src }.into()),
            1 => {
                let name = candidates.remove(0);
                Ok(ModuleLayout {
                    module_path: src.join(&name),
                    module_name: name,
                    in_src: true,
                })
            }
            _ => Err(StructureError::MultipleModules {
                src,
                found: candidates,
            }
            .into()),
        };
    }

    let module_name = module_name(project_name);
    let module_path = root.join(&module_name);
    if !module_path.is_dir() {
        return Err(StructureError::ModuleNotFound { path: module_path }.into());
    }
    Ok(ModuleLayout {
        module_name,
        module_path,
        in_src: false,
    })
}

/// Non-hidden directory names directly under `src`, sorted
fn module_candidates(src: &Path) -> Result<Vec<String>, AppError> {
    let entries = fs::read_dir(src).map_err(|e| IoError::generic(src, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IoError::generic(src, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if entry.path().is_dir() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_module_in_src() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/my_pkg")).unwrap();
        fs::create_dir_all(dir.path().join("src/.hidden")).unwrap();
        fs::write(dir.path().join("src/README.md"), "").unwrap();

        let layout = locate_module(dir.path(), "whatever").unwrap();
        assert_eq!(layout.module_name, "my_pkg");
        assert!(layout.in_src);
        assert_eq!(layout.module_path, dir.path().join("src/my_pkg"));
    }

    #[test]
    fn test_locate_module_at_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("my_project")).unwrap();

        let layout = locate_module(dir.path(), "My-Project").unwrap();
        assert_eq!(layout.module_name, "my_project");
        assert!(!layout.in_src);
        assert_eq!(
            layout.target_path(dir.path()),
            dir.path().join("src").join("my_project")
        );
    }

    #[test]
    fn test_locate_module_empty_src() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/.cache")).unwrap();

        let err = locate_module(dir.path(), "demo").unwrap_err();
        assert!(matches!(
            err,
            AppError::Structure(StructureError::NoModule { .. })
        ));
    }

    #[test]
    fn test_locate_module_multiple_in_src() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/b")).unwrap();
        fs::create_dir_all(dir.path().join("src/a")).unwrap();

        match locate_module(dir.path(), "demo").unwrap_err() {
            AppError::Structure(StructureError::MultipleModules { found, .. }) => {
                assert_eq!(found, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_locate_module_missing() {
        let dir = TempDir::new().unwrap();
        let err = locate_module(dir.path(), "demo").unwrap_err();
        assert!(matches!(
            err,
            AppError::Structure(StructureError::ModuleNotFound { .. })
        ));
    }
}
