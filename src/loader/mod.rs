//! Module loader: path resolution and the `import_path → Module` cache.
//!
//! The orchestration of lex → parse → eval for an imported file lives on
//! [`crate::evaluator::Evaluator`] (it needs the evaluator's machinery to
//! actually run a program); this module owns only the parts that are pure
//! bookkeeping — resolution, the cache, and the current-directory stack used
//! to make relative imports inside an imported file resolve relative to
//! *that* file's directory, not the entry point's.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::evaluator::value::ModuleValue;

pub struct Loader {
    cache: RefCell<HashMap<PathBuf, Rc<ModuleValue>>>,
    search_paths: Vec<PathBuf>,
    current_dir: RefCell<PathBuf>,
}

impl Loader {
    pub fn new(entry_dir: PathBuf, search_paths: Vec<PathBuf>) -> Self {
        Loader {
            cache: RefCell::new(HashMap::new()),
            search_paths,
            current_dir: RefCell::new(entry_dir),
        }
    }

    pub fn current_dir(&self) -> PathBuf {
        self.current_dir.borrow().clone()
    }

    /// Pushes a new current directory, returning the previous one so the
    /// caller can restore it once nested evaluation finishes.
    pub fn push_dir(&self, dir: PathBuf) -> PathBuf {
        self.current_dir.replace(dir)
    }

    pub fn set_dir(&self, dir: PathBuf) {
        *self.current_dir.borrow_mut() = dir;
    }

    /// Resolves `raw_path` by trying it verbatim, then with `.zg`, then
    /// `.zerg`, first under the current directory, then under each
    /// registered search path.
    pub fn resolve(&self, raw_path: &str) -> Result<PathBuf, String> {
        let candidates = [raw_path.to_string(), format!("{raw_path}.zg"), format!("{raw_path}.zerg")];
        let mut bases = vec![self.current_dir()];
        bases.extend(self.search_paths.iter().cloned());
        for base in &bases {
            for candidate in &candidates {
                let full = base.join(candidate);
                if full.is_file() {
                    log::trace!("resolved import '{raw_path}' to {full:?}");
                    return Ok(full);
                }
            }
        }
        Err(format!("module not found: {raw_path}"))
    }

    pub fn cache_get(&self, resolved: &Path) -> Option<Rc<ModuleValue>> {
        let hit = self.cache.borrow().get(resolved).cloned();
        if hit.is_some() {
            log::trace!("module cache hit for {resolved:?}");
        }
        hit
    }

    pub fn cache_put(&self, resolved: PathBuf, module: Rc<ModuleValue>) {
        self.cache.borrow_mut().insert(resolved, module);
    }
}
