//! In-memory list store with file import and immutable snapshots.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use sift_core::FieldValue;

use crate::error::{ListError, Result};
use crate::list_type::ListType;

/// A named set of values of one declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    pub id: String,
    pub list_type: ListType,
    /// Canonical keys (see [`ListType::canonicalize`]).
    items: HashSet<String>,
}

impl ValueList {
    /// Build a list from raw values. The first value that does not parse as
    /// `list_type` fails the whole list.
    pub fn from_values<I, S>(id: impl Into<String>, list_type: ListType, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = id.into();
        let mut items = HashSet::new();
        for (idx, raw) in values.into_iter().enumerate() {
            let raw = raw.as_ref();
            let key = list_type
                .canonicalize(raw)
                .ok_or_else(|| ListError::InvalidValue {
                    list_id: id.clone(),
                    line: idx + 1,
                    value: raw.to_string(),
                    list_type,
                })?;
            items.insert(key);
        }
        Ok(Self {
            id,
            list_type,
            items,
        })
    }

    /// Whether a document value is a member of this list.
    ///
    /// `keyword` and `text` lists hold strings. A numeric or boolean
    /// document value is compared against them the way a `match` entry
    /// compares it, each item coerced to the value's type.
    pub fn contains(&self, value: &FieldValue) -> bool {
        if let Some(key) = self.list_type.canonicalize_value(value) {
            return self.items.contains(&key);
        }
        match (self.list_type, value) {
            (
                ListType::Keyword | ListType::Text,
                FieldValue::Integer(_) | FieldValue::Float(_) | FieldValue::Boolean(_),
            ) => self.items.iter().any(|item| value.equals_str(item)),
            _ => false,
        }
    }

    /// Whether a raw string is a member after canonicalization.
    pub fn contains_raw(&self, raw: &str) -> bool {
        self.list_type
            .canonicalize(raw)
            .is_some_and(|key| self.items.contains(&key))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Canonical item keys, sorted.
    pub fn items(&self) -> Vec<&str> {
        let mut items: Vec<&str> = self.items.iter().map(String::as_str).collect();
        items.sort_unstable();
        items
    }
}

/// Shared store of value lists keyed by list id.
///
/// Writers (imports) take the write lock briefly; rule executions never read
/// the store directly but work from a [`ListSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct ListStore {
    lists: Arc<RwLock<HashMap<String, Arc<ValueList>>>>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a list, returning the previous one with the same id.
    pub fn insert(&self, list: ValueList) -> Option<Arc<ValueList>> {
        let id = list.id.clone();
        self.lists
            .write()
            .expect("lists lock poisoned")
            .insert(id, Arc::new(list))
    }

    /// Create a list from raw values and store it.
    pub fn create<I, S>(&self, id: &str, list_type: ListType, values: I) -> Result<Arc<ValueList>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if id.trim().is_empty() {
            return Err(ListError::InvalidId(id.to_string()));
        }
        let list = ValueList::from_values(id, list_type, values)?;
        Ok(self.store(list))
    }

    /// Import one value per line. Surrounding whitespace is trimmed and blank
    /// lines are skipped; line numbers in errors refer to the input.
    pub fn import_reader<R: BufRead>(
        &self,
        reader: R,
        list_id: &str,
        list_type: ListType,
    ) -> Result<Arc<ValueList>> {
        if list_id.trim().is_empty() {
            return Err(ListError::InvalidId(list_id.to_string()));
        }

        let mut items = HashSet::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let raw = line.trim();
            if raw.is_empty() {
                continue;
            }
            let key = list_type
                .canonicalize(raw)
                .ok_or_else(|| ListError::InvalidValue {
                    list_id: list_id.to_string(),
                    line: idx + 1,
                    value: raw.to_string(),
                    list_type,
                })?;
            items.insert(key);
        }

        Ok(self.store(ValueList {
            id: list_id.to_string(),
            list_type,
            items,
        }))
    }

    /// Import a file using its file name as the list id.
    pub fn import_file(&self, path: &Path, list_type: ListType) -> Result<Arc<ValueList>> {
        let list_id = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ListError::InvalidId(path.display().to_string()))?;
        self.import_file_as(path, list_id, list_type)
    }

    /// Import a file under an explicit list id.
    pub fn import_file_as(
        &self,
        path: &Path,
        list_id: &str,
        list_type: ListType,
    ) -> Result<Arc<ValueList>> {
        let file = fs::File::open(path)?;
        self.import_reader(BufReader::new(file), list_id, list_type)
    }

    /// Load a lists directory laid out as `<dir>/<list_type>/<list_id>`.
    ///
    /// Entries are visited in sorted order. Dotfiles and subdirectories that
    /// are not list type names are skipped. A file that fails to import is
    /// logged and reported as [`LoadStatus::Failed`] without aborting the
    /// scan. When two type directories hold the same file name, the later
    /// one wins. A missing directory loads nothing.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        if !dir.exists() {
            debug!(path = %dir.display(), "lists directory does not exist");
            return Ok(results);
        }

        for type_dir in sorted_entries(dir)? {
            if !type_dir.is_dir() {
                continue;
            }
            let Some(type_name) = type_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let list_type: ListType = match type_name.parse() {
                Ok(t) => t,
                Err(e) => {
                    warn!(path = %type_dir.display(), error = %e, "skipping lists subdirectory");
                    results.push(LoadResult::skipped(type_dir, "not a list type"));
                    continue;
                }
            };

            let files = match sorted_entries(&type_dir) {
                Ok(files) => files,
                Err(e) => {
                    warn!(path = %type_dir.display(), error = %e, "failed to read lists directory");
                    continue;
                }
            };

            for path in files {
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with('.'))
                    .unwrap_or(true);
                if hidden {
                    results.push(LoadResult::skipped(path, "dotfile"));
                    continue;
                }
                if !path.is_file() {
                    continue;
                }

                match self.import_file(&path, list_type) {
                    Ok(list) => {
                        if let Some(previous) = results.iter().find(|r| r.loaded_id() == Some(list.id.as_str())) {
                            warn!(
                                list_id = %list.id,
                                previous = %previous.path.display(),
                                path = %path.display(),
                                "duplicate list id, later file wins"
                            );
                        }
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Loaded {
                                list_id: list.id.clone(),
                                list_type,
                                items: list.len(),
                            },
                        });
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to import list file");
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Failed {
                                error: e.to_string(),
                            },
                        });
                    }
                }
            }
        }

        Ok(results)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ValueList>> {
        self.lists.read().expect("lists lock poisoned").get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<ValueList>> {
        let removed = self.lists.write().expect("lists lock poisoned").remove(id);
        if removed.is_some() {
            info!(list_id = %id, "removed list");
        }
        removed
    }

    /// Sorted list ids.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lists
            .read()
            .expect("lists lock poisoned")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Freeze the current lists for one rule execution.
    ///
    /// Later imports replace entries in the store, never in the snapshot.
    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            lists: self.lists.read().expect("lists lock poisoned").clone(),
        }
    }

    fn store(&self, list: ValueList) -> Arc<ValueList> {
        info!(list_id = %list.id, list_type = %list.list_type, items = list.len(), "imported list");
        let list = Arc::new(list);
        self.lists
            .write()
            .expect("lists lock poisoned")
            .insert(list.id.clone(), Arc::clone(&list));
        list
    }
}

/// Outcome of loading one entry of a lists directory.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loaded {
        list_id: String,
        list_type: ListType,
        items: usize,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
    },
}

impl LoadResult {
    fn skipped(path: PathBuf, reason: &str) -> Self {
        Self {
            path,
            status: LoadStatus::Skipped {
                reason: reason.to_string(),
            },
        }
    }

    fn loaded_id(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Loaded { list_id, .. } => Some(list_id),
            _ => None,
        }
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

/// Read-only view of the lists at a point in time.
#[derive(Debug, Clone, Default)]
pub struct ListSnapshot {
    lists: HashMap<String, Arc<ValueList>>,
}

impl ListSnapshot {
    pub fn get(&self, id: &str) -> Option<&Arc<ValueList>> {
        self.lists.get(id)
    }

    /// Look up a list that must exist with the given id and type.
    pub fn resolve(&self, id: &str, list_type: ListType) -> Result<Arc<ValueList>> {
        match self.lists.get(id) {
            Some(list) if list.list_type == list_type => Ok(Arc::clone(list)),
            _ => Err(ListError::NotFound {
                list_id: id.to_string(),
                list_type,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl FromIterator<ValueList> for ListSnapshot {
    fn from_iter<T: IntoIterator<Item = ValueList>>(iter: T) -> Self {
        Self {
            lists: iter
                .into_iter()
                .map(|list| (list.id.clone(), Arc::new(list)))
                .collect(),
        }
    }
}
