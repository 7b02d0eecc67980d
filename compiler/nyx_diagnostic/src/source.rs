//! The source manager: URIs to file ids to contents.
//!
//! File ids are allocated densely starting at 1 (id 0 is the invalid file).
//! Contents load lazily through a [`SourceProvider`] and are immutable once
//! loaded. Line starts are computed on first use so any
//! [`SourceLocation`] can be turned back into a 1-based line/column pair.

use rustc_hash::FxHashMap;

use nyx_ir::{FileId, SourceLocation};

/// Resolves a URI to file contents. URIs are opaque to the front-end.
pub trait SourceProvider {
    fn read(&self, uri: &str) -> Option<String>;
}

struct SourceFile {
    uri: String,
    content: Option<String>,
    line_starts: Option<Vec<u32>>,
}

/// Registry of source files for one translation unit.
pub struct SourceManager {
    provider: Option<Box<dyn SourceProvider>>,
    ids: FxHashMap<String, FileId>,
    /// Indexed by `file_id - 1`.
    files: Vec<SourceFile>,
}

impl SourceManager {
    /// A manager that can only serve in-memory files.
    pub fn new() -> Self {
        SourceManager {
            provider: None,
            ids: FxHashMap::default(),
            files: Vec::new(),
        }
    }

    pub fn with_provider(provider: Box<dyn SourceProvider>) -> Self {
        SourceManager {
            provider: Some(provider),
            ids: FxHashMap::default(),
            files: Vec::new(),
        }
    }

    /// The id for a URI, allocating a new one on first sight.
    pub fn file_id(&mut self, uri: &str) -> FileId {
        if let Some(&id) = self.ids.get(uri) {
            return id;
        }
        self.allocate(uri.to_owned(), None)
    }

    /// Register a file with contents supplied directly.
    pub fn add_memory_file(&mut self, uri: &str, content: impl Into<String>) -> FileId {
        if let Some(&id) = self.ids.get(uri) {
            let file = &mut self.files[(id.0 - 1) as usize];
            if file.content.is_none() {
                file.content = Some(content.into());
            }
            return id;
        }
        self.allocate(uri.to_owned(), Some(content.into()))
    }

    fn allocate(&mut self, uri: String, content: Option<String>) -> FileId {
        let id = FileId(u32::try_from(self.files.len() + 1).expect("file ids exhausted"));
        self.ids.insert(uri.clone(), id);
        self.files.push(SourceFile {
            uri,
            content,
            line_starts: None,
        });
        id
    }

    /// Borrowed contents of a file, loading through the provider on first
    /// access. `None` when the id is invalid or the provider has nothing.
    pub fn file_content(&mut self, id: FileId) -> Option<&str> {
        if !id.is_valid() {
            return None;
        }
        let index = (id.0 - 1) as usize;
        if index >= self.files.len() {
            return None;
        }
        if self.files[index].content.is_none() {
            let uri = self.files[index].uri.clone();
            let loaded = self.provider.as_ref()?.read(&uri)?;
            self.files[index].content = Some(loaded);
        }
        self.files[index].content.as_deref()
    }

    pub fn uri(&self, id: FileId) -> Option<&str> {
        if !id.is_valid() {
            return None;
        }
        self.files.get((id.0 - 1) as usize).map(|f| f.uri.as_str())
    }

    /// Recover the 1-based (line, column) of a location.
    pub fn line_col(&mut self, location: SourceLocation) -> Option<(u32, u32)> {
        self.file_content(location.file)?;
        let index = (location.file.0 - 1) as usize;
        if self.files[index].line_starts.is_none() {
            let content = self.files[index].content.as_deref().unwrap_or("");
            let mut starts = vec![0u32];
            for (pos, byte) in content.bytes().enumerate() {
                if byte == b'\n' {
                    starts.push(pos as u32 + 1);
                }
            }
            self.files[index].line_starts = Some(starts);
        }
        let starts = self.files[index].line_starts.as_ref().unwrap();
        let line = match starts.binary_search(&location.offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let column = location.offset - starts[line] + 1;
        Some((line as u32 + 1, column))
    }
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapProvider(FxHashMap<String, String>);

    impl SourceProvider for MapProvider {
        fn read(&self, uri: &str) -> Option<String> {
            self.0.get(uri).cloned()
        }
    }

    #[test]
    fn ids_are_dense_from_one() {
        let mut manager = SourceManager::new();
        let a = manager.add_memory_file("a.nyx", "");
        let b = manager.add_memory_file("b.nyx", "");
        assert_eq!(a, FileId(1));
        assert_eq!(b, FileId(2));
        assert_eq!(manager.file_id("a.nyx"), a);
    }

    #[test]
    fn provider_loads_lazily() {
        let mut map = FxHashMap::default();
        map.insert("lib.nyx".to_owned(), "def x: int;".to_owned());
        let mut manager = SourceManager::with_provider(Box::new(MapProvider(map)));
        let id = manager.file_id("lib.nyx");
        assert_eq!(manager.file_content(id), Some("def x: int;"));
        // Unknown files fail cleanly.
        let missing = manager.file_id("missing.nyx");
        assert_eq!(manager.file_content(missing), None);
    }

    #[test]
    fn line_col_is_one_based() {
        let mut manager = SourceManager::new();
        let id = manager.add_memory_file("m.nyx", "ab\ncd\n\nef");
        let at = |offset| SourceLocation::new(id, offset);
        assert_eq!(manager.line_col(at(0)), Some((1, 1)));
        assert_eq!(manager.line_col(at(1)), Some((1, 2)));
        assert_eq!(manager.line_col(at(3)), Some((2, 1)));
        assert_eq!(manager.line_col(at(6)), Some((3, 1)));
        assert_eq!(manager.line_col(at(7)), Some((4, 1)));
    }

    #[test]
    fn invalid_file_has_no_content() {
        let mut manager = SourceManager::new();
        assert_eq!(manager.file_content(FileId::INVALID), None);
        assert_eq!(manager.uri(FileId::INVALID), None);
    }
}
