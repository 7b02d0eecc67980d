//! String interner for identifiers and literal spellings.
//!
//! Equal strings intern to the same [`Name`], so name equality is a u32
//! compare. Interned storage is leaked for the lifetime of the process; a
//! translation unit owns exactly one interner, shared between the
//! preprocessor, Sema and tests through [`SharedInterner`].

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// An interned string.
///
/// `Name(0)` is always the empty string.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Name(u32);

impl Name {
    /// The pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "name#{}", self.0)
    }
}

struct InternState {
    /// Map from string content to index in `strings`.
    map: FxHashMap<&'static str, u32>,
    /// Storage for interned contents.
    strings: Vec<&'static str>,
}

/// Interner mapping strings to dense [`Name`] indices.
///
/// Interior mutability lets every component intern through a shared `&self`;
/// the front-end itself is single-threaded, the lock exists so the interner
/// handle can be cloned freely without lifetime plumbing.
pub struct StringInterner {
    state: RwLock<InternState>,
}

impl StringInterner {
    /// Create an interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut state = InternState {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        state.map.insert("", 0);
        state.strings.push("");
        StringInterner {
            state: RwLock::new(state),
        }
    }

    /// Intern a string, returning its [`Name`].
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.state.read();
            if let Some(&index) = guard.map.get(s) {
                return Name(index);
            }
        }

        let mut guard = self.state.write();
        // Double-check after acquiring the write lock.
        if let Some(&index) = guard.map.get(s) {
            return Name(index);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = u32::try_from(guard.strings.len()).expect("interner exceeded u32::MAX strings");
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name(index)
    }

    /// Intern an owned string without re-allocating.
    pub fn intern_owned(&self, s: String) -> Name {
        {
            let guard = self.state.read();
            if let Some(&index) = guard.map.get(s.as_str()) {
                return Name(index);
            }
        }

        let mut guard = self.state.write();
        if let Some(&index) = guard.map.get(s.as_str()) {
            return Name(index);
        }

        let leaked: &'static str = Box::leak(s.into_boxed_str());
        let index = u32::try_from(guard.strings.len()).expect("interner exceeded u32::MAX strings");
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name(index)
    }

    /// Look up the text for a [`Name`].
    ///
    /// The returned reference is `'static` because interned storage is
    /// leaked and never deallocated.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.state.read();
        guard.strings[name.0 as usize]
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.state.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to a translation unit's interner.
///
/// This newtype is the only sanctioned way to share the interner; it keeps
/// `Arc` out of signatures everywhere else.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_lookup() {
        let interner = StringInterner::new();
        let a = interner.intern("alpha");
        let b = interner.intern("beta");
        let a2 = interner.intern("alpha");

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.lookup(a), "alpha");
        assert_eq!(interner.lookup(b), "beta");
    }

    #[test]
    fn empty_string_is_name_zero() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn intern_owned_matches_borrowed() {
        let interner = StringInterner::new();
        let a = interner.intern("shared");
        let b = interner.intern_owned(String::from("shared"));
        assert_eq!(a, b);
    }

    #[test]
    fn shared_handle_sees_same_names() {
        let interner = SharedInterner::new();
        let clone = interner.clone();
        assert_eq!(interner.intern("x"), clone.intern("x"));
    }
}
