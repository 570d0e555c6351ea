use crate::settings::MINIMUM_STRING_TABLE_CAPACITY;
use rustc_hash::FxHashMap;

/// A unique identifier for an interned string.
/// Keeps names, opcodes and file paths of the SSA program as cheap `Copy` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(u32);

/// Stores every distinct string of a loaded program once.
///
/// - `Vec<Box<str>>` for O(1) ID → string resolution
/// - `FxHashMap<Box<str>, StringId>` for O(1) string → ID lookup while interning
///
/// One table is created per loaded program, so tables never need to be shared
/// between the worker threads of the CLI.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<Box<str>>,
    string_to_id: FxHashMap<Box<str>, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: Vec::with_capacity(MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::default(),
        }
    }

    /// Intern a string slice, returning the existing ID if it was seen before.
    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s) {
            return existing_id;
        }

        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let new_id = StringId(self.strings.len() as u32);
        let boxed: Box<str> = s.into();

        self.string_to_id.insert(boxed.clone(), new_id);
        self.strings.push(boxed);

        new_id
    }

    /// IDs are only handed out by this table, so a foreign ID is a caller bug.
    /// Resolving one yields an empty string rather than a panic.
    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        self.try_resolve(id).unwrap_or_default()
    }

    #[inline]
    pub fn try_resolve(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| s.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::StringTable;

    #[test]
    fn interning_the_same_name_twice_returns_one_id() {
        let mut table = StringTable::new();
        let first = table.intern("a.returnNil");
        let second = table.intern("a.returnNil");
        let other = table.intern("errors.New");

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(other), "errors.New");
        assert_eq!(table.try_resolve(first), Some("a.returnNil"));
    }
}
