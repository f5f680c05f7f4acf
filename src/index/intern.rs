use std::sync::Arc;

use rustc_hash::FxHashMap;

///////////////////////////////
/// Handle to one interned string. Compares and hashes by identity,
/// which is equivalent to content comparison within one Interner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

///////////////////////////////
/// Deduplicating store for barcode and UMI strings. Every distinct
/// content is owned exactly once; handles stay valid for the lifetime
/// of the store
#[derive(Debug, Default)]
pub struct Interner {
    // both structures share one allocation per distinct content.
    // Arc rather than Rc: the read index is shared across worker
    // threads behind an Arc and must stay Send + Sync
    map: FxHashMap<Arc<str>, Symbol>,
    strings: Vec<Arc<str>>,
}

impl Interner {
    pub fn new() -> Interner {
        Interner::default()
    }

    ///////////////////////////////
    /// Get the handle for this content, allocating only on first sight
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        self.strings.push(Arc::clone(&owned));
        self.map.insert(owned, sym);
        sym
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("AAAACCCC");
        let b = interner.intern("AAAACCCC");
        let c = interner.intern("GGGGTTTT");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.resolve(a), "AAAACCCC");
        assert_eq!(interner.resolve(c), "GGGGTTTT");
    }

    #[test]
    fn equal_content_shares_one_owned_copy() {
        let mut interner = Interner::new();
        let a = interner.intern("AAAACCCC");
        let b = interner.intern("AAAACCCC");

        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
        // one allocation backs both the lookup map and the handle table
        assert!(std::ptr::eq(
            interner.resolve(a).as_ptr(),
            interner.resolve(b).as_ptr()
        ));
    }

    #[test]
    fn empty_string_is_a_valid_entry() {
        let mut interner = Interner::new();
        let empty = interner.intern("");
        assert_eq!(interner.resolve(empty), "");
        assert_eq!(empty, interner.intern(""));
    }
}
