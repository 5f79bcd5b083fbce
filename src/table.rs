//! The code table and the encoder's dictionary.
use crate::alloc::{boxed::Box, vec::Vec};
use crate::trie::{ChildSearch, Linear, Node, PrefixTrie, ROOT};
use crate::{Code, LITERALS, MAX_ENTRIES};

/// The byte pattern a code decodes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pattern: Box<[u8]>,
}

/// Maps codes to their patterns.
///
/// Codes are assigned densely in insertion order, so the table is populated exactly below
/// [`next_code`].
///
/// [`next_code`]: #method.next_code
#[derive(Clone, Debug)]
pub struct Table {
    entries: Vec<Entry>,
}

/// A code table together with a trie indexing the same patterns.
///
/// Every insertion and every reset is applied to both, so that a trie lookup of any table
/// pattern yields its code.
#[derive(Clone, Debug)]
pub struct Dictionary<S: ChildSearch = Linear> {
    table: Table,
    trie: PrefixTrie<S>,
}

impl Entry {
    /// The single-byte pattern of a literal code.
    pub fn literal(byte: u8) -> Self {
        Entry {
            pattern: Box::new([byte]),
        }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn first_byte(&self) -> u8 {
        self.pattern[0]
    }

    /// A new entry with `byte` appended to this pattern.
    pub fn extend(&self, byte: u8) -> Entry {
        let mut pattern = Vec::with_capacity(self.pattern.len() + 1);
        pattern.extend_from_slice(&self.pattern);
        pattern.push(byte);
        Entry {
            pattern: pattern.into_boxed_slice(),
        }
    }
}

impl From<&'_ [u8]> for Entry {
    fn from(pattern: &[u8]) -> Self {
        debug_assert!(!pattern.is_empty());
        Entry {
            pattern: pattern.into(),
        }
    }
}

impl Table {
    /// A table holding only the literals.
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(MAX_ENTRIES);
        entries.extend((0..=u8::max_value()).map(Entry::literal));
        Table { entries }
    }

    /// Drop every entry above the literals.
    pub fn reset(&mut self) {
        self.entries.truncate(LITERALS);
    }

    /// The code the next inserted entry receives.
    pub fn next_code(&self) -> Code {
        self.entries.len() as Code
    }

    /// If all codes are assigned.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_ENTRIES
    }

    pub fn get(&self, code: Code) -> Option<&Entry> {
        self.entries.get(usize::from(code))
    }

    /// Assign the next free code to `entry`.
    ///
    /// The table must not be full.
    pub fn push(&mut self, entry: Entry) -> Code {
        debug_assert!(!self.is_full());
        let code = self.next_code();
        self.entries.push(entry);
        code
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

impl<S: ChildSearch> Dictionary<S> {
    /// A dictionary holding only the literals.
    pub fn new() -> Self {
        let mut dictionary = Dictionary {
            table: Table::new(),
            trie: PrefixTrie::new(),
        };
        dictionary.index_literals();
        dictionary
    }

    /// Drop every entry above the literals from both the table and the trie.
    pub fn reset(&mut self) {
        self.table.reset();
        self.trie.clear();
        self.index_literals();
    }

    /// Assign the next free code to `pattern`.
    ///
    /// When the code space is exhausted the dictionary is reset first, so the pattern then
    /// receives the first multi-byte code. Returns the code and whether a reset happened.
    pub fn insert(&mut self, pattern: &[u8]) -> (Code, bool) {
        let overflow = self.table.is_full();
        if overflow {
            tracing::debug!("code space exhausted, resetting dictionary");
            self.reset();
        }

        let code = self.table.push(Entry::from(pattern));
        self.trie.insert(pattern, code);
        (code, overflow)
    }

    pub fn lookup(&self, pattern: &[u8]) -> Option<Code> {
        self.trie.lookup(pattern)
    }

    pub fn entry(&self, code: Code) -> Option<&Entry> {
        self.table.get(code)
    }

    pub fn next_code(&self) -> Code {
        self.table.next_code()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn trie(&self) -> &PrefixTrie<S> {
        &self.trie
    }

    /// The trie node of a literal.
    ///
    /// Literals are indexed first after every reset, in byte order, so they occupy the nodes
    /// directly after the root regardless of the search strategy.
    pub fn literal_node(&self, byte: u8) -> Node {
        ROOT + 1 + Node::from(byte)
    }

    fn index_literals(&mut self) {
        for byte in 0..=u8::max_value() {
            self.trie.insert(&[byte], Code::from(byte));
        }
    }
}

impl<S: ChildSearch> Default for Dictionary<S> {
    fn default() -> Self {
        Dictionary::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Dictionary, Entry, Table};
    use crate::trie::{ChildSearch, Linear, Sorted, ROOT};
    use crate::{Code, FIRST_CODE, MAX_ENTRIES};

    fn assert_literals<S: ChildSearch>(dictionary: &Dictionary<S>) {
        for byte in 0..=255u8 {
            assert_eq!(dictionary.lookup(&[byte]), Some(Code::from(byte)));
            let node = dictionary.literal_node(byte);
            assert_eq!(dictionary.trie().value(node), Some(Code::from(byte)));
        }
        assert_eq!(dictionary.next_code(), FIRST_CODE);
        for code in FIRST_CODE..MAX_ENTRIES as Code {
            assert!(dictionary.entry(code).is_none());
        }
    }

    fn assert_mirrored<S: ChildSearch>(dictionary: &Dictionary<S>) {
        for code in 0..dictionary.next_code() {
            let entry = dictionary.entry(code).unwrap();
            assert_eq!(dictionary.lookup(entry.pattern()), Some(code));
        }

        // Every code held in the trie names the table entry of its path.
        let trie = dictionary.trie();
        let mut valued = 0;
        let mut visited = 0;
        let mut pending = vec![(ROOT, vec![])];
        while let Some((node, pattern)) = pending.pop() {
            visited += 1;
            if let Some(code) = trie.value(node) {
                let entry = dictionary.table().get(code).unwrap();
                assert_eq!(entry.pattern(), &pattern[..]);
                valued += 1;
            }
            for byte in 0..=255u8 {
                if let Some(child) = trie.child(node, byte) {
                    let mut extended = pattern.clone();
                    extended.push(byte);
                    pending.push((child, extended));
                }
            }
        }
        assert_eq!(valued, usize::from(dictionary.next_code()));
        assert_eq!(visited, trie.node_count());
    }

    fn mirrors_through_resets<S: ChildSearch>() {
        let mut dictionary = Dictionary::<S>::new();
        assert_literals(&dictionary);

        let mut resets = 0;
        let mut state = 0x2545_f491u32;
        let mut pattern = vec![b'A'];
        for _ in 0..8 * MAX_ENTRIES {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            pattern.push(b'A' + (state % 4) as u8);
            if pattern.len() > 6 {
                pattern.drain(..3);
            }

            if dictionary.lookup(&pattern).is_some() {
                continue;
            }

            let (code, reset) = dictionary.insert(&pattern);
            if reset {
                resets += 1;
                assert_eq!(code, FIRST_CODE);
            }
            assert_eq!(dictionary.lookup(&pattern), Some(code));
            assert_eq!(dictionary.entry(code).map(Entry::pattern), Some(&pattern[..]));
        }

        assert!(resets >= 1);
        assert_mirrored(&dictionary);

        dictionary.reset();
        assert_literals(&dictionary);
        assert_mirrored(&dictionary);
    }

    #[test]
    fn linear_mirrors_through_resets() {
        mirrors_through_resets::<Linear>();
    }

    #[test]
    fn sorted_mirrors_through_resets() {
        mirrors_through_resets::<Sorted>();
    }

    #[test]
    fn entry_derivation() {
        let entry = Entry::literal(b'A').extend(b'B').extend(b'C');
        assert_eq!(entry.pattern(), b"ABC");
        assert_eq!(entry.first_byte(), b'A');
        assert_eq!(entry.len(), 3);
        assert_eq!(Entry::from(&b"ABC"[..]), entry);
    }

    #[test]
    fn table_fills_and_resets() {
        let mut table = Table::new();
        assert_eq!(table.next_code(), FIRST_CODE);
        for code in FIRST_CODE..MAX_ENTRIES as Code {
            assert_eq!(table.push(Entry::literal(0).extend(code as u8)), code);
        }
        assert!(table.is_full());
        assert_eq!(usize::from(table.next_code()), MAX_ENTRIES);

        table.reset();
        assert!(!table.is_full());
        assert_eq!(table.next_code(), FIRST_CODE);
        assert_eq!(table.get(65).map(Entry::pattern), Some(&b"A"[..]));
        assert!(table.get(FIRST_CODE).is_none());
    }
}
