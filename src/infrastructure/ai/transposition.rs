use rustc_hash::FxHashMap;
use shakmaty::Move;

/// Cached search result for one position.
#[derive(Clone, Debug)]
pub struct TableEntry {
    pub depth: u8,
    pub score: i32,
    pub best: Option<Move>,
}

/// Depth-gated search cache keyed by position. An entry is only reusable
/// when it was computed at least as deep as the current request; shallower
/// knowledge is kept but ignored until overwritten.
#[derive(Default)]
pub struct TranspositionTable {
    entries: FxHashMap<String, TableEntry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        TranspositionTable {
            entries: FxHashMap::default(),
        }
    }

    pub fn probe(&self, key: &str, depth: u8) -> Option<&TableEntry> {
        self.entries.get(key).filter(|entry| entry.depth >= depth)
    }

    pub fn store(&mut self, key: String, depth: u8, score: i32, best: Option<Move>) {
        self.entries.insert(key, TableEntry { depth, score, best });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
