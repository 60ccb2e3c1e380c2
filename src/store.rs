//! Backing arenas for the puzzle-set model.
//!
//! Everything a [`crate::PuzzleSet`] owns lives in one of three arenas: a
//! byte arena of NUL-terminated pooled strings, a `u32` arena holding packed
//! records and `[len, elements...]` slices, and a plain list of per-puzzle
//! records. Entities refer to each other by 32-bit index only, so the whole
//! set is movable by value and freed in one shot.

use crate::puzzle::PuzzleRec;

/// Offset of a pooled string in the byte arena. Index 0 is the empty string.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringIndex(pub(crate) u32);

impl StringIndex {
    pub const EMPTY: StringIndex = StringIndex(0);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Offset of a record or slice in the word arena. Index 0 is the shared
/// empty slice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataIndex(pub(crate) u32);

impl DataIndex {
    pub const EMPTY: DataIndex = DataIndex(0);
}

/// Fixed-size packed encoding into 32-bit words.
///
/// Each record type declares how many words it occupies and how its fields
/// pack into them; `encode` and `decode` must be exact inverses.
pub trait Record: Sized {
    const WORDS: usize;

    fn encode(&self, words: &mut [u32]);
    fn decode(words: &[u32]) -> Self;
}

impl Record for StringIndex {
    const WORDS: usize = 1;

    fn encode(&self, words: &mut [u32]) {
        words[0] = self.0;
    }

    fn decode(words: &[u32]) -> Self {
        StringIndex(words[0])
    }
}

impl Record for DataIndex {
    const WORDS: usize = 1;

    fn encode(&self, words: &mut [u32]) {
        words[0] = self.0;
    }

    fn decode(words: &[u32]) -> Self {
        DataIndex(words[0])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    strings: Vec<u8>,
    words: Vec<u32>,
    pub(crate) puzzles: Vec<PuzzleRec>,
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl Store {
    pub fn new() -> Store {
        Store {
            // The reserved empty string and the reserved empty slice.
            strings: vec![0],
            words: vec![0],
            puzzles: Vec::new(),
        }
    }

    /// Appends `s` plus a terminating NUL and returns its start offset.
    /// Interning is append-only; equal strings are not deduplicated.
    pub fn intern_string(&mut self, s: &str) -> StringIndex {
        let at = self.strings.len() as u32;
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        StringIndex(at)
    }

    pub fn resolve_string(&self, index: StringIndex) -> &str {
        let start = index.0 as usize;
        let len = self.strings[start..]
            .iter()
            .position(|&b| b == 0)
            .expect("pooled strings are NUL-terminated");
        std::str::from_utf8(&self.strings[start..start + len])
            .expect("pooled strings are UTF-8")
    }

    pub fn push_record<T: Record>(&mut self, value: &T) -> DataIndex {
        let at = self.words.len();
        self.words.resize(at + T::WORDS, 0);
        value.encode(&mut self.words[at..]);
        DataIndex(at as u32)
    }

    pub fn read_record<T: Record>(&self, index: DataIndex) -> T {
        let at = index.0 as usize;
        T::decode(&self.words[at..at + T::WORDS])
    }

    /// Stores `values` as `[len, elements...]`. The empty slice is the
    /// shared sentinel at index 0.
    pub fn push_slice<T: Record>(&mut self, values: &[T]) -> DataIndex {
        if values.is_empty() {
            return DataIndex::EMPTY;
        }
        let at = self.words.len();
        self.words.push(values.len() as u32);
        for value in values {
            let elem = self.words.len();
            self.words.resize(elem + T::WORDS, 0);
            value.encode(&mut self.words[elem..]);
        }
        DataIndex(at as u32)
    }

    pub fn slice_len(&self, slice: DataIndex) -> u32 {
        self.words[slice.0 as usize]
    }

    pub fn slice_elem<T: Record>(&self, slice: DataIndex, i: u32) -> T {
        let at = slice.0 as usize + 1 + i as usize * T::WORDS;
        T::decode(&self.words[at..at + T::WORDS])
    }

    pub(crate) fn set_slice_elem<T: Record>(&mut self, slice: DataIndex, i: u32, value: &T) {
        let at = slice.0 as usize + 1 + i as usize * T::WORDS;
        value.encode(&mut self.words[at..at + T::WORDS]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{Cell, Clue, ColorRec, SolutionRec};

    #[test]
    fn intern_and_resolve() {
        let mut store = Store::new();
        assert_eq!(store.resolve_string(StringIndex::EMPTY), "");

        let hello = store.intern_string("hello");
        let world = store.intern_string("wörld");
        assert_eq!(store.resolve_string(hello), "hello");
        assert_eq!(store.resolve_string(world), "wörld");
    }

    #[test]
    fn interning_does_not_deduplicate() {
        let mut store = Store::new();
        let a = store.intern_string("same");
        let b = store.intern_string("same");
        assert_ne!(a, b);
        assert_eq!(store.resolve_string(a), store.resolve_string(b));
    }

    #[test]
    fn empty_slice_sentinel() {
        let store = Store::new();
        assert_eq!(store.slice_len(DataIndex::EMPTY), 0);
    }

    #[test]
    fn slice_round_trip() {
        let mut store = Store::new();
        let clues = [
            Clue { color: 1, count: 3 },
            Clue { color: 31, count: (1 << 27) - 1 },
            Clue { color: 0, count: 1 },
        ];
        let slice = store.push_slice(&clues);
        assert_eq!(store.slice_len(slice), 3);
        for (i, clue) in clues.iter().enumerate() {
            assert_eq!(store.slice_elem::<Clue>(slice, i as u32), *clue);
        }
    }

    #[test]
    fn record_round_trip_exactness() {
        let mut store = Store::new();
        let color = ColorRec {
            name: StringIndex(17),
            glyph: b'%',
            rgb: [0x12, 0xAB, 0xFF],
        };
        let solution = SolutionRec {
            id: StringIndex(3),
            image: DataIndex(9),
            notes: DataIndex::EMPTY,
        };
        let cell = Cell(0b1010_0110);

        let at_color = store.push_record(&color);
        let at_solution = store.push_record(&solution);
        let at_cell = store.push_record(&cell);

        assert_eq!(store.read_record::<ColorRec>(at_color), color);
        assert_eq!(store.read_record::<SolutionRec>(at_solution), solution);
        assert_eq!(store.read_record::<Cell>(at_cell), cell);
    }

    #[test]
    fn nested_slices() {
        let mut store = Store::new();
        let line_a = store.push_slice(&[Clue { color: 1, count: 2 }]);
        let line_b = store.push_slice(&[
            Clue { color: 2, count: 1 },
            Clue { color: 1, count: 4 },
        ]);
        let lines = store.push_slice(&[line_a, line_b]);

        assert_eq!(store.slice_len(lines), 2);
        let b = store.slice_elem::<DataIndex>(lines, 1);
        assert_eq!(store.slice_len(b), 2);
        assert_eq!(store.slice_elem::<Clue>(b, 1), Clue { color: 1, count: 4 });
    }

    #[test]
    fn slice_elements_are_writable() {
        let mut store = Store::new();
        let cells = store.push_slice(&[Cell(1), Cell(1), Cell(1)]);
        store.set_slice_elem(cells, 1, &Cell(0b11));
        assert_eq!(store.slice_elem::<Cell>(cells, 0), Cell(1));
        assert_eq!(store.slice_elem::<Cell>(cells, 1), Cell(0b11));
    }
}
