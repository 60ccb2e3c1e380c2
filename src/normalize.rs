//! Turns per-puzzle scratch state into committed store records.
//!
//! Runs once per `puzzle` element, after all of its children have been
//! parsed: completes the palette, assigns glyphs, moves the background and
//! default colors into their reserved slots, resolves clue color names,
//! fixes the grid dimensions, encodes images as cell bitsets, and derives
//! clues from the goal when none were given. A puzzle that cannot be
//! repaired is dropped with a diagnostic; its siblings are unaffected.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::{debug, warn};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::loader::{PuzzleScratch, RootScratch, ScratchCell, ScratchClue, ScratchColor};
use crate::puzzle::{
    BACKGROUND, Cell, Clue, ColorRec, MAX_COLORS, PuzzleRec, SolutionKind, SolutionRec, color_mask,
};
use crate::store::{DataIndex, Store, StringIndex};

/// Glyphs handed to colors that did not declare a `char`.
const GLYPH_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Interns `s`, mapping the empty string to the reserved pooled index 0.
pub(crate) fn intern(store: &mut Store, s: &str) -> StringIndex {
    if s.is_empty() {
        StringIndex::EMPTY
    } else {
        store.intern_string(s)
    }
}

/// Patches the set-wide metadata into the reserved root record.
pub(crate) fn commit_root(store: &mut Store, root: RootScratch) {
    let notes: Vec<StringIndex> = root.notes.iter().map(|n| intern(store, n)).collect();
    let notes = store.push_slice(&notes);
    store.puzzles[0] = PuzzleRec {
        source: intern(store, &root.source),
        title: intern(store, &root.title),
        author: intern(store, &root.author),
        author_id: intern(store, &root.author_id),
        copyright: intern(store, &root.copyright),
        notes,
        ..PuzzleRec::default()
    };
}

/// Normalizes one parsed puzzle and appends it to the store's puzzle list.
/// On an unrepairable problem the puzzle is dropped after recording a
/// diagnostic at `pos`.
pub(crate) fn commit_puzzle(
    store: &mut Store,
    scratch: PuzzleScratch,
    diags: &mut Diagnostics,
    pos: u64,
) {
    let PuzzleScratch {
        source,
        id,
        title,
        author,
        author_id,
        copyright,
        description,
        default_color,
        background_color,
        mut colors,
        row_lines,
        column_lines,
        solutions,
        notes,
    } = scratch;

    // The two well-known names always exist, even if nothing refers to them.
    if !colors.iter().any(|c| c.name == "black") {
        colors.push(ScratchColor {
            name: "black".to_string(),
            glyph: Some(b'X'),
            rgb: [0, 0, 0],
        });
    }
    if !colors.iter().any(|c| c.name == "white") {
        colors.push(ScratchColor {
            name: "white".to_string(),
            glyph: Some(b'.'),
            rgb: [255, 255, 255],
        });
    }

    assign_glyphs(&mut colors);

    // Background to slot 0, default to slot 1. The default is located
    // after the first swap, in case it was sitting in slot 0.
    let Some(bg) = colors.iter().position(|c| c.name == background_color) else {
        warn!("dropping puzzle: background color {background_color:?} not in palette");
        diags.push(DiagnosticKind::PuzzleColorUndefined, pos);
        return;
    };
    colors.swap(0, bg);
    let Some(default) = colors.iter().position(|c| c.name == default_color) else {
        warn!("dropping puzzle: default color {default_color:?} not in palette");
        diags.push(DiagnosticKind::PuzzleColorUndefined, pos);
        return;
    };
    colors.swap(1, default);

    if colors.len() > MAX_COLORS {
        warn!("dropping puzzle: {} colors", colors.len());
        diags.push(DiagnosticKind::PuzzleTooManyColors, pos);
        return;
    }

    let mut by_name: HashMap<&str, u8> = HashMap::new();
    let mut by_glyph: HashMap<u8, u8> = HashMap::new();
    for (i, color) in colors.iter().enumerate() {
        match by_name.entry(color.name.as_str()) {
            Entry::Occupied(_) => diags.push(DiagnosticKind::ColorDuplicateName, pos),
            Entry::Vacant(entry) => {
                entry.insert(i as u8);
            }
        }
        let glyph = color.glyph.expect("every color has a glyph by now");
        match by_glyph.entry(glyph) {
            Entry::Occupied(_) => diags.push(DiagnosticKind::ColorDuplicateChar, pos),
            Entry::Vacant(entry) => {
                entry.insert(i as u8);
            }
        }
    }

    let row_clues = match &row_lines {
        Some(lines) => match resolve_clue_lines(lines, &by_name, &default_color) {
            Some(resolved) => Some(resolved),
            None => {
                warn!("dropping puzzle: clue names an undefined color");
                diags.push(DiagnosticKind::PuzzleColorUndefined, pos);
                return;
            }
        },
        None => None,
    };
    let column_clues = match &column_lines {
        Some(lines) => match resolve_clue_lines(lines, &by_name, &default_color) {
            Some(resolved) => Some(resolved),
            None => {
                warn!("dropping puzzle: clue names an undefined color");
                diags.push(DiagnosticKind::PuzzleColorUndefined, pos);
                return;
            }
        },
        None => None,
    };

    // Dimensions come from the clue lines when both directions exist,
    // otherwise from the first goal image.
    let goal_dims = solutions
        .iter()
        .find(|s| s.kind == SolutionKind::Goal)
        .map(|s| (s.grid.len() as u32, s.grid[0].len() as u32));
    let (rows, columns) = match (&row_clues, &column_clues) {
        (Some(r), Some(c)) => (r.len() as u32, c.len() as u32),
        _ => match goal_dims {
            Some(dims) => dims,
            None => {
                if row_clues.is_none() && column_clues.is_none() {
                    warn!("dropping puzzle: no clues and no goal image");
                    diags.push(DiagnosticKind::PuzzleMissingGoal, pos);
                } else {
                    warn!("dropping puzzle: one clue direction missing and no goal to derive it");
                    diags.push(DiagnosticKind::PuzzleMissingClues, pos);
                }
                return;
            }
        },
    };
    // A direction that was given explicitly must agree with the grid.
    if row_clues.as_ref().is_some_and(|r| r.len() as u32 != rows)
        || column_clues
            .as_ref()
            .is_some_and(|c| c.len() as u32 != columns)
    {
        warn!("dropping puzzle: clue line count disagrees with the goal image");
        diags.push(DiagnosticKind::PuzzleMissingClues, pos);
        return;
    }

    // Encode every surviving image as one bitset cell per grid square.
    let n_colors = colors.len() as u32;
    let mask = color_mask(n_colors);
    let mut encoded: Vec<Encoded> = Vec::new();
    for solution in solutions {
        if solution.grid.len() as u32 != rows || solution.grid[0].len() as u32 != columns {
            diags.push(DiagnosticKind::ImageMismatchedDimensions, pos);
            continue;
        }
        let mut cells = Vec::with_capacity((rows * columns) as usize);
        for row in &solution.grid {
            for cell in row {
                match cell {
                    ScratchCell::Unknown => cells.push(Cell(mask)),
                    ScratchCell::Glyphs(glyphs) => {
                        let mut bits = 0u32;
                        for glyph in glyphs {
                            let Some(&color) = by_glyph.get(glyph) else {
                                warn!(
                                    "dropping puzzle: image glyph {:?} not in palette",
                                    *glyph as char
                                );
                                diags.push(DiagnosticKind::PuzzleColorUndefined, pos);
                                return;
                            };
                            bits |= 1 << color;
                        }
                        cells.push(Cell(bits));
                    }
                }
            }
        }
        encoded.push(Encoded {
            kind: solution.kind,
            id: solution.id,
            cells,
            notes: solution.notes,
        });
    }

    // Any direction still without clues is read off the goal image.
    let first_goal = encoded.iter().find(|s| s.kind == SolutionKind::Goal);
    let row_clues = match row_clues {
        Some(resolved) => resolved,
        None => {
            let goal = first_goal.expect("dimension check proved a goal exists");
            (0..rows)
                .map(|r| {
                    derive_line(
                        &goal.cells[(r * columns) as usize..((r + 1) * columns) as usize],
                    )
                })
                .collect()
        }
    };
    let column_clues = match column_clues {
        Some(resolved) => resolved,
        None => {
            let goal = first_goal.expect("dimension check proved a goal exists");
            (0..columns)
                .map(|c| {
                    let cells: Vec<Cell> = (0..rows)
                        .map(|r| goal.cells[(r * columns + c) as usize])
                        .collect();
                    derive_line(&cells)
                })
                .collect::<Vec<_>>()
        }
    };

    // Everything checks out; move the puzzle into the arenas.
    let color_recs: Vec<ColorRec> = colors
        .iter()
        .map(|c| ColorRec {
            name: intern(store, &c.name),
            glyph: c.glyph.expect("every color has a glyph by now"),
            rgb: c.rgb,
        })
        .collect();
    let colors_idx = store.push_slice(&color_recs);

    let row_clues_idx = push_clue_lines(store, &row_clues);
    let column_clues_idx = push_clue_lines(store, &column_clues);

    // Grouped by kind, not document order, so the arena layout matches
    // what a re-parse of the rendered form produces.
    let goals = commit_solutions(store, &encoded, SolutionKind::Goal);
    let solved = commit_solutions(store, &encoded, SolutionKind::Solved);
    let saved = commit_solutions(store, &encoded, SolutionKind::Saved);

    let note_idx: Vec<StringIndex> = notes.iter().map(|n| intern(store, n)).collect();
    let rec = PuzzleRec {
        source: intern(store, &source),
        id: intern(store, &id),
        title: intern(store, &title),
        author: intern(store, &author),
        author_id: intern(store, &author_id),
        copyright: intern(store, &copyright),
        description: intern(store, &description),
        colors: colors_idx,
        row_clues: row_clues_idx,
        column_clues: column_clues_idx,
        goals,
        solved,
        saved,
        notes: store.push_slice(&note_idx),
        rows,
        columns,
    };
    store.puzzles.push(rec);
    debug!(
        "committed puzzle {} ({rows}x{columns}, {n_colors} colors)",
        store.puzzles.len() - 1
    );
}

/// A solution whose image survived encoding, waiting to be committed.
struct Encoded {
    kind: SolutionKind,
    id: String,
    cells: Vec<Cell>,
    notes: Vec<String>,
}

fn commit_solutions(store: &mut Store, encoded: &[Encoded], kind: SolutionKind) -> DataIndex {
    let mut recs = Vec::new();
    for solution in encoded.iter().filter(|s| s.kind == kind) {
        let image = store.push_slice(&solution.cells);
        let note_idx: Vec<StringIndex> =
            solution.notes.iter().map(|n| intern(store, n)).collect();
        recs.push(SolutionRec {
            id: intern(store, &solution.id),
            image,
            notes: store.push_slice(&note_idx),
        });
    }
    store.push_slice(&recs)
}

/// Hands each glyph-less color the next free character of the shared
/// alphabet. With a legal palette the alphabet cannot run out; if the
/// palette is oversized the leftovers do not matter, the puzzle is about
/// to be dropped.
fn assign_glyphs(colors: &mut [ScratchColor]) {
    let mut used: Vec<u8> = colors.iter().filter_map(|c| c.glyph).collect();
    for color in colors.iter_mut() {
        if color.glyph.is_none() {
            if let Some(&glyph) = GLYPH_ALPHABET.iter().find(|g| !used.contains(g)) {
                used.push(glyph);
                color.glyph = Some(glyph);
            }
        }
    }
}

/// Maps parsed clue color names to palette indices. `None` if any name is
/// not in the palette.
fn resolve_clue_lines(
    lines: &[Vec<ScratchClue>],
    by_name: &HashMap<&str, u8>,
    default_color: &str,
) -> Option<Vec<Vec<Clue>>> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let mut clues = Vec::with_capacity(line.len());
        for clue in line {
            let name = clue.color.as_deref().unwrap_or(default_color);
            let &color = by_name.get(name)?;
            clues.push(Clue {
                color,
                count: clue.count,
            });
        }
        out.push(clues);
    }
    Some(out)
}

fn push_clue_lines(store: &mut Store, lines: &[Vec<Clue>]) -> DataIndex {
    let line_idx: Vec<DataIndex> = lines.iter().map(|line| store.push_slice(line)).collect();
    store.push_slice(&line_idx)
}

/// Run-length encodes one line of singleton cells; background runs are
/// omitted, so the background never appears in a clue.
fn derive_line(cells: &[Cell]) -> Vec<Clue> {
    let mut clues = Vec::new();
    let mut run: Option<(u8, u32)> = None;
    for cell in cells {
        let color = cell.single_color().unwrap_or(BACKGROUND);
        match &mut run {
            Some((c, n)) if *c == color => *n += 1,
            _ => {
                if let Some((c, n)) = run.take() {
                    if c != BACKGROUND {
                        clues.push(Clue { color: c, count: n });
                    }
                }
                run = Some((color, 1));
            }
        }
    }
    if let Some((c, n)) = run {
        if c != BACKGROUND {
            clues.push(Clue { color: c, count: n });
        }
    }
    clues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(name: &str, glyph: Option<u8>) -> ScratchColor {
        ScratchColor {
            name: name.to_string(),
            glyph,
            rgb: [0, 0, 0],
        }
    }

    #[test]
    fn glyphs_come_from_the_alphabet_in_order() {
        let mut colors = vec![color("a", None), color("b", None), color("c", None)];
        assign_glyphs(&mut colors);
        assert_eq!(colors[0].glyph, Some(b'A'));
        assert_eq!(colors[1].glyph, Some(b'B'));
        assert_eq!(colors[2].glyph, Some(b'C'));
    }

    #[test]
    fn assignment_skips_glyphs_already_in_use() {
        let mut colors = vec![color("a", Some(b'B')), color("b", None), color("c", None)];
        assign_glyphs(&mut colors);
        assert_eq!(colors[1].glyph, Some(b'A'));
        assert_eq!(colors[2].glyph, Some(b'C'));
    }

    #[test]
    fn derive_skips_background_runs() {
        let line: Vec<Cell> = [0u8, 1, 1, 0, 2, 2, 2, 1]
            .iter()
            .map(|&c| Cell::from_color(c))
            .collect();
        assert_eq!(
            derive_line(&line),
            vec![
                Clue { color: 1, count: 2 },
                Clue { color: 2, count: 3 },
                Clue { color: 1, count: 1 },
            ]
        );
    }

    #[test]
    fn derive_empty_and_full_lines() {
        let blank: Vec<Cell> = vec![Cell::from_color(0); 4];
        assert_eq!(derive_line(&blank), vec![]);

        let full: Vec<Cell> = vec![Cell::from_color(1); 4];
        assert_eq!(derive_line(&full), vec![Clue { color: 1, count: 4 }]);
    }

    #[test]
    fn adjacent_runs_of_different_colors_stay_separate() {
        let line: Vec<Cell> = [1u8, 1, 2, 2]
            .iter()
            .map(|&c| Cell::from_color(c))
            .collect();
        assert_eq!(
            derive_line(&line),
            vec![Clue { color: 1, count: 2 }, Clue { color: 2, count: 2 }]
        );
    }
}
