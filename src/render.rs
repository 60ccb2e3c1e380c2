//! Canonical XML emission.
//!
//! The renderer walks a normalized [`PuzzleSet`] and builds the document by
//! string pushing; its output is deterministic and re-parses to an equal
//! set. It never consults diagnostics, since an invalid set is never handed
//! out by the loader in the first place.

use std::io::{self, Write};

use quick_xml::escape::escape;

use crate::puzzle::{Cell, DEFAULT_COLOR, Puzzle, PuzzleSet, Solution, SolutionKind};

/// Writes the canonical document for `set`.
pub fn render(set: &PuzzleSet, writer: &mut impl Write) -> io::Result<()> {
    writer.write_all(render_to_string(set).as_bytes())
}

/// The canonical document as a string.
pub fn render_to_string(set: &PuzzleSet) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    out.push_str("<puzzleset>\n");

    let root = set.root();
    text_element(&mut out, 1, "source", root.source());
    text_element(&mut out, 1, "title", root.title());
    text_element(&mut out, 1, "author", root.author());
    text_element(&mut out, 1, "authorid", root.author_id());
    text_element(&mut out, 1, "copyright", root.copyright());

    for puzzle in set.puzzles() {
        render_puzzle(&mut out, &puzzle);
    }

    for i in 0..root.note_count() {
        text_element(&mut out, 1, "note", root.note(i));
    }

    out.push_str("</puzzleset>\n");
    out
}

fn render_puzzle(out: &mut String, puzzle: &Puzzle<'_>) {
    indent(out, 1);
    out.push_str("<puzzle");
    // The reserved palette slots carry the default and background names;
    // only non-conventional choices need spelling out.
    if puzzle.color(DEFAULT_COLOR as usize).name != "black" {
        push_attr(out, "defaultcolor", puzzle.color(DEFAULT_COLOR as usize).name);
    }
    if puzzle.color(0).name != "white" {
        push_attr(out, "backgroundcolor", puzzle.color(0).name);
    }
    out.push_str(">\n");

    // Metadata is emitted as stored, not as inherited, so that fields left
    // to the root stay empty on a round trip.
    text_element(out, 2, "source", puzzle.own_source());
    text_element(out, 2, "id", puzzle.id());
    text_element(out, 2, "title", puzzle.title());
    text_element(out, 2, "author", puzzle.own_author());
    text_element(out, 2, "authorid", puzzle.own_author_id());
    text_element(out, 2, "copyright", puzzle.own_copyright());
    text_element(out, 2, "description", puzzle.description());

    for i in 0..puzzle.color_count() {
        let color = puzzle.color(i);
        indent(out, 2);
        out.push_str("<color");
        push_attr(out, "name", color.name);
        push_attr(out, "char", &(color.glyph as char).to_string());
        out.push('>');
        out.push_str(&format!(
            "{:02X}{:02X}{:02X}",
            color.rgb[0], color.rgb[1], color.rgb[2]
        ));
        out.push_str("</color>\n");
    }

    render_clues(out, puzzle, true);
    render_clues(out, puzzle, false);

    for kind in [SolutionKind::Goal, SolutionKind::Solved, SolutionKind::Saved] {
        for i in 0..puzzle.solution_count(kind) {
            render_solution(out, puzzle, &puzzle.solution(kind, i));
        }
    }

    for i in 0..puzzle.note_count() {
        text_element(out, 2, "note", puzzle.note(i));
    }

    indent(out, 1);
    out.push_str("</puzzle>\n");
}

fn render_clues(out: &mut String, puzzle: &Puzzle<'_>, rows: bool) {
    indent(out, 2);
    out.push_str(if rows {
        "<clues type=\"rows\">\n"
    } else {
        "<clues type=\"columns\">\n"
    });

    let lines = if rows {
        puzzle.row_count()
    } else {
        puzzle.column_count()
    };
    for line in 0..lines {
        let clue_count = if rows {
            puzzle.row_clue_count(line)
        } else {
            puzzle.column_clue_count(line)
        };
        indent(out, 3);
        if clue_count == 0 {
            out.push_str("<line/>\n");
            continue;
        }
        out.push_str("<line>");
        for k in 0..clue_count {
            let clue = if rows {
                puzzle.row_clue(line, k)
            } else {
                puzzle.column_clue(line, k)
            };
            out.push_str("<count");
            if clue.color != DEFAULT_COLOR {
                push_attr(out, "color", puzzle.color(clue.color as usize).name);
            }
            out.push('>');
            out.push_str(&clue.count.to_string());
            out.push_str("</count>");
        }
        out.push_str("</line>\n");
    }

    indent(out, 2);
    out.push_str("</clues>\n");
}

fn render_solution(out: &mut String, puzzle: &Puzzle<'_>, solution: &Solution<'_>) {
    indent(out, 2);
    out.push_str("<solution");
    match solution.kind() {
        // `goal` is the default and is left implicit.
        SolutionKind::Goal => {}
        SolutionKind::Solved => push_attr(out, "type", "solution"),
        SolutionKind::Saved => push_attr(out, "type", "saved"),
    }
    if !solution.id().is_empty() {
        push_attr(out, "id", solution.id());
    }
    out.push_str(">\n");

    let image = solution.image();
    indent(out, 3);
    out.push_str("<image>");
    for r in 0..image.rows() {
        out.push_str("\n|");
        for c in 0..image.columns() {
            push_cell(out, puzzle, image.get(r, c));
        }
        out.push('|');
    }
    out.push_str("\n</image>\n");

    for i in 0..solution.note_count() {
        text_element(out, 3, "note", solution.note(i));
    }

    indent(out, 2);
    out.push_str("</solution>\n");
}

fn push_cell(out: &mut String, puzzle: &Puzzle<'_>, cell: Cell) {
    let n_colors = puzzle.color_count() as u32;
    if let Some(color) = cell.single_color() {
        out.push(puzzle.color(color as usize).glyph as char);
    } else if cell.count() == n_colors && n_colors > 1 {
        out.push('?');
    } else {
        out.push('[');
        for color in cell.colors() {
            out.push(puzzle.color(color as usize).glyph as char);
        }
        out.push(']');
    }
}

fn text_element(out: &mut String, depth: usize, name: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    indent(out, depth);
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
