//! XML-event-driven loader.
//!
//! The loader walks quick-xml's pull events by recursive descent: each
//! element handler reads its own attributes against a closed name list,
//! dispatches known child elements, and skips unknown subtrees with a
//! diagnostic. Per-puzzle state accumulates in a [`PuzzleScratch`] of plain
//! strings and vectors, which the normalizer turns into committed store
//! records when the `puzzle` element closes.
//!
//! Most problems are recorded and survived; only unreadable XML (and I/O
//! failure) aborts the walk.

use std::io::BufRead;
use std::sync::LazyLock;

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;

use crate::diagnostics::{DiagnosticKind, Diagnostics, ParseError};
use crate::normalize;
use crate::puzzle::{PuzzleRec, PuzzleSet, SolutionKind};
use crate::store::Store;

/// Parses a complete document held in memory.
///
/// Diagnostics accumulate in `diags`; if any are recorded the parse fails
/// with [`ParseError::InvalidPbn`] after the whole document has been
/// examined.
pub fn parse(bytes: &[u8], diags: &mut Diagnostics) -> Result<PuzzleSet, ParseError> {
    parse_stream(bytes, diags)
}

/// Parses from a buffered reader without slurping the document first.
pub fn parse_stream<R: BufRead>(
    reader: R,
    diags: &mut Diagnostics,
) -> Result<PuzzleSet, ParseError> {
    let mut xml = Reader::from_reader(reader);
    // Self-closing elements like <line/> arrive as a start/end pair.
    xml.config_mut().expand_empty_elements = true;

    let mut loader = Loader {
        reader: xml,
        diags,
        store: Store::new(),
    };
    loader.document()?;

    if loader.diags.is_empty() {
        debug!("parsed {} puzzle(s)", loader.store.puzzles.len() - 1);
        Ok(PuzzleSet {
            store: loader.store,
        })
    } else {
        warn!(
            "document rejected with {} diagnostic(s)",
            loader.diags.len()
        );
        Err(ParseError::InvalidPbn)
    }
}

/// Everything gathered for one `puzzle` element before normalization.
#[derive(Debug, Default)]
pub(crate) struct PuzzleScratch {
    pub source: String,
    pub id: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    pub copyright: String,
    pub description: String,
    pub default_color: String,
    pub background_color: String,
    pub colors: Vec<ScratchColor>,
    pub row_lines: Option<Vec<ScratchLine>>,
    pub column_lines: Option<Vec<ScratchLine>>,
    pub solutions: Vec<ScratchSolution>,
    pub notes: Vec<String>,
}

impl PuzzleScratch {
    fn new() -> PuzzleScratch {
        PuzzleScratch {
            default_color: "black".to_string(),
            background_color: "white".to_string(),
            ..PuzzleScratch::default()
        }
    }
}

/// Set-wide metadata gathered from the `puzzleset` element itself.
#[derive(Debug, Default)]
pub(crate) struct RootScratch {
    pub source: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    pub copyright: String,
    pub notes: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct ScratchColor {
    pub name: String,
    pub glyph: Option<u8>,
    pub rgb: [u8; 3],
}

pub(crate) type ScratchLine = Vec<ScratchClue>;

#[derive(Debug)]
pub(crate) struct ScratchClue {
    /// Color attribute as written; `None` means the puzzle's default color.
    pub color: Option<String>,
    pub count: u32,
}

#[derive(Debug)]
pub(crate) struct ScratchSolution {
    pub kind: SolutionKind,
    pub id: String,
    /// Uniform, non-empty grid of parsed cells.
    pub grid: Vec<Vec<ScratchCell>>,
    pub notes: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ScratchCell {
    /// A bare `?`: every palette color is a candidate.
    Unknown,
    /// One glyph, or the interior of a bracketed group.
    Glyphs(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClueDirection {
    Rows,
    Columns,
}

struct Loader<'d, R: BufRead> {
    reader: Reader<R>,
    diags: &'d mut Diagnostics,
    store: Store,
}

impl<R: BufRead> Loader<'_, R> {
    fn pos(&self) -> u64 {
        self.reader.buffer_position()
    }

    fn report(&mut self, kind: DiagnosticKind) {
        let pos = self.pos();
        self.diags.push(kind, pos);
    }

    /// Reader errors are fatal: either I/O, or malformed XML recorded at
    /// the reader's error position.
    fn fatal(&mut self, err: quick_xml::Error) -> ParseError {
        if let quick_xml::Error::Io(io) = &err {
            return ParseError::Io(std::io::Error::new(io.kind(), io.to_string()));
        }
        let pos = self.reader.error_position();
        self.diags
            .push(DiagnosticKind::XmlMalformed(err.to_string()), pos);
        ParseError::MalformedXml
    }

    fn read_event<'b>(&mut self, buf: &'b mut Vec<u8>) -> Result<Event<'b>, ParseError> {
        buf.clear();
        match self.reader.read_event_into(buf) {
            Ok(event) => Ok(event),
            Err(err) => Err(self.fatal(err)),
        }
    }

    fn premature_eof(&mut self) -> ParseError {
        let pos = self.pos();
        self.diags.push(
            DiagnosticKind::XmlMalformed("unexpected end of document".to_string()),
            pos,
        );
        ParseError::MalformedXml
    }

    /// Consumes the rest of an element we do not understand.
    fn skip(&mut self, start: &BytesStart) -> Result<(), ParseError> {
        let end = start.to_end().into_owned();
        let mut buf = Vec::new();
        match self.reader.read_to_end_into(end.name(), &mut buf) {
            Ok(_) => Ok(()),
            Err(err) => Err(self.fatal(err)),
        }
    }

    /// Collects an element's attributes as owned (name, value) pairs.
    fn attributes(&mut self, start: &BytesStart) -> Result<Vec<(Vec<u8>, String)>, ParseError> {
        let mut out = Vec::new();
        for attr in start.attributes() {
            match attr {
                Ok(attr) => match attr.unescape_value() {
                    Ok(value) => out.push((attr.key.as_ref().to_vec(), value.into_owned())),
                    Err(err) => return Err(self.fatal(err.into())),
                },
                Err(err) => return Err(self.fatal(err.into())),
            }
        }
        Ok(out)
    }

    fn no_attributes(&mut self, start: &BytesStart) -> Result<(), ParseError> {
        for _ in self.attributes(start)? {
            self.report(DiagnosticKind::UnrecognizedAttribute);
        }
        Ok(())
    }

    /// Text in a structural position must be pure whitespace.
    fn structural_text(&mut self, text: &[u8]) {
        if !text.iter().all(|b| b.is_ascii_whitespace()) {
            self.report(DiagnosticKind::IllegalContent);
        }
    }

    /// Reads the content of a text-only element up to its end tag. CDATA is
    /// literal, references resolve to their expansions, and anything
    /// structural is an `illegal_content` diagnostic (but still consumed).
    fn collect_text(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        let mut buf = Vec::new();
        loop {
            match self.read_event(&mut buf)? {
                Event::Text(t) => match t.decode() {
                    Ok(s) => out.push_str(&s),
                    Err(_) => self.report(DiagnosticKind::IllegalContent),
                },
                Event::CData(c) => out.push_str(&String::from_utf8_lossy(&c)),
                Event::GeneralRef(r) => match resolve_reference(&r) {
                    Some(ch) => out.push(ch),
                    None => self.report(DiagnosticKind::IllegalContent),
                },
                Event::Start(e) => {
                    self.report(DiagnosticKind::IllegalContent);
                    self.skip(&e)?;
                }
                Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {
                    self.report(DiagnosticKind::IllegalContent)
                }
                Event::Comment(_) | Event::Empty(_) => {}
                Event::End(_) => break,
                Event::Eof => return Err(self.premature_eof()),
            }
        }
        Ok(out.trim().to_string())
    }

    /// A text-only element that allows no attributes.
    fn text_element(&mut self, start: &BytesStart) -> Result<String, ParseError> {
        self.no_attributes(start)?;
        self.collect_text()
    }

    fn document(&mut self) -> Result<(), ParseError> {
        let mut buf = Vec::new();
        let mut seen_root = false;
        let mut seen_any = false;
        loop {
            match self.read_event(&mut buf)? {
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) => {}
                Event::Text(t) => self.structural_text(&t),
                Event::CData(_) | Event::GeneralRef(_) | Event::PI(_) => {
                    self.report(DiagnosticKind::IllegalContent)
                }
                Event::Start(e) => {
                    seen_any = true;
                    if !seen_root && e.name().as_ref() == b"puzzleset" {
                        seen_root = true;
                        self.puzzleset(&e)?;
                    } else {
                        self.report(DiagnosticKind::UnrecognizedElement);
                        self.skip(&e)?;
                    }
                }
                Event::Empty(_) | Event::End(_) => {}
                Event::Eof => break,
            }
        }
        if !seen_root && !seen_any {
            let pos = self.pos();
            self.diags.push(
                DiagnosticKind::XmlMalformed("missing document element".to_string()),
                pos,
            );
            return Err(ParseError::MalformedXml);
        }
        Ok(())
    }

    fn puzzleset(&mut self, start: &BytesStart) -> Result<(), ParseError> {
        self.no_attributes(start)?;
        // Reserve record 0; the root metadata is patched in once every
        // child has been seen.
        self.store.puzzles.push(PuzzleRec::default());

        let mut root = RootScratch::default();
        let mut buf = Vec::new();
        loop {
            match self.read_event(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"source" => root.source = self.text_element(&e)?,
                    b"title" => root.title = self.text_element(&e)?,
                    b"author" => root.author = self.text_element(&e)?,
                    b"authorid" => root.author_id = self.text_element(&e)?,
                    b"copyright" => root.copyright = self.text_element(&e)?,
                    b"note" => {
                        let note = self.text_element(&e)?;
                        root.notes.push(note);
                    }
                    b"puzzle" => self.puzzle(&e)?,
                    _ => {
                        self.report(DiagnosticKind::UnrecognizedElement);
                        self.skip(&e)?;
                    }
                },
                Event::Text(t) => self.structural_text(&t),
                Event::CData(_) | Event::GeneralRef(_) | Event::PI(_) | Event::Decl(_)
                | Event::DocType(_) => self.report(DiagnosticKind::IllegalContent),
                Event::Comment(_) | Event::Empty(_) => {}
                Event::End(_) => break,
                Event::Eof => return Err(self.premature_eof()),
            }
        }
        normalize::commit_root(&mut self.store, root);
        Ok(())
    }

    fn puzzle(&mut self, start: &BytesStart) -> Result<(), ParseError> {
        let mut scratch = PuzzleScratch::new();
        for (key, value) in self.attributes(start)? {
            match key.as_slice() {
                b"type" => {
                    if value != "grid" {
                        self.report(DiagnosticKind::PuzzleTypeUnsupported);
                        return self.skip(start);
                    }
                }
                b"defaultcolor" => scratch.default_color = value,
                b"backgroundcolor" => scratch.background_color = value,
                _ => self.report(DiagnosticKind::UnrecognizedAttribute),
            }
        }

        let mut buf = Vec::new();
        loop {
            match self.read_event(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"source" => scratch.source = self.text_element(&e)?,
                    b"id" => scratch.id = self.text_element(&e)?,
                    b"title" => scratch.title = self.text_element(&e)?,
                    b"author" => scratch.author = self.text_element(&e)?,
                    b"authorid" => scratch.author_id = self.text_element(&e)?,
                    b"copyright" => scratch.copyright = self.text_element(&e)?,
                    b"description" => scratch.description = self.text_element(&e)?,
                    b"color" => self.color(&e, &mut scratch)?,
                    b"clues" => self.clues(&e, &mut scratch)?,
                    b"solution" => self.solution(&e, &mut scratch)?,
                    b"note" => {
                        let note = self.text_element(&e)?;
                        scratch.notes.push(note);
                    }
                    _ => {
                        self.report(DiagnosticKind::UnrecognizedElement);
                        self.skip(&e)?;
                    }
                },
                Event::Text(t) => self.structural_text(&t),
                Event::CData(_) | Event::GeneralRef(_) | Event::PI(_) | Event::Decl(_)
                | Event::DocType(_) => self.report(DiagnosticKind::IllegalContent),
                Event::Comment(_) | Event::Empty(_) => {}
                Event::End(_) => break,
                Event::Eof => return Err(self.premature_eof()),
            }
        }

        let pos = self.pos();
        normalize::commit_puzzle(&mut self.store, scratch, self.diags, pos);
        Ok(())
    }

    fn color(&mut self, start: &BytesStart, scratch: &mut PuzzleScratch) -> Result<(), ParseError> {
        let mut name: Option<String> = None;
        let mut glyph: Option<u8> = None;
        for (key, value) in self.attributes(start)? {
            match key.as_slice() {
                b"name" => name = Some(value),
                b"char" => match value.as_bytes() {
                    [ch @ 0x20..=0x7E] => glyph = Some(*ch),
                    _ => self.report(DiagnosticKind::ColorInvalidChar),
                },
                _ => self.report(DiagnosticKind::UnrecognizedAttribute),
            }
        }

        let text = self.collect_text()?;
        let rgb = match parse_rgb(&text) {
            Some(rgb) => rgb,
            None => {
                self.report(DiagnosticKind::ColorInvalidRgb);
                [0, 0, 0]
            }
        };

        match name {
            Some(name) => scratch.colors.push(ScratchColor { name, glyph, rgb }),
            None => self.report(DiagnosticKind::ColorMissingName),
        }
        Ok(())
    }

    fn clues(&mut self, start: &BytesStart, scratch: &mut PuzzleScratch) -> Result<(), ParseError> {
        let mut direction: Option<ClueDirection> = None;
        let mut seen_type = false;
        for (key, value) in self.attributes(start)? {
            match key.as_slice() {
                b"type" => {
                    seen_type = true;
                    match value.as_str() {
                        "rows" => direction = Some(ClueDirection::Rows),
                        "columns" => direction = Some(ClueDirection::Columns),
                        _ => self.report(DiagnosticKind::CluesInvalidType),
                    }
                }
                _ => self.report(DiagnosticKind::UnrecognizedAttribute),
            }
        }
        if !seen_type {
            self.report(DiagnosticKind::CluesMissingType);
        }

        let mut lines: Vec<ScratchLine> = Vec::new();
        let mut buf = Vec::new();
        loop {
            match self.read_event(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"line" => {
                        let line = self.line(&e)?;
                        lines.push(line);
                    }
                    _ => {
                        self.report(DiagnosticKind::UnrecognizedElement);
                        self.skip(&e)?;
                    }
                },
                Event::Text(t) => self.structural_text(&t),
                Event::CData(_) | Event::GeneralRef(_) | Event::PI(_) | Event::Decl(_)
                | Event::DocType(_) => self.report(DiagnosticKind::IllegalContent),
                Event::Comment(_) | Event::Empty(_) => {}
                Event::End(_) => break,
                Event::Eof => return Err(self.premature_eof()),
            }
        }

        let slot = match direction {
            Some(ClueDirection::Rows) => &mut scratch.row_lines,
            Some(ClueDirection::Columns) => &mut scratch.column_lines,
            // Without a usable type there is nowhere to put the lines.
            None => return Ok(()),
        };
        if slot.is_some() {
            self.report(DiagnosticKind::CluesDuplicate);
        } else {
            *slot = Some(lines);
        }
        Ok(())
    }

    fn line(&mut self, start: &BytesStart) -> Result<ScratchLine, ParseError> {
        self.no_attributes(start)?;
        let mut clues = Vec::new();
        let mut buf = Vec::new();
        loop {
            match self.read_event(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"count" => {
                        let clue = self.count(&e)?;
                        clues.push(clue);
                    }
                    _ => {
                        self.report(DiagnosticKind::UnrecognizedElement);
                        self.skip(&e)?;
                    }
                },
                Event::Text(t) => self.structural_text(&t),
                Event::CData(_) | Event::GeneralRef(_) | Event::PI(_) | Event::Decl(_)
                | Event::DocType(_) => self.report(DiagnosticKind::IllegalContent),
                Event::Comment(_) | Event::Empty(_) => {}
                Event::End(_) => break,
                Event::Eof => return Err(self.premature_eof()),
            }
        }
        Ok(clues)
    }

    fn count(&mut self, start: &BytesStart) -> Result<ScratchClue, ParseError> {
        let mut color: Option<String> = None;
        for (key, value) in self.attributes(start)? {
            match key.as_slice() {
                b"color" => color = Some(value),
                _ => self.report(DiagnosticKind::UnrecognizedAttribute),
            }
        }

        let text = self.collect_text()?;
        let count = match text.parse::<u32>() {
            Ok(n) if n >= 1 && n < (1 << 27) => n,
            _ => {
                self.report(DiagnosticKind::ClueInvalidCount);
                0
            }
        };
        Ok(ScratchClue { color, count })
    }

    fn solution(
        &mut self,
        start: &BytesStart,
        scratch: &mut PuzzleScratch,
    ) -> Result<(), ParseError> {
        let mut kind = SolutionKind::Goal;
        let mut id = String::new();
        for (key, value) in self.attributes(start)? {
            match key.as_slice() {
                b"type" => match value.as_str() {
                    "goal" => kind = SolutionKind::Goal,
                    "solution" => kind = SolutionKind::Solved,
                    "saved" => kind = SolutionKind::Saved,
                    _ => self.report(DiagnosticKind::SolutionInvalidType),
                },
                b"id" => id = value,
                _ => self.report(DiagnosticKind::UnrecognizedAttribute),
            }
        }

        let mut seen_image = false;
        let mut grid: Option<Vec<Vec<ScratchCell>>> = None;
        let mut notes = Vec::new();
        let mut buf = Vec::new();
        loop {
            match self.read_event(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"image" => {
                        let text = self.text_element(&e)?;
                        if seen_image {
                            self.report(DiagnosticKind::SolutionDuplicateImage);
                        } else {
                            seen_image = true;
                            grid = self.parse_image(&text, kind);
                        }
                    }
                    b"note" => {
                        let note = self.text_element(&e)?;
                        notes.push(note);
                    }
                    _ => {
                        self.report(DiagnosticKind::UnrecognizedElement);
                        self.skip(&e)?;
                    }
                },
                Event::Text(t) => self.structural_text(&t),
                Event::CData(_) | Event::GeneralRef(_) | Event::PI(_) | Event::Decl(_)
                | Event::DocType(_) => self.report(DiagnosticKind::IllegalContent),
                Event::Comment(_) | Event::Empty(_) => {}
                Event::End(_) => break,
                Event::Eof => return Err(self.premature_eof()),
            }
        }

        if !seen_image {
            self.report(DiagnosticKind::SolutionMissingImage);
            return Ok(());
        }
        if let Some(grid) = grid {
            scratch.solutions.push(ScratchSolution {
                kind,
                id,
                grid,
                notes,
            });
        }
        Ok(())
    }

    /// Parses image text: rows are `|cell+|`, a cell is a glyph, a
    /// `[group]`, or `?`. Whitespace between cells and rows is
    /// insignificant. Returns `None` (with a diagnostic) if the text is
    /// structurally invalid or too ambiguous for the solution kind.
    fn parse_image(&mut self, text: &str, kind: SolutionKind) -> Option<Vec<Vec<ScratchCell>>> {
        let mut rows: Vec<Vec<ScratchCell>> = Vec::new();
        let mut indeterminate = false;
        let mut bytes = text.bytes();
        loop {
            let Some(b) = next_non_space(&mut bytes) else {
                break;
            };
            if b != b'|' {
                self.report(DiagnosticKind::ImageInvalid);
                return None;
            }
            let mut cells = Vec::new();
            loop {
                let Some(b) = next_non_space(&mut bytes) else {
                    // Row never closed.
                    self.report(DiagnosticKind::ImageInvalid);
                    return None;
                };
                match b {
                    b'|' => break,
                    b'[' => {
                        let mut glyphs = Vec::new();
                        loop {
                            match bytes.next() {
                                Some(b']') => break,
                                Some(g) if is_cell_glyph(g) => glyphs.push(g),
                                _ => {
                                    self.report(DiagnosticKind::ImageInvalid);
                                    return None;
                                }
                            }
                        }
                        if glyphs.is_empty() {
                            self.report(DiagnosticKind::ImageInvalid);
                            return None;
                        }
                        if glyphs.len() > 1 {
                            indeterminate = true;
                        }
                        cells.push(ScratchCell::Glyphs(glyphs));
                    }
                    b'?' => {
                        indeterminate = true;
                        cells.push(ScratchCell::Unknown);
                    }
                    g if is_cell_glyph(g) => cells.push(ScratchCell::Glyphs(vec![g])),
                    _ => {
                        self.report(DiagnosticKind::ImageInvalid);
                        return None;
                    }
                }
            }
            if cells.is_empty() {
                self.report(DiagnosticKind::ImageInvalid);
                return None;
            }
            rows.push(cells);
        }

        if rows.is_empty() || !rows.iter().all(|r| r.len() == rows[0].len()) {
            self.report(DiagnosticKind::ImageInvalid);
            return None;
        }
        if indeterminate && kind != SolutionKind::Saved {
            self.report(DiagnosticKind::SolutionIndeterminateImage);
            return None;
        }
        Some(rows)
    }
}

fn next_non_space(bytes: &mut impl Iterator<Item = u8>) -> Option<u8> {
    bytes.find(|b| !b.is_ascii_whitespace())
}

/// A cell glyph is any printable ASCII character that has no structural
/// meaning in the image grammar.
fn is_cell_glyph(b: u8) -> bool {
    (0x21..=0x7E).contains(&b) && !matches!(b, b'[' | b']' | b'|' | b'?' | b'/' | b'\\')
}

/// Expands a character reference or one of the five predefined entities.
fn resolve_reference(name: &[u8]) -> Option<char> {
    match name {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"apos" => Some('\''),
        b"quot" => Some('"'),
        [b'#', digits @ ..] => {
            let code = match digits {
                [b'x' | b'X', hex @ ..] => {
                    u32::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?
                }
                _ => std::str::from_utf8(digits).ok()?.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
        _ => None,
    }
}

static RGB_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").unwrap());

/// Parses a 3- or 6-digit hex literal; the short form doubles each nibble.
fn parse_rgb(text: &str) -> Option<[u8; 3]> {
    let captures = RGB_HEX.captures(text)?;
    let digits = captures[1].as_bytes();
    let nibble = |b: u8| (b as char).to_digit(16).unwrap() as u8;
    Some(if digits.len() == 3 {
        [
            nibble(digits[0]) * 17,
            nibble(digits[1]) * 17,
            nibble(digits[2]) * 17,
        ]
    } else {
        [
            nibble(digits[0]) * 16 + nibble(digits[1]),
            nibble(digits[2]) * 16 + nibble(digits[3]),
            nibble(digits[4]) * 16 + nibble(digits[5]),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_literals() {
        assert_eq!(parse_rgb("000000"), Some([0, 0, 0]));
        assert_eq!(parse_rgb("FFffFF"), Some([255, 255, 255]));
        assert_eq!(parse_rgb("12aB3c"), Some([0x12, 0xAB, 0x3C]));
        // The short form doubles each nibble.
        assert_eq!(parse_rgb("abc"), parse_rgb("aabbcc"));
        assert_eq!(parse_rgb("F00"), Some([255, 0, 0]));

        assert_eq!(parse_rgb(""), None);
        assert_eq!(parse_rgb("zzzzzz"), None);
        assert_eq!(parse_rgb("1234"), None);
        assert_eq!(parse_rgb("1234567"), None);
        assert_eq!(parse_rgb("#ffffff"), None);
    }

    #[test]
    fn references() {
        assert_eq!(resolve_reference(b"amp"), Some('&'));
        assert_eq!(resolve_reference(b"quot"), Some('"'));
        assert_eq!(resolve_reference(b"#65"), Some('A'));
        assert_eq!(resolve_reference(b"#x41"), Some('A'));
        assert_eq!(resolve_reference(b"#x110000"), None);
        assert_eq!(resolve_reference(b"nbsp"), None);
    }

    #[test]
    fn cell_glyphs() {
        assert!(is_cell_glyph(b'X'));
        assert!(is_cell_glyph(b'.'));
        assert!(is_cell_glyph(b'#'));
        for b in [b' ', b'[', b']', b'|', b'?', b'/', b'\\', b'\n', 0x1F, 0x7F] {
            assert!(!is_cell_glyph(b), "{:?} must not be a glyph", b as char);
        }
    }
}
