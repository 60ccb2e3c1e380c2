//! End-to-end scenarios: parse, normalize, render, and round-trip.

use indoc::indoc;
use pbnset::{Cell, Clue, Diagnostics, DiagnosticKind, PuzzleSet, SolutionKind};

fn parse_ok(xml: &str) -> PuzzleSet {
    let mut diags = Diagnostics::new();
    match pbnset::parse(xml.as_bytes(), &mut diags) {
        Ok(set) => set,
        Err(err) => panic!(
            "expected success, got {err}; diagnostics: {:?}",
            diags.iter().collect::<Vec<_>>()
        ),
    }
}

fn parse_err(xml: &str) -> Vec<DiagnosticKind> {
    let mut diags = Diagnostics::new();
    match pbnset::parse(xml.as_bytes(), &mut diags) {
        Ok(_) => panic!("expected failure"),
        Err(_) => diags.iter().map(|d| d.kind.clone()).collect(),
    }
}

const BINARY_WITH_CLUES: &str = "<puzzleset><puzzle>\
    <clues type=\"rows\"><line><count>1</count></line>\
    <line><count color=\"black\">2</count></line></clues>\
    <clues type=\"columns\"><line><count>2</count></line>\
    <line><count>1</count></line></clues>\
    <solution type=\"goal\"><image>|X.||[X] X|</image></solution>\
    </puzzle></puzzleset>";

const BINARY_WITHOUT_CLUES: &str = "<puzzleset><puzzle>\
    <solution type=\"goal\"><image>|X.||[X] X|</image></solution>\
    </puzzle></puzzleset>";

#[test]
fn binary_puzzle_with_explicit_clues() {
    let set = parse_ok(BINARY_WITH_CLUES);
    let rendered = pbnset::render_to_string(&set);

    assert!(rendered.contains("<color name=\"white\" char=\".\">FFFFFF</color>"));
    assert!(rendered.contains("<color name=\"black\" char=\"X\">000000</color>"));
    assert!(rendered.contains("<image>\n|X.|\n|XX|\n</image>"));

    let puzzle = set.puzzle(0);
    assert_eq!(puzzle.row_count(), 2);
    assert_eq!(puzzle.column_count(), 2);
    assert_eq!(puzzle.row_clue(0, 0), Clue { color: 1, count: 1 });
    assert_eq!(puzzle.row_clue(1, 0), Clue { color: 1, count: 2 });
    assert_eq!(puzzle.column_clue(0, 0), Clue { color: 1, count: 2 });
    assert_eq!(puzzle.column_clue(1, 0), Clue { color: 1, count: 1 });
}

#[test]
fn clues_derived_from_goal_match_explicit_clues() {
    let explicit = parse_ok(BINARY_WITH_CLUES);
    let derived = parse_ok(BINARY_WITHOUT_CLUES);

    assert_eq!(
        pbnset::render_to_string(&explicit),
        pbnset::render_to_string(&derived)
    );
    assert_eq!(explicit, derived);
}

#[test]
fn saved_solution_round_trip() {
    let xml = "<puzzleset><puzzle>\
        <solution><image>|X.||XX|</image></solution>\
        <solution type=\"saved\"><image>|[X.]?||XX|</image></solution>\
        </puzzle></puzzleset>";
    let set = parse_ok(xml);
    let rendered = pbnset::render_to_string(&set);

    // Two colors, so `[X.]` has every bit set, which is the same as `?`.
    assert!(rendered.contains("<solution type=\"saved\">"));
    assert!(rendered.contains("<image>\n|??|\n|XX|\n</image>"));

    let reparsed = parse_ok(&rendered);
    assert_eq!(set, reparsed);
}

#[test]
fn thirty_two_colors_accepted() {
    let mut xml = String::from("<puzzleset><puzzle>");
    xml.push_str("<color name=\"black\" char=\"X\">000000</color>");
    xml.push_str("<color name=\"white\" char=\".\">FFFFFF</color>");
    let glyphs = "abcdefghijklmnopqrstuvwxyz0123";
    for (i, glyph) in glyphs.chars().enumerate() {
        xml.push_str(&format!(
            "<color name=\"c{i}\" char=\"{glyph}\">{:06X}</color>",
            i * 4321
        ));
    }
    xml.push_str("<solution><image>|X|</image></solution></puzzle></puzzleset>");

    let set = parse_ok(&xml);
    assert_eq!(set.puzzle(0).color_count(), 32);
    assert_eq!(set.puzzle(0).color_mask(), u32::MAX);
}

#[test]
fn thirty_three_colors_rejected_with_one_diagnostic() {
    let mut xml = String::from("<puzzleset><puzzle>");
    let glyphs = "abcdefghijklmnopqrstuvwxyz0123456";
    for (i, glyph) in glyphs.chars().enumerate() {
        xml.push_str(&format!(
            "<color name=\"c{i}\" char=\"{glyph}\">{:06X}</color>",
            i * 4321
        ));
    }
    xml.push_str("</puzzle></puzzleset>");

    assert_eq!(parse_err(&xml), vec![DiagnosticKind::PuzzleTooManyColors]);
}

#[test]
fn invalid_rgb_falls_back_but_still_fails() {
    let xml = "<puzzleset><puzzle>\
        <color name=\"red\" char=\"R\">zzzzzz</color>\
        <solution><image>|X|</image></solution>\
        </puzzle></puzzleset>";
    assert_eq!(parse_err(xml), vec![DiagnosticKind::ColorInvalidRgb]);
}

#[test]
fn three_digit_rgb_expands_by_doubling() {
    let xml = "<puzzleset><puzzle>\
        <color name=\"mud\" char=\"m\">abc</color>\
        <solution><image>|m|</image></solution>\
        </puzzle></puzzleset>";
    let set = parse_ok(xml);
    let rendered = pbnset::render_to_string(&set);
    assert!(rendered.contains("<color name=\"mud\" char=\"m\">AABBCC</color>"));
}

#[test]
fn goal_dimension_mismatch_rejected() {
    let xml = "<puzzleset><puzzle>\
        <clues type=\"rows\"><line><count>1</count></line><line><count>1</count></line></clues>\
        <clues type=\"columns\"><line><count>1</count></line><line><count>1</count></line></clues>\
        <solution><image>|X.||.X||X.|</image></solution>\
        </puzzle></puzzleset>";
    assert_eq!(
        parse_err(xml),
        vec![DiagnosticKind::ImageMismatchedDimensions]
    );
}

#[test]
fn question_mark_in_goal_is_indeterminate() {
    let xml = "<puzzleset><puzzle>\
        <clues type=\"rows\"><line/></clues>\
        <clues type=\"columns\"><line/></clues>\
        <solution><image>|?|</image></solution>\
        </puzzle></puzzleset>";
    assert_eq!(
        parse_err(xml),
        vec![DiagnosticKind::SolutionIndeterminateImage]
    );
}

const COLORED: &str = indoc! {r#"
    <puzzleset>
      <title>Sample pack</title>
      <puzzle defaultcolor="red" backgroundcolor="sky">
        <id>p1</id>
        <title>Kite</title>
        <color name="sky" char="~">87CEEB</color>
        <color name="red" char="r">F00</color>
        <color name="black" char="X">000000</color>
        <solution>
          <image>|~r||rX|</image>
          <note>drawn by hand</note>
        </solution>
      </puzzle>
    </puzzleset>
"#};

#[test]
fn colored_puzzle_normalizes_and_round_trips() {
    let set = parse_ok(COLORED);
    let puzzle = set.puzzle(0);

    // Reserved slots carry the declared background and default names.
    assert_eq!(puzzle.color(0).name, "sky");
    assert_eq!(puzzle.color(1).name, "red");
    // The palette also gained "white"; "black" was explicit.
    assert_eq!(puzzle.color_count(), 4);

    // Derived clues: the background never appears.
    assert_eq!(puzzle.row_clue_count(0), 1);
    assert_eq!(puzzle.row_clue(0, 0), Clue { color: 1, count: 1 });
    assert_eq!(puzzle.column_clue_count(1), 2);

    let rendered = pbnset::render_to_string(&set);
    assert!(rendered.contains("<puzzle defaultcolor=\"red\" backgroundcolor=\"sky\">"));
    assert!(rendered.contains("<color name=\"red\" char=\"r\">FF0000</color>"));
    assert!(rendered.contains("<count color=\"black\">1</count>"));
    assert!(rendered.contains("<note>drawn by hand</note>"));

    let reparsed = parse_ok(&rendered);
    assert_eq!(set, reparsed);
    assert_eq!(rendered, pbnset::render_to_string(&reparsed));
}

#[test]
fn rendering_is_deterministic() {
    let set = parse_ok(COLORED);
    assert_eq!(pbnset::render_to_string(&set), pbnset::render_to_string(&set));

    let mut via_writer = Vec::new();
    pbnset::render(&set, &mut via_writer).unwrap();
    assert_eq!(via_writer, pbnset::render_to_string(&set).into_bytes());
}

#[test]
fn goal_cells_are_singletons_and_sized_to_the_clues() {
    let set = parse_ok(COLORED);
    let puzzle = set.puzzle(0);
    for i in 0..puzzle.goal_count() {
        let image = puzzle.goal(i);
        assert_eq!(image.len(), puzzle.row_count() * puzzle.column_count());
        for r in 0..image.rows() {
            for c in 0..image.columns() {
                assert_eq!(image.get(r, c).count(), 1);
            }
        }
    }
}

#[test]
fn saved_cells_stay_inside_the_color_mask() {
    let xml = "<puzzleset><puzzle>\
        <solution><image>|X.||XX|</image></solution>\
        <solution type=\"saved\"><image>|[X.]?||X.|</image></solution>\
        </puzzle></puzzleset>";
    let set = parse_ok(xml);
    let puzzle = set.puzzle(0);
    let mask = puzzle.color_mask();
    let image = puzzle.saved_solution_image(0);
    for r in 0..image.rows() {
        for c in 0..image.columns() {
            let cell = image.get(r, c);
            assert_eq!(cell.raw() & !mask, 0);
            assert_ne!(cell.raw(), 0);
        }
    }
    // `?` reads back as the full palette.
    assert_eq!(image.get(0, 1), Cell(mask));
}

#[test]
fn metadata_inheritance_shadows() {
    let xml = "<puzzleset>\
        <source>webpbn.com</source><author>Alice</author>\
        <puzzle><solution><image>|X|</image></solution></puzzle>\
        <puzzle><author>Bob</author><solution><image>|X|</image></solution></puzzle>\
        </puzzleset>";
    let set = parse_ok(xml);

    assert_eq!(set.root().author(), "Alice");
    assert_eq!(set.puzzle(0).author(), "Alice");
    assert_eq!(set.puzzle(0).source(), "webpbn.com");
    assert_eq!(set.puzzle(1).author(), "Bob");

    // Inherited fields are not materialized into the puzzle elements.
    let rendered = pbnset::render_to_string(&set);
    assert!(rendered.contains("<author>Alice</author>"));
    assert!(rendered.contains("<author>Bob</author>"));
    assert_eq!(rendered.matches("<author>Alice</author>").count(), 1);

    let reparsed = parse_ok(&rendered);
    assert_eq!(set, reparsed);
}

#[test]
fn get_or_create_saved_solution_is_idempotent() {
    let mut set = parse_ok(BINARY_WITH_CLUES);
    assert_eq!(set.puzzle(0).saved_solution_count(), 0);

    assert_eq!(set.get_or_create_saved_solution(0), 0);
    assert_eq!(set.get_or_create_saved_solution(0), 0);
    assert_eq!(set.puzzle(0).saved_solution_count(), 1);

    let mask = set.puzzle(0).color_mask();
    let image = set.puzzle(0).saved_solution_image(0);
    assert_eq!(image.len(), 4);
    for r in 0..2 {
        for c in 0..2 {
            assert_eq!(image.get(r, c), Cell(mask));
        }
    }
}

#[test]
fn saved_cell_writes_are_masked() {
    let mut set = parse_ok(BINARY_WITH_CLUES);
    let saved = set.get_or_create_saved_solution(0);

    set.saved_image_set(0, saved, 0, 0, Cell(0xFFFF_FFF1));
    assert_eq!(set.saved_image_get(0, saved, 0, 0), Cell(0b01));

    set.saved_image_set(0, saved, 1, 1, Cell::from_color(1));
    assert_eq!(set.saved_image_get(0, saved, 1, 1), Cell(0b10));

    let mask = set.puzzle(0).color_mask();
    set.saved_image_clear(0, saved);
    assert_eq!(set.saved_image_get(0, saved, 0, 0), Cell(mask));
    assert_eq!(set.saved_image_get(0, saved, 1, 1), Cell(mask));
}

#[test]
fn existing_saved_solution_is_reused() {
    let xml = "<puzzleset><puzzle>\
        <solution><image>|X.||XX|</image></solution>\
        <solution type=\"saved\" id=\"wip\"><image>|X?||??|</image></solution>\
        </puzzle></puzzleset>";
    let mut set = parse_ok(xml);
    assert_eq!(set.get_or_create_saved_solution(0), 0);
    assert_eq!(set.puzzle(0).saved_solution_count(), 1);
    // The parsed image was not clobbered.
    assert_eq!(set.saved_image_get(0, 0, 0, 0), Cell::from_color(1));
    assert_eq!(
        set.puzzle(0).solution(SolutionKind::Saved, 0).id(),
        "wip"
    );
}

#[test]
fn text_content_escaping_round_trips() {
    let xml = "<puzzleset>\
        <title>Tom &amp; Jerry &#65;</title>\
        <puzzle>\
        <note><![CDATA[a < b & c]]></note>\
        <solution><image>|X|</image></solution>\
        </puzzle></puzzleset>";
    let set = parse_ok(xml);
    assert_eq!(set.root().title(), "Tom & Jerry A");
    assert_eq!(set.puzzle(0).note(0), "a < b & c");

    let rendered = pbnset::render_to_string(&set);
    assert!(rendered.contains("<note>a &lt; b &amp; c</note>"));

    let reparsed = parse_ok(&rendered);
    assert_eq!(set, reparsed);
}

#[test]
fn solved_solutions_render_with_their_type() {
    let xml = "<puzzleset><puzzle>\
        <clues type=\"rows\"><line><count>1</count></line></clues>\
        <clues type=\"columns\"><line><count>1</count></line></clues>\
        <solution type=\"solution\" id=\"by-sol-ver\"><image>|X|</image></solution>\
        </puzzle></puzzleset>";
    let set = parse_ok(xml);
    assert_eq!(set.puzzle(0).solution_count(SolutionKind::Solved), 1);

    let rendered = pbnset::render_to_string(&set);
    assert!(rendered.contains("<solution type=\"solution\" id=\"by-sol-ver\">"));

    let reparsed = parse_ok(&rendered);
    assert_eq!(set, reparsed);
}
