//! Validation problems collected while loading a document.
//!
//! The loader keeps going after most problems so that a single pass reports
//! everything wrong with a file, but any recorded diagnostic makes the
//! overall parse fail with [`ParseError::InvalidPbn`].

use thiserror::Error;

/// Everything the loader and normalizer can complain about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("malformed XML: {0}")]
    XmlMalformed(String),
    #[error("element contains content it should not")]
    IllegalContent,
    #[error("unrecognized element")]
    UnrecognizedElement,
    #[error("unrecognized attribute")]
    UnrecognizedAttribute,
    #[error("unsupported puzzle type")]
    PuzzleTypeUnsupported,
    #[error("puzzle has more than 32 colors")]
    PuzzleTooManyColors,
    #[error("reference to an undefined color")]
    PuzzleColorUndefined,
    #[error("puzzle is missing clues")]
    PuzzleMissingClues,
    #[error("puzzle has neither clues nor a goal image")]
    PuzzleMissingGoal,
    #[error("color is missing its name attribute")]
    ColorMissingName,
    #[error("color char attribute is not a single printable character")]
    ColorInvalidChar,
    #[error("color value is not a 3- or 6-digit hex literal")]
    ColorInvalidRgb,
    #[error("duplicate color name")]
    ColorDuplicateName,
    #[error("duplicate color char")]
    ColorDuplicateChar,
    #[error("clues type attribute is neither \"rows\" nor \"columns\"")]
    CluesInvalidType,
    #[error("clues element is missing its type attribute")]
    CluesMissingType,
    #[error("duplicate clues element for the same direction")]
    CluesDuplicate,
    #[error("clue count is not a positive integer")]
    ClueInvalidCount,
    #[error("solution type attribute is not \"goal\", \"solution\", or \"saved\"")]
    SolutionInvalidType,
    #[error("solution has no image")]
    SolutionMissingImage,
    #[error("solution has more than one image")]
    SolutionDuplicateImage,
    #[error("goal or solution image has an ambiguous cell")]
    SolutionIndeterminateImage,
    #[error("image text does not follow the row grammar")]
    ImageInvalid,
    #[error("image dimensions do not match the puzzle")]
    ImageMismatchedDimensions,
}

/// One recorded problem: what went wrong and the byte offset in the input
/// where the reader stood when it was noticed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub offset: u64,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "byte {}: {}", self.offset, self.kind)
    }
}

/// Append-only diagnostic list, passed by the caller into [`crate::parse`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub(crate) fn push(&mut self, kind: DiagnosticKind, offset: u64) {
        self.entries.push(Diagnostic { kind, offset });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Why a parse call failed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document was readable XML but violated the puzzle-set rules; the
    /// caller's [`Diagnostics`] holds every recorded problem.
    #[error("invalid puzzle-set document")]
    InvalidPbn,
    /// The tokenizer could not make sense of the input. Recorded as an
    /// [`DiagnosticKind::XmlMalformed`] diagnostic as well.
    #[error("malformed XML")]
    MalformedXml,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
