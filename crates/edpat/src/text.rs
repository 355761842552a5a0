// Read-only view of the editor's text as seen by the recognizer
//
// Columns are 1-based. Reading past the used part of a line yields a space,
// the way the editor shows virtual space to the right of the text.

use crate::symbol::Mark;

pub type LineId = usize;

/// Frame-wide column settings that positional anchors compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub left_margin: usize,
    pub right_margin: usize,
    pub dot_column: usize,
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self {
            left_margin: 1,
            right_margin: 80,
            dot_column: 1,
        }
    }
}

pub trait TextSource {
    /// Byte at `col`, or a space beyond the used length.
    fn byte_at(&self, line: LineId, col: usize) -> u8;
    /// Number of bytes in use on `line`.
    fn used(&self, line: LineId) -> usize;
    fn next_line(&self, line: LineId) -> Option<LineId>;
    fn prev_line(&self, line: LineId) -> Option<LineId>;
    /// Whether `mark` is set at this position.
    fn has_mark(&self, line: LineId, col: usize, mark: Mark) -> bool;
    fn frame(&self) -> FrameInfo;
}

/// In-memory text: a vector of lines plus the marks and frame settings.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: Vec<Vec<u8>>,
    marks: Vec<(Mark, LineId, usize)>,
    frame: FrameInfo,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(|l| l.as_bytes().to_vec()).collect(),
            ..Self::default()
        }
    }

    pub fn push_line(&mut self, line: &[u8]) -> LineId {
        self.lines.push(line.to_vec());
        self.lines.len() - 1
    }

    pub fn line(&self, line: LineId) -> &[u8] {
        self.lines.get(line).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn replace_line(&mut self, line: LineId, text: Vec<u8>) {
        if let Some(slot) = self.lines.get_mut(line) {
            *slot = text;
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Set `mark` at a position, moving it if it was set elsewhere.
    pub fn set_mark(&mut self, mark: Mark, line: LineId, col: usize) {
        self.marks.retain(|(m, _, _)| *m != mark);
        self.marks.push((mark, line, col));
    }

    pub fn clear_mark(&mut self, mark: Mark) {
        self.marks.retain(|(m, _, _)| *m != mark);
    }

    pub fn set_frame(&mut self, frame: FrameInfo) {
        self.frame = frame;
    }
}

impl TextSource for LineBuffer {
    fn byte_at(&self, line: LineId, col: usize) -> u8 {
        match col.checked_sub(1) {
            Some(i) => self.line(line).get(i).copied().unwrap_or(b' '),
            None => b' ',
        }
    }

    fn used(&self, line: LineId) -> usize {
        self.line(line).len()
    }

    fn next_line(&self, line: LineId) -> Option<LineId> {
        let next = line + 1;
        (next < self.lines.len()).then_some(next)
    }

    fn prev_line(&self, line: LineId) -> Option<LineId> {
        line.checked_sub(1)
    }

    fn has_mark(&self, line: LineId, col: usize, mark: Mark) -> bool {
        self.marks
            .iter()
            .any(|&(m, l, c)| m == mark && l == line && c == col)
    }

    fn frame(&self) -> FrameInfo {
        self.frame
    }
}
