//! Source positions
//!
//! A [`FileSet`] hands out a contiguous offset range per file. A [`Pos`] is a
//! global offset into that space, so a single `u32` identifies file, line and
//! column. `Pos::NONE` marks nodes without a source location.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Compact global source offset
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos(pub u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}

/// Human readable location resolved from a [`Pos`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub filename: String,
    /// Byte offset within the file, starting at 0
    pub offset: u32,
    /// Line number, starting at 1
    pub line: u32,
    /// Column number in bytes, starting at 1
    pub column: u32,
}

impl Position {
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.filename.is_empty(), self.is_valid()) {
            (false, true) => write!(f, "{}:{}:{}", self.filename, self.line, self.column),
            (false, false) => write!(f, "{}", self.filename),
            (true, true) => write!(f, "{}:{}", self.line, self.column),
            (true, false) => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourceFile {
    name: String,
    base: u32,
    size: u32,
    /// Offsets of the first byte of each line
    lines: Vec<u32>,
}

/// A run of adjacent comments as reported by the loader.
///
/// `text` has the comment markers already removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentGroup {
    pub pos: Pos,
    pub end: Pos,
    pub text: String,
}

/// Registry of source files and their offset ranges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSet {
    files: Vec<SourceFile>,
    /// Sorted by `pos`
    #[serde(default)]
    comments: Vec<CommentGroup>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return the position of its first byte.
    ///
    /// Line starts are computed from `content`; the file occupies
    /// `content.len() + 1` offsets so that an end-of-file position is valid.
    pub fn add_file(&mut self, name: impl Into<String>, content: &str) -> Pos {
        let base = self.next_base();
        let mut lines = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                lines.push(i as u32 + 1);
            }
        }
        self.files.push(SourceFile {
            name: name.into(),
            base,
            size: content.len() as u32,
            lines,
        });
        Pos(base)
    }

    /// Position of `line`:`column` (both 1-based) in the file starting at `file`
    pub fn pos(&self, file: Pos, line: u32, column: u32) -> Pos {
        let Some(f) = self.files.iter().find(|f| f.base == file.0) else {
            return Pos::NONE;
        };
        let Some(&start) = f.lines.get(line.saturating_sub(1) as usize) else {
            return Pos::NONE;
        };
        Pos(f.base + (start + column.saturating_sub(1)).min(f.size))
    }

    /// Resolve a global offset into file, line and column
    pub fn position(&self, pos: Pos) -> Position {
        if !pos.is_valid() {
            return Position::default();
        }
        let Some(file) = self
            .files
            .iter()
            .find(|f| pos.0 >= f.base && pos.0 <= f.base + f.size)
        else {
            return Position::default();
        };

        let offset = pos.0 - file.base;
        let line_idx = match file.lines.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            filename: file.name.clone(),
            offset,
            line: line_idx as u32 + 1,
            column: offset - file.lines[line_idx] + 1,
        }
    }

    /// Record a comment group spanning `pos..end`
    pub fn add_comment(&mut self, pos: Pos, end: Pos, text: impl Into<String>) {
        let group = CommentGroup {
            pos,
            end,
            text: text.into(),
        };
        let at = self.comments.partition_point(|c| c.pos <= pos);
        self.comments.insert(at, group);
    }

    /// Comment groups on the line of `pos` or ending on the line above it
    pub fn comments_by_pos_line(&self, pos: Pos) -> Vec<&CommentGroup> {
        let target = self.position(pos);
        if !target.is_valid() {
            return Vec::new();
        }
        self.comments
            .iter()
            .filter(|group| {
                let start = self.position(group.pos);
                let end = self.position(group.end);
                start.filename == target.filename
                    && (start.line == target.line || end.line + 1 == target.line)
            })
            .collect()
    }

    /// Documentation for the node at `pos`: the last comment group attached
    /// to its line, trimmed. Empty when there is none.
    pub fn doc(&self, pos: Pos) -> String {
        self.comments_by_pos_line(pos)
            .last()
            .map(|group| group.text.trim().to_string())
            .unwrap_or_default()
    }

    fn next_base(&self) -> u32 {
        // Offset 0 is reserved for Pos::NONE
        self.files.last().map_or(1, |f| f.base + f.size + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_lookup() {
        let mut fset = FileSet::new();
        let a = fset.add_file("a.go", "package a\n\nfunc F() {}\n");
        let b = fset.add_file("b.go", "package a\n");

        let p = fset.pos(a, 3, 6);
        let position = fset.position(p);
        assert_eq!(position.filename, "a.go");
        assert_eq!(position.line, 3);
        assert_eq!(position.column, 6);
        assert_eq!(position.to_string(), "a.go:3:6");

        let q = fset.position(fset.pos(b, 1, 1));
        assert_eq!(q.filename, "b.go");
        assert_eq!(q.offset, 0);
    }

    #[test]
    fn test_comments_by_line() {
        let src = "package a\n\n// F does things.\n// Twice.\nfunc F() {}\n\nvar x int // counter\n\n\n// stray\n\nfunc G() {}\n";
        let mut fset = FileSet::new();
        let a = fset.add_file("a.go", src);
        let at = |fset: &FileSet, line, column| fset.pos(a, line, column);

        let (pos, end) = (at(&fset, 7, 12), at(&fset, 7, 22));
        fset.add_comment(pos, end, "counter\n");
        let (pos, end) = (at(&fset, 3, 1), at(&fset, 4, 10));
        fset.add_comment(pos, end, "F does things.\nTwice.\n");
        let (pos, end) = (at(&fset, 10, 1), at(&fset, 10, 9));
        fset.add_comment(pos, end, "stray\n");

        assert_eq!(fset.doc(at(&fset, 5, 6)), "F does things.\nTwice.");
        assert_eq!(fset.doc(at(&fset, 7, 5)), "counter");
        assert_eq!(fset.doc(at(&fset, 12, 6)), "");
        assert_eq!(fset.doc(Pos::NONE), "");
        assert_eq!(fset.comments_by_pos_line(at(&fset, 11, 1)).len(), 1);
    }

    #[test]
    fn test_no_position() {
        let fset = FileSet::new();
        let position = fset.position(Pos::NONE);
        assert!(!position.is_valid());
        assert_eq!(position.to_string(), "-");
    }
}
