//! Source positions, files and file sets.
//!
//! Every file added to a [`SourceFileSet`] owns a slice `[base, base + size]`
//! of one global offset space, so a single integer [`Pos`] identifies a byte
//! in any of them. Line-start tables grow while the scanner walks the file,
//! which lets positions be resolved during the scan itself.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Offset into the merged offset space of a [`SourceFileSet`].
///
/// `Pos::NONE` (zero) means "no position".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(pub usize);

impl Pos {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Position `n` bytes after this one.
    #[must_use]
    pub const fn add(self, n: usize) -> Self {
        Self(self.0 + n)
    }
}

/// A resolved position: file name, byte offset, 1-based line and column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceFilePos {
    pub filename: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceFilePos {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceFilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = self.filename.clone();
        if self.is_valid() {
            if !s.is_empty() {
                s.push(':');
            }
            s.push_str(&self.line.to_string());
            if self.column != 0 {
                s.push(':');
                s.push_str(&self.column.to_string());
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        f.write_str(&s)
    }
}

/// One source file inside a [`SourceFileSet`].
#[derive(Debug)]
pub struct SourceFile {
    name: String,
    base: usize,
    size: usize,
    lines: RwLock<Vec<usize>>,
}

impl SourceFile {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of lines recorded so far.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.read().len()
    }

    /// Snapshot of the line-start offsets recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<usize> {
        self.lines.read().clone()
    }

    /// Record `offset` as the start of a new line.
    ///
    /// Offsets not strictly greater than the last recorded one, or beyond
    /// the file size, are ignored.
    pub fn add_line(&self, offset: usize) {
        let mut lines = self.lines.write();
        let last = lines.last().copied().unwrap_or(0);
        if (lines.is_empty() || last < offset) && offset < self.size {
            lines.push(offset);
        }
    }

    /// Byte offset where 1-based `line` starts.
    ///
    /// # Panics
    ///
    /// Panics if `line` has not been recorded.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Pos {
        let lines = self.lines.read();
        assert!(
            line >= 1 && line <= lines.len(),
            "illegal line number {line} (should be < {})",
            lines.len() + 1
        );
        Pos(self.base + lines[line - 1])
    }

    /// Global position of a file-local byte offset.
    ///
    /// # Panics
    ///
    /// Panics if `offset` lies beyond the end of the file.
    #[must_use]
    pub fn file_pos(&self, offset: usize) -> Pos {
        assert!(
            offset <= self.size,
            "offset {offset} out of range for file {} of size {}",
            self.name,
            self.size
        );
        Pos(self.base + offset)
    }

    /// File-local byte offset of a global position.
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside this file.
    #[must_use]
    pub fn offset(&self, p: Pos) -> usize {
        assert!(
            p.0 >= self.base && p.0 <= self.base + self.size,
            "position {} out of range for file {}",
            p.0,
            self.name
        );
        p.0 - self.base
    }

    /// Resolve `p` to file name, line and column.
    #[must_use]
    pub fn position(&self, p: Pos) -> SourceFilePos {
        if !p.is_valid() {
            return SourceFilePos::default();
        }
        let offset = self.offset(p);
        let lines = self.lines.read();
        let idx = lines.partition_point(|&start| start <= offset);
        if idx == 0 {
            return SourceFilePos {
                filename: self.name.clone(),
                offset,
                line: 0,
                column: 0,
            };
        }
        SourceFilePos {
            filename: self.name.clone(),
            offset,
            line: idx,
            column: offset - lines[idx - 1] + 1,
        }
    }
}

#[derive(Debug)]
struct FileSetInner {
    base: usize,
    files: Vec<Arc<SourceFile>>,
    last: Option<Arc<SourceFile>>,
}

/// Ordered set of source files sharing one offset space.
#[derive(Debug)]
pub struct SourceFileSet {
    inner: RwLock<FileSetInner>,
}

impl Default for SourceFileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFileSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(FileSetInner {
                base: 1,
                files: Vec::new(),
                last: None,
            }),
        }
    }

    /// Base the next auto-placed file would receive.
    #[must_use]
    pub fn base(&self) -> usize {
        self.inner.read().base
    }

    /// Add a file of `size` bytes.
    ///
    /// With `base == None` the file is placed right after the previous one.
    ///
    /// # Panics
    ///
    /// Panics if an explicit `base` overlaps an already added file.
    pub fn add_file(&self, name: &str, base: Option<usize>, size: usize) -> Arc<SourceFile> {
        let mut inner = self.inner.write();
        let base = base.unwrap_or(inner.base);
        assert!(
            base >= inner.base,
            "illegal base {base} (should be >= {})",
            inner.base
        );
        let file = Arc::new(SourceFile {
            name: name.to_string(),
            base,
            size,
            lines: RwLock::new(vec![0]),
        });
        inner.base = base + size + 1;
        inner.files.push(Arc::clone(&file));
        inner.last = Some(Arc::clone(&file));
        file
    }

    /// Files in insertion order.
    #[must_use]
    pub fn files(&self) -> Vec<Arc<SourceFile>> {
        self.inner.read().files.clone()
    }

    /// The file containing `p`, if any.
    #[must_use]
    pub fn file(&self, p: Pos) -> Option<Arc<SourceFile>> {
        if !p.is_valid() {
            return None;
        }
        {
            let inner = self.inner.read();
            if let Some(last) = inner
                .last
                .as_ref()
                .filter(|last| last.base <= p.0 && p.0 <= last.base + last.size)
            {
                return Some(Arc::clone(last));
            }
        }
        let mut inner = self.inner.write();
        let idx = inner.files.partition_point(|f| f.base <= p.0);
        if idx == 0 {
            return None;
        }
        let file = Arc::clone(&inner.files[idx - 1]);
        if p.0 <= file.base + file.size {
            inner.last = Some(Arc::clone(&file));
            return Some(file);
        }
        None
    }

    /// Resolve `p` across all files.
    ///
    /// # Panics
    ///
    /// Panics when a valid position lies outside every file; positions are
    /// only ever produced by a scanner over one of the set's files.
    #[must_use]
    pub fn position(&self, p: Pos) -> SourceFilePos {
        if !p.is_valid() {
            return SourceFilePos::default();
        }
        match self.file(p) {
            Some(file) => file.position(p),
            None => panic!("position {} is outside every source file", p.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_bases_do_not_overlap() {
        let set = SourceFileSet::new();
        let a = set.add_file("a", None, 10);
        let b = set.add_file("b", None, 5);
        assert_eq!(a.base(), 1);
        assert_eq!(b.base(), 12);
        assert_eq!(set.base(), 18);
    }

    #[test]
    #[should_panic(expected = "illegal base")]
    fn explicit_base_overlap_panics() {
        let set = SourceFileSet::new();
        let _ = set.add_file("a", None, 10);
        let _ = set.add_file("b", Some(3), 10);
    }

    #[test]
    fn resolves_line_and_column() {
        let set = SourceFileSet::new();
        let file = set.add_file("test", None, 12);
        file.add_line(4);
        file.add_line(8);
        let pos = set.position(file.file_pos(5));
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.to_string(), "test:2:2");
    }

    #[test]
    fn add_line_is_idempotent() {
        let set = SourceFileSet::new();
        let file = set.add_file("test", None, 20);
        file.add_line(4);
        file.add_line(4);
        file.add_line(2);
        assert_eq!(file.lines(), vec![0, 4]);
    }

    #[test]
    fn positions_resolve_to_the_right_file() {
        let set = SourceFileSet::new();
        let a = set.add_file("a", None, 3);
        let b = set.add_file("b", None, 3);
        assert_eq!(set.position(a.file_pos(1)).filename, "a");
        assert_eq!(set.position(b.file_pos(1)).filename, "b");
        assert_eq!(set.position(a.file_pos(0)).filename, "a");
    }

    #[test]
    fn invalid_position_display() {
        assert_eq!(SourceFilePos::default().to_string(), "-");
    }
}
