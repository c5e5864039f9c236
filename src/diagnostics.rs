//! Value types for lint findings.
//!
//! A [`LintResult`] identifies itself by `(rule id, FileContents)` only:
//! messages, rewrites and sub-results do not participate in equality or
//! ordering. Deduplication and the order-insensitive comparisons in the test
//! suite rely on this.

use std::cmp::Ordering;

use crate::ast::{ExprId, Location, Model};

/// Marked region inside a file.
///
/// `None` means "somewhere in this file"; combined with an empty filename it
/// means no position at all, which is how NOTE sub-results are represented.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Region {
    None,
    OneLineMarked {
        line: u32,
        startcol: u32,
        /// Column the marker ends on; `None` marks to the end of the line.
        endcol: Option<u32>,
    },
    MultiLine {
        startline: u32,
        endline: u32,
    },
}

/// A region plus the file it lives in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileContents {
    pub region: Region,
    pub filename: String,
}

impl FileContents {
    #[must_use]
    pub fn none() -> Self {
        Self {
            region: Region::None,
            filename: String::new(),
        }
    }

    #[must_use]
    pub fn file_only(filename: impl Into<String>) -> Self {
        Self {
            region: Region::None,
            filename: filename.into(),
        }
    }

    /// Mark the single-line extent of `loc`. A location spanning several
    /// lines marks the first line to its end.
    #[must_use]
    pub fn one_line(model: &Model, loc: Location) -> Self {
        let endcol = (loc.first_line == loc.last_line).then_some(loc.last_col);
        Self {
            region: Region::OneLineMarked {
                line: loc.first_line,
                startcol: loc.first_col,
                endcol,
            },
            filename: model.file_name(loc.file).to_string(),
        }
    }

    #[must_use]
    pub fn one_line_cols(model: &Model, loc: Location, startcol: u32, endcol: Option<u32>) -> Self {
        Self {
            region: Region::OneLineMarked {
                line: loc.first_line,
                startcol,
                endcol,
            },
            filename: model.file_name(loc.file).to_string(),
        }
    }

    #[must_use]
    pub fn multi_line(model: &Model, loc: Location) -> Self {
        Self {
            region: Region::MultiLine {
                startline: loc.first_line,
                endline: loc.last_line,
            },
            filename: model.file_name(loc.file).to_string(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filename.is_empty() && self.region == Region::None
    }

    /// Structural validity: non-empty contents need a filename, positive
    /// line/column numbers, and ordered bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.filename.is_empty() {
            return false;
        }
        match &self.region {
            Region::None => true,
            Region::OneLineMarked {
                line,
                startcol,
                endcol,
            } => *line > 0 && *startcol > 0 && endcol.is_none_or(|e| e >= *startcol),
            Region::MultiLine {
                startline,
                endline,
            } => *startline > 0 && *endline >= *startline,
        }
    }
}

/// Secondary result attached to a [`LintResult`].
#[derive(Debug, Clone)]
pub struct Sub {
    pub message: String,
    pub content: FileContents,
}

/// A single finding, produced by one rule at one place.
#[derive(Debug, Clone)]
pub struct LintResult {
    pub rule_id: u32,
    pub rule_name: &'static str,
    pub message: String,
    pub content: FileContents,
    /// Pretty-printed replacement, when the rule can suggest one.
    pub rewrite: Option<String>,
    pub sub_results: Vec<Sub>,
    pub depends_on_instance: bool,
}

impl LintResult {
    #[must_use]
    pub fn new(
        rule_id: u32,
        rule_name: &'static str,
        message: impl Into<String>,
        content: FileContents,
    ) -> Self {
        Self {
            rule_id,
            rule_name,
            message: message.into(),
            content,
            rewrite: None,
            sub_results: Vec::new(),
            depends_on_instance: false,
        }
    }

    pub fn set_rewrite(&mut self, rewrite: impl Into<String>) {
        self.rewrite = Some(rewrite.into());
    }

    #[must_use]
    pub fn with_rewrite(mut self, rewrite: impl Into<String>) -> Self {
        self.set_rewrite(rewrite);
        self
    }

    pub fn add_sub(&mut self, message: impl Into<String>, content: FileContents) {
        self.sub_results.push(Sub {
            message: message.into(),
            content,
        });
    }

    /// Attach a "relevant variable declaration" sub-result for the
    /// declaration behind `expr`, if there is one.
    pub fn add_relevant_decl(&mut self, model: &Model, expr: ExprId) {
        if let Some(decl) = model.follow_id_to_decl(expr) {
            self.add_sub(
                "relevant variable declaration",
                FileContents::multi_line(model, model.loc(decl)),
            );
        }
    }

    /// Mark the result as dependent on instance data and attach the
    /// explanatory note.
    pub fn set_depends_on_instance(&mut self) {
        if self.depends_on_instance {
            return;
        }
        self.depends_on_instance = true;
        self.add_sub(
            "This result depends on the current values of some parameters",
            FileContents::none(),
        );
    }
}

impl PartialEq for LintResult {
    fn eq(&self, other: &Self) -> bool {
        self.rule_id == other.rule_id && self.content == other.content
    }
}

impl Eq for LintResult {}

impl PartialOrd for LintResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LintResult {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.rule_id, &self.content).cmp(&(other.rule_id, &other.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(rule: u32, line: u32) -> LintResult {
        LintResult::new(
            rule,
            "x",
            "msg",
            FileContents {
                region: Region::OneLineMarked {
                    line,
                    startcol: 1,
                    endcol: Some(3),
                },
                filename: "m.mzn".into(),
            },
        )
    }

    #[test]
    fn identity_ignores_message_and_rewrite() {
        let a = marked(4, 1);
        let mut b = marked(4, 1);
        b.message = "different".into();
        b.set_rewrite("y");
        b.add_sub("sub", FileContents::none());
        assert_eq!(a, b);
        assert_ne!(marked(4, 1), marked(4, 2));
        assert_ne!(marked(4, 1), marked(5, 1));
    }

    #[test]
    fn validity_rules() {
        assert!(FileContents::none().is_valid());
        assert!(FileContents::file_only("m.mzn").is_valid());
        let bad_cols = FileContents {
            region: Region::OneLineMarked {
                line: 1,
                startcol: 5,
                endcol: Some(3),
            },
            filename: "m.mzn".into(),
        };
        assert!(!bad_cols.is_valid());
        let no_file = FileContents {
            region: Region::OneLineMarked {
                line: 1,
                startcol: 1,
                endcol: None,
            },
            filename: String::new(),
        };
        assert!(!no_file.is_valid());
    }

    #[test]
    fn depends_on_instance_adds_a_single_note() {
        let mut r = marked(22, 1);
        r.set_depends_on_instance();
        r.set_depends_on_instance();
        assert!(r.depends_on_instance);
        assert_eq!(r.sub_results.len(), 1);
        assert!(r.sub_results[0].content.is_empty());
    }
}
