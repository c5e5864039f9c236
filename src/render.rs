//! Terminal rendering of lint results.
//!
//! Output format, per finding:
//!
//! ```text
//! model.mzn:3.12-3.27: reified global constraint [global-reified(17)]
//!    |     constraint alldifferent(xs) \/ alldifferent(xs);
//!    |     ^~~~~~~~~~~~~~~~
//! rewrite as:
//!    |     ...
//! NOTE: This result depends on the current values of some parameters
//! model.mzn:1.7: has domain 0..1
//!    ^     array[1..5] of var 0..1: as;
//! ```
//!
//! Source snippets come from a line-caching file reader; unreadable files
//! degrade to a note and never abort rendering.

use std::collections::HashMap;
use std::io::{self, Write};

use itertools::Itertools;

use crate::diagnostics::{FileContents, LintResult, Region, Sub};

const BAR_PREFIX: &str = "   |     ";
const ARROW_PREFIX: &str = "   ^     ";
const MAX_LINE: usize = 200;

/// Reads and caches whole files, handing out 1-based line ranges.
#[derive(Default)]
pub struct CachedFileReader {
    cache: HashMap<String, io::Result<Vec<String>>>,
}

impl CachedFileReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines `start..=end` (1-based) of `filename`.
    pub fn read(&mut self, filename: &str, start: u32, end: u32) -> Result<&[String], &io::Error> {
        let entry = self
            .cache
            .entry(filename.to_string())
            .or_insert_with(|| {
                std::fs::read_to_string(filename)
                    .map(|s| s.lines().map(str::to_string).collect())
            });
        match entry {
            Ok(lines) => {
                let from = (start.max(1) as usize - 1).min(lines.len());
                let to = (end as usize).min(lines.len());
                Ok(&lines[from..to.max(from)])
            }
            Err(e) => Err(e),
        }
    }
}

fn indentation(s: &str) -> usize {
    s.chars().take_while(|c| c.is_whitespace()).count()
}

fn print_line(out: &mut dyn Write, s: &str, skip: usize) -> io::Result<usize> {
    let chars: Vec<char> = s.chars().collect();
    if skip >= chars.len() {
        return Ok(0);
    }
    let rest = &chars[skip..];
    let too_long = rest.len() > MAX_LINE;
    let shown = if too_long { MAX_LINE - 3 } else { rest.len() };
    for c in &rest[..shown] {
        if c.is_whitespace() {
            write!(out, " ")?;
        } else {
            write!(out, "{c}")?;
        }
    }
    if too_long {
        write!(out, "...")?;
        return Ok(MAX_LINE);
    }
    Ok(shown)
}

fn print_marker(out: &mut dyn Write, startcol: usize, endcol: usize) -> io::Result<()> {
    let start = startcol.max(1);
    for _ in 0..(start - 1).min(MAX_LINE) {
        write!(out, " ")?;
    }
    write!(out, "^")?;
    let mut col = start + 1;
    while col <= endcol && col <= MAX_LINE {
        write!(out, "~")?;
        col += 1;
    }
    Ok(())
}

fn print_code(
    out: &mut dyn Write,
    content: &FileContents,
    reader: &mut CachedFileReader,
    is_subresult: bool,
) -> io::Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    if !content.is_valid() {
        return writeln!(out, "couldn't print snippet, file location is invalid");
    }

    let first_prefix = if is_subresult { ARROW_PREFIX } else { BAR_PREFIX };

    match &content.region {
        Region::None => writeln!(out, "{first_prefix}"),
        Region::MultiLine {
            startline,
            endline,
        } => {
            let lines = match reader.read(&content.filename, *startline, *endline) {
                Ok(lines) => lines.to_vec(),
                Err(e) => return writeln!(out, "couldn't read file: {e}"),
            };
            let common = lines.iter().map(|l| indentation(l)).min().unwrap_or(0);
            for (i, line) in lines.iter().enumerate() {
                let prefix = if i == 0 { first_prefix } else { BAR_PREFIX };
                write!(out, "{prefix}")?;
                print_line(out, line, common)?;
                writeln!(out)?;
            }
            writeln!(out, "{BAR_PREFIX}")
        }
        Region::OneLineMarked {
            line,
            startcol,
            endcol,
        } => {
            let lines = match reader.read(&content.filename, *line, *line) {
                Ok(lines) => lines.to_vec(),
                Err(e) => return writeln!(out, "couldn't read file: {e}"),
            };
            let Some(text) = lines.first() else {
                return Ok(());
            };
            let ind = indentation(text);
            write!(out, "{first_prefix}")?;
            let printed = print_line(out, text, ind)?;
            writeln!(out)?;
            write!(out, "{BAR_PREFIX}")?;
            let start = (*startcol as usize).saturating_sub(ind).max(1);
            let end = endcol.map_or(printed, |e| (e as usize).saturating_sub(ind));
            print_marker(out, start, end)?;
            writeln!(out)
        }
    }
}

fn file_position(out: &mut dyn Write, content: &FileContents) -> io::Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    write!(out, "{}:", content.filename)?;
    match &content.region {
        Region::None => Ok(()),
        Region::MultiLine {
            startline,
            endline,
        } => write!(out, "{startline}-{endline}:"),
        Region::OneLineMarked {
            line,
            startcol,
            endcol,
        } => {
            write!(out, "{line}.{startcol}")?;
            if let Some(endcol) = endcol {
                write!(out, "-{line}.{endcol}")?;
            }
            write!(out, ":")
        }
    }
}

/// Positionless NOTE sub-results come first, in their original relative
/// order, then the positioned ones.
fn notes_first(subs: &[Sub]) -> Vec<&Sub> {
    let mut ordered: Vec<&Sub> = subs.iter().filter(|s| s.content.is_empty()).collect();
    ordered.extend(subs.iter().filter(|s| !s.content.is_empty()));
    ordered
}

fn print_one_result(
    out: &mut dyn Write,
    result: &LintResult,
    reader: &mut CachedFileReader,
) -> io::Result<()> {
    file_position(out, &result.content)?;
    if !result.content.is_empty() {
        write!(out, " ")?;
    }
    writeln!(
        out,
        "{} [{}({})]",
        result.message, result.rule_name, result.rule_id
    )?;
    print_code(out, &result.content, reader, false)?;

    if let Some(rewrite) = &result.rewrite {
        writeln!(out, "rewrite as:")?;
        for line in rewrite.lines() {
            writeln!(out, "{BAR_PREFIX}{line}")?;
        }
    }

    for sub in notes_first(&result.sub_results) {
        if sub.content.is_empty() {
            writeln!(out, "NOTE: {}", sub.message)?;
        } else {
            file_position(out, &sub.content)?;
            writeln!(out, " {}", sub.message)?;
            print_code(out, &sub.content, reader, true)?;
        }
    }
    Ok(())
}

/// Render all results to `out`, sorted by `(rule, position)` so equal inputs
/// give byte-identical reports.
pub fn render_results(
    out: &mut dyn Write,
    results: &[LintResult],
    reader: &mut CachedFileReader,
) -> io::Result<()> {
    for result in results.iter().sorted() {
        print_one_result(out, result, reader)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn render_to_string(results: &[LintResult]) -> String {
        let mut out = Vec::new();
        let mut reader = CachedFileReader::new();
        render_results(&mut out, results, &mut reader).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_position_message_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.mzn");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "var int: x;").unwrap();

        let result = LintResult::new(
            13,
            "unbounded-variable",
            "unbounded variable, consider adding a domain",
            FileContents {
                region: Region::OneLineMarked {
                    line: 1,
                    startcol: 1,
                    endcol: Some(10),
                },
                filename: path.to_string_lossy().into_owned(),
            },
        );
        let rendered = render_to_string(&[result]);
        assert!(rendered.contains(":1.1-1.10: unbounded variable"));
        assert!(rendered.contains("[unbounded-variable(13)]"));
        assert!(rendered.contains("var int: x;"));
        assert!(rendered.contains("^~~~~~~~~"));
    }

    #[test]
    fn notes_are_rendered_before_positioned_subresults() {
        let mut result = LintResult::new(22, "zero-one-vars", "abuse 0..1 domain", FileContents::none());
        result.add_sub(
            "has domain 0..1",
            FileContents::file_only("whatever.mzn"),
        );
        result.set_depends_on_instance();
        let rendered = render_to_string(&[result]);
        let note_pos = rendered.find("NOTE:").unwrap();
        let sub_pos = rendered.find("whatever.mzn").unwrap();
        assert!(note_pos < sub_pos);
    }

    #[test]
    fn unreadable_files_do_not_abort_rendering() {
        let result = LintResult::new(
            1,
            "unused-var-funcs",
            "unused function",
            FileContents {
                region: Region::OneLineMarked {
                    line: 1,
                    startcol: 1,
                    endcol: None,
                },
                filename: "/nonexistent/definitely-missing.mzn".into(),
            },
        );
        let rendered = render_to_string(&[result]);
        assert!(rendered.contains("unused function"));
        assert!(rendered.contains("couldn't read file"));
    }

    #[test]
    fn results_are_rendered_in_sorted_order() {
        let a = LintResult::new(13, "unbounded-variable", "a", FileContents::file_only("m.mzn"));
        let b = LintResult::new(4, "constant-variable", "b", FileContents::file_only("m.mzn"));
        let rendered = render_to_string(&[a, b]);
        let pos_a = rendered.find("unbounded-variable").unwrap();
        let pos_b = rendered.find("constant-variable").unwrap();
        assert!(pos_b < pos_a);
    }
}
