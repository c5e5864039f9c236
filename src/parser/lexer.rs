//! Tokenizer for the MiniZinc subset understood by the frontend.
//!
//! Produces tokens annotated with 1-based inclusive source regions; the
//! parser assembles those into the node locations the diagnostics report.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    Ident(String),
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),

    // Keywords
    KwAnn,
    KwAnnotation,
    KwArray,
    KwBool,
    KwConstraint,
    KwDiff,
    KwDiv,
    KwElse,
    KwElseif,
    KwEndif,
    KwFalse,
    KwFloat,
    KwFunction,
    KwIf,
    KwIn,
    KwInclude,
    KwInt,
    KwIntersect,
    KwLet,
    KwMaximize,
    KwMinimize,
    KwMod,
    KwNot,
    KwOf,
    KwOutput,
    KwPar,
    KwPredicate,
    KwSatisfy,
    KwSet,
    KwSolve,
    KwString,
    KwSubset,
    KwSuperset,
    KwSymdiff,
    KwTest,
    KwThen,
    KwTrue,
    KwUnion,
    KwVar,
    KwWhere,
    KwXor,

    // Punctuation and operators
    Semi,
    Colon,
    DoubleColon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Pipe,
    Eq,
    EqEq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    DotDot,
    PlusPlus,
    And,
    Or,
    Arrow,
    LeftArrow,
    DoubleArrow,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokKind,
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

fn keyword(word: &str) -> Option<TokKind> {
    Some(match word {
        "ann" => TokKind::KwAnn,
        "annotation" => TokKind::KwAnnotation,
        "array" => TokKind::KwArray,
        "bool" => TokKind::KwBool,
        "constraint" => TokKind::KwConstraint,
        "diff" => TokKind::KwDiff,
        "div" => TokKind::KwDiv,
        "else" => TokKind::KwElse,
        "elseif" => TokKind::KwElseif,
        "endif" => TokKind::KwEndif,
        "false" => TokKind::KwFalse,
        "float" => TokKind::KwFloat,
        "function" => TokKind::KwFunction,
        "if" => TokKind::KwIf,
        "in" => TokKind::KwIn,
        "include" => TokKind::KwInclude,
        "int" => TokKind::KwInt,
        "intersect" => TokKind::KwIntersect,
        "let" => TokKind::KwLet,
        "maximize" => TokKind::KwMaximize,
        "minimize" => TokKind::KwMinimize,
        "mod" => TokKind::KwMod,
        "not" => TokKind::KwNot,
        "of" => TokKind::KwOf,
        "output" => TokKind::KwOutput,
        "par" => TokKind::KwPar,
        "predicate" => TokKind::KwPredicate,
        "satisfy" => TokKind::KwSatisfy,
        "set" => TokKind::KwSet,
        "solve" => TokKind::KwSolve,
        "string" => TokKind::KwString,
        "subset" => TokKind::KwSubset,
        "superset" => TokKind::KwSuperset,
        "symdiff" => TokKind::KwSymdiff,
        "test" => TokKind::KwTest,
        "then" => TokKind::KwThen,
        "true" => TokKind::KwTrue,
        "union" => TokKind::KwUnion,
        "var" => TokKind::KwVar,
        "where" => TokKind::KwWhere,
        "xor" => TokKind::KwXor,
        _ => return None,
    })
}

pub struct Lexer<'src> {
    src: &'src [u8],
    file: String,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, file: &str) -> Self {
        Self {
            src: source.as_bytes(),
            file: file.to_string(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokKind::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::parse(&self.file, self.line, self.col, message)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.bump();
                }
                Some(b'%') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek2() == Some(b'*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => return Err(self.err("unterminated block comment")),
                            Some(b'*') if self.peek2() == Some(b'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;

        let (line, col) = (self.line, self.col);
        let mk = |kind, end_line, end_col| Token {
            kind,
            line,
            col,
            end_line,
            end_col,
        };

        let Some(b) = self.peek() else {
            return Ok(mk(TokKind::Eof, line, col));
        };

        if b.is_ascii_alphabetic() || b == b'_' {
            let start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
                self.bump();
            }
            let word = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
            let kind = keyword(word).unwrap_or_else(|| TokKind::Ident(word.to_string()));
            return Ok(mk(kind, self.line, self.col - 1));
        }

        if b.is_ascii_digit() {
            return self.number(line, col);
        }

        if b == b'"' {
            return self.string(line, col);
        }

        // `$T` type-inst variables appear in stdlib signatures; treat them as
        // ordinary identifiers.
        if b == b'$' {
            let start = self.pos;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
                self.bump();
            }
            let word = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
            return Ok(mk(TokKind::Ident(word.to_string()), self.line, self.col - 1));
        }

        self.bump();
        let two = self.peek();
        let kind = match (b, two) {
            (b'.', Some(b'.')) => {
                self.bump();
                TokKind::DotDot
            }
            (b'+', Some(b'+')) => {
                self.bump();
                TokKind::PlusPlus
            }
            (b':', Some(b':')) => {
                self.bump();
                TokKind::DoubleColon
            }
            (b'=', Some(b'=')) => {
                self.bump();
                TokKind::EqEq
            }
            (b'!', Some(b'=')) => {
                self.bump();
                TokKind::Neq
            }
            (b'<', Some(b'=')) => {
                self.bump();
                TokKind::Leq
            }
            (b'>', Some(b'=')) => {
                self.bump();
                TokKind::Geq
            }
            (b'/', Some(b'\\')) => {
                self.bump();
                TokKind::And
            }
            (b'\\', Some(b'/')) => {
                self.bump();
                TokKind::Or
            }
            (b'-', Some(b'>')) => {
                self.bump();
                TokKind::Arrow
            }
            (b'<', Some(b'-')) => {
                self.bump();
                if self.peek() == Some(b'>') {
                    self.bump();
                    TokKind::DoubleArrow
                } else {
                    TokKind::LeftArrow
                }
            }
            (b';', _) => TokKind::Semi,
            (b':', _) => TokKind::Colon,
            (b',', _) => TokKind::Comma,
            (b'(', _) => TokKind::LParen,
            (b')', _) => TokKind::RParen,
            (b'[', _) => TokKind::LBracket,
            (b']', _) => TokKind::RBracket,
            (b'{', _) => TokKind::LBrace,
            (b'}', _) => TokKind::RBrace,
            (b'|', _) => TokKind::Pipe,
            (b'=', _) => TokKind::Eq,
            (b'<', _) => TokKind::Lt,
            (b'>', _) => TokKind::Gt,
            (b'+', _) => TokKind::Plus,
            (b'-', _) => TokKind::Minus,
            (b'*', _) => TokKind::Star,
            (b'/', _) => TokKind::Slash,
            (b'^', _) => TokKind::Caret,
            _ => return Err(self.err(format!("unexpected character '{}'", b as char))),
        };
        Ok(mk(kind, self.line, self.col - 1))
    }

    fn number(&mut self, line: u32, col: u32) -> Result<Token> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        // A '.' is part of the number only if followed by a digit; `1..5`
        // must lex as int, dotdot, int.
        let mut is_float = false;
        if self.peek() == Some(b'.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mut lookahead = self.pos + 1;
            if matches!(self.src.get(lookahead), Some(b'+' | b'-')) {
                lookahead += 1;
            }
            if matches!(self.src.get(lookahead), Some(c) if c.is_ascii_digit()) {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.bump();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        let kind = if is_float {
            TokKind::FloatLit(
                text.parse()
                    .map_err(|_| self.err(format!("invalid float literal '{text}'")))?,
            )
        } else {
            TokKind::IntLit(
                text.parse()
                    .map_err(|_| self.err(format!("invalid int literal '{text}'")))?,
            )
        };
        Ok(Token {
            kind,
            line,
            col,
            end_line: self.line,
            end_col: self.col - 1,
        })
    }

    fn string(&mut self, line: u32, col: u32) -> Result<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string literal")),
                Some(b'"') => break,
                Some(b'\\') => match self.bump() {
                    Some(b'n') => value.push('\n'),
                    Some(b't') => value.push('\t'),
                    Some(b'"') => value.push('"'),
                    Some(b'\\') => value.push('\\'),
                    Some(c) => value.push(c as char),
                    None => return Err(self.err("unterminated string literal")),
                },
                Some(c) => value.push(c as char),
            }
        }
        Ok(Token {
            kind: TokKind::StringLit(value),
            line,
            col,
            end_line: self.line,
            end_col: self.col - 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        Lexer::new(src, "test")
            .tokenize()
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn ranges_lex_as_three_tokens() {
        assert_eq!(
            kinds("1..5"),
            vec![
                TokKind::IntLit(1),
                TokKind::DotDot,
                TokKind::IntLit(5),
                TokKind::Eof
            ]
        );
    }

    #[test]
    fn floats_and_ints_are_distinguished() {
        assert_eq!(
            kinds("1.5 2"),
            vec![TokKind::FloatLit(1.5), TokKind::IntLit(2), TokKind::Eof]
        );
    }

    #[test]
    fn logic_operators() {
        assert_eq!(
            kinds(r"/\ \/ -> <- <-> :: .."),
            vec![
                TokKind::And,
                TokKind::Or,
                TokKind::Arrow,
                TokKind::LeftArrow,
                TokKind::DoubleArrow,
                TokKind::DoubleColon,
                TokKind::DotDot,
                TokKind::Eof
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 % comment\n/* block */ 2"),
            vec![TokKind::IntLit(1), TokKind::IntLit(2), TokKind::Eof]
        );
    }

    #[test]
    fn token_positions_are_one_based_inclusive() {
        let toks = Lexer::new("var int: x;", "test").tokenize().unwrap();
        assert_eq!((toks[0].line, toks[0].col, toks[0].end_col), (1, 1, 3));
        assert_eq!((toks[1].col, toks[1].end_col), (5, 7));
        assert_eq!((toks[3].col, toks[3].end_col), (10, 10));
    }
}
