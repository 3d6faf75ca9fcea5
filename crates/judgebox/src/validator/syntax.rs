//! Lexical script checker.
//!
//! Not a parser: it tokenizes just enough of a classic (non-module) script to catch
//! unterminated literals, stray characters, unbalanced brackets and module syntax, and reports
//! them with the wording a JavaScript engine would use.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Pure `import` declarations, single or multi-line.
const IMPORT_DECLARATION: &str =
    r#"(?m)^[ \t]*import\s+(?:[\w$*\s{},]+?\s+from\s+)?['"][^'"\n]+['"][ \t]*;?[ \t]*$"#;
/// Pure re-exports and export lists.
const EXPORT_DECLARATION: &str = concat!(
    r#"(?m)^[ \t]*export\s+(?:\*(?:\s+as\s+[\w$]+)?\s+from\s+['"][^'"\n]+['"]"#,
    r#"|\{[\w$\s,]*\}(?:\s+from\s+['"][^'"\n]+['"])?)[ \t]*;?[ \t]*$"#,
);

/// Keywords after which a `/` starts a regular expression literal.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxIssue {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}, column {})",
            self.message, self.line, self.column
        )
    }
}

fn declaration_regexes() -> Option<&'static (Regex, Regex)> {
    static DECLARATIONS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    DECLARATIONS
        .get_or_init(|| {
            let import = Regex::new(IMPORT_DECLARATION).ok()?;
            let export = Regex::new(EXPORT_DECLARATION).ok()?;
            Some((import, export))
        })
        .as_ref()
}

/// Blank out pure import/export declarations, keeping line numbers stable.
#[must_use]
pub fn strip_module_declarations(source: &str) -> String {
    let Some((import, export)) = declaration_regexes() else {
        return source.to_string();
    };
    let blank = |caps: &regex::Captures<'_>| {
        let newlines = caps.get(0).map_or(0, |m| m.as_str().matches('\n').count());
        "\n".repeat(newlines)
    };
    let without_imports = import.replace_all(source, blank);
    export.replace_all(&without_imports, blank).into_owned()
}

/// Check `source` as a classic script. Module declarations must already be stripped.
pub fn check_script(source: &str) -> Result<(), SyntaxIssue> {
    Scanner::new(source).run()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameKind {
    Paren,
    Bracket,
    Brace,
    TemplateExpr,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    kind: FrameKind,
    line: usize,
    column: usize,
}

/// Class of the previous significant token, used to tell division from a regex literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Prev {
    Start,
    Operator,
    Dot,
    Operand,
    ExprKeyword,
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    stack: Vec<Frame>,
    prev: Prev,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            stack: Vec::new(),
            prev: Prev::Start,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn run(mut self) -> Result<(), SyntaxIssue> {
        if self.peek(0) == Some('#') && self.peek(1) == Some('!') {
            self.skip_line_comment();
        }

        while let Some(c) = self.peek(0) {
            let (line, column) = (self.line, self.column);
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek(1) == Some('*') => self.skip_block_comment(line, column)?,
                '/' if self.regex_allowed() => {
                    self.scan_regex(line, column)?;
                    self.prev = Prev::Operand;
                }
                '\'' | '"' => {
                    self.scan_string(c, line, column)?;
                    self.prev = Prev::Operand;
                }
                '`' => {
                    self.bump();
                    self.scan_template(line, column)?;
                }
                '(' | '[' | '{' => {
                    let kind = match c {
                        '(' => FrameKind::Paren,
                        '[' => FrameKind::Bracket,
                        _ => FrameKind::Brace,
                    };
                    self.bump();
                    self.stack.push(Frame { kind, line, column });
                    self.prev = Prev::Operator;
                }
                ')' | ']' | '}' => self.close(c, line, column)?,
                '#' if self.peek(1).is_some_and(is_ident_start) => {
                    self.bump();
                    self.scan_word(line, column)?;
                }
                c if is_ident_start(c) => self.scan_word(line, column)?,
                c if c.is_ascii_digit() => self.scan_number(),
                '.' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => self.scan_number(),
                '.' => {
                    self.bump();
                    self.prev = Prev::Dot;
                }
                // postfix `++`/`--` keeps the expression an operand, so `i++ / 2` divides
                '+' | '-' if self.prev == Prev::Operand && self.peek(1) == Some(c) => {
                    self.bump();
                    self.bump();
                }
                '+' | '-' | '*' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?'
                | ':' | ';' | ',' | '/' => {
                    self.bump();
                    self.prev = Prev::Operator;
                }
                _ => return Err(SyntaxIssue::new("Invalid or unexpected token", line, column)),
            }
        }

        match self.stack.last() {
            None => Ok(()),
            Some(frame) if frame.kind == FrameKind::TemplateExpr => Err(SyntaxIssue::new(
                "Unterminated template literal",
                frame.line,
                frame.column,
            )),
            Some(_) => Err(SyntaxIssue::new(
                "Unexpected end of input",
                self.line,
                self.column,
            )),
        }
    }

    fn regex_allowed(&self) -> bool {
        matches!(self.prev, Prev::Start | Prev::Operator | Prev::ExprKeyword)
    }

    fn close(&mut self, c: char, line: usize, column: usize) -> Result<(), SyntaxIssue> {
        let expected = match c {
            ')' => FrameKind::Paren,
            ']' => FrameKind::Bracket,
            _ => FrameKind::Brace,
        };
        match self.stack.last().copied() {
            Some(frame) if frame.kind == expected => {
                self.stack.pop();
                self.bump();
                self.prev = if c == '}' {
                    Prev::Operator
                } else {
                    Prev::Operand
                };
                Ok(())
            }
            Some(frame) if frame.kind == FrameKind::TemplateExpr && c == '}' => {
                self.stack.pop();
                self.bump();
                self.scan_template(frame.line, frame.column)
            }
            _ => Err(SyntaxIssue::new(
                format!("Unexpected token '{c}'"),
                line,
                column,
            )),
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self, line: usize, column: usize) -> Result<(), SyntaxIssue> {
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                None => return Err(SyntaxIssue::new("Invalid or unexpected token", line, column)),
                Some('*') if self.peek(0) == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    fn scan_string(&mut self, quote: char, line: usize, column: usize) -> Result<(), SyntaxIssue> {
        self.bump();
        loop {
            match self.peek(0) {
                None | Some('\n' | '\r') => {
                    return Err(SyntaxIssue::new("Invalid or unexpected token", line, column))
                }
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Scan template text up to the closing backtick or the next `${`.
    fn scan_template(&mut self, line: usize, column: usize) -> Result<(), SyntaxIssue> {
        loop {
            match self.bump() {
                None => {
                    return Err(SyntaxIssue::new(
                        "Unterminated template literal",
                        line,
                        column,
                    ))
                }
                Some('\\') => {
                    self.bump();
                }
                Some('`') => {
                    self.prev = Prev::Operand;
                    return Ok(());
                }
                Some('$') if self.peek(0) == Some('{') => {
                    self.bump();
                    self.stack.push(Frame {
                        kind: FrameKind::TemplateExpr,
                        line,
                        column,
                    });
                    self.prev = Prev::Start;
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    fn scan_regex(&mut self, line: usize, column: usize) -> Result<(), SyntaxIssue> {
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                None | Some('\n' | '\r') => {
                    return Err(SyntaxIssue::new(
                        "Invalid regular expression: missing /",
                        line,
                        column,
                    ))
                }
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        Ok(())
    }

    fn scan_word(&mut self, line: usize, column: usize) -> Result<(), SyntaxIssue> {
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_part) {
            self.bump();
        }
        let word: String = self
            .chars
            .get(start..self.pos)
            .unwrap_or_default()
            .iter()
            .collect();

        if self.prev != Prev::Dot {
            match word.as_str() {
                "import" => {
                    let next = self
                        .chars
                        .get(self.pos..)
                        .unwrap_or_default()
                        .iter()
                        .copied()
                        .find(|c| !c.is_whitespace());
                    if !matches!(next, Some('(' | '.')) {
                        return Err(SyntaxIssue::new(
                            "Cannot use import statement outside a module",
                            line,
                            column,
                        ));
                    }
                }
                "export" => {
                    return Err(SyntaxIssue::new(
                        "Unexpected token 'export'",
                        line,
                        column,
                    ))
                }
                _ => {}
            }
        }

        self.prev = if self.prev != Prev::Dot && EXPRESSION_KEYWORDS.contains(&word.as_str()) {
            Prev::ExprKeyword
        } else {
            Prev::Operand
        };
        Ok(())
    }

    fn scan_number(&mut self) {
        while self
            .peek(0)
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.bump();
        }
        self.prev = Prev::Operand;
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}
