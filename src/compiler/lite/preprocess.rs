use super::diagnostic::Diagnostic;
use std::collections::BTreeSet;

pub(super) struct Preprocessed {
    /// Input with directive lines and inactive regions blanked; line numbers are preserved.
    pub(super) text: String,
    /// Symbols in effect at the end of the file.
    pub(super) symbols: BTreeSet<String>,
    pub(super) diagnostics: Vec<Diagnostic>,
}

struct Conditional {
    parent_active: bool,
    active: bool,
    taken: bool,
    seen_else: bool,
}

pub(super) fn preprocess(source: &str, initial: &BTreeSet<String>) -> Preprocessed {
    let mut symbols = initial.clone();
    let mut stack: Vec<Conditional> = Vec::new();
    let mut diagnostics = Vec::new();
    let mut text = String::with_capacity(source.len());
    let mut seen_code = false;
    let mut last_line = 1;

    for (index, raw) in source.split('\n').enumerate() {
        let line_no = index + 1;
        last_line = line_no;
        if index > 0 {
            text.push('\n');
        }
        let active = stack.last().map_or(true, |c| c.active);
        let trimmed = raw.trim_start();

        let Some(after_hash) = trimmed.strip_prefix('#') else {
            if active {
                text.push_str(raw);
                let code = trimmed.trim_end();
                if !code.is_empty() && !code.starts_with("//") {
                    seen_code = true;
                }
            }
            continue;
        };

        let column = raw.len() - trimmed.len() + 1;
        let directive = after_hash.trim_start();
        let name_len = directive
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(directive.len());
        let (name, rest) = directive.split_at(name_len);
        let message = rest.trim();
        let operand = strip_line_comment(rest).trim();

        match name {
            "if" => {
                let taken = active
                    && evaluate_or_report(operand, &symbols, line_no, column, &mut diagnostics);
                stack.push(Conditional {
                    parent_active: active,
                    active: taken,
                    taken,
                    seen_else: false,
                });
            }
            "elif" => match stack.last_mut() {
                Some(frame) if !frame.seen_else => {
                    let eligible = frame.parent_active && !frame.taken;
                    let hit = eligible
                        && evaluate_or_report(operand, &symbols, line_no, column, &mut diagnostics);
                    frame.active = hit;
                    frame.taken |= hit;
                }
                _ => diagnostics.push(unexpected_directive(line_no, column)),
            },
            "else" => match stack.last_mut() {
                Some(frame) if !frame.seen_else => {
                    frame.active = frame.parent_active && !frame.taken;
                    frame.taken = true;
                    frame.seen_else = true;
                }
                _ => diagnostics.push(unexpected_directive(line_no, column)),
            },
            "endif" => {
                if stack.pop().is_none() {
                    diagnostics.push(unexpected_directive(line_no, column));
                }
            }
            "define" | "undef" if active => {
                if seen_code {
                    diagnostics.push(Diagnostic::error(
                        "CS1032",
                        line_no,
                        column,
                        "Cannot define/undefine preprocessor symbols after first token in file",
                    ));
                } else if !is_identifier(operand) {
                    diagnostics.push(Diagnostic::error(
                        "CS1001",
                        line_no,
                        column,
                        "Identifier expected",
                    ));
                } else if name == "define" {
                    symbols.insert(operand.to_string());
                } else {
                    symbols.remove(operand);
                }
            }
            "error" if active => diagnostics.push(Diagnostic::error(
                "CS1029",
                line_no,
                column,
                format!("#error: '{message}'"),
            )),
            "warning" if active => diagnostics.push(Diagnostic::warning(
                "CS1030",
                line_no,
                column,
                format!("#warning: '{message}'"),
            )),
            "define" | "undef" | "error" | "warning" | "region" | "endregion" | "pragma"
            | "line" | "nullable" => {}
            _ if active => diagnostics.push(Diagnostic::error(
                "CS1024",
                line_no,
                column,
                "Preprocessor directive expected",
            )),
            _ => {}
        }
    }

    for _ in stack.iter() {
        diagnostics.push(Diagnostic::error(
            "CS1027",
            last_line,
            1,
            "#endif directive expected",
        ));
    }

    Preprocessed {
        text,
        symbols,
        diagnostics,
    }
}

fn strip_line_comment(rest: &str) -> &str {
    rest.find("//").map_or(rest, |idx| &rest[..idx])
}

fn unexpected_directive(line: usize, column: usize) -> Diagnostic {
    Diagnostic::error("CS1028", line, column, "Unexpected preprocessor directive")
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn evaluate_or_report(
    expr: &str,
    symbols: &BTreeSet<String>,
    line: usize,
    column: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    match evaluate(expr, symbols) {
        Ok(value) => value,
        Err(reason) => {
            diagnostics.push(Diagnostic::error(
                "CS1517",
                line,
                column,
                format!("Invalid preprocessor expression: {reason}"),
            ));
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Literal(bool),
    Not,
    And,
    Or,
    Eq,
    Ne,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            c if c == '_' || c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i] == '_' || chars[i].is_alphanumeric()) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Literal(true),
                    "false" => Token::Literal(false),
                    _ => Token::Ident(word),
                });
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

struct ExprParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    symbols: &'a BTreeSet<String>,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<bool, String> {
        let mut value = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<bool, String> {
        let mut value = self.equality()?;
        while self.eat(&Token::And) {
            let rhs = self.equality()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn equality(&mut self) -> Result<bool, String> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Eq) {
                value = value == self.unary()?;
            } else if self.eat(&Token::Ne) {
                value = value != self.unary()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<bool, String> {
        if self.eat(&Token::Not) {
            return Ok(!self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<bool, String> {
        let token = self.peek().cloned();
        self.pos += 1;
        match token {
            Some(Token::Ident(name)) => Ok(self.symbols.contains(&name)),
            Some(Token::Literal(value)) => Ok(value),
            Some(Token::Open) => {
                let value = self.or()?;
                if !self.eat(&Token::Close) {
                    return Err("')' expected".to_string());
                }
                Ok(value)
            }
            Some(other) => Err(format!("unexpected {other:?}")),
            None => Err("expression expected".to_string()),
        }
    }
}

pub(super) fn evaluate(expr: &str, symbols: &BTreeSet<String>) -> Result<bool, String> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err("expression expected".to_string());
    }
    let mut parser = ExprParser {
        tokens,
        pos: 0,
        symbols,
    };
    let value = parser.or()?;
    if parser.pos < parser.tokens.len() {
        return Err("unexpected trailing tokens".to_string());
    }
    Ok(value)
}
