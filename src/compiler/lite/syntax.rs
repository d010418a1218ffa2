use super::diagnostic::Diagnostic;

pub(super) struct Scanned {
    /// Input with comments and literal contents replaced by spaces.
    pub(super) code: String,
    pub(super) diagnostics: Vec<Diagnostic>,
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
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
}

fn blank(code: &mut String, c: char) {
    code.push(if c == '\n' { '\n' } else { ' ' });
}

fn missing_closer(open: char, line: usize, column: usize) -> Diagnostic {
    match open {
        '(' => Diagnostic::error("CS1026", line, column, ") expected"),
        '[' => Diagnostic::error("CS1003", line, column, "Syntax error, ']' expected"),
        _ => Diagnostic::error("CS1513", line, column, "} expected"),
    }
}

fn closes(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

/// Structural check of active source text: literals, comments and bracket
/// nesting. Stops bracket tracking after the first mismatch to avoid cascades.
pub(super) fn scan(text: &str) -> Scanned {
    let mut cur = Cursor {
        chars: text.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut code = String::with_capacity(text.len());
    let mut diagnostics = Vec::new();
    let mut brackets: Vec<(char, usize, usize)> = Vec::new();
    let mut brackets_broken = false;

    while let Some(c) = cur.peek(0) {
        let (line, column) = (cur.line, cur.column);
        match c {
            '/' if cur.peek(1) == Some('/') => {
                while let Some(ch) = cur.peek(0) {
                    if ch == '\n' {
                        break;
                    }
                    cur.bump();
                    blank(&mut code, ch);
                }
            }
            '/' if cur.peek(1) == Some('*') => {
                cur.bump();
                cur.bump();
                code.push_str("  ");
                let mut closed = false;
                while let Some(ch) = cur.bump() {
                    blank(&mut code, ch);
                    if ch == '*' && cur.peek(0) == Some('/') {
                        cur.bump();
                        code.push(' ');
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    diagnostics.push(Diagnostic::error(
                        "CS1035",
                        line,
                        column,
                        "End-of-file found, '*/' expected",
                    ));
                }
            }
            '@' if cur.peek(1) == Some('"') => {
                cur.bump();
                code.push(' ');
                scan_verbatim_string(&mut cur, &mut code, &mut diagnostics);
            }
            '$' if cur.peek(1) == Some('"') => {
                cur.bump();
                code.push(' ');
                scan_regular_string(&mut cur, &mut code, &mut diagnostics);
            }
            '"' => scan_regular_string(&mut cur, &mut code, &mut diagnostics),
            '\'' => scan_char_literal(&mut cur, &mut code, &mut diagnostics),
            '(' | '[' | '{' => {
                cur.bump();
                code.push(c);
                if !brackets_broken {
                    brackets.push((c, line, column));
                }
            }
            ')' | ']' | '}' => {
                cur.bump();
                code.push(c);
                if brackets_broken {
                    continue;
                }
                match brackets.pop() {
                    Some((open, _, _)) if closes(open, c) => {}
                    Some((open, _, _)) => {
                        diagnostics.push(missing_closer(open, line, column));
                        brackets_broken = true;
                    }
                    None => {
                        diagnostics.push(Diagnostic::error(
                            "CS1022",
                            line,
                            column,
                            "Type or namespace definition, or end-of-file expected",
                        ));
                        brackets_broken = true;
                    }
                }
            }
            _ => {
                cur.bump();
                code.push(c);
            }
        }
    }

    if !brackets_broken {
        for (open, _, _) in brackets.iter().rev() {
            diagnostics.push(missing_closer(*open, cur.line, cur.column));
        }
    }

    Scanned { code, diagnostics }
}

fn scan_regular_string(cur: &mut Cursor, code: &mut String, diagnostics: &mut Vec<Diagnostic>) {
    let (line, column) = (cur.line, cur.column);
    if let Some(quote) = cur.bump() {
        blank(code, quote);
    }
    loop {
        match cur.peek(0) {
            None | Some('\n') => {
                diagnostics.push(Diagnostic::error("CS1010", line, column, "Newline in constant"));
                return;
            }
            Some('\\') => {
                cur.bump();
                code.push(' ');
                if let Some(escaped) = cur.peek(0) {
                    if escaped != '\n' {
                        cur.bump();
                        code.push(' ');
                    }
                }
            }
            Some('"') => {
                cur.bump();
                code.push(' ');
                return;
            }
            Some(ch) => {
                cur.bump();
                blank(code, ch);
            }
        }
    }
}

fn scan_verbatim_string(cur: &mut Cursor, code: &mut String, diagnostics: &mut Vec<Diagnostic>) {
    let (line, column) = (cur.line, cur.column);
    if let Some(quote) = cur.bump() {
        blank(code, quote);
    }
    while let Some(ch) = cur.bump() {
        blank(code, ch);
        if ch == '"' {
            if cur.peek(0) == Some('"') {
                cur.bump();
                code.push(' ');
                continue;
            }
            return;
        }
    }
    diagnostics.push(Diagnostic::error(
        "CS1039",
        line,
        column,
        "Unterminated string literal",
    ));
}

fn scan_char_literal(cur: &mut Cursor, code: &mut String, diagnostics: &mut Vec<Diagnostic>) {
    let (line, column) = (cur.line, cur.column);
    cur.bump();
    code.push(' ');
    let mut width = 0;
    loop {
        match cur.peek(0) {
            None | Some('\n') => {
                diagnostics.push(Diagnostic::error("CS1010", line, column, "Newline in constant"));
                return;
            }
            Some('\\') => {
                cur.bump();
                code.push(' ');
                if cur.peek(0).is_some_and(|ch| ch != '\n') {
                    cur.bump();
                    code.push(' ');
                }
                width += 1;
            }
            Some('\'') => {
                cur.bump();
                code.push(' ');
                if width == 0 {
                    diagnostics.push(Diagnostic::error(
                        "CS1011",
                        line,
                        column,
                        "Empty character literal",
                    ));
                } else if width > 1 {
                    diagnostics.push(Diagnostic::error(
                        "CS1012",
                        line,
                        column,
                        "Too many characters in character literal",
                    ));
                }
                return;
            }
            Some(ch) => {
                cur.bump();
                blank(code, ch);
                width += 1;
            }
        }
    }
}
