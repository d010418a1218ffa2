use thiserror::Error;

/// Characters a shell would otherwise interpret. Each is backslash-escaped
/// inside the surrounding double quotes.
pub const ESCAPED_CHARS: &[char] = &[
    '`', '~', '!', '#', '$', '&', '*', '(', ')', '\t', '{', '}', '[', ']', '|', '\\', ';', '\'',
    '"', '\n', '<', '>', '?', ' ', '=',
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentLineError {
    #[error("argument line ends inside a quoted section")]
    UnterminatedQuote,

    #[error("argument line ends with a dangling escape")]
    DanglingEscape,
}

/// Quote one argument for an interpreter command line.
pub fn escape_argument(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for ch in arg.chars() {
        if ESCAPED_CHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

pub fn join_arguments<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| escape_argument(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a command line produced by [`join_arguments`] back into arguments.
///
/// Unquoted whitespace separates arguments, `"` toggles quoting and a
/// backslash takes the next character literally, inside quotes or not. A
/// quoted empty string is kept as an empty argument.
pub fn split_argument_line(line: &str) -> Result<Vec<String>, ArgumentLineError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let next = chars.next().ok_or(ArgumentLineError::DanglingEscape)?;
                current.push(next);
                in_token = true;
            }
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err(ArgumentLineError::UnterminatedQuote);
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}
