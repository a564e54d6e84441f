//! Shell-like splitting of interactive input lines

/// Split a line on whitespace, honouring quotes and backslash escapes
///
/// Quotes are removed only from tokens that begin with one. A token that
/// begins with unquoted text, or that continues a call whose parenthesis is
/// still open, keeps its quotes and escapes so `agent.method("a,b")` reaches
/// the shorthand parser intact. An unterminated quote runs to the end of the
/// line.
pub fn split_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut verbatim = false;
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if !in_token && quote.is_none() && !c.is_whitespace() {
            in_token = true;
            verbatim = depth > 0 || !matches!(c, '"' | '\'');
        }
        match (quote, c) {
            (Some(open), c) if c == open => {
                quote = None;
                if verbatim {
                    current.push(c);
                }
            }
            (Some('\''), _) => current.push(c),
            (_, '\\') => match chars.next() {
                Some(next) if verbatim && !next.is_whitespace() => {
                    current.push('\\');
                    current.push(next);
                }
                Some(next) => current.push(next),
                None if verbatim => current.push('\\'),
                None => {}
            },
            (Some(_), _) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                if verbatim {
                    current.push(c);
                }
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                if verbatim {
                    match c {
                        '(' => depth += 1,
                        ')' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                }
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
