//! Small LaTeX token parsers shared by the preprocessor and the converter.

use nom::{
    branch::alt,
    bytes::complete::{tag, take, take_until, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    sequence::{delimited, pair, preceded},
    IResult,
};

/// A control word (`\section`, `\item*`) or control symbol (`\%`, `\\`).
pub fn command(input: &str) -> IResult<&str, &str> {
    preceded(
        char('\\'),
        alt((
            recognize(pair(take_while1(|c: char| c.is_ascii_alphabetic()), opt(char('*')))),
            take(1usize),
        )),
    )(input)
}

/// A balanced `{...}` group; yields the inner text.
pub fn braced(input: &str) -> IResult<&str, &str> {
    let (body, _) = char('{')(input)?;
    let mut depth = 1usize;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[i + 1..], &body[..i]));
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

/// An optional argument `[...]`.
pub fn bracketed(input: &str) -> IResult<&str, &str> {
    delimited(char('['), take_until("]"), char(']'))(input)
}

/// A required argument, allowing whitespace before the brace.
pub fn argument(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, braced)(input)
}

/// `\begin{name}`; yields the environment name.
pub fn begin_environment(input: &str) -> IResult<&str, &str> {
    preceded(tag("\\begin"), argument)(input)
}

/// Split an environment's body from the text following its `\end{name}`,
/// honouring nested environments of the same name.
pub fn environment_body<'a>(input: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let open = format!("\\begin{{{}}}", name);
    let close = format!("\\end{{{}}}", name);
    let mut depth = 1usize;
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let next_open = rest.find(&open);
        let next_close = rest.find(&close)?;
        match next_open {
            Some(o) if o < next_close => {
                depth += 1;
                pos += o + open.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    let end = pos + next_close;
                    return Some((&input[..end], &input[end + close.len()..]));
                }
                pos += next_close + close.len();
            }
        }
    }
    None
}

/// Remove `%` comments through the end of the line, keeping `\%`.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let mut escaped = false;
        let mut cut = None;
        for (i, c) in line.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '%' => {
                    cut = Some(i);
                    break;
                }
                _ => {}
            }
        }
        match cut {
            Some(i) => {
                out.push_str(&line[..i]);
                if line.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => out.push_str(line),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command() {
        assert_eq!(command("\\section{A}"), Ok(("{A}", "section")));
        assert_eq!(command("\\section*{A}"), Ok(("{A}", "section*")));
        assert_eq!(command("\\%rest"), Ok(("rest", "%")));
        assert_eq!(command("\\\\ next"), Ok((" next", "\\")));
        assert!(command("plain").is_err());
    }

    #[test]
    fn test_braced_nested() {
        assert_eq!(braced("{a{b}c} tail"), Ok((" tail", "a{b}c")));
        assert_eq!(braced("{a\\}b}"), Ok(("", "a\\}b")));
        assert!(braced("{open").is_err());
    }

    #[test]
    fn test_bracketed_and_argument() {
        assert_eq!(bracketed("[12pt]{article}"), Ok(("{article}", "12pt")));
        assert_eq!(argument("  {x}"), Ok(("", "x")));
    }

    #[test]
    fn test_begin_environment() {
        assert_eq!(begin_environment("\\begin{itemize} x"), Ok((" x", "itemize")));
    }

    #[test]
    fn test_environment_body_nested() {
        let input = "a \\begin{quote}b\\end{quote} c\\end{quote} after";
        let (body, rest) = environment_body(input, "quote").unwrap();
        assert_eq!(body, "a \\begin{quote}b\\end{quote} c");
        assert_eq!(rest, " after");
        assert!(environment_body("never closed", "quote").is_none());
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a % note\nb"), "a \nb");
        assert_eq!(strip_comments("50\\% off"), "50\\% off");
    }
}
