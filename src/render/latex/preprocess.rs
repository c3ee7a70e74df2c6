//! Math delimiter normalisation.
//!
//! The converter only understands `$...$` and `$$...$$`. Everything else
//! authors commonly write (`\(...\)`, `\[...\]`, the amsmath display
//! environments) is rewritten into those two forms before conversion.

use super::lexer::{argument, begin_environment, bracketed};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    combinator::{map, verify},
    sequence::delimited,
    IResult,
};

/// Environments holding a single display equation.
const DISPLAY_ENVIRONMENTS: &[&str] = &["equation", "equation*", "displaymath"];

/// Environments whose rows (separated by `\\`) become separate equations.
const ROW_ENVIRONMENTS: &[&str] = &[
    "align", "align*", "gather", "gather*", "multline", "multline*", "eqnarray",
    "eqnarray*", "flalign", "flalign*", "alignat", "alignat*",
];

/// Numbering and cross-reference commands the converter cannot use.
const DROPPED_WITH_ARGUMENT: &[&str] = &["label", "tag", "tag*"];
const DROPPED: &[&str] = &["nonumber", "notag"];

const VERBATIM_BEGIN: &str = "\\begin{verbatim}";
const VERBATIM_END: &str = "\\end{verbatim}";

#[derive(Debug, Clone, Copy, PartialEq)]
enum MathSpan<'a> {
    Inline(&'a str),
    Display(&'a str),
    Rows(&'a str),
}

fn paren_math(input: &str) -> IResult<&str, MathSpan<'_>> {
    map(
        delimited(tag("\\("), take_until("\\)"), tag("\\)")),
        MathSpan::Inline,
    )(input)
}

fn bracket_math(input: &str) -> IResult<&str, MathSpan<'_>> {
    map(
        delimited(tag("\\["), take_until("\\]"), tag("\\]")),
        MathSpan::Display,
    )(input)
}

fn is_math_environment(name: &str) -> bool {
    name == "math" || DISPLAY_ENVIRONMENTS.contains(&name) || ROW_ENVIRONMENTS.contains(&name)
}

fn math_environment(input: &str) -> IResult<&str, MathSpan<'_>> {
    let (rest, name) = verify(begin_environment, |n: &str| is_math_environment(n))(input)?;
    let close = format!("\\end{{{}}}", name);
    let (rest, body) = take_until(close.as_str())(rest)?;
    let (rest, _) = tag(close.as_str())(rest)?;

    let span = if name == "math" {
        MathSpan::Inline(body)
    } else if DISPLAY_ENVIRONMENTS.contains(&name) {
        MathSpan::Display(body)
    } else {
        MathSpan::Rows(body)
    };
    Ok((rest, span))
}

fn math_span(input: &str) -> IResult<&str, MathSpan<'_>> {
    alt((paren_math, bracket_math, math_environment))(input)
}

/// Rewrite every math delimiter variant into `$...$` or `$$...$$`.
pub fn normalize_math(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while !rest.is_empty() {
        // Line breaks and escaped dollars are never delimiters.
        if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push_str("\\\\");
            rest = tail;
            continue;
        }
        if let Some(tail) = rest.strip_prefix("\\$") {
            out.push_str("\\$");
            rest = tail;
            continue;
        }
        // Verbatim bodies are copied untouched; an unclosed one runs to the end.
        if let Some(body) = rest.strip_prefix(VERBATIM_BEGIN) {
            let end = body
                .find(VERBATIM_END)
                .map_or(rest.len(), |i| VERBATIM_BEGIN.len() + i + VERBATIM_END.len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }
        if rest.starts_with('\\') {
            if let Ok((tail, span)) = math_span(rest) {
                write_span(&mut out, span);
                rest = tail;
                continue;
            }
        }

        let first = rest.chars().next().map_or(1, char::len_utf8);
        let next = rest[first..].find('\\').map_or(rest.len(), |i| i + first);
        out.push_str(&rest[..next]);
        rest = &rest[next..];
    }

    out
}

fn write_span(out: &mut String, span: MathSpan<'_>) {
    match span {
        MathSpan::Inline(body) => {
            out.push('$');
            out.push_str(strip_numbering(body).trim());
            out.push('$');
        }
        MathSpan::Display(body) => {
            out.push_str("$$");
            out.push_str(strip_numbering(body).trim());
            out.push_str("$$");
        }
        MathSpan::Rows(body) => {
            let cleaned = strip_numbering(body);
            let rows: Vec<String> = split_rows(&cleaned)
                .into_iter()
                .map(|row| row.trim().to_string())
                .filter(|row| !row.is_empty())
                .collect();
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str("$$");
                out.push_str(row);
                out.push_str("$$");
            }
        }
    }
}

/// Drop `\label{..}`, `\tag{..}`, `\tag*{..}`, `\nonumber` and `\notag`.
fn strip_numbering(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let at = &rest[pos..];
        if let Some(tail) = at.strip_prefix("\\\\") {
            out.push_str("\\\\");
            rest = tail;
            continue;
        }

        let word_len = at[1..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(at.len() - 1);
        let mut name_end = 1 + word_len;
        if word_len > 0 && at[name_end..].starts_with('*') {
            name_end += 1;
        }
        let name = &at[1..name_end];

        if DROPPED_WITH_ARGUMENT.contains(&name) {
            match argument(&at[name_end..]) {
                Ok((tail, _)) => {
                    rest = tail;
                    continue;
                }
                Err(_) => {
                    rest = &at[name_end..];
                    continue;
                }
            }
        }
        if DROPPED.contains(&name) {
            rest = &at[name_end..];
            continue;
        }

        // Keep the backslash and move past it; the word is copied as text.
        out.push('\\');
        rest = &at[1..];
    }
    out.push_str(rest);
    out
}

/// Split an alignment body into rows at its top-level `\\`, dropping any
/// `[skip]` after a break and the top-level `&` markers. Groups and nested
/// environments (`pmatrix`, `cases`, ...) keep both.
fn split_rows(body: &str) -> Vec<String> {
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut depth = 0usize;
    let mut rest = body;

    while let Some(c) = rest.chars().next() {
        if depth == 0 {
            if let Some(tail) = rest.strip_prefix("\\\\") {
                rows.push(std::mem::take(&mut row));
                rest = bracketed(tail).map_or(tail, |(t, _)| t);
                continue;
            }
        }

        let len = if rest.starts_with("\\begin{") {
            depth += 1;
            "\\begin".len()
        } else if rest.starts_with("\\end{") {
            depth = depth.saturating_sub(1);
            "\\end".len()
        } else {
            match c {
                // Control symbols such as `\&`, `\{` and `\\` stay as written.
                '\\' => 1 + rest[1..].chars().next().map_or(0, char::len_utf8),
                '{' => {
                    depth += 1;
                    1
                }
                '}' => {
                    depth = depth.saturating_sub(1);
                    1
                }
                '&' if depth == 0 => {
                    rest = &rest[1..];
                    continue;
                }
                _ => c.len_utf8(),
            }
        };
        row.push_str(&rest[..len]);
        rest = &rest[len..];
    }
    rows.push(row);
    rows
}
