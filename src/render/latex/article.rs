//! The default LaTeX conversion capability.
//!
//! Covers the document subset a content viewer meets in practice: the
//! standard classes, common packages, sectioning, text styling, lists,
//! quotations, footnotes and math. Math is handed to `latex2mathml`; any
//! construct outside the subset is an error, which the adapter turns into
//! an error fragment.

use super::lexer::{argument, bracketed, braced, command, environment_body, strip_comments};
use super::{Converted, LatexConverter, LatexOptions};
use crate::error::LatexError;
use crate::render::{escape_attr, escape_html};
use latex2mathml::{latex_to_mathml, DisplayStyle};

const DOCUMENT_CLASSES: &[&str] = &["article", "report", "book", "minimal"];

const PACKAGES: &[&str] = &[
    "amsmath", "amssymb", "amsthm", "amsfonts", "mathtools", "latexsym", "bm", "inputenc",
    "fontenc", "babel", "lmodern", "textcomp", "microtype", "hyperref", "url", "geometry",
    "graphicx", "xcolor", "color", "enumitem", "multicol", "comment", "parskip",
];

/// Deepest group, styled command or environment nesting accepted, in the
/// body and inside math.
pub const MAX_NESTING: usize = 128;

type Result<T> = std::result::Result<T, LatexError>;

/// Converter for `article`-style documents and bare fragments.
#[derive(Debug, Clone, Default)]
pub struct ArticleConverter {
    extra_packages: Vec<String>,
}

impl ArticleConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `packages` in addition to the built-in list.
    pub fn with_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    fn check_package(&self, name: &str) -> Result<()> {
        if PACKAGES.contains(&name) || self.extra_packages.iter().any(|p| p == name) {
            Ok(())
        } else {
            Err(LatexError::UnsupportedPackage(name.to_string()))
        }
    }

    fn read_preamble(&self, preamble: &str, meta: &mut Metadata) -> Result<()> {
        let mut rest = preamble;
        while let Some(pos) = rest.find('\\') {
            let Ok((tail, name)) = command(&rest[pos..]) else {
                rest = &rest[pos + 1..];
                continue;
            };
            rest = tail;
            match name {
                "documentclass" | "usepackage" => {
                    let tail = bracketed(rest).map_or(rest, |(t, _)| t);
                    let (tail, arg) = argument(tail)
                        .map_err(|_| LatexError::Unterminated(format!("\\{} argument", name)))?;
                    rest = tail;
                    if name == "documentclass" {
                        let class = arg.trim();
                        if !DOCUMENT_CLASSES.contains(&class) {
                            return Err(LatexError::UnsupportedClass(class.to_string()));
                        }
                    } else {
                        for package in arg.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                            self.check_package(package)?;
                        }
                    }
                }
                "title" | "author" | "date" => {
                    let (tail, arg) = argument(rest)
                        .map_err(|_| LatexError::Unterminated(format!("\\{} argument", name)))?;
                    rest = tail;
                    meta.set(name, arg);
                }
                // Other preamble commands (lengths, counters, definitions) do
                // not affect the rendered body.
                _ => {}
            }
        }
        Ok(())
    }
}

impl LatexConverter for ArticleConverter {
    fn convert(&self, source: &str, options: &LatexOptions) -> Result<Converted> {
        let source = strip_comments(source);
        let (preamble, body) = split_document(&source)?;

        let mut meta = Metadata::default();
        self.read_preamble(preamble, &mut meta)?;

        let mut writer = Writer::new(Mode::Block);
        writer.meta = meta;
        writer.write(body)?;

        Ok(Converted {
            head: head_markup(options),
            body: writer.finish(),
        })
    }
}

/// Separate the preamble from the document body. Sources without
/// `\begin{document}` are treated as body fragments.
fn split_document(source: &str) -> Result<(&str, &str)> {
    const BEGIN: &str = "\\begin{document}";
    const END: &str = "\\end{document}";

    match source.find(BEGIN) {
        Some(start) => {
            let after = &source[start + BEGIN.len()..];
            let end = after
                .find(END)
                .ok_or_else(|| LatexError::Unterminated("document environment".into()))?;
            Ok((&source[..start], &after[..end]))
        }
        None if source.contains("\\documentclass") => Err(LatexError::MissingDocumentBegin),
        None => Ok(("", source)),
    }
}

#[derive(Debug, Default, Clone)]
struct Metadata {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
}

impl Metadata {
    fn set(&mut self, field: &str, value: &str) {
        let value = Some(value.trim().to_string());
        match field {
            "title" => self.title = value,
            "author" => self.author = value,
            _ => self.date = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Top level: text is wrapped in paragraphs.
    Block,
    /// Inside headings, list items and styled text: no paragraphs.
    Inline,
}

struct Writer {
    mode: Mode,
    depth: usize,
    out: String,
    in_paragraph: bool,
    meta: Metadata,
    sections: [u32; 3],
    footnotes: Vec<String>,
}

impl Writer {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            depth: 0,
            out: String::new(),
            in_paragraph: false,
            meta: Metadata::default(),
            sections: [0; 3],
            footnotes: Vec::new(),
        }
    }

    fn finish(mut self) -> String {
        self.close_paragraph();
        if !self.footnotes.is_empty() {
            self.out.push_str("<div class=\"footnotes\"><hr>\n<ol>\n");
            for (i, note) in self.footnotes.iter().enumerate() {
                self.out.push_str(&format!(
                    "<li id=\"fn{n}\">{note}</li>\n",
                    n = i + 1,
                    note = note
                ));
            }
            self.out.push_str("</ol></div>\n");
        }
        self.out
    }

    fn open_paragraph(&mut self) {
        if self.mode == Mode::Block && !self.in_paragraph {
            self.out.push_str("<p>");
            self.in_paragraph = true;
        }
    }

    fn close_paragraph(&mut self) {
        if self.in_paragraph {
            // Paragraph text never ends in its separating space.
            while self.out.ends_with(' ') {
                self.out.pop();
            }
            self.out.push_str("</p>\n");
            self.in_paragraph = false;
        }
    }

    fn push_inline(&mut self, s: &str) {
        self.open_paragraph();
        self.out.push_str(s);
    }

    /// A writer one level deeper, taking over this writer's footnotes.
    fn child(&mut self, mode: Mode) -> Result<Writer> {
        if self.depth >= MAX_NESTING {
            return Err(LatexError::TooDeep(MAX_NESTING));
        }
        let mut child = Writer::new(mode);
        child.depth = self.depth + 1;
        child.meta = self.meta.clone();
        child.footnotes = std::mem::take(&mut self.footnotes);
        Ok(child)
    }

    /// Convert `src` in inline mode, sharing footnotes with this writer.
    fn inline(&mut self, src: &str) -> Result<String> {
        let mut child = self.child(Mode::Inline)?;
        let written = child.write(src);
        self.footnotes = std::mem::take(&mut child.footnotes);
        written?;
        Ok(child.out.trim().to_string())
    }

    /// Convert `src` as a nested block (quote, center, list item).
    fn block(&mut self, src: &str) -> Result<String> {
        let mut child = self.child(Mode::Block)?;
        let written = child.write(src);
        child.close_paragraph();
        self.footnotes = std::mem::take(&mut child.footnotes);
        written?;
        Ok(child.out)
    }

    fn write(&mut self, src: &str) -> Result<()> {
        let mut rest = src;

        while let Some(c) = rest.chars().next() {
            match c {
                '\\' => {
                    let (tail, name) = command(rest)
                        .map_err(|_| LatexError::Unexpected("trailing backslash".into()))?;
                    rest = self.command(name, tail)?;
                }
                '$' => rest = self.math(rest)?,
                '{' => {
                    let (tail, group) =
                        braced(rest).map_err(|_| LatexError::Unterminated("group".into()))?;
                    let html = self.inline(group)?;
                    self.push_inline(&html);
                    rest = tail;
                }
                '}' => return Err(LatexError::Unexpected("}".into())),
                c if c.is_whitespace() => rest = self.whitespace(rest),
                _ => rest = self.text(rest),
            }
        }
        Ok(())
    }

    fn whitespace<'a>(&mut self, rest: &'a str) -> &'a str {
        let end = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        let run = &rest[..end];
        let newlines = run.matches('\n').count();

        if newlines >= 2 && self.mode == Mode::Block {
            self.close_paragraph();
        } else if (self.in_paragraph || self.mode == Mode::Inline)
            && !self.out.ends_with(' ')
            && !self.out.is_empty()
        {
            self.out.push(' ');
        }
        &rest[end..]
    }

    fn text<'a>(&mut self, rest: &'a str) -> &'a str {
        let end = rest
            .find(|c: char| matches!(c, '\\' | '$' | '{' | '}') || c.is_whitespace())
            .unwrap_or(rest.len());
        let word = ligatures(&rest[..end]);
        self.push_inline(&word);
        &rest[end..]
    }

    fn math<'a>(&mut self, rest: &'a str) -> Result<&'a str> {
        let (delim, style) = if rest.starts_with("$$") {
            ("$$", DisplayStyle::Block)
        } else {
            ("$", DisplayStyle::Inline)
        };
        let body_start = &rest[delim.len()..];
        let end = body_start
            .find(delim)
            .ok_or_else(|| LatexError::Unterminated(format!("math opened with {}", delim)))?;
        let latex = &body_start[..end];
        if group_depth(latex) > MAX_NESTING {
            return Err(LatexError::TooDeep(MAX_NESTING));
        }

        let mathml = latex_to_mathml(latex.trim(), style).map_err(|e| LatexError::Math {
            source_text: latex.trim().to_string(),
            message: e.to_string(),
        })?;
        self.push_inline(&mathml);
        Ok(&body_start[end + delim.len()..])
    }

    fn command<'a>(&mut self, name: &str, rest: &'a str) -> Result<&'a str> {
        let required = |rest: &'a str| {
            argument(rest).map_err(|_| LatexError::Unterminated(format!("\\{} argument", name)))
        };

        match name {
            "section" | "section*" | "subsection" | "subsection*" | "subsubsection"
            | "subsubsection*" => {
                let (rest, title) = required(rest)?;
                self.heading(name, title)?;
                Ok(rest)
            }
            "paragraph" | "paragraph*" => {
                let (rest, title) = required(rest)?;
                self.close_paragraph();
                let html = self.inline(title)?;
                self.push_inline(&format!("<strong class=\"paragraph\">{}</strong> ", html));
                Ok(rest)
            }
            "textbf" | "textit" | "emph" | "texttt" | "underline" | "textsc" | "textsf"
            | "textrm" | "textnormal" | "textup" | "mbox" | "text" => {
                let (rest, arg) = required(rest)?;
                let html = self.inline(arg)?;
                let wrapped = match name {
                    "textbf" => format!("<strong>{}</strong>", html),
                    "textit" | "emph" => format!("<em>{}</em>", html),
                    "texttt" => format!("<code>{}</code>", html),
                    "underline" => format!("<u>{}</u>", html),
                    "textsc" | "textsf" | "textrm" | "textup" => {
                        format!("<span class=\"{}\">{}</span>", name, html)
                    }
                    _ => html,
                };
                self.push_inline(&wrapped);
                Ok(rest)
            }
            "footnote" => {
                let (rest, note) = required(rest)?;
                let html = self.inline(note)?;
                self.footnotes.push(html);
                let n = self.footnotes.len();
                self.push_inline(&format!(
                    "<sup class=\"footnote-mark\"><a href=\"#fn{n}\">{n}</a></sup>",
                    n = n
                ));
                Ok(rest)
            }
            "href" => {
                let (rest, url) = required(rest)?;
                let (rest, label) = required(rest)?;
                let html = self.inline(label)?;
                self.push_inline(&format!("<a href=\"{}\">{}</a>", escape_attr(url), html));
                Ok(rest)
            }
            "url" => {
                let (rest, url) = required(rest)?;
                self.push_inline(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape_attr(url),
                    escape_html(url)
                ));
                Ok(rest)
            }
            "title" | "author" | "date" => {
                let (rest, arg) = required(rest)?;
                self.meta.set(name, arg);
                Ok(rest)
            }
            "maketitle" => {
                self.title_block()?;
                Ok(rest)
            }
            "begin" => {
                let (rest, env) = required(rest)?;
                self.environment(env.trim(), rest)
            }
            "end" => {
                let (_, env) = required(rest)?;
                Err(LatexError::Unexpected(format!("\\end{{{}}}", env)))
            }
            "label" => Ok(required(rest)?.0),
            "par" | "smallskip" | "medskip" | "bigskip" | "newpage" | "clearpage" => {
                self.close_paragraph();
                Ok(rest)
            }
            "noindent" | "centering" | "hfill" | "vfill" | "indent" | "relax" => Ok(rest),
            "\\" | "newline" => {
                // An optional skip length may follow a line break.
                let rest = bracketed(rest).map_or(rest, |(t, _)| t);
                if self.in_paragraph || self.mode == Mode::Inline {
                    self.out.push_str("<br>");
                }
                Ok(rest)
            }
            "LaTeX" => Ok(self.word("LaTeX", rest)),
            "TeX" => Ok(self.word("TeX", rest)),
            "ldots" | "dots" => Ok(self.word("\u{2026}", rest)),
            "%" | "$" | "#" | "_" | "{" | "}" => {
                self.push_inline(name);
                Ok(rest)
            }
            "&" => {
                self.push_inline("&amp;");
                Ok(rest)
            }
            " " => {
                self.push_inline(" ");
                Ok(rest)
            }
            "," => {
                self.push_inline("\u{2009}");
                Ok(rest)
            }
            _ => Err(LatexError::UnknownMacro(name.to_string())),
        }
    }

    /// Emit a no-argument text macro, consuming a trailing empty `{}`.
    fn word<'a>(&mut self, text: &str, rest: &'a str) -> &'a str {
        self.push_inline(text);
        rest.strip_prefix("{}").unwrap_or(rest)
    }

    fn heading(&mut self, name: &str, title: &str) -> Result<()> {
        self.close_paragraph();
        let starred = name.ends_with('*');
        let (level, tag) = match name.trim_end_matches('*') {
            "section" => (0, "h2"),
            "subsection" => (1, "h3"),
            _ => (2, "h4"),
        };
        let html = self.inline(title)?;

        self.out.push_str(&format!("<{} class=\"{}\">", tag, name.trim_end_matches('*')));
        if !starred {
            self.sections[level] += 1;
            for deeper in self.sections.iter_mut().skip(level + 1) {
                *deeper = 0;
            }
            let number: Vec<String> = self.sections[..=level]
                .iter()
                .map(|n| n.to_string())
                .collect();
            self.out.push_str(&format!(
                "<span class=\"section-number\">{}</span> ",
                number.join(".")
            ));
        }
        self.out.push_str(&html);
        self.out.push_str(&format!("</{}>\n", tag));
        Ok(())
    }

    fn title_block(&mut self) -> Result<()> {
        self.close_paragraph();
        let meta = self.meta.clone();
        self.out.push_str("<div class=\"title-block\">\n");
        if let Some(title) = meta.title {
            let html = self.inline(&title)?;
            self.out.push_str(&format!("<h1 class=\"title\">{}</h1>\n", html));
        }
        if let Some(author) = meta.author {
            let html = self.inline(&author)?;
            self.out.push_str(&format!("<div class=\"author\">{}</div>\n", html));
        }
        if let Some(date) = meta.date {
            let html = self.inline(&date)?;
            self.out.push_str(&format!("<div class=\"date\">{}</div>\n", html));
        }
        self.out.push_str("</div>\n");
        Ok(())
    }

    fn environment<'a>(&mut self, env: &str, rest: &'a str) -> Result<&'a str> {
        let (body, after) = environment_body(rest, env)
            .ok_or_else(|| LatexError::Unterminated(format!("environment {}", env)))?;

        match env {
            "itemize" | "enumerate" | "description" => self.list(env, body)?,
            "quote" | "quotation" => {
                self.close_paragraph();
                let html = self.block(body)?;
                self.out.push_str(&format!("<blockquote>\n{}</blockquote>\n", html));
            }
            "center" | "flushleft" | "flushright" | "abstract" => {
                self.close_paragraph();
                let html = self.block(body)?;
                let heading = if env == "abstract" {
                    "<h3 class=\"abstract-title\">Abstract</h3>\n"
                } else {
                    ""
                };
                self.out.push_str(&format!(
                    "<div class=\"{}\">\n{}{}</div>\n",
                    env, heading, html
                ));
            }
            "verbatim" => {
                self.close_paragraph();
                let text = body.strip_prefix('\n').unwrap_or(body);
                self.out.push_str(&format!(
                    "<pre class=\"verbatim\">{}</pre>\n",
                    escape_html(text)
                ));
            }
            _ => return Err(LatexError::UnknownEnvironment(env.to_string())),
        }
        Ok(after)
    }

    fn list(&mut self, env: &str, body: &str) -> Result<()> {
        self.close_paragraph();
        let (open, close) = match env {
            "itemize" => ("<ul>", "</ul>"),
            "enumerate" => ("<ol>", "</ol>"),
            _ => ("<dl>", "</dl>"),
        };
        self.out.push_str(open);
        self.out.push('\n');

        let (lead, items) = split_items(body);
        if !lead.trim().is_empty() {
            return Err(LatexError::Unexpected(format!(
                "text before the first \\item in {}",
                env
            )));
        }

        for item in items {
            let (item, label) = match bracketed(item.trim_start()) {
                Ok((tail, label)) => (tail, Some(label)),
                Err(_) => (item, None),
            };
            let content = self.inline(item)?;
            match (env, label) {
                ("description", label) => {
                    let term = self.inline(label.unwrap_or(""))?;
                    self.out
                        .push_str(&format!("<dt>{}</dt><dd>{}</dd>\n", term, content));
                }
                (_, Some(label)) => {
                    let label = self.inline(label)?;
                    self.out.push_str(&format!(
                        "<li class=\"custom-label\"><span class=\"item-label\">{}</span> {}</li>\n",
                        label, content
                    ));
                }
                (_, None) => self.out.push_str(&format!("<li>{}</li>\n", content)),
            }
        }

        self.out.push_str(close);
        self.out.push('\n');
        Ok(())
    }
}

/// Split a list body at its top-level `\item` commands. The first element is
/// whatever precedes the first item.
fn split_items(body: &str) -> (&str, Vec<&str>) {
    let mut items = Vec::new();
    let mut lead = body;
    let mut depth = 0i32;
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i < body.len() {
        let rest = &body[i..];
        if rest.starts_with("\\begin{") {
            depth += 1;
        } else if rest.starts_with("\\end{") {
            depth -= 1;
        } else if depth == 0
            && rest.starts_with("\\item")
            && !rest["\\item".len()..].starts_with(|c: char| c.is_ascii_alphabetic())
        {
            match start {
                Some(s) => items.push(&body[s..i]),
                None => lead = &body[..i],
            }
            i += "\\item".len();
            start = Some(i);
            continue;
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    if let Some(s) = start {
        items.push(&body[s..]);
    }
    (lead, items)
}

/// Deepest `{`-group nesting in `src`, ignoring escaped braces.
fn group_depth(src: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut escaped = false;
    for c in src.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Replace TeX quote and dash ligatures and escape the text.
fn ligatures(text: &str) -> String {
    escape_html(text)
        .replace("---", "\u{2014}")
        .replace("--", "\u{2013}")
        .replace("``", "\u{201c}")
        .replace("''", "\u{201d}")
        .replace('`', "\u{2018}")
        .replace('\'', "\u{2019}")
        .replace('~', "\u{a0}")
}

fn head_markup(options: &LatexOptions) -> String {
    let mut head = String::new();
    if let Some(ref url) = options.stylesheet_url {
        head.push_str(&format!(
            "<link rel=\"stylesheet\" href=\"{}\" crossorigin=\"anonymous\">\n",
            escape_attr(url)
        ));
    }
    head.push_str("<style>\n");
    head.push_str(ARTICLE_STYLES);
    if options.hyphenate {
        head.push_str(".latex-content p { hyphens: auto; -webkit-hyphens: auto; }\n");
    }
    head.push_str("</style>");
    head
}

const ARTICLE_STYLES: &str = r#".latex-content { font-family: "Latin Modern Roman", "Computer Modern", Georgia, serif; line-height: 1.5; }
.latex-content p { text-align: justify; margin: 0 0 0.8em; }
.latex-content .title-block { text-align: center; margin-bottom: 2em; }
.latex-content .section-number { margin-right: 0.5em; }
.latex-content .center { text-align: center; }
.latex-content .flushright { text-align: right; }
.latex-content .abstract { margin: 1em 3em; font-size: 0.9em; }
.latex-content .textsc { font-variant: small-caps; }
.latex-content .textsf { font-family: sans-serif; }
.latex-content .footnotes { font-size: 0.85em; }
.latex-content li.custom-label { list-style: none; }
.latex-content .item-label { font-weight: bold; margin-right: 0.3em; }
.latex-content math[display="block"] { margin: 0.8em 0; }
"#;
