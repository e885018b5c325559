//! JSON adapter
//!
//! Patches are spliced into the source text: untouched members keep their
//! exact bytes, new members follow the layout of their siblings (one per
//! line at the sibling indent, or inline after a comma), and new nested
//! values are pretty-printed with the indent unit the file already uses.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::format::{Format, FormatAdapter};
use crate::value::{empty_map, patch_value};

const DEFAULT_INDENT: &str = "  ";

/// Byte spans of a parsed JSON value.
#[derive(Debug)]
enum Span {
    Object {
        start: usize,
        end: usize,
        members: Vec<Member>,
    },
    Array {
        start: usize,
        end: usize,
        items: Vec<Span>,
    },
    Scalar {
        start: usize,
        end: usize,
    },
}

#[derive(Debug)]
struct Member {
    key: String,
    key_start: usize,
    value: Span,
}

impl Span {
    fn start(&self) -> usize {
        match self {
            Span::Object { start, .. } | Span::Array { start, .. } | Span::Scalar { start, .. } => {
                *start
            }
        }
    }

    fn end(&self) -> usize {
        match self {
            Span::Object { end, .. } | Span::Array { end, .. } | Span::Scalar { end, .. } => *end,
        }
    }
}

/// Locates value spans in text already known to be valid JSON.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::parse("JSON", format!("{message} at byte {}", self.pos))
    }

    fn value(&mut self) -> Result<Span> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(b'{') => self.object(),
            Some(b'[') => self.array(),
            Some(b'"') => {
                self.string()?;
                Ok(Span::Scalar { start, end: self.pos })
            }
            Some(_) => {
                while self
                    .peek()
                    .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b',' | b'}' | b']'))
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.error("expected a value"));
                }
                Ok(Span::Scalar { start, end: self.pos })
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn string(&mut self) -> Result<()> {
        self.pos += 1;
        while let Some(byte) = self.peek() {
            self.pos += 1;
            match byte {
                b'\\' => self.pos += 1,
                b'"' => return Ok(()),
                _ => {}
            }
        }
        Err(self.error("unterminated string"))
    }

    fn object(&mut self) -> Result<Span> {
        let start = self.pos;
        self.pos += 1;
        let mut members = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Span::Object { start, end: self.pos, members });
        }

        loop {
            self.skip_whitespace();
            let key_start = self.pos;
            if self.peek() != Some(b'"') {
                return Err(self.error("expected a member name"));
            }
            self.string()?;
            let key: String = serde_json::from_str(&self.src[key_start..self.pos])?;

            self.skip_whitespace();
            if self.peek() != Some(b':') {
                return Err(self.error("expected ':'"));
            }
            self.pos += 1;

            let value = self.value()?;
            members.push(Member { key, key_start, value });

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Span::Object { start, end: self.pos, members });
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn array(&mut self) -> Result<Span> {
        let start = self.pos;
        self.pos += 1;
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Span::Array { start, end: self.pos, items });
        }

        loop {
            items.push(self.value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Span::Array { start, end: self.pos, items });
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }
}

/// Writes a delta into the source, copying every byte it does not change.
struct Splicer<'a> {
    src: &'a str,
    unit: &'a str,
}

impl Splicer<'_> {
    fn render(&self, span: &Span, want: &Value, multiline: bool) -> Result<String> {
        match (span, want) {
            (Span::Object { start, end, members }, Value::Object(map)) => {
                self.object(*start, *end, members, map, multiline)
            }
            (Span::Array { start, end, items }, Value::Array(wants)) => {
                self.array(*start, *end, items, wants, multiline)
            }
            (span, want) => {
                let current: Value = serde_json::from_str(&self.src[span.start()..span.end()])?;
                if current == *want {
                    return Ok(self.src[span.start()..span.end()].to_string());
                }
                let indent = self.line_indent(span.start());
                self.fresh(want, multiline.then_some(indent))
            }
        }
    }

    fn object(
        &self,
        start: usize,
        end: usize,
        members: &[Member],
        want: &Map<String, Value>,
        multiline: bool,
    ) -> Result<String> {
        let Some(last) = members.last() else {
            let indent = multiline.then(|| self.line_indent(start));
            return self.fresh(&Value::Object(want.clone()), indent);
        };
        let inner_multiline = self.src[start..members[0].key_start].contains('\n');

        let mut out = String::new();
        let mut cursor = start;
        for member in members {
            if let Some(value) = want.get(&member.key) {
                out.push_str(&self.src[cursor..member.value.start()]);
                out.push_str(&self.render(&member.value, value, inner_multiline)?);
                cursor = member.value.end();
            }
        }

        let indent = self.line_indent(last.key_start);
        let mut added = Vec::new();
        for (key, value) in want {
            if !members.iter().any(|m| &m.key == key) {
                let value = self.fresh(value, inner_multiline.then_some(indent))?;
                added.push(format!("{}: {value}", serde_json::to_string(key)?));
            }
        }
        self.close(&mut out, cursor, end, &added, inner_multiline.then_some(indent));
        Ok(out)
    }

    fn array(
        &self,
        start: usize,
        end: usize,
        items: &[Span],
        want: &[Value],
        multiline: bool,
    ) -> Result<String> {
        let Some(last) = items.last() else {
            let indent = multiline.then(|| self.line_indent(start));
            return self.fresh(&Value::Array(want.to_vec()), indent);
        };
        let inner_multiline = self.src[start..items[0].start()].contains('\n');

        let mut out = String::new();
        let mut cursor = start;
        for (item, value) in items.iter().zip(want) {
            out.push_str(&self.src[cursor..item.start()]);
            out.push_str(&self.render(item, value, inner_multiline)?);
            cursor = item.end();
        }

        let indent = self.line_indent(last.start());
        let added = want
            .iter()
            .skip(items.len())
            .map(|value| self.fresh(value, inner_multiline.then_some(indent)))
            .collect::<Result<Vec<_>>>()?;
        self.close(&mut out, cursor, end, &added, inner_multiline.then_some(indent));
        Ok(out)
    }

    /// Copy the rest of a non-empty container, placing `added` after its
    /// last element.
    fn close(
        &self,
        out: &mut String,
        cursor: usize,
        end: usize,
        added: &[String],
        indent: Option<&str>,
    ) {
        let tail = self.src[..end - 1].trim_end().len().max(cursor);
        out.push_str(&self.src[cursor..tail]);
        for text in added {
            out.push(',');
            match indent {
                Some(indent) => {
                    out.push('\n');
                    out.push_str(indent);
                }
                None => out.push(' '),
            }
            out.push_str(text);
        }
        out.push_str(&self.src[tail..end]);
    }

    /// Serialize a new value. With an indent, it is pretty-printed so that
    /// its closing bracket lines up with `indent`; without, it is compact.
    fn fresh(&self, value: &Value, indent: Option<&str>) -> Result<String> {
        let Some(indent) = indent else {
            return Ok(serde_json::to_string(value)?);
        };

        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut buffer,
            PrettyFormatter::with_indent(self.unit.as_bytes()),
        );
        value.serialize(&mut serializer)?;
        let text = String::from_utf8(buffer).map_err(|e| Error::serialize("JSON", e.to_string()))?;

        Ok(text
            .lines()
            .enumerate()
            .map(|(index, line)| match index {
                0 => line.to_string(),
                _ => format!("{indent}{line}"),
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn line_indent(&self, pos: usize) -> &str {
        let line_start = self.src[..pos].rfind('\n').map_or(0, |i| i + 1);
        let line = &self.src[line_start..];
        &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
    }
}

/// The leading whitespace of the first indented line, or two spaces.
fn detect_indent(source: &str) -> &str {
    source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start_matches([' ', '\t']).len()])
        .find(|indent| !indent.is_empty())
        .unwrap_or(DEFAULT_INDENT)
}

/// Adapter for JSON files. Key order and the source layout are preserved;
/// new files are pretty-printed with a trailing newline.
#[derive(Debug, Default)]
pub struct JsonAdapter;

impl JsonAdapter {
    pub fn new() -> Self {
        Self
    }

    fn parse(source: &str) -> Result<Value> {
        if source.trim().is_empty() {
            return Ok(empty_map());
        }
        serde_json::from_str(source).map_err(|e| Error::parse("JSON", e.to_string()))
    }
}

impl FormatAdapter for JsonAdapter {
    fn format(&self) -> Format {
        Format::Json
    }

    fn load(&self, source: &str) -> Result<Value> {
        Self::parse(source)
    }

    fn serialize(&self, tree: &Value) -> Result<String> {
        let mut text = serde_json::to_string_pretty(tree)?;
        text.push('\n');
        Ok(text)
    }

    fn patch(&self, source: &str, delta: &Value) -> Result<String> {
        let mut live = Self::parse(source)?;
        patch_value(&mut live, delta);
        if source.trim().is_empty() {
            return self.serialize(&live);
        }

        let root = Scanner::new(source).value()?;
        let splicer = Splicer {
            src: source,
            unit: detect_indent(source),
        };
        let body = splicer.render(&root, delta, true)?;
        let text = format!("{}{body}{}", &source[..root.start()], &source[root.end()..]);

        if serde_json::from_str::<Value>(&text).ok().as_ref() == Some(&live) {
            Ok(text)
        } else {
            tracing::debug!("Spliced JSON patch diverged; re-serializing document");
            self.serialize(&live)
        }
    }
}
