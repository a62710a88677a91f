//! Line-oriented beagleasset records.
//!
//! ```text
//! v:x,y,z,u,v     vertex position + texture coordinate
//! f:i0,i1,i2      triangle, indices global across the file
//! t:path          diffuse texture of the preceding block
//! ```
//!
//! No header, no length prefixes, no versioning.

use std::{
    fmt,
    io::{self, Write},
};

use thiserror::Error;

/// One line of a beagleasset file.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Vertex { position: [f32; 3], uv: [f32; 2] },
    Face([u32; 3]),
    Texture(String),
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Vertex {
                position: [x, y, z],
                uv: [u, v],
            } => write!(f, "v:{x},{y},{z},{u},{v}"),
            Record::Face([a, b, c]) => write!(f, "f:{a},{b},{c}"),
            Record::Texture(path) => write!(f, "t:{path}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected ':' after record tag '{0}'")]
    MissingSeparator(char),
    #[error("expected {expected} values, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid float '{0}'")]
    InvalidFloat(String),
    #[error("invalid vertex index '{0}'")]
    InvalidIndex(String),
    #[error("texture record has an empty path")]
    EmptyTexturePath,
}

/// A malformed line, with its 1-based line number.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Parse a single line. `line_no` is 1-based and only used for errors.
///
/// Returns `Ok(None)` for blank lines, `#` comments and lines whose tag is
/// not a known record.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Record>, ParseError> {
    let line = line.trim_end();
    let mut chars = line.chars();
    let Some(tag) = chars.next() else {
        return Ok(None);
    };
    let tag = tag.to_ascii_lowercase();
    if !matches!(tag, 'v' | 'f' | 't') {
        return Ok(None);
    }

    let body = chars
        .as_str()
        .strip_prefix(':')
        .ok_or_else(|| ParseError::new(line_no, ParseErrorKind::MissingSeparator(tag)))?;

    let record = match tag {
        'v' => {
            let [x, y, z, u, v] = parse_fields::<f32, 5>(body, line_no, parse_f32)?;
            Record::Vertex {
                position: [x, y, z],
                uv: [u, v],
            }
        }
        'f' => Record::Face(parse_fields::<u32, 3>(body, line_no, parse_index)?),
        _ => {
            if body.trim().is_empty() {
                return Err(ParseError::new(line_no, ParseErrorKind::EmptyTexturePath));
            }
            Record::Texture(body.to_owned())
        }
    };
    Ok(Some(record))
}

fn parse_fields<T, const N: usize>(
    body: &str,
    line_no: usize,
    parse: fn(&str) -> Result<T, ParseErrorKind>,
) -> Result<[T; N], ParseError>
where
    T: Copy + Default,
{
    let found = body.split(',').count();
    if found != N {
        return Err(ParseError::new(
            line_no,
            ParseErrorKind::FieldCount { expected: N, found },
        ));
    }

    let mut out = [T::default(); N];
    for (slot, token) in out.iter_mut().zip(body.split(',')) {
        *slot = parse(token.trim()).map_err(|kind| ParseError::new(line_no, kind))?;
    }
    Ok(out)
}

fn parse_f32(token: &str) -> Result<f32, ParseErrorKind> {
    token
        .parse::<f32>()
        .map_err(|_| ParseErrorKind::InvalidFloat(token.to_owned()))
}

fn parse_index(token: &str) -> Result<u32, ParseErrorKind> {
    token
        .parse::<u32>()
        .map_err(|_| ParseErrorKind::InvalidIndex(token.to_owned()))
}

/// Writes records one per line. Floats use the shortest representation
/// that parses back to the same `f32`.
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_vertex(&mut self, position: [f32; 3], uv: [f32; 2]) -> io::Result<()> {
        self.write_record(&Record::Vertex { position, uv })
    }

    pub fn write_face(&mut self, indices: [u32; 3]) -> io::Result<()> {
        self.write_record(&Record::Face(indices))
    }

    pub fn write_texture(&mut self, path: &str) -> io::Result<()> {
        writeln!(self.inner, "t:{path}")
    }

    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        writeln!(self.inner, "{record}")
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
