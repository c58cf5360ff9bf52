use serde::Serialize;

/// A manifest line that starts with a package name.
///
/// `trailing` holds everything after the name and the optional constraint,
/// verbatim, including extras, markers, inline comments and the line
/// terminator (or several, for continuation lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement<'a> {
    pub name: &'a str,
    pub operator: Option<&'a str>,
    pub version: Option<&'a str>,
    pub trailing: &'a str,
}

impl Requirement<'_> {
    /// The constraint as written, e.g. `>=1.0`. `None` for a bare name.
    pub fn constraint(&self) -> Option<String> {
        match (self.operator, self.version) {
            (None, None) => None,
            (op, ver) => Some(format!("{}{}", op.unwrap_or(""), ver.unwrap_or(""))),
        }
    }
}

/// Classification of one raw manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    Requirement(Requirement<'a>),
    PassThrough(&'a str),
}

impl<'a> ParsedLine<'a> {
    pub fn requirement(&self) -> Option<&Requirement<'a>> {
        match self {
            ParsedLine::Requirement(req) => Some(req),
            ParsedLine::PassThrough(_) => None,
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_name_char(c: char) -> bool {
    is_word(c) || c == '.' || c == '-'
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '~' | '!')
}

/// Split off the longest prefix of `s` whose chars satisfy `pred`.
fn take_while(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse one manifest line.
///
/// Grammar: `name [operator [version]] trailing`, anchored at the start of the
/// line. The name must begin with a word character, so blank lines, `#`
/// comments and option lines such as `-r other.txt` or `--index-url ...` pass
/// through. Trailing content is taken as-is and may span embedded newlines.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    if !line.starts_with(is_word) {
        return ParsedLine::PassThrough(line);
    }

    let (name, rest) = take_while(line, is_name_char);
    let (operator, rest) = take_while(rest, is_operator_char);
    let (version, trailing) = take_while(rest, is_name_char);

    ParsedLine::Requirement(Requirement {
        name,
        operator: (!operator.is_empty()).then_some(operator),
        version: (!version.is_empty()).then_some(version),
        trailing,
    })
}
