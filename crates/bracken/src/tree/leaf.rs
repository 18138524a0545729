//! Leaf value nodes: verbatim text, keywords, strings, numbers, comments

use crate::output::{CssContext, GenCss, Output};
use crate::tree::NodeInfo;

/// Verbatim text that serializes exactly as written.
#[derive(Debug, Clone)]
pub struct Anonymous {
    /// Position info
    pub info: NodeInfo,
    /// The text
    pub value: String,
}

impl Anonymous {
    /// Wrap raw text.
    pub fn new(value: impl Into<String>, info: NodeInfo) -> Self {
        Self { info, value: value.into() }
    }
}

impl GenCss for Anonymous {
    fn gen_css(&self, _ctx: &mut CssContext, output: &mut Output) {
        output.add(self.value.clone(), self.info.file.clone(), Some(self.info.index));
    }
}

/// A bare identifier value such as `red` or `solid`.
#[derive(Debug, Clone)]
pub struct Keyword {
    /// Position info
    pub info: NodeInfo,
    /// The identifier
    pub value: String,
}

impl Keyword {
    /// Wrap an identifier.
    pub fn new(value: impl Into<String>, info: NodeInfo) -> Self {
        Self { info, value: value.into() }
    }

    /// The boolean keywords used as evaluated guard results.
    pub fn bool(value: bool) -> Self {
        Self::new(if value { "true" } else { "false" }, NodeInfo::none())
    }
}

impl GenCss for Keyword {
    fn gen_css(&self, _ctx: &mut CssContext, output: &mut Output) {
        output.add(self.value.clone(), self.info.file.clone(), Some(self.info.index));
    }
}

/// A quoted string; `escaped` strings drop their quotes on output.
#[derive(Debug, Clone)]
pub struct Quoted {
    /// Position info
    pub info: NodeInfo,
    /// The quote character, if any survives to output
    pub quote: Option<char>,
    /// String contents, possibly containing `@{name}` interpolation
    pub value: String,
    /// `~"..."` strings serialize without quotes
    pub escaped: bool,
}

impl Quoted {
    /// Wrap string contents with an explicit quote character.
    pub fn new(quote: Option<char>, value: impl Into<String>, escaped: bool, info: NodeInfo) -> Self {
        Self { info, quote, value: value.into(), escaped }
    }

    /// Whether the contents still carry `@{...}` interpolation.
    pub fn contains_interpolation(&self) -> bool {
        self.value.contains("@{")
    }
}

impl GenCss for Quoted {
    fn gen_css(&self, _ctx: &mut CssContext, output: &mut Output) {
        if self.escaped {
            output.add(self.value.clone(), self.info.file.clone(), Some(self.info.index));
        } else {
            let quote = self.quote.unwrap_or('"');
            output.add(
                format!("{quote}{}{quote}", self.value),
                self.info.file.clone(),
                Some(self.info.index),
            );
        }
    }
}

/// A number with an optional unit.
#[derive(Debug, Clone)]
pub struct Dimension {
    /// Position info
    pub info: NodeInfo,
    /// Numeric value
    pub value: f64,
    /// Unit suffix, empty for plain numbers
    pub unit: String,
}

impl Dimension {
    /// Build a number-with-unit.
    pub fn new(value: f64, unit: impl Into<String>, info: NodeInfo) -> Self {
        Self { info, value, unit: unit.into() }
    }

    /// A unitless number.
    pub fn number(value: f64) -> Self {
        Self::new(value, "", NodeInfo::none())
    }

    /// Format the numeric part the way CSS expects: no exponent, trailing
    /// zeros trimmed, at most eight decimal places.
    pub fn format_value(&self, compress: bool) -> String {
        let rounded = (self.value * 1e8).round() / 1e8;
        let mut s = format!("{rounded:.8}");
        if s.contains('.') {
            while s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.pop();
            }
        }
        if compress {
            // 0.5 -> .5
            if let Some(stripped) = s.strip_prefix("0.") {
                s = format!(".{stripped}");
            } else if let Some(stripped) = s.strip_prefix("-0.") {
                s = format!("-.{stripped}");
            }
        }
        s
    }
}

impl GenCss for Dimension {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        output.add(
            format!("{}{}", self.format_value(ctx.compress), self.unit),
            self.info.file.clone(),
            Some(self.info.index),
        );
    }
}

/// A source comment.
#[derive(Debug, Clone)]
pub struct Comment {
    /// Position info
    pub info: NodeInfo,
    /// Comment text including delimiters
    pub text: String,
    /// `// ...` comments never reach the output
    pub is_line_comment: bool,
}

impl Comment {
    /// Wrap comment text.
    pub fn new(text: impl Into<String>, is_line_comment: bool, info: NodeInfo) -> Self {
        Self { info, text: text.into(), is_line_comment }
    }

    /// Whether the comment is dropped from output in the given mode.
    pub fn is_silent(&self, compress: bool) -> bool {
        let important = self.text.starts_with("/*!");
        self.is_line_comment || (compress && !important)
    }
}

impl GenCss for Comment {
    fn gen_css(&self, _ctx: &mut CssContext, output: &mut Output) {
        output.add(self.text.clone(), self.info.file.clone(), Some(self.info.index));
    }
}
