//! CSS output sink and serialization context

use std::rc::Rc;

use crate::tree::FileInfo;

/// One emitted CSS chunk, tagged with its source position.
///
/// The tags exist for downstream consumers (source maps, error mapping);
/// plain rendering only concatenates the text.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The emitted text
    pub text: String,
    /// File the chunk originated from, when known
    pub file: Option<Rc<FileInfo>>,
    /// Source index the chunk originated from, when known
    pub index: Option<usize>,
}

/// Append-only sink that `GenCss` implementations write into.
#[derive(Debug, Default)]
pub struct Output {
    chunks: Vec<Chunk>,
}

impl Output {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk with source tagging.
    pub fn add(&mut self, text: impl Into<String>, file: Option<Rc<FileInfo>>, index: Option<usize>) {
        self.chunks.push(Chunk { text: text.into(), file, index });
    }

    /// Append an untagged chunk (separators, indentation, braces).
    pub fn add_str(&mut self, text: impl Into<String>) {
        self.add(text, None, None);
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenate all chunks into the final CSS text.
    pub fn into_string(self) -> String {
        let mut s = String::new();
        for chunk in &self.chunks {
            s.push_str(&chunk.text);
        }
        s
    }
}

/// State threaded top-down through CSS generation.
#[derive(Debug, Clone, Default)]
pub struct CssContext {
    /// Minified output: no indentation, newlines or optional separators
    pub compress: bool,
    /// Current nesting depth, in units of two spaces
    pub tab_level: usize,
    /// Set while emitting the final rule of a block so the trailing
    /// semicolon can be elided in compressed mode
    pub last_rule: bool,
    /// Set while emitting the first selector of a path so no leading
    /// descendant space is produced
    pub first_selector: bool,
}

impl CssContext {
    /// Context for a fresh render with the given density.
    pub fn new(compress: bool) -> Self {
        Self { compress, ..Default::default() }
    }
}

/// Capability for serializing a resolved node to CSS.
pub trait GenCss {
    /// Emit this node as ordered chunks into `output`.
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output);

    /// Convenience: render this node alone and return the text.
    fn to_css_string(&self, ctx: &mut CssContext) -> String {
        let mut out = Output::new();
        self.gen_css(ctx, &mut out);
        out.into_string()
    }
}
