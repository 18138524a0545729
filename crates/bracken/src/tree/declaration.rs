//! Declarations: `property: value;` and `@var: value;`

use crate::output::{CssContext, GenCss, Output};
use crate::tree::{Node, NodeInfo};

/// A declaration name: a plain identifier or interpolated parts that
/// evaluate to one.
#[derive(Debug, Clone)]
pub enum DeclarationName {
    /// Fixed name known at parse time
    Ident(String),
    /// `@{prefix}-width:`-style name, resolved during evaluation
    Interpolated(Vec<Node>),
}

impl DeclarationName {
    /// The fixed name, if already resolved.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            DeclarationName::Ident(s) => Some(s),
            DeclarationName::Interpolated(_) => None,
        }
    }
}

/// Property-merge mode for `property+: v` / `property+_: v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Merge {
    /// No merging
    #[default]
    None,
    /// `+:` merges alternatives with commas
    Comma,
    /// `+_:` merges alternatives with spaces
    Space,
}

/// A single declaration. `variable` declarations never reach the output;
/// they exist for scope lookups only.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Position info
    pub info: NodeInfo,
    /// Left-hand side
    pub name: DeclarationName,
    /// Right-hand side, usually a [`crate::tree::ValueList`]
    pub value: Node,
    /// The important suffix with leading space, e.g. `" !important"`
    pub important: Option<String>,
    /// Merge mode
    pub merge: Merge,
    /// Inline declarations skip the trailing semicolon
    pub inline: bool,
    /// Whether the name starts with `@`
    pub variable: bool,
}

impl Declaration {
    /// Build a declaration; `variable` is inferred from a leading `@`.
    pub fn new(name: DeclarationName, value: Node, important: Option<String>, info: NodeInfo) -> Self {
        let variable = matches!(&name, DeclarationName::Ident(s) if s.starts_with('@'));
        let important = important.map(|s| {
            if s.starts_with(' ') {
                s
            } else {
                format!(" {s}")
            }
        });
        Self {
            info,
            name,
            value,
            important,
            merge: Merge::None,
            inline: false,
            variable,
        }
    }

    /// The declared name when fixed; interpolated names resolve at eval.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ident()
    }

    /// A copy of this declaration carrying `!important`.
    pub fn make_important(&self) -> Declaration {
        let mut copy = self.clone();
        copy.important = Some(" !important".to_string());
        copy
    }
}

impl GenCss for Declaration {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        let name = match &self.name {
            DeclarationName::Ident(s) => s.clone(),
            // Unresolved interpolation only appears pre-eval
            DeclarationName::Interpolated(parts) => {
                let mut s = String::new();
                for part in parts {
                    s.push_str(&part.to_css_string(ctx));
                }
                s
            }
        };
        output.add(name, self.info.file.clone(), Some(self.info.index));
        output.add_str(if ctx.compress { ":" } else { ": " });
        self.value.gen_css(ctx, output);
        if let Some(important) = &self.important {
            output.add_str(important.clone());
        }
        if !self.inline && !(ctx.compress && ctx.last_rule) {
            output.add_str(";");
        }
    }
}
