//! Strict CSS stylesheet parsing into ordered rules.
//!
//! Unlike a browser, the parser does not recover: the first malformed rule
//! or declaration aborts with [`Error::Parse`] carrying its source position.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, ParseErrorKind, Parser, ParserInput,
    ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, SourceLocation,
    StyleSheetParser, Token,
};
use serde::Serialize;

use super::selector::{
    CompiledSelector, describe_error, has_dynamic_state, parse_selector_list, serialize,
};
use crate::error::{Error, Result};

/// A parsed stylesheet: rules in source order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

/// One rule of a stylesheet.
#[derive(Debug, Clone, Serialize)]
pub struct StyleRule {
    /// Serialized selectors, one per comma-separated item. Empty for at-rules.
    pub selectors: Vec<String>,
    #[serde(skip)]
    pub(crate) compiled: Vec<CompiledSelector>,
    pub declarations: Vec<Declaration>,
    pub kind: RuleKind,
    /// Enclosing conditional at-rule, e.g. `@media (max-width: 600px)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub position: SourcePosition,
    /// Position of the rule within its stylesheet.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleKind {
    Plain,
    /// At least one selector depends on a dynamic pseudo-class.
    PseudoState,
    AtRule { name: String, prelude: String },
}

/// 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl From<SourceLocation> for SourcePosition {
    fn from(loc: SourceLocation) -> Self {
        Self {
            line: loc.line + 1,
            column: loc.column,
        }
    }
}

/// A property declaration as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
    pub position: SourcePosition,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: normalize_property(&property.into()),
            value: value.into().trim().to_string(),
            important: false,
            position: SourcePosition::default(),
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
}

fn normalize_property(name: &str) -> String {
    if name.starts_with("--") {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

impl StyleRule {
    /// Selector texts joined the way authors write lists (`a, b`).
    pub fn selector_text(&self) -> String {
        self.selectors.join(", ")
    }

    pub fn is_at_rule(&self) -> bool {
        matches!(self.kind, RuleKind::AtRule { .. })
    }

    /// Name of the at-rule, lowercased, without `@`.
    pub fn at_rule_name(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::AtRule { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the rule takes part in static cascade resolution.
    ///
    /// Pseudo-state rules do: their dynamic selectors never match, but any
    /// static selector in the same list still applies.
    pub fn is_static(&self) -> bool {
        !self.is_at_rule() && self.condition.is_none()
    }

    /// Target of an `@import` rule (`url(x)` or `"x"`).
    pub fn import_href(&self) -> Option<String> {
        let RuleKind::AtRule { name, prelude } = &self.kind else {
            return None;
        };
        if name != "import" {
            return None;
        }
        let mut input = ParserInput::new(prelude);
        let mut parser = Parser::new(&mut input);
        parser
            .expect_url_or_string()
            .ok()
            .map(|href| href.as_ref().to_string())
    }

    pub(crate) fn compiled_selectors(&self) -> &[CompiledSelector] {
        &self.compiled
    }
}

impl Stylesheet {
    /// Parse a stylesheet.
    pub fn parse(css: &str) -> Result<Self> {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        let mut rule_parser = TopLevelRuleParser {
            rules: &mut rules,
            condition: None,
        };
        for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
            if let Err((err, slice)) = result {
                return Err(convert_error(err, slice));
            }
        }

        tracing::debug!(rules = rules.len(), "parsed stylesheet");
        Ok(Self { rules })
    }

    /// Parse the body of a `style` attribute.
    pub fn parse_inline(style: &str) -> Result<Vec<Declaration>> {
        let mut input = ParserInput::new(style);
        let mut parser = Parser::new(&mut input);
        let mut declarations = Vec::new();

        let mut decl_parser = DeclarationListParser {
            declarations: &mut declarations,
        };
        for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
            if let Err((err, slice)) = result {
                return Err(convert_error(err, slice));
            }
        }
        Ok(declarations)
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `@import` targets in source order.
    pub fn imports(&self) -> impl Iterator<Item = String> + '_ {
        self.rules.iter().filter_map(StyleRule::import_href)
    }
}

#[derive(Debug, thiserror::Error)]
enum RuleError {
    #[error("{reason} in selector `{text}`")]
    Selector {
        text: String,
        unsupported: bool,
        reason: String,
    },
    #[error("empty value for `{0}`")]
    EmptyValue(String),
    #[error("`!important` must end the value of `{0}`")]
    MisplacedImportant(String),
    #[error("unexpected @{0} rule inside a declaration block")]
    NestedAtRule(String),
}

fn convert_error(err: ParseError<'_, RuleError>, slice: &str) -> Error {
    let location = err.location;
    match err.kind {
        ParseErrorKind::Custom(RuleError::Selector {
            text,
            unsupported: true,
            reason,
        }) => Error::UnsupportedSelector {
            selector: text,
            reason,
        },
        ParseErrorKind::Custom(custom) => Error::parse_at(location, custom.to_string()),
        ParseErrorKind::Basic(kind) => {
            let snippet: String = slice.trim().chars().take(40).collect();
            let message = if snippet.is_empty() {
                kind.to_string()
            } else {
                format!("{kind} near `{snippet}`")
            };
            Error::parse_at(location, message)
        }
    }
}

/// Parser for rules at the top level or inside a conditional group.
struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<StyleRule>,
    condition: Option<String>,
}

impl TopLevelRuleParser<'_> {
    fn push(
        &mut self,
        selectors: Vec<String>,
        compiled: Vec<CompiledSelector>,
        declarations: Vec<Declaration>,
        kind: RuleKind,
        position: SourcePosition,
    ) {
        let index = self.rules.len();
        tracing::trace!(index, ?kind, declarations = declarations.len(), "rule");
        self.rules.push(StyleRule {
            selectors,
            compiled,
            declarations,
            kind,
            condition: self.condition.clone(),
            position,
            index,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtRuleBody {
    /// Statement at-rule, no block.
    Statement,
    /// Block of declarations (`@font-face`, `@page`).
    Declarations,
    /// Block of nested rules under a condition.
    Conditional,
    /// Block kept opaque (`@keyframes`).
    Opaque,
}

struct AtPrelude {
    name: String,
    prelude: String,
    body: AtRuleBody,
}

fn classify_at_rule(name: &str) -> AtRuleBody {
    match name {
        "import" | "charset" | "namespace" => AtRuleBody::Statement,
        "font-face" | "page" | "counter-style" | "property" | "font-palette-values" => {
            AtRuleBody::Declarations
        }
        "media" | "supports" | "container" => AtRuleBody::Conditional,
        _ => AtRuleBody::Opaque,
    }
}

fn consume_rest<'i>(input: &mut Parser<'i, '_>) {
    while input.next().is_ok() {}
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = AtPrelude;
    type AtRule = ();
    type Error = RuleError;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position();
        consume_rest(input);
        let name = name.to_ascii_lowercase();
        Ok(AtPrelude {
            body: classify_at_rule(&name),
            prelude: input.slice_from(start).trim().to_string(),
            name,
        })
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
    ) -> std::result::Result<Self::AtRule, ()> {
        // @layer a, b; is the statement form of a block at-rule
        if prelude.body != AtRuleBody::Statement && prelude.name != "layer" {
            return Err(());
        }
        let kind = RuleKind::AtRule {
            name: prelude.name,
            prelude: prelude.prelude,
        };
        self.push(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            kind,
            start.source_location().into(),
        );
        Ok(())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let position = start.source_location().into();
        let AtPrelude {
            name,
            prelude,
            body,
        } = prelude;

        match body {
            AtRuleBody::Declarations => {
                let declarations = parse_declaration_block(input)?;
                self.push(
                    Vec::new(),
                    Vec::new(),
                    declarations,
                    RuleKind::AtRule { name, prelude },
                    position,
                );
            }
            AtRuleBody::Conditional => {
                let condition = match &self.condition {
                    Some(outer) => format!("{outer} @{name} {prelude}"),
                    None => format!("@{name} {prelude}"),
                };
                self.push(
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    RuleKind::AtRule { name, prelude },
                    position,
                );
                let mut nested = TopLevelRuleParser {
                    rules: &mut *self.rules,
                    condition: Some(condition),
                };
                for result in StyleSheetParser::new(input, &mut nested) {
                    result.map_err(|(err, _)| err)?;
                }
            }
            AtRuleBody::Statement | AtRuleBody::Opaque => {
                consume_rest(input);
                self.push(
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    RuleKind::AtRule { name, prelude },
                    position,
                );
            }
        }
        Ok(())
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = (Vec<String>, Vec<CompiledSelector>);
    type QualifiedRule = ();
    type Error = RuleError;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position();
        match parse_selector_list(input) {
            Ok(compiled) => {
                let texts = compiled.iter().map(serialize).collect();
                Ok((texts, compiled))
            }
            Err(err) => {
                let location = err.location;
                let (unsupported, reason) = describe_error(&err);
                consume_rest(input);
                let text = input.slice_from(start).trim().to_string();
                Err(location.new_custom_error(RuleError::Selector {
                    text,
                    unsupported,
                    reason,
                }))
            }
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let (selectors, compiled) = prelude;
        let declarations = parse_declaration_block(input)?;
        let kind = if compiled.iter().any(has_dynamic_state) {
            RuleKind::PseudoState
        } else {
            RuleKind::Plain
        };
        self.push(
            selectors,
            compiled,
            declarations,
            kind,
            start.source_location().into(),
        );
        Ok(())
    }
}

fn parse_declaration_block<'i>(
    input: &mut Parser<'i, '_>,
) -> std::result::Result<Vec<Declaration>, ParseError<'i, RuleError>> {
    let mut declarations = Vec::new();
    let mut decl_parser = DeclarationListParser {
        declarations: &mut declarations,
    };
    for result in RuleBodyParser::new(input, &mut decl_parser) {
        result.map_err(|(err, _)| err)?;
    }
    Ok(declarations)
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = RuleError;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(RuleError::NestedAtRule(name.to_string())))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = RuleError;
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = RuleError;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        start: &ParserState,
    ) -> std::result::Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let property = normalize_property(&name);
        let value_start = input.position();
        let mut value_end = value_start;
        let mut important = false;

        while !input.is_exhausted() {
            if input.try_parse(cssparser::parse_important).is_ok() {
                if !input.is_exhausted() {
                    return Err(input.new_custom_error(RuleError::MisplacedImportant(property)));
                }
                important = true;
                break;
            }
            consume_component_value(input)?;
            value_end = input.position();
        }

        let value = input.slice(value_start..value_end).trim().to_string();
        if value.is_empty() && !property.starts_with("--") {
            return Err(start
                .source_location()
                .new_custom_error(RuleError::EmptyValue(property)));
        }

        tracing::trace!(%property, %value, important, "declaration");
        self.declarations.push(Declaration {
            property,
            value,
            important,
            position: start.source_location().into(),
        });
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), RuleError> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Consume one component value, descending into blocks so the parser
/// position lands after the closing bracket.
fn consume_component_value<'i>(
    input: &mut Parser<'i, '_>,
) -> std::result::Result<(), ParseError<'i, RuleError>> {
    let token = input.next_including_whitespace_and_comments()?.clone();
    match token {
        Token::Function(_)
        | Token::ParenthesisBlock
        | Token::SquareBracketBlock
        | Token::CurlyBracketBlock => input.parse_nested_block(|nested| {
            while !nested.is_exhausted() {
                consume_component_value(nested)?;
            }
            Ok(())
        }),
        Token::BadString(_)
        | Token::BadUrl(_)
        | Token::CloseParenthesis
        | Token::CloseSquareBracket
        | Token::CloseCurlyBracket => Err(input.new_unexpected_token_error(token)),
        _ => Ok(()),
    }
}
