//! Value-level helpers built on cssparser tokens.

use cssparser::{ParseError, Parser, ParserInput, Token};

type CssParseError<'i> = ParseError<'i, ()>;

/// Kind of a top-level component value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Ident,
    Number,
    Dimension,
    Percentage,
    Hash,
    String,
    Url,
    Function,
    Slash,
    Comma,
    Other,
}

/// A top-level component of a declared value, e.g. `1px`, `solid`,
/// `rgba(0, 0, 0, .5)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part<'a> {
    pub text: &'a str,
    pub kind: PartKind,
}

impl<'a> Part<'a> {
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == PartKind::Ident && self.text.eq_ignore_ascii_case(name)
    }

    pub fn is_any_ident(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.is_ident(n))
    }

    /// Function name without the parenthesis, lowercased.
    pub fn function_name(&self) -> Option<String> {
        if self.kind != PartKind::Function {
            return None;
        }
        self.text
            .split_once('(')
            .map(|(name, _)| name.to_ascii_lowercase())
    }

    /// Lengths, percentages, unitless numbers and math functions.
    pub fn is_length_like(&self) -> bool {
        match self.kind {
            PartKind::Dimension | PartKind::Number | PartKind::Percentage => true,
            PartKind::Function => matches!(
                self.function_name().as_deref(),
                Some("calc" | "min" | "max" | "clamp")
            ),
            _ => false,
        }
    }

    /// `var()` and `env()` cannot be split until substitution.
    pub fn is_substitution(&self) -> bool {
        matches!(self.function_name().as_deref(), Some("var" | "env"))
    }
}

/// Split a value into its top-level components. Blocks and functions stay
/// whole; whitespace and comments separate components.
pub fn split_components(value: &str) -> Vec<Part<'_>> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut parts = Vec::new();

    loop {
        parser.skip_whitespace();
        let start = parser.position();
        let (kind, block) = match parser.next() {
            Ok(token) => classify(token),
            Err(_) => break,
        };
        if block {
            let _ = parser.parse_nested_block(|p| {
                while p.next().is_ok() {}
                Ok::<_, CssParseError>(())
            });
        }
        parts.push(Part {
            text: parser.slice_from(start),
            kind,
        });
    }
    parts
}

fn classify(token: &Token<'_>) -> (PartKind, bool) {
    match token {
        Token::Ident(_) => (PartKind::Ident, false),
        Token::Number { .. } => (PartKind::Number, false),
        Token::Dimension { .. } => (PartKind::Dimension, false),
        Token::Percentage { .. } => (PartKind::Percentage, false),
        Token::Hash(_) | Token::IDHash(_) => (PartKind::Hash, false),
        Token::QuotedString(_) => (PartKind::String, false),
        Token::UnquotedUrl(_) => (PartKind::Url, false),
        Token::Function(name) if name.eq_ignore_ascii_case("url") => (PartKind::Url, true),
        Token::Function(_) => (PartKind::Function, true),
        Token::Delim('/') => (PartKind::Slash, false),
        Token::Comma => (PartKind::Comma, false),
        Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
            (PartKind::Other, true)
        }
        _ => (PartKind::Other, false),
    }
}

/// Split a value on top-level commas (`a, b(c, d)` -> `a`, `b(c, d)`).
pub fn split_commas(value: &str) -> Vec<String> {
    let mut groups = vec![Vec::new()];
    for part in split_components(value) {
        if part.kind == PartKind::Comma {
            groups.push(Vec::new());
        } else if let Some(group) = groups.last_mut() {
            group.push(part.text);
        }
    }
    groups.into_iter().map(|g| g.join(" ")).collect()
}

/// Re-join components with single spaces.
pub fn join_parts(parts: &[Part<'_>]) -> String {
    parts
        .iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `initial`, `inherit`, `unset`, `revert`, `revert-layer`.
pub fn is_css_wide_keyword(value: &str) -> bool {
    ["initial", "inherit", "unset", "revert", "revert-layer"]
        .iter()
        .any(|k| value.trim().eq_ignore_ascii_case(k))
}

/// A number with an optional unit, as written in a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct Numeric {
    pub value: f64,
    /// Lowercased unit; `%` for percentages; `None` for plain numbers.
    pub unit: Option<String>,
}

impl Numeric {
    /// Parse a value consisting of exactly one number, dimension or percentage.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);

        let (token_value, unit) = match parser.next().ok()? {
            Token::Number { value, .. } => (*value, None),
            Token::Percentage { unit_value, .. } => (*unit_value * 100.0, Some("%".to_string())),
            Token::Dimension { value, unit, .. } => (*value, Some(unit.to_ascii_lowercase())),
            _ => return None,
        };
        if !parser.is_exhausted() {
            return None;
        }

        // The token only carries an f32; re-read the leading digits in f64.
        // The unit may be escaped, so its source text can differ from `unit`.
        let value = text[..number_prefix_len(text)]
            .parse::<f64>()
            .unwrap_or(f64::from(token_value));
        Some(Self { value, unit })
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

/// Byte length of the `<number>` at the start of `text`:
/// sign, digits, fraction, exponent.
fn number_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    end = digits_from(end);
    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end = digits_from(end + 1);
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            end = digits_from(exp);
        }
    }
    end
}

/// All `url()` references in a value, in order.
pub fn extract_urls(css: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    extract_urls_recursive(&mut parser, &mut urls);
    urls
}

fn extract_urls_recursive(parser: &mut Parser, urls: &mut Vec<String>) {
    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        match token {
            Token::UnquotedUrl(url) => {
                urls.push(url.to_string());
            }
            Token::Function(name) if name.eq_ignore_ascii_case("url") => {
                let _ = parser.parse_nested_block(|p| {
                    if let Ok(Token::QuotedString(url)) = p.next() {
                        urls.push(url.to_string());
                    }
                    Ok::<_, CssParseError>(())
                });
            }
            Token::Function(_)
            | Token::CurlyBracketBlock
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock => {
                let _ = parser.parse_nested_block(|p| {
                    extract_urls_recursive(p, urls);
                    Ok::<_, CssParseError>(())
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(value: &str) -> Vec<&str> {
        split_components(value).into_iter().map(|p| p.text).collect()
    }

    #[test]
    fn test_split_components() {
        assert_eq!(texts("1px  solid #333"), vec!["1px", "solid", "#333"]);
        assert_eq!(
            texts("rgba(0, 0, 0, .5) url( 'a b.png' ) 10px/1.5"),
            vec!["rgba(0, 0, 0, .5)", "url( 'a b.png' )", "10px", "/", "1.5"]
        );
        assert!(texts("   ").is_empty());
    }

    #[test]
    fn test_part_kinds() {
        let parts = split_components("bold 2em 50% 0 calc(1px + 2px) var(--x) , \"Raleway\"");
        let kinds: Vec<_> = parts.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PartKind::Ident,
                PartKind::Dimension,
                PartKind::Percentage,
                PartKind::Number,
                PartKind::Function,
                PartKind::Function,
                PartKind::Comma,
                PartKind::String,
            ]
        );
        assert!(parts[4].is_length_like());
        assert!(parts[5].is_substitution());
        assert!(parts[0].is_ident("BOLD"));
    }

    #[test]
    fn test_split_commas() {
        assert_eq!(
            split_commas("url(a.png) no-repeat, linear-gradient(red, blue)"),
            vec!["url(a.png) no-repeat", "linear-gradient(red, blue)"]
        );
    }

    #[test]
    fn test_numeric_parse() {
        assert_eq!(
            Numeric::parse(".5rem"),
            Some(Numeric {
                value: 0.5,
                unit: Some("rem".into())
            })
        );
        assert_eq!(
            Numeric::parse(" 100% "),
            Some(Numeric {
                value: 100.0,
                unit: Some("%".into())
            })
        );
        assert_eq!(
            Numeric::parse("-2PX").map(|n| (n.value, n.unit)),
            Some((-2.0, Some("px".into())))
        );
        assert_eq!(Numeric::parse("0").map(|n| n.unit), Some(None));
        assert!(Numeric::parse("1px 2px").is_none());
        assert!(Numeric::parse("auto").is_none());
        assert_eq!(Numeric::parse("1e3px").map(|n| n.value), Some(1000.0));
        assert_eq!(
            Numeric::parse("2em").map(|n| (n.value, n.unit)),
            Some((2.0, Some("em".into())))
        );
    }

    #[test]
    fn test_numeric_escaped_unit() {
        let n = Numeric::parse(r"1\0\0\0").unwrap();
        assert_eq!(n.value, 1.0);
        assert_eq!(n.unit.as_deref(), Some("\u{FFFD}\u{FFFD}\u{FFFD}"));

        let n = Numeric::parse(r"12\70 x").unwrap();
        assert_eq!(n.value, 12.0);
        assert_eq!(n.unit.as_deref(), Some("px"));
    }

    #[test]
    fn test_extract_urls() {
        let urls = extract_urls(r#"url(img/a.png), url("b.jpg") , image-set(url('c.webp') 1x)"#);
        assert_eq!(urls, vec!["img/a.png", "b.jpg", "c.webp"]);
    }

    #[test]
    fn test_css_wide_keywords() {
        assert!(is_css_wide_keyword(" Inherit"));
        assert!(!is_css_wide_keyword("auto"));
    }
}
