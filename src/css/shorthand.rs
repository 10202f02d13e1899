//! Shorthand to longhand expansion.
//!
//! Expansion is purely textual: components are classified well enough to
//! route them to the right longhand, and omitted components reset to their
//! initial values. A value that does not fit the shorthand grammar is left
//! alone so the caller can keep it under the shorthand name.

use std::collections::BTreeMap;

use super::values::{
    Part, PartKind, is_css_wide_keyword, join_parts, split_commas, split_components,
};

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];
const BORDER_WIDTHS: &[&str] = &["thin", "medium", "thick"];
const POSITION_KEYWORDS: &[&str] = &["left", "right", "top", "bottom", "center"];
const REPEAT_KEYWORDS: &[&str] = &["repeat", "repeat-x", "repeat-y", "no-repeat", "space", "round"];
const ATTACHMENT_KEYWORDS: &[&str] = &["scroll", "fixed", "local"];
const BOX_KEYWORDS: &[&str] = &["border-box", "padding-box", "content-box"];
const IMAGE_FUNCTIONS: &[&str] = &["image-set", "cross-fade", "element", "image"];
const FONT_STRETCHES: &[&str] = &[
    "ultra-condensed",
    "extra-condensed",
    "condensed",
    "semi-condensed",
    "semi-expanded",
    "expanded",
    "extra-expanded",
    "ultra-expanded",
];
const FONT_SIZES: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large",
    "larger", "smaller",
];
const SYSTEM_FONTS: &[&str] = &[
    "caption",
    "icon",
    "menu",
    "message-box",
    "small-caption",
    "status-bar",
];
const DECORATION_LINES: &[&str] = &["none", "underline", "overline", "line-through", "blink"];
const DECORATION_STYLES: &[&str] = &["solid", "double", "dotted", "dashed", "wavy"];

/// Longhands set by a shorthand, in canonical order.
pub fn longhands_of(property: &str) -> Option<&'static [&'static str]> {
    let longhands: &'static [&'static str] = match property {
        "margin" => &["margin-top", "margin-right", "margin-bottom", "margin-left"],
        "padding" => &["padding-top", "padding-right", "padding-bottom", "padding-left"],
        "inset" => &["top", "right", "bottom", "left"],
        "border-width" => &[
            "border-top-width",
            "border-right-width",
            "border-bottom-width",
            "border-left-width",
        ],
        "border-style" => &[
            "border-top-style",
            "border-right-style",
            "border-bottom-style",
            "border-left-style",
        ],
        "border-color" => &[
            "border-top-color",
            "border-right-color",
            "border-bottom-color",
            "border-left-color",
        ],
        "border-radius" => &[
            "border-top-left-radius",
            "border-top-right-radius",
            "border-bottom-right-radius",
            "border-bottom-left-radius",
        ],
        "border-top" => &["border-top-width", "border-top-style", "border-top-color"],
        "border-right" => &["border-right-width", "border-right-style", "border-right-color"],
        "border-bottom" => &[
            "border-bottom-width",
            "border-bottom-style",
            "border-bottom-color",
        ],
        "border-left" => &["border-left-width", "border-left-style", "border-left-color"],
        "border" => &[
            "border-top-width",
            "border-top-style",
            "border-top-color",
            "border-right-width",
            "border-right-style",
            "border-right-color",
            "border-bottom-width",
            "border-bottom-style",
            "border-bottom-color",
            "border-left-width",
            "border-left-style",
            "border-left-color",
        ],
        "outline" => &["outline-width", "outline-style", "outline-color"],
        "background" => &[
            "background-color",
            "background-image",
            "background-repeat",
            "background-attachment",
            "background-position",
            "background-size",
            "background-origin",
            "background-clip",
        ],
        "font" => &[
            "font-style",
            "font-variant",
            "font-weight",
            "font-stretch",
            "font-size",
            "line-height",
            "font-family",
        ],
        "flex" => &["flex-grow", "flex-shrink", "flex-basis"],
        "flex-flow" => &["flex-direction", "flex-wrap"],
        "gap" => &["row-gap", "column-gap"],
        "list-style" => &["list-style-type", "list-style-position", "list-style-image"],
        "overflow" => &["overflow-x", "overflow-y"],
        "text-decoration" => &[
            "text-decoration-line",
            "text-decoration-style",
            "text-decoration-color",
            "text-decoration-thickness",
        ],
        _ => return None,
    };
    Some(longhands)
}

/// Expand one declaration into longhands.
///
/// Returns `None` when the property is not a known shorthand or the value
/// does not fit its grammar (including values using `var()`).
pub fn expand_declaration(property: &str, value: &str) -> Option<Vec<(&'static str, String)>> {
    let property = property.to_ascii_lowercase();
    let longhands = longhands_of(&property)?;

    if is_css_wide_keyword(value) {
        let keyword = value.trim().to_ascii_lowercase();
        return Some(longhands.iter().map(|l| (*l, keyword.clone())).collect());
    }

    let parts = split_components(value);
    if parts.is_empty() || parts.iter().any(Part::is_substitution) {
        return None;
    }

    let values = match property.as_str() {
        "margin" | "padding" | "inset" | "border-width" | "border-style" | "border-color" => {
            expand_box(&parts)?
        }
        "border-radius" => expand_radius(&parts)?,
        "border-top" | "border-right" | "border-bottom" | "border-left" | "outline" => {
            expand_border_side(&parts)?
        }
        "border" => {
            let side = expand_border_side(&parts)?;
            side.iter().cycle().take(12).cloned().collect()
        }
        "background" => expand_background(value)?,
        "font" => expand_font(value, &parts)?,
        "flex" => expand_flex(&parts)?,
        "flex-flow" => expand_flex_flow(&parts)?,
        "gap" | "overflow" => expand_pair(&parts)?,
        "list-style" => expand_list_style(&parts)?,
        "text-decoration" => expand_text_decoration(&parts)?,
        _ => return None,
    };

    if values.len() != longhands.len() {
        return None;
    }
    Some(longhands.iter().copied().zip(values).collect())
}

/// Expand an ordered list of declarations; later declarations win at
/// longhand granularity. Unknown or unexpandable properties pass through.
pub fn expand<'a, I>(declarations: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = BTreeMap::new();
    for (property, value) in declarations {
        match expand_declaration(property, value) {
            Some(longhands) => {
                for (name, v) in longhands {
                    out.insert(name.to_string(), v);
                }
            }
            None => {
                out.insert(property.to_ascii_lowercase(), value.trim().to_string());
            }
        }
    }
    out
}

/// Compose the shortest shorthand value from its longhands.
///
/// Only shorthands whose serialization is unambiguous are composed; the
/// rest return `None`.
pub fn collapse<'a>(shorthand: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> Option<String> {
    let longhands = longhands_of(shorthand)?;
    let values = longhands
        .iter()
        .map(|l| lookup(l))
        .collect::<Option<Vec<_>>>()?;

    match shorthand {
        "margin" | "padding" | "inset" | "border-width" | "border-style" | "border-color" => {
            Some(collapse_box(&values))
        }
        "border-radius" if values.iter().all(|v| !v.contains(char::is_whitespace)) => {
            Some(collapse_box(&values))
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" | "outline" => {
            Some(collapse_border_side(&values))
        }
        "border" => {
            let sides: Vec<_> = values.chunks(3).collect();
            if sides.windows(2).all(|w| w[0] == w[1]) {
                Some(collapse_border_side(sides[0]))
            } else {
                None
            }
        }
        "gap" | "overflow" => Some(if values[0] == values[1] {
            values[0].to_string()
        } else {
            format!("{} {}", values[0], values[1])
        }),
        "flex" | "flex-flow" => Some(values.join(" ")),
        _ => None,
    }
}

fn collapse_box(values: &[&str]) -> String {
    let (t, r, b, l) = (values[0], values[1], values[2], values[3]);
    if r == l {
        if t == b {
            if t == r {
                t.to_string()
            } else {
                format!("{t} {r}")
            }
        } else {
            format!("{t} {r} {b}")
        }
    } else {
        format!("{t} {r} {b} {l}")
    }
}

fn collapse_border_side(values: &[&str]) -> String {
    let kept: Vec<&str> = values
        .iter()
        .zip(["medium", "none", "currentcolor"])
        .filter(|(v, initial)| !v.eq_ignore_ascii_case(initial))
        .map(|(v, _)| *v)
        .collect();
    if kept.is_empty() {
        "none".to_string()
    } else {
        kept.join(" ")
    }
}

/// Expand 1-4 values to (top, right, bottom, left) following CSS shorthand rules.
pub(crate) fn expand_shorthand_4<T: Copy>(values: Vec<T>) -> Option<(T, T, T, T)> {
    match values.len() {
        1 => {
            let v = values[0];
            Some((v, v, v, v))
        }
        2 => {
            let (tb, lr) = (values[0], values[1]);
            Some((tb, lr, tb, lr))
        }
        3 => {
            let (t, lr, b) = (values[0], values[1], values[2]);
            Some((t, lr, b, lr))
        }
        4 => Some((values[0], values[1], values[2], values[3])),
        _ => None,
    }
}

fn box_values<'a>(parts: &[Part<'a>]) -> Option<(&'a str, &'a str, &'a str, &'a str)> {
    if parts
        .iter()
        .any(|p| matches!(p.kind, PartKind::Comma | PartKind::Slash))
    {
        return None;
    }
    expand_shorthand_4(parts.iter().map(|p| p.text).collect())
}

fn expand_box(parts: &[Part<'_>]) -> Option<Vec<String>> {
    let (t, r, b, l) = box_values(parts)?;
    Some(vec![t.into(), r.into(), b.into(), l.into()])
}

fn expand_radius(parts: &[Part<'_>]) -> Option<Vec<String>> {
    let (horizontal, vertical) = match parts.iter().position(|p| p.kind == PartKind::Slash) {
        Some(slash) => (&parts[..slash], Some(&parts[slash + 1..])),
        None => (parts, None),
    };
    let h = box_values(horizontal)?;
    let h = [h.0, h.1, h.2, h.3];
    let v = match vertical {
        Some(vertical) => {
            let v = box_values(vertical)?;
            Some([v.0, v.1, v.2, v.3])
        }
        None => None,
    };

    Some(
        (0..4)
            .map(|i| match v {
                Some(v) if v[i] != h[i] => format!("{} {}", h[i], v[i]),
                _ => h[i].to_string(),
            })
            .collect(),
    )
}

/// `0`, dimensions and math functions.
fn is_length(part: &Part<'_>) -> bool {
    match part.kind {
        PartKind::Number => part.text.parse::<f64>().is_ok_and(|n| n == 0.0),
        PartKind::Percentage => false,
        _ => part.is_length_like(),
    }
}

fn is_color_candidate(part: &Part<'_>) -> bool {
    matches!(
        part.kind,
        PartKind::Ident | PartKind::Hash | PartKind::Function
    )
}

fn set_once(slot: &mut Option<String>, text: &str) -> Option<()> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(text.to_string());
    Some(())
}

fn expand_border_side(parts: &[Part<'_>]) -> Option<Vec<String>> {
    if parts.len() > 3 {
        return None;
    }
    let (mut width, mut style, mut color) = (None, None, None);
    for part in parts {
        let slot = if is_length(part) || part.is_any_ident(BORDER_WIDTHS) {
            &mut width
        } else if part.is_any_ident(BORDER_STYLES) {
            &mut style
        } else if is_color_candidate(part) {
            &mut color
        } else {
            return None;
        };
        set_once(slot, part.text)?;
    }
    Some(vec![
        width.unwrap_or_else(|| "medium".into()),
        style.unwrap_or_else(|| "none".into()),
        color.unwrap_or_else(|| "currentcolor".into()),
    ])
}

#[derive(Debug, Default)]
struct BackgroundLayer {
    color: Option<String>,
    image: Option<String>,
    repeat: Option<String>,
    attachment: Option<String>,
    position: Option<String>,
    size: Option<String>,
    origin: Option<String>,
    clip: Option<String>,
}

fn is_image(part: &Part<'_>) -> bool {
    part.kind == PartKind::Url
        || part.is_ident("none")
        || part.function_name().is_some_and(|name| {
            name.ends_with("gradient") || IMAGE_FUNCTIONS.contains(&name.as_str())
        })
}

fn is_position(part: &Part<'_>) -> bool {
    part.is_length_like() || part.is_any_ident(POSITION_KEYWORDS)
}

fn is_size(part: &Part<'_>) -> bool {
    part.is_length_like() || part.is_any_ident(&["auto", "cover", "contain"])
}

fn parse_background_layer(layer: &str) -> Option<BackgroundLayer> {
    let parts = split_components(layer);
    let mut out = BackgroundLayer::default();
    let mut i = 0;

    while i < parts.len() {
        let part = &parts[i];
        if is_image(part) && out.image.is_none() {
            out.image = Some(part.text.to_string());
            i += 1;
        } else if part.is_any_ident(&["repeat-x", "repeat-y"]) {
            set_once(&mut out.repeat, part.text)?;
            i += 1;
        } else if part.is_any_ident(REPEAT_KEYWORDS) {
            // two-value form: horizontal then vertical
            let start = i;
            while i < parts.len()
                && i - start < 2
                && parts[i].is_any_ident(&["repeat", "no-repeat", "space", "round"])
            {
                i += 1;
            }
            set_once(&mut out.repeat, &join_parts(&parts[start..i]))?;
        } else if part.is_any_ident(ATTACHMENT_KEYWORDS) {
            set_once(&mut out.attachment, part.text)?;
            i += 1;
        } else if part.is_any_ident(BOX_KEYWORDS) {
            if out.origin.is_none() {
                out.origin = Some(part.text.to_string());
            } else {
                set_once(&mut out.clip, part.text)?;
            }
            i += 1;
        } else if is_position(part) {
            let start = i;
            while i < parts.len() && is_position(&parts[i]) {
                i += 1;
            }
            set_once(&mut out.position, &join_parts(&parts[start..i]))?;
            if parts.get(i).is_some_and(|p| p.kind == PartKind::Slash) {
                i += 1;
                let size_start = i;
                while i < parts.len() && i - size_start < 2 && is_size(&parts[i]) {
                    i += 1;
                }
                if i == size_start {
                    return None;
                }
                out.size = Some(join_parts(&parts[size_start..i]));
            }
        } else if is_color_candidate(part) {
            set_once(&mut out.color, part.text)?;
            i += 1;
        } else {
            return None;
        }
    }

    if out.clip.is_none() {
        out.clip = out.origin.clone();
    }
    Some(out)
}

fn expand_background(value: &str) -> Option<Vec<String>> {
    let layers = split_commas(value);
    let count = layers.len();
    let mut columns: [Vec<String>; 7] = Default::default();
    let mut color = None;

    for (i, layer) in layers.iter().enumerate() {
        let parsed = parse_background_layer(layer)?;
        if parsed.color.is_some() {
            // only the final layer may carry a color
            if i + 1 != count {
                return None;
            }
            color = parsed.color;
        }
        let fields = [
            parsed.image.unwrap_or_else(|| "none".into()),
            parsed.repeat.unwrap_or_else(|| "repeat".into()),
            parsed.attachment.unwrap_or_else(|| "scroll".into()),
            parsed.position.unwrap_or_else(|| "0% 0%".into()),
            parsed.size.unwrap_or_else(|| "auto".into()),
            parsed.origin.unwrap_or_else(|| "padding-box".into()),
            parsed.clip.unwrap_or_else(|| "border-box".into()),
        ];
        for (column, field) in columns.iter_mut().zip(fields) {
            column.push(field);
        }
    }

    let mut values = vec![color.unwrap_or_else(|| "transparent".into())];
    values.extend(columns.iter().map(|c| c.join(", ")));
    Some(values)
}

fn is_font_size(part: &Part<'_>) -> bool {
    match part.kind {
        PartKind::Dimension | PartKind::Percentage => true,
        PartKind::Number => is_length(part),
        _ => part.is_length_like() || part.is_any_ident(FONT_SIZES),
    }
}

fn is_font_weight_number(part: &Part<'_>) -> bool {
    part.kind == PartKind::Number
        && part
            .text
            .parse::<f64>()
            .is_ok_and(|n| (1.0..=1000.0).contains(&n))
}

fn expand_font(value: &str, parts: &[Part<'_>]) -> Option<Vec<String>> {
    if parts.len() == 1 && parts[0].is_any_ident(SYSTEM_FONTS) {
        return None;
    }

    let (mut style, mut variant, mut weight, mut stretch) = (None, None, None, None);
    let mut i = 0;
    let size = loop {
        let part = parts.get(i)?;
        i += 1;
        if part.is_ident("normal") {
            continue;
        } else if part.is_any_ident(&["italic", "oblique"]) {
            set_once(&mut style, part.text)?;
        } else if part.is_ident("small-caps") {
            set_once(&mut variant, part.text)?;
        } else if part.is_any_ident(&["bold", "bolder", "lighter"]) || is_font_weight_number(part)
        {
            set_once(&mut weight, part.text)?;
        } else if part.is_any_ident(FONT_STRETCHES) {
            set_once(&mut stretch, part.text)?;
        } else if is_font_size(part) {
            break part.text;
        } else {
            return None;
        }
    };

    let mut line_height = "normal";
    if parts.get(i).is_some_and(|p| p.kind == PartKind::Slash) {
        line_height = parts.get(i + 1)?.text;
        i += 2;
    }

    let family_start = parts.get(i)?;
    let offset = (family_start.text.as_ptr() as usize).checked_sub(value.as_ptr() as usize)?;
    let family = value.get(offset..)?.trim();

    Some(vec![
        style.unwrap_or_else(|| "normal".into()),
        variant.unwrap_or_else(|| "normal".into()),
        weight.unwrap_or_else(|| "normal".into()),
        stretch.unwrap_or_else(|| "normal".into()),
        size.to_string(),
        line_height.to_string(),
        family.to_string(),
    ])
}

fn expand_flex(parts: &[Part<'_>]) -> Option<Vec<String>> {
    let owned = |v: [&str; 3]| -> Option<Vec<String>> {
        Some(v.iter().map(|s| s.to_string()).collect())
    };
    if parts.len() == 1 {
        if parts[0].is_ident("none") {
            return owned(["0", "0", "auto"]);
        }
        if parts[0].is_ident("auto") {
            return owned(["1", "1", "auto"]);
        }
    }
    if parts.len() > 3 {
        return None;
    }

    let mut factors = Vec::new();
    let mut basis = None;
    for part in parts {
        if part.kind == PartKind::Number && factors.len() < 2 && basis.is_none() {
            factors.push(part.text);
        } else if part.is_length_like() || part.is_any_ident(&["auto", "content"]) {
            set_once(&mut basis, part.text)?;
        } else {
            return None;
        }
    }

    let grow = factors.first().copied().unwrap_or("1");
    let shrink = factors.get(1).copied().unwrap_or("1");
    let basis = match basis {
        Some(basis) => basis,
        None if factors.is_empty() => return None,
        None => "0%".to_string(),
    };
    Some(vec![grow.to_string(), shrink.to_string(), basis])
}

fn expand_flex_flow(parts: &[Part<'_>]) -> Option<Vec<String>> {
    let (mut direction, mut wrap) = (None, None);
    for part in parts {
        if part.is_any_ident(&["row", "row-reverse", "column", "column-reverse"]) {
            set_once(&mut direction, part.text)?;
        } else if part.is_any_ident(&["nowrap", "wrap", "wrap-reverse"]) {
            set_once(&mut wrap, part.text)?;
        } else {
            return None;
        }
    }
    Some(vec![
        direction.unwrap_or_else(|| "row".into()),
        wrap.unwrap_or_else(|| "nowrap".into()),
    ])
}

fn expand_pair(parts: &[Part<'_>]) -> Option<Vec<String>> {
    match parts {
        [one] => Some(vec![one.text.into(), one.text.into()]),
        [first, second] => Some(vec![first.text.into(), second.text.into()]),
        _ => None,
    }
}

fn expand_list_style(parts: &[Part<'_>]) -> Option<Vec<String>> {
    let (mut kind, mut position, mut image) = (None, None, None);
    let mut nones = 0;
    for part in parts {
        if part.is_ident("none") {
            nones += 1;
        } else if part.is_any_ident(&["inside", "outside"]) {
            set_once(&mut position, part.text)?;
        } else if is_image(part) {
            set_once(&mut image, part.text)?;
        } else if matches!(part.kind, PartKind::Ident | PartKind::String) {
            set_once(&mut kind, part.text)?;
        } else {
            return None;
        }
    }
    for _ in 0..nones {
        if kind.is_none() {
            kind = Some("none".into());
        } else if image.is_none() {
            image = Some("none".into());
        } else {
            return None;
        }
    }
    Some(vec![
        kind.unwrap_or_else(|| "disc".into()),
        position.unwrap_or_else(|| "outside".into()),
        image.unwrap_or_else(|| "none".into()),
    ])
}

fn expand_text_decoration(parts: &[Part<'_>]) -> Option<Vec<String>> {
    let mut lines: Vec<&str> = Vec::new();
    let (mut style, mut color, mut thickness) = (None, None, None);
    for part in parts {
        if part.is_any_ident(DECORATION_LINES) {
            if part.is_ident("none") && !lines.is_empty() {
                return None;
            }
            lines.push(part.text);
        } else if part.is_any_ident(DECORATION_STYLES) {
            set_once(&mut style, part.text)?;
        } else if part.is_length_like() || part.is_any_ident(&["auto", "from-font"]) {
            set_once(&mut thickness, part.text)?;
        } else if is_color_candidate(part) {
            set_once(&mut color, part.text)?;
        } else {
            return None;
        }
    }
    if lines.len() > 1 && lines.iter().any(|l| l.eq_ignore_ascii_case("none")) {
        return None;
    }
    Some(vec![
        if lines.is_empty() {
            "none".into()
        } else {
            lines.join(" ")
        },
        style.unwrap_or_else(|| "solid".into()),
        color.unwrap_or_else(|| "currentcolor".into()),
        thickness.unwrap_or_else(|| "auto".into()),
    ])
}
