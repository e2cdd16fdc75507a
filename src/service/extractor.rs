//! Tag-scanning extraction of `<Item>` blocks from Promob XML exports.
//!
//! Promob exports are not consistent about field names across versions, so
//! every field is looked up through an ordered list of tag aliases. Nothing
//! here fails: unreadable numbers fall back to 0 (geometry) or 1 (quantity).

use crate::models::RawItemRecord;
use bigdecimal::{BigDecimal, Zero};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

const DEFAULT_DESCRIPTION: &str = "Item";

static ITEM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<item\b[^>]*>(.*?)</item\s*>").expect("item block pattern"));

/// Compiled alias patterns for one field, in priority order
struct FieldTags(Vec<Regex>);

impl FieldTags {
    fn new(aliases: &[&str]) -> Self {
        Self(
            aliases
                .iter()
                .map(|alias| {
                    let tag = regex::escape(alias);
                    Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>")).expect("field tag pattern")
                })
                .collect(),
        )
    }

    /// Text of the first alias present with non-blank content
    fn find(&self, body: &str) -> Option<String> {
        self.0.iter().find_map(|re| {
            re.captures(body)
                .and_then(|c| c.get(1))
                .map(|m| decode_text(m.as_str()))
                .filter(|text| !text.is_empty())
        })
    }
}

struct ItemTags {
    reference: FieldTags,
    description: FieldTags,
    width: FieldTags,
    height: FieldTags,
    depth: FieldTags,
    quantity: FieldTags,
    material: FieldTags,
    model: FieldTags,
    thickness: FieldTags,
}

static TAGS: Lazy<ItemTags> = Lazy::new(|| ItemTags {
    reference: FieldTags::new(&["Referencia", "Codigo"]),
    description: FieldTags::new(&["Descricao", "Descrição", "Description"]),
    width: FieldTags::new(&["Largura", "Width"]),
    height: FieldTags::new(&["Altura", "Height"]),
    depth: FieldTags::new(&["Profundidade", "Depth"]),
    quantity: FieldTags::new(&["Quantidade", "Repeticao", "Quantity"]),
    material: FieldTags::new(&["Material"]),
    model: FieldTags::new(&["Modelo", "Model"]),
    thickness: FieldTags::new(&["Espessura", "Thickness"]),
});

/// Lazily yields one record per `<Item>…</Item>` block, in document order
pub fn extract_items(xml: &str) -> impl Iterator<Item = RawItemRecord> + '_ {
    ITEM_BLOCK
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|body| parse_item(body.as_str()))
}

fn parse_item(body: &str) -> RawItemRecord {
    let tags = &*TAGS;
    RawItemRecord {
        reference: tags.reference.find(body).unwrap_or_default(),
        description: tags
            .description
            .find(body)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        width_mm: parse_dimension(tags.width.find(body).as_deref()),
        height_mm: parse_dimension(tags.height.find(body).as_deref()),
        depth_mm: parse_dimension(tags.depth.find(body).as_deref()),
        quantity: parse_quantity(tags.quantity.find(body).as_deref()),
        material: tags.material.find(body),
        model: tags.model.find(body),
        thickness: tags.thickness.find(body),
    }
}

/// Leading numeric prefix, accepting a decimal comma ("15,5mm" -> 15.5).
///
/// When both '.' and ',' occur, the last one is the decimal mark and the
/// other groups thousands ("1.234,56" -> 1234.56, "1,234.56" -> 1234.56).
fn numeric_prefix(text: &str) -> Option<String> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|&(i, ch)| !(ch.is_ascii_digit() || ch == '.' || ch == ',' || (i == 0 && (ch == '+' || ch == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let run = &text[..end];
    if !run.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let grouping = match (run.rfind('.'), run.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if comma > dot { '.' } else { ',' }),
        _ => None,
    };

    let mut out = String::with_capacity(run.len());
    let mut seen_point = false;
    for ch in run.chars() {
        match ch {
            _ if Some(ch) == grouping => {}
            '.' | ',' if seen_point => break,
            '.' | ',' => {
                seen_point = true;
                out.push('.');
            }
            _ => out.push(ch),
        }
    }

    if out.ends_with('.') {
        out.pop();
    }
    Some(out)
}

/// Millimeter value; missing, unreadable or negative text gives 0
pub fn parse_dimension(text: Option<&str>) -> BigDecimal {
    text.and_then(numeric_prefix)
        .and_then(|n| BigDecimal::from_str(&n).ok())
        .filter(|v| *v > BigDecimal::zero())
        .unwrap_or_else(BigDecimal::zero)
}

/// Whole units; missing, unreadable or non-positive text gives 1
pub fn parse_quantity(text: Option<&str>) -> i32 {
    text.and_then(numeric_prefix)
        .and_then(|n| {
            let whole = n.split('.').next().unwrap_or_default().trim_start_matches('+');
            whole.parse::<i32>().ok()
        })
        .filter(|q| *q >= 1)
        .unwrap_or(1)
}

/// Unwraps CDATA, decodes entities and trims
fn decode_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
    {
        return inner.trim().to_string();
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut rest = trimmed;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end))) {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
