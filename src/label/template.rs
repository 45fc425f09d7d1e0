// Marker substitution for label templates.
//
//   %l      sector name, cut to 7 chars with an ellipsis
//   %v[.N]  value with N (or the default) decimals
//   %p[.N]  share of the total in percent, suffixed with `%`
//
// Markers are case-insensitive. All `%l` are replaced first, then every
// `%v`, then every `%p`, so a name containing `%v` is itself expanded.

use once_cell::sync::Lazy;
use regex::{Captures, NoExpand, Regex};

use super::LabelContext;

const SHORT_LABEL_CHARS: usize = 7;
const MAX_PRECISION: usize = 100;

static LABEL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%l").unwrap());
static VALUE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%v\.?(\d*)").unwrap());
static PERCENT_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%p\.?(\d*)").unwrap());

pub fn shorten_label(label: &str) -> String {
    let mut chars = label.chars();
    let short: String = chars.by_ref().take(SHORT_LABEL_CHARS).collect();
    if chars.next().is_some() {
        format!("{short}\u{2026}")
    } else {
        short
    }
}

/// Fixed-point formatting with `digits` decimals; negative zero prints as zero.
pub fn format_fixed(value: f64, digits: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let formatted = format!("{:.*}", digits.min(MAX_PRECISION), value);
    if formatted.starts_with('-') && formatted[1..].chars().all(|c| c == '0' || c == '.') {
        formatted[1..].to_string()
    } else {
        formatted
    }
}

fn precision(caps: &Captures<'_>, default: usize) -> usize {
    caps.get(1)
        .map(|m| m.as_str())
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse::<usize>().ok())
        .unwrap_or(default)
}

pub fn resolve_template(
    template: &str,
    context: &LabelContext,
    value_precision: usize,
    percent_precision: usize,
) -> String {
    let short = shorten_label(&context.label);
    let text = LABEL_MARKER.replace_all(template, NoExpand(&short));
    let text = VALUE_MARKER.replace_all(&text, |caps: &Captures<'_>| {
        format_fixed(context.value, precision(caps, value_precision))
    });
    let text = PERCENT_MARKER.replace_all(&text, |caps: &Captures<'_>| {
        format!(
            "{}%",
            format_fixed(context.percent * 100.0, precision(caps, percent_precision))
        )
    });
    text.into_owned()
}

/// Split on line breaks, trim every line and drop the empty ones.
pub fn display_lines(text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
