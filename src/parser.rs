use crate::config::parse_json_or_json5;
use crate::ir::ChartSpec;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());
static PIE_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^pie\b").unwrap());

/// Template used for `pie showData`: values next to names.
const SHOW_DATA_TEXT: &str = "%l %v";

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no chart found in input")]
    Empty,
    #[error("expected `pie` header, found `{0}`")]
    NotAPie(String),
    #[error("line {line}: `{text}` is not a `\"label\" : value` entry")]
    InvalidSector { line: usize, text: String },
    #[error("line {line}: value of `{label}` must be a non-negative number")]
    InvalidValue { line: usize, label: String },
}

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub spec: ChartSpec,
    pub init_config: Option<serde_json::Value>,
}

/// Read a chart: a JSON/JSON5 object when the input starts with `{`,
/// otherwise a Mermaid `pie` block.
pub fn parse_chart(input: &str) -> Result<ParseOutput> {
    if looks_like_object(input) {
        let spec: ChartSpec = parse_json_or_json5(input.trim())?;
        return Ok(ParseOutput {
            spec,
            init_config: None,
        });
    }
    Ok(parse_pie(input)?)
}

/// First meaningful character is `{`, skipping JSON5 line comments.
fn looks_like_object(input: &str) -> bool {
    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("//"))
        .is_some_and(|line| line.starts_with('{'))
}

pub fn parse_pie(input: &str) -> Result<ParseOutput, ParseError> {
    let mut spec = ChartSpec::default();
    let mut init_config: Option<serde_json::Value> = None;
    let mut seen_header = false;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed_line = raw_line.trim();
        if trimmed_line.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(trimmed_line) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                } else if let Ok(value) = json5::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                }
            }
            continue;
        }
        if trimmed_line.starts_with("%%") {
            continue;
        }
        let line = strip_trailing_comment(trimmed_line);
        if line.is_empty() {
            continue;
        }
        let lower = line.to_ascii_lowercase();

        if !seen_header {
            if !PIE_HEADER_RE.is_match(&line) {
                return Err(ParseError::NotAPie(line));
            }
            seen_header = true;
            if lower.contains("showdata") {
                set_show_data(&mut spec);
            }
            // Title on the header line: "pie title My Title"
            if let Some(title_pos) = lower.find("title")
                && let Some(title) = line.get(title_pos + 5..)
            {
                let title = title.trim();
                if !title.is_empty() {
                    spec.title = Some(title.to_string());
                }
            }
            continue;
        }

        if lower.starts_with("showdata") {
            set_show_data(&mut spec);
            continue;
        }
        if lower.starts_with("title") {
            let title = line.get(5..).unwrap_or("").trim();
            if !title.is_empty() {
                spec.title = Some(title.to_string());
            }
            continue;
        }
        if lower.starts_with("accdescr") || lower.starts_with("acctitle") {
            continue;
        }

        let (label, value) = parse_sector_line(&line, line_no)?;
        spec.labels.push(label);
        spec.values.push(value);
    }

    if !seen_header {
        return Err(ParseError::Empty);
    }
    if let Some(options) = init_config.as_ref().and_then(|init| init.get("outlabels")) {
        merge_options(&mut spec, options.clone());
    }
    Ok(ParseOutput { spec, init_config })
}

fn set_show_data(spec: &mut ChartSpec) {
    merge_options(spec, serde_json::json!({ "text": SHOW_DATA_TEXT }));
}

fn merge_options(spec: &mut ChartSpec, patch: serde_json::Value) {
    match (&mut spec.options, patch) {
        (Some(serde_json::Value::Object(existing)), serde_json::Value::Object(patch)) => {
            existing.extend(patch);
        }
        (options, patch) => *options = Some(patch),
    }
}

fn parse_sector_line(line: &str, line_no: usize) -> Result<(String, f64), ParseError> {
    let Some((label_part, value_part)) = line.rsplit_once(':') else {
        return Err(ParseError::InvalidSector {
            line: line_no,
            text: line.to_string(),
        });
    };
    let label = strip_quotes(label_part.trim());
    if label.is_empty() {
        return Err(ParseError::InvalidSector {
            line: line_no,
            text: line.to_string(),
        });
    }
    let value = value_part
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| ParseError::InvalidValue {
            line: line_no,
            label: label.clone(),
        })?;
    Ok((label, value))
}

fn strip_trailing_comment(line: &str) -> String {
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            out.push(ch);
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            out.push(ch);
            continue;
        }
        if ch == '%'
            && let Some('%') = chars.peek().copied()
        {
            break;
        }
        out.push(ch);
    }
    out.trim().to_string()
}

fn strip_quotes(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else if trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pie_with_title_and_sectors() {
        let input = "pie title Pets adopted\n  \"Dogs\" : 386\n  \"Cats\" : 85.5 %% comment\n  'Rats' : 15";
        let parsed = parse_chart(input).unwrap();
        assert_eq!(parsed.spec.title.as_deref(), Some("Pets adopted"));
        assert_eq!(parsed.spec.labels, vec!["Dogs", "Cats", "Rats"]);
        assert_eq!(parsed.spec.values, vec![386.0, 85.5, 15.0]);
        assert!(parsed.spec.options.is_none());
    }

    #[test]
    fn labels_may_contain_colons() {
        let parsed = parse_pie("pie\n\"Ratio 1:2\" : 4").unwrap();
        assert_eq!(parsed.spec.labels, vec!["Ratio 1:2"]);
    }

    #[test]
    fn show_data_and_init_options_merge() {
        let input = "%%{init: {'outlabels': {'length': 20}}}%%\npie showData\n\"A\" : 1";
        let parsed = parse_chart(input).unwrap();
        let options = parsed.spec.options.unwrap();
        assert_eq!(options["text"], SHOW_DATA_TEXT);
        assert_eq!(options["length"], 20);
        assert!(parsed.init_config.is_some());
    }

    #[test]
    fn rejects_other_diagrams_and_bad_values() {
        assert_eq!(
            parse_pie("flowchart LR\nA-->B").unwrap_err(),
            ParseError::NotAPie("flowchart LR".into())
        );
        assert_eq!(
            parse_pie("pie\n\"A\" : -3").unwrap_err(),
            ParseError::InvalidValue {
                line: 2,
                label: "A".into()
            }
        );
        assert_eq!(
            parse_pie("pie\njust words").unwrap_err(),
            ParseError::InvalidSector {
                line: 2,
                text: "just words".into()
            }
        );
        assert_eq!(parse_pie("%% only a comment\n").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn parses_json5_chart() {
        let input = "// exported\n{ id: 'sales', labels: ['A', 'B'], values: [1, 2], hidden: [1], options: { useMarkers: true } }";
        let parsed = parse_chart(input).unwrap();
        assert_eq!(parsed.spec.chart_id().to_string(), "sales");
        assert_eq!(parsed.spec.hidden, vec![1]);
        assert_eq!(parsed.spec.options.unwrap()["useMarkers"], true);
    }
}
