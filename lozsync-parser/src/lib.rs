//! Status-lozenge extraction for lozsync.
//!
//! `parse_lozenges(body)` scans Confluence storage-format HTML for
//! status macros nested inside header elements (`<h1>`–`<h6>`) and
//! returns one [`Lozenge`] per occurrence. Badges anywhere else on the
//! page are ignored — header placement is what marks a badge as a
//! tracked status rather than body-text noise.
//!
//! Everything here is a pure function over the input string: malformed
//! or unbalanced markup simply produces no lozenge, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

use lozsync_core::types::{Lozenge, LozengeCount, PageId, PageLozengeResult};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Header elements, levels 1–6, capturing the span between the tags.
static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<h[1-6][^>]*>(.*?)</h[1-6]>").expect("header pattern"));

/// A status macro occurrence in storage format.
static STATUS_MACRO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<ac:structured-macro[^>]*ac:name="status"[^>]*>.*?</ac:structured-macro>"#)
        .expect("status macro pattern")
});

/// Macro parameters. Both `colour` and `color` spellings occur in the
/// wild; the British spelling is checked first, matching the source
/// system's own storage format.
static PARAM_COLOUR_RE: Lazy<Regex> = Lazy::new(|| param_pattern("colour"));
static PARAM_COLOR_RE: Lazy<Regex> = Lazy::new(|| param_pattern("color"));
static PARAM_TITLE_RE: Lazy<Regex> = Lazy::new(|| param_pattern("title"));

fn param_pattern(name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)<ac:parameter[^>]*ac:name="{name}"[^>]*>([^<]*)</ac:parameter>"#
    ))
    .expect("parameter pattern")
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract all header-nested status lozenges from a page body.
pub fn parse_lozenges(body: &str) -> Vec<Lozenge> {
    let mut lozenges = Vec::new();

    for header in HEADER_RE.captures_iter(body) {
        let span = &header[1];
        for macro_match in STATUS_MACRO_RE.find_iter(span) {
            let macro_html = macro_match.as_str();

            let color = extract_param(&PARAM_COLOUR_RE, macro_html)
                .or_else(|| extract_param(&PARAM_COLOR_RE, macro_html))
                .unwrap_or_else(|| "default".to_string());
            let text = extract_param(&PARAM_TITLE_RE, macro_html)
                .unwrap_or_else(|| "Unknown".to_string());

            lozenges.push(Lozenge {
                text: normalize_text(&text),
                color: color.trim().to_lowercase(),
            });
        }
    }

    lozenges
}

/// Group lozenges by exact `(text, color)` and sort by descending count.
///
/// The sort is stable: ties keep their original encounter order.
pub fn count_lozenges(lozenges: &[Lozenge]) -> Vec<LozengeCount> {
    let mut counts: Vec<LozengeCount> = Vec::new();

    for lozenge in lozenges {
        match counts
            .iter_mut()
            .find(|c| c.text == lozenge.text && c.color == lozenge.color)
        {
            Some(existing) => existing.count += 1,
            None => counts.push(LozengeCount {
                text: lozenge.text.clone(),
                color: lozenge.color.clone(),
                count: 1,
            }),
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Parse a page body and aggregate its lozenges.
///
/// `total_count` is the number of raw occurrences, before grouping.
pub fn analyze_page(page_id: PageId, page_title: &str, body: &str) -> PageLozengeResult {
    let lozenges = parse_lozenges(body);
    let counts = count_lozenges(&lozenges);

    PageLozengeResult {
        page_id,
        page_title: page_title.to_string(),
        total_count: lozenges.len() as u32,
        lozenges: counts,
    }
}

/// Normalize lozenge text to consistent casing.
///
/// The literal tokens `TBD` and `N/A` stay upper-cased; everything else
/// is title-cased per space-delimited word and then per hyphen-delimited
/// segment, so `"in-progress item"` becomes `"In-Progress Item"`.
pub fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    let upper = trimmed.to_uppercase();

    if upper == "TBD" || upper == "N/A" {
        return upper;
    }

    let lowered = trimmed.to_lowercase();
    let spaced = lowered
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ");
    spaced
        .split('-')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join("-")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn extract_param(pattern: &Regex, macro_html: &str) -> Option<String> {
    pattern
        .captures(macro_html)
        .map(|captures| captures[1].to_string())
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn status_macro(title: Option<&str>, colour: Option<&str>) -> String {
        let mut params = String::new();
        if let Some(colour) = colour {
            params.push_str(&format!(
                r#"<ac:parameter ac:name="colour">{colour}</ac:parameter>"#
            ));
        }
        if let Some(title) = title {
            params.push_str(&format!(
                r#"<ac:parameter ac:name="title">{title}</ac:parameter>"#
            ));
        }
        format!(
            r#"<ac:structured-macro ac:name="status" ac:schema-version="1">{params}</ac:structured-macro>"#
        )
    }

    fn in_header(level: u8, content: &str) -> String {
        format!("<h{level}>{content}</h{level}>")
    }

    #[test]
    fn one_lozenge_per_macro_inside_headers() {
        let body = format!(
            "{}<p>prose</p>{}",
            in_header(2, &status_macro(Some("Done"), Some("Green"))),
            in_header(3, &status_macro(Some("In Progress"), Some("Yellow"))),
        );
        let lozenges = parse_lozenges(&body);
        assert_eq!(
            lozenges,
            vec![
                Lozenge {
                    text: "Done".to_string(),
                    color: "green".to_string()
                },
                Lozenge {
                    text: "In Progress".to_string(),
                    color: "yellow".to_string()
                },
            ]
        );
    }

    #[test]
    fn body_text_macros_are_ignored() {
        let body = format!(
            "<p>{}</p>{}",
            status_macro(Some("Stray"), Some("Red")),
            in_header(2, &status_macro(Some("Done"), Some("Green"))),
        );
        let lozenges = parse_lozenges(&body);
        assert_eq!(lozenges.len(), 1);
        assert_eq!(lozenges[0].text, "Done");
    }

    #[test]
    fn missing_parameters_fall_back_to_defaults() {
        let body = in_header(2, &status_macro(None, None));
        let lozenges = parse_lozenges(&body);
        assert_eq!(
            lozenges,
            vec![Lozenge {
                text: "Unknown".to_string(),
                color: "default".to_string()
            }]
        );
    }

    #[test]
    fn american_color_spelling_is_accepted() {
        let body = in_header(
            2,
            r#"<ac:structured-macro ac:name="status"><ac:parameter ac:name="color">Blue</ac:parameter><ac:parameter ac:name="title">Queued</ac:parameter></ac:structured-macro>"#,
        );
        let lozenges = parse_lozenges(&body);
        assert_eq!(lozenges[0].color, "blue");
    }

    #[test]
    fn british_spelling_wins_when_both_present() {
        let body = in_header(
            2,
            r#"<ac:structured-macro ac:name="status"><ac:parameter ac:name="colour">Green</ac:parameter><ac:parameter ac:name="color">Red</ac:parameter></ac:structured-macro>"#,
        );
        let lozenges = parse_lozenges(&body);
        assert_eq!(lozenges[0].color, "green");
    }

    #[test]
    fn unbalanced_markup_produces_no_lozenges() {
        let body = r#"<h2><ac:structured-macro ac:name="status"><ac:parameter"#;
        assert!(parse_lozenges(body).is_empty());
    }

    #[test]
    fn header_attributes_do_not_break_matching() {
        let body = format!(
            r#"<h2 class="heading" id="x">{}</h2>"#,
            status_macro(Some("Done"), Some("Green"))
        );
        assert_eq!(parse_lozenges(&body).len(), 1);
    }

    #[test]
    fn counts_group_by_text_and_color() {
        let lozenges = vec![
            Lozenge {
                text: "Done".into(),
                color: "green".into(),
            },
            Lozenge {
                text: "Done".into(),
                color: "green".into(),
            },
            Lozenge {
                text: "Done".into(),
                color: "grey".into(),
            },
        ];
        let counts = count_lozenges(&lozenges);
        assert_eq!(counts.len(), 2, "same text, different color stays apart");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[0].color, "green");
    }

    #[test]
    fn count_sum_equals_input_length() {
        let lozenges = vec![
            Lozenge {
                text: "A".into(),
                color: "green".into(),
            },
            Lozenge {
                text: "B".into(),
                color: "red".into(),
            },
            Lozenge {
                text: "A".into(),
                color: "green".into(),
            },
        ];
        let counts = count_lozenges(&lozenges);
        let sum: u32 = counts.iter().map(|c| c.count).sum();
        assert_eq!(sum as usize, lozenges.len());
    }

    #[test]
    fn ties_keep_encounter_order() {
        let lozenges = vec![
            Lozenge {
                text: "Beta".into(),
                color: "red".into(),
            },
            Lozenge {
                text: "Alpha".into(),
                color: "green".into(),
            },
        ];
        let counts = count_lozenges(&lozenges);
        assert_eq!(counts[0].text, "Beta", "stable sort keeps first-seen first");
        assert_eq!(counts[1].text, "Alpha");
    }

    #[test]
    fn analyze_page_totals_raw_occurrences() {
        let body = format!(
            "{}{}",
            in_header(2, &status_macro(Some("Done"), Some("Green"))),
            in_header(2, &status_macro(Some("Done"), Some("Green"))),
        );
        let result = analyze_page(PageId::from("98304"), "Blueprint: Utah Jazz", &body);

        assert_eq!(result.total_count, 2);
        assert_eq!(
            result.lozenges,
            vec![LozengeCount {
                text: "Done".to_string(),
                color: "green".to_string(),
                count: 2
            }]
        );
    }
}
