// src/scrape/page.rs
//
// Pure, read-only field extractors over a parsed craigslist-style listing
// page, plus `parse_page` which assembles them into one `Listing`.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::listing::Listing;
use crate::scrape::ExtractionError;

const PRICE_SELECTOR: &str = "section h2 span.postingtitletext span.price";
const MOVE_IN_SELECTOR: &str = "div.mapAndAttrs span.housing_movein_now.property_date";
const BED_BATH_SELECTOR: &str = "div.mapAndAttrs > p.attrgroup > span:nth-child(1)";
const ATTR_GROUP_SELECTOR: &str = "div.mapAndAttrs > p.attrgroup";
const TAG_SELECTOR: &str = "span:not(.otherpostings)";
const CANONICAL_SELECTOR: &str = r#"link[rel="canonical"]"#;
const BODY_SELECTOR: &str = "section#postingbody";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedBath {
    pub bed_count: f64,
    pub bath_count: f64,
}

fn selector(css: &'static str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::BadSelector(e.to_string()))
}

fn select_first<'a>(
    doc: &'a Html,
    css: &'static str,
    field: &'static str,
) -> Result<ElementRef<'a>, ExtractionError> {
    let sel = selector(css)?;
    doc.select(&sel)
        .next()
        .ok_or(ExtractionError::MissingElement {
            field,
            selector: css,
        })
}

/// Posting-title price: strip the currency symbol and thousands separators,
/// parse the rest as an integer.
pub fn get_price(doc: &Html) -> Result<i64, ExtractionError> {
    let element = select_first(doc, PRICE_SELECTOR, "price")?;
    let text: String = element.text().collect();
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).replace(',', "");
    digits
        .parse::<i64>()
        .map_err(|e| ExtractionError::Malformed {
            field: "price",
            value: trimmed.to_string(),
            reason: e.to_string(),
        })
}

pub fn get_move_in_date(doc: &Html) -> Result<NaiveDate, ExtractionError> {
    let element = select_first(doc, MOVE_IN_SELECTOR, "move_in_date")?;
    let raw = element
        .value()
        .attr("data-date")
        .ok_or(ExtractionError::MissingAttribute {
            field: "move_in_date",
            attribute: "data-date",
        })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| ExtractionError::Malformed {
        field: "move_in_date",
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// The first attribute-group bubble holds `[bedroom, separator, bathroom]`
/// child nodes, e.g. `<b>2BR</b> / <b>1Ba</b>`.
pub fn get_bed_bath(doc: &Html) -> Result<BedBath, ExtractionError> {
    let element = select_first(doc, BED_BATH_SELECTOR, "bed_count")?;
    let parts: Vec<String> = element
        .children()
        .map(|child| {
            child
                .value()
                .as_text()
                .map(|t| t.text.to_string())
                .or_else(|| ElementRef::wrap(child).map(|el| el.text().collect()))
                .unwrap_or_default()
        })
        .collect();

    if parts.len() < 3 {
        return Err(ExtractionError::Malformed {
            field: "bed_count",
            value: parts.concat(),
            reason: format!(
                "expected bedroom/separator/bathroom nodes, found {}",
                parts.len()
            ),
        });
    }

    Ok(BedBath {
        bed_count: parse_count("bed_count", &parts[0], "BR")?,
        bath_count: parse_count("bath_count", &parts[2], "Ba")?,
    })
}

pub fn get_bed_count(doc: &Html) -> Result<f64, ExtractionError> {
    Ok(get_bed_bath(doc)?.bed_count)
}

pub fn get_bath(doc: &Html) -> Result<f64, ExtractionError> {
    Ok(get_bed_bath(doc)?.bath_count)
}

fn parse_count(field: &'static str, raw: &str, suffix: &str) -> Result<f64, ExtractionError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix(suffix).unwrap_or(trimmed);
    let parsed: f64 = number.parse().map_err(|e: std::num::ParseFloatError| {
        ExtractionError::Malformed {
            field,
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })?;
    // "NaN" parses as a float; never let it through.
    if !parsed.is_finite() {
        return Err(ExtractionError::Malformed {
            field,
            value: raw.to_string(),
            reason: "not a finite number".to_string(),
        });
    }
    Ok(parsed)
}

/// Every attribute group past the first holds free-text tags. Spans marked
/// as "other postings" are navigation, not tags.
pub fn get_tags(doc: &Html) -> Result<BTreeSet<String>, ExtractionError> {
    let groups = selector(ATTR_GROUP_SELECTOR)?;
    let spans = selector(TAG_SELECTOR)?;

    let mut tags = BTreeSet::new();
    for group in doc.select(&groups).skip(1) {
        for span in group.select(&spans) {
            let text: String = span.text().collect();
            let text = text.trim();
            if !text.is_empty() {
                tags.insert(text.to_string());
            }
        }
    }
    Ok(tags)
}

pub fn get_url(doc: &Html) -> Result<Url, ExtractionError> {
    let element = select_first(doc, CANONICAL_SELECTOR, "url")?;
    let href = element
        .value()
        .attr("href")
        .ok_or(ExtractionError::MissingAttribute {
            field: "url",
            attribute: "href",
        })?;
    Url::parse(href).map_err(|e| ExtractionError::Malformed {
        field: "url",
        value: href.to_string(),
        reason: e.to_string(),
    })
}

/// Direct text children of the posting body only, so boilerplate child
/// elements (QR-code links etc.) are skipped. Trims the result and collapses
/// newline runs.
pub fn get_body(doc: &Html) -> Result<String, ExtractionError> {
    let element = select_first(doc, BODY_SELECTOR, "body")?;
    let raw: String = element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.text.to_string()))
        .collect();
    Ok(squeeze_newlines(raw.trim()))
}

fn squeeze_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_newline = false;
    for ch in text.chars() {
        if ch == '\n' {
            if !prev_newline {
                out.push(ch);
            }
            prev_newline = true;
        } else {
            out.push(ch);
            prev_newline = false;
        }
    }
    out
}

/// Runs every extractor once and assembles the results. All-or-nothing: the
/// first failing field aborts the page, and the error names that field.
pub fn parse_page(doc: &Html) -> Result<Listing, ExtractionError> {
    let BedBath {
        bed_count,
        bath_count,
    } = get_bed_bath(doc)?;

    Ok(Listing {
        url: get_url(doc)?,
        body: get_body(doc)?,
        price: get_price(doc)?,
        move_in_date: get_move_in_date(doc)?,
        bed_count,
        bath_count,
        tags: get_tags(doc)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> String {
        r#"<html>
<head>
<link rel="canonical" href="https://sf.example.org/apa/d/123.html">
</head>
<body>
<section class="page-container">
<section class="body">
<h2 class="postingtitle">
<span class="postingtitletext"><span class="price">$2,950</span> / 2br - sunny two bedroom</span>
</h2>
<div class="mapAndAttrs">
<span class="housing_movein_now property_date" data-date="2017-03-01">mar 1</span>
<p class="attrgroup">
<span class="shared-line-bubble"><b>2BR</b> / <b>1Ba</b></span>
</p>
<p class="attrgroup">
<span>cats are OK - purrr</span>
<span>laundry on site</span>
<span class="otherpostings">see all postings by this user</span>
</p>
</div>
<section id="postingbody">
Bright corner unit.


Close to the park.
</section>
</section>
</section>
</body>
</html>"#
            .to_string()
    }

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn parses_happy_path_listing() {
        let doc = parse(&sample_page());
        let listing = parse_page(&doc).unwrap();

        assert_eq!(listing.price, 2950);
        assert_eq!(
            listing.move_in_date,
            NaiveDate::from_ymd_opt(2017, 3, 1).unwrap()
        );
        assert_eq!(listing.bed_count, 2.0);
        assert_eq!(listing.bath_count, 1.0);
        assert_eq!(
            listing.url,
            Url::parse("https://sf.example.org/apa/d/123.html").unwrap()
        );

        let expected_tags: BTreeSet<String> = ["cats are OK - purrr", "laundry on site"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(listing.tags, expected_tags);
    }

    #[test]
    fn body_is_trimmed_and_newline_runs_collapse() {
        let doc = parse(&sample_page());
        let body = get_body(&doc).unwrap();
        assert_eq!(body, "Bright corner unit.\nClose to the park.");
    }

    #[test]
    fn extraction_is_deterministic() {
        let html = sample_page();
        let first = parse_page(&parse(&html)).unwrap();
        let second = parse_page(&parse(&html)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_price_element_fails_with_field_name() {
        let html = sample_page().replace(r#"<span class="price">$2,950</span>"#, "");
        let err = get_price(&parse(&html)).unwrap_err();
        assert_eq!(err.field(), Some("price"));
        assert!(matches!(err, ExtractionError::MissingElement { .. }));

        // Assembly for the page aborts with the same error.
        let err = parse_page(&parse(&html)).unwrap_err();
        assert_eq!(err.field(), Some("price"));
    }

    #[test]
    fn nan_bed_count_is_rejected() {
        let html = sample_page().replace("2BR", "NaNBR");
        let err = get_bed_bath(&parse(&html)).unwrap_err();
        assert_eq!(err.field(), Some("bed_count"));
        match err {
            ExtractionError::Malformed { reason, .. } => {
                assert!(reason.contains("finite"), "unexpected reason: {reason}")
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn too_few_bed_bath_nodes_fail() {
        let html = sample_page().replace("<b>2BR</b> / <b>1Ba</b>", "<b>2BR</b>");
        let err = get_bed_bath(&parse(&html)).unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { .. }));
    }

    #[test]
    fn malformed_move_in_date_fails() {
        let html = sample_page().replace("2017-03-01", "sometime soon");
        let err = get_move_in_date(&parse(&html)).unwrap_err();
        assert_eq!(err.field(), Some("move_in_date"));
    }

    #[test]
    fn malformed_canonical_url_fails() {
        let html = sample_page().replace("https://sf.example.org/apa/d/123.html", "not a url");
        let err = get_url(&parse(&html)).unwrap_err();
        assert_eq!(err.field(), Some("url"));
    }

    #[test]
    fn tags_exclude_other_postings_and_collapse_duplicates() {
        let html = sample_page().replace(
            "<span>laundry on site</span>",
            "<span>laundry on site</span>\n<span>cats are OK - purrr</span>",
        );
        let tags = get_tags(&parse(&html)).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(!tags.iter().any(|t| t.contains("postings")));
    }
}
