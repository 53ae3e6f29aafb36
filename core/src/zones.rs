use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref SEL_TITLE: Selector = Selector::parse("title").expect("valid selector");
    static ref SEL_HEADERS: Selector = Selector::parse("h1, h2, h3").expect("valid selector");
    static ref SEL_BOLD: Selector = Selector::parse("b, strong").expect("valid selector");
}

const INVISIBLE: &[&str] = &["script", "style", "noscript"];

/// Overlapping text views of one page. `body` is the whole visible text, so
/// it also contains whatever landed in the other three zones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zones {
    pub title: String,
    pub headers: String,
    pub bold: String,
    pub body: String,
}

impl Zones {
    /// Zones for a plain-text document with no markup.
    pub fn body_only(body: impl Into<String>) -> Self {
        Self { body: body.into(), ..Default::default() }
    }

    /// Split raw, possibly broken, HTML into zones. Never fails: html5ever
    /// recovers from malformed markup and empty input yields empty zones.
    pub fn extract(html: &str) -> Self {
        if html.trim().is_empty() {
            return Self::default();
        }
        let doc = Html::parse_document(html);
        let title = doc.select(&SEL_TITLE).next().map(element_text).unwrap_or_default();
        let headers = doc.select(&SEL_HEADERS).map(element_text).collect::<Vec<_>>().join(" ");
        let bold = doc.select(&SEL_BOLD).map(element_text).collect::<Vec<_>>().join(" ");

        let body = doc
            .root_element()
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let hidden = node
                    .ancestors()
                    .filter_map(|a| a.value().as_element())
                    .any(|e| INVISIBLE.contains(&e.name()));
                if hidden {
                    return None;
                }
                let text = text.trim();
                (!text.is_empty()).then_some(text)
            })
            .collect::<Vec<_>>()
            .join(" ");

        Self { title, headers, bold, body }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" ")
}
