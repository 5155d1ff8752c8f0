use crate::normalize::normalize;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub label: String,
    pub href: Option<String>,
}

/// A table row of a listing page: normalized cell texts plus the row's links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRow {
    pub tokens: Vec<String>,
    pub anchors: Vec<Anchor>,
}

impl PageRow {
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

/// Rows that have at least one `<td>`. Header rows made of `<th>` only are dropped.
pub fn parse_rows(html: &str) -> Vec<PageRow> {
    let doc = Html::parse_document(html);
    doc.select(&ROW)
        .filter_map(|tr| {
            let tokens: Vec<String> = tr
                .select(&CELL)
                .map(|td| normalize(&stripped_text(td)))
                .collect();
            if tokens.is_empty() {
                return None;
            }
            let anchors = tr
                .select(&ANCHOR)
                .map(|a| Anchor {
                    label: stripped_text(a),
                    href: a.value().attr("href").map(str::to_string),
                })
                .collect();
            Some(PageRow { tokens, anchors })
        })
        .collect()
}

/// hrefs of anchors inside table cells whose text is exactly `label`.
pub fn find_labelled_links(html: &str, label: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut out = Vec::new();
    for td in doc.select(&CELL) {
        for a in td.select(&ANCHOR) {
            if a.text().collect::<String>() != label {
                continue;
            }
            if let Some(href) = a.value().attr("href") {
                out.push(href.to_string());
            }
        }
    }
    out
}

// Each text node trimmed, then concatenated.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}
