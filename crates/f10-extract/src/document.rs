//! Parsed source documents and table grids.
//!
//! A fetched page is parsed once into a [`Document`]. HTML pages keep their
//! element tree so tables can be matched by their attributes; delimited
//! exports become a single [`Table`] grid.

use crate::error::{ExtractError, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid table selector"));

static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));

/// Widest colspan honored when expanding merged cells.
const MAX_COLSPAN: usize = 64;

/// A rectangular-ish grid of raw cell text.
///
/// Cells hold the text exactly as extracted; sanitization happens when a
/// reshaper reads them. Leading header rows (all `<th>` cells, or the first
/// line of a delimited export) are counted separately from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    classes: Vec<String>,
    header_rows: usize,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with no header rows and no class attributes.
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            classes: Vec::new(),
            header_rows: 0,
            rows,
        }
    }

    /// Mark the first `n` rows as header rows.
    pub fn with_header_rows(mut self, n: usize) -> Self {
        self.header_rows = n.min(self.rows.len());
        self
    }

    /// Attach the class attribute tokens of the source element.
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Class attribute tokens, in source order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Returns true if the class attribute holds exactly these tokens.
    pub fn has_class_set(&self, wanted: &[&str]) -> bool {
        self.classes.len() == wanted.len()
            && wanted.iter().all(|w| self.classes.iter().any(|c| c == w))
    }

    /// All rows, header rows included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The first header row, if the table has one.
    pub fn header(&self) -> Option<&[String]> {
        if self.header_rows == 0 {
            return None;
        }
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header rows.
    pub fn body(&self) -> &[Vec<String>] {
        &self.rows[self.header_rows..]
    }

    /// Raw text of a body cell.
    pub fn body_cell(&self, row: usize, col: usize) -> Option<&str> {
        self.body().get(row)?.get(col).map(String::as_str)
    }

    /// Number of columns of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn from_element(table: ElementRef<'_>) -> Self {
        let mut rows = Vec::new();
        let mut header_rows = 0;
        let mut in_header = true;

        for tr in table.select(&ROW).filter(|tr| owned_by(*tr, table)) {
            let mut row = Vec::new();
            let mut all_th = true;

            for cell in tr.children().filter_map(ElementRef::wrap) {
                let name = cell.value().name();
                if name != "td" && name != "th" {
                    continue;
                }
                all_th &= name == "th";

                let span = cell
                    .value()
                    .attr("colspan")
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .unwrap_or(1)
                    .clamp(1, MAX_COLSPAN);
                let text: String = cell.text().collect();
                row.extend(std::iter::repeat_n(text, span));
            }

            if row.is_empty() {
                continue;
            }
            if in_header && all_th {
                header_rows += 1;
            } else {
                in_header = false;
            }
            rows.push(row);
        }

        let classes = table.value().attr("class").unwrap_or_default();
        Self::new(rows)
            .with_header_rows(header_rows)
            .with_classes(classes.split_whitespace())
    }
}

/// A parsed upstream document.
#[derive(Debug)]
pub enum Document {
    /// An HTML page
    Html(Html),
    /// A delimited export parsed into one grid
    Grid(Table),
}

impl Document {
    /// Parse raw page text, detecting HTML by its leading markup.
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim_start_matches('\u{feff}').trim_start();
        if text.starts_with('<') {
            Ok(Self::parse_html(text))
        } else {
            Self::parse_delimited(text)
        }
    }

    /// Parse an HTML page.
    pub fn parse_html(raw: &str) -> Self {
        Self::Html(Html::parse_document(raw))
    }

    /// Parse a comma-delimited export. The first line is the header row.
    pub fn parse_delimited(raw: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| ExtractError::unavailable("delimited", format!("CSV error: {e}")))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Err(ExtractError::unavailable("delimited", "empty document"));
        }

        Ok(Self::Grid(Table::new(rows).with_header_rows(1)))
    }

    /// Every table in the document, in document order.
    pub fn tables(&self) -> Vec<Table> {
        match self {
            Self::Html(html) => html.select(&TABLE).map(Table::from_element).collect(),
            Self::Grid(table) => vec![table.clone()],
        }
    }

    /// Text of the first `item` inside each `container`, in document order.
    ///
    /// Containers without a matching item are skipped. Delimited documents
    /// have no elements and always return nothing.
    pub fn select_text(&self, container: &str, item: &str) -> Result<Vec<String>> {
        let Self::Html(html) = self else {
            return Ok(Vec::new());
        };
        let outer = parse_selector(container)?;
        let inner = parse_selector(item)?;
        Ok(html
            .select(&outer)
            .filter_map(|el| el.select(&inner).next())
            .map(|el| el.text().collect::<String>())
            .collect())
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ExtractError::unavailable("document", format!("bad selector {css:?}: {e}")))
}

/// Returns true if `table` is the nearest enclosing table of `tr`.
fn owned_by(tr: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|el| el.id() == table.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <table class="table_bg001 border_box limit_sale">
            <tr><th>姓名</th><th>职务</th></tr>
            <tr><td>张三</td><td>董事长</td></tr>
            <tr><td>李四</td><td>
              <table class="inner"><tr><td>nested</td></tr></table>
            </td></tr>
          </table>
          <table><tr><td>主营业务</td><td colspan="3">银行业务</td></tr></table>
        </body></html>
    "#;

    #[test]
    fn test_html_tables() {
        let doc = Document::parse(PAGE).unwrap();
        let tables = doc.tables();
        assert_eq!(tables.len(), 3);

        let board = &tables[0];
        assert_eq!(board.classes(), ["table_bg001", "border_box", "limit_sale"]);
        assert!(board.has_class_set(&["limit_sale", "table_bg001", "border_box"]));
        assert!(!board.has_class_set(&["table_bg001", "border_box"]));
        assert_eq!(board.header().unwrap(), ["姓名", "职务"]);
        assert_eq!(board.body().len(), 2);
        assert_eq!(board.body_cell(0, 1), Some("董事长"));
        // rows of the nested table are not attributed to the outer one
        assert!(board.body().iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_colspan_expands() {
        let doc = Document::parse(PAGE).unwrap();
        let tables = doc.tables();
        let merged = &tables[2];
        assert!(merged.header().is_none());
        assert_eq!(merged.width(), 4);
        assert_eq!(merged.body_cell(0, 3), Some("银行业务"));
    }

    #[test]
    fn test_delimited_grid() {
        let raw = "\u{feff}报告日期,2023-03-31,2022-12-31,\n货币资金(万元),1,--,\n";
        let doc = Document::parse(raw).unwrap();
        let tables = doc.tables();
        assert_eq!(tables.len(), 1);
        let grid = &tables[0];
        assert_eq!(grid.header().unwrap()[0], "报告日期");
        assert_eq!(grid.body().len(), 1);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.body_cell(0, 0), Some("货币资金(万元)"));
    }

    #[test]
    fn test_empty_delimited_is_unavailable() {
        assert!(matches!(
            Document::parse("   "),
            Err(ExtractError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_select_text() {
        let doc = Document::parse(r#"<div class="report_date"><span>报告期：2023-03-31</span></div>"#)
            .unwrap();
        let found = doc.select_text("div.report_date", "span").unwrap();
        assert_eq!(found, vec!["报告期：2023-03-31".to_string()]);

        let grid = Document::parse("a,b\n").unwrap();
        assert!(grid.select_text("div", "span").unwrap().is_empty());
    }

    #[test]
    fn test_select_text_takes_first_item_per_container() {
        let doc = Document::parse(
            r#"<h2 class="t"><li>a1</li><li>a2</li></h2><h2 class="t"></h2><h2 class="t"><li>b1</li><li>b2</li></h2>"#,
        )
        .unwrap();
        assert_eq!(doc.select_text("h2.t", "li").unwrap(), vec!["a1", "b1"]);
    }
}
