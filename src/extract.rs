//! Record extraction from rendered listing pages.
//!
//! Pure functions over page markup: no session, no I/O. The listing contract is a table whose
//! body rows carry a fixed number of cells per schema; rows with fewer cells (headers, footers,
//! "no results" banners) are not data and are dropped.

use crate::models::{CatalogRecord, HybridRecord, SpeciesRecord, LINK_UNAVAILABLE};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Data rows of a listing page
pub const ROW_SELECTOR: &str = "table tbody tr";

/// Joins the parent names of a hybrid's parentage cell
pub const PARENTAGE_SEPARATOR: &str = " × ";

/// Parentage cells of synonymised grexes carry this marker
pub const SYNONYM_MARKER: &str = "Synonym of";

/// Minimum cell count of a hybrid row: name, parentage, registrant, originator, year,
/// ancestors, descendants, images
pub const HYBRID_MIN_CELLS: usize = 8;

/// Minimum cell count of a species row: binomial, author, year, subgeneric ranks,
/// distribution, descendants, photos
pub const SPECIES_MIN_CELLS: usize = 7;

/// A listing schema that can be built from one table row
pub trait RowSchema: CatalogRecord {
    const MIN_CELLS: usize;

    /// Build a record from a row with at least `MIN_CELLS` cells
    fn from_cells(cells: &[ElementRef<'_>], origin: &Url) -> Self;
}

/// Records from one page, plus how many table rows the page had
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract<R> {
    pub records: Vec<R>,
    pub rows_seen: usize,
}

impl<R> PageExtract<R> {
    /// Rows were present but none matched the schema; the markup has probably changed
    pub fn looks_malformed(&self) -> bool {
        self.rows_seen > 0 && self.records.is_empty()
    }
}

static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse(ROW_SELECTOR).unwrap());
static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static PARENT_NAMES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a, span").unwrap());

/// Extract every record on the page, in row order
pub fn extract_page<R: RowSchema>(html: &str, origin: &Url) -> PageExtract<R> {
    let document = Html::parse_document(html);

    let mut records = Vec::new();
    let mut rows_seen = 0;

    for row in document.select(&ROWS) {
        rows_seen += 1;
        let cells: Vec<ElementRef<'_>> = row.select(&CELLS).collect();
        if cells.len() < R::MIN_CELLS {
            continue;
        }
        records.push(R::from_cells(&cells, origin));
    }

    PageExtract { records, rows_seen }
}

/// Trimmed text content of an element
pub fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Name and detail link from the first cell of a row
pub fn name_and_link(cell: &ElementRef<'_>, origin: &Url) -> (String, String) {
    match cell.select(&ANCHORS).next() {
        Some(anchor) => {
            let name = cell_text(&anchor);
            let link = anchor
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(|href| resolve_link(origin, href))
                .unwrap_or_else(|| LINK_UNAVAILABLE.to_string());
            (name, link)
        }
        None => (cell_text(cell), LINK_UNAVAILABLE.to_string()),
    }
}

/// Resolve a row href against the site origin
pub fn resolve_link(origin: &Url, href: &str) -> String {
    match origin.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", origin.as_str().trim_end_matches('/'), href),
    }
}

/// Parent names of a parentage cell joined with " × ", prefixed for synonyms
pub fn parentage(cell: &ElementRef<'_>) -> String {
    let parts: Vec<String> = cell
        .select(&PARENT_NAMES)
        .map(|el| el.text().map(str::trim).collect::<String>())
        .filter(|text| !text.is_empty())
        .collect();
    let joined = parts.join(PARENTAGE_SEPARATOR);

    let raw: String = cell.text().collect();
    if raw.contains(SYNONYM_MARKER) {
        format!("{} {}", SYNONYM_MARKER, joined)
    } else {
        joined
    }
}

impl RowSchema for HybridRecord {
    const MIN_CELLS: usize = HYBRID_MIN_CELLS;

    fn from_cells(cells: &[ElementRef<'_>], origin: &Url) -> Self {
        let (name, link) = name_and_link(&cells[0], origin);
        HybridRecord {
            name,
            link,
            parentage: parentage(&cells[1]),
            registrant: cell_text(&cells[2]),
            originator: cell_text(&cells[3]),
            year: cell_text(&cells[4]),
            ancestors: cell_text(&cells[5]),
            descendants: cell_text(&cells[6]),
            images: cell_text(&cells[7]),
        }
    }
}

impl RowSchema for SpeciesRecord {
    const MIN_CELLS: usize = SPECIES_MIN_CELLS;

    fn from_cells(cells: &[ElementRef<'_>], origin: &Url) -> Self {
        let (binomial, link) = name_and_link(&cells[0], origin);
        SpeciesRecord {
            binomial,
            link,
            author: cell_text(&cells[1]),
            year: cell_text(&cells[2]),
            subgeneric_ranks: cell_text(&cells[3]),
            distribution: cell_text(&cells[4]),
            descendants: cell_text(&cells[5]),
            photos: cell_text(&cells[6]),
        }
    }
}
