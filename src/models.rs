use serde::{Deserialize, Serialize};
use std::fmt;

/// Written in place of a detail link when the listing row has none
pub const LINK_UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Hybrid,
    Species,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Hybrid => write!(f, "hybrid"),
            RecordKind::Species => write!(f, "species"),
        }
    }
}

/// One row of the hybrid (grex) listing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HybridRecord {
    pub name: String,
    pub link: String,
    pub parentage: String,
    pub registrant: String,
    pub originator: String,
    pub year: String,
    pub ancestors: String,
    pub descendants: String,
    /// Raw listing text; see [`CatalogRecord::image_count`]
    pub images: String,
}

/// One row of the species listing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SpeciesRecord {
    pub binomial: String,
    pub link: String,
    pub author: String,
    pub year: String,
    pub subgeneric_ranks: String,
    pub distribution: String,
    pub descendants: String,
    pub photos: String,
}

/// Behaviour shared by both listing schemas: identity, image count and CSV layout
pub trait CatalogRecord: Clone {
    const KIND: RecordKind;

    /// Column headers, in field order
    const CSV_HEADERS: &'static [&'static str];

    fn name(&self) -> &str;

    fn link(&self) -> &str;

    fn image_count_raw(&self) -> &str;

    fn csv_row(&self) -> Vec<String>;

    /// The listing's image count; anything that is not a plain non-negative integer counts as 0
    fn image_count(&self) -> u32 {
        parse_count(self.image_count_raw())
    }

    fn has_link(&self) -> bool {
        self.link() != LINK_UNAVAILABLE
    }
}

pub fn parse_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return 0;
    }
    trimmed.parse().unwrap_or(0)
}

impl CatalogRecord for HybridRecord {
    const KIND: RecordKind = RecordKind::Hybrid;
    const CSV_HEADERS: &'static [&'static str] = &[
        "Grex Name",
        "Grex Link",
        "Parentage",
        "Registrant",
        "Originator",
        "Year",
        "Ancestors",
        "Descendants",
        "Images",
    ];

    fn name(&self) -> &str {
        &self.name
    }

    fn link(&self) -> &str {
        &self.link
    }

    fn image_count_raw(&self) -> &str {
        &self.images
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.link.clone(),
            self.parentage.clone(),
            self.registrant.clone(),
            self.originator.clone(),
            self.year.clone(),
            self.ancestors.clone(),
            self.descendants.clone(),
            self.images.clone(),
        ]
    }
}

impl CatalogRecord for SpeciesRecord {
    const KIND: RecordKind = RecordKind::Species;
    const CSV_HEADERS: &'static [&'static str] = &[
        "Binomial",
        "Species Link",
        "Author",
        "Year",
        "Subgeneric Ranks",
        "Distribution",
        "# Descendants",
        "# Photos",
    ];

    fn name(&self) -> &str {
        &self.binomial
    }

    fn link(&self) -> &str {
        &self.link
    }

    fn image_count_raw(&self) -> &str {
        &self.photos
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.binomial.clone(),
            self.link.clone(),
            self.author.clone(),
            self.year.clone(),
            self.subgeneric_ranks.clone(),
            self.distribution.clone(),
            self.descendants.clone(),
            self.photos.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(photos: &str, link: &str) -> SpeciesRecord {
        SpeciesRecord {
            binomial: "Cattleya labiata".to_string(),
            link: link.to_string(),
            author: "Lindl.".to_string(),
            year: "1821".to_string(),
            subgeneric_ranks: "Cattleya".to_string(),
            distribution: "Brazil".to_string(),
            descendants: "2000".to_string(),
            photos: photos.to_string(),
        }
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count(" 7 "), 7);
        assert_eq!(parse_count("0"), 0);
        assert_eq!(parse_count("N/A"), 0);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count("1,200"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn test_unavailable_link() {
        assert!(!species("3", LINK_UNAVAILABLE).has_link());
        assert!(species("3", "https://www.orchidroots.com/x/").has_link());
    }

    #[test]
    fn test_csv_rows_match_headers() {
        let s = species("3", LINK_UNAVAILABLE);
        assert_eq!(s.csv_row().len(), SpeciesRecord::CSV_HEADERS.len());
        assert_eq!(s.image_count(), 3);

        let h = HybridRecord {
            name: "Cattleya Bow Bells".to_string(),
            link: LINK_UNAVAILABLE.to_string(),
            parentage: "C. Edithiae × C. Suzanne Hye".to_string(),
            registrant: "Black & Flory".to_string(),
            originator: String::new(),
            year: "1945".to_string(),
            ancestors: "12".to_string(),
            descendants: "450".to_string(),
            images: "N/A".to_string(),
        };
        assert_eq!(h.csv_row().len(), HybridRecord::CSV_HEADERS.len());
        assert_eq!(h.image_count(), 0);
        assert_eq!(HybridRecord::KIND.to_string(), "hybrid");
    }
}
