use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_derive::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Species {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Common_name")]
    pub common_name: String,
}

/// Species codes and common names, in file order.
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalogue {
    species: Vec<Species>,
}

const CODE_COLUMN_WIDTH: usize = 9;

impl SpeciesCatalogue {
    pub fn new(species: Vec<Species>) -> Self {
        SpeciesCatalogue { species }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening species table {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("reading {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut species = Vec::new();
        for row in csv::Reader::from_reader(reader).deserialize() {
            let row: Species = row?;
            species.push(Species {
                code: row.code.trim().to_owned(),
                common_name: row.common_name.trim().to_owned(),
            });
        }
        tracing::debug!("{} species in catalogue", species.len());
        Ok(SpeciesCatalogue { species })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.species.iter().map(|s| s.code.as_str())
    }

    pub fn common_name(&self, code: &str) -> Option<&str> {
        self.species
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.common_name.as_str())
    }

    /// Common name when known, the code otherwise.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.common_name(code).unwrap_or(code)
    }

    /// The `list` answer of the species prompt.
    pub fn listing(&self) -> String {
        let mut out = String::from("Code:    Species:\n");
        for species in &self.species {
            out.push_str(&format!(
                "{:<width$}{}\n",
                species.code,
                species.common_name,
                width = CODE_COLUMN_WIDTH
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "Code,Common_name,Group\nkiwbro,North Island brown kiwi,ratite\nkea,Kea,parrot\n";

    #[test]
    fn reads_codes_and_names_in_order() {
        let catalogue = SpeciesCatalogue::from_reader(TABLE.as_bytes()).unwrap();

        assert_eq!(catalogue.codes().collect::<Vec<_>>(), ["kiwbro", "kea"]);
        assert_eq!(catalogue.common_name("kea"), Some("Kea"));
        assert_eq!(catalogue.display_name("tui"), "tui");
    }

    #[test]
    fn listing_pads_codes() {
        let catalogue = SpeciesCatalogue::from_reader(TABLE.as_bytes()).unwrap();

        assert_eq!(
            catalogue.listing(),
            "Code:    Species:\nkiwbro   North Island brown kiwi\nkea      Kea\n"
        );
    }
}
