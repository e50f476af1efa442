//! Section segmentation.
//!
//! Sections are introduced by literal header tokens in the first
//! delimiter-separated field of a line. The registry below is static: it
//! lists every header spelling the source system emits per section,
//! including the twenty lab sub-panel variants.

use std::collections::BTreeMap;

use crate::delimiter::Delimiter;

/// Named regions of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Vitals,
    Respiratory,
    Lab,
    Medication,
    FluidBalance,
    AllPatientData,
}

impl Section {
    pub const ALL: [Self; 6] = [
        Self::Vitals,
        Self::Respiratory,
        Self::Lab,
        Self::Medication,
        Self::FluidBalance,
        Self::AllPatientData,
    ];

    /// Literal header tokens opening a block of this section.
    pub fn header_tokens(self) -> &'static [&'static str] {
        match self {
            Self::Vitals => &["Online erfasste Vitaldaten", "Manuell erfasste Vitaldaten"],
            Self::Respiratory => &[
                "Online erfasste Respiratorwerte",
                "Beatmung",
                "Manuell erfasste Respiratorwerte",
            ],
            Self::Lab => &[
                "Labor: Blutgase arteriell",
                "Labor: Blutgase venös",
                "Labor: Blutgase gv",
                "Labor: Blutgase unspez.",
                "Labor: Blutbild",
                "Labor: Differentialblutbild",
                "Labor: Blutgruppe",
                "Labor: Gerinnung",
                "Labor: TEG",
                "Labor: TAT",
                "Labor: Enzyme",
                "Labor: Retention",
                "Labor: Lipide",
                "Labor: Proteine",
                "Labor: Elektrolyte",
                "Labor: Blutzucker",
                "Labor: Klinische Chemie",
                "Labor: Medikamentenspiegel",
                "Labor: Schilddrüse",
                "Labor: Serologie/Infektion",
            ],
            Self::Medication => &["Medikamentengaben"],
            Self::FluidBalance => &["Bilanz"],
            Self::AllPatientData => &["ALLE Patientendaten"],
        }
    }

    fn owning(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.header_tokens().contains(&token))
    }
}

/// Raw block text per section, keyed by the header token that opened it.
///
/// A token recurring within one file (the same table printed for several
/// time windows) keeps a single key with the block texts concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionBlocks {
    blocks: BTreeMap<Section, BTreeMap<String, String>>,
}

impl SectionBlocks {
    /// `(header token, block text)` pairs of one section.
    pub fn blocks(&self, section: Section) -> impl Iterator<Item = (&str, &str)> {
        self.blocks
            .get(&section)
            .into_iter()
            .flat_map(|tokens| tokens.iter().map(|(token, text)| (token.as_str(), text.as_str())))
    }

    /// The concatenated text of a single-token section such as
    /// `Medikamentengaben`.
    pub fn single(&self, section: Section) -> Option<&str> {
        self.blocks(section).next().map(|(_, text)| text)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.values().all(BTreeMap::is_empty)
    }

    fn push(&mut self, section: Section, token: &str, text: String) {
        if text.is_empty() {
            return;
        }
        self.blocks
            .entry(section)
            .or_default()
            .entry(token.to_string())
            .and_modify(|existing| {
                existing.push('\n');
                existing.push_str(&text);
            })
            .or_insert(text);
    }
}

/// Split the cleaned export into section blocks.
///
/// Unrecognized content before the first header token is discarded; inside
/// a block every line is kept verbatim.
pub fn split_blocks(cleaned: &str, delimiter: Delimiter) -> SectionBlocks {
    let mut result = SectionBlocks::default();
    let mut current: Option<(Section, &str)> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in cleaned.lines() {
        let key = line
            .split(delimiter.as_char())
            .next()
            .unwrap_or_default()
            .trim();
        if let Some(section) = Section::owning(key) {
            if let Some((previous_section, previous_token)) = current {
                result.push(
                    previous_section,
                    previous_token,
                    buffer.join("\n").trim().to_string(),
                );
            }
            current = Some((section, key));
            buffer.clear();
        } else {
            buffer.push(line);
        }
    }
    if let Some((section, token)) = current {
        result.push(section, token, buffer.join("\n").trim().to_string());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_content_is_discarded() {
        let text = "noise;1\nmore noise;2\nBilanz;;\nrow;1";
        let blocks = split_blocks(text, Delimiter::Semicolon);
        assert_eq!(blocks.single(Section::FluidBalance), Some("row;1"));
        assert_eq!(blocks.blocks(Section::Vitals).count(), 0);
    }

    #[test]
    fn header_token_is_matched_on_the_first_field_only() {
        let text = "Bilanz;;\nrow mentioning Medikamentengaben;1";
        let blocks = split_blocks(text, Delimiter::Semicolon);
        assert!(blocks.single(Section::Medication).is_none());
        assert_eq!(
            blocks.single(Section::FluidBalance),
            Some("row mentioning Medikamentengaben;1")
        );
    }

    #[test]
    fn repeated_header_blocks_are_concatenated() {
        let text = "Labor: Enzyme;;\nfirst;1\nOnline erfasste Vitaldaten;;\nvitals;1\nLabor: Enzyme;;\nsecond;2";
        let blocks = split_blocks(text, Delimiter::Semicolon);
        let lab: Vec<(&str, &str)> = blocks.blocks(Section::Lab).collect();
        assert_eq!(lab, vec![("Labor: Enzyme", "first;1\nsecond;2")]);
    }

    #[test]
    fn pipe_delimited_headers_are_recognized() {
        let text = "ALLE Patientendaten|x|y\n|row|1";
        let blocks = split_blocks(text, Delimiter::Pipe);
        assert_eq!(blocks.single(Section::AllPatientData), Some("|row|1"));
    }
}
