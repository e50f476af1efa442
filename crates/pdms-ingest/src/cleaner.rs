//! Report cleaning.
//!
//! The export interleaves the clinical data with print artifacts: every
//! reprint repeats an eight-line masthead, disclaimer lines float between
//! sections, and sampling-interval notices annotate some tables. All of
//! them are identified by content, which makes cleaning idempotent:
//! `clean_report(clean_report(x)) == clean_report(x)`.

use regex::Regex;
use std::sync::LazyLock;

/// Line marking the start of a reprinted report masthead.
const BANNER_MARKER: &str = "Ausdruck: Gesamte Akte";

/// Masthead length counted from the banner line itself.
const BANNER_BLOCK_LEN: usize = 8;

/// Standalone disclaimer lines dropped wherever they appear.
const DISCLAIMER_MARKERS: [&str; 2] = [
    "Bei aktuell laufenden Statusmodulen",
    "Datum/Uhrzeit bezieht sich jeweils auf den Intervallstart.",
];

/// The interval-start disclaimer is preceded by a caption line that has to
/// go with it.
const LEADING_CAPTION_MARKER: &str = "Datum/Uhrzeit";

static INTERVAL_NOTICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Intervall:\s*\d+\s*min").expect("interval notice pattern")
});

/// Strip mastheads, disclaimers and interval notices, preserving the order
/// of all surviving lines.
pub fn clean_report(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let mut skip = vec![false; lines.len()];
    let mut banners = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let stripped = line.trim_start();
        if stripped.contains(BANNER_MARKER) {
            banners.push(index);
        } else if let Some(marker) = DISCLAIMER_MARKERS
            .iter()
            .find(|marker| stripped.contains(*marker))
        {
            skip[index] = true;
            if marker.starts_with(LEADING_CAPTION_MARKER) && index > 0 {
                skip[index - 1] = true;
            }
        } else if INTERVAL_NOTICE.is_match(stripped) {
            skip[index] = true;
        }
    }

    for (occurrence, &banner) in banners.iter().enumerate() {
        let end = (banner + BANNER_BLOCK_LEN).min(lines.len());
        for entry in skip.iter_mut().take(end).skip(banner) {
            *entry = true;
        }
        // Reprints after the first are preceded by a page-break line.
        if occurrence > 0 && banner > 0 {
            skip[banner - 1] = true;
        }
    }

    let surviving: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(index, _)| !skip[*index])
        .map(|(_, line)| *line)
        .collect();
    surviving.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_masthead_block() {
        let raw = "Ausdruck: Gesamte Akte;;\nKlinik;;\nStation;;\nPat;;\nFall;;\nvon;;\nbis;;\nSeite;;\ndata line;1";
        assert_eq!(clean_report(raw), "data line;1");
    }

    #[test]
    fn strips_page_break_before_reprinted_masthead() {
        let mut lines = vec!["keep;1"];
        lines.push("Ausdruck: Gesamte Akte;;");
        lines.extend(["m1", "m2", "m3", "m4", "m5", "m6", "m7"]);
        lines.push("kept between;2");
        lines.push("page break");
        lines.push("Ausdruck: Gesamte Akte;;");
        lines.extend(["m1", "m2", "m3", "m4", "m5", "m6", "m7"]);
        lines.push("kept after;3");
        let cleaned = clean_report(&lines.join("\n"));
        assert_eq!(cleaned, "keep;1\nkept between;2\nkept after;3");
    }

    #[test]
    fn strips_interval_notice_and_disclaimers() {
        let raw = "keep;1\nIntervall: 15 min.,\nBei aktuell laufenden Statusmodulen gilt;\nkeep;2";
        assert_eq!(clean_report(raw), "keep;1\nkeep;2");
    }

    #[test]
    fn interval_start_disclaimer_takes_its_caption_line() {
        let raw = "keep;1\ncaption;\nDatum/Uhrzeit bezieht sich jeweils auf den Intervallstart.;\nkeep;2";
        assert_eq!(clean_report(raw), "keep;1\nkeep;2");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let raw = "a;1\nAusdruck: Gesamte Akte;;\nm1\nm2\nm3\nm4\nm5\nm6\nIntervall: 30 min.\nb;2";
        let once = clean_report(raw);
        assert_eq!(clean_report(&once), once);
    }
}
