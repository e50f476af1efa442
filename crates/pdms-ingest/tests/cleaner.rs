//! Property test: report cleaning is idempotent on arbitrary line soups.

use pdms_ingest::clean_report;
use proptest::prelude::*;

/// Lines drawn from the shapes that actually occur in exports: data rows,
/// banners, disclaimers, interval notices and free text.
fn arbitrary_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ;|.,:/-]{0,40}",
        Just("Ausdruck: Gesamte Akte;;".to_string()),
        Just("Bei aktuell laufenden Statusmodulen gilt;".to_string()),
        Just("Datum/Uhrzeit bezieht sich jeweils auf den Intervallstart.;".to_string()),
        Just("Intervall: 15 min.,".to_string()),
        Just("caption;Datum/Uhrzeit".to_string()),
    ]
}

proptest! {
    #[test]
    fn cleaning_twice_equals_cleaning_once(lines in prop::collection::vec(arbitrary_line(), 0..60)) {
        let raw = lines.join("\n");
        let once = clean_report(&raw);
        let twice = clean_report(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn surviving_lines_keep_their_order(lines in prop::collection::vec("[a-z ;]{0,20}", 0..30)) {
        let raw = lines.join("\n");
        let cleaned = clean_report(&raw);
        // Without any marker lines, cleaning must be the identity.
        prop_assert_eq!(cleaned, raw);
    }
}
