#![no_main]

use kicadci_domain::LayerMask;
use kicadci_types::LayerSelection;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else { return };

    // Parsing may reject input but must never panic; accepted input must encode.
    if let Ok(selection) = LayerSelection::parse(s) {
        let value = LayerMask::encode(&selection).to_string();
        assert_eq!(value.len(), 21);
    }
});
