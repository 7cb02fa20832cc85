#![no_main]

use arbitrary::Arbitrary;
use kicadci_domain::LayerSelectionRule;
use kicadci_edit::{SubstitutionOutcome, apply_rule};
use kicadci_types::LayerSelection;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    flags: [bool; 7],
    board: String,
}

fuzz_target!(|input: Input| {
    let [fcu, bcu, fm, bm, fs, bs, ec] = input.flags;
    let rule = LayerSelectionRule::for_selection(&LayerSelection { fcu, bcu, fm, bm, fs, bs, ec });

    let first = apply_rule(&input.board, &rule);
    if first.outcome == SubstitutionOutcome::FieldMissing {
        assert_eq!(first.text, input.board);
        return;
    }

    // A rewritten board must be stable under a second pass.
    let second = apply_rule(&first.text, &rule);
    assert_eq!(second.outcome, SubstitutionOutcome::Unchanged);
    assert_eq!(second.text, first.text);
});
