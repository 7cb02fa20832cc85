//! Packing of [`LayerSelection`] flags into KiCad's `layerselection` field.
//!
//! The field is a 64-bit mask written as two 32-bit words, high word first:
//! `0xHHHHHHHH_0xHHHHHHHH`. Bit positions come from [`Layer::position`]; which
//! plugin flag sets which layer comes from [`WIRED_FLAGS`]. The two tables are
//! deliberately separate: most positions are known but not yet reachable from
//! any flag.

use camino::Utf8PathBuf;
use kicadci_types::{LayerSelection, Project};
use std::fmt;

/// Name of the board-file field rewritten by the gerber pipeline.
pub const LAYER_SELECTION_FIELD: &str = "layerselection";

/// Extension of KiCad board files.
pub const BOARD_FILE_EXTENSION: &str = "kicad_pcb";

/// Which half of the packed mask a layer lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Word {
    High,
    Low,
}

/// Physical board layers with a fixed bit in the `layerselection` mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    FrontCopper,
    BackCopper,
    BackAdhesive,
    FrontAdhesive,
    BackPaste,
    FrontPaste,
    BackSilkscreen,
    FrontSilkscreen,
    BackMask,
    FrontMask,
    UserDrawings,
    UserComments,
    Eco1,
    Eco2,
    EdgeCuts,
    Margin,
    BackCourtyard,
    FrontCourtyard,
    BackFab,
    FrontFab,
}

impl Layer {
    pub const ALL: [Layer; 20] = [
        Layer::FrontCopper,
        Layer::BackCopper,
        Layer::BackAdhesive,
        Layer::FrontAdhesive,
        Layer::BackPaste,
        Layer::FrontPaste,
        Layer::BackSilkscreen,
        Layer::FrontSilkscreen,
        Layer::BackMask,
        Layer::FrontMask,
        Layer::UserDrawings,
        Layer::UserComments,
        Layer::Eco1,
        Layer::Eco2,
        Layer::EdgeCuts,
        Layer::Margin,
        Layer::BackCourtyard,
        Layer::FrontCourtyard,
        Layer::BackFab,
        Layer::FrontFab,
    ];

    /// Word and bit index of this layer. Assigned once, never reused.
    pub const fn position(self) -> (Word, u32) {
        match self {
            Layer::FrontCopper => (Word::Low, 3),
            Layer::BackCopper => (Word::Low, 31),

            Layer::BackAdhesive => (Word::High, 0),
            Layer::FrontAdhesive => (Word::High, 1),
            Layer::BackPaste => (Word::High, 2),
            Layer::FrontPaste => (Word::High, 3),
            Layer::BackSilkscreen => (Word::High, 4),
            Layer::FrontSilkscreen => (Word::High, 5),
            Layer::BackMask => (Word::High, 6),
            Layer::FrontMask => (Word::High, 7),
            Layer::UserDrawings => (Word::High, 8),
            Layer::UserComments => (Word::High, 9),
            Layer::Eco1 => (Word::High, 10),
            Layer::Eco2 => (Word::High, 11),
            Layer::EdgeCuts => (Word::High, 12),
            Layer::Margin => (Word::High, 13),
            Layer::BackCourtyard => (Word::High, 14),
            Layer::FrontCourtyard => (Word::High, 15),
            Layer::BackFab => (Word::High, 16),
            Layer::FrontFab => (Word::High, 17),
        }
    }
}

/// Input flags of [`LayerSelection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    Fcu,
    Bcu,
    Fm,
    Bm,
    Fs,
    Bs,
    Ec,
}

impl Flag {
    pub const ALL: [Flag; 7] = [
        Flag::Fcu,
        Flag::Bcu,
        Flag::Fm,
        Flag::Bm,
        Flag::Fs,
        Flag::Bs,
        Flag::Ec,
    ];

    pub fn is_set(self, selection: &LayerSelection) -> bool {
        match self {
            Flag::Fcu => selection.fcu,
            Flag::Bcu => selection.bcu,
            Flag::Fm => selection.fm,
            Flag::Bm => selection.bm,
            Flag::Fs => selection.fs,
            Flag::Bs => selection.bs,
            Flag::Ec => selection.ec,
        }
    }

    /// Layer driven by this flag, if it is wired to one.
    pub fn layer(self) -> Option<Layer> {
        WIRED_FLAGS
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, layer)| *layer)
    }
}

/// Flags that currently drive a layer bit.
///
/// `Flag::Ec` is absent: edge cuts is accepted as input but has no effect.
pub const WIRED_FLAGS: [(Flag, Layer); 6] = [
    (Flag::Fcu, Layer::FrontCopper),
    (Flag::Bcu, Layer::BackCopper),
    (Flag::Fs, Layer::FrontSilkscreen),
    (Flag::Bs, Layer::BackSilkscreen),
    (Flag::Fm, Layer::FrontMask),
    (Flag::Bm, Layer::BackMask),
];

/// Packed two-word layer mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerMask {
    pub high: u32,
    pub low: u32,
}

impl LayerMask {
    pub fn encode(selection: &LayerSelection) -> Self {
        WIRED_FLAGS
            .iter()
            .filter(|(flag, _)| flag.is_set(selection))
            .fold(LayerMask::default(), |mask, (_, layer)| mask.with(*layer))
    }

    /// Copy of this mask with `layer`'s bit set.
    pub fn with(self, layer: Layer) -> Self {
        let (word, bit) = layer.position();
        match word {
            Word::High => Self {
                high: self.high | (1 << bit),
                ..self
            },
            Word::Low => Self {
                low: self.low | (1 << bit),
                ..self
            },
        }
    }

    pub fn contains(&self, layer: Layer) -> bool {
        let (word, bit) = layer.position();
        let w = match word {
            Word::High => self.high,
            Word::Low => self.low,
        };
        w & (1 << bit) != 0
    }

    /// Both words as one 64-bit value, high word in the upper half.
    pub fn as_u64(&self) -> u64 {
        (u64::from(self.high) << 32) | u64::from(self.low)
    }
}

impl fmt::Display for LayerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}_0x{:08x}", self.high, self.low)
    }
}

/// Rewrite directive for the single `layerselection` line of a board file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSelectionRule {
    pub field: &'static str,
    pub value: String,
}

impl LayerSelectionRule {
    pub fn for_selection(selection: &LayerSelection) -> Self {
        Self {
            field: LAYER_SELECTION_FIELD,
            value: LayerMask::encode(selection).to_string(),
        }
    }
}

/// Board file of `project`, relative to the project directory.
pub fn board_file(project: &Project) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{}.{}", project.name, BOARD_FILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn empty_selection_encodes_to_zero() {
        let mask = LayerMask::encode(&LayerSelection::default());
        assert_eq!(mask, LayerMask::default());
        assert_eq!(mask.to_string(), "0x00000000_0x00000000");
    }

    #[test]
    fn front_copper_and_front_silkscreen() {
        let sel = LayerSelection {
            fcu: true,
            fs: true,
            ec: true,
            ..LayerSelection::default()
        };
        assert_eq!(LayerMask::encode(&sel).to_string(), "0x00000020_0x00000008");
    }

    #[test]
    fn every_wired_flag_sets_its_bit() {
        let all = LayerSelection {
            fcu: true,
            bcu: true,
            fm: true,
            bm: true,
            fs: true,
            bs: true,
            ec: true,
        };
        let mask = LayerMask::encode(&all);
        assert_eq!(mask.low, 0x8000_0008);
        assert_eq!(mask.high, 0x0000_00f0);
        assert_eq!(mask.to_string(), "0x000000f0_0x80000008");
    }

    #[test]
    fn edge_cuts_flag_is_inert() {
        let sel = LayerSelection {
            ec: true,
            ..LayerSelection::default()
        };
        let mask = LayerMask::encode(&sel);
        assert_eq!(mask, LayerMask::default());
        assert!(!mask.contains(Layer::EdgeCuts));
        assert_eq!(Flag::Ec.layer(), None);
    }

    #[test]
    fn positions_are_unique() {
        let mut seen = BTreeSet::new();
        for layer in Layer::ALL {
            let (word, bit) = layer.position();
            assert!(bit < 32, "{layer:?} out of range");
            let key = (matches!(word, Word::High), bit);
            assert!(seen.insert(key), "{layer:?} reuses {key:?}");
        }
    }

    #[test]
    fn wired_layers_are_distinct() {
        let layers: BTreeSet<Layer> = WIRED_FLAGS.iter().map(|(_, l)| *l).collect();
        assert_eq!(layers.len(), WIRED_FLAGS.len());
    }

    #[test]
    fn as_u64_places_high_word_on_top() {
        let mask = LayerMask::default()
            .with(Layer::FrontMask)
            .with(Layer::FrontCopper);
        assert_eq!(mask.as_u64(), (0x80u64 << 32) | 0x8);
    }

    #[test]
    fn rule_carries_field_and_encoded_value() {
        let rule = LayerSelectionRule::for_selection(&LayerSelection {
            bcu: true,
            ..LayerSelection::default()
        });
        assert_eq!(rule.field, "layerselection");
        assert_eq!(rule.value, "0x00000000_0x80000000");
    }

    #[test]
    fn board_file_uses_project_name() {
        let project = Project {
            code: "X".to_string(),
            name: "boardA".to_string(),
        };
        assert_eq!(board_file(&project), Utf8PathBuf::from("boardA.kicad_pcb"));
    }
}
