use crate::error::ConfigurationError;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Enterprise client embedded in generated documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub code: String,
    pub name: String,
}

/// The KiCad project being exported.
///
/// `name` is the file stem of `<name>.kicad_pcb` and the positional argument
/// handed to every exporter that takes one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub code: String,
    pub name: String,
}

/// Board layers to include in a gerber export.
///
/// Deserializes from a map only. Keys match case-insensitively, the last of
/// duplicate keys wins, unknown keys are ignored and missing or `null` values
/// leave the layer off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct LayerSelection {
    /// Front copper.
    pub fcu: bool,
    /// Back copper.
    pub bcu: bool,
    /// Front solder mask.
    pub fm: bool,
    /// Back solder mask.
    pub bm: bool,
    /// Front silkscreen.
    pub fs: bool,
    /// Back silkscreen.
    pub bs: bool,
    /// Edge cuts. Accepted, but not wired to any bit yet.
    pub ec: bool,
}

impl LayerSelection {
    fn layer_mut(&mut self, key: &str) -> Option<&mut bool> {
        let slot = match key.to_ascii_lowercase().as_str() {
            "fcu" => &mut self.fcu,
            "bcu" => &mut self.bcu,
            "fm" => &mut self.fm,
            "bm" => &mut self.bm,
            "fs" => &mut self.fs,
            "bs" => &mut self.bs,
            "ec" => &mut self.ec,
            _ => return None,
        };
        Some(slot)
    }

    /// Parse the structured layer specification.
    ///
    /// A JSON `null` is treated as an empty selection.
    pub fn parse(input: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str::<Option<LayerSelection>>(input)
            .map(Option::unwrap_or_default)
            .map_err(|source| ConfigurationError::InvalidGerberLayers {
                input: input.to_string(),
                source,
            })
    }
}

struct LayerSelectionVisitor;

impl<'de> Visitor<'de> for LayerSelectionVisitor {
    type Value = LayerSelection;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of layer names to booleans")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut selection = LayerSelection::default();
        while let Some(key) = map.next_key::<String>()? {
            match selection.layer_mut(&key) {
                Some(slot) => {
                    if let Some(on) = map.next_value::<Option<bool>>()? {
                        *slot = on;
                    }
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(selection)
    }
}

impl<'de> Deserialize<'de> for LayerSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(LayerSelectionVisitor)
    }
}

/// Which artifacts a run should produce.
///
/// Gerber generation is requested exactly when `gerber` is `Some`; the layer
/// selection is unreachable otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedArtifacts {
    pub schematic: bool,
    pub bom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gerber: Option<LayerSelection>,
}

impl RequestedArtifacts {
    pub fn gerber_requested(&self) -> bool {
        self.gerber.is_some()
    }

    /// Layers to export, or `None` when gerber generation is not requested.
    pub fn layers(&self) -> Option<&LayerSelection> {
        self.gerber.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        !self.schematic && !self.bom && self.gerber.is_none()
    }
}

/// Aggregate root for a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub client: Client,
    pub project: Project,
    pub artifacts: RequestedArtifacts,
}

impl BuildRequest {
    /// Build a request from raw plugin inputs.
    ///
    /// `gerber` carries the layer specification text when it was supplied at
    /// all; its presence alone requests gerber generation.
    pub fn from_inputs(
        client: Client,
        project: Project,
        schematic: bool,
        bom: bool,
        gerber: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let gerber = gerber.map(LayerSelection::parse).transpose()?;
        Ok(Self {
            client,
            project,
            artifacts: RequestedArtifacts {
                schematic,
                bom,
                gerber,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project(name: &str) -> Project {
        Project {
            code: "P-001".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn parse_reads_recognized_keys() {
        let sel = LayerSelection::parse(
            r#"{"fcu":true,"bcu":false,"fm":false,"bm":false,"fs":true,"bs":false,"ec":true}"#,
        )
        .unwrap();
        assert_eq!(
            sel,
            LayerSelection {
                fcu: true,
                fs: true,
                ec: true,
                ..LayerSelection::default()
            }
        );
    }

    #[test]
    fn parse_ignores_unknown_and_defaults_missing() {
        let sel = LayerSelection::parse(r#"{"bm":true,"paste":true}"#).unwrap();
        assert_eq!(
            sel,
            LayerSelection {
                bm: true,
                ..LayerSelection::default()
            }
        );
    }

    #[test]
    fn parse_null_is_empty_selection() {
        assert_eq!(LayerSelection::parse("null").unwrap(), LayerSelection::default());
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in [
            "",
            "{",
            "fcu=true",
            "[true]",
            "[]",
            "[true,false,false,false,true]",
            "true",
            r#""fcu""#,
            r#"{"fcu":"yes"}"#,
            r#"{"fcu":1}"#,
        ] {
            let err = LayerSelection::parse(input).unwrap_err();
            let ConfigurationError::InvalidGerberLayers { input: got, .. } = err;
            assert_eq!(got, input);
        }
    }

    #[test]
    fn parse_matches_keys_case_insensitively() {
        let sel = LayerSelection::parse(r#"{"FCU":true,"Bs":true}"#).unwrap();
        assert_eq!(
            sel,
            LayerSelection {
                fcu: true,
                bs: true,
                ..LayerSelection::default()
            }
        );
    }

    #[test]
    fn parse_keeps_last_duplicate_key() {
        let sel = LayerSelection::parse(r#"{"fcu":true,"fcu":false,"fs":false,"FS":true}"#).unwrap();
        assert_eq!(
            sel,
            LayerSelection {
                fs: true,
                ..LayerSelection::default()
            }
        );
    }

    #[test]
    fn parse_null_layer_value_leaves_layer_off() {
        let sel = LayerSelection::parse(r#"{"fcu":null,"bcu":true}"#).unwrap();
        assert_eq!(
            sel,
            LayerSelection {
                bcu: true,
                ..LayerSelection::default()
            }
        );
    }

    #[test]
    fn request_round_trips_through_json() {
        let req = BuildRequest::from_inputs(
            Client::default(),
            project("boardA"),
            false,
            true,
            Some(r#"{"fcu":true}"#),
        )
        .unwrap();
        let json = serde_json::to_string(&req).unwrap();
        let back: BuildRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn from_inputs_without_gerber_skips_parsing() {
        let req = BuildRequest::from_inputs(
            Client::default(),
            project("boardA"),
            true,
            false,
            None,
        )
        .unwrap();
        assert!(req.artifacts.schematic);
        assert!(!req.artifacts.gerber_requested());
        assert!(req.artifacts.layers().is_none());
    }

    #[test]
    fn from_inputs_with_gerber_requests_generation() {
        let req = BuildRequest::from_inputs(
            Client::default(),
            project("boardA"),
            false,
            false,
            Some("{}"),
        )
        .unwrap();
        assert!(req.artifacts.gerber_requested());
        assert_eq!(req.artifacts.layers(), Some(&LayerSelection::default()));
        assert!(!req.artifacts.is_empty());
    }

    #[test]
    fn from_inputs_propagates_configuration_error() {
        let res = BuildRequest::from_inputs(
            Client::default(),
            project("boardA"),
            true,
            true,
            Some("not json"),
        );
        assert!(matches!(
            res,
            Err(ConfigurationError::InvalidGerberLayers { .. })
        ));
    }

    #[test]
    fn default_artifacts_are_empty() {
        assert!(RequestedArtifacts::default().is_empty());
    }
}
