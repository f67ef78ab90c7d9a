//! Category-driven style policy
//!
//! The only visual branching in the viewer: coarse-grained structures are
//! drawn as spheres joined by thick sticks, everything else as a cartoon
//! ribbon with thin sticks on top.

use crate::types::MoleculeType;
use serde::Serialize;
use serde_json::{Map, Value};

/// One representation inside a style, serialized the way 3Dmol.js expects
/// (`{"sphere": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    Sphere { scale: f64, colorscheme: String },
    Stick { radius: f64, colorscheme: String },
    Cartoon { color: String },
}

/// A set of representations applied to all atoms together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub representations: Vec<Representation>,
}

impl Style {
    pub fn new(representations: Vec<Representation>) -> Self {
        Self { representations }
    }

    /// Merge the representations into a single style object.
    pub fn to_json(&self) -> Value {
        let mut merged = Map::new();
        for representation in &self.representations {
            if let Ok(Value::Object(fields)) = serde_json::to_value(representation) {
                merged.extend(fields);
            }
        }
        Value::Object(merged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    /// Spheres plus thick connecting sticks.
    SphereThickStick,
    /// Cartoon ribbon plus thin sticks.
    RibbonThinStick,
}

/// Styles to apply after a model is loaded: `base` replaces any existing
/// style, `overlay` is added on top of it.
#[derive(Debug, Clone, PartialEq)]
pub struct StylePlan {
    pub kind: StyleKind,
    pub base: Style,
    pub overlay: Option<Style>,
}

impl StylePlan {
    /// Pure and total; an absent category gets the atomistic policy.
    pub fn for_category(category: Option<MoleculeType>) -> Self {
        match category {
            Some(MoleculeType::CoarseGrained) => Self {
                kind: StyleKind::SphereThickStick,
                base: Style::new(vec![
                    Representation::Sphere {
                        scale: 1.0,
                        colorscheme: "chainHetatm".to_string(),
                    },
                    Representation::Stick {
                        radius: 0.4,
                        colorscheme: "chainHetatm".to_string(),
                    },
                ]),
                overlay: None,
            },
            Some(MoleculeType::Atomistic) | Some(MoleculeType::Backmapped) | None => Self {
                kind: StyleKind::RibbonThinStick,
                base: Style::new(vec![Representation::Cartoon {
                    color: "spectrum".to_string(),
                }]),
                overlay: Some(Style::new(vec![Representation::Stick {
                    radius: 0.1,
                    colorscheme: "default".to_string(),
                }])),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Some(MoleculeType::CoarseGrained), StyleKind::SphereThickStick)]
    #[case(Some(MoleculeType::Atomistic), StyleKind::RibbonThinStick)]
    #[case(Some(MoleculeType::Backmapped), StyleKind::RibbonThinStick)]
    #[case(None, StyleKind::RibbonThinStick)]
    fn test_category_mapping(#[case] category: Option<MoleculeType>, #[case] expected: StyleKind) {
        let plan = StylePlan::for_category(category);
        assert_eq!(plan.kind, expected);
        // Deterministic across calls
        assert_eq!(plan, StylePlan::for_category(category));
    }

    #[test]
    fn test_coarse_grained_style_json() {
        let plan = StylePlan::for_category(Some(MoleculeType::CoarseGrained));
        assert_eq!(
            plan.base.to_json(),
            json!({
                "sphere": {"scale": 1.0, "colorscheme": "chainHetatm"},
                "stick": {"radius": 0.4, "colorscheme": "chainHetatm"}
            })
        );
        assert!(plan.overlay.is_none());
    }

    #[test]
    fn test_atomistic_style_json() {
        let plan = StylePlan::for_category(Some(MoleculeType::Atomistic));
        assert_eq!(plan.base.to_json(), json!({"cartoon": {"color": "spectrum"}}));
        let overlay = plan.overlay.expect("atomistic has a stick overlay");
        let stick = &overlay.to_json()["stick"];
        assert_eq!(stick["colorscheme"], "default");
        assert_eq!(stick["radius"], json!(0.1));
    }
}
