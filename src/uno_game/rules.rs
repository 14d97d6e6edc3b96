use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesVersion {
    #[default]
    Classic,
    Party,
}

/// House rule flags chosen by the host before the game starts.
///
/// The variant flags are stored and echoed back to clients but do not change
/// how a play is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub version: RulesVersion,
    pub stacking: bool,
    pub seven_o: bool,
    pub jump_in: bool,
}
