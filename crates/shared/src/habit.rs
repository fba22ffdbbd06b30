use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::{Collection, TypedDocument};

#[derive(
    Serialize,
    Deserialize,
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HabitMode {
    #[default]
    Checkbox,
    Quantifiable,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    #[serde(skip)]
    pub id: String,
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub mode: HabitMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frequency: Vec<u8>,
    #[serde(default)]
    pub created_at: i64,
}

impl Habit {
    /// Target used by the log mutator; a habit without one completes on any logged amount.
    pub fn target(&self) -> f64 {
        self.daily_target.unwrap_or(0.0)
    }
}

impl TypedDocument for Habit {
    const COLLECTION: Collection = Collection::Habits;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct HabitLog {
    pub completed: bool,
    #[serde(default)]
    pub value: f64,
}

impl HabitLog {
    /// Counts towards a fully completed day.
    pub fn is_done(&self) -> bool {
        self.completed || self.value > 0.0
    }
}
