use std::{collections::BTreeMap, fmt::Debug};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Collection, Document, Fields, HabitLog, document};

/// Id carried by an annual draft that has not been written yet.
pub const UNSAVED_ID: &str = "unsaved";
/// Id carried by a locked placeholder for a past week or month.
pub const READ_ONLY_ID: &str = "read-only";

/// A typed document living in one collection. The id is assigned by the store
/// and never serialized into the document body.
pub trait TypedDocument:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static
{
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn from_document(doc: Document) -> crate::Result<Self> {
        let mut value: Self = serde_json::from_value(Value::Object(doc.fields))?;
        value.set_id(doc.id);

        Ok(value)
    }

    fn to_fields(&self) -> crate::Result<Fields> {
        document::to_fields(self)
    }

    /// Applies a partial (possibly dotted) update locally.
    fn merge_fields(&mut self, fields: &Fields) -> crate::Result<()> {
        let id = self.id().to_owned();
        let mut current = self.to_fields()?;
        document::apply_fields(&mut current, fields);

        *self = serde_json::from_value(Value::Object(current))?;
        self.set_id(id);

        Ok(())
    }
}

macro_rules! typed_document {
    ($ty:ty, $collection:expr) => {
        impl TypedDocument for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Goal {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Goal {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
        }
    }
}

pub type Task = Goal;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub text: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub day_index: u8,
    pub time: String,
    pub activity: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BigThing {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnnualPlan {
    #[serde(skip)]
    pub id: String,
    pub uid: String,
    pub year: i32,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

typed_document!(AnnualPlan, Collection::AnnualPlans);

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MonthlyPlan {
    #[serde(skip)]
    pub id: String,
    pub uid: String,
    pub year: i32,
    /// 0-11
    pub month: u8,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

typed_document!(MonthlyPlan, Collection::MonthlyPlans);

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WeeklyPlan {
    #[serde(skip)]
    pub id: String,
    pub uid: String,
    pub year: i32,
    pub week: u8,
    /// Legacy single-goal field, folded into `goals` on first access.
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub blocks: Vec<TimeBlock>,
}

typed_document!(WeeklyPlan, Collection::WeeklyPlans);

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    #[serde(skip)]
    pub id: String,
    pub uid: String,
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub big_thing: BigThing,
    #[serde(default)]
    pub medium_things: Vec<Task>,
    #[serde(default)]
    pub small_things: Vec<Task>,
    #[serde(default)]
    pub habit_logs: BTreeMap<String, HabitLog>,
}

typed_document!(DailyPlan, Collection::DailyPlans);

impl DailyPlan {
    /// Big thing done and every habit log either completed or with a positive value.
    pub fn is_fully_completed(&self) -> bool {
        self.big_thing.completed && self.habit_logs.values().all(HabitLog::is_done)
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct AnnualPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<Goal>>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct MonthlyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<Milestone>>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct WeeklyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<Goal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<TimeBlock>>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub big_thing: Option<BigThing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_things: Option<Vec<Task>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_things: Option<Vec<Task>>,
}
