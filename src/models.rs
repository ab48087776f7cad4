use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification bucket of an activity.
///
/// Persisted as its display label. Labels outside the fixed set are kept
/// verbatim in `Other` so stored data is never rejected on read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Transportation,
    FoodAndDiet,
    EnergyUsage,
    ShoppingAndConsumption,
    WasteAndSustainability,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 5] = [
        Category::Transportation,
        Category::FoodAndDiet,
        Category::EnergyUsage,
        Category::ShoppingAndConsumption,
        Category::WasteAndSustainability,
    ];

    pub fn label(&self) -> &str {
        match self {
            Category::Transportation => "Transportation",
            Category::FoodAndDiet => "Food and Diet",
            Category::EnergyUsage => "Energy Usage",
            Category::ShoppingAndConsumption => "Shopping and Consumption",
            Category::WasteAndSustainability => "Waste & Sustainability Actions",
            Category::Other(label) => label,
        }
    }

    /// Looks up one of the five fixed categories by its label.
    pub fn from_known_label(label: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|category| category.label() == label)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Self::from_known_label(&label).unwrap_or(Category::Other(label))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single logged action. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    pub category: Category,
    /// kg CO₂
    pub carbon_value: f64,
    pub date: DateTime<Utc>,
}

/// Unsubmitted form contents, all fields kept as typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityDraft {
    pub name: String,
    pub category: String,
    pub carbon_value: String,
}

/// Everything persisted in the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(
        rename = "activityFormData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub draft: Option<ActivityDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOverview {
    pub today: Vec<CategoryTotal>,
    pub all_time: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub count: f64,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBreakdown {
    pub days: Vec<DailyTotal>,
    pub max_daily_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub count: f64,
    pub color_index: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_daily_total: f64,
    pub days: Vec<HeatmapDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub carbon_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub dark_mode: bool,
}
