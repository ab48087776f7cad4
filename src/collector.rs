use crate::errors::StorageError;
use crate::models::{Activity, ActivityDraft, Category};
use crate::storage::ActivityStore;
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Name,
    Category,
    CarbonValue,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DraftField::Name => "name",
            DraftField::Category => "category",
            DraftField::CarbonValue => "carbonValue",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: DraftField,
    pub message: String,
}

/// A rejected draft; lists every field that failed, in form order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid activity: {}", field_list(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn has(&self, field: DraftField) -> bool {
        self.fields.iter().any(|error| error.field == field)
    }
}

fn field_list(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|error| error.field.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Turns a draft into an activity stamped with `now`.
pub fn validate(draft: &ActivityDraft, now: DateTime<Utc>) -> Result<Activity, ValidationError> {
    let mut fields = Vec::new();

    let name = draft.name.trim();
    if name.is_empty() {
        fields.push(FieldError {
            field: DraftField::Name,
            message: "name is required".into(),
        });
    }

    let category_label = draft.category.trim();
    let category = if category_label.is_empty() {
        fields.push(FieldError {
            field: DraftField::Category,
            message: "category is required".into(),
        });
        None
    } else {
        let known = Category::from_known_label(category_label);
        if known.is_none() {
            fields.push(FieldError {
                field: DraftField::Category,
                message: format!("unknown category '{category_label}'"),
            });
        }
        known
    };

    let carbon_value = match parse_carbon_value(&draft.carbon_value) {
        Ok(value) => Some(value),
        Err(message) => {
            fields.push(FieldError {
                field: DraftField::CarbonValue,
                message,
            });
            None
        }
    };

    match (category, carbon_value) {
        (Some(category), Some(carbon_value)) if fields.is_empty() => Ok(Activity {
            name: name.to_string(),
            category,
            carbon_value,
            date: now,
        }),
        _ => Err(ValidationError { fields }),
    }
}

fn parse_carbon_value(raw: &str) -> Result<f64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("carbon value is required".into());
    }

    let value: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !value.is_finite() {
        return Err("carbon value must be finite".into());
    }
    if value < 0.0 {
        return Err("carbon value must not be negative".into());
    }

    // Normalizes -0.
    Ok(value + 0.0)
}

/// Stamps the activity with the current time at millisecond precision.
pub async fn submit(store: &ActivityStore, draft: &ActivityDraft) -> Result<Activity, SubmitError> {
    submit_at(store, draft, Utc::now().trunc_subsecs(3)).await
}

/// Validates the draft, appends the activity and clears the saved draft.
/// Nothing is written when validation fails.
pub async fn submit_at(
    store: &ActivityStore,
    draft: &ActivityDraft,
    now: DateTime<Utc>,
) -> Result<Activity, SubmitError> {
    let activity = validate(draft, now).inspect_err(|err| warn!("draft rejected: {err}"))?;
    store.append_submitted(activity.clone()).await?;
    Ok(activity)
}
