use serde::Serialize;

use crate::item::ItemStatus;

/// Result of processing one uploaded image.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Completed {
        id: i64,
        image_url: String,
        filename: String,
        final_text: String,
    },
    Failed {
        /// `None` when the record could not be created.
        id: Option<i64>,
        image_url: Option<String>,
        filename: String,
        error: String,
    },
}

impl ItemOutcome {
    pub fn id(&self) -> Option<i64> {
        match self {
            ItemOutcome::Completed { id, .. } => Some(*id),
            ItemOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn status(&self) -> ItemStatus {
        match self {
            ItemOutcome::Completed { .. } => ItemStatus::Completed,
            ItemOutcome::Failed { .. } => ItemStatus::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ItemOutcome::Completed { .. })
    }
}

/// Wire form of one outcome. Every field is always present, `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub id: Option<i64>,
    pub status: ItemStatus,
    pub image_url: Option<String>,
    pub filename: String,
    pub final_text: Option<String>,
    pub error: Option<String>,
}

impl From<ItemOutcome> for ItemResult {
    fn from(outcome: ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Completed {
                id,
                image_url,
                filename,
                final_text,
            } => Self {
                id: Some(id),
                status: ItemStatus::Completed,
                image_url: Some(image_url),
                filename,
                final_text: Some(final_text),
                error: None,
            },
            ItemOutcome::Failed {
                id,
                image_url,
                filename,
                error,
            } => Self {
                id,
                status: ItemStatus::Failed,
                image_url,
                filename,
                final_text: None,
                error: Some(error),
            },
        }
    }
}

/// All results of one upload request, in upload order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResponse {
    pub results: Vec<ItemResult>,
}

impl BatchResponse {
    pub fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        Self {
            results: outcomes.into_iter().map(ItemResult::from).collect(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ItemStatus::Completed)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.completed_count()
    }
}
