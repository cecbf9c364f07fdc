use saleseed_store::{InsertOutcome, ResetSummary};
use serde::{Deserialize, Serialize};

/// Outcome of one generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub target: u64,
    pub existing: u64,
    pub created: u64,
    /// Rows dropped as already present.
    pub skipped: u64,
    /// True when the stage reused stored rows without writing.
    pub reused: bool,
}

impl StageReport {
    pub fn reused(stage: &str, target: u64, existing: u64) -> Self {
        Self {
            stage: stage.to_string(),
            target,
            existing,
            created: 0,
            skipped: 0,
            reused: true,
        }
    }

    pub fn generated(stage: &str, target: u64, existing: u64, outcome: InsertOutcome) -> Self {
        Self {
            stage: stage.to_string(),
            target,
            existing,
            created: outcome.inserted,
            skipped: outcome.skipped,
            reused: false,
        }
    }
}

/// Report for a seeding run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub run_id: String,
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<ResetSummary>,
    pub stages: Vec<StageReport>,
    pub chunks_completed: u64,
    pub sales_created: u64,
    pub sale_items_created: u64,
    pub duration_ms: u64,
}

impl SeedReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            reset: None,
            stages: Vec::new(),
            chunks_completed: 0,
            sales_created: 0,
            sale_items_created: 0,
            duration_ms: 0,
        }
    }

    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|stage| stage.stage == name)
    }

    /// Rows inserted by this run across every table.
    pub fn rows_created(&self) -> u64 {
        self.stages.iter().map(|stage| stage.created).sum::<u64>()
            + self.sales_created
            + self.sale_items_created
    }
}
