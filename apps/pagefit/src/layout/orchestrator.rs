//! Fit Orchestrator — the control loop that enforces the page target.
//!
//! # Loop
//! Each step validates the current candidate, renders it through the oracle
//! unless hard content errors make rendering pointless, and shrinks it when the
//! real page count is wrong. The estimator only decides whether a render is
//! worth attempting; the oracle's page count is the only success signal.
//!
//! The loop ends on the first exact fit, on an underfilled render (shrinking
//! cannot add pages), when the planner has nothing left to remove, or when the
//! step budget runs out. Only `ShrinkExhausted` crosses this boundary.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::layout::budget::FitConfig;
use crate::layout::estimator::HeightEstimate;
use crate::layout::limits::{validate_limits, ValidationError, ValidationResult};
use crate::layout::shrink::{ShrinkState, ShrinkStep};
use crate::models::ContentModel;
use crate::render::{render_checked, RenderOracle, RenderOutcome};

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderMetadata {
    pub pages: u32,
    pub size_bytes: usize,
    /// Highest auxiliary-cap tier the planner reached; 0 if none was used.
    pub shrink_level: u8,
    /// Every applied reduction, in order, e.g. `work_drop_bullet[2]`.
    pub shrink_changes: Vec<String>,
    /// Loop iterations, the successful one included.
    pub steps: u32,
    pub rendered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FitSuccess {
    pub document: Bytes,
    /// The candidate that was actually rendered.
    pub content: ContentModel,
    pub metadata: RenderMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    StepBudgetExhausted,
    NothingToShrink,
    /// The document rendered on fewer pages than required.
    Underfilled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            FailureReason::StepBudgetExhausted => "step budget exhausted",
            FailureReason::NothingToShrink => "nothing left to shrink",
            FailureReason::Underfilled => "document renders on too few pages",
        };
        f.write_str(text)
    }
}

/// Terminal failure of the fit loop.
#[derive(Debug, Clone, Error)]
#[error("Content does not fit on {target_pages} page(s): {reason}")]
pub struct ShrinkExhausted {
    pub reason: FailureReason,
    pub target_pages: u32,
    /// Validation of the last candidate, unmodified.
    pub validation: ValidationResult,
    pub shrink_level: u8,
    pub shrink_changes: Vec<String>,
    pub last_render_error: Option<String>,
}

/// Caller-facing failure body: enough to build a targeted remediation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFailurePayload {
    pub estimated_pages: f32,
    pub estimated_height_mm: f32,
    pub validation_errors: Vec<ValidationError>,
    pub height_breakdown: HeightEstimate,
    pub shrink_level: u8,
    pub shrink_changes: Vec<String>,
    pub reason: FailureReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_render_error: Option<String>,
}

impl ShrinkExhausted {
    pub fn to_payload(&self) -> FitFailurePayload {
        FitFailurePayload {
            estimated_pages: self.validation.estimated_pages,
            estimated_height_mm: self.validation.estimated_height_mm,
            validation_errors: self.validation.errors.clone(),
            height_breakdown: self.validation.details.clone(),
            shrink_level: self.shrink_level,
            shrink_changes: self.shrink_changes.clone(),
            reason: self.reason,
            last_render_error: self.last_render_error.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct FitOrchestrator {
    config: FitConfig,
    oracle: Arc<dyn RenderOracle>,
}

/// Per-run bookkeeping; nothing is shared between runs.
struct RunState {
    shrink: ShrinkState,
    changes: Vec<String>,
    last_render_error: Option<String>,
}

impl FitOrchestrator {
    pub fn new(config: FitConfig, oracle: Arc<dyn RenderOracle>) -> Self {
        Self { config, oracle }
    }

    /// Runs the fit loop on `content` until it renders on exactly
    /// `target_pages` pages or no further progress is possible.
    pub async fn run(&self, content: ContentModel) -> Result<FitSuccess, ShrinkExhausted> {
        let config = &self.config;
        let mut candidate = content;
        let mut run = RunState {
            shrink: ShrinkState::new(),
            changes: Vec::new(),
            last_render_error: None,
        };

        for step in 0..config.step_budget {
            let validation = validate_limits(&candidate, config);
            for warning in &validation.warnings {
                warn!(step, %warning, "Soft content limit exceeded");
            }

            if validation.has_content_errors() {
                debug!(
                    step,
                    errors = validation.content_errors().count(),
                    "Hard content errors, skipping render"
                );
            } else {
                let layout_errors = validation.layout_errors().count();
                if layout_errors > 0 {
                    debug!(step, layout_errors, "Estimate predicts overflow, rendering anyway");
                }
                match render_checked(self.oracle.as_ref(), &candidate, config.target_pages).await {
                    RenderOutcome::Fits { document, pages } => {
                        info!(
                            step,
                            pages,
                            size_bytes = document.len(),
                            changes = run.changes.len(),
                            "Content fits"
                        );
                        let metadata = RenderMetadata {
                            pages,
                            size_bytes: document.len(),
                            shrink_level: run.shrink.tier_level,
                            shrink_changes: run.changes,
                            steps: step + 1,
                            rendered_at: Utc::now(),
                        };
                        return Ok(FitSuccess {
                            document,
                            content: candidate,
                            metadata,
                        });
                    }
                    RenderOutcome::PageMismatch { pages } if pages < config.target_pages => {
                        warn!(step, pages, target = config.target_pages, "Document is underfilled");
                        return Err(self.exhausted(FailureReason::Underfilled, validation, run));
                    }
                    RenderOutcome::PageMismatch { pages } => {
                        debug!(step, pages, target = config.target_pages, "Page count too high");
                    }
                    RenderOutcome::Failed(e) => {
                        warn!(step, error = %e, "Render failed, shrinking and retrying");
                        run.last_render_error = Some(e.to_string());
                    }
                }
            }

            match run.shrink.next(&candidate, step, config) {
                ShrinkStep::Reduced { content, changes } => {
                    run.changes.extend(changes.iter().map(ToString::to_string));
                    candidate = content;
                }
                ShrinkStep::Exhausted => {
                    warn!(step, "Nothing left to shrink");
                    return Err(self.exhausted(FailureReason::NothingToShrink, validation, run));
                }
            }
        }

        warn!(budget = config.step_budget, "Fit step budget exhausted");
        let validation = validate_limits(&candidate, config);
        Err(self.exhausted(FailureReason::StepBudgetExhausted, validation, run))
    }

    fn exhausted(
        &self,
        reason: FailureReason,
        validation: ValidationResult,
        run: RunState,
    ) -> ShrinkExhausted {
        ShrinkExhausted {
            reason,
            target_pages: self.config.target_pages,
            validation,
            shrink_level: run.shrink.tier_level,
            shrink_changes: run.changes,
            last_render_error: run.last_render_error,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::limits::{LimitKind, PAGE2_OVERFLOW_FIELD};
    use crate::models::fixtures::{bullet_of_len, sample_content, single_huge_further_bullet};
    use crate::render::testing::ScriptedOracle;

    fn work_bullets(content: &ContentModel) -> usize {
        content.work_bullet_counts().iter().sum()
    }

    /// Three pages while there are more than twelve work bullets, two otherwise.
    fn twelve_bullet_oracle(content: &ContentModel) -> Result<u32, String> {
        Ok(if work_bullets(content) > 12 { 3 } else { 2 })
    }

    #[tokio::test]
    async fn test_converges_in_one_step_without_shrinking() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| Ok(2)));
        let orchestrator = FitOrchestrator::new(FitConfig::cv(), oracle.clone());
        let content = sample_content(&[4, 4, 5]);

        let success = orchestrator.run(content.clone()).await.expect("fits");
        assert_eq!(success.metadata.pages, 2);
        assert_eq!(success.metadata.steps, 1);
        assert!(success.metadata.shrink_changes.is_empty());
        assert_eq!(success.metadata.shrink_level, 0);
        assert_eq!(success.metadata.size_bytes, success.document.len());
        assert_eq!(success.content, content);
        assert_eq!(oracle.render_count(), 1);
    }

    #[tokio::test]
    async fn test_one_leveling_step_then_fits() {
        let oracle = Arc::new(ScriptedOracle::new(twelve_bullet_oracle));
        let orchestrator = FitOrchestrator::new(FitConfig::cv(), oracle.clone());

        let success = orchestrator
            .run(sample_content(&[4, 4, 5]))
            .await
            .expect("fits after one shrink");
        assert_eq!(success.metadata.shrink_changes, vec!["work_drop_bullet[2]"]);
        assert_eq!(success.metadata.steps, 2);
        assert_eq!(success.content.work_bullet_counts(), vec![4, 4, 4]);
        assert_eq!(oracle.render_count(), 2);
    }

    #[tokio::test]
    async fn test_irreducible_content_exhausts_without_rendering() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| Ok(2)));
        let orchestrator = FitOrchestrator::new(FitConfig::cv(), oracle.clone());

        let err = orchestrator
            .run(single_huge_further_bullet(5000))
            .await
            .unwrap_err();
        assert_eq!(err.reason, FailureReason::NothingToShrink);
        assert_eq!(oracle.render_count(), 0);

        let payload = err.to_payload();
        let bullet = payload
            .validation_errors
            .iter()
            .find(|e| e.field == "further_experience[0].bullets[0]")
            .expect("bullet error survives into the payload");
        assert_eq!(bullet.kind, LimitKind::ContentLimitExceeded);
        assert!(payload
            .validation_errors
            .iter()
            .any(|e| e.field == PAGE2_OVERFLOW_FIELD));
        assert_eq!(payload.estimated_height_mm, payload.height_breakdown.total_height_mm);
        assert!(payload.shrink_changes.is_empty());
        assert_eq!(payload.shrink_level, FitConfig::cv().max_tier_level);
    }

    #[tokio::test]
    async fn test_underfilled_stops_immediately() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| Ok(1)));
        let orchestrator = FitOrchestrator::new(FitConfig::cv(), oracle.clone());

        let err = orchestrator.run(sample_content(&[4, 4, 5])).await.unwrap_err();
        assert_eq!(err.reason, FailureReason::Underfilled);
        assert!(err.shrink_changes.is_empty());
        assert_eq!(oracle.render_count(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_is_retried_after_shrinking() {
        let oracle = Arc::new(ScriptedOracle::new(|content: &ContentModel| {
            if work_bullets(content) > 12 {
                Err("layout engine crashed".to_string())
            } else {
                Ok(2)
            }
        }));
        let orchestrator = FitOrchestrator::new(FitConfig::cv(), oracle.clone());

        let success = orchestrator.run(sample_content(&[4, 4, 5])).await.expect("fits");
        assert_eq!(success.metadata.shrink_changes, vec!["work_drop_bullet[2]"]);
        assert_eq!(oracle.render_count(), 2);
    }

    #[tokio::test]
    async fn test_step_budget_exhaustion_reports_progress() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| Ok(3)));
        let config = FitConfig {
            step_budget: 2,
            ..FitConfig::cv()
        };
        let orchestrator = FitOrchestrator::new(config, oracle.clone());

        let err = orchestrator.run(sample_content(&[6, 5, 4])).await.unwrap_err();
        assert_eq!(err.reason, FailureReason::StepBudgetExhausted);
        assert_eq!(
            err.shrink_changes,
            vec!["work_drop_bullet[0]", "work_drop_bullet[1]"]
        );
        assert_eq!(oracle.render_count(), 2);
        assert!(err.to_string().contains("2 page(s)"));
    }

    #[tokio::test]
    async fn test_last_render_error_kept_on_failure() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| {
            Err("renderer unavailable".to_string())
        }));
        let config = FitConfig {
            step_budget: 1,
            ..FitConfig::cv()
        };
        let orchestrator = FitOrchestrator::new(config, oracle);

        let err = orchestrator.run(sample_content(&[4, 4, 5])).await.unwrap_err();
        let payload = err.to_payload();
        assert!(payload
            .last_render_error
            .as_deref()
            .is_some_and(|e| e.contains("renderer unavailable")));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["reason"], "step_budget_exhausted");
    }

    #[tokio::test]
    async fn test_run_is_deterministic() {
        let oracle = Arc::new(ScriptedOracle::new(twelve_bullet_oracle));
        let orchestrator = FitOrchestrator::new(FitConfig::cv(), oracle);
        let content = sample_content(&[6, 4, 5]);

        let first = orchestrator.run(content.clone()).await.expect("fits");
        let second = orchestrator.run(content).await.expect("fits");
        assert_eq!(first.content, second.content);
        assert_eq!(first.metadata.shrink_changes, second.metadata.shrink_changes);
        assert_eq!(first.document, second.document);
    }

    #[tokio::test]
    async fn test_cover_letter_with_full_body_renders() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| Ok(1)));
        let orchestrator = FitOrchestrator::new(FitConfig::cover_letter(), oracle.clone());
        let mut content = ContentModel::default();
        content.contact.name = "Erika Musterfrau".to_string();
        content.profile = Some(bullet_of_len(1, 1500));

        let success = orchestrator.run(content).await.expect("letter fits");
        assert_eq!(success.metadata.pages, 1);
        assert!(success.metadata.shrink_changes.is_empty());
        assert_eq!(oracle.render_count(), 1);
    }

    #[tokio::test]
    async fn test_extra_address_lines_do_not_block_rendering() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| Ok(2)));
        let orchestrator = FitOrchestrator::new(FitConfig::cv(), oracle.clone());
        let mut content = sample_content(&[4, 4, 4]);
        content.contact.address_lines = (1..=5).map(|i| format!("Line {i}")).collect();

        let success = orchestrator.run(content).await.expect("fits");
        assert_eq!(success.metadata.steps, 1);
        assert_eq!(oracle.render_count(), 1);
    }

    #[tokio::test]
    async fn test_cover_letter_targets_one_page() {
        let oracle = Arc::new(ScriptedOracle::new(|_: &ContentModel| Ok(1)));
        let orchestrator = FitOrchestrator::new(FitConfig::cover_letter(), oracle);
        let mut content = ContentModel::default();
        content.contact.name = "Jane Doe".to_string();
        content.profile = Some("Short letter body.".to_string());

        let success = orchestrator.run(content).await.expect("fits");
        assert_eq!(success.metadata.pages, 1);
    }
}
