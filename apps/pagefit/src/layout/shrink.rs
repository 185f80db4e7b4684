//! Shrink Planner — deterministic, monotonic content reductions.
//!
//! Two strategies, tried in order by `ShrinkState::next`:
//! 1. Bullet leveling: shave the outlier work entry (most bullets) down to the
//!    next-highest bullet count, oldest entry first, never below the floor.
//! 2. Tier caps: once leveling is exhausted at every floor, cap auxiliary lists
//!    and entry counts, gated by an escalating tier level.
//!
//! Every operation returns a new `ContentModel`. Lists are only truncated from
//! the tail; bullets are kept verbatim or dropped whole.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::budget::{FitConfig, TierCaps};
use crate::models::ContentModel;

// ────────────────────────────────────────────────────────────────────────────
// Change descriptors
// ────────────────────────────────────────────────────────────────────────────

/// One reduction the planner applied. `Display` gives the stable descriptor
/// reported to callers, e.g. `work_drop_bullet[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ShrinkChange {
    WorkDropBullet { index: usize, from: usize, to: usize },
    LanguagesCap { max: usize },
    SkillsCap { group: usize, max: usize },
    FurtherCap { entries: usize, bullets: usize },
    EducationCap { max: usize },
    WorkEntriesCap { max: usize },
}

impl fmt::Display for ShrinkChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShrinkChange::WorkDropBullet { index, .. } => write!(f, "work_drop_bullet[{index}]"),
            ShrinkChange::LanguagesCap { max } => write!(f, "languages_cap[{max}]"),
            ShrinkChange::SkillsCap { group, max } => write!(f, "skills_cap[{group}:{max}]"),
            ShrinkChange::FurtherCap { entries, bullets } => {
                write!(f, "further_cap[{entries}x{bullets}]")
            }
            ShrinkChange::EducationCap { max } => write!(f, "education_cap[{max}]"),
            ShrinkChange::WorkEntriesCap { max } => write!(f, "work_entries_cap[{max}]"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Primary strategy: bullet leveling
// ────────────────────────────────────────────────────────────────────────────

/// Trims one outlier work entry toward the next-highest bullet count.
///
/// `target` is the second-highest distinct non-zero bullet count (or the only
/// one, if all entries agree). The last entry exceeding `target` is truncated
/// to exactly `target`. Returns `None` when `target < min_bullets_per_role` or
/// nothing exceeds `target`.
pub fn level_work_bullets(
    content: &ContentModel,
    min_bullets_per_role: usize,
) -> Option<(ContentModel, ShrinkChange)> {
    let mut distinct: Vec<usize> = content
        .work_bullet_counts()
        .into_iter()
        .filter(|&n| n > 0)
        .collect();
    distinct.sort_unstable_by(|a, b| b.cmp(a));
    distinct.dedup();

    let target = match distinct.as_slice() {
        [] => return None,
        [only] => *only,
        [_, second, ..] => *second,
    };
    if target < min_bullets_per_role {
        return None;
    }

    // Oldest entries sit at the end of the recency-ordered list.
    let index = content
        .work_experience
        .iter()
        .rposition(|entry| entry.bullets.len() > target)?;

    let mut next = content.clone();
    let from = next.work_experience[index].bullets.len();
    next.work_experience[index].bullets.truncate(target);

    Some((
        next,
        ShrinkChange::WorkDropBullet {
            index,
            from,
            to: target,
        },
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Escalation strategy: tiered auxiliary caps
// ────────────────────────────────────────────────────────────────────────────

/// Applies every cap enabled at `level`. Only caps that actually removed
/// something are reported; an empty list means the call was a no-op.
pub fn apply_tier_caps(
    content: &ContentModel,
    level: u8,
    caps: &TierCaps,
) -> (ContentModel, Vec<ShrinkChange>) {
    let mut next = content.clone();
    let mut changes = Vec::new();

    if level >= caps.aux_lists_level {
        if next.languages.len() > caps.max_languages {
            next.languages.truncate(caps.max_languages);
            changes.push(ShrinkChange::LanguagesCap {
                max: caps.max_languages,
            });
        }
        for (group, skills) in next.skills.iter_mut().enumerate() {
            if skills.items.len() > caps.max_skills_per_list {
                skills.items.truncate(caps.max_skills_per_list);
                changes.push(ShrinkChange::SkillsCap {
                    group,
                    max: caps.max_skills_per_list,
                });
            }
        }
    }

    let (max_entries, max_bullets) = if level >= caps.tight_level {
        caps.further_tight_cap
    } else {
        caps.further_cap
    };
    let mut further_changed = false;
    if next.further_experience.len() > max_entries {
        next.further_experience.truncate(max_entries);
        further_changed = true;
    }
    for entry in &mut next.further_experience {
        if entry.bullets.len() > max_bullets {
            entry.bullets.truncate(max_bullets);
            further_changed = true;
        }
    }
    if further_changed {
        changes.push(ShrinkChange::FurtherCap {
            entries: max_entries,
            bullets: max_bullets,
        });
    }

    if level >= caps.tight_level {
        if next.education.len() > caps.max_education {
            next.education.truncate(caps.max_education);
            changes.push(ShrinkChange::EducationCap {
                max: caps.max_education,
            });
        }
        if next.work_experience.len() > caps.max_work_entries {
            next.work_experience.truncate(caps.max_work_entries);
            changes.push(ShrinkChange::WorkEntriesCap {
                max: caps.max_work_entries,
            });
        }
    }

    (next, changes)
}

// ────────────────────────────────────────────────────────────────────────────
// Shrink state machine
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of one shrink step.
#[derive(Debug, Clone, PartialEq)]
pub enum ShrinkStep {
    Reduced {
        content: ContentModel,
        changes: Vec<ShrinkChange>,
    },
    /// Nothing is reducible at any floor or at the highest tier.
    Exhausted,
}

/// Escalation state threaded through the fit loop.
///
/// `floor_index` points into `FitConfig::bullet_floors`; `tier_level` is 0
/// until the auxiliary caps are first used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkState {
    pub floor_index: usize,
    pub tier_level: u8,
}

impl ShrinkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bullet floor leveling currently runs at, if any floor is left.
    pub fn active_floor(&self, config: &FitConfig) -> Option<usize> {
        config.bullet_floors.get(self.floor_index).copied()
    }

    /// Tier level scheduled for loop step `step`: `min(max, 1 + step / steps_per_tier)`.
    pub fn scheduled_tier(step: u32, config: &FitConfig) -> u8 {
        let scheduled = 1 + step / config.steps_per_tier.max(1);
        scheduled.min(config.max_tier_level as u32) as u8
    }

    /// Performs one shrink step on `content`.
    ///
    /// Leveling runs at the active floor; a floor that yields nothing is
    /// relaxed for good. With every floor spent, tier caps run at the scheduled
    /// level, and a level that changes nothing escalates immediately.
    pub fn next(&mut self, content: &ContentModel, step: u32, config: &FitConfig) -> ShrinkStep {
        while let Some(floor) = self.active_floor(config) {
            if let Some((reduced, change)) = level_work_bullets(content, floor) {
                debug!(floor, %change, "bullet leveling");
                return ShrinkStep::Reduced {
                    content: reduced,
                    changes: vec![change],
                };
            }
            debug!(floor, "bullet leveling exhausted, relaxing floor");
            self.floor_index += 1;
        }

        self.tier_level = self.tier_level.max(Self::scheduled_tier(step, config));
        loop {
            let (reduced, changes) = apply_tier_caps(content, self.tier_level, &config.tier_caps);
            if !changes.is_empty() {
                debug!(level = self.tier_level, ?changes, "tier caps applied");
                // Dropping whole roles can open up leveling again.
                if changes
                    .iter()
                    .any(|c| matches!(c, ShrinkChange::WorkEntriesCap { .. }))
                {
                    self.floor_index = 0;
                }
                return ShrinkStep::Reduced {
                    content: reduced,
                    changes,
                };
            }
            if self.tier_level >= config.max_tier_level {
                return ShrinkStep::Exhausted;
            }
            self.tier_level += 1;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{language, sample_content, single_huge_further_bullet, skill_group};
    use crate::models::{EducationEntry, FurtherEntry};

    fn counts(content: &ContentModel) -> Vec<usize> {
        content.work_bullet_counts()
    }

    fn employers(content: &ContentModel) -> Vec<String> {
        content
            .work_experience
            .iter()
            .map(|w| w.employer.clone())
            .collect()
    }

    // ── level_work_bullets ──────────────────────────────────────────────────

    #[test]
    fn test_outlier_trimmed_first() {
        let content = sample_content(&[4, 4, 5]);
        let (reduced, change) = level_work_bullets(&content, 3).expect("one reduction");
        assert_eq!(counts(&reduced), vec![4, 4, 4]);
        assert_eq!(
            change,
            ShrinkChange::WorkDropBullet {
                index: 2,
                from: 5,
                to: 4
            }
        );
        assert_eq!(change.to_string(), "work_drop_bullet[2]");

        assert!(level_work_bullets(&reduced, 3).is_none());
    }

    #[test]
    fn test_leveling_keeps_bullets_verbatim_and_in_order() {
        let content = sample_content(&[4, 4, 5]);
        let (reduced, _) = level_work_bullets(&content, 3).unwrap();
        let before = &content.work_experience[2].bullets;
        let after = &reduced.work_experience[2].bullets;
        assert_eq!(after.as_slice(), &before[..4]);
        assert_eq!(employers(&reduced), employers(&content));
        // Caller's value untouched.
        assert_eq!(counts(&content), vec![4, 4, 5]);
    }

    #[test]
    fn test_scans_from_oldest_entry() {
        let content = sample_content(&[6, 6, 4]);
        // distinct {6, 4} → target 4; the last entry over 4 is index 1.
        let (reduced, change) = level_work_bullets(&content, 3).unwrap();
        assert_eq!(counts(&reduced), vec![6, 4, 4]);
        assert_eq!(change.to_string(), "work_drop_bullet[1]");
    }

    #[test]
    fn test_target_below_floor_returns_none() {
        let content = sample_content(&[3, 3, 2]);
        assert!(level_work_bullets(&content, 3).is_none());
        let (reduced, change) = level_work_bullets(&content, 2).unwrap();
        assert_eq!(counts(&reduced), vec![3, 2, 2]);
        assert_eq!(change.to_string(), "work_drop_bullet[1]");
    }

    #[test]
    fn test_uniform_counts_are_not_leveled() {
        let content = sample_content(&[4, 4, 4]);
        assert!(level_work_bullets(&content, 3).is_none());
        assert!(level_work_bullets(&content, 2).is_none());
    }

    #[test]
    fn test_zero_bullet_entries_ignored() {
        let content = sample_content(&[0, 5, 4]);
        let (reduced, _) = level_work_bullets(&content, 3).unwrap();
        assert_eq!(counts(&reduced), vec![0, 4, 4]);
    }

    #[test]
    fn test_no_work_experience_returns_none() {
        assert!(level_work_bullets(&ContentModel::default(), 1).is_none());
    }

    #[test]
    fn test_leveling_never_goes_below_floor() {
        let mut content = sample_content(&[7, 5, 3, 2]);
        while let Some((reduced, _)) = level_work_bullets(&content, 3) {
            for (before, after) in counts(&content).iter().zip(counts(&reduced)) {
                assert!(after <= *before);
                assert!(after >= 3 || after == *before);
            }
            content = reduced;
        }
        assert_eq!(counts(&content), vec![3, 3, 3, 2]);
    }

    // ── apply_tier_caps ─────────────────────────────────────────────────────

    fn crowded_content() -> ContentModel {
        let mut content = sample_content(&[3, 3, 3, 3, 3, 3]);
        content.languages = (0..8).map(|i| language(&format!("Lang {i}"), "B2")).collect();
        content.skills = vec![skill_group("IT / AI", 14), skill_group("Ops", 4)];
        content.further_experience = (0..7)
            .map(|i| FurtherEntry {
                date_range: "2020".to_string(),
                title: format!("Project {i}"),
                bullets: (0..4).map(|b| format!("Bullet {i}.{b}")).collect(),
            })
            .collect();
        content.education = (0..3)
            .map(|i| EducationEntry {
                institution: format!("School {i}"),
                ..Default::default()
            })
            .collect();
        content
    }

    #[test]
    fn test_low_tier_only_caps_further_experience() {
        let caps = TierCaps::default();
        let (reduced, changes) = apply_tier_caps(&crowded_content(), 1, &caps);
        assert_eq!(
            changes,
            vec![ShrinkChange::FurtherCap {
                entries: 5,
                bullets: 3
            }]
        );
        assert_eq!(reduced.further_experience.len(), 5);
        assert!(reduced.further_experience.iter().all(|f| f.bullets.len() == 3));
        assert_eq!(reduced.languages.len(), 8);
        assert_eq!(reduced.work_experience.len(), 6);
    }

    #[test]
    fn test_level_five_caps_languages_and_skills() {
        let caps = TierCaps::default();
        let (reduced, changes) = apply_tier_caps(&crowded_content(), 5, &caps);
        let labels: Vec<String> = changes.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            labels,
            vec!["languages_cap[6]", "skills_cap[0:10]", "further_cap[5x3]"]
        );
        assert_eq!(reduced.languages.len(), 6);
        assert_eq!(reduced.languages[0].name, "Lang 0");
        assert_eq!(reduced.skills[0].items.len(), 10);
        assert_eq!(reduced.skills[1].items.len(), 4);
    }

    #[test]
    fn test_level_seven_caps_entries() {
        let caps = TierCaps::default();
        let content = crowded_content();
        let (reduced, changes) = apply_tier_caps(&content, 7, &caps);
        let labels: Vec<String> = changes.iter().map(|c| c.to_string()).collect();
        assert!(labels.contains(&"further_cap[4x2]".to_string()));
        assert!(labels.contains(&"education_cap[2]".to_string()));
        assert!(labels.contains(&"work_entries_cap[4]".to_string()));
        assert_eq!(reduced.further_experience.len(), 4);
        assert!(reduced.further_experience.iter().all(|f| f.bullets.len() == 2));
        assert_eq!(reduced.education[1].institution, "School 1");
        assert_eq!(employers(&reduced), employers(&content)[..4].to_vec());
    }

    #[test]
    fn test_tier_caps_idempotent() {
        let caps = TierCaps::default();
        let (once, _) = apply_tier_caps(&crowded_content(), 8, &caps);
        let (twice, changes) = apply_tier_caps(&once, 8, &caps);
        assert!(changes.is_empty());
        assert_eq!(once, twice);
    }

    // ── ShrinkState ─────────────────────────────────────────────────────────

    #[test]
    fn test_scheduled_tier() {
        let config = FitConfig::cv();
        assert_eq!(ShrinkState::scheduled_tier(0, &config), 1);
        assert_eq!(ShrinkState::scheduled_tier(12, &config), 3);
        assert_eq!(ShrinkState::scheduled_tier(39, &config), 8);
    }

    #[test]
    fn test_state_relaxes_floor_before_tier_caps() {
        let config = FitConfig::cv();
        let mut state = ShrinkState::new();
        let content = sample_content(&[3, 3, 2]);

        match state.next(&content, 0, &config) {
            ShrinkStep::Reduced { content, changes } => {
                assert_eq!(counts(&content), vec![3, 2, 2]);
                assert_eq!(changes[0].to_string(), "work_drop_bullet[1]");
            }
            ShrinkStep::Exhausted => panic!("expected a reduction"),
        }
        assert_eq!(state.floor_index, 1);
        assert_eq!(state.active_floor(&config), Some(2));
        assert_eq!(state.tier_level, 0);
    }

    #[test]
    fn test_state_exhausts_on_irreducible_content() {
        let config = FitConfig::cv();
        let mut state = ShrinkState::new();
        let content = single_huge_further_bullet(5000);
        assert_eq!(state.next(&content, 0, &config), ShrinkStep::Exhausted);
        assert_eq!(state.tier_level, config.max_tier_level);
        assert_eq!(state.active_floor(&config), None);
        // Still exhausted on the next call.
        assert_eq!(state.next(&content, 1, &config), ShrinkStep::Exhausted);
    }

    #[test]
    fn test_state_shrinks_monotonically_until_exhausted() {
        let config = FitConfig::cv();
        let mut state = ShrinkState::new();
        let original = crowded_content();
        let mut content = original.clone();
        let mut steps = 0;

        while let ShrinkStep::Reduced { content: next, .. } = state.next(&content, steps, &config) {
            assert!(next.total_bullets() <= content.total_bullets());
            assert!(next.work_experience.len() <= content.work_experience.len());
            let kept = employers(&next);
            assert_eq!(kept, employers(&original)[..kept.len()].to_vec());
            content = next;
            steps += 1;
            assert!(steps < 100, "shrinking must terminate");
        }
        assert_eq!(content.work_experience.len(), 4);
        assert_eq!(content.languages.len(), 6);
    }

    #[test]
    fn test_work_entries_cap_resets_floor() {
        let config = FitConfig::cv();
        let mut state = ShrinkState {
            floor_index: 2,
            tier_level: 7,
        };
        let content = sample_content(&[3, 3, 3, 3, 5]);
        match state.next(&content, 0, &config) {
            ShrinkStep::Reduced { changes, content } => {
                assert!(changes.contains(&ShrinkChange::WorkEntriesCap { max: 4 }));
                assert_eq!(counts(&content), vec![3, 3, 3, 3]);
            }
            ShrinkStep::Exhausted => panic!("expected caps"),
        }
        assert_eq!(state.floor_index, 0);
    }
}
