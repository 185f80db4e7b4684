//! Height Estimator — predicts rendered height from raw text and structural counts.
//!
//! This never sees the real renderer. It sums fixed contributions (header,
//! section titles, margins) and wrapped-line contributions from the
//! `FieldBudgetTable`, then splits the sum across the template's fixed page
//! break so an overflow can be pinned to the physical page that overflows.
//!
//! Pure and deterministic: same content + same config → same estimate.

use serde::{Deserialize, Serialize};

use crate::layout::budget::{FitConfig, PageSplit};
use crate::models::ContentModel;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Template sections in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Header,
    Education,
    WorkExperience,
    Profile,
    FurtherExperience,
    Languages,
    Skills,
    Interests,
    References,
}

impl Section {
    /// Page the section lands on under the fixed two-page break.
    fn fixed_break_page(self) -> u8 {
        match self {
            Section::Header | Section::Education | Section::WorkExperience => 1,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionHeight {
    pub section: Section,
    pub height_mm: f32,
    pub page: u8,
}

/// Full height estimate. Page totals include that page's margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightEstimate {
    pub total_height_mm: f32,
    pub page1_height_mm: f32,
    pub page2_height_mm: f32,
    /// `total_height_mm / page_height_mm`; coarse triage only.
    pub estimated_pages: f32,
    pub page_height_mm: f32,
    pub per_section_height_mm: Vec<SectionHeight>,
}

impl HeightEstimate {
    #[cfg(test)]
    pub fn section(&self, section: Section) -> f32 {
        self.per_section_height_mm
            .iter()
            .filter(|s| s.section == section)
            .map(|s| s.height_mm)
            .sum()
    }

    pub fn page1_overflows(&self) -> bool {
        self.page1_height_mm > self.page_height_mm
    }

    pub fn page2_overflows(&self) -> bool {
        self.page2_height_mm > self.page_height_mm
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core estimate
// ────────────────────────────────────────────────────────────────────────────

/// Estimates the rendered height of `content` under `config`.
pub fn estimate_height(content: &ContentModel, config: &FitConfig) -> HeightEstimate {
    let geometry = &config.geometry;

    let sections = [
        (Section::Header, header_height(content, config)),
        (Section::Education, education_height(content, config)),
        (Section::WorkExperience, work_height(content, config)),
        (Section::Profile, profile_height(content, config)),
        (Section::FurtherExperience, further_height(content, config)),
        (Section::Languages, languages_height(content, config)),
        (Section::Skills, skills_height(content, config)),
        (Section::Interests, interests_height(content, config)),
        (Section::References, references_height(content, config)),
    ];

    let per_section_height_mm: Vec<SectionHeight> = sections
        .into_iter()
        .map(|(section, height_mm)| SectionHeight {
            section,
            height_mm,
            page: match geometry.split {
                PageSplit::FixedBreak => section.fixed_break_page(),
                PageSplit::SinglePage => 1,
            },
        })
        .collect();

    let content_on = |page: u8| -> f32 {
        per_section_height_mm
            .iter()
            .filter(|s| s.page == page)
            .map(|s| s.height_mm)
            .sum()
    };

    let page1_height_mm = geometry.margins_mm() + content_on(1);
    let page2_height_mm = match geometry.split {
        PageSplit::FixedBreak => geometry.margins_mm() + content_on(2),
        PageSplit::SinglePage => 0.0,
    };
    let total_height_mm = page1_height_mm + page2_height_mm;

    HeightEstimate {
        total_height_mm,
        page1_height_mm,
        page2_height_mm,
        estimated_pages: total_height_mm / geometry.page_height_mm,
        page_height_mm: geometry.page_height_mm,
        per_section_height_mm,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-section contributions
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

fn titled(config: &FitConfig, body_mm: f32, non_empty: bool) -> f32 {
    if non_empty {
        config.geometry.section_title_mm + body_mm
    } else {
        0.0
    }
}

fn header_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let b = &config.budgets;
    let contact = &content.contact;

    let mut height = b.full_name.height.fixed_height();
    height += b
        .address_lines
        .height
        .counted_height(contact.rendered_address_lines().len());
    if !contact.contact_line().is_empty() {
        height += b.contact_line.height.fixed_height();
    }
    height + config.geometry.header_block_mm
}

fn education_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let b = &config.budgets;
    let body: f32 = content
        .education
        .iter()
        .map(|entry| {
            let details: f32 = entry
                .details
                .iter()
                .map(|d| b.education_details.height.wrapped_height(char_len(d)))
                .sum();
            let specialization = entry
                .specialization
                .as_deref()
                .map(|s| b.education_specialization.height.wrapped_height(char_len(s)))
                .unwrap_or(0.0);
            details + specialization
        })
        .sum::<f32>()
        + b.education_entries
            .height
            .counted_height(content.education.len());
    titled(config, body, !content.education.is_empty())
}

fn work_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let b = &config.budgets;
    let bullets: f32 = content
        .work_experience
        .iter()
        .flat_map(|w| w.bullets.iter())
        .map(|text| b.work_bullet_text.height.wrapped_height(char_len(text)))
        .sum();
    let entries = b
        .work_entries
        .height
        .counted_height(content.work_experience.len());
    titled(config, entries + bullets, !content.work_experience.is_empty())
}

fn profile_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let chars = char_len(content.profile_text());
    titled(
        config,
        config.budgets.profile.height.wrapped_height(chars),
        chars > 0,
    )
}

fn further_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let b = &config.budgets;
    let bullets: f32 = content
        .further_experience
        .iter()
        .flat_map(|f| f.bullets.iter())
        .map(|text| b.further_bullet_text.height.wrapped_height(char_len(text)))
        .sum();
    let entries = b
        .further_entries
        .height
        .counted_height(content.further_experience.len());
    titled(
        config,
        entries + bullets,
        !content.further_experience.is_empty(),
    )
}

fn languages_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let body = config
        .budgets
        .languages
        .height
        .counted_height(content.languages.len());
    titled(config, body, !content.languages.is_empty())
}

fn skills_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let b = &config.budgets;
    let non_empty: Vec<_> = content
        .skills
        .iter()
        .filter(|group| !group.items.is_empty())
        .collect();

    let body: f32 = non_empty
        .iter()
        .map(|group| {
            let joined = group.items.join(", ");
            b.skills.height.counted_height(1) + b.skill_item.height.wrapped_height(char_len(&joined))
        })
        .sum();
    titled(config, body, !non_empty.is_empty())
}

fn interests_height(content: &ContentModel, config: &FitConfig) -> f32 {
    let chars = char_len(&content.interests);
    titled(
        config,
        config.budgets.interests.height.wrapped_height(chars),
        chars > 0,
    )
}

fn references_height(content: &ContentModel, config: &FitConfig) -> f32 {
    // Never empty: blank references render the filler sentence.
    let chars = char_len(content.references_or_default());
    titled(
        config,
        config.budgets.references.height.wrapped_height(chars),
        true,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
