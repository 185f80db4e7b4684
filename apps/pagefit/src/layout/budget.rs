//! Field budgets and page geometry for the fixed A4 résumé template.
//!
//! `FitConfig` is the single source of truth for both the height estimator and
//! the limit validator. It is an immutable value passed into every component,
//! so the 2-page CV and the 1-page cover letter are just two instances.
//!
//! Heights are in millimetres. Character counts are Unicode scalar values,
//! which is close enough for Latin-script CVs: the real renderer decides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Field identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Every budgeted field in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    FullName,
    AddressLines,
    ContactLine,
    Profile,
    WorkEntries,
    WorkBullets,
    WorkBulletText,
    EducationEntries,
    EducationDetails,
    EducationSpecialization,
    FurtherEntries,
    FurtherBullets,
    FurtherBulletText,
    Languages,
    LanguageItem,
    Skills,
    SkillItem,
    Interests,
    References,
}

impl FieldId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::FullName => "full_name",
            FieldId::AddressLines => "contact.address_lines",
            FieldId::ContactLine => "contact.line",
            FieldId::Profile => "profile",
            FieldId::WorkEntries => "work_experience",
            FieldId::WorkBullets => "work_experience.bullets",
            FieldId::WorkBulletText => "work_experience.bullet_text",
            FieldId::EducationEntries => "education",
            FieldId::EducationDetails => "education.details",
            FieldId::EducationSpecialization => "education.specialization",
            FieldId::FurtherEntries => "further_experience",
            FieldId::FurtherBullets => "further_experience.bullets",
            FieldId::FurtherBulletText => "further_experience.bullet_text",
            FieldId::Languages => "languages",
            FieldId::LanguageItem => "languages.item",
            FieldId::Skills => "skills",
            FieldId::SkillItem => "skills.item",
            FieldId::Interests => "interests",
            FieldId::References => "references",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Budget entries
// ────────────────────────────────────────────────────────────────────────────

/// How a field turns into vertical space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum HeightRule {
    /// Always occupies the same height.
    Fixed { mm: f32 },
    /// Greedy character wrap: `ceil(chars / chars_per_line) * line_height_mm`.
    Wrapped {
        chars_per_line: usize,
        line_height_mm: f32,
    },
    /// Per list entry (date/employer/title rows plus spacing).
    PerEntry { mm: f32 },
    /// Per list item, one row each.
    PerItem { mm: f32 },
    /// Contributes no height on its own (its text is measured elsewhere).
    Uncounted,
}

impl HeightRule {
    /// Height of `chars` characters under a `Wrapped` rule; 0 for other rules.
    pub fn wrapped_height(&self, chars: usize) -> f32 {
        match *self {
            HeightRule::Wrapped {
                chars_per_line,
                line_height_mm,
            } => wrapped_lines(chars, chars_per_line) as f32 * line_height_mm,
            _ => 0.0,
        }
    }

    /// Height of `count` entries/items under a `PerEntry`/`PerItem` rule.
    pub fn counted_height(&self, count: usize) -> f32 {
        match *self {
            HeightRule::PerEntry { mm } | HeightRule::PerItem { mm } => count as f32 * mm,
            _ => 0.0,
        }
    }

    pub fn fixed_height(&self) -> f32 {
        match *self {
            HeightRule::Fixed { mm } => mm,
            _ => 0.0,
        }
    }
}

/// `ceil(chars / chars_per_line)`, with 0 for empty text.
pub fn wrapped_lines(chars: usize, chars_per_line: usize) -> usize {
    if chars == 0 {
        return 0;
    }
    chars.div_ceil(chars_per_line.max(1))
}

/// Nominal size of a field plus its height contribution.
///
/// `nominal` is in the field's own unit: characters for text, entries for
/// lists, items for skill/language lists, bullets per entry for bullet lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBudget {
    pub nominal: usize,
    pub height: HeightRule,
}

impl FieldBudget {
    const fn new(nominal: usize, height: HeightRule) -> Self {
        Self { nominal, height }
    }
}

const LINE_MM: f32 = 4.5;

const fn wrapped(chars_per_line: usize) -> HeightRule {
    HeightRule::Wrapped {
        chars_per_line,
        line_height_mm: LINE_MM,
    }
}

/// Per-field budgets for the CV template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBudgetTable {
    pub full_name: FieldBudget,
    pub address_lines: FieldBudget,
    pub contact_line: FieldBudget,
    pub profile: FieldBudget,
    pub work_entries: FieldBudget,
    pub work_bullets: FieldBudget,
    /// Same nominal as further-experience bullets.
    pub work_bullet_text: FieldBudget,
    pub education_entries: FieldBudget,
    /// Combined characters across all details of one education entry.
    pub education_details: FieldBudget,
    pub education_specialization: FieldBudget,
    pub further_entries: FieldBudget,
    pub further_bullets: FieldBudget,
    pub further_bullet_text: FieldBudget,
    pub languages: FieldBudget,
    pub language_item: FieldBudget,
    /// Items per skills list; height is the label row of each non-empty list.
    pub skills: FieldBudget,
    /// Per-item character cap; height wraps the comma-joined list.
    pub skill_item: FieldBudget,
    pub interests: FieldBudget,
    pub references: FieldBudget,
}

impl Default for FieldBudgetTable {
    fn default() -> Self {
        Self {
            full_name: FieldBudget::new(50, HeightRule::Fixed { mm: 8.0 }),
            address_lines: FieldBudget::new(2, HeightRule::PerItem { mm: LINE_MM }),
            contact_line: FieldBudget::new(80, HeightRule::Fixed { mm: LINE_MM }),
            profile: FieldBudget::new(450, wrapped(95)),
            work_entries: FieldBudget::new(4, HeightRule::PerEntry { mm: 11.0 }),
            work_bullets: FieldBudget::new(4, HeightRule::Uncounted),
            work_bullet_text: FieldBudget::new(200, wrapped(90)),
            education_entries: FieldBudget::new(3, HeightRule::PerEntry { mm: 10.0 }),
            education_details: FieldBudget::new(150, wrapped(90)),
            education_specialization: FieldBudget::new(100, wrapped(90)),
            further_entries: FieldBudget::new(5, HeightRule::PerEntry { mm: 6.0 }),
            further_bullets: FieldBudget::new(3, HeightRule::Uncounted),
            further_bullet_text: FieldBudget::new(200, wrapped(90)),
            languages: FieldBudget::new(6, HeightRule::PerItem { mm: LINE_MM }),
            language_item: FieldBudget::new(40, HeightRule::Uncounted),
            skills: FieldBudget::new(10, HeightRule::PerEntry { mm: 5.0 }),
            skill_item: FieldBudget::new(60, wrapped(90)),
            interests: FieldBudget::new(300, wrapped(70)),
            references: FieldBudget::new(300, wrapped(70)),
        }
    }
}

/// Nominal letter body: roughly 350 words, well under a page at 95 chars per line.
const LETTER_BODY_CHARS: usize = 2200;

impl FieldBudgetTable {
    /// Budgets for the one-page cover letter. The letter body travels in
    /// `profile`; every other field keeps the CV budget.
    pub fn cover_letter() -> Self {
        Self {
            profile: FieldBudget::new(LETTER_BODY_CHARS, wrapped(95)),
            ..Self::default()
        }
    }

    pub fn get(&self, field: FieldId) -> &FieldBudget {
        match field {
            FieldId::FullName => &self.full_name,
            FieldId::AddressLines => &self.address_lines,
            FieldId::ContactLine => &self.contact_line,
            FieldId::Profile => &self.profile,
            FieldId::WorkEntries => &self.work_entries,
            FieldId::WorkBullets => &self.work_bullets,
            FieldId::WorkBulletText => &self.work_bullet_text,
            FieldId::EducationEntries => &self.education_entries,
            FieldId::EducationDetails => &self.education_details,
            FieldId::EducationSpecialization => &self.education_specialization,
            FieldId::FurtherEntries => &self.further_entries,
            FieldId::FurtherBullets => &self.further_bullets,
            FieldId::FurtherBulletText => &self.further_bullet_text,
            FieldId::Languages => &self.languages,
            FieldId::LanguageItem => &self.language_item,
            FieldId::Skills => &self.skills,
            FieldId::SkillItem => &self.skill_item,
            FieldId::Interests => &self.interests,
            FieldId::References => &self.references,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page geometry
// ────────────────────────────────────────────────────────────────────────────

/// Where the template breaks between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSplit {
    /// Page 1 = header + education + work experience; page 2 = everything else.
    FixedBreak,
    /// Everything on page 1 (cover-letter profile).
    SinglePage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_height_mm: f32,
    /// Counted on every page.
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    /// Spacing below the header block.
    pub header_block_mm: f32,
    /// Height of a section title row; only non-empty sections get one.
    pub section_title_mm: f32,
    pub split: PageSplit,
}

/// A4, 15 mm top/bottom margins.
pub fn a4_geometry(split: PageSplit) -> PageGeometry {
    PageGeometry {
        page_height_mm: 297.0,
        margin_top_mm: 15.0,
        margin_bottom_mm: 15.0,
        header_block_mm: 6.0,
        section_title_mm: 8.0,
        split,
    }
}

impl PageGeometry {
    pub fn margins_mm(&self) -> f32 {
        self.margin_top_mm + self.margin_bottom_mm
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fit configuration
// ────────────────────────────────────────────────────────────────────────────

/// Auxiliary caps applied once bullet leveling is exhausted, gated by tier level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCaps {
    /// Level from which languages and skills lists are capped.
    pub aux_lists_level: u8,
    pub max_languages: usize,
    pub max_skills_per_list: usize,
    /// Always applied to further experience: (entries, bullets per entry).
    pub further_cap: (usize, usize),
    /// Level from which the tight caps below apply.
    pub tight_level: u8,
    pub further_tight_cap: (usize, usize),
    pub max_education: usize,
    pub max_work_entries: usize,
}

impl Default for TierCaps {
    fn default() -> Self {
        Self {
            aux_lists_level: 5,
            max_languages: 6,
            max_skills_per_list: 10,
            further_cap: (5, 3),
            tight_level: 7,
            further_tight_cap: (4, 2),
            max_education: 2,
            max_work_entries: 4,
        }
    }
}

/// Which document variant a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    Cv,
    CoverLetter,
}

/// Soft threshold in percent of nominal (1.10): a warning from there upward.
pub const SOFT_PERCENT: usize = 110;
/// Hard threshold in percent of nominal (2.00): anything above blocks rendering.
pub const HARD_PERCENT: usize = 200;

/// Everything the estimator, validator, planner and fit loop are tuned by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    pub kind: DocumentKind,
    /// Exact page count the rendered document must occupy.
    pub target_pages: u32,
    /// `_total_pages` fires when the coarse estimate exceeds this.
    pub max_estimated_pages: f32,
    /// Fit loop iterations before giving up.
    pub step_budget: u32,
    /// Bullet-leveling floors, tried in order (first pass, then fallback).
    pub bullet_floors: Vec<usize>,
    /// Highest auxiliary-cap tier.
    pub max_tier_level: u8,
    /// Steps per scheduled tier increase.
    pub steps_per_tier: u32,
    pub tier_caps: TierCaps,
    pub geometry: PageGeometry,
    pub budgets: FieldBudgetTable,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self::cv()
    }
}

impl FitConfig {
    /// Two-page CV on the fixed A4 template.
    pub fn cv() -> Self {
        Self {
            kind: DocumentKind::Cv,
            target_pages: 2,
            max_estimated_pages: 2.0,
            step_budget: 40,
            bullet_floors: vec![3, 2],
            max_tier_level: 8,
            steps_per_tier: 5,
            tier_caps: TierCaps::default(),
            geometry: a4_geometry(PageSplit::FixedBreak),
            budgets: FieldBudgetTable::default(),
        }
    }

    /// Single-page cover letter: letter-sized body budget, no page break.
    pub fn cover_letter() -> Self {
        Self {
            kind: DocumentKind::CoverLetter,
            target_pages: 1,
            max_estimated_pages: 1.0,
            geometry: a4_geometry(PageSplit::SinglePage),
            budgets: FieldBudgetTable::cover_letter(),
            ..Self::cv()
        }
    }

    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Cv => Self::cv(),
            DocumentKind::CoverLetter => Self::cover_letter(),
        }
    }

    /// Loads a config from a JSON file. Missing keys are not filled in: the
    /// file must describe the full configuration.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fit config '{}'", path.display()))?;
        let config: FitConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid fit config JSON in '{}'", path.display()))?;
        config.check()?;
        Ok(config)
    }

    /// Rejects configurations the fit loop cannot run with.
    pub fn check(&self) -> Result<()> {
        anyhow::ensure!(self.target_pages >= 1, "target_pages must be at least 1");
        anyhow::ensure!(self.step_budget >= 1, "step_budget must be at least 1");
        anyhow::ensure!(
            !self.bullet_floors.is_empty(),
            "bullet_floors must name at least one floor"
        );
        anyhow::ensure!(self.steps_per_tier >= 1, "steps_per_tier must be at least 1");
        anyhow::ensure!(
            self.geometry.page_height_mm > self.geometry.margins_mm(),
            "page height must exceed the margins"
        );
        Ok(())
    }

    /// `ceil(nominal * 1.10)`, in integer arithmetic so 300 maps to exactly 330.
    pub fn soft_limit(nominal: usize) -> usize {
        (nominal * SOFT_PERCENT).div_ceil(100)
    }

    pub fn hard_limit(nominal: usize) -> usize {
        nominal * HARD_PERCENT / 100
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
