//! Limit Validator — classifies content size against the field budgets.
//!
//! # Threshold rules
//! - `value >= ceil(nominal × 1.10)` → warning (never blocks)
//! - `value >  nominal × 2.00`       → hard error (blocks rendering)
//! - page 1 / page 2 estimate above the physical page height → hard layout error
//! - coarse page estimate above `max_estimated_pages`        → hard page-count error
//!
//! The hard ceiling is deliberately wide: wrapped-line height decides page fit,
//! not raw character counts. Validation never mutates content.

use serde::{Deserialize, Serialize};

use crate::layout::budget::{FieldBudget, FieldId, FitConfig};
use crate::layout::estimator::{char_len, estimate_height, HeightEstimate};
use crate::models::ContentModel;

pub const PAGE1_OVERFLOW_FIELD: &str = "_page1_overflow";
pub const PAGE2_OVERFLOW_FIELD: &str = "_page2_overflow";
pub const TOTAL_PAGES_FIELD: &str = "_total_pages";

// ────────────────────────────────────────────────────────────────────────────
// Result types
// ────────────────────────────────────────────────────────────────────────────

/// What kind of limit a hard error violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// A single field is more than twice its nominal size.
    ContentLimitExceeded,
    /// A page's estimated height exceeds the physical page. Fixed by removing
    /// whole entries, not by shortening sentences.
    LayoutOverflow,
    /// The coarse total-height page estimate exceeds the configured maximum.
    PageCount,
}

impl LimitKind {
    /// Errors synthesized from the height estimate rather than a field's size.
    pub fn is_layout_derived(&self) -> bool {
        matches!(self, LimitKind::LayoutOverflow | LimitKind::PageCount)
    }
}

/// One blocking violation, precise enough for a caller to build a remediation hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path, e.g. `work_experience[1].bullets[2]`, or a `_`-prefixed pseudo-field.
    pub field: String,
    pub kind: LimitKind,
    pub current_value: f64,
    pub limit: f64,
    pub excess: f64,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub estimated_pages: f32,
    pub estimated_height_mm: f32,
    pub details: HeightEstimate,
}

impl ValidationResult {
    /// Errors that come from a field's own size.
    pub fn content_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| !e.kind.is_layout_derived())
    }

    pub fn layout_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.kind.is_layout_derived())
    }

    pub fn has_content_errors(&self) -> bool {
        self.content_errors().next().is_some()
    }

    #[cfg(test)]
    pub fn error_for(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Unit {
    Chars,
    Entries,
    Items,
    Bullets,
}

impl Unit {
    fn label(self) -> &'static str {
        match self {
            Unit::Chars => "characters",
            Unit::Entries => "entries",
            Unit::Items => "items",
            Unit::Bullets => "bullets",
        }
    }

    fn remedy(self, hard: usize, nominal: usize) -> String {
        match self {
            Unit::Chars => format!(
                "Shorten to at most {hard} characters (ideally {nominal} or fewer)"
            ),
            Unit::Entries => format!(
                "Remove the oldest entries to keep at most {hard} (ideally {nominal})"
            ),
            Unit::Items => format!("Keep at most {hard} items (ideally {nominal})"),
            Unit::Bullets => format!(
                "Drop the weakest bullets to keep at most {hard} (ideally {nominal})"
            ),
        }
    }
}

/// Accumulates warnings and errors for one validation run.
struct Checker<'a> {
    config: &'a FitConfig,
    errors: Vec<ValidationError>,
    warnings: Vec<String>,
}

impl<'a> Checker<'a> {
    fn new(config: &'a FitConfig) -> Self {
        Self {
            config,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn budget(&self, id: FieldId) -> &FieldBudget {
        self.config.budgets.get(id)
    }

    fn check(&mut self, field: String, id: FieldId, value: usize, unit: Unit) {
        let nominal = self.budget(id).nominal;
        let soft = FitConfig::soft_limit(nominal);
        let hard = FitConfig::hard_limit(nominal);

        if value > hard {
            self.errors.push(ValidationError {
                message: format!(
                    "{field} has {value} {}, above the hard limit of {hard}",
                    unit.label()
                ),
                suggestion: unit.remedy(hard, nominal),
                field,
                kind: LimitKind::ContentLimitExceeded,
                current_value: value as f64,
                limit: hard as f64,
                excess: (value - hard) as f64,
            });
        } else if value > 0 && value >= soft {
            self.warnings.push(format!(
                "{field}: {value} {} exceeds the recommended {nominal} for {} (soft limit {soft})",
                unit.label(),
                id.as_str()
            ));
        }
    }

    fn layout(&mut self, field: &str, kind: LimitKind, current: f64, limit: f64, suggestion: &str) {
        let message = match kind {
            LimitKind::PageCount => format!(
                "Estimated {current:.2} pages, above the maximum of {limit:.2}"
            ),
            _ => format!(
                "Estimated height {current:.1}mm exceeds the page height of {limit:.1}mm"
            ),
        };
        self.errors.push(ValidationError {
            field: field.to_string(),
            kind,
            current_value: current,
            limit,
            excess: current - limit,
            message,
            suggestion: suggestion.to_string(),
        });
    }
}

/// Validates `content` against the budgets in `config`.
///
/// Field errors come first in template order, then the layout pseudo-fields.
pub fn validate_limits(content: &ContentModel, config: &FitConfig) -> ValidationResult {
    let mut c = Checker::new(config);

    // Header
    c.check(
        "full_name".to_string(),
        FieldId::FullName,
        char_len(&content.contact.name),
        Unit::Chars,
    );
    c.check(
        "contact.address_lines".to_string(),
        FieldId::AddressLines,
        content.contact.rendered_address_lines().len(),
        Unit::Items,
    );
    c.check(
        "contact.line".to_string(),
        FieldId::ContactLine,
        char_len(&content.contact.contact_line()),
        Unit::Chars,
    );
    c.check(
        "profile".to_string(),
        FieldId::Profile,
        char_len(content.profile_text()),
        Unit::Chars,
    );

    // Work experience
    c.check(
        "work_experience".to_string(),
        FieldId::WorkEntries,
        content.work_experience.len(),
        Unit::Entries,
    );
    for (i, entry) in content.work_experience.iter().enumerate() {
        c.check(
            format!("work_experience[{i}].bullets"),
            FieldId::WorkBullets,
            entry.bullets.len(),
            Unit::Bullets,
        );
        for (j, bullet) in entry.bullets.iter().enumerate() {
            c.check(
                format!("work_experience[{i}].bullets[{j}]"),
                FieldId::WorkBulletText,
                char_len(bullet),
                Unit::Chars,
            );
        }
    }

    // Education
    c.check(
        "education".to_string(),
        FieldId::EducationEntries,
        content.education.len(),
        Unit::Entries,
    );
    for (i, entry) in content.education.iter().enumerate() {
        let combined: usize = entry.details.iter().map(|d| char_len(d)).sum();
        c.check(
            format!("education[{i}].details"),
            FieldId::EducationDetails,
            combined,
            Unit::Chars,
        );
        if let Some(spec) = entry.specialization.as_deref() {
            c.check(
                format!("education[{i}].specialization"),
                FieldId::EducationSpecialization,
                char_len(spec),
                Unit::Chars,
            );
        }
    }

    // Further experience
    c.check(
        "further_experience".to_string(),
        FieldId::FurtherEntries,
        content.further_experience.len(),
        Unit::Entries,
    );
    for (i, entry) in content.further_experience.iter().enumerate() {
        c.check(
            format!("further_experience[{i}].bullets"),
            FieldId::FurtherBullets,
            entry.bullets.len(),
            Unit::Bullets,
        );
        for (j, bullet) in entry.bullets.iter().enumerate() {
            c.check(
                format!("further_experience[{i}].bullets[{j}]"),
                FieldId::FurtherBulletText,
                char_len(bullet),
                Unit::Chars,
            );
        }
    }

    // Languages and skills
    c.check(
        "languages".to_string(),
        FieldId::Languages,
        content.languages.len(),
        Unit::Items,
    );
    for (i, language) in content.languages.iter().enumerate() {
        c.check(
            format!("languages[{i}]"),
            FieldId::LanguageItem,
            char_len(&language.display_text()),
            Unit::Chars,
        );
    }
    for (g, group) in content.skills.iter().enumerate() {
        c.check(
            format!("skills[{g}].items"),
            FieldId::Skills,
            group.items.len(),
            Unit::Items,
        );
        for (k, item) in group.items.iter().enumerate() {
            c.check(
                format!("skills[{g}].items[{k}]"),
                FieldId::SkillItem,
                char_len(item),
                Unit::Chars,
            );
        }
    }

    // Free text
    c.check(
        "interests".to_string(),
        FieldId::Interests,
        char_len(&content.interests),
        Unit::Chars,
    );
    c.check(
        "references".to_string(),
        FieldId::References,
        char_len(&content.references),
        Unit::Chars,
    );

    // Layout pseudo-fields from the per-page estimate
    let estimate = estimate_height(content, config);
    if estimate.page1_overflows() {
        c.layout(
            PAGE1_OVERFLOW_FIELD,
            LimitKind::LayoutOverflow,
            estimate.page1_height_mm as f64,
            estimate.page_height_mm as f64,
            "Remove an entire work-experience or education entry from page 1",
        );
    }
    if estimate.page2_overflows() {
        c.layout(
            PAGE2_OVERFLOW_FIELD,
            LimitKind::LayoutOverflow,
            estimate.page2_height_mm as f64,
            estimate.page_height_mm as f64,
            "Remove a further-experience entry or trim languages, skills or interests on page 2",
        );
    }
    if estimate.estimated_pages > config.max_estimated_pages {
        c.layout(
            TOTAL_PAGES_FIELD,
            LimitKind::PageCount,
            estimate.estimated_pages as f64,
            config.max_estimated_pages as f64,
            "Reduce overall content: fewer bullets per role or fewer entries",
        );
    }

    ValidationResult {
        is_valid: c.errors.is_empty(),
        errors: c.errors,
        warnings: c.warnings,
        estimated_pages: estimate.estimated_pages,
        estimated_height_mm: estimate.total_height_mm,
        details: estimate,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
