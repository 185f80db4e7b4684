use serde::{Deserialize, Serialize};

/// Filler rendered in the references block when the candidate left it empty.
pub const DEFAULT_REFERENCES: &str = "References available upon request.";

/// Only the first two address lines make it into the header.
pub const MAX_ADDRESS_LINES: usize = 2;

/// The résumé as handed to the page-fit engine.
///
/// Arrives already normalized by the upstream pipeline. Every list is ordered
/// most-recent-first, and that order carries meaning: shrinking only ever
/// truncates from the tail or trims an entry in place, never reorders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentModel {
    pub contact: Contact,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub work_experience: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub further_experience: Vec<FurtherEntry>,
    #[serde(default)]
    pub languages: Vec<Language>,
    /// One or two labelled lists (e.g. "IT / AI" and "Technical / Operational").
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub references: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkEntry {
    #[serde(default)]
    pub date_range: String,
    #[serde(default)]
    pub employer: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub date_range: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// Side projects, volunteering, certifications — anything rendered on page 2
/// with its own bullet list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FurtherEntry {
    #[serde(default)]
    pub date_range: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    #[serde(default)]
    pub level: String,
}

impl Language {
    /// Text as it appears on the page, e.g. "German (native)".
    pub fn display_text(&self) -> String {
        if self.level.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.level)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillGroup {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl Contact {
    /// Address lines that are actually rendered (at most two).
    pub fn rendered_address_lines(&self) -> &[String] {
        let kept = self.address_lines.len().min(MAX_ADDRESS_LINES);
        &self.address_lines[..kept]
    }

    /// Phone and email share one header row.
    pub fn contact_line(&self) -> String {
        match (self.phone.trim(), self.email.trim()) {
            ("", "") => String::new(),
            (phone, "") => phone.to_string(),
            ("", email) => email.to_string(),
            (phone, email) => format!("{phone} | {email}"),
        }
    }
}

impl ContentModel {
    /// References text with the filler sentence substituted for an empty block.
    pub fn references_or_default(&self) -> &str {
        if self.references.trim().is_empty() {
            DEFAULT_REFERENCES
        } else {
            &self.references
        }
    }

    pub fn profile_text(&self) -> &str {
        self.profile.as_deref().unwrap_or("")
    }

    pub fn work_bullet_counts(&self) -> Vec<usize> {
        self.work_experience.iter().map(|w| w.bullets.len()).collect()
    }

    /// Total bullets across work and further experience.
    pub fn total_bullets(&self) -> usize {
        let work: usize = self.work_experience.iter().map(|w| w.bullets.len()).sum();
        let further: usize = self
            .further_experience
            .iter()
            .map(|f| f.bullets.len())
            .sum();
        work + further
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
