//! Shared résumé fixtures for unit tests across the layout modules.

use super::content::{
    Contact, ContentModel, EducationEntry, FurtherEntry, Language, SkillGroup, WorkEntry,
};

const FILLER: &str = "Led the migration of billing services to an event-driven architecture, \
cutting settlement latency by 35% across four regional markets while mentoring two engineers \
and owning the on-call rotation for payment reconciliation";

/// A bullet of exactly `len` ASCII characters, tagged with `tag` so bullets stay distinct.
pub fn bullet_of_len(tag: usize, len: usize) -> String {
    let raw = format!("[{tag:03}] {}", FILLER.repeat(1 + len / FILLER.len()));
    let mut text: String = raw.chars().take(len).collect();
    // Keep the length stable under trimming.
    if text.ends_with(' ') {
        text.pop();
        text.push('.');
    }
    text
}

pub fn work_entry(index: usize, bullet_count: usize) -> WorkEntry {
    WorkEntry {
        date_range: format!("01/20{:02} – 12/20{:02}", 10 + index, 11 + index),
        employer: format!("Employer {index}"),
        location: "Berlin".to_string(),
        title: "Senior Software Engineer".to_string(),
        bullets: (0..bullet_count)
            .map(|b| bullet_of_len(index * 10 + b, 140))
            .collect(),
    }
}

/// Work entries with the given bullet counts, all other sections nominal-sized.
pub fn sample_content(bullet_counts: &[usize]) -> ContentModel {
    ContentModel {
        contact: Contact {
            name: "Max Mustermann".to_string(),
            address_lines: vec!["Hauptstrasse 1".to_string(), "10115 Berlin".to_string()],
            phone: "+49 30 123456".to_string(),
            email: "max@example.org".to_string(),
        },
        profile: Some(bullet_of_len(900, 300)),
        work_experience: bullet_counts
            .iter()
            .enumerate()
            .map(|(i, &n)| work_entry(i, n))
            .collect(),
        education: vec![
            EducationEntry {
                date_range: "2008 – 2012".to_string(),
                institution: "TU Berlin".to_string(),
                title: "M.Sc. Computer Science".to_string(),
                details: vec![bullet_of_len(700, 60), bullet_of_len(701, 60)],
                specialization: Some("Distributed Systems".to_string()),
            },
            EducationEntry {
                date_range: "2005 – 2008".to_string(),
                institution: "Universität Potsdam".to_string(),
                title: "B.Sc. Computer Science".to_string(),
                details: vec![bullet_of_len(702, 60), bullet_of_len(703, 60)],
                specialization: None,
            },
        ],
        further_experience: (0..2)
            .map(|i| FurtherEntry {
                date_range: "2019".to_string(),
                title: format!("Open-source project {i}"),
                bullets: vec![bullet_of_len(800 + i, 100), bullet_of_len(810 + i, 100)],
            })
            .collect(),
        languages: vec![
            language("German", "native"),
            language("English", "C1"),
            language("Spanish", "B1"),
        ],
        skills: vec![
            skill_group("IT / AI", 6),
            skill_group("Technical / Operational", 6),
        ],
        interests: bullet_of_len(950, 120),
        references: String::new(),
    }
}

pub fn language(name: &str, level: &str) -> Language {
    Language {
        name: name.to_string(),
        level: level.to_string(),
    }
}

pub fn skill_group(label: &str, count: usize) -> SkillGroup {
    SkillGroup {
        label: label.to_string(),
        items: (0..count).map(|i| format!("Skill {i:02}")).collect(),
    }
}

/// Everything empty except one further-experience entry carrying a single
/// bullet of `len` characters.
pub fn single_huge_further_bullet(len: usize) -> ContentModel {
    ContentModel {
        further_experience: vec![FurtherEntry {
            date_range: String::new(),
            title: String::new(),
            bullets: vec![bullet_of_len(1, len)],
        }],
        ..Default::default()
    }
}
