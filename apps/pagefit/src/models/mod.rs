pub mod content;

#[cfg(test)]
pub(crate) mod fixtures;

pub use content::{
    Contact, ContentModel, EducationEntry, FurtherEntry, Language, SkillGroup, WorkEntry,
};
