use std::collections::BTreeMap;

use serde::Deserialize;
use shared::{
    domain::SkillLevel,
    protocol::{Skill, SubmissionPayload, WorkDataAndSkills},
};

/// Raw form contents. Values are passed through untouched; nothing is trimmed
/// or validated before submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormInput {
    pub personal: BTreeMap<String, String>,
    pub work: BTreeMap<String, String>,
    pub knowledge: BTreeMap<String, String>,
    pub skills: SkillInputs,
    pub certifications: CertificationInputs,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkillInputs {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertificationInputs {
    pub first: String,
    pub second: String,
}

/// Slot 1 is always the high-level skill and slot 2 the medium one; empty
/// slots are skipped.
pub fn assemble_payload(form: &FormInput) -> SubmissionPayload {
    let skills = [
        (&form.skills.primary, SkillLevel::High),
        (&form.skills.secondary, SkillLevel::Medium),
    ]
    .into_iter()
    .filter(|(name, _)| !name.is_empty())
    .map(|(name, level)| Skill {
        name: name.clone(),
        level,
    })
    .collect();

    let certifications = [&form.certifications.first, &form.certifications.second]
        .into_iter()
        .filter(|name| !name.is_empty())
        .cloned()
        .collect();

    SubmissionPayload {
        personal_data: form.personal.clone(),
        work_data_and_skills: WorkDataAndSkills::new(form.work.clone(), skills, certifications),
        knowledge_percentages: form.knowledge.clone(),
    }
}
