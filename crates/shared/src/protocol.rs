use std::{collections::BTreeMap, fmt};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;

use crate::{
    domain::{CandidateId, SkillLevel},
    error::ProtocolError,
};

pub const SUCCESS_STATUS: &str = "success";

const SKILLS_KEY: &str = "habilidades";
const CERTIFICATIONS_KEY: &str = "certificaciones";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(rename = "datos_personales")]
    pub personal_data: BTreeMap<String, String>,
    #[serde(rename = "datos_laborales_y_habilidades")]
    pub work_data_and_skills: WorkDataAndSkills,
    #[serde(rename = "porcentajes_conocimiento")]
    pub knowledge_percentages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkDataAndSkills {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    #[serde(rename = "habilidades")]
    pub skills: Vec<Skill>,
    #[serde(rename = "certificaciones")]
    pub certifications: Vec<String>,
}

impl WorkDataAndSkills {
    /// Raw fields named like the list keys are dropped; the lists win.
    pub fn new(
        mut fields: BTreeMap<String, String>,
        skills: Vec<Skill>,
        certifications: Vec<String>,
    ) -> Self {
        fields.remove(SKILLS_KEY);
        fields.remove(CERTIFICATIONS_KEY);
        Self {
            fields,
            skills,
            certifications,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nivel")]
    pub level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub current_candidate: CurrentCandidate,
    pub best_candidate: BestCandidate,
    #[serde(default)]
    pub bias_summary: BiasSummary,
}

impl ResultSet {
    /// Whether the server's `is_best` flag agrees with id equality. Only
    /// meaningful when the server sent the current candidate's id.
    pub fn winner_flag_consistent(&self) -> Option<bool> {
        let id = self.current_candidate.id.as_ref()?;
        Some((id == &self.best_candidate.id) == self.current_candidate.is_best)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CandidateId>,
    pub score: f64,
    pub is_best: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCandidate {
    pub id: CandidateId,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasRow {
    pub category: String,
    pub population: f64,
    pub top_selected: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiasColumn {
    pub name: String,
    pub rows: Vec<BiasRow>,
}

/// Per-column bias rows, kept in the order the columns appeared in the
/// response object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BiasSummary {
    columns: Vec<BiasColumn>,
}

impl BiasSummary {
    pub fn new(columns: Vec<BiasColumn>) -> Self {
        let mut summary = Self::default();
        for column in columns {
            summary.insert(column.name, column.rows);
        }
        summary
    }

    /// A repeated column name keeps its first position and takes the newest rows.
    pub fn insert(&mut self, name: String, rows: Vec<BiasRow>) {
        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(existing) => existing.rows = rows,
            None => self.columns.push(BiasColumn { name, rows }),
        }
    }

    pub fn columns(&self) -> &[BiasColumn] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

impl Serialize for BiasSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.name, &column.rows)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BiasSummary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BiasSummaryVisitor;

        impl<'de> Visitor<'de> for BiasSummaryVisitor {
            type Value = BiasSummary;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column name to bias rows")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<BiasSummary, A::Error> {
                let mut summary = BiasSummary::default();
                while let Some((name, rows)) = access.next_entry::<String, Vec<BiasRow>>()? {
                    summary.insert(name, rows);
                }
                Ok(summary)
            }
        }

        deserializer.deserialize_map(BiasSummaryVisitor)
    }
}

/// Raw response body as sent by the backend, before classification.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub id: Option<CandidateId>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_best: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReply {
    Accepted {
        id: CandidateId,
        results: ResultSet,
        is_best: Option<bool>,
    },
    Rejected {
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct AnalysisError {
    error: String,
}

impl SubmitEnvelope {
    pub fn into_reply(self) -> Result<SubmitReply, ProtocolError> {
        let status = self.status.ok_or(ProtocolError::MissingStatus)?;
        if status != SUCCESS_STATUS {
            let message = self
                .message
                .ok_or_else(|| ProtocolError::missing(status.as_str(), "message"))?;
            return Ok(SubmitReply::Rejected { message });
        }

        let results = self
            .results
            .ok_or_else(|| ProtocolError::missing(status.as_str(), "results"))?;
        let results = match serde_json::from_value::<ResultSet>(results.clone()) {
            Ok(results) => results,
            Err(err) => {
                // The backend reports "no data" as a success carrying an error object.
                if let Ok(analysis) = serde_json::from_value::<AnalysisError>(results) {
                    return Ok(SubmitReply::Rejected {
                        message: analysis.error,
                    });
                }
                return Err(ProtocolError::InvalidResults(err));
            }
        };
        let id = self
            .id
            .ok_or_else(|| ProtocolError::missing(status.as_str(), "id"))?;

        Ok(SubmitReply::Accepted {
            id,
            results,
            is_best: self.is_best,
        })
    }
}
