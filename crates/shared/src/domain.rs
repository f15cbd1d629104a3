use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(CandidateId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Medio")]
    Medium,
}

/// Who is looking at the results. Recruiters additionally see the bias tables
/// and, when the candidate did not win, the best score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    #[default]
    Candidate,
    Recruiter,
}

impl ViewerRole {
    pub fn from_toggle(is_recruiter: bool) -> Self {
        if is_recruiter {
            Self::Recruiter
        } else {
            Self::Candidate
        }
    }

    pub fn is_recruiter(self) -> bool {
        self == Self::Recruiter
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Candidate => Self::Recruiter,
            Self::Recruiter => Self::Candidate,
        }
    }
}
