//! Participant, Gender, Grade and AgeGroup data structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a participant (used in match slots and lookups).
pub type ParticipantId = Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

/// Skill tier, ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillTier {
    Rookie,
    D,
    C,
    B,
    A,
    S,
    #[serde(rename = "SS")]
    Ss,
}

impl SkillTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillTier::Rookie => "ROOKIE",
            SkillTier::D => "D",
            SkillTier::C => "C",
            SkillTier::B => "B",
            SkillTier::A => "A",
            SkillTier::S => "S",
            SkillTier::Ss => "SS",
        }
    }

    /// Parse a wire value. Accepts the regional labels of the older forms ("D조", "초심").
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().trim_end_matches('조');
        Some(match value.to_ascii_uppercase().as_str() {
            "ROOKIE" | "초심" => SkillTier::Rookie,
            "D" => SkillTier::D,
            "C" => SkillTier::C,
            "B" => SkillTier::B,
            "A" => SkillTier::A,
            "S" => SkillTier::S,
            "SS" => SkillTier::Ss,
            _ => return None,
        })
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade policy of a session: which grade scope participants are ranked in.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeType {
    #[default]
    Regional,
    National,
}

impl fmt::Display for GradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeType::Regional => f.write_str("REGIONAL"),
            GradeType::National => f.write_str("NATIONAL"),
        }
    }
}

/// Errors from building a grade at the boundary.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum GradeError {
    #[error("Unknown grade: {0}")]
    Unknown(String),
    #[error("Grade {0} is not a regional grade")]
    NotRegional(SkillTier),
    #[error("No grade given")]
    Missing,
}

/// A participant's grade, scoped regionally or nationally.
///
/// Regional grades only go up to A; S and SS are national tiers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrade", into = "RawGrade")]
pub enum Grade {
    Regional(SkillTier),
    National(SkillTier),
}

impl Grade {
    pub fn regional(tier: SkillTier) -> Result<Self, GradeError> {
        if tier > SkillTier::A {
            return Err(GradeError::NotRegional(tier));
        }
        Ok(Grade::Regional(tier))
    }

    pub fn national(tier: SkillTier) -> Self {
        Grade::National(tier)
    }

    pub fn new(grade_type: GradeType, tier: SkillTier) -> Result<Self, GradeError> {
        match grade_type {
            GradeType::Regional => Self::regional(tier),
            GradeType::National => Ok(Self::national(tier)),
        }
    }

    /// Resolve the three optional grade fields seen on the wire into one grade.
    ///
    /// `national` wins over `local`, and `local` over the single `legacy` field,
    /// which is read under `fallback` scope.
    pub fn resolve(
        local: Option<&str>,
        national: Option<&str>,
        legacy: Option<&str>,
        fallback: GradeType,
    ) -> Result<Self, GradeError> {
        fn present(s: Option<&str>) -> Option<&str> {
            s.filter(|s| !s.trim().is_empty())
        }
        fn parse(s: &str) -> Result<SkillTier, GradeError> {
            SkillTier::parse(s).ok_or_else(|| GradeError::Unknown(s.to_string()))
        }

        if let Some(n) = present(national) {
            return Ok(Self::national(parse(n)?));
        }
        if let Some(l) = present(local) {
            return Self::regional(parse(l)?);
        }
        match present(legacy) {
            Some(g) => Self::new(fallback, parse(g)?),
            None => Err(GradeError::Missing),
        }
    }

    pub fn tier(self) -> SkillTier {
        match self {
            Grade::Regional(t) | Grade::National(t) => t,
        }
    }

    pub fn grade_type(self) -> GradeType {
        match self {
            Grade::Regional(_) => GradeType::Regional,
            Grade::National(_) => GradeType::National,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGrade {
    grade_type: GradeType,
    tier: SkillTier,
}

impl TryFrom<RawGrade> for Grade {
    type Error = GradeError;

    fn try_from(raw: RawGrade) -> Result<Self, Self::Error> {
        Grade::new(raw.grade_type, raw.tier)
    }
}

impl From<Grade> for RawGrade {
    fn from(g: Grade) -> Self {
        RawGrade {
            grade_type: g.grade_type(),
            tier: g.tier(),
        }
    }
}

/// Decade-of-life bracket (10, 20, ..., 70).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AgeGroup(u8);

impl AgeGroup {
    pub const ALL: [u8; 7] = [10, 20, 30, 40, 50, 60, 70];

    pub fn new(decade: u8) -> Option<Self> {
        Self::ALL.contains(&decade).then_some(Self(decade))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for AgeGroup {
    fn default() -> Self {
        Self(30)
    }
}

impl TryFrom<u8> for AgeGroup {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        AgeGroup::new(v).ok_or_else(|| format!("Invalid age group: {v}"))
    }
}

impl From<AgeGroup> for u8 {
    fn from(a: AgeGroup) -> Self {
        a.0
    }
}

/// A registered participant of one session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub gender: Gender,
    pub grade: Grade,
    pub age_group: AgeGroup,
}

impl Participant {
    pub fn new(name: impl Into<String>, gender: Gender, grade: Grade, age_group: AgeGroup) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            gender,
            grade,
            age_group,
        }
    }
}

/// A single-field edit of an existing participant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ParticipantUpdate {
    Gender(Gender),
    Grade(Grade),
    AgeGroup(AgeGroup),
}
