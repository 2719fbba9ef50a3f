use serde::{Deserialize, Serialize};

use super::ids::{StudentId, TeacherId};

/// Severity classification used on student cards and in the dashboard filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum DisabilityLevel {
    Mild,
    Moderate,
    Severe,
}

impl DisabilityLevel {
    pub const ALL: [DisabilityLevel; 3] = [
        DisabilityLevel::Mild,
        DisabilityLevel::Moderate,
        DisabilityLevel::Severe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisabilityLevel::Mild => "Mild",
            DisabilityLevel::Moderate => "Moderate",
            DisabilityLevel::Severe => "Severe",
        }
    }

    /// Parse a level name, ignoring case. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Next level, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            DisabilityLevel::Mild => DisabilityLevel::Moderate,
            DisabilityLevel::Moderate => DisabilityLevel::Severe,
            DisabilityLevel::Severe => DisabilityLevel::Mild,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            DisabilityLevel::Mild => DisabilityLevel::Severe,
            DisabilityLevel::Moderate => DisabilityLevel::Mild,
            DisabilityLevel::Severe => DisabilityLevel::Moderate,
        }
    }
}

impl std::fmt::Display for DisabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ResidenceType {
    Permanent,
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum GuardianStatus {
    #[serde(rename = "Both Parents")]
    BothParents,
    #[serde(rename = "Single Parent")]
    SingleParent,
    Guardian,
    Orphan,
}

impl std::fmt::Display for GuardianStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardianStatus::BothParents => write!(f, "Both Parents"),
            GuardianStatus::SingleParent => write!(f, "Single Parent"),
            GuardianStatus::Guardian => write!(f, "Guardian"),
            GuardianStatus::Orphan => write!(f, "Orphan"),
        }
    }
}

/// An uploaded document. `data` is opaque base64 and never decoded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Sensitive safety flags. Only shown to privileged users in the original UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SafetyFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_abused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_safe_at_home: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_family_supportive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "hasPTSD")]
    pub has_ptsd: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_self_harm_history: Option<bool>,
}

impl SafetyFlags {
    /// True if any flag is set to `true`.
    pub fn any_raised(&self) -> bool {
        [
            self.was_abused,
            self.has_ptsd,
            self.has_self_harm_history,
            self.is_safe_at_home.map(|safe| !safe),
            self.is_family_supportive.map(|supportive| !supportive),
        ]
        .into_iter()
        .any(|flag| flag == Some(true))
    }
}

/// Optional extended profile fields of a student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct StudentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disability_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence_type: Option<ResidenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_guardian_status: Option<GuardianStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_disability_id_card: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disability_id_card: Option<Attachment>,
    #[serde(flatten)]
    pub safety: SafetyFlags,
}

/// A student record as persisted in the per-user `students` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub age: u32,
    pub grade: String,
    pub disability_type: String,
    pub disability_level: DisabilityLevel,
    /// Weak reference to a teacher; cleared when that teacher is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_assigned: Option<TeacherId>,
    #[serde(flatten)]
    pub details: StudentDetails,
}

impl Student {
    pub fn is_assigned_to(&self, teacher: &TeacherId) -> bool {
        self.teacher_assigned.as_ref() == Some(teacher)
    }

    /// Apply a partial update. Fields left as `None` in the patch are kept.
    pub fn apply(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(grade) = patch.grade {
            self.grade = grade;
        }
        if let Some(disability_type) = patch.disability_type {
            self.disability_type = disability_type;
        }
        if let Some(level) = patch.disability_level {
            self.disability_level = level;
        }
        if let Some(teacher) = patch.teacher_assigned {
            self.teacher_assigned = teacher;
        }
        if let Some(details) = patch.details {
            self.details = *details;
        }
    }
}

/// Input for creating a student. The id is generated on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub age: u32,
    pub grade: String,
    pub disability_type: String,
    pub disability_level: DisabilityLevel,
    pub teacher_assigned: Option<TeacherId>,
    pub details: StudentDetails,
}

impl NewStudent {
    pub fn new(
        name: impl Into<String>,
        age: u32,
        grade: impl Into<String>,
        disability_type: impl Into<String>,
        disability_level: DisabilityLevel,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            grade: grade.into(),
            disability_type: disability_type.into(),
            disability_level,
            teacher_assigned: None,
            details: StudentDetails::default(),
        }
    }

    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            grade: self.grade,
            disability_type: self.disability_type,
            disability_level: self.disability_level,
            teacher_assigned: self.teacher_assigned,
            details: self.details,
        }
    }
}

/// Partial update for a student.
///
/// `teacher_assigned` is doubly optional: `Some(None)` clears the assignment,
/// `None` leaves it untouched. `details` replaces the whole extended block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub grade: Option<String>,
    pub disability_type: Option<String>,
    pub disability_level: Option<DisabilityLevel>,
    pub teacher_assigned: Option<Option<TeacherId>>,
    pub details: Option<Box<StudentDetails>>,
}

impl StudentPatch {
    pub fn assign_teacher(teacher: Option<TeacherId>) -> Self {
        Self {
            teacher_assigned: Some(teacher),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Student {
        NewStudent::new("John Doe", 12, "6th Grade", "Autism Spectrum Disorder", DisabilityLevel::Moderate)
            .into_student(StudentId::new("1"))
    }

    #[test]
    fn test_disability_level_parse() {
        assert_eq!(DisabilityLevel::parse("Mild"), Some(DisabilityLevel::Mild));
        assert_eq!(DisabilityLevel::parse("moderate"), Some(DisabilityLevel::Moderate));
        assert_eq!(DisabilityLevel::parse(" SEVERE "), Some(DisabilityLevel::Severe));
        assert_eq!(DisabilityLevel::parse("all"), None);
        assert_eq!(DisabilityLevel::parse(""), None);
    }

    #[test]
    fn test_disability_level_next_wraps() {
        assert_eq!(DisabilityLevel::Mild.next(), DisabilityLevel::Moderate);
        assert_eq!(DisabilityLevel::Severe.next(), DisabilityLevel::Mild);
        assert_eq!(DisabilityLevel::Mild.prev(), DisabilityLevel::Severe);
    }

    #[test]
    fn test_student_json_uses_camel_case_and_omits_absent_fields() {
        let mut student = sample();
        student.teacher_assigned = Some(TeacherId::new("teacher_9"));
        student.details.safety.has_ptsd = Some(true);
        student.details.parent_guardian_status = Some(GuardianStatus::SingleParent);

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["disabilityLevel"], "Moderate");
        assert_eq!(json["disabilityType"], "Autism Spectrum Disorder");
        assert_eq!(json["teacherAssigned"], "teacher_9");
        assert_eq!(json["hasPTSD"], true);
        assert_eq!(json["parentGuardianStatus"], "Single Parent");
        assert!(json.get("medicalHistory").is_none());
        assert!(json.get("certificates").is_none());
    }

    #[test]
    fn test_student_parses_original_layout() {
        let json = r#"{
            "id": "student_1700000000000",
            "name": "Sarah Davis",
            "age": 9,
            "grade": "3rd Grade",
            "disabilityType": "Cerebral Palsy",
            "disabilityLevel": "Moderate",
            "gender": "Female",
            "certificates": [
                {"id": "c1", "name": "scan.pdf", "type": "application/pdf", "date": "2024-01-02", "data": "AAEC"}
            ],
            "wasAbused": false,
            "isSafeAtHome": true
        }"#;

        let student: Student = serde_json::from_str(json).unwrap();
        assert_eq!(student.name, "Sarah Davis");
        assert_eq!(student.details.gender, Some(Gender::Female));
        assert_eq!(student.details.certificates.len(), 1);
        assert_eq!(student.details.certificates[0].kind, "application/pdf");
        assert_eq!(student.details.safety.is_safe_at_home, Some(true));
        assert!(student.teacher_assigned.is_none());
        assert!(!student.details.safety.any_raised());
    }

    #[test]
    fn test_apply_patch_merges_only_given_fields() {
        let mut student = sample();
        student.teacher_assigned = Some(TeacherId::new("teacher_1"));

        student.apply(StudentPatch {
            grade: Some("7th Grade".to_string()),
            ..StudentPatch::default()
        });

        assert_eq!(student.grade, "7th Grade");
        assert_eq!(student.name, "John Doe");
        assert_eq!(student.teacher_assigned, Some(TeacherId::new("teacher_1")));

        student.apply(StudentPatch::assign_teacher(None));
        assert!(student.teacher_assigned.is_none());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Gender::Female.to_string(), "Female");
        assert_eq!(GuardianStatus::SingleParent.to_string(), "Single Parent");
    }

    #[test]
    fn test_safety_flags_any_raised() {
        let mut flags = SafetyFlags::default();
        assert!(!flags.any_raised());

        flags.is_safe_at_home = Some(false);
        assert!(flags.any_raised());

        flags = SafetyFlags {
            has_self_harm_history: Some(true),
            ..SafetyFlags::default()
        };
        assert!(flags.any_raised());
    }
}
