//! Sample students written to a user's partition on their first load.

use crate::models::{DisabilityLevel, NewStudent, Student, StudentId};

const SAMPLE_STUDENTS: &[(&str, &str, u32, &str, &str, DisabilityLevel)] = &[
    ("1", "John Doe", 12, "6th Grade", "Autism Spectrum Disorder", DisabilityLevel::Moderate),
    ("2", "Jane Smith", 10, "4th Grade", "Down Syndrome", DisabilityLevel::Mild),
    ("3", "Michael Johnson", 14, "8th Grade", "ADHD", DisabilityLevel::Mild),
    ("4", "Emily Williams", 11, "5th Grade", "Intellectual Disability", DisabilityLevel::Severe),
    ("5", "David Brown", 13, "7th Grade", "Learning Disability", DisabilityLevel::Moderate),
    ("6", "Sarah Davis", 9, "3rd Grade", "Cerebral Palsy", DisabilityLevel::Moderate),
];

pub fn sample_students() -> Vec<Student> {
    SAMPLE_STUDENTS
        .iter()
        .map(|&(id, name, age, grade, disability_type, level)| {
            NewStudent::new(name, age, grade, disability_type, level).into_student(StudentId::new(id))
        })
        .collect()
}
