use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{Db, Filter},
    error::{EngineError, EngineResult},
    models::{
        course::Course,
        grade::{Grade, GradeReport, GRADE_SCALE},
        profile::Profile,
    },
    services::access::{self, Action, Target},
};

/// Weighted mean `Σ(value × coefficient) / Σ(coefficient)`; 0 for no grades.
///
/// Terms are summed in a canonical order so the result depends only on the
/// multiset of grades, not on the order they were fetched in.
pub fn average(grades: &[Grade]) -> f64 {
    let mut terms: Vec<(f64, f64)> = grades.iter().map(|g| (g.value, g.coefficient)).collect();
    terms.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let (weighted, weights) = terms
        .iter()
        .fold((0.0, 0.0), |(w, c), (value, coeff)| (w + value * coeff, c + coeff));
    if weights <= 0.0 {
        return 0.0;
    }
    weighted / weights
}

/// Average per subject, using the same formula as [`average`].
pub fn by_subject(grades: &[Grade]) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<String, Vec<Grade>> = BTreeMap::new();
    for g in grades {
        groups.entry(g.subject.clone()).or_default().push(g.clone());
    }
    groups
        .into_iter()
        .map(|(subject, gs)| (subject, average(&gs)))
        .collect()
}

pub struct GradeService;

impl GradeService {
    /// Enter a grade for a course the caller teaches.
    pub async fn record(
        db: &Db,
        caller: &Profile,
        student_id: Uuid,
        course_id: Uuid,
        value: f64,
        grade_type: &str,
        date_obtained: NaiveDate,
    ) -> EngineResult<Grade> {
        if !(0.0..=GRADE_SCALE).contains(&value) {
            return Err(EngineError::validation(format!(
                "grade must be between 0 and {GRADE_SCALE}, got {value}"
            )));
        }
        let grade_type = grade_type.trim();
        if grade_type.is_empty() {
            return Err(EngineError::validation("grade_type is required"));
        }

        let course: Course = db
            .get(course_id)
            .await
            .map_err(|e| EngineError::from_store("course", e))?;
        access::require(caller, Action::Create, Target::Course(&course))?;

        let student: Profile = db
            .get(student_id)
            .await
            .map_err(|e| EngineError::from_store("student", e))?;
        if student.promotion() != Some(course.promotion.as_str()) {
            return Err(EngineError::validation(
                "student is not in the course's promotion",
            ));
        }

        let grade = Grade {
            id: Uuid::new_v4(),
            student_id,
            course_id,
            subject: course.name.clone(),
            value,
            coefficient: course.coefficient,
            grade_type: grade_type.to_string(),
            date_obtained,
            created_at: Utc::now(),
        };
        db.insert(&grade)
            .await
            .map_err(|e| EngineError::from_store("grade", e))?;

        info!(grade = %grade.id, student = %student_id, course = %course_id, "grade recorded");
        Ok(grade)
    }

    /// Grades of one student (most recent first) with their averages.
    pub async fn report(db: &Db, caller: &Profile, student_id: Uuid) -> EngineResult<GradeReport> {
        access::require(caller, Action::Read, Target::StudentRecords(student_id))?;

        let mut grades: Vec<Grade> = db
            .find(&Filter::new().eq("student_id", student_id))
            .await
            .map_err(|e| EngineError::from_store("grade", e))?;
        grades.sort_by(|a, b| b.date_obtained.cmp(&a.date_obtained));

        Ok(GradeReport {
            student_id,
            average: average(&grades),
            by_subject: by_subject(&grades),
            grades,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(subject: &str, value: f64, coefficient: f64) -> Grade {
        Grade {
            id: Uuid::new_v4(),
            student_id: Uuid::nil(),
            course_id: Uuid::nil(),
            subject: subject.into(),
            value,
            coefficient,
            grade_type: "exam".into(),
            date_obtained: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn weighted_average() {
        let grades = vec![grade("Maths", 16.0, 2.0), grade("Physique", 14.0, 1.0)];
        let avg = average(&grades);
        assert!((avg - 46.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert!(by_subject(&[]).is_empty());
    }

    #[test]
    fn average_ignores_input_order() {
        let grades = vec![
            grade("A", 12.3, 0.7),
            grade("B", 19.9, 3.0),
            grade("C", 4.1, 1.3),
            grade("A", 8.85, 2.2),
        ];
        let mut reversed = grades.clone();
        reversed.reverse();
        assert_eq!(average(&grades).to_bits(), average(&reversed).to_bits());
    }

    #[test]
    fn per_subject_averages() {
        let grades = vec![
            grade("Maths", 10.0, 1.0),
            grade("Maths", 20.0, 3.0),
            grade("Anglais", 12.0, 2.0),
        ];
        let subjects = by_subject(&grades);
        assert_eq!(subjects.len(), 2);
        assert!((subjects["Maths"] - 17.5).abs() < 1e-12);
        assert!((subjects["Anglais"] - 12.0).abs() < 1e-12);
    }
}
