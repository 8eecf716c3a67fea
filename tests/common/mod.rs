#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use campus_api::{
    db::{memory::MemoryStore, Db, Document, Store, StoreError},
    models::{
        assignment::{Assignment, AssignmentStatus},
        certification::Certification,
        course::Course,
        profile::{Profile, Role},
        schedule::{ScheduleItem, SessionType},
    },
};

pub const PROMOTION: &str = "L3";

/// A small campus: one promotion, two teachers each owning one course with
/// one occurrence, two students and an admin.
pub struct Campus {
    pub db: Db,
    pub admin: Profile,
    pub teacher: Profile,
    pub other_teacher: Profile,
    pub alice: Profile,
    pub bob: Profile,
    pub course: Course,
    pub other_course: Course,
    pub occurrence: ScheduleItem,
    pub other_occurrence: ScheduleItem,
}

pub fn profile(name: &str, role: Role) -> Profile {
    let now = Utc::now();
    Profile {
        id: Uuid::new_v4(),
        email: format!("{}@campus.test", name.to_lowercase().replace(' ', ".")),
        full_name: name.to_string(),
        role,
        avatar_url: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn student(name: &str, promotion: &str) -> Profile {
    profile(name, Role::Student { promotion: promotion.to_string() })
}

pub fn teacher(name: &str) -> Profile {
    profile(name, Role::Teacher { department: None })
}

pub fn course(name: &str, teacher: &Profile, coefficient: f64) -> Course {
    Course {
        id: Uuid::new_v4(),
        name: name.to_string(),
        code: name.to_uppercase(),
        description: None,
        teacher_id: teacher.id,
        promotion: PROMOTION.to_string(),
        coefficient,
        created_at: Utc::now(),
    }
}

pub fn occurrence(course: &Course, day: u32, hour: u32) -> ScheduleItem {
    ScheduleItem {
        id: Uuid::new_v4(),
        course_id: course.id,
        promotion: course.promotion.clone(),
        date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
        start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(hour + 2, 0, 0).unwrap(),
        room: "A101".to_string(),
        session_type: SessionType::Cours,
        created_at: Utc::now(),
    }
}

pub fn certification(total_lessons: u32) -> Certification {
    Certification {
        id: Uuid::new_v4(),
        title: "Rust".to_string(),
        description: "Systems programming".to_string(),
        instructor_id: Uuid::new_v4(),
        duration: "6 weeks".to_string(),
        level: "Intermediate".to_string(),
        category: "Development".to_string(),
        total_lessons,
        created_at: Utc::now(),
    }
}

pub fn assignment(course: &Course, status: AssignmentStatus) -> Assignment {
    Assignment {
        id: Uuid::new_v4(),
        title: "Mini-shell".to_string(),
        description: "Pipes and redirections".to_string(),
        course_id: course.id,
        teacher_id: course.teacher_id,
        promotion: course.promotion.clone(),
        max_points: 20.0,
        due_date: Utc::now(),
        status,
        created_at: Utc::now(),
    }
}

pub async fn campus() -> Campus {
    campus_on(Db::in_memory()).await
}

pub async fn campus_on(db: Db) -> Campus {
    let admin = profile("Admin", Role::Admin);
    let marc = teacher("Marc Durand");
    let sophie = teacher("Sophie Nguyen");
    // Inserted out of name order on purpose; rosters sort by name.
    let bob = student("Bob", PROMOTION);
    let alice = student("Alice", PROMOTION);

    let systems = course("Systems", &marc, 2.0);
    let probability = course("Probability", &sophie, 1.0);
    let systems_lecture = occurrence(&systems, 2, 8);
    let probability_lecture = occurrence(&probability, 2, 14);

    for p in [&admin, &marc, &sophie, &bob, &alice] {
        db.insert(p).await.unwrap();
    }
    for c in [&systems, &probability] {
        db.insert(c).await.unwrap();
    }
    for o in [&systems_lecture, &probability_lecture] {
        db.insert(o).await.unwrap();
    }

    Campus {
        db,
        admin,
        teacher: marc,
        other_teacher: sophie,
        alice,
        bob,
        course: systems,
        other_course: probability,
        occurrence: systems_lecture,
        other_occurrence: probability_lecture,
    }
}

/// Memory store that yields after every read, so two tasks joined on the
/// same record both read it before either writes. Counts rejected writes.
#[derive(Default)]
pub struct InterleavedStore {
    inner: MemoryStore,
    conflicts: AtomicUsize,
}

impl InterleavedStore {
    pub fn conflicts(&self) -> usize {
        self.conflicts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for InterleavedStore {
    async fn get(&self, kind: &str, id: Uuid) -> Result<Document, StoreError> {
        let doc = self.inner.get(kind, id).await;
        tokio::task::yield_now().await;
        doc
    }

    async fn find(&self, kind: &str, filter: &Value) -> Result<Vec<Document>, StoreError> {
        self.inner.find(kind, filter).await
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        self.inner.insert(doc).await
    }

    async fn update(
        &self,
        kind: &str,
        id: Uuid,
        expected_version: i64,
        body: Value,
    ) -> Result<(), StoreError> {
        let result = self.inner.update(kind, id, expected_version, body).await;
        if matches!(result, Err(StoreError::Conflict)) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        result
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

/// A campus on an [`InterleavedStore`], with a handle to the store.
pub async fn interleaved_campus() -> (Campus, Arc<InterleavedStore>) {
    let store = Arc::new(InterleavedStore::default());
    let db = Db::new(store.clone() as Arc<dyn Store>, Duration::from_secs(2));
    (campus_on(db).await, store)
}
