//! Demo seed script
//!
//! Seeds one promotion with realistic data:
//! - 1 admin, 2 teachers, 4 students
//! - 2 courses with their occurrences over the next 5 business days
//! - 2 certifications
//! - 1 active assignment
//! - 1 pinned promotion chat message
//!
//! and prints an access token per seeded profile.
//!
//! Usage:
//!   DATABASE_URL=... JWT_SECRET=... ./seed-demo [--promotion "L3 Informatique"] [--reset]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use clap::Parser;
use uuid::Uuid;

use campus_api::{
    config::Config,
    db::{postgres::{create_pool, run_migrations, PgStore}, Db},
    models::{
        assignment::{Assignment, AssignmentStatus},
        certification::Certification,
        chat::ChatMessage,
        course::Course,
        profile::{Profile, Role},
        schedule::{ScheduleItem, SessionType},
    },
    services::auth::AuthService,
};

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed the campus database with demo data")]
struct Args {
    /// Promotion the demo students belong to
    #[arg(long, default_value = "L3 Informatique")]
    promotion: String,

    /// Delete every stored record before seeding
    #[arg(long)]
    reset: bool,

    /// Lifetime of the printed tokens, in seconds
    #[arg(long, default_value_t = 86_400)]
    token_ttl: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL required")?;

    println!("=== Seed Demo ===");

    let pool = create_pool(database_url, 5)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await?;

    if args.reset {
        println!("Removing existing records...");
        sqlx::query("DELETE FROM records")
            .execute(&pool)
            .await
            .context("Failed to clear records")?;
    }

    let db = Db::new(Arc::new(PgStore::new(pool)), StdDuration::from_secs(10));
    let now = Utc::now();
    let promotion = args.promotion.clone();

    // 1. Profiles
    println!("Creating profiles...");
    let profile = |email: &str, name: &str, role: Role| Profile {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: name.to_string(),
        role,
        avatar_url: None,
        version: 0,
        created_at: now,
        updated_at: now,
    };
    let admin = profile("scolarite@campus.demo", "Claire Fontaine", Role::Admin);
    let teachers = [
        profile(
            "m.durand@campus.demo",
            "Marc Durand",
            Role::Teacher { department: Some("Informatique".into()) },
        ),
        profile(
            "s.nguyen@campus.demo",
            "Sophie Nguyen",
            Role::Teacher { department: Some("Mathématiques".into()) },
        ),
    ];
    let students: Vec<Profile> = [
        ("alice.martin@campus.demo", "Alice Martin"),
        ("bilal.haddad@campus.demo", "Bilal Haddad"),
        ("chloe.bernard@campus.demo", "Chloé Bernard"),
        ("david.leroy@campus.demo", "David Leroy"),
    ]
    .iter()
    .map(|(email, name)| profile(email, name, Role::Student { promotion: promotion.clone() }))
    .collect();

    db.insert(&admin).await.context("Failed to insert admin")?;
    for p in teachers.iter().chain(students.iter()) {
        db.insert(p)
            .await
            .with_context(|| format!("Failed to insert profile {}", p.email))?;
    }

    // 2. Courses
    println!("Creating courses...");
    let courses = [
        Course {
            id: Uuid::new_v4(),
            name: "Programmation Système".into(),
            code: "INF301".into(),
            description: Some("Processus, mémoire et entrées/sorties".into()),
            teacher_id: teachers[0].id,
            promotion: promotion.clone(),
            coefficient: 3.0,
            created_at: now,
        },
        Course {
            id: Uuid::new_v4(),
            name: "Probabilités".into(),
            code: "MAT302".into(),
            description: None,
            teacher_id: teachers[1].id,
            promotion: promotion.clone(),
            coefficient: 2.0,
            created_at: now,
        },
    ];
    for c in &courses {
        db.insert(c).await.context("Failed to insert course")?;
    }

    // 3. Occurrences for the next 5 business days
    println!("Creating schedule...");
    let morning = NaiveTime::from_hms_opt(8, 30, 0).context("invalid time")?;
    let noon = NaiveTime::from_hms_opt(10, 30, 0).context("invalid time")?;
    let afternoon = NaiveTime::from_hms_opt(14, 0, 0).context("invalid time")?;
    let evening = NaiveTime::from_hms_opt(16, 0, 0).context("invalid time")?;

    let mut occurrences = 0;
    for day in business_days(now.date_naive(), 5) {
        let slots = [
            (&courses[0], morning, noon, SessionType::Cours, "A101"),
            (&courses[1], afternoon, evening, SessionType::Td, "B204"),
        ];
        for (course, start, end, session_type, room) in slots {
            let item = ScheduleItem {
                id: Uuid::new_v4(),
                course_id: course.id,
                promotion: promotion.clone(),
                date: day,
                start_time: start,
                end_time: end,
                room: room.into(),
                session_type,
                created_at: now,
            };
            db.insert(&item).await.context("Failed to insert schedule item")?;
            occurrences += 1;
        }
    }
    println!("  {} occurrences", occurrences);

    // 4. Certifications
    println!("Creating certifications...");
    let certifications = [
        ("Rust pour le backend", "Intermédiaire", "Développement", 12),
        ("Bases de données relationnelles", "Débutant", "Données", 8),
    ];
    for (title, level, category, lessons) in certifications {
        let cert = Certification {
            id: Uuid::new_v4(),
            title: title.into(),
            description: format!("Parcours certifiant : {title}"),
            instructor_id: teachers[0].id,
            duration: format!("{} semaines", lessons / 2),
            level: level.into(),
            category: category.into(),
            total_lessons: lessons,
            created_at: now,
        };
        db.insert(&cert).await.context("Failed to insert certification")?;
    }

    // 5. Assignment
    println!("Creating assignment...");
    let assignment = Assignment {
        id: Uuid::new_v4(),
        title: "Mini-shell".into(),
        description: "Implémenter un shell supportant pipes et redirections".into(),
        course_id: courses[0].id,
        teacher_id: teachers[0].id,
        promotion: promotion.clone(),
        max_points: 20.0,
        due_date: now + Duration::days(14),
        status: AssignmentStatus::Active,
        created_at: now,
    };
    db.insert(&assignment).await.context("Failed to insert assignment")?;

    // 6. Pinned chat message
    let welcome = ChatMessage {
        id: Uuid::new_v4(),
        user_id: admin.id,
        promotion: promotion.clone(),
        content: format!("Bienvenue dans le canal de la promotion {promotion} !"),
        is_pinned: true,
        created_at: now,
    };
    db.insert(&welcome).await.context("Failed to insert chat message")?;

    // 7. Tokens
    println!("\n=== Access tokens (valid {}s) ===", args.token_ttl);
    for p in std::iter::once(&admin).chain(teachers.iter()).chain(students.iter()) {
        let token = AuthService::generate_access_token(p, &config.jwt_secret, args.token_ttl)?;
        println!("{:<8} {:<28} {}", p.kind().to_string(), p.email, token);
    }

    println!("\n=== Done ===");
    Ok(())
}

/// The next `count` weekdays starting at `from` (inclusive).
fn business_days(from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut d = from;
    while days.len() < count {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(d);
        }
        d += Duration::days(1);
    }
    days
}
