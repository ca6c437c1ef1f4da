#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::{AppError, is_busy_or_locked, is_unique_violation};
use crate::models::Student;
use crate::services::alias::AliasGenerator;

const MAX_ROUNDS: usize = 5;

/// Bulk student creation for a course.
pub struct RosterService {
    db: SqlitePool,
    aliases: AliasGenerator,
    /// Makes the next batch collide with a row written inside its own
    /// transaction.
    #[cfg(test)]
    collide_once: AtomicBool,
}

impl RosterService {
    pub fn new(db: SqlitePool, aliases: AliasGenerator) -> Self {
        Self {
            db,
            aliases,
            #[cfg(test)]
            collide_once: AtomicBool::new(false),
        }
    }

    /// Creates exactly `count` students in `course_id`, or none at all.
    ///
    /// A concurrent writer can take an alias between the read and the
    /// insert; the UNIQUE constraint catches it and the whole batch is
    /// regenerated from a fresh read. A write lock held by another
    /// connection surfaces as BUSY/LOCKED and is retried the same way.
    pub async fn add_students(&self, course_id: &str, count: usize) -> Result<Vec<Student>, AppError> {
        for round in 1..=MAX_ROUNDS {
            match self.try_add(course_id, count).await {
                Ok(students) => {
                    info!(course_id, count = students.len(), "students added");
                    return Ok(students);
                }
                Err(AppError::Database(e)) if is_unique_violation(&e) => {
                    warn!(course_id, round, "alias collision on insert, regenerating batch");
                }
                Err(AppError::Database(e)) if is_busy_or_locked(&e) => {
                    warn!(course_id, round, error = %e, "database busy, regenerating batch");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::AliasSpaceExhausted(MAX_ROUNDS))
    }

    async fn try_add(&self, course_id: &str, count: usize) -> Result<Vec<Student>, AppError> {
        let mut tx = self.db.begin().await?;

        let existing_aliases = repository::fetch_all_aliases(&mut tx).await?;
        let existing_names = repository::fetch_names_for_course(&mut tx, course_id).await?;

        let generated = self.aliases.generate_students(
            &mut rand::thread_rng(),
            count,
            &existing_aliases,
            &existing_names,
        )?;

        #[cfg(test)]
        if self.collide_once.swap(false, Ordering::SeqCst) {
            if let Some(first) = generated.first() {
                repository::insert_student(&mut tx, course_id, &first.alias, "Collision").await?;
            }
        }

        let mut students = Vec::with_capacity(generated.len());
        for g in generated {
            students.push(repository::insert_student(&mut tx, course_id, &g.alias, &g.name).await?);
        }

        tx.commit().await?;
        Ok(students)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::repository::test_support::*;

    #[tokio::test]
    async fn test_add_students_creates_exact_count() {
        let pool = setup_test_db().await;
        let owner = seed_user(&pool, "anna").await;
        let course = seed_course(&pool, &owner, "Math").await;
        seed_student(&pool, &course, "taken123", "Participant_1").await;

        let service = RosterService::new(pool.clone(), AliasGenerator::default());
        let students = service.add_students(&course.id, 3).await.expect("add failed");

        assert_eq!(students.len(), 3);
        let names: Vec<&str> = students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Participant_2", "Participant_3", "Participant_4"]);
        let aliases: HashSet<&str> = students.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases.len(), 3);
        assert!(!aliases.contains("taken123"));

        let mut conn = pool.acquire().await.unwrap();
        let all = repository::fetch_students_for_course(&mut conn, &course.id).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_alias_collision_regenerates_whole_batch() {
        let pool = setup_test_db().await;
        let owner = seed_user(&pool, "anna").await;
        let course = seed_course(&pool, &owner, "Math").await;

        let service = RosterService::new(pool.clone(), AliasGenerator::default());
        service.collide_once.store(true, Ordering::SeqCst);
        let students = service.add_students(&course.id, 4).await.expect("add failed");

        assert!(!service.collide_once.load(Ordering::SeqCst));
        assert_eq!(students.len(), 4);
        let aliases: HashSet<&str> = students.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases.len(), 4);

        let mut conn = pool.acquire().await.unwrap();
        let stored = repository::fetch_students_for_course(&mut conn, &course.id).await.unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|s| s.name != "Collision"));
        let stored_aliases: HashSet<&str> = stored.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(stored_aliases, aliases);
    }

    #[tokio::test]
    async fn test_exhaustion_writes_nothing() {
        let pool = setup_test_db().await;
        let owner = seed_user(&pool, "anna").await;
        let course = seed_course(&pool, &owner, "Math").await;

        let service = RosterService::new(pool.clone(), AliasGenerator::new(b"ab", 1, 20));
        let err = service.add_students(&course.id, 3).await.expect_err("space too small");
        assert!(matches!(err, AppError::AliasSpaceExhausted(_)));

        let mut conn = pool.acquire().await.unwrap();
        let all = repository::fetch_students_for_course(&mut conn, &course.id).await.unwrap();
        assert!(all.is_empty());
    }
}
