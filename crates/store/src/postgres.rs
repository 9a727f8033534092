//! PostgreSQL + pgvector backend.
//!
//! One connection pool serves three collaborators:
//! - [`AcademicRecordStore`]: identity, enrollment, courses, timetable, syllabus
//! - [`VectorStore`]: nearest-neighbour search over `course_material_chunk`
//!   using pgvector's cosine distance operator `<=>`
//! - [`ConversationStore`]: `chat_logs` (append-only) and `chat_context`
//!   (one row per user, upserted)
//!
//! # Setup
//!
//! ```sql
//! CREATE EXTENSION IF NOT EXISTS vector;
//! ```
//!
//! Then run the migration in `migrations/001_academaide.sql`
//! (`academaide migrate`).

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::{debug, info, warn};

use academaide_core::academic::*;
use academaide_core::conversation::*;
use academaide_core::error::StoreError;
use academaide_core::material::*;

use crate::vector::to_vector_literal;

/// PostgreSQL store backing records, materials and the chat log.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with a bounded pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("PostgreSQL connection failed: {e}")))?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the schema migration.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let migration_sql = include_str!("../migrations/001_academaide.sql");

        sqlx::raw_sql(migration_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("Migration failed: {e}")))?;

        info!("AcademAide schema migration complete");
        Ok(())
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(format!("PostgreSQL ping failed: {e}")))?;
        Ok(())
    }

    /// Nearest-neighbour SQL for a query. Placeholders: `$1` vector literal,
    /// then the course set and unit when present, then the limit.
    fn nearest_chunks_sql(query: &MaterialQuery) -> String {
        let mut conditions = vec!["embedding IS NOT NULL".to_string()];
        let mut next = 2;

        if matches!(query.courses, CourseFilter::Only(_)) {
            conditions.push(format!("course_id = ANY(${next})"));
            next += 1;
        }
        if query.unit.is_some() {
            conditions.push(format!("unit_no = ${next}"));
            next += 1;
        }

        format!(
            "SELECT chunk_id, course_id, unit_no, content_text, source_file, \
             1.0 - (embedding <=> $1::vector) AS similarity \
             FROM course_material_chunk \
             WHERE {} \
             ORDER BY embedding <=> $1::vector ASC \
             LIMIT ${next}",
            conditions.join(" AND ")
        )
    }
}

fn query_failed(what: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::QueryFailed(format!("{what}: {e}"))
}

fn write_failed(what: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::WriteFailed(format!("{what}: {e}"))
}

fn corrupt(e: sqlx::Error) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

/// Convert an identity row (`id, first_name, last_name, dept_id, year_of_joining`).
fn row_to_identity(row: &PgRow, role: Role) -> Result<Identity, StoreError> {
    let first: String = row.try_get("first_name").map_err(corrupt)?;
    let last: Option<String> = row.try_get("last_name").map_err(corrupt)?;
    let display_name = match last.as_deref().map(str::trim) {
        Some(last) if !last.is_empty() => format!("{} {}", first.trim(), last),
        _ => first.trim().to_string(),
    };

    Ok(Identity {
        id: row.try_get("id").map_err(corrupt)?,
        display_name,
        role,
        organizational_unit: row.try_get("dept_id").map_err(corrupt)?,
        join_year: row
            .try_get::<Option<i32>, _>("year_of_joining")
            .map_err(corrupt)?
            .unwrap_or_default(),
    })
}

fn row_to_slot(row: &PgRow) -> Result<Option<ScheduleSlot>, StoreError> {
    let day: String = row.try_get("day_of_week").map_err(corrupt)?;
    let Ok(day_of_week) = day.trim().parse::<Weekday>() else {
        warn!(day = %day, "Skipping schedule row with unknown day");
        return Ok(None);
    };

    Ok(Some(ScheduleSlot {
        course_id: row.try_get("course_id").map_err(corrupt)?,
        section: row.try_get("section_name").map_err(corrupt)?,
        day_of_week,
        start_time: row.try_get::<NaiveTime, _>("start_time").map_err(corrupt)?,
        end_time: row.try_get::<NaiveTime, _>("end_time").map_err(corrupt)?,
        room: row.try_get("room_number").map_err(corrupt)?,
    }))
}

fn row_to_scored_chunk(row: &PgRow) -> Result<ScoredChunk, StoreError> {
    let chunk_id: i32 = row.try_get("chunk_id").map_err(corrupt)?;
    let unit_no: i32 = row.try_get("unit_no").map_err(corrupt)?;
    let similarity: f64 = row.try_get("similarity").map_err(corrupt)?;

    Ok(ScoredChunk {
        chunk: DocumentChunk {
            id: chunk_id.to_string(),
            course_id: row.try_get("course_id").map_err(corrupt)?,
            unit_no: u32::try_from(unit_no).unwrap_or_default(),
            text: row.try_get("content_text").map_err(corrupt)?,
            // Embeddings stay in the database; they are never needed downstream.
            embedding: Vec::new(),
            source_label: row
                .try_get::<Option<String>, _>("source_file")
                .map_err(corrupt)?
                .unwrap_or_default(),
        },
        similarity: similarity as f32,
    })
}

fn row_to_turn(row: &PgRow) -> Result<ConversationTurn, StoreError> {
    let sentiment: Option<String> = row.try_get("sentiment").map_err(corrupt)?;
    Ok(ConversationTurn {
        user_id: row.try_get("student_id").map_err(corrupt)?,
        text: row.try_get("message").map_err(corrupt)?,
        is_bot: row.try_get("is_bot").map_err(corrupt)?,
        sentiment_tag: sentiment.as_deref().map(Sentiment::parse),
        is_fallback: row.try_get("is_fallback").map_err(corrupt)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(corrupt)?,
    })
}

#[async_trait]
impl AcademicRecordStore for PostgresStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn identity(&self, user_id: &str, role: Role) -> Result<Option<Identity>, StoreError> {
        let sql = match role {
            Role::Student => {
                "SELECT student_id AS id, s_first_name AS first_name, s_last_name AS last_name, \
                 dept_id, year_of_joining FROM student WHERE student_id = $1"
            }
            Role::Faculty => {
                "SELECT faculty_id AS id, f_first_name AS first_name, f_last_name AS last_name, \
                 dept_id, year_of_joining FROM faculty WHERE faculty_id = $1"
            }
        };

        let row = sqlx::query(sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("Failed to resolve identity"))?;

        row.as_ref().map(|r| row_to_identity(r, role)).transpose()
    }

    async fn enrollments(&self, student_id: &str) -> Result<Vec<EnrollmentRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT student_id, course_id, status, grade FROM enrolls_in \
             WHERE student_id = $1 ORDER BY course_id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to load enrollments"))?;

        rows.iter()
            .map(|row| -> Result<EnrollmentRecord, StoreError> {
                let grade: Option<String> = row.try_get("grade").map_err(corrupt)?;
                Ok(EnrollmentRecord {
                    user_id: row.try_get("student_id").map_err(corrupt)?,
                    course_id: row.try_get("course_id").map_err(corrupt)?,
                    status: row.try_get("status").map_err(corrupt)?,
                    grade: grade
                        .filter(|g| !g.trim().is_empty())
                        .map(|g| Grade::parse(&g)),
                })
            })
            .collect()
    }

    async fn courses(&self, course_ids: &[String]) -> Result<Vec<Course>, StoreError> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT course_id, title, credits, description FROM course \
             WHERE course_id = ANY($1) ORDER BY course_id",
        )
        .bind(course_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to load courses"))?;

        rows.iter()
            .map(|row| -> Result<Course, StoreError> {
                let credits: i32 = row.try_get("credits").map_err(corrupt)?;
                Ok(Course {
                    course_id: row.try_get("course_id").map_err(corrupt)?,
                    title: row.try_get("title").map_err(corrupt)?,
                    credit_weight: u32::try_from(credits).unwrap_or_default(),
                    description: row.try_get("description").map_err(corrupt)?,
                    embedding: None,
                })
            })
            .collect()
    }

    async fn schedule(&self, course_ids: &[String]) -> Result<Vec<ScheduleSlot>, StoreError> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Every section of every course: enrollments carry no section.
        let rows = sqlx::query(
            "SELECT course_id, section_name, day_of_week, start_time, end_time, room_number \
             FROM schedule WHERE course_id = ANY($1) ORDER BY start_time",
        )
        .bind(course_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to load schedule"))?;

        let mut slots = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(slot) = row_to_slot(row)? {
                slots.push(slot);
            }
        }
        Ok(slots)
    }

    async fn taught_courses(&self, faculty_id: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT course_id FROM teaches WHERE faculty_id = $1 ORDER BY course_id")
            .bind(faculty_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("Failed to load taught courses"))?;

        rows.iter()
            .map(|row| row.try_get("course_id").map_err(corrupt))
            .collect()
    }

    async fn roster(&self, course_id: &str) -> Result<Vec<Identity>, StoreError> {
        let rows = sqlx::query(
            "SELECT s.student_id AS id, s.s_first_name AS first_name, s.s_last_name AS last_name, \
             s.dept_id, s.year_of_joining \
             FROM enrolls_in e JOIN student s ON e.student_id = s.student_id \
             WHERE e.course_id = $1 ORDER BY s.student_id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to load roster"))?;

        rows.iter()
            .map(|row| row_to_identity(row, Role::Student))
            .collect()
    }

    async fn syllabus_topics(
        &self,
        course_id: &str,
        unit: Option<u32>,
    ) -> Result<Vec<String>, StoreError> {
        let rows = match unit {
            Some(unit) => {
                sqlx::query(
                    "SELECT topic FROM syllabus_unit WHERE course_id = $1 AND unit_no = $2 \
                     ORDER BY unit_no",
                )
                .bind(course_id)
                .bind(unit as i32)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT topic FROM syllabus_unit WHERE course_id = $1 ORDER BY unit_no")
                    .bind(course_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(query_failed("Failed to load syllabus"))?;

        rows.iter()
            .map(|row| row.try_get("topic").map_err(corrupt))
            .collect()
    }
}

#[async_trait]
impl VectorStore for PostgresStore {
    fn name(&self) -> &str {
        "pgvector"
    }

    async fn nearest_chunks(&self, query: &MaterialQuery) -> Result<Vec<ScoredChunk>, StoreError> {
        let sql = Self::nearest_chunks_sql(query);
        debug!(sql = %sql, limit = query.limit, "Vector search query");

        let embedding_str = to_vector_literal(&query.embedding);
        let mut qb = sqlx::query(&sql).bind(embedding_str);

        if let CourseFilter::Only(ids) = &query.courses {
            qb = qb.bind(ids.clone());
        }
        if let Some(unit) = query.unit {
            qb = qb.bind(unit as i32);
        }
        qb = qb.bind(query.limit as i64);

        let rows = qb
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("Vector search failed"))?;

        rows.iter().map(row_to_scored_chunk).collect()
    }
}

#[async_trait]
impl ConversationStore for PostgresStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), StoreError> {
        let intent = if turn.is_bot { "reply" } else { "chat" };

        sqlx::query(
            "INSERT INTO chat_logs (student_id, message, intent, sentiment, is_bot, is_fallback, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&turn.user_id)
        .bind(&turn.text)
        .bind(intent)
        .bind(turn.sentiment_tag.map(|s| s.as_str()))
        .bind(turn.is_bot)
        .bind(turn.is_fallback)
        .bind(turn.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_failed("Failed to append chat turn"))?;

        debug!(user_id = %turn.user_id, is_bot = turn.is_bot, "Appended chat turn");
        Ok(())
    }

    async fn upsert_context(&self, context: RollingContext) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO chat_context (student_id, last_topic, emotion, last_interaction) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (student_id) DO UPDATE SET \
               last_topic = EXCLUDED.last_topic, \
               emotion = EXCLUDED.emotion, \
               last_interaction = EXCLUDED.last_interaction",
        )
        .bind(&context.user_id)
        .bind(&context.last_topic)
        .bind(context.last_sentiment.as_str())
        .bind(context.last_interaction_at)
        .execute(&self.pool)
        .await
        .map_err(write_failed("Failed to upsert chat context"))?;

        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let rows = sqlx::query(
            "SELECT student_id, message, sentiment, is_bot, is_fallback, created_at FROM ( \
               SELECT * FROM chat_logs WHERE student_id = $1 \
               ORDER BY created_at DESC, id DESC LIMIT $2 \
             ) recent ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to load chat history"))?;

        rows.iter().map(row_to_turn).collect()
    }

    async fn rolling_context(&self, user_id: &str) -> Result<Option<RollingContext>, StoreError> {
        let row = sqlx::query(
            "SELECT student_id, last_topic, emotion, last_interaction FROM chat_context \
             WHERE student_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed("Failed to load chat context"))?;

        row.map(|row| -> Result<RollingContext, StoreError> {
            let emotion: String = row.try_get("emotion").map_err(corrupt)?;
            Ok(RollingContext {
                user_id: row.try_get("student_id").map_err(corrupt)?,
                last_topic: row.try_get("last_topic").map_err(corrupt)?,
                last_sentiment: Sentiment::parse(&emotion),
                last_interaction_at: row.try_get("last_interaction").map_err(corrupt)?,
            })
        })
        .transpose()
    }

    async fn delete_turns(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM chat_logs WHERE student_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(write_failed("Failed to delete chat turns"))?;

        Ok(result.rows_affected())
    }

    async fn delete_context(&self, user_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM chat_context WHERE student_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(write_failed("Failed to delete chat context"))?;

        Ok(result.rows_affected() > 0)
    }
}

// ── Unit tests (no DB required) ──────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn query(courses: CourseFilter, unit: Option<u32>) -> MaterialQuery {
        MaterialQuery {
            embedding: vec![0.1, 0.2],
            courses,
            unit,
            limit: 3,
        }
    }

    #[test]
    fn unrestricted_search_sql() {
        let sql = PostgresStore::nearest_chunks_sql(&query(CourseFilter::Unrestricted, None));
        assert!(sql.contains("embedding <=> $1::vector ASC"));
        assert!(!sql.contains("ANY"));
        assert!(sql.ends_with("LIMIT $2"));
    }

    #[test]
    fn course_filter_binds_second() {
        let sql = PostgresStore::nearest_chunks_sql(&query(CourseFilter::from_ids(["CS101"]), None));
        assert!(sql.contains("course_id = ANY($2)"));
        assert!(sql.ends_with("LIMIT $3"));
    }

    #[test]
    fn course_and_unit_filters() {
        let sql =
            PostgresStore::nearest_chunks_sql(&query(CourseFilter::from_ids(["CS101"]), Some(2)));
        assert!(sql.contains("course_id = ANY($2)"));
        assert!(sql.contains("unit_no = $3"));
        assert!(sql.ends_with("LIMIT $4"));
    }

    #[test]
    fn unit_filter_alone() {
        let sql = PostgresStore::nearest_chunks_sql(&query(CourseFilter::Unrestricted, Some(1)));
        assert!(sql.contains("unit_no = $2"));
        assert!(sql.ends_with("LIMIT $3"));
    }

    #[test]
    fn similarity_is_one_minus_distance() {
        let sql = PostgresStore::nearest_chunks_sql(&query(CourseFilter::Unrestricted, None));
        assert!(sql.contains("1.0 - (embedding <=> $1::vector) AS similarity"));
    }
}
