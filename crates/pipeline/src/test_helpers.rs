//! Shared fixtures and scripted collaborators for unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use academaide_core::academic::*;
use academaide_core::conversation::*;
use academaide_core::error::{ProviderError, StoreError};
use academaide_core::material::*;
use academaide_core::provider::*;
use academaide_store::{InMemoryAcademicStore, InMemoryConversationStore};

// ── Records ───────────────────────────────────────────────────────────────

pub fn identity(id: &str, role: Role, join_year: i32) -> Identity {
    Identity {
        id: id.into(),
        display_name: format!("User {id}"),
        role,
        organizational_unit: "CSE".into(),
        join_year,
    }
}

pub fn course(id: &str, title: &str, credits: u32) -> Course {
    Course {
        course_id: id.into(),
        title: title.into(),
        credit_weight: credits,
        description: None,
        embedding: None,
    }
}

pub fn graded(user: &str, course: &str, grade: Option<&str>) -> EnrollmentRecord {
    EnrollmentRecord {
        user_id: user.into(),
        course_id: course.into(),
        status: if grade.is_some() { "Completed" } else { "Enrolled" }.into(),
        grade: grade.map(Grade::parse),
    }
}

pub fn slot(course: &str, day: Weekday, start_hour: u32, end_hour: u32) -> ScheduleSlot {
    ScheduleSlot {
        course_id: course.into(),
        section: "A".into(),
        day_of_week: day,
        start_time: NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap(),
        room: "R101".into(),
    }
}

/// 2025-03-10 is a Monday.
pub fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn chunk(id: &str, course: &str, unit: u32, embedding: Vec<f32>) -> DocumentChunk {
    DocumentChunk {
        id: id.into(),
        course_id: course.into(),
        unit_no: unit,
        text: format!("Notes for {id}"),
        embedding,
        source_label: format!("{id}.pdf"),
    }
}

pub fn scored(id: &str, course: &str, text: &str, similarity: f32) -> ScoredChunk {
    let mut c = chunk(id, course, 1, vec![1.0]);
    c.text = text.into();
    ScoredChunk { chunk: c, similarity }
}

// ── Generation ────────────────────────────────────────────────────────────

/// Returns one scripted outcome on every call and records requests.
pub struct CountingGenerator {
    outcome: Result<String, ProviderError>,
    calls: Mutex<usize>,
    last: Mutex<Option<GenerationRequest>>,
}

impl CountingGenerator {
    pub fn replying(text: &str) -> Self {
        Self::with_outcome(Ok(text.to_string()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<String, ProviderError>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for CountingGenerator {
    fn name(&self) -> &str {
        "counting_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let model = request.model.clone();
        *self.last.lock().unwrap() = Some(request);
        self.outcome
            .clone()
            .map(|text| GenerationResponse { text, model })
    }
}

/// Sleeps before answering; pair with paused time.
pub struct SlowGenerator {
    delay: Duration,
}

impl SlowGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl GenerationService for SlowGenerator {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(GenerationResponse {
            text: "eventually".into(),
            model: request.model,
        })
    }
}

// ── Embedding ─────────────────────────────────────────────────────────────

/// Embeds every text to the same vector. Clones share call state.
#[derive(Clone)]
pub struct StaticEmbedder {
    outcome: Result<Vec<f32>, ProviderError>,
    texts: Arc<Mutex<Vec<String>>>,
}

impl StaticEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            outcome: Ok(vector),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            outcome: Err(error),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.texts.lock().unwrap().len()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    fn name(&self) -> &str {
        "static_mock"
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.texts.lock().unwrap().push(request.text);
        self.outcome.clone().map(|vector| EmbeddingResponse {
            vector,
            model: request.model,
        })
    }
}

// ── Stores ────────────────────────────────────────────────────────────────

/// Returns every chunk it holds, ignoring the query's filters.
pub struct LeakyVectorStore {
    chunks: Vec<DocumentChunk>,
}

impl LeakyVectorStore {
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl VectorStore for LeakyVectorStore {
    fn name(&self) -> &str {
        "leaky_mock"
    }

    async fn nearest_chunks(&self, _query: &MaterialQuery) -> Result<Vec<ScoredChunk>, StoreError> {
        Ok(self
            .chunks
            .iter()
            .cloned()
            .map(|chunk| ScoredChunk {
                chunk,
                similarity: 1.0,
            })
            .collect())
    }
}

fn injected(method: &str) -> StoreError {
    StoreError::QueryFailed(format!("injected failure in {method}"))
}

/// Delegates to an in-memory store, failing the named methods.
pub struct FlakyRecordStore {
    inner: InMemoryAcademicStore,
    failing: HashSet<&'static str>,
}

impl FlakyRecordStore {
    pub fn new(inner: InMemoryAcademicStore) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    fn check(&self, method: &str) -> Result<(), StoreError> {
        if self.failing.contains(method) {
            Err(injected(method))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AcademicRecordStore for FlakyRecordStore {
    fn name(&self) -> &str {
        "flaky_mock"
    }

    async fn identity(&self, user_id: &str, role: Role) -> Result<Option<Identity>, StoreError> {
        self.check("identity")?;
        self.inner.identity(user_id, role).await
    }

    async fn enrollments(&self, student_id: &str) -> Result<Vec<EnrollmentRecord>, StoreError> {
        self.check("enrollments")?;
        self.inner.enrollments(student_id).await
    }

    async fn courses(&self, course_ids: &[String]) -> Result<Vec<Course>, StoreError> {
        self.check("courses")?;
        self.inner.courses(course_ids).await
    }

    async fn schedule(&self, course_ids: &[String]) -> Result<Vec<ScheduleSlot>, StoreError> {
        self.check("schedule")?;
        self.inner.schedule(course_ids).await
    }

    async fn taught_courses(&self, faculty_id: &str) -> Result<Vec<String>, StoreError> {
        self.check("taught_courses")?;
        self.inner.taught_courses(faculty_id).await
    }

    async fn roster(&self, course_id: &str) -> Result<Vec<Identity>, StoreError> {
        self.check("roster")?;
        self.inner.roster(course_id).await
    }

    async fn syllabus_topics(&self, course_id: &str, unit: Option<u32>) -> Result<Vec<String>, StoreError> {
        self.check("syllabus_topics")?;
        self.inner.syllabus_topics(course_id, unit).await
    }
}

/// Delegates to an in-memory conversation store, failing the named methods.
pub struct FlakyConversationStore {
    inner: InMemoryConversationStore,
    failing: HashSet<&'static str>,
}

impl FlakyConversationStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryConversationStore::new(),
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    fn check(&self, method: &str) -> Result<(), StoreError> {
        if self.failing.contains(method) {
            Err(injected(method))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConversationStore for FlakyConversationStore {
    fn name(&self) -> &str {
        "flaky_mock"
    }

    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), StoreError> {
        self.check("append_turn")?;
        self.inner.append_turn(turn).await
    }

    async fn upsert_context(&self, context: RollingContext) -> Result<(), StoreError> {
        self.check("upsert_context")?;
        self.inner.upsert_context(context).await
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>, StoreError> {
        self.check("recent_turns")?;
        self.inner.recent_turns(user_id, limit).await
    }

    async fn rolling_context(&self, user_id: &str) -> Result<Option<RollingContext>, StoreError> {
        self.check("rolling_context")?;
        self.inner.rolling_context(user_id).await
    }

    async fn delete_turns(&self, user_id: &str) -> Result<u64, StoreError> {
        self.check("delete_turns")?;
        self.inner.delete_turns(user_id).await
    }

    async fn delete_context(&self, user_id: &str) -> Result<bool, StoreError> {
        self.check("delete_context")?;
        self.inner.delete_context(user_id).await
    }
}
