//! In-memory backends: useful for testing and ephemeral sessions.
//!
//! The academic record and vector stores are read-only once built (records
//! and chunks are written by other systems), so they are assembled with
//! `with_*` builders. The conversation store is mutable behind a lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use academaide_core::academic::*;
use academaide_core::conversation::*;
use academaide_core::error::StoreError;
use academaide_core::material::*;

use crate::vector::rank_chunks;

/// Academic records held in plain collections.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAcademicStore {
    identities: HashMap<(Role, String), Identity>,
    enrollments: Vec<EnrollmentRecord>,
    courses: HashMap<String, Course>,
    slots: Vec<ScheduleSlot>,
    /// (faculty_id, course_id)
    teaches: Vec<(String, String)>,
    /// (course_id, unit_no, topic)
    syllabus: Vec<(String, u32, String)>,
}

impl InMemoryAcademicStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identities
            .insert((identity.role, identity.id.clone()), identity);
        self
    }

    pub fn with_enrollment(mut self, enrollment: EnrollmentRecord) -> Self {
        self.enrollments.push(enrollment);
        self
    }

    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.insert(course.course_id.clone(), course);
        self
    }

    pub fn with_slot(mut self, slot: ScheduleSlot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn with_teaching(mut self, faculty_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        self.teaches.push((faculty_id.into(), course_id.into()));
        self
    }

    pub fn with_syllabus_topic(
        mut self,
        course_id: impl Into<String>,
        unit_no: u32,
        topic: impl Into<String>,
    ) -> Self {
        self.syllabus.push((course_id.into(), unit_no, topic.into()));
        self
    }
}

#[async_trait]
impl AcademicRecordStore for InMemoryAcademicStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn identity(&self, user_id: &str, role: Role) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.get(&(role, user_id.to_string())).cloned())
    }

    async fn enrollments(&self, student_id: &str) -> Result<Vec<EnrollmentRecord>, StoreError> {
        Ok(self
            .enrollments
            .iter()
            .filter(|e| e.user_id == student_id)
            .cloned()
            .collect())
    }

    async fn courses(&self, course_ids: &[String]) -> Result<Vec<Course>, StoreError> {
        Ok(course_ids
            .iter()
            .filter_map(|id| self.courses.get(id).cloned())
            .collect())
    }

    async fn schedule(&self, course_ids: &[String]) -> Result<Vec<ScheduleSlot>, StoreError> {
        Ok(self
            .slots
            .iter()
            .filter(|slot| course_ids.contains(&slot.course_id))
            .cloned()
            .collect())
    }

    async fn taught_courses(&self, faculty_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .teaches
            .iter()
            .filter(|(faculty, _)| faculty == faculty_id)
            .map(|(_, course)| course.clone())
            .collect())
    }

    async fn roster(&self, course_id: &str) -> Result<Vec<Identity>, StoreError> {
        let mut roster: Vec<Identity> = self
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .filter_map(|e| {
                self.identities
                    .get(&(Role::Student, e.user_id.clone()))
                    .cloned()
            })
            .collect();
        roster.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roster)
    }

    async fn syllabus_topics(
        &self,
        course_id: &str,
        unit: Option<u32>,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .syllabus
            .iter()
            .filter(|(course, unit_no, _)| {
                course == course_id && unit.is_none_or(|u| u == *unit_no)
            })
            .map(|(_, _, topic)| topic.clone())
            .collect())
    }
}

/// Material chunks ranked by brute-force cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    chunks: Vec<DocumentChunk>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, chunk: DocumentChunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn nearest_chunks(&self, query: &MaterialQuery) -> Result<Vec<ScoredChunk>, StoreError> {
        Ok(rank_chunks(&self.chunks, query))
    }
}

/// Chat log and rolling contexts held in memory.
#[derive(Clone, Default)]
pub struct InMemoryConversationStore {
    turns: Arc<RwLock<Vec<ConversationTurn>>>,
    contexts: Arc<RwLock<HashMap<String, RollingContext>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every logged turn of a user, in append order.
    pub async fn turns_for(&self, user_id: &str) -> Vec<ConversationTurn> {
        self.turns
            .read()
            .await
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn turn_count(&self) -> usize {
        self.turns.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), StoreError> {
        self.turns.write().await.push(turn);
        Ok(())
    }

    async fn upsert_context(&self, context: RollingContext) -> Result<(), StoreError> {
        self.contexts
            .write()
            .await
            .insert(context.user_id.clone(), context);
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let mut turns = self.turns_for(user_id).await;
        turns.sort_by_key(|t| t.created_at);
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.split_off(skip))
    }

    async fn rolling_context(&self, user_id: &str) -> Result<Option<RollingContext>, StoreError> {
        Ok(self.contexts.read().await.get(user_id).cloned())
    }

    async fn delete_turns(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut turns = self.turns.write().await;
        let len_before = turns.len();
        turns.retain(|t| t.user_id != user_id);
        Ok((len_before - turns.len()) as u64)
    }

    async fn delete_context(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.contexts.write().await.remove(user_id).is_some())
    }
}
