//! Persistence boundary for students.
//!
//! [`StudentStore`] is the only way the import pipeline and the admin
//! endpoints touch student rows. `insert_batch` is all-or-nothing.

use anyhow::anyhow;
use learnhub_core::errors::AppError;
use learnhub_models::ids::{SchoolId, StudentId};
use learnhub_models::students::{
    NewStudent, Student, StudentIdentity, StudentLogin, UpdateStudentDto,
};
use sqlx::PgPool;
use tracing::instrument;

use crate::modules::BoxFuture;

pub trait StudentStore: Send + Sync {
    /// Persists every row or none of them.
    fn insert_batch<'a>(
        &'a self,
        rows: Vec<NewStudent>,
    ) -> BoxFuture<'a, Result<Vec<Student>, AppError>>;

    /// Reserves `count` consecutive ordinals for a class and returns the first.
    ///
    /// Ordinals are never handed out twice for the same school and class.
    fn reserve_ordinals<'a>(
        &'a self,
        school_id: SchoolId,
        class_key: &'a str,
        count: u32,
    ) -> BoxFuture<'a, Result<u32, AppError>>;

    /// Returns the subset of `identities` already present in the school.
    fn find_existing_identities<'a>(
        &'a self,
        school_id: SchoolId,
        identities: &'a [StudentIdentity],
    ) -> BoxFuture<'a, Result<Vec<StudentIdentity>, AppError>>;

    /// A page of students plus the total matching count.
    fn list_by_school<'a>(
        &'a self,
        school_id: SchoolId,
        class: Option<&'a str>,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<'a, Result<(Vec<Student>, i64), AppError>>;

    fn get<'a>(
        &'a self,
        school_id: SchoolId,
        id: StudentId,
    ) -> BoxFuture<'a, Result<Student, AppError>>;

    fn update<'a>(
        &'a self,
        school_id: SchoolId,
        id: StudentId,
        changes: &'a UpdateStudentDto,
    ) -> BoxFuture<'a, Result<Student, AppError>>;

    fn delete<'a>(&'a self, school_id: SchoolId, id: StudentId)
    -> BoxFuture<'a, Result<(), AppError>>;

    fn find_login<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<StudentLogin>, AppError>>;
}

const STUDENT_COLUMNS: &str = "id, school_id, student_name, class, section, mobile_number, email, \
     username, is_active, is_trial, created_at, updated_at";

fn student_not_found() -> AppError {
    AppError::not_found(anyhow!("Student not found"))
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(anyhow!(
                "Student already exists (username or name, class and mobile number are taken)"
            ));
        }
    }
    AppError::database(anyhow::Error::from(e).context("Failed to write students"))
}

#[derive(Clone, Debug)]
pub struct PgStudentStore {
    db: PgPool,
}

impl PgStudentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert_batch_impl(&self, rows: Vec<NewStudent>) -> Result<Vec<Student>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut school_ids = Vec::with_capacity(rows.len());
        let mut names = Vec::with_capacity(rows.len());
        let mut classes = Vec::with_capacity(rows.len());
        let mut sections = Vec::with_capacity(rows.len());
        let mut mobiles = Vec::with_capacity(rows.len());
        let mut emails = Vec::with_capacity(rows.len());
        let mut usernames = Vec::with_capacity(rows.len());
        let mut temp_passwords = Vec::with_capacity(rows.len());
        let mut password_hashes = Vec::with_capacity(rows.len());
        let mut active_flags = Vec::with_capacity(rows.len());
        let mut trial_flags = Vec::with_capacity(rows.len());

        for row in rows {
            school_ids.push(row.school_id);
            names.push(row.student_name);
            classes.push(row.class);
            sections.push(row.section);
            mobiles.push(row.mobile_number.into_inner());
            emails.push(row.email.map(String::from));
            usernames.push(row.username);
            temp_passwords.push(row.temp_password);
            password_hashes.push(row.password_hash);
            active_flags.push(row.is_active);
            trial_flags.push(row.is_trial);
        }

        // A single statement: Postgres applies it atomically.
        let query = format!(
            r#"
            INSERT INTO students (
                school_id, student_name, class, section, mobile_number, email,
                username, temp_password, password_hash, is_active, is_trial
            )
            SELECT * FROM UNNEST(
                $1::uuid[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[],
                $7::text[], $8::text[], $9::text[], $10::bool[], $11::bool[]
            )
            RETURNING {STUDENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(&school_ids)
            .bind(&names)
            .bind(&classes)
            .bind(&sections)
            .bind(&mobiles)
            .bind(&emails)
            .bind(&usernames)
            .bind(&temp_passwords)
            .bind(&password_hashes)
            .bind(&active_flags)
            .bind(&trial_flags)
            .fetch_all(&self.db)
            .await
            .map_err(map_write_error)
    }

    #[instrument(skip(self))]
    async fn reserve_ordinals_impl(
        &self,
        school_id: SchoolId,
        class_key: &str,
        count: u32,
    ) -> Result<u32, AppError> {
        let count = i32::try_from(count)
            .map_err(|_| AppError::bad_request(anyhow!("Too many students in one class")))?;

        let first: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO student_ordinals (school_id, class_key, next_ordinal)
            VALUES ($1, $2, 1 + $3)
            ON CONFLICT (school_id, class_key)
            DO UPDATE SET next_ordinal = student_ordinals.next_ordinal + $3
            RETURNING next_ordinal - $3
            "#,
        )
        .bind(school_id)
        .bind(class_key)
        .bind(count)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to reserve ordinals")))?;

        u32::try_from(first).map_err(|_| AppError::internal(anyhow!("Ordinal counter underflow")))
    }

    #[instrument(skip(self, identities), fields(count = identities.len()))]
    async fn find_existing_identities_impl(
        &self,
        school_id: SchoolId,
        identities: &[StudentIdentity],
    ) -> Result<Vec<StudentIdentity>, AppError> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<&str> = identities.iter().map(|i| i.student_name.as_str()).collect();
        let classes: Vec<&str> = identities.iter().map(|i| i.class.as_str()).collect();
        let mobiles: Vec<&str> = identities.iter().map(|i| i.mobile_number.as_str()).collect();

        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT DISTINCT i.student_name, i.class, i.mobile_number
            FROM students s
            JOIN UNNEST($2::text[], $3::text[], $4::text[]) AS i(student_name, class, mobile_number)
              ON lower(btrim(s.student_name)) = i.student_name
             AND lower(btrim(s.class)) = i.class
             AND s.mobile_number = i.mobile_number
            WHERE s.school_id = $1
            "#,
        )
        .bind(school_id)
        .bind(&names)
        .bind(&classes)
        .bind(&mobiles)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to check existing students")))?;

        Ok(rows
            .into_iter()
            .map(|(student_name, class, mobile_number)| StudentIdentity {
                student_name,
                class,
                mobile_number,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_by_school_impl(
        &self,
        school_id: SchoolId,
        class: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Student>, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM students
            WHERE school_id = $1 AND ($2::text IS NULL OR lower(class) = lower($2))
            "#,
        )
        .bind(school_id)
        .bind(class)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to count students")))?;

        let query = format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students
            WHERE school_id = $1 AND ($2::text IS NULL OR lower(class) = lower($2))
            ORDER BY class, student_name, username
            LIMIT $3 OFFSET $4
            "#
        );
        let students = sqlx::query_as::<_, Student>(&query)
            .bind(school_id)
            .bind(class)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await
            .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to fetch students")))?;

        Ok((students, total))
    }

    #[instrument(skip(self))]
    async fn get_impl(&self, school_id: SchoolId, id: StudentId) -> Result<Student, AppError> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 AND school_id = $2");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(school_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to fetch student")))?
            .ok_or_else(student_not_found)
    }

    #[instrument(skip(self, changes))]
    async fn update_impl(
        &self,
        school_id: SchoolId,
        id: StudentId,
        changes: &UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let query = format!(
            r#"
            UPDATE students SET
                student_name = COALESCE($3, student_name),
                class = COALESCE($4, class),
                section = COALESCE($5, section),
                mobile_number = COALESCE($6, mobile_number),
                email = COALESCE($7, email),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE id = $1 AND school_id = $2
            RETURNING {STUDENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(school_id)
            .bind(changes.student_name.as_deref().map(str::trim))
            .bind(changes.class.as_deref().map(str::trim))
            .bind(changes.section.as_deref().map(str::trim))
            .bind(changes.mobile_number.as_ref().map(|m| m.as_str()))
            .bind(changes.email.as_ref().map(|e| e.as_str()))
            .bind(changes.is_active)
            .fetch_optional(&self.db)
            .await
            .map_err(map_write_error)?
            .ok_or_else(student_not_found)
    }

    #[instrument(skip(self))]
    async fn delete_impl(&self, school_id: SchoolId, id: StudentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1 AND school_id = $2")
            .bind(id)
            .bind(school_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to delete student")))?;

        if result.rows_affected() == 0 {
            return Err(student_not_found());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_login_impl(&self, username: &str) -> Result<Option<StudentLogin>, AppError> {
        let query = format!("SELECT {STUDENT_COLUMNS}, password_hash FROM students WHERE username = $1");
        sqlx::query_as::<_, StudentLogin>(&query)
            .bind(username)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to look up login")))
    }
}

impl StudentStore for PgStudentStore {
    fn insert_batch<'a>(
        &'a self,
        rows: Vec<NewStudent>,
    ) -> BoxFuture<'a, Result<Vec<Student>, AppError>> {
        Box::pin(self.insert_batch_impl(rows))
    }

    fn reserve_ordinals<'a>(
        &'a self,
        school_id: SchoolId,
        class_key: &'a str,
        count: u32,
    ) -> BoxFuture<'a, Result<u32, AppError>> {
        Box::pin(self.reserve_ordinals_impl(school_id, class_key, count))
    }

    fn find_existing_identities<'a>(
        &'a self,
        school_id: SchoolId,
        identities: &'a [StudentIdentity],
    ) -> BoxFuture<'a, Result<Vec<StudentIdentity>, AppError>> {
        Box::pin(self.find_existing_identities_impl(school_id, identities))
    }

    fn list_by_school<'a>(
        &'a self,
        school_id: SchoolId,
        class: Option<&'a str>,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<'a, Result<(Vec<Student>, i64), AppError>> {
        Box::pin(self.list_by_school_impl(school_id, class, limit, offset))
    }

    fn get<'a>(
        &'a self,
        school_id: SchoolId,
        id: StudentId,
    ) -> BoxFuture<'a, Result<Student, AppError>> {
        Box::pin(self.get_impl(school_id, id))
    }

    fn update<'a>(
        &'a self,
        school_id: SchoolId,
        id: StudentId,
        changes: &'a UpdateStudentDto,
    ) -> BoxFuture<'a, Result<Student, AppError>> {
        Box::pin(self.update_impl(school_id, id, changes))
    }

    fn delete<'a>(
        &'a self,
        school_id: SchoolId,
        id: StudentId,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(self.delete_impl(school_id, id))
    }

    fn find_login<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<StudentLogin>, AppError>> {
        Box::pin(self.find_login_impl(username))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub(crate) mod memory {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard};

    use anyhow::anyhow;
    use chrono::Utc;
    use learnhub_core::errors::AppError;
    use learnhub_models::ids::{SchoolId, StudentId};
    use learnhub_models::schools::School;
    use learnhub_models::students::{
        NewStudent, Student, StudentIdentity, StudentLogin, UpdateStudentDto,
    };

    use super::{StudentStore, student_not_found};
    use crate::modules::BoxFuture;

    pub(crate) struct StoredStudent {
        pub(crate) student: Student,
        pub(crate) password_hash: String,
        pub(crate) temp_password: String,
    }

    #[derive(Default)]
    pub(crate) struct MemoryState {
        pub(crate) schools: Vec<School>,
        pub(crate) students: Vec<StoredStudent>,
        pub(crate) ordinals: HashMap<(SchoolId, String), u32>,
    }

    /// In-process store for tests. Enforces the same uniqueness rules as the
    /// Postgres schema and can be told to fail the next batch insert.
    #[derive(Default)]
    pub struct MemoryStore {
        state: Mutex<MemoryState>,
        fail_next_insert: AtomicBool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next `insert_batch` returns an error and writes nothing.
        pub fn fail_next_insert(&self) {
            self.fail_next_insert.store(true, Ordering::SeqCst);
        }

        pub fn student_count(&self) -> usize {
            self.lock().map(|s| s.students.len()).unwrap_or(0)
        }

        /// The plaintext temporary password stored for `username`.
        pub fn temp_password_of(&self, username: &str) -> Option<String> {
            self.lock().ok().and_then(|s| {
                s.students
                    .iter()
                    .find(|stored| stored.student.username == username)
                    .map(|stored| stored.temp_password.clone())
            })
        }

        pub(crate) fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
            self.state
                .lock()
                .map_err(|_| AppError::internal(anyhow!("Memory store lock poisoned")))
        }

        fn conflict() -> AppError {
            AppError::conflict(anyhow!(
                "Student already exists (username or name, class and mobile number are taken)"
            ))
        }

        fn insert_batch_sync(&self, rows: Vec<NewStudent>) -> Result<Vec<Student>, AppError> {
            if self.fail_next_insert.swap(false, Ordering::SeqCst) {
                return Err(AppError::database(anyhow!("Simulated write failure")));
            }

            let mut state = self.lock()?;

            let known_schools: HashSet<SchoolId> = state.schools.iter().map(|s| s.id).collect();
            if let Some(row) = rows.iter().find(|r| !known_schools.contains(&r.school_id)) {
                return Err(AppError::database(anyhow!(
                    "School {} does not exist",
                    row.school_id
                )));
            }

            let mut usernames: HashSet<String> = state
                .students
                .iter()
                .map(|s| s.student.username.clone())
                .collect();
            let mut identities: HashSet<(SchoolId, StudentIdentity)> = state
                .students
                .iter()
                .map(|s| (s.student.school_id, s.student.identity()))
                .collect();
            let clashes = rows.iter().any(|row| {
                !usernames.insert(row.username.clone())
                    || !identities.insert((row.school_id, row.identity()))
            });
            if clashes {
                return Err(Self::conflict());
            }

            let now = Utc::now();
            let mut inserted = Vec::with_capacity(rows.len());
            for row in rows {
                let student = Student {
                    id: StudentId::new(),
                    school_id: row.school_id,
                    student_name: row.student_name,
                    class: row.class,
                    section: row.section,
                    mobile_number: row.mobile_number,
                    email: row.email,
                    username: row.username,
                    is_active: row.is_active,
                    is_trial: row.is_trial,
                    created_at: now,
                    updated_at: now,
                };
                state.students.push(StoredStudent {
                    student: student.clone(),
                    password_hash: row.password_hash,
                    temp_password: row.temp_password,
                });
                inserted.push(student);
            }

            Ok(inserted)
        }

        fn update_sync(
            &self,
            school_id: SchoolId,
            id: StudentId,
            changes: &UpdateStudentDto,
        ) -> Result<Student, AppError> {
            let mut state = self.lock()?;

            let position = state
                .students
                .iter()
                .position(|s| s.student.id == id && s.student.school_id == school_id)
                .ok_or_else(student_not_found)?;

            let mut updated = state.students[position].student.clone();
            if let Some(name) = &changes.student_name {
                updated.student_name = name.trim().to_string();
            }
            if let Some(class) = &changes.class {
                updated.class = class.trim().to_string();
            }
            if let Some(section) = &changes.section {
                updated.section = Some(section.trim().to_string());
            }
            if let Some(mobile) = &changes.mobile_number {
                updated.mobile_number = mobile.clone();
            }
            if let Some(email) = &changes.email {
                updated.email = Some(email.clone());
            }
            if let Some(is_active) = changes.is_active {
                updated.is_active = is_active;
            }
            updated.updated_at = Utc::now();

            let identity = updated.identity();
            let clash = state.students.iter().enumerate().any(|(i, s)| {
                i != position && s.student.school_id == school_id && s.student.identity() == identity
            });
            if clash {
                return Err(Self::conflict());
            }

            state.students[position].student = updated.clone();
            Ok(updated)
        }
    }

    impl StudentStore for MemoryStore {
        fn insert_batch<'a>(
            &'a self,
            rows: Vec<NewStudent>,
        ) -> BoxFuture<'a, Result<Vec<Student>, AppError>> {
            Box::pin(async move { self.insert_batch_sync(rows) })
        }

        fn reserve_ordinals<'a>(
            &'a self,
            school_id: SchoolId,
            class_key: &'a str,
            count: u32,
        ) -> BoxFuture<'a, Result<u32, AppError>> {
            Box::pin(async move {
                let mut state = self.lock()?;
                let next = state
                    .ordinals
                    .entry((school_id, class_key.to_string()))
                    .or_insert(1);
                let first = *next;
                *next += count;
                Ok(first)
            })
        }

        fn find_existing_identities<'a>(
            &'a self,
            school_id: SchoolId,
            identities: &'a [StudentIdentity],
        ) -> BoxFuture<'a, Result<Vec<StudentIdentity>, AppError>> {
            Box::pin(async move {
                let state = self.lock()?;
                let existing: HashSet<StudentIdentity> = state
                    .students
                    .iter()
                    .filter(|s| s.student.school_id == school_id)
                    .map(|s| s.student.identity())
                    .collect();

                let mut found: Vec<StudentIdentity> = identities
                    .iter()
                    .filter(|identity| existing.contains(*identity))
                    .cloned()
                    .collect();
                found.sort();
                found.dedup();
                Ok(found)
            })
        }

        fn list_by_school<'a>(
            &'a self,
            school_id: SchoolId,
            class: Option<&'a str>,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<'a, Result<(Vec<Student>, i64), AppError>> {
            Box::pin(async move {
                let state = self.lock()?;
                let mut matching: Vec<Student> = state
                    .students
                    .iter()
                    .map(|s| &s.student)
                    .filter(|s| s.school_id == school_id)
                    .filter(|s| class.is_none_or(|c| s.class.eq_ignore_ascii_case(c)))
                    .cloned()
                    .collect();
                matching.sort_by(|a, b| {
                    (&a.class, &a.student_name, &a.username)
                        .cmp(&(&b.class, &b.student_name, &b.username))
                });

                let total = matching.len() as i64;
                let page = matching
                    .into_iter()
                    .skip(offset.max(0) as usize)
                    .take(limit.max(0) as usize)
                    .collect();
                Ok((page, total))
            })
        }

        fn get<'a>(
            &'a self,
            school_id: SchoolId,
            id: StudentId,
        ) -> BoxFuture<'a, Result<Student, AppError>> {
            Box::pin(async move {
                let state = self.lock()?;
                state
                    .students
                    .iter()
                    .find(|s| s.student.id == id && s.student.school_id == school_id)
                    .map(|s| s.student.clone())
                    .ok_or_else(student_not_found)
            })
        }

        fn update<'a>(
            &'a self,
            school_id: SchoolId,
            id: StudentId,
            changes: &'a UpdateStudentDto,
        ) -> BoxFuture<'a, Result<Student, AppError>> {
            Box::pin(async move { self.update_sync(school_id, id, changes) })
        }

        fn delete<'a>(
            &'a self,
            school_id: SchoolId,
            id: StudentId,
        ) -> BoxFuture<'a, Result<(), AppError>> {
            Box::pin(async move {
                let mut state = self.lock()?;
                let before = state.students.len();
                state
                    .students
                    .retain(|s| !(s.student.id == id && s.student.school_id == school_id));
                if state.students.len() == before {
                    return Err(student_not_found());
                }
                Ok(())
            })
        }

        fn find_login<'a>(
            &'a self,
            username: &'a str,
        ) -> BoxFuture<'a, Result<Option<StudentLogin>, AppError>> {
            Box::pin(async move {
                let state = self.lock()?;
                Ok(state
                    .students
                    .iter()
                    .find(|s| s.student.username == username)
                    .map(|s| StudentLogin {
                        student: s.student.clone(),
                        password_hash: s.password_hash.clone(),
                    }))
            })
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
