//! Persistence boundary for schools.

use anyhow::anyhow;
use learnhub_core::errors::AppError;
use learnhub_models::ids::SchoolId;
use learnhub_models::schools::{CreateSchoolDto, School, username_prefix};
use sqlx::PgPool;
use tracing::{instrument, warn};

use crate::modules::BoxFuture;

pub trait SchoolStore: Send + Sync {
    /// Fails with 409 when the code is already taken (case-insensitive) or
    /// when its username prefix matches another school's.
    fn create<'a>(&'a self, dto: &'a CreateSchoolDto) -> BoxFuture<'a, Result<School, AppError>>;

    fn list<'a>(
        &'a self,
        name: Option<&'a str>,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<'a, Result<(Vec<School>, i64), AppError>>;

    fn get<'a>(&'a self, id: SchoolId) -> BoxFuture<'a, Result<School, AppError>>;

    /// Removes the school together with its students.
    fn delete<'a>(&'a self, id: SchoolId) -> BoxFuture<'a, Result<(), AppError>>;
}

fn school_not_found() -> AppError {
    AppError::not_found(anyhow!("School not found"))
}

fn duplicate_code(code: &str) -> AppError {
    AppError::conflict(anyhow!("School code '{}' already exists", code))
}

fn duplicate_prefix(code: &str, prefix: &str) -> AppError {
    AppError::conflict(anyhow!(
        "School code '{}' gives username prefix '{}', which already exists",
        code,
        prefix
    ))
}

const PREFIX_CONSTRAINT: &str = "schools_username_prefix_key";

#[derive(Clone, Debug)]
pub struct PgSchoolStore {
    db: PgPool,
}

impl PgSchoolStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[instrument(skip(self, dto), fields(school.code = %dto.code, db.table = "schools"))]
    async fn create_impl(&self, dto: &CreateSchoolDto) -> Result<School, AppError> {
        let prefix = username_prefix(&dto.code);
        sqlx::query_as::<_, School>(
            "INSERT INTO schools (name, code, username_prefix, address) VALUES ($1, $2, $3, $4)
             RETURNING id, name, code, username_prefix, address, created_at, updated_at",
        )
        .bind(dto.name.trim())
        .bind(dto.code.trim())
        .bind(&prefix)
        .bind(dto.address.as_deref())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!(school.code = %dto.code, "Attempted to create school with existing code");
                if db_err.constraint() == Some(PREFIX_CONSTRAINT) {
                    return duplicate_prefix(&dto.code, &prefix);
                }
                return duplicate_code(&dto.code);
            }
            AppError::database(anyhow::Error::from(e).context("Failed to create school"))
        })
    }

    #[instrument(skip(self), fields(db.table = "schools"))]
    async fn list_impl(
        &self,
        name: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<School>, i64), AppError> {
        let pattern = name.map(|n| format!("%{}%", n.trim()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM schools WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to count schools")))?;

        let schools = sqlx::query_as::<_, School>(
            "SELECT id, name, code, username_prefix, address, created_at, updated_at FROM schools
             WHERE ($1::text IS NULL OR name ILIKE $1)
             ORDER BY name
             LIMIT $2 OFFSET $3",
        )
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to fetch schools")))?;

        Ok((schools, total))
    }

    #[instrument(skip(self), fields(db.table = "schools"))]
    async fn get_impl(&self, id: SchoolId) -> Result<School, AppError> {
        sqlx::query_as::<_, School>(
            "SELECT id, name, code, username_prefix, address, created_at, updated_at FROM schools WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to fetch school")))?
        .ok_or_else(school_not_found)
    }

    #[instrument(skip(self), fields(db.table = "schools"))]
    async fn delete_impl(&self, id: SchoolId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::database(anyhow::Error::from(e).context("Failed to delete school")))?;

        if result.rows_affected() == 0 {
            return Err(school_not_found());
        }
        Ok(())
    }
}

impl SchoolStore for PgSchoolStore {
    fn create<'a>(&'a self, dto: &'a CreateSchoolDto) -> BoxFuture<'a, Result<School, AppError>> {
        Box::pin(self.create_impl(dto))
    }

    fn list<'a>(
        &'a self,
        name: Option<&'a str>,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<'a, Result<(Vec<School>, i64), AppError>> {
        Box::pin(self.list_impl(name, limit, offset))
    }

    fn get<'a>(&'a self, id: SchoolId) -> BoxFuture<'a, Result<School, AppError>> {
        Box::pin(self.get_impl(id))
    }

    fn delete<'a>(&'a self, id: SchoolId) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(self.delete_impl(id))
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use chrono::Utc;
    use learnhub_core::errors::AppError;
    use learnhub_models::ids::SchoolId;
    use learnhub_models::schools::{CreateSchoolDto, School, username_prefix};

    use super::{SchoolStore, duplicate_code, duplicate_prefix, school_not_found};
    use crate::modules::BoxFuture;
    use crate::modules::students::store::MemoryStore;

    impl SchoolStore for MemoryStore {
        fn create<'a>(
            &'a self,
            dto: &'a CreateSchoolDto,
        ) -> BoxFuture<'a, Result<School, AppError>> {
            Box::pin(async move {
                let mut state = self.lock()?;
                let code = dto.code.trim();
                if state.schools.iter().any(|s| s.code.eq_ignore_ascii_case(code)) {
                    return Err(duplicate_code(code));
                }
                let prefix = username_prefix(code);
                if state.schools.iter().any(|s| s.username_prefix == prefix) {
                    return Err(duplicate_prefix(code, &prefix));
                }

                let now = Utc::now();
                let school = School {
                    id: SchoolId::new(),
                    name: dto.name.trim().to_string(),
                    code: code.to_string(),
                    username_prefix: prefix,
                    address: dto.address.clone(),
                    created_at: now,
                    updated_at: now,
                };
                state.schools.push(school.clone());
                Ok(school)
            })
        }

        fn list<'a>(
            &'a self,
            name: Option<&'a str>,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<'a, Result<(Vec<School>, i64), AppError>> {
            Box::pin(async move {
                let state = self.lock()?;
                let needle = name.map(|n| n.trim().to_lowercase());
                let mut matching: Vec<School> = state
                    .schools
                    .iter()
                    .filter(|s| {
                        needle
                            .as_deref()
                            .is_none_or(|n| s.name.to_lowercase().contains(n))
                    })
                    .cloned()
                    .collect();
                matching.sort_by(|a, b| a.name.cmp(&b.name));

                let total = matching.len() as i64;
                let page = matching
                    .into_iter()
                    .skip(offset.max(0) as usize)
                    .take(limit.max(0) as usize)
                    .collect();
                Ok((page, total))
            })
        }

        fn get<'a>(&'a self, id: SchoolId) -> BoxFuture<'a, Result<School, AppError>> {
            Box::pin(async move {
                let state = self.lock()?;
                state
                    .schools
                    .iter()
                    .find(|s| s.id == id)
                    .cloned()
                    .ok_or_else(school_not_found)
            })
        }

        fn delete<'a>(&'a self, id: SchoolId) -> BoxFuture<'a, Result<(), AppError>> {
            Box::pin(async move {
                let mut state = self.lock()?;
                let before = state.schools.len();
                state.schools.retain(|s| s.id != id);
                if state.schools.len() == before {
                    return Err(school_not_found());
                }
                state.students.retain(|s| s.student.school_id != id);
                state.ordinals.retain(|(school_id, _), _| *school_id != id);
                Ok(())
            })
        }
    }
}
