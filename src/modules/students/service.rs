use learnhub_core::PaginationMeta;
use learnhub_core::errors::AppError;
use learnhub_models::ids::{SchoolId, StudentId};
use tracing::{info, instrument};

use super::model::{PaginatedStudentsResponse, Student, StudentQueryParams, UpdateStudentDto};
use super::store::StudentStore;

pub struct StudentService;

impl StudentService {
    #[instrument(skip(store, params), fields(school.id = %school_id))]
    pub async fn list_students(
        store: &dyn StudentStore,
        school_id: SchoolId,
        params: &StudentQueryParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let pagination = &params.pagination;
        let class = params
            .class
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let (data, total) = store
            .list_by_school(school_id, class, pagination.limit(), pagination.offset())
            .await?;

        Ok(PaginatedStudentsResponse {
            data,
            meta: PaginationMeta::new(total, pagination),
        })
    }

    #[instrument(skip(store))]
    pub async fn get_student(
        store: &dyn StudentStore,
        school_id: SchoolId,
        id: StudentId,
    ) -> Result<Student, AppError> {
        store.get(school_id, id).await
    }

    #[instrument(skip(store, dto))]
    pub async fn update_student(
        store: &dyn StudentStore,
        school_id: SchoolId,
        id: StudentId,
        dto: &UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let student = store.update(school_id, id, dto).await?;
        info!(student.id = %student.id, "Student updated");
        Ok(student)
    }

    #[instrument(skip(store))]
    pub async fn delete_student(
        store: &dyn StudentStore,
        school_id: SchoolId,
        id: StudentId,
    ) -> Result<(), AppError> {
        store.delete(school_id, id).await?;
        info!(student.id = %id, "Student deleted");
        Ok(())
    }
}
