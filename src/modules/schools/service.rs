use learnhub_core::PaginationMeta;
use learnhub_core::errors::AppError;
use learnhub_models::ids::SchoolId;
use tracing::{debug, info, instrument};

use super::model::{CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams};
use super::store::SchoolStore;
use crate::metrics;

pub struct SchoolService;

impl SchoolService {
    #[instrument(skip(store, dto), fields(school.name = %dto.name, school.code = %dto.code))]
    pub async fn create_school(
        store: &dyn SchoolStore,
        dto: &CreateSchoolDto,
    ) -> Result<School, AppError> {
        let school = store.create(dto).await?;
        metrics::track_school_created();
        info!(school.id = %school.id, "School created successfully");
        Ok(school)
    }

    #[instrument(skip(store, filters))]
    pub async fn get_all_schools(
        store: &dyn SchoolStore,
        filters: &SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let name = filters
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        debug!(limit, offset, filter.name = ?name, "Fetching schools");

        let (data, total) = store.list(name, limit, offset).await?;
        Ok(PaginatedSchoolsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(store))]
    pub async fn get_school(store: &dyn SchoolStore, id: SchoolId) -> Result<School, AppError> {
        store.get(id).await
    }

    #[instrument(skip(store))]
    pub async fn delete_school(store: &dyn SchoolStore, id: SchoolId) -> Result<(), AppError> {
        store.delete(id).await?;
        info!(school.id = %id, "School deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::students::store::MemoryStore;
    use learnhub_core::PaginationParams;

    fn dto(name: &str, code: &str) -> CreateSchoolDto {
        CreateSchoolDto {
            name: name.to_string(),
            code: code.to_string(),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_is_conflict() {
        let store = MemoryStore::new();
        SchoolService::create_school(&store, &dto("Greenfield", "SCH-GF"))
            .await
            .unwrap();

        let err = SchoolService::create_school(&store, &dto("Greenfield North", "sch-gf"))
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);
    }

    #[tokio::test]
    async fn test_colliding_username_prefix_is_conflict() {
        let store = MemoryStore::new();
        let school = SchoolService::create_school(&store, &dto("Greenfield", "SCH-GPS"))
            .await
            .unwrap();
        assert_eq!(school.username_prefix, "gps");

        let err = SchoolService::create_school(&store, &dto("Greenfield Annex", "GPS"))
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);
    }

    #[tokio::test]
    async fn test_list_filters_by_name() {
        let store = MemoryStore::new();
        for (name, code) in [("Greenfield", "SCH-GF"), ("Riverside", "SCH-RS"), ("Greenwood", "SCH-GW")] {
            SchoolService::create_school(&store, &dto(name, code)).await.unwrap();
        }

        let filters = SchoolFilterParams {
            name: Some("green".to_string()),
            pagination: PaginationParams {
                limit: Some(1),
                ..Default::default()
            },
        };
        let page = SchoolService::get_all_schools(&store, &filters).await.unwrap();

        assert_eq!(page.meta.total, 2);
        assert!(page.meta.has_more);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Greenfield");
    }

    #[tokio::test]
    async fn test_delete_missing_school() {
        let store = MemoryStore::new();
        let err = SchoolService::delete_school(&store, SchoolId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }
}
