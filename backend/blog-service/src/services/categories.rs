/// Category service - administrator-only reference data
use std::sync::Arc;

use crate::authz::{Action, ActionGate, Principal, ResourceKind};
use crate::db::{CategoryRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{required_field, Category, CategoryRequest, RequestBody};
use crate::pagination::{Page, Paginated};
use crate::state::AppState;
use validator::Validate;

const KIND: ResourceKind = ResourceKind::Category;

pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CategoryService {
    pub fn new(state: &AppState) -> Self {
        Self {
            categories: state.categories.clone(),
            posts: state.posts.clone(),
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        page: Page,
        base: &str,
    ) -> Result<Paginated<Category>> {
        ActionGate::authorize_collection(principal, KIND, Action::List)?;
        let (categories, total) = self.categories.list(page.limit(), page.offset()).await?;
        Paginated::new(categories, total, page, base)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        req: impl Into<RequestBody<CategoryRequest>>,
    ) -> Result<Category> {
        ActionGate::authorize_collection(principal, KIND, Action::Create)?;
        let req = req.into().parse()?;
        req.validate()?;
        let name = req
            .name
            .ok_or_else(|| AppError::Validation(required_field("name")))?;

        let category = self.categories.create(&name).await?;
        tracing::info!(category_id = category.id, "category created");
        Ok(category)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> Result<Category> {
        ActionGate::authorize_collection(principal, KIND, Action::Retrieve)?;
        let category = self.fetch(id).await?;
        ActionGate::authorize_object(principal, KIND, Action::Retrieve, &category)?;
        Ok(category)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        req: impl Into<RequestBody<CategoryRequest>>,
        partial: bool,
    ) -> Result<Category> {
        let action = if partial {
            Action::PartialUpdate
        } else {
            Action::Update
        };
        ActionGate::authorize_collection(principal, KIND, action)?;
        let category = self.fetch(id).await?;
        ActionGate::authorize_object(principal, KIND, action, &category)?;

        let req = req.into().parse()?;
        req.validate()?;
        let name = match (req.name, partial) {
            (Some(name), _) => name,
            (None, true) => return Ok(category),
            (None, false) => return Err(AppError::Validation(required_field("name"))),
        };

        self.categories
            .update(id, &name)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<()> {
        ActionGate::authorize_collection(principal, KIND, Action::Destroy)?;
        let category = self.fetch(id).await?;
        ActionGate::authorize_object(principal, KIND, Action::Destroy, &category)?;

        let referencing = self.posts.count_in_category(id).await?;
        if referencing > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete category \"{}\" while {} post(s) reference it",
                category.name, referencing
            )));
        }

        if !self.categories.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }

    async fn fetch(&self, id: i64) -> Result<Category> {
        self.categories.find_by_id(id).await?.ok_or_else(not_found)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}
