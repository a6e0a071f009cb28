/// Post service - post creation, retrieval, search and management
use std::sync::Arc;

use crate::authz::{Action, ActionGate, Principal, ResourceKind};
use crate::db::{CategoryRepository, CommentRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{Post, PostDetail, PostRequest, RequestBody};
use crate::pagination::{Page, Paginated};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Post;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl PostService {
    pub fn new(state: &AppState) -> Self {
        Self {
            posts: state.posts.clone(),
            comments: state.comments.clone(),
            categories: state.categories.clone(),
        }
    }

    /// Every post, newest first. Administrators only.
    pub async fn list(
        &self,
        principal: &Principal,
        page: Page,
        base: &str,
    ) -> Result<Paginated<PostDetail>> {
        ActionGate::authorize_collection(principal, KIND, Action::List)?;
        let (posts, total) = self.posts.list(page.limit(), page.offset()).await?;
        let details = self.with_comments(posts).await?;
        Paginated::new(details, total, page, base)
    }

    /// Create a post authored by the acting principal.
    pub async fn create(
        &self,
        principal: &Principal,
        req: impl Into<RequestBody<PostRequest>>,
    ) -> Result<PostDetail> {
        ActionGate::authorize_collection(principal, KIND, Action::Create)?;
        let author_id = principal
            .id()
            .ok_or_else(|| AppError::Internal("authenticated principal without id".into()))?;

        let new_post = req.into().parse()?.into_new_post(author_id)?;
        self.ensure_category(new_post.category_id).await?;

        let post = self.posts.create(&new_post).await?;
        tracing::info!(post_id = post.id, author_id, "post created");

        Ok(PostDetail {
            post,
            comment: Vec::new(),
        })
    }

    /// Any post by id, drafts included.
    pub async fn get(&self, principal: &Principal, id: i64) -> Result<PostDetail> {
        ActionGate::authorize_collection(principal, KIND, Action::Retrieve)?;
        let post = self.fetch(id).await?;
        ActionGate::authorize_object(principal, KIND, Action::Retrieve, &post)?;
        self.detail(post).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        req: impl Into<RequestBody<PostRequest>>,
        partial: bool,
    ) -> Result<PostDetail> {
        let action = if partial {
            Action::PartialUpdate
        } else {
            Action::Update
        };
        ActionGate::authorize_collection(principal, KIND, action)?;
        let post = self.fetch(id).await?;
        ActionGate::authorize_object(principal, KIND, action, &post)?;

        let changes = req.into().parse()?.into_changes(partial)?;
        if let Some(category_id) = changes.category_id {
            self.ensure_category(category_id).await?;
        }

        let updated = self.posts.update(id, &changes).await?.ok_or_else(not_found)?;
        tracing::info!(post_id = id, "post updated");
        self.detail(updated).await
    }

    /// Delete a post together with its comments.
    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<()> {
        ActionGate::authorize_collection(principal, KIND, Action::Destroy)?;
        let post = self.fetch(id).await?;
        ActionGate::authorize_object(principal, KIND, Action::Destroy, &post)?;

        if !self.posts.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }

    /// All posts written by the acting principal.
    pub async fn mine(&self, principal: &Principal) -> Result<Vec<PostDetail>> {
        ActionGate::authorize_authenticated(principal, KIND, Action::List)?;
        let author_id = principal
            .id()
            .ok_or_else(|| AppError::Internal("authenticated principal without id".into()))?;

        let posts = self.posts.list_by_author(author_id).await?;
        if posts.is_empty() {
            return Err(AppError::NotFound("You do not have posts yet.".to_string()));
        }
        self.with_comments(posts).await
    }

    /// Posts whose title or slug contains the query, ignoring case.
    pub async fn search(&self, principal: &Principal, query: &str) -> Result<Vec<PostDetail>> {
        ActionGate::authorize_authenticated(principal, KIND, Action::List)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest(
                "search_query parameter is required".to_string(),
            ));
        }

        let posts = self.posts.search(query).await?;
        tracing::debug!(query, hits = posts.len(), "post search");
        self.with_comments(posts).await
    }

    async fn fetch(&self, id: i64) -> Result<Post> {
        self.posts.find_by_id(id).await?.ok_or_else(not_found)
    }

    async fn ensure_category(&self, category_id: i64) -> Result<()> {
        match self.categories.find_by_id(category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation(format!(
                "category: Invalid pk \"{category_id}\" - object does not exist."
            ))),
        }
    }

    async fn detail(&self, post: Post) -> Result<PostDetail> {
        let comment = self.comments.list_for_post(post.id).await?;
        Ok(PostDetail { post, comment })
    }

    async fn with_comments(&self, posts: Vec<Post>) -> Result<Vec<PostDetail>> {
        let mut details = Vec::with_capacity(posts.len());
        for post in posts {
            details.push(self.detail(post).await?);
        }
        Ok(details)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}
