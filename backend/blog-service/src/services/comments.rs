/// Comment service - comments nested under a single post
use std::sync::Arc;

use crate::authz::{Action, ActionGate, Principal, ResourceKind};
use crate::db::{CommentRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentRequest, RequestBody};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Comment;

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            posts: state.posts.clone(),
            comments: state.comments.clone(),
        }
    }

    pub async fn list(&self, principal: &Principal, post_id: i64) -> Result<Vec<Comment>> {
        ActionGate::authorize_collection(principal, KIND, Action::List)?;
        self.ensure_post(post_id).await?;
        self.comments.list_for_post(post_id).await
    }

    /// Comment on a post as the acting principal.
    pub async fn create(
        &self,
        principal: &Principal,
        post_id: i64,
        req: impl Into<RequestBody<CommentRequest>>,
    ) -> Result<Comment> {
        ActionGate::authorize_collection(principal, KIND, Action::Create)?;
        let user_id = principal
            .id()
            .ok_or_else(|| AppError::Internal("authenticated principal without id".into()))?;
        self.ensure_post(post_id).await?;

        let req = req.into().parse()?;
        let comment = self
            .comments
            .create(post_id, user_id, req.comment.as_deref())
            .await?;
        tracing::info!(post_id, comment_id = comment.id, user_id, "comment created");
        Ok(comment)
    }

    pub async fn get(&self, principal: &Principal, post_id: i64, comment_id: i64) -> Result<Comment> {
        ActionGate::authorize_collection(principal, KIND, Action::Retrieve)?;
        let comment = self.fetch(post_id, comment_id).await?;
        ActionGate::authorize_object(principal, KIND, Action::Retrieve, &comment)?;
        Ok(comment)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        post_id: i64,
        comment_id: i64,
        req: impl Into<RequestBody<CommentRequest>>,
        partial: bool,
    ) -> Result<Comment> {
        let action = if partial {
            Action::PartialUpdate
        } else {
            Action::Update
        };
        ActionGate::authorize_collection(principal, KIND, action)?;
        let comment = self.fetch(post_id, comment_id).await?;
        ActionGate::authorize_object(principal, KIND, action, &comment)?;

        let req = req.into().parse()?;
        if partial && req.comment.is_none() {
            return Ok(comment);
        }

        self.comments
            .update(comment_id, req.comment.as_deref())
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, principal: &Principal, post_id: i64, comment_id: i64) -> Result<()> {
        ActionGate::authorize_collection(principal, KIND, Action::Destroy)?;
        let comment = self.fetch(post_id, comment_id).await?;
        ActionGate::authorize_object(principal, KIND, Action::Destroy, &comment)?;

        if !self.comments.delete(comment_id).await? {
            return Err(not_found());
        }
        tracing::info!(post_id, comment_id, "comment deleted");
        Ok(())
    }

    async fn ensure_post(&self, post_id: i64) -> Result<()> {
        match self.posts.find_by_id(post_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Post not found".to_string())),
        }
    }

    /// A comment id under the wrong post is a miss, as is a missing post.
    async fn fetch(&self, post_id: i64, comment_id: i64) -> Result<Comment> {
        self.ensure_post(post_id).await?;
        self.comments
            .find_in_post(post_id, comment_id)
            .await?
            .ok_or_else(not_found)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}
