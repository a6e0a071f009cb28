//! Shared fixtures for blog-service integration tests
//!
//! `InMemoryStore` implements every repository trait over plain maps so the
//! full HTTP stack can run without PostgreSQL. Deletes cascade the way the
//! schema's foreign keys do.
#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use blog_service::authz::{AuthenticatedUser, Principal};
use blog_service::db::{
    CategoryRepository, CommentRepository, PostRepository, TokenBlacklist, UserRepository,
};
use blog_service::models::{
    Category, Comment, NewPost, NewUser, Post, PostChanges, PostStatus, User, UserChanges,
};
use blog_service::storage::PhotoStorage;
use blog_service::{AppError, AppState, Result};
use chrono::{DateTime, Utc};
use crypto_core::{hash_password, JwtKeys};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_PRIVATE_KEY: &str = include_str!("../../../libs/crypto-core/testdata/test_private_key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../../../libs/crypto-core/testdata/test_public_key.pem");

pub const MEDIA_URL: &str = "/media/";

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    blacklist: HashMap<Uuid, (i64, DateTime<Utc>)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory stand-in for the database.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store with the default category seeded, as the migration does.
    pub fn new() -> Self {
        let mut tables = Tables {
            next_id: 100,
            ..Default::default()
        };
        tables.categories.insert(
            1,
            Category {
                id: 1,
                name: "uncategorized".to_string(),
            },
        );
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    pub fn post_count(&self) -> usize {
        self.tables.lock().unwrap().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.tables.lock().unwrap().comments.len()
    }

    pub fn post(&self, id: i64) -> Option<Post> {
        self.tables.lock().unwrap().posts.get(&id).cloned()
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.tables.lock().unwrap().users.get(&id).cloned()
    }

    pub fn blacklist_len(&self) -> usize {
        self.tables.lock().unwrap().blacklist.len()
    }

    pub fn set_active(&self, id: i64, active: bool) {
        if let Some(user) = self.tables.lock().unwrap().users.get_mut(&id) {
            user.is_active = active;
        }
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published.cmp(&a.published).then(b.id.cmp(&a.id)));
}

fn page<T: Clone>(items: Vec<T>, limit: i64, offset: i64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let slice = items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();
    (slice, total)
}

fn in_use(field: &str) -> AppError {
    AppError::Validation(format!("{field}: This {field} is already in use."))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.values().any(|u| u.username == user.username) {
            return Err(in_use("username"));
        }
        if t.users.values().any(|u| u.email == user.email) {
            return Err(in_use("email"));
        }
        let id = t.next_id();
        let row = User {
            id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: String::new(),
            about: None,
            photo: None,
            password_hash: user.password_hash.clone(),
            is_staff: user.is_staff,
            is_active: true,
            joined_at: Utc::now(),
        };
        t.users.insert(id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let t = self.tables.lock().unwrap();
        Ok(page(t.users.values().cloned().collect(), limit, offset))
    }

    async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let t = self.tables.lock().unwrap();
        let hits = t
            .users
            .values()
            .filter(|u| contains(&u.first_name, query) || contains(&u.username, query))
            .cloned()
            .collect();
        Ok(page(hits, limit, offset))
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        let mut t = self.tables.lock().unwrap();
        if let Some(username) = &changes.username {
            if t.users.values().any(|u| u.id != id && &u.username == username) {
                return Err(in_use("username"));
            }
        }
        if let Some(email) = &changes.email {
            if t.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(in_use("email"));
            }
        }
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &changes.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &changes.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &changes.email {
            user.email = v.clone();
        }
        if let Some(v) = &changes.username {
            user.username = v.clone();
        }
        if let Some(v) = &changes.about {
            user.about = Some(v.clone());
        }
        Ok(Some(user.clone()))
    }

    async fn set_photo(&self, id: i64, photo: Option<&str>) -> Result<Option<User>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.users.get_mut(&id).map(|u| {
            u.photo = photo.map(String::from);
            u.clone()
        }))
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        Ok(t
            .users
            .get_mut(&id)
            .map(|u| u.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        let authored: Vec<i64> = t
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        t.posts.retain(|_, p| p.author_id != id);
        t.comments
            .retain(|_, c| c.user_id != id && !authored.contains(&c.post_id));
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, name: &str) -> Result<Category> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let category = Category {
            id,
            name: name.to_string(),
        };
        t.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.tables.lock().unwrap().categories.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Category>, i64)> {
        let t = self.tables.lock().unwrap();
        Ok(page(t.categories.values().cloned().collect(), limit, offset))
    }

    async fn update(&self, id: i64, name: &str) -> Result<Option<Category>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.categories.get_mut(&id).map(|c| {
            c.name = name.to_string();
            c.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        if t.posts.values().any(|p| p.category_id == id) {
            return Err(AppError::Conflict(
                "Operation blocked by records that still reference this resource".to_string(),
            ));
        }
        Ok(t.categories.remove(&id).is_some())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: &NewPost) -> Result<Post> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Post {
            id,
            category_id: post.category_id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            content: post.content.clone(),
            author_id: post.author_id,
            status: post.status,
            published: Utc::now(),
        };
        t.posts.insert(id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.tables.lock().unwrap().posts.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64)> {
        let t = self.tables.lock().unwrap();
        let mut posts: Vec<Post> = t.posts.values().cloned().collect();
        newest_first(&mut posts);
        Ok(page(posts, limit, offset))
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        let t = self.tables.lock().unwrap();
        let mut posts: Vec<Post> = t
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn search(&self, query: &str) -> Result<Vec<Post>> {
        let t = self.tables.lock().unwrap();
        let mut posts: Vec<Post> = t
            .posts
            .values()
            .filter(|p| contains(&p.title, query) || contains(&p.slug, query))
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn count_in_category(&self, category_id: i64) -> Result<i64> {
        let t = self.tables.lock().unwrap();
        Ok(t.posts.values().filter(|p| p.category_id == category_id).count() as i64)
    }

    async fn update(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>> {
        let mut t = self.tables.lock().unwrap();
        let Some(post) = t.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.category_id {
            post.category_id = v;
        }
        if let Some(v) = &changes.title {
            post.title = v.clone();
        }
        if let Some(v) = &changes.slug {
            post.slug = v.clone();
        }
        if let Some(v) = &changes.excerpt {
            post.excerpt = Some(v.clone());
        }
        if let Some(v) = &changes.content {
            post.content = v.clone();
        }
        if let Some(v) = changes.status {
            post.status = v;
        }
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        if t.posts.remove(&id).is_none() {
            return Ok(false);
        }
        t.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, post_id: i64, user_id: i64, comment: Option<&str>) -> Result<Comment> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let now = Utc::now();
        let row = Comment {
            id,
            post_id,
            user_id,
            comment: comment.map(String::from),
            created_at: now,
            updated_at: now,
        };
        t.comments.insert(id, row.clone());
        Ok(row)
    }

    async fn find_in_post(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .comments
            .get(&comment_id)
            .filter(|c| c.post_id == post_id)
            .cloned())
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn update(&self, comment_id: i64, comment: Option<&str>) -> Result<Option<Comment>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.comments.get_mut(&comment_id).map(|c| {
            c.comment = comment.map(String::from);
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete(&self, comment_id: i64) -> Result<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .comments
            .remove(&comment_id)
            .is_some())
    }
}

#[async_trait]
impl TokenBlacklist for InMemoryStore {
    async fn blacklist(&self, jti: Uuid, user_id: i64, expires_at: DateTime<Utc>) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .blacklist
            .entry(jti)
            .or_insert((user_id, expires_at));
        Ok(())
    }

    async fn is_blacklisted(&self, jti: Uuid) -> Result<bool> {
        Ok(self.tables.lock().unwrap().blacklist.contains_key(&jti))
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut tables = self.tables.lock().unwrap();
        let before = tables.blacklist.len();
        tables.blacklist.retain(|_, (_, expires_at)| *expires_at >= now);
        Ok((before - tables.blacklist.len()) as u64)
    }
}

/// Photo storage that only records what it was asked to do.
#[derive(Clone, Default)]
pub struct RecordingPhotoStorage {
    pub stored: Arc<Mutex<Vec<String>>>,
    pub removed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PhotoStorage for RecordingPhotoStorage {
    async fn store(&self, content_type: &mime::Mime, _bytes: &[u8]) -> Result<String> {
        let path = format!(
            "users/{}.{}",
            Uuid::new_v4(),
            blog_service::storage::extension_for(content_type)
        );
        self.stored.lock().unwrap().push(path.clone());
        Ok(path)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.removed.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

pub fn test_keys() -> JwtKeys {
    JwtKeys::from_rsa_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY).expect("test keys")
}

/// A running test fixture: the store plus the state built on it.
pub struct TestContext {
    pub store: InMemoryStore,
    pub photos: Arc<dyn PhotoStorage>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_photos(Arc::new(RecordingPhotoStorage::default()))
    }

    pub fn with_photos(photos: Arc<dyn PhotoStorage>) -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        let state = AppState {
            users: shared.clone(),
            posts: shared.clone(),
            comments: shared.clone(),
            categories: shared.clone(),
            token_blacklist: shared,
            photos: photos.clone(),
            jwt: Arc::new(test_keys()),
            media_url: MEDIA_URL.to_string(),
        };
        Self {
            store,
            photos,
            state,
        }
    }

    pub fn data(&self) -> web::Data<AppState> {
        web::Data::new(self.state.clone())
    }

    /// Create an active account with the given password.
    pub async fn user(&self, username: &str, password: &str, is_staff: bool) -> User {
        UserRepository::create(
            &self.store,
            &NewUser {
                email: format!("{username}@example.com"),
                username: username.to_string(),
                first_name: username.to_string(),
                password_hash: hash_password(password).expect("hash"),
                is_staff,
            },
        )
        .await
        .expect("create user")
    }

    pub async fn post(&self, author: &User, title: &str) -> Post {
        PostRepository::create(
            &self.store,
            &NewPost {
                category_id: 1,
                title: title.to_string(),
                slug: blog_service::models::slugify(title),
                excerpt: None,
                content: format!("{title} content"),
                author_id: author.id,
                status: PostStatus::Published,
            },
        )
        .await
        .expect("create post")
    }

    pub async fn comment(&self, post: &Post, user: &User, body: &str) -> Comment {
        CommentRepository::create(&self.store, post.id, user.id, Some(body))
            .await
            .expect("create comment")
    }

    pub fn access_token(&self, user: &User) -> String {
        self.state
            .jwt
            .generate_access_token(user.id, &user.username)
            .expect("access token")
    }

    pub fn bearer(&self, user: &User) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.access_token(user)))
    }
}

pub fn principal(user: &User) -> Principal {
    Principal::Authenticated(AuthenticatedUser::from(user))
}
