//! Permission scenarios driven through the service layer
//!
//! Each test pins one row of the permission table: who may do what to whose
//! resource, and which error a denial produces.

mod common;

use blog_service::authz::{Principal, EDIT_RESTRICTED, NOT_AUTHENTICATED, PERMISSION_DENIED};
use blog_service::models::{CategoryRequest, CommentRequest, PostRequest, UserUpdateRequest};
use blog_service::pagination::Page;
use blog_service::services::{CategoryService, CommentService, PostService, UserService};
use blog_service::AppError;
use common::{principal, TestContext};

const FIRST_PAGE: Page = Page { number: 1, size: 10 };

fn assert_forbidden(err: AppError, expected: &str) {
    match err {
        AppError::Authorization(message) => assert_eq!(message, expected),
        other => panic!("expected 403, got {other:?}"),
    }
}

fn assert_unauthenticated(err: AppError) {
    match err {
        AppError::Authentication(message) => assert_eq!(message, NOT_AUTHENTICATED),
        other => panic!("expected 401, got {other:?}"),
    }
}

fn title(value: &str) -> PostRequest {
    PostRequest {
        title: Some(value.to_string()),
        ..Default::default()
    }
}

#[actix_web::test]
async fn author_edits_own_post_but_not_others() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let bob = ctx.user("bob", "password-bob", false).await;
    let post = ctx.post(&ann, "Ann's first post").await;
    let service = PostService::new(&ctx.state);

    let updated = service
        .update(&principal(&ann), post.id, title("Renamed"), true)
        .await
        .expect("author may edit");
    assert_eq!(updated.post.title, "Renamed");
    assert_eq!(updated.post.slug, "renamed");

    let err = service
        .update(&principal(&bob), post.id, title("Hijacked"), true)
        .await
        .unwrap_err();
    assert_forbidden(err, EDIT_RESTRICTED);

    let err = service.delete(&principal(&bob), post.id).await.unwrap_err();
    assert_forbidden(err, EDIT_RESTRICTED);
    assert_eq!(ctx.store.post_count(), 1);
}

#[actix_web::test]
async fn administrator_gets_no_write_access_to_others_posts() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let admin = ctx.user("admin", "password-admin", true).await;
    let post = ctx.post(&ann, "Owned by Ann").await;

    let err = PostService::new(&ctx.state)
        .delete(&principal(&admin), post.id)
        .await
        .unwrap_err();
    assert_forbidden(err, EDIT_RESTRICTED);
}

#[actix_web::test]
async fn anyone_reads_a_post_but_anonymous_cannot_write() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let post = ctx.post(&ann, "Public reading").await;
    ctx.comment(&post, &ann, "first!").await;
    let service = PostService::new(&ctx.state);

    let detail = service
        .get(&Principal::Anonymous, post.id)
        .await
        .expect("public read");
    assert_eq!(detail.comment.len(), 1);

    let err = service
        .create(&Principal::Anonymous, title("Drive-by"))
        .await
        .unwrap_err();
    assert_unauthenticated(err);

    let err = service
        .update(&Principal::Anonymous, post.id, title("Drive-by"), true)
        .await
        .unwrap_err();
    assert_unauthenticated(err);
}

#[actix_web::test]
async fn missing_post_is_not_found_before_ownership_is_checked() {
    let ctx = TestContext::new();
    let bob = ctx.user("bob", "password-bob", false).await;

    let err = PostService::new(&ctx.state)
        .delete(&principal(&bob), 9_999)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_web::test]
async fn post_listing_is_for_administrators() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let admin = ctx.user("admin", "password-admin", true).await;
    ctx.post(&ann, "One").await;
    ctx.post(&ann, "Two").await;
    let service = PostService::new(&ctx.state);

    let err = service
        .list(&principal(&ann), FIRST_PAGE, "/api/v1/posts")
        .await
        .unwrap_err();
    assert_forbidden(err, PERMISSION_DENIED);

    let page = service
        .list(&principal(&admin), FIRST_PAGE, "/api/v1/posts")
        .await
        .expect("admin lists posts");
    assert_eq!(page.count, 2);
}

#[actix_web::test]
async fn created_post_belongs_to_the_caller() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;

    let detail = PostService::new(&ctx.state)
        .create(
            &principal(&ann),
            PostRequest {
                title: Some("Hello World".into()),
                content: Some("Body".into()),
                ..Default::default()
            },
        )
        .await
        .expect("create");

    assert_eq!(detail.post.author_id, ann.id);
    assert_eq!(detail.post.category_id, 1);
    assert_eq!(detail.post.slug, "hello-world");
}

#[actix_web::test]
async fn comments_need_an_account_and_edits_need_the_commenter() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let bob = ctx.user("bob", "password-bob", false).await;
    let post = ctx.post(&ann, "Discuss").await;
    let service = CommentService::new(&ctx.state);

    let err = service
        .create(&Principal::Anonymous, post.id, CommentRequest::default())
        .await
        .unwrap_err();
    assert_unauthenticated(err);

    let comment = service
        .create(
            &principal(&bob),
            post.id,
            CommentRequest {
                comment: Some("Nice".into()),
            },
        )
        .await
        .expect("bob comments");
    assert_eq!(comment.user_id, bob.id);
    assert_eq!(comment.post_id, post.id);

    // the post's author does not own the comment
    let err = service
        .update(
            &principal(&ann),
            post.id,
            comment.id,
            CommentRequest {
                comment: Some("Edited by ann".into()),
            },
            false,
        )
        .await
        .unwrap_err();
    assert_forbidden(err, EDIT_RESTRICTED);

    let edited = service
        .update(
            &principal(&bob),
            post.id,
            comment.id,
            CommentRequest {
                comment: Some("Very nice".into()),
            },
            false,
        )
        .await
        .expect("commenter edits");
    assert_eq!(edited.comment.as_deref(), Some("Very nice"));
    assert!(edited.updated_at >= comment.updated_at);
}

#[actix_web::test]
async fn comment_lookup_is_scoped_to_its_post() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let first = ctx.post(&ann, "First").await;
    let second = ctx.post(&ann, "Second").await;
    let comment = ctx.comment(&first, &ann, "on first").await;

    let err = CommentService::new(&ctx.state)
        .get(&principal(&ann), second.id, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_web::test]
async fn categories_are_administrator_only() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let admin = ctx.user("admin", "password-admin", true).await;
    let service = CategoryService::new(&ctx.state);
    let rust = CategoryRequest {
        name: Some("rust".into()),
    };

    let err = service.create(&principal(&ann), rust).await.unwrap_err();
    assert_forbidden(err, PERMISSION_DENIED);

    let err = service.get(&Principal::Anonymous, 1).await.unwrap_err();
    assert_unauthenticated(err);

    let created = service
        .create(
            &principal(&admin),
            CategoryRequest {
                name: Some("rust".into()),
            },
        )
        .await
        .expect("admin creates category");
    assert_eq!(created.name, "rust");
}

#[actix_web::test]
async fn category_in_use_cannot_be_deleted() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let admin = ctx.user("admin", "password-admin", true).await;
    ctx.post(&ann, "Filed under default").await;

    let err = CategoryService::new(&ctx.state)
        .delete(&principal(&admin), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[actix_web::test]
async fn accounts_are_reachable_only_by_their_owner() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let bob = ctx.user("bob", "password-bob", false).await;
    let admin = ctx.user("admin", "password-admin", true).await;
    let service = UserService::new(&ctx.state);

    let profile = service.get(&principal(&ann), ann.id).await.expect("own profile");
    assert_eq!(profile.username, "ann");

    let err = service.get(&principal(&bob), ann.id).await.unwrap_err();
    assert_forbidden(err, PERMISSION_DENIED);

    // no administrator escape hatch on accounts
    let err = service.delete(&principal(&admin), ann.id).await.unwrap_err();
    assert_forbidden(err, PERMISSION_DENIED);

    let err = service.get(&Principal::Anonymous, ann.id).await.unwrap_err();
    assert_unauthenticated(err);
}

#[actix_web::test]
async fn full_profile_update_requires_identity_fields() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let service = UserService::new(&ctx.state);

    let err = service
        .update(
            &principal(&ann),
            ann.id,
            UserUpdateRequest {
                about: Some("hi".into()),
                ..Default::default()
            },
            false,
        )
        .await
        .unwrap_err();
    assert_eq!(err.message(), "first_name: This field is required.");

    let patched = service
        .update(
            &principal(&ann),
            ann.id,
            UserUpdateRequest {
                about: Some("hi".into()),
                ..Default::default()
            },
            true,
        )
        .await
        .expect("partial update");
    assert_eq!(patched.about.as_deref(), Some("hi"));
}

#[actix_web::test]
async fn deleting_an_account_removes_its_posts_and_comments() {
    let ctx = TestContext::new();
    let ann = ctx.user("ann", "password-ann", false).await;
    let bob = ctx.user("bob", "password-bob", false).await;
    let post = ctx.post(&ann, "Soon gone").await;
    ctx.comment(&post, &bob, "bye").await;

    UserService::new(&ctx.state)
        .delete(&principal(&ann), ann.id)
        .await
        .expect("owner deletes account");

    assert!(ctx.store.user(ann.id).is_none());
    assert_eq!(ctx.store.post_count(), 0);
    assert_eq!(ctx.store.comment_count(), 0);
}
