use chrono::{Duration, Utc};

use crate::auth::utils::generate_session_token;
use crate::database::commands;
use crate::database::connection::{DbConfig, DbConnection};
use crate::error::{RequestError, SessionError, ValidationError};
use crate::models::listing::Page;
use crate::models::resource::{CreateResource, DateRange, UpdateResource};
use crate::models::session::Session;
use crate::models::user::{RegisterForm, UpdateProfileForm, UserId};

async fn init_and_get_db() -> DbConnection {
    let _ = tracing_subscriber::fmt::try_init();

    let config = DbConfig::in_memory();
    let db = DbConnection::connect(&config).await.unwrap();
    db.init_schema().await.unwrap();
    db
}

fn register_form(username: &str, email: &str) -> RegisterForm {
    RegisterForm {
        username: username.to_string(),
        email: email.to_string(),
        password: "hunter2hunter2".to_string(),
        fullname: None,
    }
}

async fn seed_user(db: &DbConnection, username: &str) -> UserId {
    let email = format!("{username}@example.com");
    db.register_user(&register_form(username, &email))
        .await
        .unwrap()
        .id
}

fn sample_resource(user_id: UserId, title: &str, tags: Option<&str>) -> CreateResource {
    CreateResource {
        title: title.to_string(),
        description: Some("a saved link".to_string()),
        tags: tags.map(str::to_string),
        kind: "Article".to_string(),
        url: format!("https://example.com/{title}"),
        original_filename: None,
        source: "web".to_string(),
        user_id,
    }
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let db = init_and_get_db().await;

    seed_user(&db, "casey").await;
    let err = db
        .register_user(&register_form("casey", "other@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::InvalidInput { value, .. }) if value == "casey"
    ));
}

#[tokio::test]
async fn register_rejects_duplicate_email_case_insensitive() {
    let db = init_and_get_db().await;

    db.register_user(&register_form("casey", "casey@example.com"))
        .await
        .unwrap();
    let err = db
        .register_user(&register_form("morgan", "Casey@Example.COM"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::InvalidInput { reason, .. })
            if reason.contains("email")
    ));
}

#[tokio::test]
async fn register_rejects_malformed_email() {
    let db = init_and_get_db().await;

    let err = db
        .register_user(&register_form("casey", "casey-at-example"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::InvalidInput { .. })
    ));
}

#[tokio::test]
async fn login_opens_session_and_resolves_it() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let session = db.login("casey", "hunter2hunter2").await.unwrap();
    assert_eq!(session.user_id, user_id);

    let resolved = db.resolve_session(&session.token).await.unwrap();
    assert_eq!(resolved.user_id, user_id);
    assert_eq!(resolved.username, "casey");

    db.logout(&session.token).await.unwrap();
    let err = db.resolve_session(&session.token).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionNotFound));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let db = init_and_get_db().await;
    seed_user(&db, "casey").await;

    let err = db.login("casey", "not-the-password").await.unwrap_err();
    assert!(matches!(err, RequestError::BadCredentials));
}

#[tokio::test]
async fn expired_session_is_rejected_and_removed() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let stale = Session {
        token: generate_session_token(),
        user_id,
        username: "casey".to_string(),
        created_at: Utc::now() - Duration::days(30),
        expires_at: Utc::now() - Duration::days(23),
    };
    commands::create_session(db.pool(), &stale).await.unwrap();

    let err = db.resolve_session(&stale.token).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionExpired));

    // the stale row is cleaned up, so a second attempt sees no session
    let err = db.resolve_session(&stale.token).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionNotFound));
}

#[tokio::test]
async fn tag_filter_matches_substring() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    db.add_resource(&sample_resource(user_id, "tutorial", Some("python,web")))
        .await
        .unwrap();
    db.add_resource(&sample_resource(user_id, "boards", Some("micropython,embedded")))
        .await
        .unwrap();
    db.add_resource(&sample_resource(user_id, "book", Some("rust")))
        .await
        .unwrap();

    let found = db.get_resources_by_tag(user_id, "python").await.unwrap();
    let titles: Vec<_> = found.iter().map(|r| r.title.as_str()).collect();
    // substring containment: "micropython" matches too
    assert_eq!(titles, vec!["tutorial", "boards"]);

    assert_eq!(db.count_resources_by_tag(user_id, "python").await.unwrap(), 2);
}

#[tokio::test]
async fn most_common_tags_ranks_by_count_then_first_seen() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    for tags in ["a,b", "a,c", "a,b"] {
        db.add_resource(&sample_resource(user_id, tags, Some(tags)))
            .await
            .unwrap();
    }

    let ranked = db.get_most_common_tags(user_id, 2).await.unwrap();
    assert_eq!(ranked, vec!["a", "b"]);
}

#[tokio::test]
async fn most_common_types_ranks_by_frequency() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    for (title, kind) in [("a", "Video"), ("b", "Article"), ("c", "Video")] {
        let mut resource = sample_resource(user_id, title, None);
        resource.kind = kind.to_string();
        db.add_resource(&resource).await.unwrap();
    }

    let ranked = db.get_most_common_types(user_id, 10).await.unwrap();
    assert_eq!(ranked, vec!["Video", "Article"]);
}

#[tokio::test]
async fn bulk_delete_skips_missing_ids() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let kept = db
        .add_resource(&sample_resource(user_id, "kept", None))
        .await
        .unwrap();

    assert_eq!(db.bulk_delete(&[9999]).await.unwrap(), 0);
    assert_eq!(db.bulk_delete(&[kept.id, 9999]).await.unwrap(), 1);
    assert_eq!(db.bulk_delete(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn bulk_update_sets_flags_on_listed_ids() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let first = db
        .add_resource(&sample_resource(user_id, "first", None))
        .await
        .unwrap();
    let second = db
        .add_resource(&sample_resource(user_id, "second", None))
        .await
        .unwrap();

    let affected = db
        .bulk_update(&[first.id, second.id, 777], Some(true), Some(true))
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let starred = db.get_starred_resources(user_id).await.unwrap();
    assert_eq!(starred.len(), 2);
    assert!(db.get_unread_resources(user_id).await.unwrap().is_empty());

    // no flags requested means nothing to do
    assert_eq!(db.bulk_update(&[first.id], None, None).await.unwrap(), 0);
}

#[tokio::test]
async fn pagination_returns_the_remainder_page() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    for i in 0..15 {
        db.add_resource(&sample_resource(user_id, &format!("r{i}"), None))
            .await
            .unwrap();
    }

    let page_one = db
        .get_resources_paginated(user_id, Page { number: 1, size: 10 })
        .await
        .unwrap();
    assert_eq!(page_one.len(), 10);

    let page_two = db
        .get_resources_paginated(user_id, Page { number: 2, size: 10 })
        .await
        .unwrap();
    assert_eq!(page_two.len(), 5);

    let page_three = db
        .get_resources_paginated(user_id, Page { number: 3, size: 10 })
        .await
        .unwrap();
    assert!(page_three.is_empty());
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let resource = db
        .add_resource(&sample_resource(user_id, "unread", None))
        .await
        .unwrap();
    assert!(!resource.read_status);

    let once = db.mark_read(resource.id).await.unwrap();
    assert!(once.read_status);
    let twice = db.mark_read(resource.id).await.unwrap();
    assert!(twice.read_status);

    assert_eq!(db.count_unread_resources_by_user(user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn toggle_star_flips_both_ways() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let resource = db
        .add_resource(&sample_resource(user_id, "star-me", None))
        .await
        .unwrap();

    assert!(db.toggle_star(resource.id).await.unwrap().starred);
    assert!(!db.toggle_star(resource.id).await.unwrap().starred);

    let err = db.toggle_star(9999).await.unwrap_err();
    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::NotFound)
    ));
}

#[tokio::test]
async fn add_resource_requires_existing_owner() {
    let db = init_and_get_db().await;

    let err = db
        .add_resource(&sample_resource(42, "orphan", None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::InvalidInput { reason, .. })
            if reason.contains("user")
    ));
}

#[tokio::test]
async fn add_resource_rejects_duplicate_original_filename() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let mut upload = sample_resource(user_id, "notes", None);
    upload.original_filename = Some("notes.pdf".to_string());
    db.add_resource(&upload).await.unwrap();

    let mut duplicate = sample_resource(user_id, "notes again", None);
    duplicate.original_filename = Some("notes.pdf".to_string());
    let err = db.add_resource(&duplicate).await.unwrap_err();

    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::AlreadyExists)
    ));
}

#[tokio::test]
async fn edit_resource_detects_no_change() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let resource = db
        .add_resource(&sample_resource(user_id, "editable", Some("rust")))
        .await
        .unwrap();

    // resubmitting the stored values counts as no change
    let unchanged = UpdateResource {
        title: Some("editable".to_string()),
        tags: Some("rust".to_string()),
        ..Default::default()
    };
    let (_, changed) = db
        .edit_resource(resource.id, user_id, &unchanged)
        .await
        .unwrap();
    assert!(!changed);

    let retitle = UpdateResource {
        title: Some("renamed".to_string()),
        ..Default::default()
    };
    let (updated, changed) = db
        .edit_resource(resource.id, user_id, &retitle)
        .await
        .unwrap();
    assert!(changed);
    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.tags.as_deref(), Some("rust"));
}

#[tokio::test]
async fn edit_resource_enforces_ownership() {
    let db = init_and_get_db().await;
    let owner = seed_user(&db, "owner").await;
    let intruder = seed_user(&db, "intruder").await;

    let resource = db
        .add_resource(&sample_resource(owner, "private", None))
        .await
        .unwrap();

    let retitle = UpdateResource {
        title: Some("stolen".to_string()),
        ..Default::default()
    };
    let err = db
        .edit_resource(resource.id, intruder, &retitle)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::NotFound)
    ));
}

#[tokio::test]
async fn remove_missing_resource_is_not_found() {
    let db = init_and_get_db().await;
    seed_user(&db, "casey").await;

    let err = db.remove_resource(555).await.unwrap_err();
    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::NotFound)
    ));
}

#[tokio::test]
async fn search_matches_title_or_description_case_sensitively() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let mut with_description = sample_resource(user_id, "plain title", None);
    with_description.description = Some("all about Tokio runtimes".to_string());
    db.add_resource(&with_description).await.unwrap();
    db.add_resource(&sample_resource(user_id, "Tokio by example", None))
        .await
        .unwrap();

    let hits = db.search_resources(user_id, "Tokio").await.unwrap();
    assert_eq!(hits.len(), 2);

    // lowercase query does not match the capitalized text
    let misses = db.search_resources(user_id, "tokio").await.unwrap();
    assert!(misses.is_empty());
}

#[tokio::test]
async fn date_range_filter_is_inclusive() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    db.add_resource(&sample_resource(user_id, "now-ish", None))
        .await
        .unwrap();

    let surrounding = DateRange {
        start: Utc::now() - Duration::days(1),
        end: Utc::now() + Duration::days(1),
    };
    assert_eq!(
        db.get_resources_by_date_range(user_id, &surrounding)
            .await
            .unwrap()
            .len(),
        1
    );

    let future = DateRange {
        start: Utc::now() + Duration::days(1),
        end: Utc::now() + Duration::days(2),
    };
    assert!(db
        .get_resources_by_date_range(user_id, &future)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn counts_and_distinct_labels() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let mut video = sample_resource(user_id, "talk", Some("rust, async"));
    video.kind = "Video".to_string();
    video.source = "youtube".to_string();
    db.add_resource(&video).await.unwrap();
    db.add_resource(&sample_resource(user_id, "post", Some("rust,web")))
        .await
        .unwrap();

    assert_eq!(db.count_resources_by_user(user_id).await.unwrap(), 2);
    assert_eq!(db.count_resources_by_type(user_id, "Video").await.unwrap(), 1);
    assert_eq!(db.count_resources_by_source(user_id, "web").await.unwrap(), 1);

    let tags = db.get_distinct_tags_by_user(user_id).await.unwrap();
    assert_eq!(tags, vec!["rust", "async", "web"]);

    let types = db.get_distinct_types_by_user(user_id).await.unwrap();
    assert_eq!(types, vec!["Article", "Video"]);

    let sources = db.get_distinct_sources_by_user(user_id).await.unwrap();
    assert_eq!(sources, vec!["web", "youtube"]);
}

#[tokio::test]
async fn recent_resources_come_newest_first() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    for i in 0..5 {
        db.add_resource(&sample_resource(user_id, &format!("r{i}"), None))
            .await
            .unwrap();
    }

    let recent = db.get_recent_resources(user_id, 3).await.unwrap();
    assert_eq!(recent.len(), 3);
    for pair in recent.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn remove_user_cascades_resources_and_sessions() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    db.add_resource(&sample_resource(user_id, "doomed", None))
        .await
        .unwrap();
    let session = db.login("casey", "hunter2hunter2").await.unwrap();

    db.remove_user(user_id).await.unwrap();

    assert!(db.get_user_by_id(user_id).await.unwrap().is_none());
    assert!(db.get_resources_by_user(user_id).await.unwrap().is_empty());
    let err = db.resolve_session(&session.token).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionNotFound));

    let err = db.remove_user(user_id).await.unwrap_err();
    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::NotFound)
    ));
}

#[tokio::test]
async fn update_profile_rejects_taken_username() {
    let db = init_and_get_db().await;
    seed_user(&db, "casey").await;
    let morgan = seed_user(&db, "morgan").await;

    let takeover = UpdateProfileForm {
        username: Some("casey".to_string()),
        ..Default::default()
    };
    let err = db.update_profile(morgan, &takeover).await.unwrap_err();
    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::InvalidInput { value, .. }) if value == "casey"
    ));

    // keeping your own username is fine
    let keep = UpdateProfileForm {
        username: Some("morgan".to_string()),
        fullname: Some("Morgan Doe".to_string()),
        ..Default::default()
    };
    let updated = db.update_profile(morgan, &keep).await.unwrap();
    assert_eq!(updated.fullname.as_deref(), Some("Morgan Doe"));
}

#[tokio::test]
async fn reset_password_by_email_replaces_the_old_one() {
    let db = init_and_get_db().await;
    seed_user(&db, "casey").await;

    let err = db
        .reset_password("nobody@example.com", "fresh-password-1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RequestError::Validation(ValidationError::NotFound)
    ));

    // the email column is NOCASE, so any casing reaches the account
    db.reset_password("Casey@Example.com", "fresh-password-1")
        .await
        .unwrap();

    assert!(db.login("casey", "hunter2hunter2").await.is_err());
    db.login("casey", "fresh-password-1").await.unwrap();
}

#[tokio::test]
async fn change_password_requires_current_one() {
    let db = init_and_get_db().await;
    let user_id = seed_user(&db, "casey").await;

    let err = db
        .change_password(user_id, "wrong-password", "new-password-123")
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::BadCredentials));

    db.change_password(user_id, "hunter2hunter2", "new-password-123")
        .await
        .unwrap();

    assert!(db.login("casey", "hunter2hunter2").await.is_err());
    db.login("casey", "new-password-123").await.unwrap();
}
