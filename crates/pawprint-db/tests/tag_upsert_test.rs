//! Integration tests for tag canonicalization, upsert and association.

use std::collections::HashSet;

use pawprint_db::test_fixtures::{unique_tag, TestDatabase};
use pawprint_db::{CreatePostRequest, PostRepository, TagRepository, UpdatePostRequest};

async fn usage_count(test_db: &TestDatabase, name: &str) -> i32 {
    test_db
        .db
        .tags
        .get_by_name(name)
        .await
        .unwrap()
        .map(|t| t.usage_count)
        .unwrap_or_default()
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_spelling_variants_resolve_to_one_tag() {
    let test_db = TestDatabase::new().await;
    let name = unique_tag("cats");
    let input = vec![
        name.to_uppercase(),
        format!("#{}", name),
        format!(" {} ", name.to_uppercase()),
    ];

    let tags = test_db.db.tags.normalize_tags(&input).await.unwrap();

    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, name);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_post_with_duplicate_tags_is_associated_once() {
    let test_db = TestDatabase::new().await;
    let author = test_db.seed_user().await;
    let name = unique_tag("cats");

    let post = test_db
        .db
        .posts
        .create(
            author,
            CreatePostRequest {
                content: "three spellings, one tag".to_string(),
                tags: vec![name.to_uppercase(), format!("#{}", name), format!(" {} ", name)],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(post.tags.len(), 1);
    assert_eq!(post.tags[0].name, name);
    assert_eq!(usage_count(&test_db, &name).await, 1);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_existing_tag_is_reused() {
    let test_db = TestDatabase::new().await;
    let name = unique_tag("dogs");

    let first = test_db.db.tags.normalize_tags(&[name.clone()]).await.unwrap();
    let second = test_db
        .db
        .tags
        .normalize_tags(&[format!("#{}", name.to_uppercase())])
        .await
        .unwrap();

    assert_eq!(first[0].id, second[0].id);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_order_preserved_and_empties_skipped() {
    let test_db = TestDatabase::new().await;
    let a = unique_tag("a");
    let b = unique_tag("b");
    let input = vec![
        b.clone(),
        "   ".to_string(),
        "#".to_string(),
        a.clone(),
        format!("#{}", b),
    ];

    let tags = test_db.db.tags.normalize_tags(&input).await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();

    assert_eq!(names, vec![b.as_str(), a.as_str()]);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_concurrent_creation_yields_single_tag() {
    let test_db = TestDatabase::new().await;
    let name = unique_tag("race");

    let mut handles = Vec::new();
    for i in 0..8 {
        let repo = test_db.db.tags.clone();
        let input = if i % 2 == 0 {
            name.clone()
        } else {
            format!("#{}", name.to_uppercase())
        };
        handles.push(tokio::spawn(async move { repo.normalize_tags(&[input]).await }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let tags = handle.await.unwrap().unwrap();
        assert_eq!(tags.len(), 1);
        ids.insert(tags[0].id);
    }
    assert_eq!(ids.len(), 1, "all callers must see the same tag row");
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_replaces_tag_set_and_usage_counts() {
    let test_db = TestDatabase::new().await;
    let author = test_db.seed_user().await;
    let a = unique_tag("a");
    let b = unique_tag("b");
    let c = unique_tag("c");

    let post = test_db
        .db
        .posts
        .create(
            author,
            CreatePostRequest {
                content: "tagged".to_string(),
                tags: vec![a.clone(), b.clone()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let updated = test_db
        .db
        .posts
        .update(
            author,
            post.id,
            UpdatePostRequest {
                tags: Some(vec![b.clone(), c.clone()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names: HashSet<String> = updated.tags.iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, HashSet::from([b.clone(), c.clone()]));
    assert_eq!(usage_count(&test_db, &a).await, 0);
    assert_eq!(usage_count(&test_db, &b).await, 1);
    assert_eq!(usage_count(&test_db, &c).await, 1);

    let stored = test_db.db.tags.get_for_post(post.id).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_with_empty_tags_clears_association() {
    let test_db = TestDatabase::new().await;
    let author = test_db.seed_user().await;
    let a = unique_tag("a");

    let post = test_db
        .db
        .posts
        .create(
            author,
            CreatePostRequest {
                content: "tagged".to_string(),
                tags: vec![a.clone()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let updated = test_db
        .db
        .posts
        .update(
            author,
            post.id,
            UpdatePostRequest {
                tags: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.tags.is_empty());
    assert_eq!(usage_count(&test_db, &a).await, 0);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_without_tags_leaves_association() {
    let test_db = TestDatabase::new().await;
    let author = test_db.seed_user().await;
    let a = unique_tag("a");

    let post = test_db
        .db
        .posts
        .create(
            author,
            CreatePostRequest {
                content: "tagged".to_string(),
                tags: vec![a.clone()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let updated = test_db
        .db
        .posts
        .update(
            author,
            post.id,
            UpdatePostRequest {
                content: Some("edited".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.content, "edited");
    assert_eq!(updated.tags.len(), 1);
    assert_eq!(usage_count(&test_db, &a).await, 1);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_list_popular_is_ordered_by_usage() {
    let test_db = TestDatabase::new().await;

    let tags = test_db.db.tags.list_popular(50).await.unwrap();

    assert!(tags.len() <= 50);
    for pair in tags.windows(2) {
        assert!(pair[0].usage_count >= pair[1].usage_count);
        if pair[0].usage_count == pair[1].usage_count {
            assert!(pair[0].name < pair[1].name);
        }
    }
    assert!(tags.iter().all(|t| t.usage_count > 0));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_create_after_lost_race_returns_existing_row() {
    let test_db = TestDatabase::new().await;
    let name = unique_tag("race");

    // Another writer lands the row after our lookup missed it.
    let winner = pawprint_db::new_v7();
    sqlx::query("INSERT INTO tag (id, name) VALUES ($1, $2)")
        .bind(winner)
        .bind(&name)
        .execute(&test_db.pool)
        .await
        .unwrap();

    let tag = test_db.db.tags.create_or_reread(&name).await.unwrap();
    assert_eq!(tag.id, winner);
    assert_eq!(tag.name, name);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tag WHERE name = $1")
        .bind(&name)
        .fetch_one(&test_db.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_soft_deleted_post_cannot_be_retagged() {
    let test_db = TestDatabase::new().await;
    let author = test_db.seed_user().await;
    let name = unique_tag("after-delete");
    let post = test_db
        .db
        .posts
        .create(
            author,
            CreatePostRequest {
                content: "gone soon".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    test_db.db.posts.soft_delete(author, post.id).await.unwrap();

    let tags = test_db
        .db
        .tags
        .normalize_tags(&[name.clone()])
        .await
        .unwrap();
    let err = test_db
        .db
        .tags
        .set_for_post(post.id, &tags)
        .await
        .unwrap_err();

    assert!(matches!(err, pawprint_db::Error::PostNotFound(id) if id == post.id));
    assert_eq!(usage_count(&test_db, &name).await, 0);
    assert!(test_db.db.tags.get_for_post(post.id).await.unwrap().is_empty());
}
