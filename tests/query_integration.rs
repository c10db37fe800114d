//! End-to-end: schema and seed scripts applied to SQLite, then queried
//! through the model client with eager loading.

mod common;

use std::sync::Arc;

use common::SqliteExecutor;
use pretty_assertions::assert_eq;
use quarry::migrate::ast::build::*;
use quarry::migrate::ast::Node;
use quarry::migrate::{apply_script, generate_schema, generate_seeds};
use quarry::prelude::*;
use quarry::query::Association;

fn t(method: &str, args: Vec<Node>) -> Node {
    send(ident("t"), method, args)
}

fn schema() -> Vec<MigrationSource> {
    vec![
        MigrationSource::new(
            "001",
            vec![call_with_block(
                "create_table",
                vec![sym("users")],
                "t",
                vec![
                    t("string", vec![sym("name"), hash([("null", bool(false))])]),
                    t("boolean", vec![sym("active"), hash([("default", bool(true))])]),
                    t("timestamps", vec![]),
                ],
            )],
        ),
        MigrationSource::new(
            "002",
            vec![call_with_block(
                "create_table",
                vec![sym("posts")],
                "t",
                vec![
                    t("references", vec![sym("user"), hash([("foreign_key", bool(true))])]),
                    t("string", vec![sym("title")]),
                    t("timestamps", vec![]),
                ],
            )],
        ),
        MigrationSource::new(
            "003",
            vec![call_with_block(
                "create_table",
                vec![sym("comments")],
                "t",
                vec![
                    t("references", vec![sym("post")]),
                    t("text", vec![sym("body")]),
                ],
            )],
        ),
    ]
}

fn seeds() -> Vec<Node> {
    let user = |name: &str, active: bool| {
        send(konst("User"), "create!", vec![hash([("name", str(name)), ("active", bool(active))])])
    };
    let post = |user_id: i64, title: &str| {
        send(konst("Post"), "create!", vec![hash([("user_id", int(user_id)), ("title", str(title))])])
    };
    vec![
        Node::If {
            condition: Box::new(send(konst("User"), "exists?", vec![])),
            then: vec![Node::Return { value: None }],
        },
        user("ada", true),
        user("grace", true),
        user("idle", false),
        post(1, "engines"),
        post(1, "notes"),
        post(2, "compilers"),
    ]
}

fn registry() -> Arc<ModelRegistry> {
    let registry = ModelRegistry::builder()
        .register(
            "User",
            ModelMeta::new("users").has_many("posts", "Post", "user_id"),
        )
        .register(
            "Post",
            ModelMeta::new("posts")
                .belongs_to("author", "User", "user_id")
                .has_many("comments", "Comment", "post_id"),
        )
        .register(
            "Comment",
            ModelMeta::new("comments").belongs_to("post", "Post", "post_id"),
        )
        .build()
        .unwrap();
    Arc::new(registry)
}

async fn seeded_client() -> Client<SqliteExecutor> {
    let db = SqliteExecutor::open();
    let options = GeneratorOptions::new(Dialect::SQLite);
    let schema = generate_schema(&schema(), &options).into_strict().unwrap();
    let seeds = generate_seeds(&seeds(), &options).into_strict().unwrap();
    apply_script(&db, &schema).await.unwrap();
    apply_script(&db, &seeds).await.unwrap();
    Client::new(db, registry(), Dialect::SQLite)
}

#[tokio::test]
async fn test_has_many_against_sqlite() {
    let client = seeded_client().await;
    let users = client.model("User").unwrap();

    let rel = Relation::new()
        .r#where([("active", true)])
        .order("id")
        .includes(["posts"]);
    let records = users.find_many(&rel).await.unwrap();

    let titles: Vec<Vec<&str>> = records
        .iter()
        .map(|u| {
            u.association("posts")
                .and_then(Association::as_many)
                .unwrap()
                .iter()
                .filter_map(|p| p.get_str("title"))
                .collect()
        })
        .collect();
    assert_eq!(titles, vec![vec!["engines", "notes"], vec!["compilers"]]);
}

#[tokio::test]
async fn test_nested_and_belongs_to() {
    let client = seeded_client().await;
    client
        .model("Comment")
        .unwrap()
        .create([("post_id", Value::Int(3)), ("body", Value::from("nice"))])
        .await
        .unwrap();

    let posts = client.model("Post").unwrap();
    let rel = Relation::new()
        .order("id")
        .includes([IncludeSpec::from("author"), IncludeSpec::from("comments")]);
    let records = posts.find_many(&rel).await.unwrap();
    assert_eq!(records.len(), 3);

    let authors: Vec<&str> = records
        .iter()
        .map(|p| p.association("author").and_then(Association::as_one).unwrap().get_str("name").unwrap())
        .collect();
    assert_eq!(authors, vec!["ada", "ada", "grace"]);

    let comment_counts: Vec<usize> = records
        .iter()
        .map(|p| p.association("comments").and_then(Association::as_many).unwrap().len())
        .collect();
    assert_eq!(comment_counts, vec![0, 0, 1]);

    // Users -> posts -> comments, two levels deep.
    let users = client.model("User").unwrap();
    let rel = Relation::new()
        .r#where([("name", "grace")])
        .includes([IncludeSpec::from(("posts", ["comments"]))]);
    let grace = users.first(&rel).await.unwrap().unwrap();
    let posts = grace.association("posts").and_then(Association::as_many).unwrap();
    let comments = posts[0].association("comments").and_then(Association::as_many).unwrap();
    assert_eq!(comments[0].get_str("body"), Some("nice"));
}

#[tokio::test]
async fn test_count_find_and_not() {
    let client = seeded_client().await;
    let users = client.model("User").unwrap();

    assert_eq!(users.count(&Relation::new()).await.unwrap(), 3);
    assert_eq!(
        users
            .count(&Relation::new().not([("active", true)]))
            .await
            .unwrap(),
        1
    );

    let grace = users.find(2).await.unwrap();
    assert_eq!(grace.get_str("name"), Some("grace"));

    let err = users.find(99).await.unwrap_err();
    assert!(err.is_not_found());

    let either = Relation::new()
        .r#where([("name", "ada")])
        .or([("name", "idle")]);
    assert_eq!(users.count(&either).await.unwrap(), 2);
}

#[tokio::test]
async fn test_seeds_do_not_duplicate_on_rerun() {
    let db = SqliteExecutor::open();
    let options = GeneratorOptions::new(Dialect::SQLite);
    let schema = generate_schema(&schema(), &options).script;
    let seeds = generate_seeds(&seeds(), &options).script;
    for _ in 0..3 {
        apply_script(&db, &schema).await.unwrap();
        apply_script(&db, &seeds).await.unwrap();
    }
    assert_eq!(db.count("users"), 3);
    assert_eq!(db.count("posts"), 3);
}
