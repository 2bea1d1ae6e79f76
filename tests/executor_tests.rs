//! Query Executor Tests
//!
//! End-to-end tests running query text through parsing, root call
//! dispatch and child selection.

mod common;

use std::sync::Arc;

use common::{test_executor, test_schema};
use nodeql::{DbError, EngineConfig, MemoryStore, QueryExecutor, SchemaCatalog};
use serde_json::json;

fn create_user(executor: &QueryExecutor, handle: &str) -> String {
    let query = r#"create(type: User, data: \{"handle": "HANDLE"\}) { id }"#.replace("HANDLE", handle);
    let result = executor.execute(&query).unwrap();
    result["create"]["id"].as_str().unwrap().to_string()
}

fn create_post(executor: &QueryExecutor, author: &str, text: &str) -> String {
    let query = r#"create(type: Micropost, data: \{"text": "TEXT"\, "createdAt": "2014-05-18T18:00:00Z"\, "author": "AUTHOR"\}) { id }"#
        .replace("TEXT", text)
        .replace("AUTHOR", author);
    let result = executor.execute(&query).unwrap();
    result["create"]["id"].as_str().unwrap().to_string()
}

#[test]
fn test_create_returns_selected_fields() {
    let executor = test_executor();
    let result = executor
        .execute(
            r#"create(type: Micropost, data: \{"text": "foo"\, "createdAt": "2014-05-18T18:00:00Z"\, "author": "1234"\}) {
                text,
                createdAt,
                author
            }"#,
        )
        .unwrap();

    assert_eq!(
        result,
        json!({
            "create": {
                "text": "foo",
                "createdAt": "2014-05-18T18:00:00Z",
                "author": "1234",
            }
        })
    );
}

#[test]
fn test_node_resolves_one_connection() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");
    let post = create_post(&executor, &user, "hello");

    let query = format!(
        "node(type: Micropost, id: {}) {{ text, createdAt, author {{ handle }} }}",
        post
    );
    let result = executor.execute(&query).unwrap();
    assert_eq!(
        result,
        json!({
            "node": {
                "text": "hello",
                "createdAt": "2014-05-18T18:00:00Z",
                "author": {"handle": "alice"},
            }
        })
    );

    // A leaf selection of a connection yields the stored id
    let query = format!("node(type: Micropost, id: {}) {{ author }}", post);
    let result = executor.execute(&query).unwrap();
    assert_eq!(result["node"]["author"], json!(user));
}

#[test]
fn test_node_resolves_many_connection() {
    let executor = test_executor();
    let alice = create_user(&executor, "alice");
    let bob = create_user(&executor, "bob");
    create_post(&executor, &alice, "first");
    create_post(&executor, &bob, "other");
    create_post(&executor, &alice, "second");

    let query = format!(
        "node(type: User, id: {}) {{ handle, microposts {{ count, nodes {{ text }} }} }}",
        alice
    );
    let result = executor.execute(&query).unwrap();
    assert_eq!(
        result,
        json!({
            "node": {
                "handle": "alice",
                "microposts": {
                    "count": 2,
                    "nodes": [{"text": "first"}, {"text": "second"}],
                },
            }
        })
    );

    let query = format!(
        "node(type: User, id: {}) {{ microposts(first: 1) as posts {{ count, nodes {{ text }} }} }}",
        alice
    );
    let result = executor.execute(&query).unwrap();
    assert_eq!(
        result["node"]["posts"],
        json!({"count": 2, "nodes": [{"text": "first"}]})
    );
}

#[test]
fn test_nodes_pagination() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");
    let ids: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|text| create_post(&executor, &user, text))
        .collect();

    let result = executor
        .execute("nodes(type: Micropost, first: 2) { count, nodes { text } }")
        .unwrap();
    assert_eq!(
        result["nodes"],
        json!({"count": 3, "nodes": [{"text": "a"}, {"text": "b"}]})
    );

    let query = format!(
        "nodes(type: Micropost, first: 2, after: {}) {{ nodes {{ id, text }} }}",
        ids[0]
    );
    let result = executor.execute(&query).unwrap();
    assert_eq!(
        result["nodes"]["nodes"],
        json!([{"id": ids[1], "text": "b"}, {"id": ids[2], "text": "c"}])
    );

    let err = executor
        .execute("nodes(type: Micropost, after: missing) { count }")
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidParameter { ref parameter, .. } if parameter == "after"));
}

#[test]
fn test_configured_page_size() {
    let config = EngineConfig {
        default_page_size: 1,
        max_page_size: 2,
        ..EngineConfig::default()
    };
    let executor = QueryExecutor::with_config(
        SchemaCatalog::from_schema(test_schema()),
        Arc::new(MemoryStore::new()),
        &config,
    );
    let user = create_user(&executor, "alice");
    for text in ["a", "b", "c"] {
        create_post(&executor, &user, text);
    }

    let result = executor
        .execute("nodes(type: Micropost) { nodes { text } }")
        .unwrap();
    assert_eq!(result["nodes"]["nodes"].as_array().unwrap().len(), 1);

    let result = executor
        .execute("nodes(type: Micropost, first: 50) { nodes { text } }")
        .unwrap();
    assert_eq!(result["nodes"]["nodes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_aliases_rename_output() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");

    let result = executor
        .execute("nodes(type: Micropost) as frobar { count }")
        .unwrap();
    assert_eq!(result, json!({"frobar": {"count": 0}}));

    let query = format!("node(type: User, id: {}) {{ handle as name, id }}", user);
    let result = executor.execute(&query).unwrap();
    assert_eq!(result, json!({"node": {"name": "alice", "id": user}}));
}

#[test]
fn test_schema_query() {
    let executor = test_executor();
    let result = executor
        .execute("schema() { types { name, isNode } }")
        .unwrap();
    assert_eq!(
        result,
        json!({
            "schema": {
                "types": [
                    {"name": "edges", "isNode": false},
                    {"name": "User", "isNode": true},
                    {"name": "Micropost", "isNode": true},
                ]
            }
        })
    );
}

#[test]
fn test_schema_mutations_through_queries() {
    let executor = QueryExecutor::in_memory();

    let result = executor
        .execute("createType(name: Author) { success, type { name } }")
        .unwrap();
    assert_eq!(
        result,
        json!({"createType": {"success": true, "type": {"name": "Author"}}})
    );

    executor
        .execute("createType(name: Book) { success }")
        .unwrap();
    executor
        .execute("createField(type: Book, fieldName: title, fieldType: string, required: true) { success }")
        .unwrap();
    executor
        .execute("createField(type: Book, fieldName: pages, fieldType: int, default: 100) { success }")
        .unwrap();
    executor
        .execute(
            "createConnection(type: Book, fieldName: writer, targetType: Author, targetFieldName: books) { success }",
        )
        .unwrap();
    executor
        .execute(r#"createIndex(type: Book, name: byTitle, fields: \["title"\]) { success }"#)
        .unwrap();

    let result = executor
        .execute(r#"create(type: Book, data: \{"title": "Dune"\}) { title, pages, writer }"#)
        .unwrap();
    assert_eq!(
        result["create"],
        json!({"title": "Dune", "pages": 100, "writer": null})
    );

    let result = executor
        .execute("type(name: Book) { fields { name, type } }")
        .unwrap();
    let names: Vec<&str> = result["type"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["id", "title", "pages", "writer"]);
}

#[test]
fn test_update_and_delete_through_queries() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");

    let query = format!(
        r#"update(type: User, id: {}, data: \{{"handle": "alicia"\}}) {{ handle }}"#,
        user
    );
    let result = executor.execute(&query).unwrap();
    assert_eq!(result, json!({"update": {"handle": "alicia"}}));

    let query = format!("delete(type: User, id: {}) {{ id }}", user);
    let result = executor.execute(&query).unwrap();
    assert_eq!(result, json!({"delete": {"id": user}}));

    let query = format!("node(type: User, id: {}) {{ id }}", user);
    let err = executor.execute(&query).unwrap_err();
    assert!(matches!(err, DbError::RecordNotFound { .. }));
}

#[test]
fn test_selection_errors() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");

    let query = format!("node(type: User, id: {}) {{ nickname }}", user);
    let err = executor.execute(&query).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Type \"User\" does not have a field \"nickname\""
    );

    let query = format!("node(type: User, id: {}) {{ handle {{ length }} }}", user);
    let err = executor.execute(&query).unwrap_err();
    assert!(matches!(err, DbError::FieldIsNotConnection { .. }));

    let query = format!("node(type: User, id: {}) {{ microposts(last: 3) {{ count }} }}", user);
    let err = executor.execute(&query).unwrap_err();
    assert!(matches!(err, DbError::InvalidParameter { .. }));
}

#[test]
fn test_rejected_queries() {
    let executor = test_executor();

    let err = executor.execute("frobnicate() { id }").unwrap_err();
    assert!(matches!(err, DbError::UnknownRootCall(_)));

    let err = executor.execute("nodes(type: User) { }").unwrap_err();
    assert_eq!(err.kind(), "SyntaxError");

    let err = executor
        .execute("nodes(type: FooBar) { count }")
        .unwrap_err();
    assert_eq!(err.to_string(), "Type \"FooBar\" does not exist");

    let err = executor
        .execute("createType(name: User, color: red) { success }")
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidParameter { .. }));
}

#[test]
fn test_type_description_projection() {
    let executor = test_executor();
    let result = executor
        .execute("type(name: User) { name, indexes { name, builtIn } }")
        .unwrap();
    assert_eq!(
        result["type"],
        json!({"name": "User", "indexes": [{"name": "id", "builtIn": true}]})
    );
}

#[test]
fn test_deleted_field_values_do_not_survive() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");
    let post = create_post(&executor, &user, "hello");

    executor
        .execute("createField(type: Micropost, fieldName: note, fieldType: string) { success }")
        .unwrap();
    let query = format!(
        r#"update(type: Micropost, id: {}, data: \{{"note": "hi"\}}) {{ note }}"#,
        post
    );
    executor.execute(&query).unwrap();

    executor
        .execute("deleteField(type: Micropost, fieldName: note) { success }")
        .unwrap();
    let result = executor
        .execute("nodes(type: Micropost) { nodes }")
        .unwrap();
    assert!(result["nodes"]["nodes"][0].get("note").is_none());

    // Re-created with another kind, the field starts out empty
    executor
        .execute("createField(type: Micropost, fieldName: note, fieldType: int) { success }")
        .unwrap();
    let query = format!("node(type: Micropost, id: {}) {{ note }}", post);
    let result = executor.execute(&query).unwrap();
    assert_eq!(result, json!({"node": {"note": null}}));
}

#[test]
fn test_recreated_connection_starts_empty() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");
    let post = create_post(&executor, &user, "hello");

    // Deleting from the many side strips the stored one side
    executor
        .execute("deleteConnection(type: User, fieldName: microposts) { success }")
        .unwrap();
    executor
        .execute(
            "createConnection(type: Micropost, fieldName: author, targetType: User, targetFieldName: posts) { success }",
        )
        .unwrap();

    let query = format!("node(type: User, id: {}) {{ posts {{ count }} }}", user);
    let result = executor.execute(&query).unwrap();
    assert_eq!(result, json!({"node": {"posts": {"count": 0}}}));

    let query = format!("node(type: Micropost, id: {}) {{ author }}", post);
    let result = executor.execute(&query).unwrap();
    assert_eq!(result, json!({"node": {"author": null}}));
}

#[test]
fn test_deleted_type_references_are_stripped() {
    let executor = test_executor();
    let user = create_user(&executor, "alice");
    let post = create_post(&executor, &user, "hello");

    executor.execute("deleteType(name: User) { success }").unwrap();

    let result = executor
        .execute("nodes(type: Micropost) { nodes }")
        .unwrap();
    assert_eq!(
        result["nodes"]["nodes"],
        json!([{"id": post, "text": "hello", "createdAt": "2014-05-18T18:00:00Z"}])
    );
}
