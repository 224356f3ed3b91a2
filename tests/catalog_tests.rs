mod common;

use axum::http::StatusCode;
use serde_json::json;
use yamdb::domain::Role;

use common::spawn_app;

async fn seed_taxonomy(app: &common::TestApp, admin: &str) {
    for (name, slug) in [("Movie", "movie"), ("Series", "series"), ("Music", "music")] {
        let (status, _) = app
            .post(
                "/api/v1/categories",
                Some(admin),
                json!({ "name": name, "slug": slug }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for (name, slug) in [("Sci-Fi", "sci-fi"), ("Action", "action"), ("Drama", "drama")] {
        let (status, _) = app
            .post(
                "/api/v1/genres",
                Some(admin),
                json!({ "name": name, "slug": slug }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_anonymous_reads_but_cannot_write() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    seed_taxonomy(&app, &admin).await;
    let id = app
        .create_title(&admin, json!({ "name": "Alien", "year": 1986, "category": "movie" }))
        .await;

    for uri in [
        "/api/v1/titles".to_string(),
        format!("/api/v1/titles/{id}"),
        "/api/v1/categories".to_string(),
        "/api/v1/genres".to_string(),
    ] {
        let (status, _) = app.get(&uri, None).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
    }

    let (status, _) = app
        .post("/api/v1/titles", None, json!({ "name": "X", "year": 2000 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .patch(&format!("/api/v1/titles/{id}"), None, json!({ "name": "Y" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.delete("/api/v1/categories/movie", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/v1/genres", None, json!({ "name": "Horror", "slug": "horror" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_admin_writes_catalog() {
    let app = spawn_app().await;
    let user = app.user_with_role("neo", Role::User).await;
    let moderator = app.user_with_role("smith", Role::Moderator).await;

    for token in [&user, &moderator] {
        let (status, json) = app
            .post(
                "/api/v1/categories",
                Some(token),
                json!({ "name": "Movie", "slug": "movie" }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["success"], false);
    }
}

#[tokio::test]
async fn test_title_crud_embeds_relations() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    seed_taxonomy(&app, &admin).await;

    let (status, json) = app
        .post(
            "/api/v1/titles",
            Some(&admin),
            json!({
                "name": "The Matrix",
                "year": 1999,
                "description": "Wake up",
                "category": "movie",
                "genre": ["sci-fi", "action", "unknown"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &json["data"];
    assert_eq!(data["name"], "The Matrix");
    assert_eq!(data["category"], json!({ "name": "Movie", "slug": "movie" }));
    assert_eq!(
        data["genre"],
        json!([
            { "name": "Action", "slug": "action" },
            { "name": "Sci-Fi", "slug": "sci-fi" }
        ])
    );
    assert!(data["rating"].is_null());
    let id = data["id"].as_i64().unwrap();

    let (status, json) = app
        .patch(
            &format!("/api/v1/titles/{id}"),
            Some(&admin),
            json!({ "genre": "drama", "category": null, "year": 2003 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["year"], 2003);
    assert!(json["data"]["category"].is_null());
    assert_eq!(json["data"]["genre"], json!([{ "name": "Drama", "slug": "drama" }]));
    assert_eq!(json["data"]["description"], "Wake up");

    let (status, _) = app.delete(&format!("/api/v1/titles/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/v1/titles/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_title_validation_reports_field() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    let (status, json) = app
        .post("/api/v1/titles", Some(&admin), json!({ "name": "Old", "year": 1900 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "year");

    let (status, json) = app
        .post("/api/v1/titles", Some(&admin), json!({ "name": " ", "year": 2000 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "name");

    let (status, _) = app
        .post(
            "/api/v1/titles",
            Some(&admin),
            json!({ "name": "Lost", "year": 2000, "category": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = app.get("/api/v1/titles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn test_title_filters() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    seed_taxonomy(&app, &admin).await;

    let matrix = app
        .create_title(
            &admin,
            json!({ "name": "The Matrix", "year": 1999, "category": "movie", "genre": ["sci-fi", "action"] }),
        )
        .await;
    let reloaded = app
        .create_title(
            &admin,
            json!({ "name": "The Matrix Reloaded", "year": 2003, "category": "movie", "genre": "action" }),
        )
        .await;
    let other = app
        .create_title(
            &admin,
            json!({ "name": "Twin Peaks", "year": 1990, "category": "series", "genre": "drama" }),
        )
        .await;

    let ids = |json: &serde_json::Value| -> Vec<i64> {
        json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect()
    };

    let (_, json) = app.get("/api/v1/titles?name=MATRIX&year=1999", None).await;
    assert_eq!(ids(&json), vec![matrix]);

    let (_, json) = app.get("/api/v1/titles?name=matrix", None).await;
    assert_eq!(ids(&json), vec![matrix, reloaded]);

    let (_, json) = app.get("/api/v1/titles?genre=sci-fi&genre=drama", None).await;
    assert_eq!(ids(&json), vec![matrix, other]);

    let (_, json) = app.get("/api/v1/titles?genre=sci-fi,action", None).await;
    assert_eq!(ids(&json), vec![matrix, reloaded]);

    let (_, json) = app.get("/api/v1/titles?category=series", None).await;
    assert_eq!(ids(&json), vec![other]);

    let (_, json) = app
        .get("/api/v1/titles?category=movie&genre=action&year=2003", None)
        .await;
    assert_eq!(ids(&json), vec![reloaded]);

    let (status, _) = app.get("/api/v1/titles?year=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_delete_nulls_titles_and_genre_delete_detaches() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    seed_taxonomy(&app, &admin).await;
    let id = app
        .create_title(
            &admin,
            json!({ "name": "Heat", "year": 1995, "category": "movie", "genre": ["action", "drama"] }),
        )
        .await;

    let (status, _) = app.delete("/api/v1/categories/movie", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete("/api/v1/genres/drama", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = app.get(&format!("/api/v1/titles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["category"].is_null());
    assert_eq!(json["data"]["genre"], json!([{ "name": "Action", "slug": "action" }]));

    let (status, _) = app.delete("/api/v1/categories/movie", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_taxonomy_ordering_search_and_uniqueness() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    seed_taxonomy(&app, &admin).await;

    let (_, json) = app.get("/api/v1/categories", None).await;
    let slugs: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["series", "music", "movie"]);

    let (_, json) = app.get("/api/v1/genres?search=DRA", None).await;
    assert_eq!(json["data"], json!([{ "name": "Drama", "slug": "drama" }]));

    let (status, _) = app
        .post(
            "/api/v1/genres",
            Some(&admin),
            json!({ "name": "Another", "slug": "drama" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app
        .post(
            "/api/v1/genres",
            Some(&admin),
            json!({ "name": "Bad", "slug": "not a slug" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "slug");
}

#[tokio::test]
async fn test_health_and_unknown_token_is_anonymous() {
    let app = spawn_app().await;

    let (status, json) = app.get("/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["database"], true);

    let (status, _) = app.get("/api/v1/titles", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/v1/categories",
            Some("not-a-token"),
            json!({ "name": "Movie", "slug": "movie" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn encoded(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn title_ids(json: &serde_json::Value) -> Vec<i64> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_name_search_folds_non_ascii_case() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let matrix = app
        .create_title(&admin, json!({ "name": "Матрица", "year": 1999 }))
        .await;
    app.create_title(&admin, json!({ "name": "Солярис", "year": 2002 }))
        .await;

    for query in ["Матрица", "матрица", "МАТР", "триц"] {
        let (status, json) = app
            .get(&format!("/api/v1/titles?name={}", encoded(query)), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(title_ids(&json), vec![matrix], "name={query}");
    }

    let (status, _) = app
        .post(
            "/api/v1/genres",
            Some(&admin),
            json!({ "name": "Драма", "slug": "drama" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, json) = app
        .get(&format!("/api/v1/genres?search={}", encoded("драм")), None)
        .await;
    assert_eq!(json["data"], json!([{ "name": "Драма", "slug": "drama" }]));

    let (status, _) = app
        .patch(
            &format!("/api/v1/titles/{matrix}"),
            Some(&admin),
            json!({ "name": "Бразилия" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = app
        .get(&format!("/api/v1/titles?name={}", encoded("бразил")), None)
        .await;
    assert_eq!(title_ids(&json), vec![matrix]);
    let (_, json) = app
        .get(&format!("/api/v1/titles?name={}", encoded("матрица")), None)
        .await;
    assert_eq!(title_ids(&json), Vec::<i64>::new());
}

#[tokio::test]
async fn test_name_search_treats_wildcards_literally() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    app.create_title(&admin, json!({ "name": "Heat", "year": 1995 }))
        .await;
    let percent = app
        .create_title(&admin, json!({ "name": "100% Wolf", "year": 2020 }))
        .await;

    for query in ["_", "H%t"] {
        let (status, json) = app
            .get(&format!("/api/v1/titles?name={}", encoded(query)), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(title_ids(&json), Vec::<i64>::new(), "name={query}");
    }

    let (_, json) = app
        .get(&format!("/api/v1/titles?name={}", encoded("0%")), None)
        .await;
    assert_eq!(title_ids(&json), vec![percent]);

    app.post(
        "/api/v1/categories",
        Some(&admin),
        json!({ "name": "Movie", "slug": "movie" }),
    )
    .await;
    let (_, json) = app.get("/api/v1/categories?search=_", None).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn test_category_filter_accepts_id_and_ignores_empty_values() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    seed_taxonomy(&app, &admin).await;
    let movie = app
        .create_title(&admin, json!({ "name": "Heat", "year": 1995, "category": "movie" }))
        .await;
    let series = app
        .create_title(&admin, json!({ "name": "Twin Peaks", "year": 1990, "category": "series" }))
        .await;

    let category_id = app
        .state
        .shared
        .store
        .get_category_by_slug("series")
        .await
        .unwrap()
        .unwrap()
        .id;

    let (_, json) = app
        .get(&format!("/api/v1/titles?category={category_id}"), None)
        .await;
    assert_eq!(title_ids(&json), vec![series]);

    let (status, json) = app.get("/api/v1/titles?year=&category=&name=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(title_ids(&json), vec![movie, series]);
}

#[tokio::test]
async fn test_unique_violation_from_store_maps_to_conflict() {
    use yamdb::services::{AccountError, CatalogError};

    let app = spawn_app().await;
    let store = &app.state.shared.store;

    store
        .create_category("Movie".to_string(), "movie".to_string())
        .await
        .unwrap();
    // Inserting directly, as a request that raced past the slug check would.
    let err = store
        .create_category("Film".to_string(), "movie".to_string())
        .await
        .unwrap_err();
    assert!(matches!(CatalogError::from(err), CatalogError::Conflict(_)));

    app.user_with_role("neo", Role::User).await;
    let err = store
        .create_user(yamdb::db::NewUser {
            email: "neo@example.com".to_string(),
            username: "neo2".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role: Role::User,
            is_active: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(AccountError::from(err), AccountError::Conflict(_)));
}
