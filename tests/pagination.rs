//! Pagination and sorting behavior over seeded data.

use bookstore_api::models::{BookDto, PaginatedResponse, UserDto};
use bookstore_api::routes::{authors, books};
use bookstore_api::test_support::{
    TestDatabase, TestDatabaseError, TestFixtures, TestRocketBuilder,
};
use rocket::http::Status;
use rocket::local::asynchronous::Client;
use rocket::routes;

#[tokio::test]
async fn listings_paginate_and_sort() {
    let test_db = match TestDatabase::new().await {
        Ok(db) => db,
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping pagination test: no container runtime available ({err})");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let pool = test_db.pool_clone();
    let fixtures = TestFixtures::new(&pool);

    let author_id = fixtures
        .insert_user("prolific@x.com", "Prolific", "$argon2id$unused")
        .await
        .expect("insert author");

    for n in 0..12 {
        fixtures
            .insert_book(author_id, &format!("Volume {:02}", n), "Series")
            .await
            .expect("insert book");
    }

    let rocket = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .mount_api_routes(routes![
            books::list_books,
            books::search_books,
            authors::list_authors,
            authors::search_authors,
        ])
        .build();
    let client = Client::tracked(rocket).await.expect("valid rocket instance");

    // Default page size is 10, so twelve books span two pages.
    let first = client.get("/bookstore/books").dispatch().await;
    assert_eq!(first.status(), Status::Ok);
    let first: PaginatedResponse<BookDto> = first.into_json().await.expect("page payload");
    assert_eq!(first.total_elements, 12);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.content.len(), 10);
    assert_eq!(first.content[0].title, "Volume 00");

    let second = client.get("/bookstore/books?page=2").dispatch().await;
    let second: PaginatedResponse<BookDto> = second.into_json().await.expect("page payload");
    assert_eq!(second.page, 2);
    assert_eq!(second.content.len(), 2);
    assert_eq!(second.content[0].title, "Volume 10");

    // Descending sort flips the ordering.
    let desc = client
        .get("/bookstore/books?sort=title&order=desc&size=3")
        .dispatch()
        .await;
    let desc: PaginatedResponse<BookDto> = desc.into_json().await.expect("page payload");
    assert_eq!(desc.content[0].title, "Volume 11");
    assert_eq!(desc.total_pages, 4);

    // Author search matches by email fragment.
    let found = client
        .get("/bookstore/authors/search?keyword=prolific")
        .dispatch()
        .await;
    let found: PaginatedResponse<UserDto> = found.into_json().await.expect("page payload");
    assert_eq!(found.total_elements, 1);
    assert_eq!(found.content[0].email, "prolific@x.com");

    // Book search reaches author names too.
    let by_author_name = client
        .get("/bookstore/books/search?keyword=prolific&size=100")
        .dispatch()
        .await;
    let by_author_name: PaginatedResponse<BookDto> =
        by_author_name.into_json().await.expect("page payload");
    assert_eq!(by_author_name.total_elements, 12);

    drop(client);
    test_db.close().await;
}
