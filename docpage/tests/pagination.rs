use serde::{Deserialize, Serialize};

use docpage::{memory::InMemoryStore, prelude::*};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Product {
    #[serde(default)]
    id: String,
    name: String,
    category: String,
    price: i32,
}

fn product(name: &str, category: &str, price: i32) -> Product {
    Product {
        id: String::new(),
        name: name.to_string(),
        category: category.to_string(),
        price,
    }
}

fn config() -> RepositoryConfig {
    RepositoryConfig::builder("products").searchable_fields(["name"]).build()
}

fn prices(page: &Page<Product>) -> Vec<i32> {
    page.items.iter().map(|p| p.price).collect()
}

async fn seed(repository: &Repository<'_, InMemoryStore, Product, SerdeCodec<Product>>, products: Vec<Product>) -> Vec<Product> {
    let mut created = Vec::with_capacity(products.len());
    for item in products {
        created.push(repository.create(&item, None).await.unwrap());
    }
    created
}

fn five_prices() -> Vec<Product> {
    vec![
        product("d", "A", 40),
        product("a", "A", 10),
        product("e", "B", 50),
        product("c", "B", 30),
        product("b", "A", 20),
    ]
}

#[tokio::test]
async fn test_first_page_reports_more_and_cursor() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    let created = seed(&products, five_prices()).await;

    let page = products
        .read_all(None, None, &[Sort::asc("price")], &Pagination::new(2))
        .await
        .unwrap();

    let twenty = created.iter().find(|p| p.price == 20).unwrap();
    assert_eq!(prices(&page), vec![10, 20]);
    assert!(page.has_more);
    assert_eq!(page.next_cursor.as_deref(), Some(twenty.id.as_str()));
}

#[tokio::test]
async fn test_cursor_continues_after_previous_page() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    seed(&products, five_prices()).await;

    let sort = [Sort::asc("price")];
    let request = Pagination::new(2);
    let first = products.read_all(None, None, &sort, &request).await.unwrap();
    let second = products
        .read_all(None, None, &sort, &request.after(&first).unwrap())
        .await
        .unwrap();

    assert_eq!(prices(&second), vec![30, 40]);
    assert!(second.has_more);

    let third = products
        .read_all(None, None, &sort, &request.after(&second).unwrap())
        .await
        .unwrap();
    assert_eq!(prices(&third), vec![50]);
    assert!(!third.has_more);
    assert_eq!(third.next_cursor, None);
}

#[tokio::test]
async fn test_cursor_of_deleted_document_is_invalid() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    seed(&products, five_prices()).await;

    let first = products
        .read_all(None, None, &[Sort::asc("price")], &Pagination::new(2))
        .await
        .unwrap();
    let cursor = first.next_cursor.clone().unwrap();
    products.delete(&cursor, None).await.unwrap();

    let result = products
        .read_all(None, None, &[Sort::asc("price")], &Pagination::new(2).after(&first).unwrap())
        .await;
    assert!(matches!(result, Err(RepositoryError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_malformed_cursor_fails_before_store_access() {
    let backend = InMemoryStore::new();
    backend.set_ready(false);
    let store = DocumentStore::new(backend);
    let products = store.serde_repository::<Product>(config()).unwrap();

    let request = Pagination::builder().with_limit(2).with_cursor(Some("zzz".into())).build();
    let result = products.read_all(None, None, &[], &request).await;

    // The store is offline, so only validation can have produced this.
    assert!(matches!(result, Err(RepositoryError::InvalidArgument(_))));
    assert!(matches!(products.read("nope", None).await, Err(RepositoryError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_exact_fit_has_no_next_page() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    seed(&products, vec![product("a", "A", 1), product("b", "A", 2), product("c", "A", 3)]).await;

    let exact = products.read_all(None, None, &[], &Pagination::new(3)).await.unwrap();
    assert_eq!(exact.items.len(), 3);
    assert!(!exact.has_more);
    assert_eq!(exact.next_cursor, None);

    let short = products.read_all(None, None, &[], &Pagination::new(2)).await.unwrap();
    assert!(short.has_more);
    assert_eq!(short.next_cursor.as_deref(), Some(short.items[1].id.as_str()));
}

#[tokio::test]
async fn test_pages_never_overlap_under_ties() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    seed(
        &products,
        vec![
            product("a", "B", 50),
            product("b", "A", 10),
            product("c", "B", 50),
            product("d", "A", 30),
            product("e", "C", 5),
            product("f", "B", 20),
            product("g", "A", 30),
            product("h", "B", 50),
        ],
    )
    .await;

    let sort = [Sort::asc("category"), Sort::desc("price")];
    let mut request = Pagination::new(3);
    let mut walked: Vec<Product> = Vec::new();

    loop {
        let page = products.read_all(None, None, &sort, &request).await.unwrap();
        assert!(page.items.len() <= 3);
        walked.extend(page.items.iter().cloned());
        match request.after(&page) {
            Some(next) => request = next,
            None => break,
        }
    }

    let mut ids: Vec<&str> = walked.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(walked.len(), 8);

    let keys: Vec<(String, i32, String)> = walked
        .iter()
        .map(|p| (p.category.clone(), -p.price, p.id.clone()))
        .collect();
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[tokio::test]
async fn test_last_page_holds_every_match() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    seed(&products, five_prices()).await;

    let filter = doc! { "category": "A" };
    let page = products
        .read_all(None, Some(&filter), &[Sort::desc("price")], &Pagination::default())
        .await
        .unwrap();

    assert!(!page.has_more);
    assert_eq!(prices(&page), vec![40, 20, 10]);
    assert_eq!(page.items.len() as u64, products.count(None, Some(&filter)).await.unwrap());
}

#[tokio::test]
async fn test_scope_isolates_owners() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    let alice = Bson::from("alice");
    let bob = Bson::from("bob");

    let owned = products.create(&product("a", "A", 10), Some(&alice)).await.unwrap();
    products.create(&product("b", "A", 20), Some(&bob)).await.unwrap();

    // A caller-supplied owner is overridden by the scope.
    let sneaky = doc! { "userId": "bob" };
    let page = products
        .read_all(Some(&alice), Some(&sneaky), &[], &Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items, vec![owned.clone()]);

    assert_eq!(products.count(Some(&bob), None).await.unwrap(), 1);
    assert!(matches!(products.read(&owned.id, Some(&bob)).await, Err(RepositoryError::NotFound(_))));
    assert!(matches!(products.delete(&owned.id, Some(&bob)).await, Err(RepositoryError::NotFound(_))));
    assert_eq!(products.read(&owned.id, Some(&alice)).await.unwrap(), owned);
}

#[tokio::test]
async fn test_search_is_partial_and_case_insensitive() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    seed(
        &products,
        vec![
            product("Pro Widget", "A", 10),
            product("basic widget", "A", 20),
            product("Improved (pro) gadget", "B", 30),
        ],
    )
    .await;

    let found = products
        .read_all(None, Some(&doc! { "q": "PRO" }), &[Sort::asc("price")], &Pagination::default())
        .await
        .unwrap();
    assert_eq!(prices(&found), vec![10, 30]);

    let literal = products.count(None, Some(&doc! { "q": "(pro)" })).await.unwrap();
    assert_eq!(literal, 1);

    let combined = products
        .count(None, Some(&doc! { "q": "widget", "price": { "$gte": 15 } }))
        .await
        .unwrap();
    assert_eq!(combined, 1);
}

#[tokio::test]
async fn test_search_without_searchable_fields_is_rejected() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store
        .serde_repository::<Product>(RepositoryConfig::new("products"))
        .unwrap();

    let result = products
        .read_all(None, Some(&doc! { "q": "pro" }), &[], &Pagination::default())
        .await;
    assert!(matches!(result, Err(RepositoryError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_update_replaces_body_and_keeps_id() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    let created = products.create(&product("a", "A", 10), None).await.unwrap();

    let mut changed = product("a2", "B", 15);
    changed.id = "ignored".to_string();
    let updated = products.update(&created.id, &changed, None).await.unwrap();

    assert_eq!(updated, Product { id: created.id.clone(), ..product("a2", "B", 15) });
    assert_eq!(products.read(&created.id, None).await.unwrap(), updated);
}

#[tokio::test]
async fn test_missing_targets_are_not_found() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    let absent = ObjectId::new().to_hex();

    assert!(matches!(products.read(&absent, None).await, Err(RepositoryError::NotFound(_))));
    assert!(matches!(
        products.update(&absent, &product("a", "A", 1), None).await,
        Err(RepositoryError::NotFound(_))
    ));
    assert!(matches!(products.delete(&absent, None).await, Err(RepositoryError::NotFound(_))));
}

#[tokio::test]
async fn test_offline_store_is_unavailable() {
    let backend = InMemoryStore::new();
    let store = DocumentStore::new(backend.clone());
    let products = store.serde_repository::<Product>(config()).unwrap();
    backend.set_ready(false);

    assert!(matches!(
        products.read_all(None, None, &[], &Pagination::default()).await,
        Err(RepositoryError::StorageUnavailable(_))
    ));
    assert!(matches!(
        products.create(&product("a", "A", 1), None).await,
        Err(RepositoryError::StorageUnavailable(_))
    ));
    assert!(matches!(products.count(None, None).await, Err(RepositoryError::StorageUnavailable(_))));
}

#[tokio::test]
async fn test_zero_limit_is_rejected() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();

    let result = products.read_all(None, None, &[], &Pagination::new(0)).await;
    assert!(matches!(result, Err(RepositoryError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_aggregate_is_scoped() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    let alice = Bson::from("alice");

    products.create(&product("a", "A", 10), Some(&alice)).await.unwrap();
    products.create(&product("b", "A", 20), Some(&alice)).await.unwrap();
    products.create(&product("c", "A", 30), None).await.unwrap();

    let pipeline = vec![doc! { "$count": "total" }];
    assert_eq!(
        products.aggregate(pipeline.clone(), Some(&alice)).await.unwrap(),
        vec![doc! { "total": 2_i64 }]
    );
    assert_eq!(products.aggregate(pipeline, None).await.unwrap(), vec![doc! { "total": 3_i64 }]);

    let rejected = products.aggregate(vec![doc! { "$explode": 1 }], None).await;
    assert!(matches!(rejected, Err(RepositoryError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_hand_written_codec() {
    let store = DocumentStore::new(InMemoryStore::new());
    let codec = FnCodec::new(
        |document: Document| -> RepositoryResult<(String, String)> {
            Ok((
                document.get_str("id").unwrap_or_default().to_string(),
                document.get_str("label").unwrap_or_default().to_string(),
            ))
        },
        |(_, label): &(String, String)| -> RepositoryResult<Document> { Ok(doc! { "label": label.as_str() }) },
    );
    let labels = store.repository(RepositoryConfig::new("labels"), codec).unwrap();

    let (id, label) = labels.create(&(String::new(), "x".to_string()), None).await.unwrap();
    assert_eq!(label, "x");
    assert_eq!(labels.read(&id, None).await.unwrap(), (id.clone(), "x".to_string()));
}

#[tokio::test]
async fn test_sort_index_accepts_compiled_order() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();

    products
        .ensure_sort_index(&[Sort::asc("category"), Sort::desc("price")])
        .await
        .unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Task {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rank: Option<i32>,
}

async fn walk_tasks(
    tasks: &Repository<'_, InMemoryStore, Task, SerdeCodec<Task>>,
    sort: &[Sort],
    limit: usize,
) -> Vec<String> {
    let mut request = Pagination::new(limit);
    let mut names = Vec::new();

    loop {
        let page = tasks.read_all(None, None, sort, &request).await.unwrap();
        names.extend(page.items.iter().map(|t| t.name.clone()));
        match request.after(&page) {
            Some(next) => request = next,
            None => break,
        }
    }

    names
}

#[tokio::test]
async fn test_walk_includes_documents_without_sort_field() {
    let store = DocumentStore::new(InMemoryStore::new());
    let tasks = store.serde_repository::<Task>(RepositoryConfig::new("tasks")).unwrap();

    for (name, rank) in [("a", None), ("b", None), ("c", Some(1)), ("d", Some(2))] {
        let task = Task { id: String::new(), name: name.to_string(), rank };
        tasks.create(&task, None).await.unwrap();
    }

    // Missing values order before every number ascending and after them descending.
    assert_eq!(walk_tasks(&tasks, &[Sort::asc("rank")], 2).await, vec!["a", "b", "c", "d"]);
    assert_eq!(walk_tasks(&tasks, &[Sort::desc("rank")], 1).await, vec!["d", "c", "a", "b"]);
}

#[tokio::test]
async fn test_unbounded_limit_is_rejected() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    seed(&products, five_prices()).await;

    let result = products.read_all(None, None, &[], &Pagination::new(usize::MAX)).await;
    assert!(matches!(result, Err(RepositoryError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_cursor_from_another_owner_is_invalid() {
    let store = DocumentStore::new(InMemoryStore::new());
    let products = store.serde_repository::<Product>(config()).unwrap();
    let alice = Bson::from("alice");
    let bob = Bson::from("bob");

    for price in [10, 20, 30] {
        products.create(&product("a", "A", price), Some(&alice)).await.unwrap();
        products.create(&product("b", "A", price), Some(&bob)).await.unwrap();
    }

    let request = Pagination::new(1);
    let alice_page = products.read_all(Some(&alice), None, &[], &request).await.unwrap();
    let borrowed = request.after(&alice_page).unwrap();

    let result = products.read_all(Some(&bob), None, &[], &borrowed).await;
    assert!(matches!(result, Err(RepositoryError::InvalidArgument(_))));
    assert!(products.read_all(Some(&alice), None, &[], &borrowed).await.is_ok());
}
