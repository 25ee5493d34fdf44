use northwind_core::db::open_db_in_memory;
use northwind_core::{
    Customer, CustomerCache, CustomerRepository, CustomerStore, ReadPolicy, RepoError,
    RepositoryConfig, SqliteCustomerStore, UpdateOutcome,
};
use std::collections::HashSet;
use std::sync::Arc;

fn new_store() -> SqliteCustomerStore {
    SqliteCustomerStore::new(open_db_in_memory().unwrap())
}

fn repo_over(store: SqliteCustomerStore) -> CustomerRepository<SqliteCustomerStore> {
    CustomerRepository::with_cache(
        store,
        Arc::new(CustomerCache::new()),
        RepositoryConfig::default(),
    )
    .unwrap()
}

fn alfki() -> Customer {
    Customer::new("alfki", "Alfreds Futterkiste")
        .with_contact("Maria Anders")
        .with_city("Berlin")
        .with_country("Germany")
}

#[test]
fn create_then_retrieve_normalizes_id() {
    let repo = repo_over(new_store());

    let created = repo.create(alfki()).unwrap();
    assert_eq!(created.customer_id, "ALFKI");

    let loaded = repo.retrieve("ALFKI").unwrap().unwrap();
    assert_eq!(loaded.customer_id, "ALFKI");
    assert_eq!(loaded.company_name, "Alfreds Futterkiste");
}

#[test]
fn retrieve_is_case_insensitive() {
    let repo = repo_over(new_store());
    repo.create(alfki()).unwrap();

    let lower = repo.retrieve("alfki").unwrap();
    let upper = repo.retrieve("ALFKI").unwrap();
    let mixed = repo.retrieve("AlFkI").unwrap();

    assert!(lower.is_some());
    assert_eq!(lower, upper);
    assert_eq!(upper, mixed);
}

#[test]
fn duplicate_create_is_rejected_and_original_kept() {
    let repo = repo_over(new_store());
    repo.create(alfki()).unwrap();

    let err = repo
        .create(Customer::new("ALFKI", "Impostor GmbH"))
        .unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExists(ref id) if id == "ALFKI"));

    assert_eq!(
        repo.retrieve("alfki").unwrap().unwrap().company_name,
        "Alfreds Futterkiste"
    );
    assert_eq!(
        repo.store()
            .get_customer("ALFKI")
            .unwrap()
            .unwrap()
            .company_name,
        "Alfreds Futterkiste"
    );
}

#[test]
fn invalid_record_is_rejected_before_store_write() {
    let repo = repo_over(new_store());

    let err = repo.create(Customer::new("AB", "Too Short Id")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.store().list_customers().unwrap().is_empty());
    assert!(repo.retrieve_all().is_empty());

    repo.create(alfki()).unwrap();
    let err = repo
        .update("ALFKI", Customer::new("ALFKI", ""))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(
        repo.retrieve("ALFKI").unwrap().unwrap().company_name,
        "Alfreds Futterkiste"
    );
}

#[test]
fn update_applies_to_store_and_cache() {
    let repo = repo_over(new_store());
    repo.create(alfki()).unwrap();

    let renamed = Customer::new("Alfki", "Alfreds Futterkiste GmbH").with_country("Germany");
    let outcome = repo.update("alfki", renamed).unwrap();

    match outcome {
        UpdateOutcome::Applied(customer) => {
            assert_eq!(customer.customer_id, "ALFKI");
            assert_eq!(customer.company_name, "Alfreds Futterkiste GmbH");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        repo.retrieve("ALFKI").unwrap(),
        repo.store().get_customer("ALFKI").unwrap()
    );
}

#[test]
fn update_mismatch_is_rejected_without_mutation() {
    let repo = repo_over(new_store());
    repo.create(alfki()).unwrap();

    let err = repo
        .update("ALFKI", Customer::new("ANATR", "Ana Trujillo"))
        .unwrap_err();
    assert!(matches!(err, RepoError::IdentifierMismatch { .. }));

    assert!(repo.retrieve("ANATR").unwrap().is_none());
    assert!(repo.store().get_customer("ANATR").unwrap().is_none());
    assert_eq!(repo.retrieve("ALFKI").unwrap().unwrap(), alfki().normalized());
}

#[test]
fn update_of_unknown_customer_fails_as_store_write() {
    let repo = repo_over(new_store());

    let err = repo
        .update("ANATR", Customer::new("ANATR", "Ana Trujillo"))
        .unwrap_err();
    assert!(matches!(err, RepoError::StoreWriteFailed { .. }));
    assert!(repo.retrieve("ANATR").unwrap().is_none());
}

#[test]
fn delete_then_retrieve_is_absent_and_second_delete_not_found() {
    let repo = repo_over(new_store());
    repo.create(alfki()).unwrap();

    repo.delete("alfki").unwrap();
    assert!(repo.retrieve("ALFKI").unwrap().is_none());
    assert!(repo.store().get_customer("ALFKI").unwrap().is_none());

    let err = repo.delete("ALFKI").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(ref id) if id == "ALFKI"));
}

#[test]
fn snapshot_load_mirrors_store_contents() {
    let store = new_store();
    let seeded = [
        Customer::new("ALFKI", "Alfreds Futterkiste").with_country("Germany"),
        Customer::new("ANATR", "Ana Trujillo").with_country("Mexico"),
        Customer::new("BERGS", "Berglunds snabbkop").with_country("Sweden"),
    ];
    for customer in &seeded {
        assert!(store.insert_customer(customer).unwrap());
    }

    let repo = repo_over(store);
    assert!(repo.cache().is_loaded());

    let cached: HashSet<String> = repo
        .retrieve_all()
        .into_iter()
        .map(|customer| customer.customer_id)
        .collect();
    let stored: HashSet<String> = seeded
        .iter()
        .map(|customer| customer.customer_id.clone())
        .collect();
    assert_eq!(cached, stored);
}

#[test]
fn cache_is_not_resynced_after_snapshot() {
    let store = Arc::new(new_store());
    let repo = CustomerRepository::with_cache(
        Arc::clone(&store),
        Arc::new(CustomerCache::new()),
        RepositoryConfig::default(),
    )
    .unwrap();

    // Written behind the facade's back: invisible to cache-only reads.
    store
        .insert_customer(&Customer::new("ANATR", "Ana Trujillo"))
        .unwrap();
    assert!(repo.retrieve("ANATR").unwrap().is_none());
    assert!(repo.retrieve_all().is_empty());
}

#[test]
fn store_fallback_policy_reads_store_on_miss_without_caching() {
    let store = Arc::new(new_store());
    let repo = CustomerRepository::with_cache(
        Arc::clone(&store),
        Arc::new(CustomerCache::new()),
        RepositoryConfig::default().with_read_policy(ReadPolicy::StoreFallback),
    )
    .unwrap();

    store
        .insert_customer(&Customer::new("ANATR", "Ana Trujillo"))
        .unwrap();

    let found = repo.retrieve("anatr").unwrap().unwrap();
    assert_eq!(found.customer_id, "ANATR");
    assert!(repo.cache().get("ANATR").is_none());
    assert!(repo.retrieve_all().is_empty());
}

#[test]
fn facades_sharing_a_cache_load_it_once() {
    let store = Arc::new(new_store());
    store.insert_customer(&alfki().normalized()).unwrap();
    let cache = Arc::new(CustomerCache::new());

    let first = CustomerRepository::with_cache(
        Arc::clone(&store),
        Arc::clone(&cache),
        RepositoryConfig::default(),
    )
    .unwrap();
    first.create(Customer::new("ANATR", "Ana Trujillo")).unwrap();

    // A second construction must not reload, and sees writes made via the first.
    let second = CustomerRepository::with_cache(
        Arc::clone(&store),
        Arc::clone(&cache),
        RepositoryConfig::default(),
    )
    .unwrap();
    assert_eq!(second.retrieve_all().len(), 2);
    assert!(second.retrieve("anatr").unwrap().is_some());
}

#[test]
fn concurrent_updates_on_same_id_keep_store_authoritative() {
    let repo = repo_over(new_store());
    repo.create(alfki()).unwrap();

    let left = Customer::new("ALFKI", "Left Writer");
    let right = Customer::new("ALFKI", "Right Writer");

    std::thread::scope(|scope| {
        for candidate in [&left, &right] {
            let repo = &repo;
            scope.spawn(move || {
                for _ in 0..50 {
                    repo.update("alfki", candidate.clone()).unwrap();
                }
            });
        }
        for _ in 0..100 {
            let seen = repo.retrieve("ALFKI").unwrap().unwrap();
            assert_eq!(seen.customer_id, "ALFKI");
        }
    });

    let stored = repo.store().get_customer("ALFKI").unwrap().unwrap();
    assert!(stored == left || stored == right);

    let cached = repo.retrieve("ALFKI").unwrap().unwrap();
    assert!(cached == left || cached == right);
    assert_eq!(repo.retrieve_all().len(), 1);
}

#[test]
fn concurrent_creates_on_distinct_ids_all_land() {
    let repo = repo_over(new_store());
    let ids: Vec<String> = (0..16).map(|n| format!("C{n:04}")).collect();

    std::thread::scope(|scope| {
        for id in &ids {
            let repo = &repo;
            scope.spawn(move || {
                repo.create(Customer::new(id.to_lowercase(), "Concurrent Co"))
                    .unwrap();
            });
        }
    });

    assert_eq!(repo.retrieve_all().len(), ids.len());
    assert_eq!(repo.store().list_customers().unwrap().len(), ids.len());
}
