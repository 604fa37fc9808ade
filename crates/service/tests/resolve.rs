//! Integration tests for content resolution

mod testkit;

use chrono::Utc;

use common::content::resolution_cache_key;
use common::records::{ResolutionRecord, StoreOrigin};
use hashgate_service::locate::Resolution;

#[tokio::test]
async fn test_resolve_absent_content() {
    let env = testkit::setup().await;
    let locator = testkit::content_for(b"never stored");

    let resolution = env.state.locator().locate(&locator, true).await;
    assert_eq!(resolution, Resolution::NotFound);

    // negative results are never cached
    let cache_key = resolution_cache_key(env.primary.uri(), &locator.object_key());
    assert!(env.kv.get(&cache_key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_resolve_primary_then_cache_hit() {
    let env = testkit::setup().await;
    let data = b"hello, content";
    let locator = testkit::store_content(&env.primary, data).await;

    let first = env.state.locator().locate(&locator, true).await;
    let Resolution::Found { record, cache_hit } = first else {
        panic!("expected content to resolve");
    };
    assert!(!cache_hit);
    assert_eq!(record.size, data.len() as u64);
    assert_eq!(record.store_origin, StoreOrigin::Primary);
    assert_eq!(record.object_key, locator.object_key());
    assert!(record.signed_url.contains("getObject"));

    // resolving again within the TTL window is a cache hit with
    // identical contents
    let second = env.state.locator().locate(&locator, true).await;
    let Resolution::Found {
        record: cached,
        cache_hit,
    } = second
    else {
        panic!("expected cached resolution");
    };
    assert!(cache_hit);
    assert_eq!(cached.size, record.size);
    assert_eq!(cached.object_key, record.object_key);

    // both tiers were populated
    let cache_key = resolution_cache_key(env.primary.uri(), &locator.object_key());
    assert!(env.kv.get(&cache_key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_expired_record_is_evicted_and_reprobed() {
    let env = testkit::setup().await;
    let data = b"expiring content";
    let locator = testkit::store_content(&env.primary, data).await;
    let cache_key = resolution_cache_key(env.primary.uri(), &locator.object_key());

    // plant a stale record in the durable tier
    let stale = ResolutionRecord {
        object_key: locator.object_key(),
        store_origin: StoreOrigin::Primary,
        size: 1,
        signed_url: "http://signed.test/stale".into(),
        created_at: Utc::now() - chrono::Duration::minutes(31),
    };
    env.kv
        .put(&cache_key, &serde_json::to_string(&stale).unwrap())
        .await
        .unwrap();

    // the stale entry must not be served; the store is re-probed
    let resolution = env.state.locator().locate(&locator, true).await;
    let Resolution::Found { record, cache_hit } = resolution else {
        panic!("expected re-probe to resolve");
    };
    assert!(!cache_hit);
    assert_eq!(record.size, data.len() as u64);

    // and the durable tier now holds the fresh record
    let refreshed: ResolutionRecord =
        serde_json::from_str(&env.kv.get(&cache_key).await.unwrap().unwrap()).unwrap();
    assert_eq!(refreshed.size, data.len() as u64);
}

#[tokio::test]
async fn test_expired_record_for_absent_content_purges_cache() {
    let env = testkit::setup().await;
    let locator = testkit::content_for(b"gone content");
    let cache_key = resolution_cache_key(env.primary.uri(), &locator.object_key());

    let stale = ResolutionRecord {
        object_key: locator.object_key(),
        store_origin: StoreOrigin::Primary,
        size: 12,
        signed_url: "http://signed.test/stale".into(),
        created_at: Utc::now() - chrono::Duration::minutes(31),
    };
    env.kv
        .put(&cache_key, &serde_json::to_string(&stale).unwrap())
        .await
        .unwrap();

    assert_eq!(
        env.state.locator().locate(&locator, true).await,
        Resolution::NotFound
    );
    assert!(env.kv.get(&cache_key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fallback_resolution_and_isolation() {
    let env = testkit::setup().await;
    let data = b"fallback only";
    let locator = testkit::store_content(&env.fallback, data).await;

    // absent from primary, found in fallback
    let first = env.state.locator().locate(&locator, true).await;
    let Resolution::Found { record, cache_hit } = first else {
        panic!("expected fallback hit");
    };
    assert!(!cache_hit);
    assert_eq!(record.store_origin, StoreOrigin::Fallback);

    // a fallback-sourced record must not satisfy a fallback-disallowed
    // lookup, even though it is freshly cached
    assert_eq!(
        env.state.locator().locate(&locator, false).await,
        Resolution::NotFound
    );

    // the record still serves fallback-allowed lookups
    let again = env.state.locator().locate(&locator, true).await;
    let Resolution::Found { cache_hit, .. } = again else {
        panic!("expected cached fallback hit");
    };
    assert!(cache_hit);
}

#[tokio::test]
async fn test_fallback_not_consulted_when_disallowed() {
    let env = testkit::setup().await;
    let locator = testkit::store_content(&env.fallback, b"fallback content").await;

    assert_eq!(
        env.state.locator().locate(&locator, false).await,
        Resolution::NotFound
    );
}

#[tokio::test]
async fn test_absence_is_reprobed_every_time() {
    let env = testkit::setup().await;
    let data = b"late arrival";
    let locator = testkit::content_for(data);

    assert_eq!(
        env.state.locator().locate(&locator, true).await,
        Resolution::NotFound
    );

    // content appears later; the next lookup sees it immediately
    testkit::store_content(&env.primary, data).await;
    assert!(env.state.locator().locate(&locator, true).await.is_found());
}
