//! Walks each eviction policy through the same script and prints what the
//! cache holds at each step.
//!
//! Run with `RUST_LOG=tiercache=debug` to see evictions and secondary-tier
//! writes as they happen.

use tiercache::builder::CacheBuilder;
use tiercache::clock::ManualClock;
use tiercache::policy::{PolicyKind, Rank};
use tracing_subscriber::EnvFilter;

const KEYS: [&str; 4] = ["Cache1", "Cache2", "Cache3", "Cache4"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let dir = tempfile::tempdir()?;

    for policy in PolicyKind::ALL {
        println!("=== {policy} Cache Example ===\n");

        let path = dir.path().join(format!("{}.txt", policy.as_str().to_lowercase()));
        let mut cache = CacheBuilder::new(2)
            .policy(policy)
            .secondary_file(&path)
            .clock(ManualClock::ticking(0, 10))
            .try_build::<String, String>()?;

        cache.put("Cache1".into(), "1".into())?;
        cache.put("Cache2".into(), "2".into())?;
        println!("Inserted Cache1, Cache2 (capacity=2)");

        cache.get(&"Cache1".into())?;
        cache.get(&"Cache1".into())?;
        let rank = cache.rank_of(&"Cache1".into());
        match (rank.and_then(Rank::uses), rank.and_then(Rank::last_access)) {
            (Some(uses), _) => println!("Read Cache1 twice: {uses} uses"),
            (_, Some(at)) => println!("Read Cache1 twice: last access {at}"),
            _ => println!("Read Cache1 twice: not ranked"),
        }

        println!("Next eviction candidate: {:?}", cache.eviction_candidate());
        cache.put("Cache3".into(), "3".into())?;
        cache.get(&"Cache3".into())?;
        println!("Inserted and read Cache3");

        println!("Next eviction candidate: {:?}", cache.eviction_candidate());
        cache.put("Cache4".into(), "4".into())?;

        let held: Vec<_> = KEYS
            .into_iter()
            .filter(|key| cache.contains(&key.to_string()))
            .collect();
        println!("Final contents: {held:?}");
        println!("Secondary tier: {}", std::fs::read_to_string(&path)?);
        println!("Metrics: {:?}\n", cache.metrics());
    }

    Ok(())
}
