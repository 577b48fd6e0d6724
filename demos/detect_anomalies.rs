//! Anomaly detection example
//!
//! Builds a small social network, then streams purchases through the engine
//! and shows which ones are flagged and why.

use rust_purchase_anomaly_detector::{AnomalyEngine, EngineConfig, Event};

fn main() {
    println!("=== Social Network Purchase Anomaly Detector ===\n");

    // D = 2 degrees, T = 4 purchases
    let mut engine = AnomalyEngine::new(EngineConfig::new(2, 4));

    // Example 1: Initial network (no detection)
    println!("1. Building Initial Network");
    let batch = vec![
        Event::befriend("alice", "bob"),
        Event::befriend("bob", "carol"),
        Event::befriend("carol", "dave"),
        Event::purchase("bob", "25.00", "2017-06-13 11:33:01"),
        Event::purchase("carol", "31.50", "2017-06-13 11:33:01"),
        Event::purchase("bob", "19.75", "2017-06-13 11:33:01"),
        Event::purchase("dave", "900.00", "2017-06-13 11:33:01"),
    ];
    for event in &batch {
        if let Err(e) = engine.ingest(event) {
            println!("   Rejected {}: {}", event, e);
        }
    }
    println!("   Stats: {:?}", engine.stats());
    println!();

    // Example 2: Network statistics (dave is three hops from alice)
    println!("2. Alice's 2-Degree Network");
    let stats = engine.statistics("alice");
    println!("   Mean: {:.2}", stats.mean);
    println!("   SD: {:.2}", stats.sd);
    println!("   Threshold: {:.2}", stats.threshold());
    println!();

    // Example 3: Streamed purchases
    println!("3. Streaming Purchases");
    let stream = vec![
        Event::purchase("alice", "28.00", "2017-06-13 11:33:02"),
        Event::purchase("alice", "250.00", "2017-06-13 11:33:03"),
        Event::unfriend("alice", "dave"),
        Event::purchase("alice", "a lot", "2017-06-13 11:33:04"),
    ];
    for event in &stream {
        match engine.process(event) {
            Ok(Some(flagged)) => println!(
                "   FLAGGED {} (mean {:.2}, sd {:.2})",
                event, flagged.mean, flagged.sd
            ),
            Ok(None) => println!("   ok      {}", event),
            Err(e) => println!("   error   {}: {}", event, e),
        }
    }
    println!();

    // Example 4: Output records
    println!("4. Flagged Purchase Records");
    for flagged in engine.flagged() {
        match flagged.to_json() {
            Ok(line) => println!("   {}", line),
            Err(e) => println!("   encode error: {}", e),
        }
    }
}
