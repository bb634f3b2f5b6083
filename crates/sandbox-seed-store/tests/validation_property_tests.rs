use proptest::prelude::*;
use sandbox_seed_store::{CollectionDef, DataType, MemoryStore, Record, VectorStore};
use serde_json::json;

fn place() -> CollectionDef {
    CollectionDef::new("Place")
        .text("name")
        .int("population")
        .geo("location")
        .date("founded")
        .object("stats", &[("area", DataType::Number), ("districts", DataType::Int)])
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn integral_values_are_accepted_for_int_fields(n in any::<i64>()) {
        let record = Record::new("p").property("population", json!(n));
        prop_assert!(place().validate(&record).is_ok());
    }

    #[test]
    fn fractional_values_are_rejected_for_int_fields(whole in -1_000_000i64..1_000_000, frac in 0.01f64..0.99) {
        let record = Record::new("p").property("population", json!(whole as f64 + frac));
        prop_assert!(place().validate(&record).is_err());
    }

    #[test]
    fn geo_pairs_are_checked_against_coordinate_ranges(lat in -200.0f64..200.0, lon in -400.0f64..400.0) {
        let record = Record::new("p").property("location", json!({ "latitude": lat, "longitude": lon }));
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
        prop_assert_eq!(place().validate(&record).is_ok(), in_range);
    }

    #[test]
    fn rfc3339_dates_are_accepted(secs in 0i64..4_000_000_000) {
        let date = chrono::DateTime::from_timestamp(secs, 0).unwrap().to_rfc3339();
        let record = Record::new("p").property("founded", json!(date));
        prop_assert!(place().validate(&record).is_ok());
    }

    #[test]
    fn memory_store_count_matches_valid_inserts(populations in prop::collection::vec(prop::option::of(any::<i32>()), 0..40)) {
        let store = MemoryStore::new();
        store.create_collection(&place()).unwrap();

        let mut expected = 0u64;
        for (i, p) in populations.iter().enumerate() {
            // `None` stands for a record with a mistyped population.
            let value = match p {
                Some(n) => json!(n),
                None => json!("many"),
            };
            let record = Record::new(format!("place {i}")).property("population", value);
            if store.insert("Place", &record).is_ok() {
                expected += 1;
            }
        }
        prop_assert_eq!(store.count("Place").unwrap(), expected);
        prop_assert_eq!(expected as usize, populations.iter().filter(|p| p.is_some()).count());
    }
}
