//! Codec properties over the analysis schema: round-trip, idempotence and
//! behaviour on corrupted blobs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use sharestate::{analysis, decode, encode, FieldType, LengthPolicy, Schema};

const TRIALS: usize = 200;

// ============================================================================
// Helpers
// ============================================================================

fn random_state(rng: &mut StdRng) -> Map<String, Value> {
    let hero = if rng.gen_bool(0.3) {
        Value::Null
    } else {
        json!(rng.gen_range(1..100i64))
    };
    let items = |rng: &mut StdRng| -> Vec<i64> {
        (0..rng.gen_range(0..12))
            .map(|_| rng.gen_range(-1_000_000i64..5_000_000_000))
            .collect()
    };
    let selected = items(rng);
    let excluded = items(rng);
    json!({
        "selectedHero": hero,
        "selectedItems": selected,
        "excludedItems": excluded,
        "minBadgeLevel": rng.gen_range(0..200i64),
    })
    .as_object()
    .cloned()
    .unwrap()
}

/// Every decoded value must fit the type declared at its position.
fn conforms(state: &Map<String, Value>, schema: &Schema) -> bool {
    state.iter().all(|(name, value)| {
        schema
            .position(name)
            .map(|i| schema.fields()[i].ty.accepts(value))
            .unwrap_or(false)
    })
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn round_trip_random_states() {
    let schema = analysis::schema().unwrap();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..TRIALS {
        let state = random_state(&mut rng);
        let version = rng.gen_range(0..10u64);
        let blob = encode(&state, &schema, version).unwrap();
        let decoded = decode(&blob, &schema, LengthPolicy::Strict).unwrap();
        assert_eq!(decoded.version, version);
        assert_eq!(decoded.state, state);
    }
}

#[test]
fn encoding_twice_is_byte_identical() {
    let schema = analysis::schema().unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..TRIALS {
        let state = random_state(&mut rng);
        assert_eq!(
            encode(&state, &schema, 1).unwrap(),
            encode(&state, &schema, 1).unwrap()
        );
    }
}

#[test]
fn truncated_blobs_never_decode() {
    let schema = analysis::schema().unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let blob = encode(&random_state(&mut rng), &schema, 1).unwrap();
        for len in 0..blob.len() {
            assert!(
                decode(&blob[..len], &schema, LengthPolicy::Lenient).is_err(),
                "prefix of length {len} of {blob} decoded"
            );
        }
    }
}

#[test]
fn mutated_blobs_never_panic_and_never_yield_ill_typed_state() {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_+/=%! ";
    let schema = analysis::schema().unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..10 {
        let blob = encode(&random_state(&mut rng), &schema, 1).unwrap();
        let mut failures = 0;
        for _ in 0..TRIALS {
            let mut bytes = blob.clone().into_bytes();
            for _ in 0..rng.gen_range(1..4) {
                let i = rng.gen_range(0..bytes.len());
                bytes[i] = ALPHABET[rng.gen_range(0..ALPHABET.len())];
            }
            let mutated = String::from_utf8(bytes).unwrap();
            match decode(&mutated, &schema, LengthPolicy::Lenient) {
                Ok(decoded) => assert!(conforms(&decoded.state, &schema), "{mutated}"),
                Err(_) => failures += 1,
            }
        }
        assert!(failures > 0);
    }
}

#[test]
fn random_text_never_panics() {
    let schema = analysis::schema().unwrap();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..TRIALS {
        let len = rng.gen_range(0..64);
        let text: String = (0..len).map(|_| rng.gen_range(0x20u8..0x7f) as char).collect();
        if let Ok(decoded) = decode(&text, &schema, LengthPolicy::Lenient) {
            assert!(conforms(&decoded.state, &schema));
        }
    }
}

#[test]
fn blob_from_a_grown_schema_still_decodes_under_the_old_one() {
    let mut grown = Schema::builder();
    for field in analysis::schema().unwrap().fields() {
        grown = grown.field(field.name.clone(), field.ty);
    }
    let grown = grown.field("patch", FieldType::Str).build().unwrap();

    let mut state = analysis::AnalysisState::default();
    state.selected_hero = Some(15);
    let mut map = serde_json::to_value(&state)
        .unwrap()
        .as_object()
        .cloned()
        .unwrap();
    map.insert("patch".into(), json!("2024-11-21"));

    let blob = encode(&map, &grown, 2).unwrap();
    let decoded = decode(&blob, &analysis::schema().unwrap(), LengthPolicy::Lenient).unwrap();
    assert_eq!(decoded.state["selectedHero"], json!(15));
    assert!(!decoded.state.contains_key("patch"));
    assert!(decode(&blob, &analysis::schema().unwrap(), LengthPolicy::Strict).is_err());
}
