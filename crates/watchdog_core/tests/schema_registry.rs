use watchdog_core::schema::{cached_schema_count, schema_of};
use watchdog_core::{
    AllocationBand, AssetAllocationEntry, AssetClass, Currency, Entity, EntityKind, FieldKind,
    Fund, Rating, RatingAgency,
};

#[test]
fn repeated_lookups_return_the_same_schema() {
    let first = schema_of::<Fund>().unwrap();
    let second = Fund::schema().unwrap();

    assert!(std::ptr::eq(first, second));
    assert!(cached_schema_count() >= 1);
}

#[test]
fn columns_follow_declared_ordinals() {
    assert_eq!(Currency::schema().unwrap().column_names(), vec!["IsoCode", "Name"]);
    assert_eq!(
        Rating::schema().unwrap().column_names(),
        vec!["RatingCode", "RatingNumericValue", "Agency"]
    );
    assert_eq!(
        AssetAllocationEntry::schema().unwrap().column_names(),
        vec![
            "Fund",
            "AssetClass",
            "Currency",
            "StrategicMinValue",
            "StrategicOptValue",
            "StrategicMaxValue",
        ]
    );

    let ordinals: Vec<usize> = Fund::schema()
        .unwrap()
        .fields()
        .iter()
        .map(|field| field.ordinal())
        .collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3]);
}

#[test]
fn reference_fields_name_their_target() {
    let schema = Fund::schema().unwrap();
    let currency = schema
        .fields()
        .iter()
        .find(|field| field.name() == "Currency")
        .unwrap();

    assert_eq!(
        currency.kind(),
        FieldKind::Reference {
            table: Currency::TABLE_NAME,
            short_name: Currency::SHORT_NAME,
        }
    );
}

#[test]
fn witnesses_are_unpersisted_zero_values() {
    assert!(!Currency::witness().is_persisted());
    assert!(!Fund::witness().is_persisted());
    assert_eq!(*RatingAgency::witness(), RatingAgency::default());
    assert_eq!(*AssetClass::witness(), AssetClass::default());
}

#[test]
fn equality_ignores_row_identity() {
    let mut stored = Currency::new("CHF", "Swiss franc");
    stored.index = 7;
    let fresh = Currency::new("CHF", "Swiss franc");

    assert_eq!(stored, fresh);
    assert_ne!(stored, Currency::new("CHF", "Franc"));
}

#[test]
fn equal_entities_hash_alike() {
    use std::collections::HashSet;

    let currency = Currency::new("EUR", "Euro");
    let fund = Fund::new("Alpha", "CH0000000001", "4711", currency.clone());
    let mut set = HashSet::new();
    set.insert(fund.clone());
    let mut moved = fund.clone();
    moved.index = 3;
    set.insert(moved);

    assert_eq!(set.len(), 1);

    let entry = AssetAllocationEntry::new(
        fund,
        AssetClass::new("Bonds"),
        currency,
        AllocationBand::new(0.0, -0.0, 1.0),
    );
    let mut zero = entry.clone();
    zero.strategic_opt_value = 0.0;
    assert_eq!(entry, zero);
}

#[test]
fn every_kind_column_list_matches_its_schema() {
    assert_eq!(
        EntityKind::Fund.column_names().unwrap(),
        Fund::schema().unwrap().column_names()
    );
    assert_eq!(EntityKind::from_short_name("fnd"), Some(EntityKind::Fund));
}

#[test]
fn unsaved_references_compare_by_their_fields() {
    use std::collections::HashSet;

    let in_euro = Fund::new("Alpha", "I", "C", Currency::new("EUR", "Euro"));
    let in_dollar = Fund::new("Alpha", "I", "C", Currency::new("USD", "US dollar"));
    assert_ne!(in_euro, in_dollar);

    let set: HashSet<Fund> = [in_euro.clone(), in_dollar].into_iter().collect();
    assert_eq!(set.len(), 2);

    let twin = Fund::new("Alpha", "I", "C", Currency::new("EUR", "Euro"));
    assert_eq!(in_euro, twin);
}

#[test]
fn stored_references_compare_by_row_identity() {
    let mut stored = Currency::new("EUR", "Euro");
    stored.index = 4;
    let mut stale = Currency::new("EUR", "Euro (old name)");
    stale.index = 4;

    let current = Fund::new("Alpha", "I", "C", stored.clone());
    assert_eq!(current, Fund::new("Alpha", "I", "C", stale));

    let unsaved = Fund::new("Alpha", "I", "C", Currency::new("EUR", "Euro"));
    assert_ne!(current, unsaved);
}
