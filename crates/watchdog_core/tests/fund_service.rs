use watchdog_core::{
    AllocationBand, AssetAllocationEntry, AssetClass, Currency, Entity, Fund, FundChanges,
    FundService, FundServiceError, MemoryStore, TableEngine,
};

struct Seeded {
    service: FundService<MemoryStore>,
    chf: Currency,
    eur: Currency,
    equities: AssetClass,
    fund: Fund,
}

fn seeded() -> Seeded {
    let service = FundService::new(TableEngine::new(MemoryStore::new()));
    service.bootstrap().unwrap();
    let engine = service.engine();

    let mut chf = Currency::new("CHF", "Swiss franc");
    let mut eur = Currency::new("EUR", "Euro");
    engine.insert(&mut chf).unwrap();
    engine.insert(&mut eur).unwrap();

    let mut equities = AssetClass::new("Equities");
    engine.insert(&mut equities).unwrap();

    let mut fund = Fund::new("Alpha", "CH0000000001", "4711", chf.clone());
    engine.insert(&mut fund).unwrap();

    Seeded {
        service,
        chf,
        eur,
        equities,
        fund,
    }
}

fn changes_from(fund: &Fund) -> FundChanges {
    FundChanges {
        name: fund.name.clone(),
        isin: fund.isin.clone(),
        custody_account_number: fund.custody_account_number.clone(),
        currency_iso_code: fund.currency.iso_code.clone(),
    }
}

#[test]
fn currency_lookup_ignores_case_and_whitespace() {
    let seeded = seeded();

    let found = seeded.service.currency_by_iso_code(" chf").unwrap();
    assert_eq!(found, seeded.chf);
    assert_eq!(found.index, seeded.chf.index);
}

#[test]
fn currency_lookup_requires_exactly_one_match() {
    let seeded = seeded();

    let err = seeded.service.currency_by_iso_code("usd").unwrap_err();
    assert!(matches!(
        err,
        FundServiceError::CurrencyNotUnique { ref code, matches: 0 } if code == "USD"
    ));

    seeded
        .service
        .engine()
        .insert(&mut Currency::new("EUR", "Euro (duplicate)"))
        .unwrap();
    let err = seeded.service.currency_by_iso_code("EUR").unwrap_err();
    assert!(matches!(err, FundServiceError::CurrencyNotUnique { matches: 2, .. }));
}

#[test]
fn unchanged_fund_is_not_written() {
    let seeded = seeded();

    let result = seeded
        .service
        .update_fund_properties(&seeded.fund, &changes_from(&seeded.fund))
        .unwrap();

    assert!(result.is_none());
    assert_eq!(seeded.service.engine().count::<Fund>().unwrap(), 1);
}

#[test]
fn changed_fund_is_merged_in_place() {
    let seeded = seeded();
    let mut changes = changes_from(&seeded.fund);
    changes.name = "Alpha Income".to_string();
    changes.currency_iso_code = "eur".to_string();

    let updated = seeded
        .service
        .update_fund_properties(&seeded.fund, &changes)
        .unwrap()
        .expect("fund changed");

    assert_eq!(updated.index, seeded.fund.index);
    assert_eq!(updated.currency, seeded.eur);

    let stored = seeded
        .service
        .engine()
        .find::<Fund>(seeded.fund.index)
        .unwrap()
        .unwrap();
    assert_eq!(stored, updated);
    assert_eq!(seeded.service.engine().count::<Fund>().unwrap(), 1);
}

#[test]
fn unknown_currency_code_keeps_current_currency() {
    let seeded = seeded();
    let mut changes = changes_from(&seeded.fund);
    changes.isin = "CH0000000002".to_string();
    changes.currency_iso_code = "XXX".to_string();

    let updated = seeded
        .service
        .update_fund_properties(&seeded.fund, &changes)
        .unwrap()
        .expect("isin changed");

    assert_eq!(updated.currency, seeded.chf);
    assert_eq!(updated.isin, "CH0000000002");
}

#[test]
fn save_allocation_inserts_then_updates_grid_cell() {
    let seeded = seeded();
    let service = &seeded.service;

    let first = service
        .save_allocation(
            &seeded.fund,
            &seeded.equities,
            &seeded.chf,
            AllocationBand::new(0.1, 0.2, 0.3),
        )
        .unwrap();
    assert!(first.is_persisted());

    let second = service
        .save_allocation(
            &seeded.fund,
            &seeded.equities,
            &seeded.chf,
            AllocationBand::new(0.15, 0.25, 0.35),
        )
        .unwrap();
    assert_eq!(second.index, first.index);
    assert_eq!(service.engine().count::<AssetAllocationEntry>().unwrap(), 1);

    let entry = service
        .allocation_entry(&seeded.fund, &seeded.equities, &seeded.chf)
        .unwrap()
        .unwrap();
    assert_eq!(entry.band(), AllocationBand::new(0.15, 0.25, 0.35));
    assert_eq!(entry.fund, seeded.fund);
}

#[test]
fn allocation_lookup_is_scoped_to_fund_and_cell() {
    let seeded = seeded();
    let service = &seeded.service;
    let mut other_fund = Fund::new("Beta", "CH0000000003", "4712", seeded.eur.clone());
    service.engine().insert(&mut other_fund).unwrap();

    service
        .save_allocation(
            &seeded.fund,
            &seeded.equities,
            &seeded.chf,
            AllocationBand::new(0.0, 0.5, 1.0),
        )
        .unwrap();
    service
        .save_allocation(
            &other_fund,
            &seeded.equities,
            &seeded.eur,
            AllocationBand::new(0.2, 0.4, 0.6),
        )
        .unwrap();

    assert_eq!(service.allocation_for_fund(&seeded.fund).unwrap().len(), 1);
    assert_eq!(service.allocation_for_fund(&other_fund).unwrap().len(), 1);
    assert!(service
        .allocation_entry(&seeded.fund, &seeded.equities, &seeded.eur)
        .unwrap()
        .is_none());
    assert!(service
        .allocation_for_fund(&Fund::default())
        .unwrap()
        .is_empty());
}
