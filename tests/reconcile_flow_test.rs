use chrono::{Duration, Utc};
use pos_multicurrency::application::engine::MultiCurrencyEngine;
use pos_multicurrency::application::reconciler::Reconciler;
use pos_multicurrency::application::stager::Stager;
use pos_multicurrency::domain::currency::{Currency, CurrencyBook};
use pos_multicurrency::domain::payment_method::PaymentMethodConfig;
use pos_multicurrency::domain::ports::StagingStore;
use pos_multicurrency::domain::pos_config::PosConfig;
use pos_multicurrency::domain::staging::{StagePaymentRequest, WirePaymentLine};
use pos_multicurrency::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryStagingStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn currency(id: u32, name: &str) -> Currency {
    Currency {
        id,
        name: name.to_string(),
        symbol: String::new(),
        active: true,
    }
}

fn engine(staging: &InMemoryStagingStore) -> MultiCurrencyEngine {
    engine_with_ttl(staging, Duration::minutes(1))
}

fn engine_with_ttl(staging: &InMemoryStagingStore, ttl: Duration) -> MultiCurrencyEngine {
    let payments = InMemoryPaymentStore::new();
    let mut config = PosConfig::new(1, "Main Shop");
    config.multi_currency_payments = true;
    config.base_currency_id = Some(1);
    config.payment_methods = vec![
        PaymentMethodConfig::new(1, "Cash"),
        PaymentMethodConfig::new(2, "Cash MXN").with_currency(2),
    ];

    MultiCurrencyEngine::new(
        config,
        Stager::with_ttl(Box::new(staging.clone()), ttl),
        Reconciler::new(
            Box::new(staging.clone()),
            Box::new(payments.clone()),
            CurrencyBook::new([currency(1, "USD"), currency(2, "MXN")]),
        ),
        Box::new(payments),
    )
}

fn mxn_line(uuid: &str, amount: Decimal, mxn: Decimal) -> WirePaymentLine {
    WirePaymentLine {
        payment_method_id: Some(2),
        amount: Some(amount),
        uuid: Some(uuid.to_string()),
        is_multicurrency: true,
        payment_currency_id: Some(2),
        payment_currency_amount: Some(mxn),
        payment_exchange_rate: Some(dec!(0.054)),
    }
}

#[tokio::test]
async fn test_wire_lines_match_by_tender_line_id() {
    let staging = InMemoryStagingStore::new();
    let engine = engine(&staging);

    let lines = vec![
        WirePaymentLine {
            payment_method_id: Some(1),
            amount: Some(dec!(4.60)),
            uuid: Some("L1".to_string()),
            ..Default::default()
        },
        mxn_line("L2", dec!(5.40), dec!(100)),
        mxn_line("L3", dec!(2.70), dec!(50)),
    ];
    let staged = engine
        .stager()
        .stage_wire_lines("uuid-1", &lines)
        .await
        .unwrap();
    assert_eq!(staged.len(), 2);

    // Rows are created in a different order than the lines were staged
    for (method, amount, line) in [(2, dec!(2.70), "L3"), (1, dec!(4.60), "L1"), (2, dec!(5.40), "L2")] {
        engine
            .add_payment("uuid-1", Some(method), Some(amount), Some(line.to_string()))
            .await
            .unwrap();
    }

    let outcome = engine.commit_order("uuid-1", None).await.unwrap();
    assert_eq!(outcome.reconciliation.unwrap().applied(), 2);

    for payment in &outcome.payments {
        match payment.tender_line_id.as_deref() {
            Some("L1") => assert!(!payment.is_annotated()),
            Some("L2") => assert_eq!(payment.amount_in_currency, Some(dec!(100))),
            Some("L3") => assert_eq!(payment.amount_in_currency, Some(dec!(50))),
            other => panic!("unexpected tender line {other:?}"),
        }
    }
    assert_eq!(staging.pending_keys().await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_wire_line_stages_nothing() {
    let staging = InMemoryStagingStore::new();
    let engine = engine(&staging);

    let mut broken = mxn_line("L2", dec!(5.40), dec!(100));
    broken.payment_exchange_rate = None;
    let lines = vec![mxn_line("L1", dec!(2.70), dec!(50)), broken];

    assert!(engine.stager().stage_wire_lines("uuid-1", &lines).await.is_err());
    assert_eq!(staging.pending_keys().await.unwrap(), 0);
}

#[tokio::test]
async fn test_abandoned_staging_is_swept() {
    let staging = InMemoryStagingStore::new();
    let engine = engine(&staging);

    let request = StagePaymentRequest {
        client_order_key: Some("uuid-old".to_string()),
        payment_method_id: Some(2),
        payment_currency_id: Some(2),
        amount_in_currency: Some(dec!(100)),
        exchange_rate: Some(dec!(0.054)),
        ..Default::default()
    };
    engine
        .stager()
        .stage_at(request.clone(), Utc::now() - Duration::hours(2))
        .await
        .unwrap();
    engine
        .stager()
        .stage(StagePaymentRequest {
            client_order_key: Some("uuid-fresh".to_string()),
            ..request
        })
        .await
        .unwrap();

    // Any commit sweeps expired entries
    engine.commit_order("uuid-other", None).await.unwrap();
    assert!(staging.entries("uuid-old").await.unwrap().is_empty());
    assert_eq!(staging.entries("uuid-fresh").await.unwrap().len(), 1);

    engine
        .add_payment("uuid-old", Some(2), Some(dec!(5.40)), None)
        .await
        .unwrap();
    let outcome = engine.commit_order("uuid-old", None).await.unwrap();
    assert!(outcome.reconciliation.unwrap().is_noop());
    assert_eq!(outcome.payments[0].exchange_rate_used, Decimal::ONE);
}

#[tokio::test]
async fn test_long_open_order_claims_expired_staging() {
    let staging = InMemoryStagingStore::new();
    let engine = engine_with_ttl(&staging, Duration::minutes(30));

    engine
        .stager()
        .stage_at(
            StagePaymentRequest {
                client_order_key: Some("uuid-tab".to_string()),
                payment_method_id: Some(2),
                payment_currency_id: Some(2),
                amount_in_currency: Some(dec!(100)),
                exchange_rate: Some(dec!(0.054)),
                ..Default::default()
            },
            Utc::now() - Duration::minutes(45),
        )
        .await
        .unwrap();
    engine
        .add_payment("uuid-tab", Some(2), Some(dec!(5.40)), None)
        .await
        .unwrap();

    let outcome = engine.commit_order("uuid-tab", None).await.unwrap();
    assert_eq!(outcome.reconciliation.unwrap().applied(), 1);
    assert!(outcome.payments[0].is_annotated());
    assert_eq!(outcome.payments[0].amount_in_currency, Some(dec!(100)));
    assert_eq!(staging.pending_keys().await.unwrap(), 0);
}

#[tokio::test]
async fn test_overflowing_staged_amount_does_not_abort_commit() {
    let staging = InMemoryStagingStore::new();
    let engine = engine(&staging);

    engine
        .stager()
        .stage(StagePaymentRequest {
            client_order_key: Some("uuid-big".to_string()),
            payment_method_id: Some(2),
            payment_currency_id: Some(2),
            amount_in_currency: Some(dec!(100000000000000000000)),
            exchange_rate: Some(dec!(10000000000)),
            ..Default::default()
        })
        .await
        .unwrap();
    for amount in [dec!(5.40), dec!(10.80)] {
        engine
            .add_payment("uuid-big", Some(2), Some(amount), None)
            .await
            .unwrap();
    }

    let outcome = engine.commit_order("uuid-big", None).await.unwrap();
    assert_eq!(outcome.reconciliation.unwrap().applied(), 1);
    assert_eq!(outcome.payments.iter().filter(|p| p.is_annotated()).count(), 1);
}
