use churn_predict::app::single::{predict_single, render_prediction};
use churn_predict::core::artifacts::Artifacts;
use churn_predict::domain::model::{Contract, Gender, InternetService, PaymentMethod};
use churn_predict::domain::ports::Classifier;
use churn_predict::{ArtifactStore, ChurnError, CustomerRecord, InferenceAdapter, LocalStorage};

fn artifacts() -> Artifacts {
    ArtifactStore::new(LocalStorage::new(env!("CARGO_MANIFEST_DIR")))
        .load()
        .unwrap()
}

fn short_tenure_fiber_customer() -> CustomerRecord {
    CustomerRecord {
        gender: Gender::Female,
        senior_citizen: 0,
        tenure: 1,
        monthly_charges: 70.35,
        total_charges: 70.35,
        contract: Contract::MonthToMonth,
        internet_service: InternetService::FiberOptic,
        payment_method: PaymentMethod::ElectronicCheck,
    }
}

/// Pinned against the shipped artifacts; a change here means the artifacts or the scoring path changed.
#[test]
fn test_regression_baseline_short_tenure_fiber() {
    let adapter = InferenceAdapter::from_artifacts(&artifacts());
    let prediction = adapter.predict_one(&short_tenure_fiber_customer()).unwrap();

    assert_eq!(prediction.label, 1);
    assert!((prediction.probability - 0.668373211471722).abs() < 1e-9);
    assert_eq!(
        render_prediction(&prediction),
        "Prediction Result\nChurn Probability: 0.67\n❌ This customer is likely to churn."
    );
}

#[test]
fn test_regression_baseline_form_defaults() {
    let adapter = InferenceAdapter::from_artifacts(&artifacts());
    let prediction = adapter.predict_one(&CustomerRecord::default()).unwrap();

    assert_eq!(prediction.label, 0);
    assert!((prediction.probability - 0.3644480454806023).abs() < 1e-9);
}

#[test]
fn test_predictions_are_well_formed_across_domain() {
    let artifacts = artifacts();
    let threshold = artifacts.model.threshold();
    let adapter = InferenceAdapter::from_artifacts(&artifacts);

    let genders = [Gender::Male, Gender::Female];
    let contracts = [Contract::MonthToMonth, Contract::OneYear, Contract::TwoYear];
    let services = [InternetService::Dsl, InternetService::FiberOptic, InternetService::No];
    let payments = [
        PaymentMethod::ElectronicCheck,
        PaymentMethod::MailedCheck,
        PaymentMethod::BankTransfer,
        PaymentMethod::CreditCard,
    ];

    let mut seen_labels = [false, false];
    for gender in genders {
        for contract in contracts {
            for internet_service in services {
                for payment_method in payments {
                    for (tenure, monthly, total) in
                        [(0, 0.0, 0.0), (1, 70.35, 70.35), (36, 100.0, 3600.0), (72, 200.0, 10000.0)]
                    {
                        for senior_citizen in [0, 1] {
                            let record = CustomerRecord {
                                gender,
                                senior_citizen,
                                tenure,
                                monthly_charges: monthly,
                                total_charges: total,
                                contract,
                                internet_service,
                                payment_method,
                            };
                            let p = predict_single(&adapter, &record).unwrap();

                            assert!(p.label <= 1);
                            assert!((0.0..=1.0).contains(&p.probability));
                            assert_eq!(p.label == 1, p.probability >= threshold);
                            seen_labels[p.label as usize] = true;
                        }
                    }
                }
            }
        }
    }
    assert_eq!(seen_labels, [true, true]);
}

#[test]
fn test_predictions_are_deterministic() {
    let adapter = InferenceAdapter::from_artifacts(&artifacts());
    let record = short_tenure_fiber_customer();

    let first = adapter.predict_one(&record).unwrap();
    for _ in 0..10 {
        assert_eq!(adapter.predict_one(&record).unwrap(), first);
    }
}

#[test]
fn test_tenure_boundaries_at_request_boundary() {
    let adapter = InferenceAdapter::from_artifacts(&artifacts());
    let mut record = CustomerRecord::default();

    for tenure in [0, 72] {
        record.tenure = tenure;
        assert!(predict_single(&adapter, &record).is_ok());
    }

    for tenure in [-1, 73] {
        record.tenure = tenure;
        match predict_single(&adapter, &record) {
            Err(ChurnError::ValidationError { field, .. }) => assert_eq!(field, "tenure"),
            other => panic!("tenure {} should be rejected, got {:?}", tenure, other),
        }
    }
}

#[test]
fn test_threshold_override_changes_label_only() {
    let base = InferenceAdapter::from_artifacts(&artifacts());
    let strict = InferenceAdapter::from_artifacts(
        &ArtifactStore::new(LocalStorage::new(env!("CARGO_MANIFEST_DIR")))
            .with_threshold(Some(0.7))
            .load()
            .unwrap(),
    );

    let record = short_tenure_fiber_customer();
    let loose = base.predict_one(&record).unwrap();
    let tight = strict.predict_one(&record).unwrap();

    assert_eq!(loose.probability, tight.probability);
    assert_eq!(loose.label, 1);
    assert_eq!(tight.label, 0);
}
