//! End-to-end fit -> calibrate -> predict pipelines over synthetic data.
use nexcp::metrics::{empirical_coverage, mean_width};
use nexcp::models::{EmpiricalQuantile, LinearQuantile};
use nexcp::split::SequentialSplit;
use nexcp::synthetic::{lagged_dataset, Ar1, LaggedDataset};
use nexcp::{ConformalRegressor, Matrix, PredictorIO, Weighting};

/// Materialize a contiguous column-major block of rows from a lagged
/// dataset, so each split set can be viewed as its own `Matrix`.
fn block(dataset: &LaggedDataset, range: std::ops::Range<usize>) -> (Vec<f64>, Vec<f64>) {
    let matrix = dataset.matrix();
    let rows = range.len();
    let mut features = Vec::with_capacity(rows * dataset.cols);
    for col in 0..dataset.cols {
        let column = matrix.get_col(col);
        features.extend_from_slice(&column[range.clone()]);
    }
    let targets = dataset.targets[range].to_vec();
    (features, targets)
}

#[test]
fn coverage_close_to_nominal_under_exchangeability() {
    // iid gaussian data (AR(1) with phi = 0), uniform weights: the classical
    // split conformal setting. Empirical coverage at alpha = 0.1 must land
    // in a binomial tolerance band around 0.9.
    let dataset = lagged_dataset(&Ar1::new(0.0), 2000, 1, 42).unwrap();
    let splitter = SequentialSplit::new(vec![500, 500, 1000]).unwrap();
    let split = splitter.split(dataset.rows).next().unwrap();

    let (train_x, train_y) = block(&dataset, split[0].clone());
    let (cal_x, cal_y) = block(&dataset, split[1].clone());
    let (test_x, test_y) = block(&dataset, split[2].clone());

    let mut predictor = ConformalRegressor::new(EmpiricalQuantile::new(), 0.1).unwrap();
    predictor
        .fit(&Matrix::new(&train_x, train_y.len(), dataset.cols), &train_y)
        .unwrap();
    predictor
        .calibrate(&Matrix::new(&cal_x, cal_y.len(), dataset.cols), &cal_y)
        .unwrap();
    let intervals = predictor
        .predict(&Matrix::new(&test_x, test_y.len(), dataset.cols), None, true)
        .unwrap();

    let coverage = empirical_coverage(&intervals, &test_y).unwrap();
    assert!(
        (0.85..=0.95).contains(&coverage),
        "empirical coverage {} outside the tolerance band",
        coverage
    );
    assert!(mean_width(&intervals).is_finite());
}

#[test]
fn coverage_holds_with_a_weak_model() {
    // The guarantee is marginal over exchangeable data regardless of model
    // quality: a barely trained linear quantile model must still be covered
    // after calibration.
    let dataset = lagged_dataset(&Ar1::new(0.0), 1600, 2, 7).unwrap();
    let splitter = SequentialSplit::new(vec![400, 400, 800]).unwrap();
    let split = splitter.split(dataset.rows).next().unwrap();

    let (train_x, train_y) = block(&dataset, split[0].clone());
    let (cal_x, cal_y) = block(&dataset, split[1].clone());
    let (test_x, test_y) = block(&dataset, split[2].clone());

    let model = LinearQuantile::new(0.1).set_epochs(20);
    let mut predictor = ConformalRegressor::new(model, 0.1).unwrap().set_seed(13);
    predictor
        .fit(&Matrix::new(&train_x, train_y.len(), dataset.cols), &train_y)
        .unwrap();
    predictor
        .calibrate(&Matrix::new(&cal_x, cal_y.len(), dataset.cols), &cal_y)
        .unwrap();
    let intervals = predictor
        .predict(&Matrix::new(&test_x, test_y.len(), dataset.cols), None, false)
        .unwrap();

    let coverage = empirical_coverage(&intervals, &test_y).unwrap();
    assert!(
        (0.85..=0.96).contains(&coverage),
        "empirical coverage {} outside the tolerance band",
        coverage
    );
}

#[test]
fn time_decay_pipeline_on_dependent_data() {
    // Strongly dependent AR(1). Time-decayed weighting keeps the pipeline
    // well defined end to end and favors recent calibration points.
    let dataset = lagged_dataset(&Ar1::new(0.8), 1200, 1, 3).unwrap();
    let splitter = SequentialSplit::new(vec![400, 400, 400]).unwrap();
    let split = splitter.split(dataset.rows).next().unwrap();

    let (train_x, train_y) = block(&dataset, split[0].clone());
    let (cal_x, cal_y) = block(&dataset, split[1].clone());
    let (test_x, test_y) = block(&dataset, split[2].clone());

    let mut predictor = ConformalRegressor::new(EmpiricalQuantile::new(), 0.1)
        .unwrap()
        .set_weighting(Weighting::TimeDecay { rate: 0.995 })
        .unwrap();
    predictor
        .fit(&Matrix::new(&train_x, train_y.len(), dataset.cols), &train_y)
        .unwrap();
    predictor
        .calibrate(&Matrix::new(&cal_x, cal_y.len(), dataset.cols), &cal_y)
        .unwrap();

    // Test rows sit after the calibration block on the shared time axis.
    let test_indices: Vec<usize> = (0..test_y.len()).map(|r| cal_y.len() + r).collect();
    let intervals = predictor
        .predict(
            &Matrix::new(&test_x, test_y.len(), dataset.cols),
            Some(&test_indices),
            false,
        )
        .unwrap();

    let coverage = empirical_coverage(&intervals, &test_y).unwrap();
    assert!(coverage > 0.8, "coverage collapsed to {}", coverage);
    assert!(intervals.iter().all(|i| i.lower < i.upper));
}

#[test]
fn calibrated_predictor_round_trips_through_file() {
    let dataset = lagged_dataset(&Ar1::new(0.5), 300, 1, 5).unwrap();
    let (x, y) = block(&dataset, 0..300);
    let data = Matrix::new(&x, 300, dataset.cols);

    let mut predictor = ConformalRegressor::new(EmpiricalQuantile::new(), 0.2).unwrap();
    predictor.fit(&data, &y).unwrap();
    predictor.calibrate(&data, &y).unwrap();

    let path = std::env::temp_dir().join(format!("nexcp_predictor_{}.json", std::process::id()));
    predictor.save_predictor(&path).unwrap();
    let restored = ConformalRegressor::<EmpiricalQuantile>::load_predictor(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        restored.predict(&data, None, false).unwrap(),
        predictor.predict(&data, None, false).unwrap()
    );
}
