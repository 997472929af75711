//! Non-exchangeable Conformal Intervals on AR(1) Data
//! ===================================================
//! Generate a strongly dependent AR(1) sequence, conformalize a marginal
//! quantile model on a held-out calibration block, and compare uniform
//! weighting against time-decayed weighting on the test block.
//!
//! ```bash
//! cargo run --release --example ar1_intervals
//! ```

use nexcp::metrics::{empirical_coverage, mean_width};
use nexcp::models::EmpiricalQuantile;
use nexcp::split::SequentialSplit;
use nexcp::synthetic::{lagged_dataset, Ar1, LaggedDataset};
use nexcp::{ConformalRegressor, Matrix, Weighting};
use std::error::Error;
use std::ops::Range;

const ALPHA: f64 = 0.1;

fn block(dataset: &LaggedDataset, range: Range<usize>) -> (Vec<f64>, Vec<f64>) {
    let matrix = dataset.matrix();
    let mut features = Vec::with_capacity(range.len() * dataset.cols);
    for col in 0..dataset.cols {
        features.extend_from_slice(&matrix.get_col(col)[range.clone()]);
    }
    (features, dataset.targets[range].to_vec())
}

fn main() -> Result<(), Box<dyn Error>> {
    let dataset = lagged_dataset(&Ar1::new(0.9), 3000, 2, 1)?;
    let splitter = SequentialSplit::new(vec![1000, 1000, 1000])?;
    let split = splitter.split(dataset.rows).next().expect("sequence is long enough");

    let (train_x, train_y) = block(&dataset, split[0].clone());
    let (cal_x, cal_y) = block(&dataset, split[1].clone());
    let (test_x, test_y) = block(&dataset, split[2].clone());

    let train = Matrix::new(&train_x, train_y.len(), dataset.cols);
    let cal = Matrix::new(&cal_x, cal_y.len(), dataset.cols);
    let test = Matrix::new(&test_x, test_y.len(), dataset.cols);
    let test_indices: Vec<usize> = (0..test_y.len()).map(|r| cal_y.len() + r).collect();

    for weighting in [Weighting::Uniform, Weighting::TimeDecay { rate: 0.99 }] {
        let mut predictor = ConformalRegressor::new(EmpiricalQuantile::new(), ALPHA)?.set_weighting(weighting)?;
        predictor.fit(&train, &train_y)?;
        predictor.calibrate(&cal, &cal_y)?;
        let intervals = predictor.predict(&test, Some(&test_indices), true)?;

        println!(
            "{:?}: coverage {:.3} (target {:.2}), mean width {:.3}",
            weighting,
            empirical_coverage(&intervals, &test_y)?,
            1.0 - ALPHA,
            mean_width(&intervals),
        );
    }

    Ok(())
}
