use std::error::Error;

use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

use invase::{
    CLASS_COUNT, DEFAULT_LEARNING_RATE, DEFAULT_TAU, DIMENSION, InvaseTrainer, SyntheticDataset,
    TrainingLoopConfig, accuracy_score, average_precision_score, roc_auc_score,
    selection_performance, threshold_mask,
};

type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Parser, Debug)]
#[command(
    about = "Train INVASE on the synthetic benchmarks using the Burn framework",
    version,
    author
)]
struct TrainArgs {
    /// Synthetic benchmark variant; also fixes the hidden activation.
    #[arg(long, value_enum, default_value_t = DatasetKind::Syn6)]
    dataset: DatasetKind,
    /// Number of training examples to generate.
    #[arg(long, default_value_t = 10_000)]
    train_samples: usize,
    /// Number of test examples per evaluation split.
    #[arg(long, default_value_t = 10_000)]
    test_samples: usize,
    /// Number of training steps (one mini-batch update each).
    #[arg(long, default_value_t = 10_000)]
    steps: usize,
    /// Learning rate shared by all three Adam optimizers.
    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f64,
    /// Sparsity penalty coefficient.
    #[arg(long, default_value_t = DEFAULT_TAU)]
    tau: f32,
    /// Seed for training-split generation.
    #[arg(long, default_value_t = 0)]
    train_seed: u64,
    /// Seed for test-split generation; evaluation rounds use the seeds above it.
    #[arg(long, default_value_t = 1)]
    test_seed: u64,
    /// Seed for batch sampling and Bernoulli mask draws.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Progress-line cadence in steps (0 silences the loop).
    #[arg(long, default_value_t = 100)]
    log_every: usize,
    /// Freshly seeded test splits to average the prediction metrics over.
    #[arg(long, default_value_t = 20)]
    evaluation_rounds: usize,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DatasetKind {
    Syn1,
    Syn2,
    Syn3,
    Syn4,
    Syn5,
    Syn6,
}

impl DatasetKind {
    fn dataset(self) -> SyntheticDataset {
        match self {
            Self::Syn1 => SyntheticDataset::Syn1,
            Self::Syn2 => SyntheticDataset::Syn2,
            Self::Syn3 => SyntheticDataset::Syn3,
            Self::Syn4 => SyntheticDataset::Syn4,
            Self::Syn5 => SyntheticDataset::Syn5,
            Self::Syn6 => SyntheticDataset::Syn6,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = TrainArgs::parse();
    validate_args(&args)?;
    let dataset = args.dataset.dataset();

    let train = dataset.generate(args.train_samples, args.train_seed)?;
    let test = dataset.generate(args.test_samples, args.test_seed)?;
    println!(
        "dataset {:?}: {} train / {} test examples, {} features",
        args.dataset,
        train.len(),
        test.len(),
        DIMENSION
    );

    let mut trainer = InvaseTrainer::<TrainBackend>::new(
        DIMENSION,
        dataset.activation(),
        args.learning_rate,
        args.tau,
    );
    let mut rng = StdRng::seed_from_u64(args.seed);
    let config = TrainingLoopConfig {
        steps: args.steps,
        log_every: args.log_every,
    };
    trainer.fit(&train, &config, &mut rng)?;

    // Variable-selection quality against the ground-truth relevance.
    let probabilities = trainer.selection_probabilities(test.features())?;
    let selected = threshold_mask(&probabilities);
    let performance = selection_performance(&selected, test.relevance(), DIMENSION);
    println!(
        "TPR mean: {:.1}%, TPR std: {:.1}%",
        performance.tpr_mean, performance.tpr_std
    );
    println!(
        "FDR mean: {:.1}%, FDR std: {:.1}%",
        performance.fdr_mean, performance.fdr_std
    );

    if args.evaluation_rounds == 0 {
        return Ok(());
    }

    // Prediction quality of both critics over fresh test splits.
    let mut baseline_metrics = vec![Vec::new(); 3];
    let mut predictor_metrics = vec![Vec::new(); 3];
    for round in 0..args.evaluation_rounds {
        let split = dataset.generate(args.test_samples, args.test_seed + 1 + round as u64)?;
        let probabilities = trainer.selection_probabilities(split.features())?;
        let mask = threshold_mask(&probabilities);
        let (baseline, predictor) = trainer.predict(split.features(), &mask)?;

        let truth = positive_column(split.labels());
        for (scores, sink) in [
            (positive_column(&baseline), &mut baseline_metrics),
            (positive_column(&predictor), &mut predictor_metrics),
        ] {
            sink[0].push(roc_auc_score(&truth, &scores));
            sink[1].push(average_precision_score(&truth, &scores));
            sink[2].push(accuracy_score(&truth, &scores));
        }
    }

    for (name, metrics) in [
        ("baseline", &baseline_metrics),
        ("predictor", &predictor_metrics),
    ] {
        let (auc_mean, auc_std) = mean_std(&metrics[0]);
        let (ap_mean, ap_std) = mean_std(&metrics[1]);
        let (acc_mean, acc_std) = mean_std(&metrics[2]);
        println!(
            "{name}: auc {auc_mean:.4} ± {auc_std:.4} | ap {ap_mean:.4} ± {ap_std:.4} | acc {acc_mean:.4} ± {acc_std:.4}"
        );
    }
    Ok(())
}

fn validate_args(args: &TrainArgs) -> Result<(), Box<dyn Error>> {
    if args.train_samples == 0 || args.test_samples == 0 {
        return Err("sample counts must be positive".into());
    }
    if args.steps == 0 {
        return Err("steps must be positive".into());
    }
    if args.learning_rate <= 0.0 {
        return Err("learning rate must be positive".into());
    }
    if !args.tau.is_finite() || args.tau < 0.0 {
        return Err("tau must be a non-negative finite value".into());
    }
    Ok(())
}

fn positive_column(values: &[f32]) -> Vec<f32> {
    values.chunks(CLASS_COUNT).map(|row| row[1]).collect()
}

fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    (mean, variance.sqrt())
}
