// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and hands everything else to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    fine-tunes the ViT and prints accuracy + charts
//   2. `inspect`  prints the vocabulary and user split only

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "interest-vit",
    version = "0.1.0",
    about = "Fine-tune a vision transformer to tag user images with interests."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case. No computation here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training from manifest: {}", args.manifest);

    let use_case = TrainUseCase::new(args.into());
    use_case.execute()?;

    println!("Training complete. Weights saved.");
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;
    use crate::data::loader::JsonManifestLoader;

    let source   = JsonManifestLoader::new(&args.manifest);
    let use_case = InspectUseCase::new(source, args.test_fraction, args.seed);
    let summary  = use_case.execute()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Interest vocabulary ({} tags):", summary.vocabulary.len());
    for (idx, (tag, count)) in summary.vocabulary.iter().zip(&summary.label_counts).enumerate() {
        println!("  {idx:>4}: {tag:<24} {count} images");
    }
    println!(
        "\nTrain: {} users / {} images",
        summary.train_users.len(),
        summary.train_images
    );
    println!(
        "Test:  {} users / {} images",
        summary.test_users.len(),
        summary.test_images
    );
    println!("Test users: {}", summary.test_users.join(", "));
    Ok(())
}
