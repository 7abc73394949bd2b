// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `inspect`
// and all their configurable flags.
//
// Defaults mirror TrainConfig::default(): ViT-Base geometry,
// 224×224 RGB inputs, 10 epochs, lr 2e-5, 80/20 user split.

use clap::{Args, Subcommand, ValueEnum};
use crate::application::train_use_case::{DeviceKind, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the vision transformer on a user manifest
    Train(TrainArgs),

    /// Show the interest vocabulary and the user split, without training
    Inspect(InspectArgs),
}

/// Backend selection on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DeviceArg {
    Wgpu,
    Cpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Wgpu => DeviceKind::Wgpu,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON manifest: array of { user_id, images: [{url}], interests: [..] }
    #[arg(long, default_value = "data/users.json")]
    pub manifest: String,

    /// Directory of preprocessed image tensors, one .safetensors per image url
    #[arg(long, default_value = "data/image_tensors")]
    pub images_dir: String,

    /// Name of the tensor inside each .safetensors file
    #[arg(long, default_value = "pixel_values")]
    pub tensor_name: String,

    /// Where weights, config and metrics.csv are written
    #[arg(long, default_value = "artifacts")]
    pub output_dir: String,

    /// Earlier run's model.mpk.gz (or a backbone-only record); only the backbone is loaded
    #[arg(long)]
    pub pretrained: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Share of USERS (not images) held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the user split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Sigmoid probability at or above which a tag counts as predicted
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f32,

    #[arg(long, default_value_t = 3)]
    pub channels: usize,

    /// Input height and width in pixels
    #[arg(long, default_value_t = 224)]
    pub image_size: usize,

    /// Square patch side; image_size must be a multiple of it
    #[arg(long, default_value_t = 16)]
    pub patch_size: usize,

    #[arg(long, default_value_t = 768)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 12)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 12)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network, typically 4x d_model
    #[arg(long, default_value_t = 3072)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            manifest:      a.manifest,
            images_dir:    a.images_dir,
            tensor_name:   a.tensor_name,
            output_dir:    a.output_dir,
            pretrained:    a.pretrained,
            epochs:        a.epochs,
            batch_size:    a.batch_size,
            lr:            a.lr,
            test_fraction: a.test_fraction,
            seed:          a.seed,
            threshold:     a.threshold,
            channels:      a.channels,
            image_size:    a.image_size,
            patch_size:    a.patch_size,
            d_model:       a.d_model,
            num_heads:     a.num_heads,
            num_layers:    a.num_layers,
            d_ff:          a.d_ff,
            dropout:       a.dropout,
            device:        a.device.into(),
        }
    }
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, default_value = "data/users.json")]
    pub manifest: String,

    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["interest-vit", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();

        assert_eq!(cfg.manifest, def.manifest);
        assert_eq!(cfg.epochs, def.epochs);
        assert_eq!(cfg.batch_size, def.batch_size);
        assert_eq!(cfg.lr, def.lr);
        assert_eq!(cfg.test_fraction, def.test_fraction);
        assert_eq!(cfg.seed, def.seed);
        assert_eq!(cfg.image_size, def.image_size);
        assert_eq!(cfg.d_model, def.d_model);
        assert_eq!(cfg.device, def.device);
        assert!(cfg.pretrained.is_none());
    }

    #[test]
    fn test_train_flags_override() {
        let cli = Cli::try_parse_from([
            "interest-vit", "train",
            "--epochs", "3",
            "--device", "cpu",
            "--pretrained", "weights/backbone",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.device, DeviceKind::Cpu);
        assert_eq!(cfg.pretrained.as_deref(), Some("weights/backbone"));
    }

    #[test]
    fn test_unknown_device_rejected() {
        assert!(Cli::try_parse_from(["interest-vit", "train", "--device", "tpu"]).is_err());
    }
}
