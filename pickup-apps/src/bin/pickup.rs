use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use pickup_apps::{utils, PickupConfig};
use pickup_sequencer::TerminationPolicy;
use tracing::{info, warn};

const DEFAULT_MAX_PASSES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TerminationPolicyKind {
    SinglePass,
    PollUntilEmpty,
}

/// Picks up every detected object and drops it at the disposal configuration.
#[derive(Parser, Debug)]
#[clap(name = env!("CARGO_BIN_NAME"))]
struct Args {
    /// Path to the setting file.
    #[clap(short, long, value_parser)]
    config_path: Option<PathBuf>,
    /// Operator name, overrides `[session]` of the setting file.
    #[clap(long)]
    operator_name: Option<String>,
    /// Operator ID, overrides `[session]` of the setting file.
    #[clap(long)]
    operator_id: Option<String>,
    #[clap(long, value_enum)]
    termination_policy: Option<TerminationPolicyKind>,
    /// Limit of drained snapshots with `--termination-policy poll-until-empty`.
    #[clap(long)]
    max_passes: Option<usize>,
    /// Writes JSON logs of every event to this directory.
    #[clap(long, value_parser)]
    log_directory: Option<PathBuf>,
    /// Prints the default setting as TOML.
    #[clap(long)]
    show_default_config: bool,
}

impl Args {
    fn apply_termination_policy(&self, config: &mut PickupConfig) {
        let current_max_passes = match config.sequencer.termination_policy {
            TerminationPolicy::PollUntilEmpty { max_passes } => Some(max_passes),
            TerminationPolicy::SinglePass => None,
        };
        let poll_until_empty = match self.termination_policy {
            Some(kind) => kind == TerminationPolicyKind::PollUntilEmpty,
            None => current_max_passes.is_some() || self.max_passes.is_some(),
        };
        config.sequencer.termination_policy = if poll_until_empty {
            TerminationPolicy::PollUntilEmpty {
                max_passes: self
                    .max_passes
                    .or(current_max_passes)
                    .unwrap_or(DEFAULT_MAX_PASSES),
            }
        } else {
            TerminationPolicy::SinglePass
        };
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = utils::init_tracing(args.log_directory.as_deref());
    info!("ParsedArgs {args:?}");

    if args.show_default_config {
        print!("{}", toml::to_string(&PickupConfig::default())?);
        return Ok(());
    }

    let mut config = match utils::get_config_path(args.config_path.clone()) {
        Some(path) => PickupConfig::try_new(path)?,
        None => PickupConfig::default(),
    };
    args.apply_termination_policy(&mut config);
    config.validate()?;
    let session = config.resolve_session(args.operator_name.clone(), args.operator_id.clone())?;

    let pickup = config.create_pickup()?;
    let cancel = pickup.sequencer.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, canceling");
            cancel.cancel();
        }
    });

    let report = pickup.sequencer.run(&session).await?;
    for (index, object) in report.objects.iter().enumerate() {
        match &object.error {
            None => info!(index, position = ?object.position, "disposed"),
            Some(e) => warn!(index, position = ?object.position, "skipped: {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args() {
        let bin = env!("CARGO_BIN_NAME");
        assert!(Args::try_parse_from([bin]).is_ok());
        assert!(Args::try_parse_from([bin, "--show-default-config"]).is_ok());
        assert!(Args::try_parse_from([
            bin,
            "--config-path",
            "path",
            "--operator-name",
            "Doe, Jane",
            "--operator-id",
            "42",
            "--termination-policy",
            "poll-until-empty",
        ])
        .is_ok());
        assert!(Args::try_parse_from([bin, "--termination-policy", "forever"]).is_err());
    }

    #[test]
    fn termination_policy_override() {
        let bin = env!("CARGO_BIN_NAME");
        let mut config = PickupConfig::default();
        Args::try_parse_from([bin, "--termination-policy", "poll-until-empty"])
            .unwrap()
            .apply_termination_policy(&mut config);
        assert_eq!(
            config.sequencer.termination_policy,
            TerminationPolicy::PollUntilEmpty {
                max_passes: DEFAULT_MAX_PASSES
            }
        );

        Args::try_parse_from([bin, "--max-passes", "3"])
            .unwrap()
            .apply_termination_policy(&mut config);
        assert_eq!(
            config.sequencer.termination_policy,
            TerminationPolicy::PollUntilEmpty { max_passes: 3 }
        );

        Args::try_parse_from([bin])
            .unwrap()
            .apply_termination_policy(&mut config);
        assert_eq!(
            config.sequencer.termination_policy,
            TerminationPolicy::PollUntilEmpty { max_passes: 3 }
        );

        Args::try_parse_from([bin, "--max-passes", "0"])
            .unwrap()
            .apply_termination_policy(&mut config);
        assert!(config.validate().is_err());

        Args::try_parse_from([bin, "--termination-policy", "single-pass"])
            .unwrap()
            .apply_termination_policy(&mut config);
        assert_eq!(
            config.sequencer.termination_policy,
            TerminationPolicy::SinglePass
        );
    }
}
