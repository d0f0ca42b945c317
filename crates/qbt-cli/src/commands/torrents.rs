//! `torrent remove`: resolve selectors on the daemon and delete the matches in batches.

use std::num::NonZeroUsize;

use anyhow::Error;
use qbt_client::{ALL_HASHES, QbitClient};
use qbt_core::{
    BatchSummary, RemoveTorrents, SelectionCriteria, TargetSet, TorrentInspector, TorrentRemover,
    plan_batches, run_batched, select_targets,
};
use tracing::{debug, info};

use crate::cli::TorrentRemoveArgs;
use crate::client::{AppContext, CliError, CliResult, connection_failed};

/// Everything the removal flow needs once flags are parsed.
#[derive(Debug, Clone)]
pub(crate) struct RemovalRequest {
    pub(crate) criteria: SelectionCriteria,
    pub(crate) options: RemoveTorrents,
    pub(crate) dry_run: bool,
    pub(crate) batch_size: NonZeroUsize,
}

impl From<&TorrentRemoveArgs> for RemovalRequest {
    fn from(args: &TorrentRemoveArgs) -> Self {
        Self {
            criteria: args.criteria(),
            options: args.options(),
            dry_run: args.dry_run,
            batch_size: args.batch_size,
        }
    }
}

/// How a removal run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RemovalOutcome {
    /// Selection matched nothing; the daemon was not touched.
    NothingToRemove,
    /// Dry run; `batches` delete requests would have been sent.
    DryRun { batches: usize },
    /// Every batch was accepted.
    Removed(BatchSummary),
}

pub(crate) async fn handle_torrent_remove(
    ctx: &AppContext,
    args: &TorrentRemoveArgs,
) -> CliResult<()> {
    let request = RemovalRequest::from(args);
    let client = QbitClient::connect(ctx.daemon.clone())
        .await
        .map_err(connection_failed)?;

    match remove_torrents(&client, &request).await? {
        RemovalOutcome::NothingToRemove => debug!("daemon left untouched"),
        RemovalOutcome::DryRun { batches } => debug!(batches, "dry run finished"),
        RemovalOutcome::Removed(summary) => debug!(
            batches = summary.batches,
            items = summary.items,
            "delete batches applied"
        ),
    }
    Ok(())
}

/// Select targets on `daemon` and, unless this is a dry run, delete them batch by batch.
pub(crate) async fn remove_torrents<D>(
    daemon: &D,
    request: &RemovalRequest,
) -> CliResult<RemovalOutcome>
where
    D: TorrentInspector + TorrentRemover + ?Sized,
{
    let targets = select_targets(daemon, &request.criteria)
        .await
        .map_err(|err| {
            if err.client_error().is_connection() {
                connection_failed(err)
            } else {
                CliError::failure(err)
            }
        })?;

    if targets.is_empty() {
        info!("No torrents found to remove");
        return Ok(RemovalOutcome::NothingToRemove);
    }

    let scope = describe(&targets);
    let hashes = wire_hashes(&targets);

    if request.dry_run {
        let batches = plan_batches(hashes.len(), request.batch_size).count();
        info!(batches, "dry-run: {scope} to be removed");
        return Ok(RemovalOutcome::DryRun { batches });
    }

    info!("{scope} to be removed");
    let options = request.options;
    let hashes = hashes.as_slice();
    let summary = run_batched(hashes.len(), request.batch_size, move |range| {
        daemon.delete(&hashes[range], options)
    })
    .await
    .map_err(|err| CliError::failure(Error::new(err).context("could not delete torrents")))?;

    info!("successfully removed {scope}");
    Ok(RemovalOutcome::Removed(summary))
}

/// Hash list as sent on the wire; `All` collapses to the daemon's single `all` token.
fn wire_hashes(targets: &TargetSet) -> Vec<String> {
    match targets {
        TargetSet::All => vec![ALL_HASHES.to_string()],
        TargetSet::Hashes(hashes) => hashes.iter().cloned().collect(),
    }
}

fn describe(targets: &TargetSet) -> String {
    targets.len().map_or_else(
        || "all torrents".to_string(),
        |count| format!("({count}) torrents"),
    )
}
