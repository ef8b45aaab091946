use crate::{
    argocd::{AutomatedSync, SyncPolicy},
    config::InstanceConfig,
};
use itertools::Itertools;

pub(crate) const CREATE_NAMESPACE: &str = "CreateNamespace=true";

/// Automated sync with prune and self-heal on unless the config says
/// otherwise. Sync options always lead with [`CREATE_NAMESPACE`].
pub(crate) fn build(config: &InstanceConfig) -> SyncPolicy {
    SyncPolicy {
        automated: AutomatedSync {
            prune: config.prune.unwrap_or(true),
            self_heal: config.self_heal.unwrap_or(true),
        },
        sync_options: std::iter::once(CREATE_NAMESPACE.to_owned())
            .chain(config.sync_options.iter().cloned())
            .unique()
            .collect(),
        retry: config.retry.clone().filter(|retry| !retry.is_null()),
    }
}
