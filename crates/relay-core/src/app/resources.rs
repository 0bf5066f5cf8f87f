//! ResourceResolver - 参照リソースのフルネーム解決

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::ResourcePolicy;
use crate::domain::{RelayError, ResolvedResources, ResourceId, ResourceRefs};
use crate::ports::ProcessService;

#[derive(Clone)]
pub struct ResourceResolver {
    service: Arc<dyn ProcessService>,
    policy: ResourcePolicy,
}

impl ResourceResolver {
    pub fn new(service: Arc<dyn ProcessService>, policy: ResourcePolicy) -> Self {
        Self { service, policy }
    }

    /// Full names of the distinct resources `params` references, in lookup
    /// order. No references at all gives `ResolvedResources::None`.
    ///
    /// Ids the service does not know are dropped under
    /// `ResourcePolicy::Lenient` and fail under `ResourcePolicy::Strict`.
    pub async fn resolve<P>(&self, params: &P) -> Result<ResolvedResources, RelayError>
    where
        P: ResourceRefs + Sync + ?Sized,
    {
        let ids: BTreeSet<ResourceId> = params.resource_ids().into_iter().collect();
        if ids.is_empty() {
            return Ok(ResolvedResources::None);
        }

        let ids: Vec<ResourceId> = ids.into_iter().collect();
        let found = self.service.resources_by_ids(&ids).await?;

        let missing: Vec<ResourceId> = ids
            .iter()
            .filter(|id| !found.iter().any(|r| r.id == **id))
            .copied()
            .collect();
        if !missing.is_empty() {
            match self.policy {
                ResourcePolicy::Strict => return Err(RelayError::MissingResources(missing)),
                ResourcePolicy::Lenient => {
                    warn!(missing = ?missing, "dropping unresolved resources");
                }
            }
        }

        Ok(ResolvedResources::Names(
            found.into_iter().map(|r| r.full_name).collect(),
        ))
    }
}
