//! Namespace policy resolution
//!
//! Picks the one policy whose credentials serve a namespace. An exact name
//! always wins, then the first matching name pattern. Label selectors are
//! ranked by how many namespaces they match; the narrowest selector wins and
//! a tie on the narrowest is a conflict.

use super::namespaces::NamespaceLister;
use super::selector::LabelSelector;
use crate::domain::{Policy, PolicyKind};
use crate::errors::{Result, SyncError};
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct NamespacePolicyResolver {
    lister: Arc<dyn NamespaceLister>,
}

impl std::fmt::Debug for NamespacePolicyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacePolicyResolver").finish_non_exhaustive()
    }
}

/// Best label-selector candidate seen so far
struct Candidate<'a> {
    policy: &'a Policy,
    score: usize,
    tied_with: Option<&'a Policy>,
}

impl NamespacePolicyResolver {
    pub fn new(lister: Arc<dyn NamespaceLister>) -> Self {
        Self { lister }
    }

    pub async fn resolve(&self, policies: &[Policy], namespace: &str) -> Result<Policy> {
        let candidates: Vec<&Policy> =
            policies.iter().filter(|p| p.kind() == PolicyKind::Namespace).collect();

        if let Some(policy) = candidates.iter().find(|p| p.name() == Some(namespace)) {
            debug!(
                namespace = %namespace,
                client_id = %policy.client_id(),
                "Policy matched by name"
            );
            return Ok((*policy).clone());
        }

        for policy in &candidates {
            let Some(pattern) = policy.name_regex() else { continue };
            let regex = Regex::new(pattern)
                .map_err(|e| SyncError::invalid_selector(pattern, e.to_string()))?;
            if regex.is_match(namespace) {
                debug!(
                    namespace = %namespace,
                    client_id = %policy.client_id(),
                    pattern = %pattern,
                    "Policy matched by name pattern"
                );
                return Ok((*policy).clone());
            }
        }

        let mut best: Option<Candidate<'_>> = None;
        for policy in candidates.iter().copied() {
            let Some(selector) = policy.label_selector() else { continue };
            let selector = LabelSelector::parse(selector)?;
            let matched = self.lister.list_namespaces(&selector).await?;
            if !matched.iter().any(|ns| ns == namespace) {
                continue;
            }

            let score = matched.len();
            best = match best.take() {
                Some(mut current) if score == current.score => {
                    current.tied_with = Some(policy);
                    Some(current)
                }
                Some(current) if score > current.score => Some(current),
                _ => Some(Candidate { policy, score, tied_with: None }),
            };
        }

        match best {
            Some(Candidate { policy, tied_with: Some(other), .. }) => {
                Err(SyncError::PolicyConflict {
                    namespace: namespace.to_string(),
                    client_id: other.client_id().to_string(),
                    selector: other.label_selector().unwrap_or_default().to_string(),
                    other_client_id: policy.client_id().to_string(),
                    other_selector: policy.label_selector().unwrap_or_default().to_string(),
                })
            }
            Some(Candidate { policy, score, .. }) => {
                debug!(
                    namespace = %namespace,
                    client_id = %policy.client_id(),
                    score = score,
                    "Policy matched by label selector"
                );
                Ok(policy.clone())
            }
            None => Err(SyncError::no_policy(namespace)),
        }
    }
}
