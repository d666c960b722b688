//! Reset tree - which layers a prestige resets
//!
//! Nodes form a forest through `parent` links, with a row `rank` each.
//! Undirected branch edges connect any two nodes regardless of rank. A reset
//! collects its targets first, dedupes them by layer id, and only then clears
//! manifests, so every target is reset exactly once.

use crate::error::{Error, Result};
use crate::{Decimal, LayerId, LayerRegistry, Resource, Tracker};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// How a reset spreads from the resetting node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadePolicy {
    /// Higher-ranked nodes built on this one: hierarchy descendants and
    /// nodes joined by a branch edge to this node, with their descendants
    DownstreamByRank,
    /// Everything reachable through hierarchy and branch edges, any rank
    ConnectedComponent,
}

/// A layer's place in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub layer_id: LayerId,
    /// Row in the tree, zero at the top
    pub rank: u32,
    pub parent: Option<LayerId>,
}

impl TreeNode {
    pub fn root(layer_id: impl Into<LayerId>, rank: u32) -> Self {
        Self {
            layer_id: layer_id.into(),
            rank,
            parent: None,
        }
    }

    pub fn child(layer_id: impl Into<LayerId>, rank: u32, parent: impl Into<LayerId>) -> Self {
        Self {
            layer_id: layer_id.into(),
            rank,
            parent: Some(parent.into()),
        }
    }
}

/// What a reset touched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetReport {
    pub resetting: LayerId,
    pub policy: CascadePolicy,
    /// Targets in visit order; `reset` lists the resetting node first
    pub targets: Vec<LayerId>,
    /// Labels cleared per target; empty manifests are listed with no labels
    pub cleared: Vec<(LayerId, Vec<String>)>,
}

struct Reseed {
    pool: Resource,
    tracker: Option<Tracker>,
    seed: Box<dyn Fn(&LayerId) -> Decimal>,
}

/// Forest of layer nodes plus branch edges
#[derive(Default)]
pub struct ResetTree {
    nodes: IndexMap<LayerId, TreeNode>,
    branches: Vec<(LayerId, LayerId)>,
    reseed: Option<Reseed>,
}

impl ResetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; its parent must already be present
    pub fn add_node(&mut self, node: TreeNode) -> Result<()> {
        if self.nodes.contains_key(&node.layer_id) {
            return Err(Error::DuplicateNode(node.layer_id));
        }
        if let Some(parent) = &node.parent {
            if !self.nodes.contains_key(parent) {
                return Err(Error::UnknownParent {
                    parent: parent.clone(),
                    child: node.layer_id,
                });
            }
        }
        self.nodes.insert(node.layer_id.clone(), node);
        Ok(())
    }

    /// Join two nodes with an undirected branch edge
    pub fn add_branch(&mut self, a: impl Into<LayerId>, b: impl Into<LayerId>) -> Result<()> {
        let (a, b) = (a.into(), b.into());
        for id in [&a, &b] {
            if !self.nodes.contains_key(id) {
                return Err(Error::NodeNotFound(id.clone()));
            }
        }
        self.branches.push((a, b));
        Ok(())
    }

    /// After every reset, set `pool` (and its tracker) to `seed(resetting node)`
    pub fn with_reseed(
        mut self,
        pool: &Resource,
        tracker: Option<&Tracker>,
        seed: impl Fn(&LayerId) -> Decimal + 'static,
    ) -> Self {
        self.reseed = Some(Reseed {
            pool: pool.clone(),
            tracker: tracker.cloned(),
            seed: Box::new(seed),
        });
        self
    }

    pub fn node(&self, id: &LayerId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    pub fn branches(&self) -> &[(LayerId, LayerId)] {
        &self.branches
    }

    fn children<'a>(&'a self, id: &'a LayerId) -> impl Iterator<Item = &'a LayerId> + 'a {
        self.nodes
            .values()
            .filter(move |node| node.parent.as_ref() == Some(id))
            .map(|node| &node.layer_id)
    }

    fn branch_neighbors<'a>(&'a self, id: &'a LayerId) -> impl Iterator<Item = &'a LayerId> + 'a {
        self.branches.iter().filter_map(move |(a, b)| {
            if a == id {
                Some(b)
            } else if b == id {
                Some(a)
            } else {
                None
            }
        })
    }

    /// Nodes a reset of `id` spreads to, not including `id` itself
    pub fn cascade(&self, id: &LayerId, policy: CascadePolicy) -> Result<Vec<LayerId>> {
        let origin = self
            .nodes
            .get(id)
            .ok_or_else(|| Error::NodeNotFound(id.clone()))?;

        let mut visited: IndexSet<&LayerId> = IndexSet::new();
        visited.insert(id);
        let mut queue: VecDeque<&LayerId> = VecDeque::new();

        match policy {
            CascadePolicy::DownstreamByRank => {
                let above = |candidate: &LayerId| {
                    self.nodes
                        .get(candidate)
                        .map_or(false, |node| node.rank > origin.rank)
                };
                for seed in self.children(id).chain(self.branch_neighbors(id)) {
                    if above(seed) && visited.insert(seed) {
                        queue.push_back(seed);
                    }
                }
                while let Some(current) = queue.pop_front() {
                    for child in self.children(current) {
                        if above(child) && visited.insert(child) {
                            queue.push_back(child);
                        }
                    }
                }
            }
            CascadePolicy::ConnectedComponent => {
                queue.push_back(id);
                while let Some(current) = queue.pop_front() {
                    let parent = self
                        .nodes
                        .get(current)
                        .and_then(|node| node.parent.as_ref());
                    let neighbors = self
                        .children(current)
                        .chain(parent)
                        .chain(self.branch_neighbors(current));
                    for next in neighbors {
                        if visited.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }
        }

        Ok(visited.into_iter().skip(1).cloned().collect())
    }

    /// The resetting node followed by its cascade, each once
    pub fn targets(&self, id: &LayerId, policy: CascadePolicy) -> Result<Vec<LayerId>> {
        let mut targets = vec![id.clone()];
        targets.extend(self.cascade(id, policy)?);
        Ok(targets)
    }

    /// Reset `id` and everything its cascade reaches
    ///
    /// Tree nodes without a registered layer are skipped with a warning.
    pub fn reset(
        &self,
        registry: &LayerRegistry,
        id: &LayerId,
        policy: CascadePolicy,
    ) -> Result<ResetReport> {
        let targets = self.targets(id, policy)?;
        Ok(self.apply(registry, id, policy, targets))
    }

    /// Reset only what the cascade of `id` reaches, then reseed
    ///
    /// This is what a reset button does after converting: the resetting
    /// layer keeps the currency it just gained.
    pub fn reset_cascade(
        &self,
        registry: &LayerRegistry,
        id: &LayerId,
        policy: CascadePolicy,
    ) -> Result<ResetReport> {
        let targets = self.cascade(id, policy)?;
        Ok(self.apply(registry, id, policy, targets))
    }

    fn apply(
        &self,
        registry: &LayerRegistry,
        id: &LayerId,
        policy: CascadePolicy,
        targets: Vec<LayerId>,
    ) -> ResetReport {
        tracing::debug!(layer = %id, ?policy, targets = targets.len(), "reset cascade");

        let mut cleared = Vec::with_capacity(targets.len());
        for target in &targets {
            match registry.get(target) {
                Some(layer) => cleared.push((target.clone(), layer.reset())),
                None => tracing::warn!(layer = %target, "reset target has no registered layer"),
            }
        }

        if let Some(reseed) = &self.reseed {
            let value = (reseed.seed)(id);
            reseed.pool.set(value);
            if let Some(tracker) = &reseed.tracker {
                tracker.reseed(value);
            }
            tracing::debug!(pool = reseed.pool.name(), value = %value, "pool reseeded");
        }

        ResetReport {
            resetting: id.clone(),
            policy,
            targets,
            cleared,
        }
    }

    /// Reset every registered layer, visibility latches included
    pub fn hard_reset(&self, registry: &LayerRegistry) -> Vec<(LayerId, Vec<String>)> {
        tracing::debug!(layers = registry.len(), "hard reset");
        let cleared = registry
            .iter()
            .map(|layer| (layer.id().clone(), layer.hard_reset()))
            .collect();
        if let Some(reseed) = &self.reseed {
            reseed.pool.reset();
            if let Some(tracker) = &reseed.tracker {
                crate::Resettable::reset(tracker);
            }
        }
        cleared
    }
}

impl fmt::Debug for ResetTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetTree")
            .field("nodes", &self.nodes)
            .field("branches", &self.branches)
            .field("reseeds", &self.reseed.as_ref().map(|r| r.pool.name()))
            .finish()
    }
}
