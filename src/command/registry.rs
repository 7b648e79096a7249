//! Arena-backed command tree.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]. Each
//! node keeps an alias map for its own children, while the tree keeps global
//! id and alias indexes so uniqueness is checked once, at registration.

use super::{Command, CommandProperties};
use crate::error::RegistryError;
use opbot_proto::Arguments;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Index of a node in its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// A registered command: properties, handler and position in the tree.
pub struct CommandNode {
    pub properties: Arc<CommandProperties>,
    pub handler: Arc<dyn Command>,
    parent: Option<NodeId>,
    children: HashMap<String, NodeId>,
    child_order: Vec<NodeId>,
}

impl CommandNode {
    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in registration order.
    pub fn children(&self) -> &[NodeId] {
        &self.child_order
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("id", &self.properties.id)
            .field("aliases", &self.properties.aliases)
            .field("parent", &self.parent)
            .field("children", &self.child_order)
            .finish()
    }
}

/// Result of walking the tree with an invocation.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub id: NodeId,
    pub node: &'a CommandNode,
    /// Arguments positioned at the matched alias; the remainder is what the
    /// command receives.
    pub args: Arguments,
    /// Aliases consumed from the root down to the match.
    pub path: Vec<String>,
}

/// The command tree.
///
/// Mutated only through [`CommandTree::register`] while it is being built;
/// afterwards it is shared behind an `Arc` and read concurrently.
#[derive(Debug, Default)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    roots: HashMap<String, NodeId>,
    root_order: Vec<NodeId>,
    ids: HashMap<String, NodeId>,
    aliases: HashMap<String, NodeId>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `parent` (or at the root).
    ///
    /// Fails without modifying the tree if the id or any alias is already
    /// taken anywhere in the tree, or if an alias is empty or contains
    /// whitespace.
    pub fn register(
        &mut self,
        parent: Option<NodeId>,
        properties: CommandProperties,
        handler: Arc<dyn Command>,
    ) -> Result<NodeId, RegistryError> {
        if self.ids.contains_key(&properties.id) {
            return Err(RegistryError::DuplicateId(properties.id));
        }

        let limits = &properties.rate_limits;
        if limits.tokens == 0 || limits.period.is_zero() {
            return Err(RegistryError::InvalidRateLimit(properties.id));
        }

        for alias in &properties.aliases {
            if alias.is_empty() || alias.contains(char::is_whitespace) {
                return Err(RegistryError::InvalidAlias {
                    alias: alias.clone(),
                    id: properties.id.clone(),
                });
            }
            if let Some(existing) = self.aliases.get(alias) {
                return Err(RegistryError::DuplicateAlias {
                    alias: alias.clone(),
                    id: properties.id.clone(),
                    existing: self.nodes[existing.0].properties.id.clone(),
                });
            }
        }

        if let Some(p) = parent
            && p.0 >= self.nodes.len()
        {
            return Err(RegistryError::UnknownSubCommand {
                parent: format!("#{}", p.0),
                child: properties.id,
            });
        }

        let id = NodeId(self.nodes.len());
        info!(
            command = %properties.id,
            aliases = ?properties.aliases,
            parent = parent.map(|p| self.nodes[p.0].properties.id.as_str()),
            "Registering command"
        );

        for alias in &properties.aliases {
            self.aliases.insert(alias.clone(), id);
            match parent {
                Some(p) => {
                    self.nodes[p.0].children.insert(alias.clone(), id);
                }
                None => {
                    self.roots.insert(alias.clone(), id);
                }
            }
        }
        match parent {
            Some(p) => self.nodes[p.0].child_order.push(id),
            None => self.root_order.push(id),
        }
        self.ids.insert(properties.id.clone(), id);
        self.nodes.push(CommandNode {
            properties: Arc::new(properties),
            handler,
            parent,
            children: HashMap::new(),
            child_order: Vec::new(),
        });

        Ok(id)
    }

    /// Walk from the root, one alias per level, and return the deepest match.
    pub fn resolve(&self, args: &Arguments) -> Option<Resolved<'_>> {
        self.resolve_from(None, args)
    }

    /// Like [`resolve`](Self::resolve) but starting below `start`.
    pub fn resolve_from(&self, start: Option<NodeId>, args: &Arguments) -> Option<Resolved<'_>> {
        let mut level = match start {
            Some(id) => &self.nodes.get(id.0)?.children,
            None => &self.roots,
        };
        let mut current = args.clone();
        let mut path = Vec::new();
        let mut best = None;

        while !current.is_empty() {
            let Some(&id) = level.get(current.alias()) else {
                break;
            };
            path.push(current.alias().to_owned());
            let next = current.next();
            best = Some((id, current, path.clone()));
            level = &self.nodes[id.0].children;
            current = next;
        }

        best.map(|(id, args, path)| Resolved {
            id,
            node: &self.nodes[id.0],
            args,
            path,
        })
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode> {
        self.nodes.get(id.0)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&CommandNode> {
        self.ids.get(id).map(|n| &self.nodes[n.0])
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<&CommandNode> {
        self.aliases.get(alias).map(|n| &self.nodes[n.0])
    }

    /// Root commands in registration order.
    pub fn top_level(&self) -> impl Iterator<Item = &CommandNode> {
        self.root_order.iter().map(|id| &self.nodes[id.0])
    }

    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = &CommandNode> {
        self.nodes
            .get(id.0)
            .map(|n| n.child_order.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|c| &self.nodes[c.0])
    }

    /// Primary aliases from the root down to `id`.
    pub fn path_of(&self, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cursor = self.nodes.get(id.0);
        while let Some(node) = cursor {
            path.push(node.properties.primary_alias());
            cursor = node.parent.and_then(|p| self.nodes.get(p.0));
        }
        path.reverse();
        path
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CommandNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
