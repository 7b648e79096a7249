//! Builds the [`CommandTree`] from declared metadata.
//!
//! Each handler declares its id, aliases and the ids of its sub-commands.
//! Declarations are checked as a graph before anything is registered:
//! every id is present and unique, sub-command lists have no self or
//! repeated references, every referenced id exists, no command has two
//! parents and the parent/child edges contain no cycle. Registration then
//! walks from the roots.

use super::{Command, CommandProperties, CommandTree, NodeId};
use crate::error::RegistryError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

struct Declared {
    properties: CommandProperties,
    sub_commands: Vec<String>,
    handler: Arc<dyn Command>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Build the command tree for `commands`.
///
/// Any configuration problem is returned as an error; the caller is expected
/// to refuse to start.
pub fn build_tree(commands: Vec<Arc<dyn Command>>) -> Result<CommandTree, RegistryError> {
    let mut declared: Vec<Declared> = Vec::with_capacity(commands.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(commands.len());

    for (position, handler) in commands.into_iter().enumerate() {
        let metadata = handler.metadata();
        if metadata.id.trim().is_empty() {
            return Err(RegistryError::MissingId { index: position });
        }
        let (properties, sub_commands) = metadata.into_properties();
        if index.contains_key(&properties.id) {
            return Err(RegistryError::DuplicateId(properties.id));
        }

        let mut seen = HashSet::with_capacity(sub_commands.len());
        for child in &sub_commands {
            if *child == properties.id {
                return Err(RegistryError::SelfReference(properties.id));
            }
            if !seen.insert(child.as_str()) {
                return Err(RegistryError::DuplicateSubCommand {
                    parent: properties.id,
                    child: child.clone(),
                });
            }
        }

        index.insert(properties.id.clone(), declared.len());
        declared.push(Declared {
            properties,
            sub_commands,
            handler,
        });
    }

    let children = link(&declared, &index)?;
    if let Some(cycle) = find_cycle(&declared, &children) {
        return Err(RegistryError::Cycle(cycle));
    }

    let mut has_parent = vec![false; declared.len()];
    for child in children.iter().flatten() {
        has_parent[*child] = true;
    }

    let mut pending: Vec<Option<Declared>> = declared.into_iter().map(Some).collect();
    let mut stack: Vec<(usize, Option<NodeId>)> = (0..pending.len())
        .rev()
        .filter(|i| !has_parent[*i])
        .map(|i| (i, None))
        .collect();

    let mut tree = CommandTree::new();
    while let Some((slot, parent)) = stack.pop() {
        let Some(entry) = pending[slot].take() else {
            continue;
        };
        let node = tree.register(parent, entry.properties, entry.handler)?;
        for child in children[slot].iter().rev() {
            stack.push((*child, Some(node)));
        }
    }

    let leftover: Vec<String> = pending
        .into_iter()
        .flatten()
        .map(|d| d.properties.id)
        .collect();
    if !leftover.is_empty() {
        return Err(RegistryError::Unreachable(leftover));
    }

    debug!(commands = tree.len(), "Command tree built");
    Ok(tree)
}

/// Resolve sub-command ids to declaration slots.
fn link(
    declared: &[Declared],
    index: &HashMap<String, usize>,
) -> Result<Vec<Vec<usize>>, RegistryError> {
    let mut parent_of: HashMap<usize, usize> = HashMap::new();
    let mut children = Vec::with_capacity(declared.len());

    for (parent, entry) in declared.iter().enumerate() {
        let mut edges = Vec::with_capacity(entry.sub_commands.len());
        for child_id in &entry.sub_commands {
            let Some(&child) = index.get(child_id) else {
                return Err(RegistryError::UnknownSubCommand {
                    parent: entry.properties.id.clone(),
                    child: child_id.clone(),
                });
            };
            if let Some(&first) = parent_of.get(&child) {
                return Err(RegistryError::MultipleParents {
                    child: child_id.clone(),
                    first: declared[first].properties.id.clone(),
                    second: entry.properties.id.clone(),
                });
            }
            parent_of.insert(child, parent);
            edges.push(child);
        }
        children.push(edges);
    }

    Ok(children)
}

/// Depth-first search with in-progress marking; returns the ids along the
/// first cycle found, closing back on its start.
fn find_cycle(declared: &[Declared], children: &[Vec<usize>]) -> Option<Vec<String>> {
    let id = |slot: usize| declared[slot].properties.id.clone();
    let mut marks = vec![Mark::Unvisited; declared.len()];

    for start in 0..declared.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::InProgress;
        let mut stack = vec![(start, 0usize)];

        while let Some(top) = stack.last_mut() {
            let (slot, cursor) = *top;
            match children[slot].get(cursor) {
                Some(&child) => {
                    top.1 += 1;
                    match marks[child] {
                        Mark::Unvisited => {
                            marks[child] = Mark::InProgress;
                            stack.push((child, 0));
                        }
                        Mark::InProgress => {
                            let from = stack.iter().position(|(s, _)| *s == child).unwrap_or(0);
                            let mut cycle: Vec<String> =
                                stack[from..].iter().map(|(s, _)| id(*s)).collect();
                            cycle.push(id(child));
                            return Some(cycle);
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[slot] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }

    None
}
