//! Group and layer lookup over the layer tree
//!
//! Groups are found with a pre-order depth-first walk (a node, then its
//! children, then its next sibling) that stops at the first match. Leaves are
//! found with a first-match scan over one group's direct children.

use thiserror::Error;

use super::layer::{Layer, LayerKind};

/// Why a named slot could not be filled. Never fatal for a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("group '{name}' not found{}", inside(.parent))]
    GroupMissing {
        name: String,
        parent: Option<String>,
    },

    #[error("layer '{name}' not found in group '{group}'")]
    LayerMissing { name: String, group: String },

    #[error("layer '{name}' is a {found} layer, expected a {expected} layer")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

fn inside(parent: &Option<String>) -> String {
    match parent {
        Some(p) => format!(" inside '{}'", p),
        None => String::new(),
    }
}

/// First layer in depth-first order matching `predicate`
pub fn find_first<'a, P>(layers: &'a [Layer], predicate: &P) -> Option<&'a Layer>
where
    P: Fn(&Layer) -> bool,
{
    for layer in layers {
        if predicate(layer) {
            return Some(layer);
        }
        if let LayerKind::Group(children) = &layer.kind {
            if let Some(found) = find_first(children, predicate) {
                return Some(found);
            }
        }
    }
    None
}

/// Mutable counterpart of [`find_first`]
pub fn find_first_mut<'a, P>(layers: &'a mut [Layer], predicate: &P) -> Option<&'a mut Layer>
where
    P: Fn(&Layer) -> bool,
{
    for layer in layers.iter_mut() {
        if predicate(&*layer) {
            return Some(layer);
        }
        if let LayerKind::Group(children) = &mut layer.kind {
            if let Some(found) = find_first_mut(children, predicate) {
                return Some(found);
            }
        }
    }
    None
}

/// First group named `name`, searching `layers` and all their descendants
pub fn find_group<'a>(layers: &'a [Layer], name: &str) -> Option<&'a Layer> {
    find_first(layers, &|l: &Layer| l.is_group() && l.name == name)
}

pub fn find_group_mut<'a>(layers: &'a mut [Layer], name: &str) -> Option<&'a mut Layer> {
    find_first_mut(layers, &|l: &Layer| l.is_group() && l.name == name)
}

/// First direct child of `group` named `name`. Not recursive.
pub fn find_child<'a>(group: &'a Layer, name: &str) -> Option<&'a Layer> {
    group.children()?.iter().find(|l| l.name == name)
}

pub fn find_child_mut<'a>(group: &'a mut Layer, name: &str) -> Option<&'a mut Layer> {
    group.children_mut()?.iter_mut().find(|l| l.name == name)
}

/// [`find_group_mut`] with the miss turned into a [`SlotError`]
pub fn require_group_mut<'a>(
    layers: &'a mut [Layer],
    name: &str,
    parent: Option<&str>,
) -> Result<&'a mut Layer, SlotError> {
    find_group_mut(layers, name).ok_or_else(|| SlotError::GroupMissing {
        name: name.to_string(),
        parent: parent.map(str::to_string),
    })
}

/// Resolve a group nested inside another group (both found depth-first)
pub fn require_nested_group_mut<'a>(
    layers: &'a mut [Layer],
    outer: &str,
    inner: &str,
) -> Result<&'a mut Layer, SlotError> {
    let outer_group = require_group_mut(layers, outer, None)?;
    let children = outer_group.children_mut().unwrap_or_default();
    require_group_mut(children, inner, Some(outer))
}
