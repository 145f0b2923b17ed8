//! Two-way lookup between physics bodies and logical sequence positions.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::body::{BodyId, GroupId};
use crate::chain::{ChainHandles, ChainTopology, Role};
use crate::float::Float;

#[derive(Copy, Clone, Debug)]
struct Entry {
    index: Option<usize>,
    group: Option<GroupId>,
    role: Role,
}

#[derive(Clone, Debug)]
struct Group {
    /// Lowest logical index among the members.
    index: Option<usize>,
    representative: BodyId,
    members: Vec<BodyId>,
}

/// Maps [`BodyId`]s to logical indices, groups and roles, and back.
///
/// Built from one instantiated topology; a rebuild replaces it wholesale,
/// so ids and indices from the old topology never resolve.
#[derive(Clone, Debug, Default)]
pub struct IndexMapper {
    by_index: Vec<Option<BodyId>>,
    by_body: HashMap<BodyId, Entry>,
    groups: HashMap<GroupId, Group>,
}

impl IndexMapper {
    pub fn new<F: Float>(topology: &ChainTopology<F>, handles: &ChainHandles) -> Self {
        let mut slots: Vec<Option<BodyId>> = Vec::new();
        slots.resize(topology.logical_count, None);
        let mut by_body = HashMap::with_capacity(topology.bodies.len());
        let mut groups: HashMap<GroupId, Group> = HashMap::new();
        let representative = topology.terminal_shape.representative();

        for (spec, &body) in topology.bodies.iter().zip(&handles.bodies) {
            let index = spec.desc.logical_index;
            let group = spec.desc.group;
            by_body.insert(body, Entry { index, group, role: spec.role });

            if let Some(i) = index {
                let preferred = matches!(spec.role, Role::Terminal { piece } if piece == representative);
                if let Some(slot) = slots.get_mut(i) {
                    if slot.is_none() || preferred {
                        *slot = Some(body);
                    }
                }
            }

            if let Some(g) = group {
                let entry = groups.entry(g).or_insert_with(|| Group {
                    index: None,
                    representative: body,
                    members: Vec::new(),
                });
                entry.members.push(body);
                entry.index = match (entry.index, index) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                if matches!(spec.role, Role::Terminal { piece } if piece == representative) {
                    entry.representative = body;
                }
            }
        }

        IndexMapper {
            by_index: slots,
            by_body,
            groups,
        }
    }

    /// Number of logical positions.
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    /// The body's own logical index.
    pub fn index_of(&self, body: BodyId) -> Option<usize> {
        self.by_body.get(&body).and_then(|e| e.index)
    }

    /// The body that stands for `index`; a group's representative piece
    /// when the whole group shares it.
    pub fn body_for(&self, index: usize) -> Option<BodyId> {
        self.by_index.get(index).copied().flatten()
    }

    pub fn group_of(&self, body: BodyId) -> Option<GroupId> {
        self.by_body.get(&body).and_then(|e| e.group)
    }

    pub fn role_of(&self, body: BodyId) -> Option<Role> {
        self.by_body.get(&body).map(|e| e.role)
    }

    /// Index reported when `body` is clicked: grouped pieces resolve to
    /// their group's index.
    pub fn click_index(&self, body: BodyId) -> Option<usize> {
        match self.group_of(body) {
            Some(group) => self.group_index(group),
            None => self.index_of(body),
        }
    }

    pub fn group_index(&self, group: GroupId) -> Option<usize> {
        self.groups.get(&group).and_then(|g| g.index)
    }

    pub fn group_representative(&self, group: GroupId) -> Option<BodyId> {
        self.groups.get(&group).map(|g| g.representative)
    }

    pub fn group_members(&self, group: GroupId) -> &[BodyId] {
        self.groups.get(&group).map(|g| g.members.as_slice()).unwrap_or(&[])
    }

    /// True if `body` shows as highlighted when `index` is selected. Groups
    /// light up as a whole when any member carries the index.
    pub fn is_selected(&self, body: BodyId, index: usize) -> bool {
        match self.group_of(body) {
            Some(group) => self
                .group_members(group)
                .iter()
                .any(|&member| self.index_of(member) == Some(index)),
            None => self.index_of(body) == Some(index),
        }
    }
}
