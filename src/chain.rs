//! Rosary chain topology: an anchor, a closed loop of beads, a tail, and a
//! terminal composite (the cross), built as plain data and then loaded into
//! a [`World`].
//!
//! Layout, in screen coordinates (+y down):
//!
//! - the anchor sits at `center - (0, radius)`, the top of the loop circle;
//! - loop bead `i` sits on the circle at `(i + 1) * 360° / (loop_count + 1)`
//!   clockwise from the top, so slot 0 belongs to the anchor;
//! - tail bead `j` hangs `(j + 1) * base_segment_length` below the anchor;
//! - the cross's top piece sits one segment below the last tail bead.
//!
//! Logical indices follow the chain from the cross: cross, tail (cross end
//! first), anchor, then the loop in placement order.
//!
//! Beads are laid out evenly, not at their rest lengths, so doubled loop
//! links and long tail links start stretched. A fresh chain springs into
//! shape over its first second and is at rest within about two.

use alloc::vec::Vec;

use tracing::debug;

use crate::body::{BodyDesc, BodyId, GroupId, Material, Shape};
use crate::constraint::{Anchor, ConstraintId, DistanceConstraint, LinkKind};
use crate::error::{BuildError, WorldError};
use crate::float::Float;
use crate::vec::Vec2;
use crate::world::World;

/// Upper bound on bodies in one topology.
pub const MAX_BODIES: usize = 1024;

/// Group id given to the terminal composite.
pub const TERMINAL_GROUP: GroupId = GroupId(0);

/// Cross layout in piece-size units: a column of four with arms on the
/// second row. Piece 1 is where the beams cross.
const CROSS_CELLS: [(i32, i32); 6] = [(0, 0), (0, 1), (-1, 1), (1, 1), (0, 2), (0, 3)];

/// Piece pairs linked to hold the cross rigid.
const CROSS_LINKS: [(usize, usize); 12] = [
    (0, 1), (1, 2), (1, 3), (1, 4), (4, 5),
    (0, 2), (0, 3), (2, 4), (3, 4), (2, 3), (0, 4), (1, 5),
];

/// What part of the chain a body belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Anchor,
    /// `marker` beads close a decade and sit between doubled links.
    Loop { position: usize, marker: bool },
    /// `position` counts from the anchor.
    Tail { position: usize },
    Terminal { piece: usize },
}

/// How the terminal composite is numbered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminalNumbering {
    /// The whole composite is logical index 0.
    Group,
    /// Pieces are indices 0..K-1.
    PerPiece,
}

/// Shape of the terminal composite.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminalShape {
    /// Six square pieces in a Latin cross.
    Cross,
    /// One square piece.
    Single,
}

impl TerminalShape {
    fn cells(self) -> &'static [(i32, i32)] {
        match self {
            TerminalShape::Cross => &CROSS_CELLS,
            TerminalShape::Single => &CROSS_CELLS[..1],
        }
    }

    fn links(self) -> &'static [(usize, usize)] {
        match self {
            TerminalShape::Cross => &CROSS_LINKS,
            TerminalShape::Single => &[],
        }
    }

    /// Piece used as the composite's representative.
    pub fn representative(self) -> usize {
        match self {
            TerminalShape::Cross => 1,
            TerminalShape::Single => 0,
        }
    }

    pub fn piece_count(self) -> usize {
        self.cells().len()
    }
}

/// Where links attach to beads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttachMode {
    /// Bead centres; rest lengths are centre to centre.
    Center,
    /// The bead surface facing the neighbour; rest lengths are surface gaps.
    Pole,
}

/// Inputs to [`build`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainParams<F: Float> {
    pub center: Vec2<F>,
    pub radius: F,
    pub loop_count: usize,
    pub tail_count: usize,
    pub base_segment_length: F,
    /// Loop links `k * interval - 1` and `k * interval` are doubled. 0 disables.
    pub decade_interval: usize,
    /// Rest length multipliers for tail links, from the anchor outwards.
    /// Links past the end of the table use 1. Tail beads are still laid out
    /// one segment apart.
    pub tail_link_scale: Vec<F>,
    pub bead_radius: F,
    pub marker_radius: F,
    pub anchor_radius: F,
    /// Side length of one terminal piece.
    pub piece_size: F,
    pub terminal_shape: TerminalShape,
    pub terminal_numbering: TerminalNumbering,
    pub attach: AttachMode,
    pub pin_anchor: bool,
    pub bead_mass: F,
    pub anchor_mass: F,
    pub piece_mass: F,
    pub bead_material: Material<F>,
    pub anchor_material: Material<F>,
    pub terminal_material: Material<F>,
    pub link_stiffness: F,
    pub link_damping: F,
    pub composite_stiffness: F,
}

impl<F: Float> Default for ChainParams<F> {
    /// Five decades with four marker beads, and a five-bead tail.
    fn default() -> Self {
        ChainParams {
            center: Vec2::new(F::from_f32(400.0), F::from_f32(320.0)),
            radius: F::from_f32(180.0),
            loop_count: 54,
            tail_count: 5,
            base_segment_length: F::from_f32(20.0),
            decade_interval: 11,
            tail_link_scale: [2.0, 2.0, 1.0, 1.0, 2.0].iter().map(|&s| F::from_f32(s)).collect(),
            bead_radius: F::from_f32(6.0),
            marker_radius: F::from_f32(8.0),
            anchor_radius: F::from_f32(12.0),
            piece_size: F::from_f32(10.0),
            terminal_shape: TerminalShape::Cross,
            terminal_numbering: TerminalNumbering::Group,
            attach: AttachMode::Center,
            pin_anchor: false,
            bead_mass: F::one(),
            anchor_mass: F::from_f32(3.0),
            piece_mass: F::from_f32(0.5),
            bead_material: Material::bead(),
            anchor_material: Material::heavy(),
            terminal_material: Material::heavy(),
            link_stiffness: F::from_f32(0.9),
            link_damping: F::from_f32(0.1),
            composite_stiffness: F::one(),
        }
    }
}

impl<F: Float> ChainParams<F> {
    pub fn with_counts(mut self, loop_count: usize, tail_count: usize) -> Self {
        self.loop_count = loop_count;
        self.tail_count = tail_count;
        self
    }

    pub fn with_segment_length(mut self, length: F) -> Self {
        self.base_segment_length = length;
        self
    }

    pub fn body_count(&self) -> usize {
        self.loop_count
            .saturating_add(self.tail_count)
            .saturating_add(1 + self.terminal_shape.piece_count())
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        positive("base_segment_length", self.base_segment_length)?;
        positive("radius", self.radius)?;
        positive("bead_radius", self.bead_radius)?;
        positive("marker_radius", self.marker_radius)?;
        positive("anchor_radius", self.anchor_radius)?;
        positive("piece_size", self.piece_size)?;
        positive("bead_mass", self.bead_mass)?;
        positive("anchor_mass", self.anchor_mass)?;
        positive("piece_mass", self.piece_mass)?;
        if !self.center.is_finite() {
            return Err(BuildError::InvalidParameter { name: "center", value: f64::NAN });
        }
        for &scale in &self.tail_link_scale {
            positive("tail_link_scale", scale)?;
        }
        unit_interval("link_stiffness", self.link_stiffness, false)?;
        unit_interval("composite_stiffness", self.composite_stiffness, false)?;
        unit_interval("link_damping", self.link_damping, true)?;

        let requested = self.body_count();
        if requested > MAX_BODIES {
            return Err(BuildError::TooManyBodies { requested, limit: MAX_BODIES });
        }
        Ok(())
    }

    fn is_decade_link(&self, position: usize) -> bool {
        if self.decade_interval == 0 {
            return false;
        }
        let r = position % self.decade_interval;
        r == 0 || r == self.decade_interval - 1
    }

    fn is_marker(&self, index: usize) -> bool {
        self.decade_interval > 0 && (index + 1) % self.decade_interval == 0
    }

    fn tail_scale(&self, link: usize) -> F {
        self.tail_link_scale.get(link).copied().unwrap_or_else(F::one)
    }
}

fn positive<F: Float>(name: &'static str, value: F) -> Result<(), BuildError> {
    if value.is_finite() && value > F::zero() {
        Ok(())
    } else {
        Err(BuildError::InvalidParameter { name, value: value.to_f64() })
    }
}

fn unit_interval<F: Float>(name: &'static str, value: F, allow_zero: bool) -> Result<(), BuildError> {
    let low_ok = if allow_zero { value >= F::zero() } else { value > F::zero() };
    if low_ok && value <= F::one() {
        Ok(())
    } else {
        Err(BuildError::InvalidParameter { name, value: value.to_f64() })
    }
}

/// A body to create, with its place in the chain.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec<F: Float> {
    pub role: Role,
    pub desc: BodyDesc<F>,
}

/// A link to create between two [`BodySpec`]s, by index.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec<F: Float> {
    pub a: usize,
    pub b: usize,
    pub offset_a: Vec2<F>,
    pub offset_b: Vec2<F>,
    pub rest_length: F,
    pub stiffness: F,
    pub damping: F,
    pub kind: LinkKind,
}

/// Output of [`build`]: bodies in logical order, then links in solve order.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainTopology<F: Float> {
    pub bodies: Vec<BodySpec<F>>,
    pub links: Vec<LinkSpec<F>>,
    pub terminal_group: GroupId,
    pub terminal_shape: TerminalShape,
    /// Number of distinct logical indices, 0..logical_count.
    pub logical_count: usize,
}

/// Ids of an instantiated topology, parallel to its `bodies` and `links`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainHandles {
    pub bodies: Vec<BodyId>,
    pub constraints: Vec<ConstraintId>,
}

impl<F: Float> ChainTopology<F> {
    pub fn count_role(&self, pred: impl Fn(&Role) -> bool) -> usize {
        self.bodies.iter().filter(|b| pred(&b.role)).count()
    }

    pub fn loop_count(&self) -> usize {
        self.count_role(|r| matches!(r, Role::Loop { .. }))
    }

    pub fn tail_count(&self) -> usize {
        self.count_role(|r| matches!(r, Role::Tail { .. }))
    }

    /// Position in `bodies` of the body with `role`.
    pub fn find(&self, role: Role) -> Option<usize> {
        self.bodies.iter().position(|b| b.role == role)
    }

    /// Mean position of the terminal pieces as laid out.
    pub fn terminal_center(&self) -> Option<Vec2<F>> {
        let mut sum = Vec2::zero();
        let mut n = 0usize;
        for spec in self.bodies.iter().filter(|b| matches!(b.role, Role::Terminal { .. })) {
            sum += spec.desc.position;
            n += 1;
        }
        (n > 0).then(|| sum.scale(F::one() / F::from_usize(n)))
    }

    /// Add every body and link to `world`, in order.
    ///
    /// Parameters were validated by [`build`]; on error the world may hold a
    /// partial chain and the caller should clear it.
    pub fn instantiate(&self, world: &mut World<F>) -> Result<ChainHandles, WorldError> {
        let mut bodies = Vec::with_capacity(self.bodies.len());
        for spec in &self.bodies {
            bodies.push(world.add_body(spec.desc.clone())?);
        }
        let mut constraints = Vec::with_capacity(self.links.len());
        for link in &self.links {
            let constraint = DistanceConstraint::new(
                Anchor::Body { body: bodies[link.a], offset: link.offset_a },
                Anchor::Body { body: bodies[link.b], offset: link.offset_b },
                link.rest_length,
            )
            .with_stiffness(link.stiffness)
            .with_damping(link.damping)
            .with_kind(link.kind);
            constraints.push(world.add_constraint(constraint)?);
        }
        Ok(ChainHandles { bodies, constraints })
    }
}

/// Lay out the chain described by `params`. Pure: equal inputs give
/// bit-identical output.
pub fn build<F: Float>(params: &ChainParams<F>) -> Result<ChainTopology<F>, BuildError> {
    params.validate()?;

    let seg = params.base_segment_length;
    let double = seg * F::two();
    let shape = params.terminal_shape;
    let piece_count = shape.piece_count();
    let n_loop = params.loop_count;
    let n_tail = params.tail_count;

    let anchor_pos = Vec2::new(params.center.x, params.center.y - params.radius);
    let tail_pos = |j: usize| anchor_pos + Vec2::new(F::zero(), seg * F::from_usize(j + 1));
    let terminal_origin = tail_pos(n_tail);
    let loop_step = F::two() * F::pi() / F::from_usize(n_loop + 1);
    let top = Vec2::new(F::zero(), -params.radius);

    let mut bodies = Vec::with_capacity(params.body_count());
    let mut next_index = 0usize;

    // Terminal composite first: its pieces take the lowest indices.
    let half = params.piece_size * F::half();
    for (piece, &(col, row)) in shape.cells().iter().enumerate() {
        let offset = Vec2::new(
            params.piece_size * F::from_f32(col as f32),
            params.piece_size * F::from_f32(row as f32),
        );
        let logical = match params.terminal_numbering {
            TerminalNumbering::Group => 0,
            TerminalNumbering::PerPiece => piece,
        };
        let desc = BodyDesc::rect(terminal_origin + offset, half, half)
            .with_mass(params.piece_mass)
            .with_material(params.terminal_material)
            .with_logical_index(logical)
            .with_group(TERMINAL_GROUP);
        bodies.push(BodySpec { role: Role::Terminal { piece }, desc });
    }
    next_index += match params.terminal_numbering {
        TerminalNumbering::Group => 1,
        TerminalNumbering::PerPiece => piece_count,
    };

    // Tail, walking from the cross back up to the anchor.
    let tail_first = bodies.len();
    for j in (0..n_tail).rev() {
        let desc = BodyDesc::circle(tail_pos(j), params.bead_radius)
            .with_mass(params.bead_mass)
            .with_material(params.bead_material)
            .with_logical_index(next_index);
        next_index += 1;
        bodies.push(BodySpec { role: Role::Tail { position: j }, desc });
    }

    let anchor = bodies.len();
    let mut desc = BodyDesc::circle(anchor_pos, params.anchor_radius)
        .with_mass(params.anchor_mass)
        .with_material(params.anchor_material)
        .with_logical_index(next_index);
    if params.pin_anchor {
        desc = desc.pinned();
    }
    next_index += 1;
    bodies.push(BodySpec { role: Role::Anchor, desc });

    let loop_first = bodies.len();
    for i in 0..n_loop {
        let marker = params.is_marker(i);
        let radius = if marker { params.marker_radius } else { params.bead_radius };
        let pos = params.center + top.rotate(loop_step * F::from_usize(i + 1));
        let desc = BodyDesc::circle(pos, radius)
            .with_mass(params.bead_mass)
            .with_material(params.bead_material)
            .with_logical_index(next_index);
        next_index += 1;
        bodies.push(BodySpec { role: Role::Loop { position: i, marker }, desc });
    }

    // Position in `bodies` of tail bead j (j counts from the anchor).
    let tail_spec = |j: usize| tail_first + (n_tail - 1 - j);

    let mut links = Vec::new();
    let chain_link = |links: &mut Vec<LinkSpec<F>>, a: usize, b: usize, rest: F| {
        let (offset_a, offset_b) = poles(params.attach, &bodies[a].desc, &bodies[b].desc);
        links.push(LinkSpec {
            a,
            b,
            offset_a,
            offset_b,
            rest_length: rest,
            stiffness: params.link_stiffness,
            damping: params.link_damping,
            kind: LinkKind::Chain,
        });
    };

    if n_loop > 0 {
        chain_link(&mut links, anchor, loop_first, double);
        for i in 1..n_loop {
            let rest = if params.is_decade_link(i) { double } else { seg };
            chain_link(&mut links, loop_first + i - 1, loop_first + i, rest);
        }
        chain_link(&mut links, loop_first + n_loop - 1, anchor, double);
    }

    let mut upper = anchor;
    for j in 0..n_tail {
        let lower = tail_spec(j);
        chain_link(&mut links, upper, lower, seg * params.tail_scale(j));
        upper = lower;
    }

    // Tail end to the top face of the first piece.
    let top_face = Vec2::new(F::zero(), -half);
    let offset_upper = match params.attach {
        AttachMode::Center => Vec2::zero(),
        AttachMode::Pole => Vec2::new(F::zero(), bodies[upper].desc.shape.half_extents().y),
    };
    links.push(LinkSpec {
        a: upper,
        b: 0,
        offset_a: offset_upper,
        offset_b: top_face,
        rest_length: double,
        stiffness: params.link_stiffness,
        damping: params.link_damping,
        kind: LinkKind::Chain,
    });

    for &(a, b) in shape.links() {
        links.push(LinkSpec {
            a,
            b,
            offset_a: Vec2::zero(),
            offset_b: Vec2::zero(),
            rest_length: bodies[a].desc.position.distance(bodies[b].desc.position),
            stiffness: params.composite_stiffness,
            damping: params.link_damping,
            kind: LinkKind::Composite,
        });
    }

    debug!(
        bodies = bodies.len(),
        links = links.len(),
        logical = next_index,
        "built chain topology"
    );

    Ok(ChainTopology {
        bodies,
        links,
        terminal_group: TERMINAL_GROUP,
        terminal_shape: shape,
        logical_count: next_index,
    })
}

/// Anchor offsets for a link between two bodies.
fn poles<F: Float>(mode: AttachMode, a: &BodyDesc<F>, b: &BodyDesc<F>) -> (Vec2<F>, Vec2<F>) {
    match mode {
        AttachMode::Center => (Vec2::zero(), Vec2::zero()),
        AttachMode::Pole => {
            let dir = (b.position - a.position).normalize();
            (dir.scale(reach(&a.shape)), -dir.scale(reach(&b.shape)))
        }
    }
}

fn reach<F: Float>(shape: &Shape<F>) -> F {
    match *shape {
        Shape::Circle { radius } => radius,
        Shape::Rect { half_width, half_height } => half_width.min(half_height),
    }
}
