//! Simulated bodies: circles (beads) and axis-aligned rectangles (cross pieces).

use core::fmt;

use crate::float::Float;
use crate::vec::Vec2;

/// Stable body handle.
///
/// The epoch is the [`World`](crate::World) generation the id was minted in,
/// so ids from before a rebuild never resolve to a new body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId {
    epoch: u32,
    serial: u32,
}

impl BodyId {
    pub(crate) fn new(epoch: u32, serial: u32) -> Self {
        BodyId { epoch, serial }
    }

    pub fn epoch(self) -> u32 { self.epoch }

    pub(crate) fn slot(self) -> usize { self.serial as usize }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body {}:{}", self.epoch, self.serial)
    }
}

/// Identifies bodies that pick, highlight and render as one composite.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupId(pub u32);

/// Collision shape. Bodies never rotate, so rectangles stay axis-aligned.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape<F: Float> {
    Circle { radius: F },
    Rect { half_width: F, half_height: F },
}

impl<F: Float> Shape<F> {
    /// Half size of the shape's bounding box.
    pub fn half_extents(&self) -> Vec2<F> {
        match *self {
            Shape::Circle { radius } => Vec2::new(radius, radius),
            Shape::Rect { half_width, half_height } => Vec2::new(half_width, half_height),
        }
    }

    /// Point containment, `local` relative to the shape centre.
    pub fn contains(&self, local: Vec2<F>) -> bool {
        match *self {
            Shape::Circle { radius } => local.length_sq() <= radius * radius,
            Shape::Rect { half_width, half_height } => {
                local.x.abs() <= half_width && local.y.abs() <= half_height
            }
        }
    }

    fn is_valid(&self) -> bool {
        let h = self.half_extents();
        h.is_finite() && h.x > F::zero() && h.y > F::zero()
    }
}

/// Per-body surface and damping response. All values in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material<F: Float> {
    /// Fraction of normal speed kept when bouncing off the bounds.
    pub restitution: F,
    /// Fraction of tangential speed lost while touching the bounds.
    pub friction: F,
    /// Fraction of velocity removed every step.
    pub linear_damping: F,
}

impl<F: Float> Material<F> {
    pub fn new(restitution: F, friction: F, linear_damping: F) -> Self {
        Material { restitution, friction, linear_damping }.clamped()
    }

    /// Soft, heavily damped beads.
    pub fn bead() -> Self {
        Self::new(F::from_f32(0.3), F::from_f32(0.8), F::from_f32(0.1))
    }

    /// Bouncier, lightly damped pieces, close to the drag-demo tuning.
    pub fn lively() -> Self {
        Self::new(F::from_f32(0.8), F::from_f32(0.5), F::from_f32(0.05))
    }

    /// Stiff cross pieces that settle quickly.
    pub fn heavy() -> Self {
        Self::new(F::from_f32(0.3), F::from_f32(0.9), F::from_f32(0.2))
    }

    pub fn clamped(self) -> Self {
        Material {
            restitution: unit(self.restitution),
            friction: unit(self.friction),
            linear_damping: unit(self.linear_damping),
        }
    }
}

impl<F: Float> Default for Material<F> {
    fn default() -> Self {
        Self::bead()
    }
}

fn unit<F: Float>(v: F) -> F {
    if v.is_finite() { v.clamp(F::zero(), F::one()) } else { F::zero() }
}

/// Everything needed to create a body. The world assigns the id.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyDesc<F: Float> {
    pub position: Vec2<F>,
    pub velocity: Vec2<F>,
    pub shape: Shape<F>,
    pub mass: F,
    pub material: Material<F>,
    pub pinned: bool,
    pub logical_index: Option<usize>,
    pub group: Option<GroupId>,
}

impl<F: Float> BodyDesc<F> {
    pub fn circle(position: Vec2<F>, radius: F) -> Self {
        Self::with_shape(position, Shape::Circle { radius })
    }

    pub fn rect(position: Vec2<F>, half_width: F, half_height: F) -> Self {
        Self::with_shape(position, Shape::Rect { half_width, half_height })
    }

    fn with_shape(position: Vec2<F>, shape: Shape<F>) -> Self {
        BodyDesc {
            position,
            velocity: Vec2::zero(),
            shape,
            mass: F::one(),
            material: Material::default(),
            pinned: false,
            logical_index: None,
            group: None,
        }
    }

    pub fn with_mass(mut self, mass: F) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_material(mut self, material: Material<F>) -> Self {
        self.material = material;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2<F>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn with_logical_index(mut self, index: usize) -> Self {
        self.logical_index = Some(index);
        self
    }

    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.shape.is_valid()
            && (self.pinned || (self.mass.is_finite() && self.mass > F::zero()))
    }
}

/// A simulated body owned by a [`World`](crate::World).
///
/// Pinned bodies have zero inverse mass and zero velocity; the solver never
/// moves them.
#[derive(Clone, Debug)]
pub struct Body<F: Float> {
    id: BodyId,
    pub position: Vec2<F>,
    pub velocity: Vec2<F>,
    prev_position: Vec2<F>,
    inverse_mass: F,
    pinned: bool,
    pub shape: Shape<F>,
    pub material: Material<F>,
    pub logical_index: Option<usize>,
    pub group: Option<GroupId>,
}

impl<F: Float> Body<F> {
    pub(crate) fn from_desc(id: BodyId, desc: BodyDesc<F>) -> Self {
        let (inverse_mass, velocity) = if desc.pinned {
            (F::zero(), Vec2::zero())
        } else {
            (F::one() / desc.mass, desc.velocity)
        };
        Body {
            id,
            position: desc.position,
            velocity,
            prev_position: desc.position,
            inverse_mass,
            pinned: desc.pinned,
            shape: desc.shape,
            material: desc.material.clamped(),
            logical_index: desc.logical_index,
            group: desc.group,
        }
    }

    pub fn id(&self) -> BodyId { self.id }
    pub fn inverse_mass(&self) -> F { self.inverse_mass }
    pub fn is_pinned(&self) -> bool { self.pinned }

    pub fn speed(&self) -> F {
        self.velocity.length()
    }

    pub fn contains_point(&self, point: Vec2<F>) -> bool {
        self.shape.contains(point - self.position)
    }

    /// Semi-implicit Euler: gravity, then damping, then position.
    pub(crate) fn integrate(&mut self, dt: F, gravity: Vec2<F>) {
        self.prev_position = self.position;
        if self.pinned {
            self.velocity = Vec2::zero();
            return;
        }
        let damping = F::one() - self.material.linear_damping;
        self.velocity = (self.velocity + gravity.scale(dt)).scale(damping);
        self.position += self.velocity.scale(dt);
    }

    /// Replace velocity with the net displacement of this step, so position
    /// corrections from the constraints carry momentum consistently.
    pub(crate) fn derive_velocity(&mut self, dt: F) {
        if self.pinned {
            self.velocity = Vec2::zero();
            return;
        }
        self.velocity = (self.position - self.prev_position).scale(F::one() / dt);
    }
}
