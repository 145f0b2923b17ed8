//! The composed engine: one world, its chain, the index mapper and the
//! pointer, driven by frame ticks and input events.

use alloc::boxed::Box;
use alloc::vec::Vec;

use tracing::{debug, warn};

use crate::body::{BodyId, GroupId};
use crate::bounds::Rect;
use crate::chain::{self, ChainHandles, ChainParams, ChainTopology};
use crate::clock::FrameClock;
use crate::color::{color_for, ColorScheme};
use crate::config::SolverConfig;
use crate::error::{BuildError, WorldError};
use crate::float::Float;
use crate::index::IndexMapper;
use crate::interaction::{PointerConfig, PointerController};
use crate::render::{RenderItem, RenderLink};
use crate::vec::Vec2;
use crate::world::World;

/// Everything the engine can be configured with.
///
/// Changing `chain` or `bounds` rebuilds the topology; everything else is
/// applied in place.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig<F: Float> {
    pub chain: ChainParams<F>,
    pub bounds: Rect<F>,
    pub colors: ColorScheme,
    pub solver: SolverConfig<F>,
    pub pointer: PointerConfig<F>,
    pub fixed_dt: F,
    pub max_steps_per_frame: usize,
}

impl<F: Float> Default for EngineConfig<F> {
    fn default() -> Self {
        let clock = FrameClock::<F>::default();
        EngineConfig {
            chain: ChainParams::default(),
            bounds: Rect::from_size(F::from_f32(800.0), F::from_f32(640.0)),
            colors: ColorScheme::default(),
            solver: SolverConfig::default(),
            pointer: PointerConfig::default(),
            fixed_dt: clock.fixed_dt,
            max_steps_per_frame: clock.max_steps_per_frame,
        }
    }
}

impl<F: Float> EngineConfig<F> {
    /// True if going from `self` to `next` changes the geometry.
    pub fn needs_rebuild(&self, next: &EngineConfig<F>) -> bool {
        self.chain != next.chain || self.bounds != next.bounds
    }

    fn validate(&self) -> Result<(), BuildError> {
        if !self.bounds.is_valid() {
            return Err(BuildError::InvalidParameter {
                name: "bounds",
                value: self.bounds.width().min(self.bounds.height()).to_f64(),
            });
        }
        if !(self.fixed_dt.is_finite() && self.fixed_dt > F::zero()) {
            return Err(BuildError::InvalidParameter { name: "fixed_dt", value: self.fixed_dt.to_f64() });
        }
        self.chain.validate()
    }
}

/// Reported to click listeners when a pointer-down lands on a body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClickEvent {
    pub body: BodyId,
    /// Representative index: the group's index for composite pieces.
    pub logical_index: Option<usize>,
    pub group: Option<GroupId>,
}

/// Outcome of [`RosaryEngine::apply_config`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigChange {
    /// Geometry changed; every old id and index is gone.
    Rebuilt,
    /// Solver, pointer, clock or colours changed in place.
    Updated,
    Unchanged,
}

type ClickListener = Box<dyn FnMut(&ClickEvent)>;

/// Bead-chain engine for one interactive rosary view.
///
/// Single-threaded: the host calls [`tick`](Self::tick) once per frame and
/// forwards pointer events from the same thread.
pub struct RosaryEngine<F: Float = f64> {
    config: EngineConfig<F>,
    world: World<F>,
    topology: ChainTopology<F>,
    handles: ChainHandles,
    mapper: IndexMapper,
    pointer: PointerController<F>,
    clock: FrameClock<F>,
    listeners: Vec<ClickListener>,
}

impl<F: Float> RosaryEngine<F> {
    pub fn new(config: EngineConfig<F>) -> Result<Self, BuildError> {
        config.validate()?;
        let mut world = World::new(config.bounds, config.solver.clone());
        let topology = chain::build(&config.chain)?;
        let handles = topology.instantiate(&mut world)?;
        let mapper = IndexMapper::new(&topology, &handles);
        debug!(
            bodies = world.body_count(),
            constraints = world.constraint_count(),
            logical = mapper.len(),
            "engine created"
        );
        Ok(RosaryEngine {
            pointer: PointerController::new(config.pointer),
            clock: FrameClock::new(config.fixed_dt, config.max_steps_per_frame),
            config,
            world,
            topology,
            handles,
            mapper,
            listeners: Vec::new(),
        })
    }

    /// Apply a new configuration, rebuilding only when geometry changed.
    ///
    /// On error nothing changes.
    pub fn apply_config(&mut self, next: EngineConfig<F>) -> Result<ConfigChange, BuildError> {
        if next == self.config {
            return Ok(ConfigChange::Unchanged);
        }
        next.validate()?;
        let rebuild = self.config.needs_rebuild(&next);
        let previous = core::mem::replace(&mut self.config, next);

        if rebuild {
            if let Err(err) = self.rebuild() {
                self.config = previous;
                return Err(err);
            }
        } else {
            self.world.set_config(self.config.solver.clone());
            self.pointer.set_config(self.config.pointer);
            self.clock = FrameClock::new(self.config.fixed_dt, self.config.max_steps_per_frame);
        }
        debug!(rebuilt = rebuild, "configuration applied");
        Ok(if rebuild { ConfigChange::Rebuilt } else { ConfigChange::Updated })
    }

    /// Discard every body and constraint and lay the chain out again from
    /// the current configuration. Drag and highlight are cleared.
    pub fn rebuild(&mut self) -> Result<(), BuildError> {
        let topology = chain::build(&self.config.chain)?;
        let mut world = self.world.successor();
        world.set_bounds(self.config.bounds);
        world.set_config(self.config.solver.clone());
        let handles = topology.instantiate(&mut world)?;

        self.mapper = IndexMapper::new(&topology, &handles);
        self.world = world;
        self.topology = topology;
        self.handles = handles;
        self.pointer.forget_drag();
        self.pointer.clear_highlight();
        self.pointer.set_config(self.config.pointer);
        self.clock = FrameClock::new(self.config.fixed_dt, self.config.max_steps_per_frame);
        debug!(
            epoch = self.world.epoch(),
            bodies = self.world.body_count(),
            constraints = self.world.constraint_count(),
            logical = self.mapper.len(),
            "topology rebuilt"
        );
        Ok(())
    }

    /// Advance by real elapsed seconds. Returns the number of fixed steps run.
    pub fn tick(&mut self, elapsed: F) -> usize {
        let steps = self.clock.advance(elapsed);
        let dt = self.clock.fixed_dt;
        for _ in 0..steps {
            self.world.step(dt);
        }
        steps
    }

    /// Run exactly one solver step of `dt`, bypassing the frame clock.
    pub fn step(&mut self, dt: F) {
        self.world.step(dt);
    }

    /// Pick the body under `point`, highlight it, notify listeners and start
    /// dragging it. A miss clears the highlight.
    ///
    /// Pinned bodies are clicked but not dragged.
    pub fn pointer_down(&mut self, point: Vec2<F>) -> Result<Option<ClickEvent>, WorldError> {
        let Some(body) = self.pointer.pick(&self.world, point) else {
            self.pointer.clear_highlight();
            return Ok(None);
        };

        let event = ClickEvent {
            body,
            logical_index: self.mapper.click_index(body),
            group: self.mapper.group_of(body),
        };
        match event.logical_index {
            Some(index) => self.pointer.highlight(index),
            None => self.pointer.clear_highlight(),
        }
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }

        match self.pointer.begin_drag(&mut self.world, body, point) {
            Ok(()) | Err(WorldError::BodyPinned(_)) => Ok(Some(event)),
            Err(err) => {
                warn!(%body, error = %err, "could not start drag");
                Err(err)
            }
        }
    }

    /// Returns true while a drag is following the pointer.
    pub fn pointer_move(&mut self, point: Vec2<F>) -> Result<bool, WorldError> {
        self.pointer.update_drag(&mut self.world, point)
    }

    pub fn pointer_up(&mut self) -> Option<BodyId> {
        self.pointer.end_drag(&mut self.world)
    }

    /// Register a listener for successful picks.
    pub fn on_body_clicked<C>(&mut self, listener: C)
    where
        C: FnMut(&ClickEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Highlight a logical index. Returns false if it is out of range.
    pub fn highlight(&mut self, index: usize) -> bool {
        if index >= self.mapper.len() {
            return false;
        }
        self.pointer.highlight(index);
        true
    }

    pub fn clear_highlight(&mut self) {
        self.pointer.clear_highlight();
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.pointer.highlighted()
    }

    /// Move the highlight by `delta` positions, wrapping at both ends.
    /// With nothing highlighted, forward starts at 0 and backward at the end.
    pub fn step_highlight(&mut self, delta: isize) -> Option<usize> {
        let len = self.mapper.len();
        if len == 0 {
            return None;
        }
        let next = match self.pointer.highlighted() {
            Some(current) => (current as isize + delta).rem_euclid(len as isize) as usize,
            None if delta >= 0 => 0,
            None => len - 1,
        };
        self.pointer.highlight(next);
        Some(next)
    }

    /// Bodies to draw this frame, in insertion (paint) order.
    pub fn render_items(&self) -> impl Iterator<Item = RenderItem<F>> + '_ {
        let selected = self.pointer.highlighted();
        let loop_count = self.config.chain.loop_count;
        let colors = &self.config.colors;
        self.world.bodies().iter().map(move |body| {
            let id = body.id();
            let role = self.mapper.role_of(id);
            RenderItem {
                body: id,
                shape: body.shape,
                position: body.position,
                rotation: F::zero(),
                highlighted: selected.is_some_and(|index| self.mapper.is_selected(id, index)),
                group: body.group,
                role,
                label: body.logical_index,
                // Bodies outside the chain draw in the tail colour.
                color: role.map_or(colors.tail, |role| color_for(role, loop_count, colors)),
            }
        })
    }

    /// Link segments to draw, in solve order.
    pub fn render_links(&self) -> impl Iterator<Item = RenderLink<F>> + '_ {
        self.world.constraints().filter_map(move |(_, link)| {
            Some(RenderLink {
                from: self.world.anchor_position(&link.a).ok()?,
                to: self.world.anchor_position(&link.b).ok()?,
                kind: link.kind,
            })
        })
    }

    /// Mean position of a group's pieces.
    pub fn group_center(&self, group: GroupId) -> Option<Vec2<F>> {
        let mut sum = Vec2::zero();
        let mut n = 0usize;
        for &member in self.mapper.group_members(group) {
            if let Ok(body) = self.world.body(member) {
                sum += body.position;
                n += 1;
            }
        }
        (n > 0).then(|| sum.scale(F::one() / F::from_usize(n)))
    }

    pub fn config(&self) -> &EngineConfig<F> { &self.config }
    pub fn world(&self) -> &World<F> { &self.world }
    pub fn topology(&self) -> &ChainTopology<F> { &self.topology }
    pub fn handles(&self) -> &ChainHandles { &self.handles }
    pub fn mapper(&self) -> &IndexMapper { &self.mapper }
    pub fn dragging(&self) -> Option<BodyId> { self.pointer.dragging() }

    /// Direct world access for hosts that add their own bodies. Anything
    /// added is dropped on the next rebuild.
    pub fn world_mut(&mut self) -> &mut World<F> { &mut self.world }
}
