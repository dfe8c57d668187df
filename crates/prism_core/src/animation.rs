//! Time-driven animation of group transformations.
//!
//! Each animation targets one group and composes a small delta onto its
//! transformation per tick. Deltas are scaled by the elapsed milliseconds so the
//! motion is frame-rate independent. All animations start inactive.

use prism_math::Vec3;

use crate::error::SceneResult;
use crate::scene::{NodeId, SceneGraph};

/// Default speed of jumper, scaler and driver animations, in fractions of the
/// travel vector per millisecond.
pub const DEFAULT_SPEED: f32 = 0.001;

/// Default rotation rate in radians per millisecond.
pub const DEFAULT_ANGULAR_SPEED: f32 = 0.0001 * 4.0 * std::f32::consts::PI;

/// Spins a group about a fixed axis.
#[derive(Clone, Debug)]
pub struct RotationNode {
    pub group: NodeId,
    pub axis: Vec3,
    /// Radians per millisecond
    pub angular_speed: f32,
    pub active: bool,
}

impl RotationNode {
    pub fn new(group: NodeId, axis: Vec3) -> Self {
        Self {
            group,
            axis,
            angular_speed: DEFAULT_ANGULAR_SPEED,
            active: false,
        }
    }

    pub fn with_speed(mut self, angular_speed: f32) -> Self {
        self.angular_speed = angular_speed;
        self
    }

    pub fn simulate(&mut self, graph: &mut SceneGraph, dt: f32) -> SceneResult<()> {
        if !self.active {
            return Ok(());
        }
        graph.rotate(self.group, self.axis, self.angular_speed * dt)
    }
}

/// Progress of an out-and-back motion along one vector.
///
/// Covered distance is clamped to `0..=goal` so every cycle ends exactly at
/// the turning points.
#[derive(Clone, Debug, PartialEq)]
struct Bounce {
    goal: f32,
    covered: f32,
    outward: bool,
}

impl Bounce {
    fn new(goal: f32) -> Self {
        Self {
            goal,
            covered: 0.0,
            outward: true,
        }
    }

    /// Advance by `step`. Returns the covered distance before and after the
    /// tick, and whether a full out-and-back cycle just finished.
    fn advance(&mut self, step: f32) -> (f32, f32, bool) {
        let before = self.covered;
        if self.outward {
            self.covered = (self.covered + step).min(self.goal);
            if self.covered >= self.goal {
                self.outward = false;
            }
            (before, self.covered, false)
        } else {
            self.covered = (self.covered - step).max(0.0);
            let finished = self.covered <= 0.0;
            if finished {
                self.outward = true;
            }
            (before, self.covered, finished)
        }
    }

    fn reset(&mut self) {
        self.covered = 0.0;
        self.outward = true;
    }
}

/// Translates a group along a vector and back again.
#[derive(Clone, Debug)]
pub struct JumperNode {
    pub group: NodeId,
    pub direction: Vec3,
    pub speed: f32,
    pub active: bool,
    /// Stop after one out-and-back cycle.
    pub once: bool,
    progress: Bounce,
}

impl JumperNode {
    pub fn new(group: NodeId, direction: Vec3) -> Self {
        Self {
            group,
            direction,
            speed: DEFAULT_SPEED,
            active: false,
            once: false,
            progress: Bounce::new(direction.length()),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// One jump, then deactivate.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Distance covered from the rest position.
    pub fn covered(&self) -> f32 {
        self.progress.covered
    }

    pub fn simulate(&mut self, graph: &mut SceneGraph, dt: f32) -> SceneResult<()> {
        if !self.active {
            return Ok(());
        }
        let step = (self.direction * self.speed).length() * dt;
        let (before, after, finished) = self.progress.advance(step);
        graph.translate(
            self.group,
            self.direction.normalize_or_zero() * (after - before),
        )?;
        if finished && self.once {
            self.active = false;
            self.progress.reset();
        }
        Ok(())
    }
}

/// Grows a group toward a target scale and shrinks it back to 1.
///
/// Target factors must be positive.
#[derive(Clone, Debug)]
pub struct ScalerNode {
    pub group: NodeId,
    /// Target scale minus one per axis
    pub scaling: Vec3,
    pub speed: f32,
    pub active: bool,
    pub once: bool,
    progress: Bounce,
}

impl ScalerNode {
    pub fn new(group: NodeId, target: Vec3) -> Self {
        let scaling = target - Vec3::ONE;
        Self {
            group,
            scaling,
            speed: DEFAULT_SPEED,
            active: false,
            once: false,
            progress: Bounce::new(scaling.length()),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Scale factors currently applied by this animation.
    pub fn current_factors(&self) -> Vec3 {
        self.factors_at(self.progress.covered)
    }

    fn factors_at(&self, covered: f32) -> Vec3 {
        Vec3::ONE + self.scaling.normalize_or_zero() * covered
    }

    pub fn simulate(&mut self, graph: &mut SceneGraph, dt: f32) -> SceneResult<()> {
        if !self.active {
            return Ok(());
        }
        let step = self.scaling.length() * dt * self.speed;
        let (before, after, finished) = self.progress.advance(step);
        let ratio = self.factors_at(after) / self.factors_at(before);
        graph.scale(self.group, ratio)?;
        if finished && self.once {
            self.active = false;
            self.progress.reset();
        }
        Ok(())
    }
}

/// Moves a group along a vector without coming back.
#[derive(Clone, Debug)]
pub struct DriverNode {
    pub group: NodeId,
    pub direction: Vec3,
    pub speed: f32,
    pub active: bool,
    /// Stop once the full vector length has been covered.
    pub once: bool,
    covered: f32,
}

impl DriverNode {
    pub fn new(group: NodeId, direction: Vec3) -> Self {
        Self {
            group,
            direction,
            speed: DEFAULT_SPEED,
            active: false,
            once: false,
            covered: 0.0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn covered(&self) -> f32 {
        self.covered
    }

    pub fn simulate(&mut self, graph: &mut SceneGraph, dt: f32) -> SceneResult<()> {
        if !self.active {
            return Ok(());
        }
        let mut step = (self.direction * self.speed).length() * dt;
        let goal = self.direction.length();
        if self.once {
            step = step.min(goal - self.covered);
        }
        graph.translate(self.group, self.direction.normalize_or_zero() * step)?;
        self.covered += step;
        if self.once && self.covered >= goal {
            self.active = false;
            self.covered = 0.0;
        }
        Ok(())
    }
}

/// Any animation, for ticking a heterogeneous list in a fixed order.
#[derive(Clone, Debug)]
pub enum AnimationNode {
    Rotation(RotationNode),
    Jumper(JumperNode),
    Scaler(ScalerNode),
    Driver(DriverNode),
}

impl AnimationNode {
    pub fn group(&self) -> NodeId {
        match self {
            AnimationNode::Rotation(a) => a.group,
            AnimationNode::Jumper(a) => a.group,
            AnimationNode::Scaler(a) => a.group,
            AnimationNode::Driver(a) => a.group,
        }
    }

    pub fn is_active(&self) -> bool {
        *self.active_flag()
    }

    pub fn set_active(&mut self, active: bool) {
        *self.active_flag_mut() = active;
    }

    pub fn toggle_active(&mut self) {
        let flag = self.active_flag_mut();
        *flag = !*flag;
    }

    fn active_flag(&self) -> &bool {
        match self {
            AnimationNode::Rotation(a) => &a.active,
            AnimationNode::Jumper(a) => &a.active,
            AnimationNode::Scaler(a) => &a.active,
            AnimationNode::Driver(a) => &a.active,
        }
    }

    fn active_flag_mut(&mut self) -> &mut bool {
        match self {
            AnimationNode::Rotation(a) => &mut a.active,
            AnimationNode::Jumper(a) => &mut a.active,
            AnimationNode::Scaler(a) => &mut a.active,
            AnimationNode::Driver(a) => &mut a.active,
        }
    }

    pub fn simulate(&mut self, graph: &mut SceneGraph, dt: f32) -> SceneResult<()> {
        match self {
            AnimationNode::Rotation(a) => a.simulate(graph, dt),
            AnimationNode::Jumper(a) => a.simulate(graph, dt),
            AnimationNode::Scaler(a) => a.simulate(graph, dt),
            AnimationNode::Driver(a) => a.simulate(graph, dt),
        }
    }
}

impl From<RotationNode> for AnimationNode {
    fn from(node: RotationNode) -> Self {
        AnimationNode::Rotation(node)
    }
}

impl From<JumperNode> for AnimationNode {
    fn from(node: JumperNode) -> Self {
        AnimationNode::Jumper(node)
    }
}

impl From<ScalerNode> for AnimationNode {
    fn from(node: ScalerNode) -> Self {
        AnimationNode::Scaler(node)
    }
}

impl From<DriverNode> for AnimationNode {
    fn from(node: DriverNode) -> Self {
        AnimationNode::Driver(node)
    }
}

/// Tick every animation in list order.
pub fn simulate_all(
    animations: &mut [AnimationNode],
    graph: &mut SceneGraph,
    dt: f32,
) -> SceneResult<()> {
    for animation in animations.iter_mut() {
        animation.simulate(graph, dt)?;
    }
    Ok(())
}
