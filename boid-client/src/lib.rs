//! Headless host for the flock: runs a fixed number of frames, applies
//! scripted resize and hover events between frames, and checks the flock
//! invariants after every frame.

use std::io::Write;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use boid_core::{
    velocity_range, BoundaryPolicy, Bounds, Flock, FlockConfig, FlockError, UniformSampler,
    Vector, Vector2D, Vector3D,
};
use boid_shared::{FlockSettings, FrameSnapshot, SurfaceSize};
use serde::Serialize;

/// Violations kept in the report; later ones are only counted
const MAX_REPORTED_VIOLATIONS: usize = 20;

/// Float slack for exact invariants
const EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// 2D canvas particles: bounce, cohesion, speed cap
    Canvas,
    /// 3D button flock: wrap, hover speed-up
    Button,
}

impl Variant {
    pub fn preset(&self) -> FlockSettings {
        match self {
            Variant::Canvas => FlockSettings::canvas(),
            Variant::Button => FlockSettings::button(),
        }
    }
}

/// Frames `start..end` run hovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverWindow {
    pub start: u64,
    pub end: u64,
}

impl HoverWindow {
    pub fn contains(&self, frame: u64) -> bool {
        frame >= self.start && frame < self.end
    }
}

impl FromStr for HoverWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once(':')
            .context("hover window must look like START:END")?;
        let start: u64 = start.trim().parse().context("invalid hover start frame")?;
        let end: u64 = end.trim().parse().context("invalid hover end frame")?;
        if end < start {
            bail!("hover window ends before it starts: {}", s);
        }
        Ok(Self { start, end })
    }
}

/// Surface resize applied before frame `frame` runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub frame: u64,
    pub size: SurfaceSize,
}

impl FromStr for ResizeEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (frame, size) = s
            .split_once(':')
            .context("resize must look like FRAME:WIDTHxHEIGHT")?;
        let (width, height) = size
            .split_once('x')
            .context("resize size must look like WIDTHxHEIGHT")?;
        Ok(Self {
            frame: frame.trim().parse().context("invalid resize frame")?,
            size: SurfaceSize::new(
                width.trim().parse().context("invalid resize width")?,
                height.trim().parse().context("invalid resize height")?,
            ),
        })
    }
}

/// Everything one headless run needs
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub variant: Variant,
    pub settings: FlockSettings,
    pub frames: u64,
    pub seed: u64,
    pub size: SurfaceSize,
    pub hover: Vec<HoverWindow>,
    pub resizes: Vec<ResizeEvent>,
}

impl RunPlan {
    pub fn new(variant: Variant, frames: u64, seed: u64, size: SurfaceSize) -> Self {
        Self {
            variant,
            settings: variant.preset(),
            frames,
            seed,
            size,
            hover: Vec::new(),
            resizes: Vec::new(),
        }
    }

    fn hovered_at(&self, frame: u64) -> bool {
        self.hover.iter().any(|window| window.contains(frame))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub frame: u64,
    pub agent: usize,
    pub kind: &'static str,
    pub value: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub variant: Variant,
    pub frames: u64,
    pub agents: usize,
    pub hovered_frames: u64,
    pub resizes_applied: usize,
    pub max_speed: f32,
    /// Largest distance any agent was seen outside the bounds
    pub max_overshoot: f32,
    pub violation_count: usize,
    pub violations: Vec<Violation>,
    pub final_frame: FrameSnapshot,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.violation_count == 0
    }

    fn record(&mut self, violation: Violation) {
        self.violation_count += 1;
        if self.violations.len() < MAX_REPORTED_VIOLATIONS {
            self.violations.push(violation);
        }
    }
}

/// Run the plan, writing one JSON snapshot per frame to `dump` if given.
pub fn run(plan: &RunPlan, dump: Option<&mut dyn Write>) -> Result<RunReport> {
    let config = FlockConfig::from_settings(&plan.settings).context("invalid flock settings")?;

    match plan.variant {
        Variant::Canvas => {
            let bounds = Bounds::surface(plan.size).context("invalid surface size")?;
            let range = velocity_range::<Vector2D>(&plan.settings)?;
            let mut sampler = UniformSampler::seeded(plan.seed, range);
            let flock = Flock::initialize(config, bounds, &mut sampler)?;
            drive(flock, plan, dump, |flock, size| flock.resize_surface(size))
        }
        Variant::Button => {
            let camera = plan.settings.camera;
            let bounds = Bounds::from_camera(&camera, plan.size).context("invalid surface size")?;
            let range = velocity_range::<Vector3D>(&plan.settings)?;
            let mut sampler = UniformSampler::seeded(plan.seed, range);
            let flock = Flock::initialize(config, bounds, &mut sampler)?;
            drive(flock, plan, dump, move |flock, size| {
                flock.resize_camera(&camera, size)
            })
        }
    }
}

fn drive<V, F>(
    mut flock: Flock<V>,
    plan: &RunPlan,
    mut dump: Option<&mut dyn Write>,
    resize: F,
) -> Result<RunReport>
where
    V: Vector,
    F: Fn(&mut Flock<V>, SurfaceSize) -> Result<(), FlockError>,
{
    let mut checker = InvariantChecker::new(&flock);
    let mut report = RunReport {
        variant: plan.variant,
        frames: 0,
        agents: flock.agents().len(),
        hovered_frames: 0,
        resizes_applied: 0,
        max_speed: 0.0,
        max_overshoot: 0.0,
        violation_count: 0,
        violations: Vec::new(),
        final_frame: flock.snapshot(),
    };

    log::info!(
        "Running {:?} flock: {} agents, {} frames, seed {}",
        plan.variant,
        report.agents,
        plan.frames,
        plan.seed
    );

    for frame in 0..plan.frames {
        for event in plan.resizes.iter().filter(|event| event.frame == frame) {
            resize(&mut flock, event.size).with_context(|| {
                format!(
                    "resize to {}x{} at frame {}",
                    event.size.width, event.size.height, frame
                )
            })?;
            checker.excuse_outside(&flock);
            report.resizes_applied += 1;
            log::debug!("Frame {}: bounds now {:?}", frame, flock.bounds());
        }

        let hovered = plan.hovered_at(frame);
        if hovered != flock.is_hovered() {
            log::debug!("Frame {}: hovered = {}", frame, hovered);
        }
        flock.set_hovered(hovered);
        if hovered {
            report.hovered_frames += 1;
        }

        flock.tick();
        checker.check(&flock, &mut report);

        if let Some(out) = dump.as_mut() {
            serde_json::to_writer(&mut **out, &flock.snapshot())
                .context("failed to write frame snapshot")?;
            writeln!(out).context("failed to write frame snapshot")?;
        }
    }

    report.frames = flock.frame();
    report.final_frame = flock.snapshot();
    Ok(report)
}

/// Per-frame speed cap and bounds checks
struct InvariantChecker {
    speed_cap: Option<f32>,
    boundary: BoundaryPolicy,
    /// Largest single-frame step any agent has taken so far
    largest_step: f32,
    /// Agents left outside by a shrinking resize, until they re-enter
    excused: Vec<bool>,
}

/// A bouncing agent may sit this many of its largest steps outside
const BOUNCE_SLACK_STEPS: f32 = 3.0;

impl InvariantChecker {
    fn new<V: Vector>(flock: &Flock<V>) -> Self {
        let config = flock.config();
        let largest_step = flock
            .agents()
            .iter()
            .map(|agent| agent.speed())
            .fold(0.0f32, f32::max);

        Self {
            speed_cap: config.speed_limit.map(|limit| limit.max),
            boundary: config.boundary,
            largest_step,
            excused: vec![false; flock.agents().len()],
        }
    }

    /// Overshoot tolerated this frame
    fn allowed_overshoot(&self) -> f32 {
        match self.boundary {
            BoundaryPolicy::Wrap => EPSILON,
            BoundaryPolicy::Bounce => BOUNCE_SLACK_STEPS * self.largest_step + EPSILON,
        }
    }

    fn excuse_outside<V: Vector>(&mut self, flock: &Flock<V>) {
        for (excused, agent) in self.excused.iter_mut().zip(flock.agents()) {
            *excused |= overshoot(flock.bounds(), &agent.position) > 0.0;
        }
    }

    fn check<V: Vector>(&mut self, flock: &Flock<V>, report: &mut RunReport) {
        let frame = flock.frame();
        // Bounce preserves speed, so the step just taken is speed * dt_factor
        let dt_factor = flock.dt_factor();
        self.largest_step = flock
            .agents()
            .iter()
            .map(|agent| agent.speed() * dt_factor)
            .fold(self.largest_step, f32::max);
        let allowed = self.allowed_overshoot();

        for (index, agent) in flock.agents().iter().enumerate() {
            let speed = agent.speed();
            report.max_speed = report.max_speed.max(speed);
            if let Some(cap) = self.speed_cap {
                if speed > cap + EPSILON {
                    report.record(Violation {
                        frame,
                        agent: index,
                        kind: "speed",
                        value: speed,
                    });
                }
            }

            let outside = overshoot(flock.bounds(), &agent.position);
            if self.excused[index] {
                self.excused[index] = outside > 0.0;
                continue;
            }
            report.max_overshoot = report.max_overshoot.max(outside);
            if outside > allowed {
                report.record(Violation {
                    frame,
                    agent: index,
                    kind: "bounds",
                    value: outside,
                });
            }
        }
    }
}

/// Distance outside the bounds along the worst axis; zero when inside
fn overshoot<V: Vector>(bounds: &Bounds<V>, position: &V) -> f32 {
    (0..V::AXES)
        .map(|axis| {
            let value = position.axis(axis);
            (bounds.min.axis(axis) - value)
                .max(value - bounds.max.axis(axis))
                .max(0.0)
        })
        .fold(0.0, f32::max)
}
