//! Tick scheduler for real-time progression
//!
//! Converts elapsed real time into scaled game time and dispatches it to every
//! active layer in registration order:
//! - `Clock` - tick counter and total game time
//! - `SchedulerState` - running, paused, fast-forward or catching up
//! - `TickContext` - what each update handler receives
//!
//! Offline time is never split into many small ticks: it is added to the next
//! tick as one large diff.

use crate::{Decimal, EngineConfig, Layer, LayerId, LayerRegistry};
use serde::{Deserialize, Serialize};

/// A discrete tick identifier
pub type Tick = u64;

/// What the scheduler is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulerState {
    /// Real time at normal speed
    Running,
    /// No dispatch; offline time is kept for later
    Paused,
    /// Speed multiplier other than one
    FastForward,
    /// Offline time waiting to be applied on the next tick
    CatchUp,
}

/// Game time state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    /// Ticks dispatched so far
    pub tick: Tick,
    /// Scaled game seconds elapsed
    pub time_played: Decimal,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dispatched tick of `diff` game seconds
    pub fn advance(&mut self, diff: Decimal) {
        self.tick += 1;
        self.time_played += diff;
    }
}

/// Passed to every update handler for one tick
pub struct TickContext<'a> {
    /// Scaled game seconds to simulate
    pub diff: Decimal,
    /// Unscaled seconds, offline time included
    pub real_diff: f64,
    /// Speed multiplier applied to this tick
    pub speed: f64,
    /// Number of this tick
    pub tick: Tick,
    /// Every layer, for cross-layer reads
    pub registry: &'a LayerRegistry,
}

impl TickContext<'_> {
    /// Look up another layer
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.registry.get(id)
    }
}

/// Drives layer updates from a real-time source
#[derive(Debug, Clone)]
pub struct Scheduler {
    clock: Clock,
    speed: f64,
    paused: bool,
    pending_offline: f64,
    offline_limit: f64,
    offline_production: bool,
}

impl Scheduler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            clock: Clock::new(),
            speed: config.default_speed.max(0.0),
            paused: false,
            pending_offline: 0.0,
            offline_limit: config.offline_limit_seconds(),
            offline_production: config.offline_production,
        }
    }

    /// Resume from a saved clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn state(&self) -> SchedulerState {
        if self.paused || self.speed == 0.0 {
            SchedulerState::Paused
        } else if self.pending_offline > 0.0 {
            SchedulerState::CatchUp
        } else if self.speed != 1.0 {
            SchedulerState::FastForward
        } else {
            SchedulerState::Running
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the speed multiplier; zero pauses, negatives are treated as zero
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.state() == SchedulerState::Paused
    }

    /// Offline seconds waiting for the next tick
    pub fn pending_offline(&self) -> f64 {
        self.pending_offline
    }

    /// Credit time spent away, capped at the configured limit
    ///
    /// Returns the seconds actually credited.
    pub fn add_offline_time(&mut self, seconds: f64) -> f64 {
        if !self.offline_production {
            tracing::debug!(seconds, "offline production disabled, discarding offline time");
            return 0.0;
        }
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let total = self.pending_offline + seconds;
        if total > self.offline_limit {
            tracing::warn!(
                requested = total,
                limit = self.offline_limit,
                "offline time capped"
            );
        }
        let credited = total.min(self.offline_limit) - self.pending_offline;
        self.pending_offline += credited.max(0.0);
        credited.max(0.0)
    }

    /// Dispatch one tick to every active layer
    ///
    /// Returns the scaled diff that was dispatched, or `None` while paused.
    pub fn tick(&mut self, real_diff: f64, registry: &LayerRegistry) -> Option<Decimal> {
        if self.is_paused() {
            return None;
        }
        let real_diff = if real_diff.is_finite() { real_diff.max(0.0) } else { 0.0 };
        let catching_up = self.pending_offline > 0.0;
        let real_diff = real_diff + std::mem::take(&mut self.pending_offline);
        let diff = Decimal::from(real_diff) * self.speed;

        let ctx = TickContext {
            diff,
            real_diff,
            speed: self.speed,
            tick: self.clock.tick,
            registry,
        };
        tracing::trace!(tick = ctx.tick, diff = %diff, catching_up, "tick");
        for layer in registry.active_layers() {
            layer.update(&ctx);
        }

        self.clock.advance(diff);
        Some(diff)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resource;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A registry with one layer gaining `rate` points per second
    fn producer(rate: f64) -> (LayerRegistry, Resource) {
        let points = Resource::new("points", 0);
        let handle = points.clone();
        let mut registry = LayerRegistry::new();
        registry
            .register(
                Layer::new("main", "Main")
                    .with_resource(&points)
                    .on_update(move |ctx| handle.add(ctx.diff * rate)),
            )
            .unwrap();
        (registry, points)
    }

    #[test]
    fn test_running_tick() {
        let (registry, points) = producer(2.0);
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.state(), SchedulerState::Running);

        assert_eq!(scheduler.tick(0.5, &registry), Some(Decimal::from(0.5)));
        assert_eq!(points.value(), Decimal::ONE);
        assert_eq!(scheduler.clock().tick, 1);
        assert_eq!(scheduler.clock().time_played, Decimal::from(0.5));
    }

    #[test]
    fn test_catch_up_matches_many_ticks() {
        let (registry, stepped) = producer(3.0);
        let mut scheduler = Scheduler::default();
        for _ in 0..1000 {
            scheduler.tick(0.05, &registry);
        }

        let (registry, lump) = producer(3.0);
        let mut scheduler = Scheduler::default();
        scheduler.add_offline_time(50.0);
        assert_eq!(scheduler.state(), SchedulerState::CatchUp);
        scheduler.tick(0.0, &registry);

        assert!(stepped.value().approx_eq(lump.value(), 1e-9));
        assert!(lump.value().approx_eq(150, 1e-12));
        assert_eq!(scheduler.state(), SchedulerState::Running);
    }

    #[test]
    fn test_paused_keeps_offline_time() {
        let (registry, points) = producer(1.0);
        let mut scheduler = Scheduler::default();
        scheduler.add_offline_time(10.0);
        scheduler.pause();
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert_eq!(scheduler.tick(1.0, &registry), None);
        assert_eq!(points.value(), Decimal::ZERO);
        assert_eq!(scheduler.pending_offline(), 10.0);
        assert_eq!(scheduler.clock().tick, 0);

        scheduler.resume();
        scheduler.tick(1.0, &registry);
        assert_eq!(points.value(), Decimal::from(11));
    }

    #[test]
    fn test_speed_scales_diff() {
        let (registry, points) = producer(1.0);
        let mut scheduler = Scheduler::default();
        scheduler.set_speed(4.0);
        assert_eq!(scheduler.state(), SchedulerState::FastForward);
        scheduler.tick(0.25, &registry);
        assert_eq!(points.value(), Decimal::ONE);

        scheduler.set_speed(0.0);
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        scheduler.set_speed(-2.0);
        assert_eq!(scheduler.speed(), 0.0);
    }

    #[test]
    fn test_offline_cap_and_disable() {
        let config = EngineConfig {
            offline_limit_hours: 1.0,
            ..Default::default()
        };
        let mut scheduler = Scheduler::new(&config);
        assert_eq!(scheduler.add_offline_time(5000.0), 3600.0);
        assert_eq!(scheduler.add_offline_time(100.0), 0.0);
        assert_eq!(scheduler.pending_offline(), 3600.0);

        let config = EngineConfig {
            offline_production: false,
            ..Default::default()
        };
        let mut scheduler = Scheduler::new(&config);
        assert_eq!(scheduler.add_offline_time(60.0), 0.0);
        assert_eq!(scheduler.state(), SchedulerState::Running);
    }

    #[test]
    fn test_negative_diff_is_clamped() {
        let (registry, points) = producer(1.0);
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.tick(-5.0, &registry), Some(Decimal::ZERO));
        assert_eq!(points.value(), Decimal::ZERO);
    }

    #[test]
    fn test_dispatch_order_and_inactive_layers() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = LayerRegistry::new();
        for id in ["main", "c", "hc"] {
            let log = Rc::clone(&order);
            registry
                .register(Layer::new(id, id).on_update(move |_| log.borrow_mut().push(id)))
                .unwrap();
        }
        registry.set_active(&"c".into(), false).unwrap();

        let mut scheduler = Scheduler::default();
        scheduler.tick(1.0, &registry);
        assert_eq!(*order.borrow(), vec!["main", "hc"]);
    }

    #[test]
    fn test_handlers_read_other_layers() {
        let (mut registry, points) = producer(1.0);
        let mirror = Resource::new("mirror", 0);
        let handle = mirror.clone();
        registry
            .register(Layer::new("c", "Cycles").on_update(move |ctx| {
                if let Some(points) = ctx.layer(&"main".into()).and_then(|l| l.resource("points")) {
                    handle.set(points.value());
                }
            }))
            .unwrap();

        let mut scheduler = Scheduler::default();
        scheduler.tick(2.0, &registry);
        assert_eq!(mirror.value(), points.value());
        assert_eq!(mirror.value(), Decimal::from(2));
    }
}
