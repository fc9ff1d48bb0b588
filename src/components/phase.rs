use defmt_or_log::{info, warn};
use statig::prelude::*;

use crate::{
    Duration, DurationU64, Instant,
    component::{Component, ComponentId, LoopContext},
    datatypes::flight::{FlightData, FlightPhase, SensorHealth},
    events::{Event, EventPublisher},
};

/// Detection thresholds. Every numeric decision the phase machine makes is
/// sourced from here, never hard-coded in a predicate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseConfig {
    /// At-rest dwell over which the ground altitude reference is averaged.
    pub calibration_dwell_ms: u32,
    /// Vertical acceleration a liftoff candidate must exceed.
    pub liftoff_accel_m_s2: f32,
    /// How long the liftoff condition must hold continuously.
    pub liftoff_hold_ms: u32,
    /// Climb-rate floor for the barometric fallback when both
    /// accelerometers are unhealthy.
    pub liftoff_rate_floor_m_s: f32,
    /// Time after liftoff during which descent detection is inhibited.
    pub apogee_guard_ms: u32,
    /// Sink-rate magnitude that counts as descending.
    pub descent_rate_m_s: f32,
    /// How long the sink condition must hold continuously.
    pub descent_hold_ms: u32,
    /// Altitude band around the committed ground reference that counts as
    /// landed.
    pub landed_margin_m: f32,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        PhaseConfig {
            calibration_dwell_ms: 3_000,
            liftoff_accel_m_s2: 30.0,
            liftoff_hold_ms: 250,
            liftoff_rate_floor_m_s: 15.0,
            apogee_guard_ms: 2_000,
            descent_rate_m_s: 5.0,
            descent_hold_ms: 500,
            landed_margin_m: 10.0,
        }
    }
}

impl PhaseConfig {
    fn calibration_dwell(&self) -> DurationU64 {
        DurationU64::millis(self.calibration_dwell_ms as u64)
    }

    fn liftoff_hold(&self) -> DurationU64 {
        DurationU64::millis(self.liftoff_hold_ms as u64)
    }

    fn apogee_guard(&self) -> DurationU64 {
        DurationU64::millis(self.apogee_guard_ms as u64)
    }

    fn descent_hold(&self) -> DurationU64 {
        DurationU64::millis(self.descent_hold_ms as u64)
    }
}

pub struct FlightPhaseManager {
    state_machine: StateMachine<PhaseStateMachine>,
}

impl FlightPhaseManager {
    pub fn new(event_pub: EventPublisher, config: PhaseConfig) -> Self {
        let state_machine = PhaseStateMachine {
            event_pub,
            detector: PhaseDetector::new(config),
        }
        .state_machine();

        Self { state_machine }
    }
}

impl Component for FlightPhaseManager {
    fn id(&self) -> ComponentId {
        ComponentId::FlightPhaseManager
    }

    fn handle_event(&mut self, event: Event, context: &mut LoopContext) {
        self.state_machine.handle_with_context(&event, context);
    }

    fn step(&mut self, context: &mut LoopContext) {
        self.state_machine.handle_with_context(&Event::Step, context);
    }
}

struct PhaseStateMachine {
    event_pub: EventPublisher,
    detector: PhaseDetector,
}

/// Phases advance at most one step per tick, in a fixed one-directional
/// order, so stale data can never cause a multi-phase jump.
#[state_machine(
    initial = "State::uncalibrated(GroundCalibration::new())",
    state(derive(Debug))
)]
impl PhaseStateMachine {
    #[state]
    fn uncalibrated(
        &mut self,
        calib: &mut GroundCalibration,
        context: &mut LoopContext,
        event: &Event,
    ) -> Response<State> {
        match event {
            Event::Step => {
                self.detector
                    .observe(&context.flight, context.step().step_interval);

                if !context.flight.health.contains(SensorHealth::BAROMETER) {
                    calib.accumulate(context.flight.altitude_m, context.step().step_interval);
                }

                if calib.complete(self.detector.config.calibration_dwell()) {
                    let offset = calib.mean_altitude_m();
                    context.flight.altitude_offset_m = offset;
                    context.flight.altitude_m -= offset;
                    Transition(State::calibrated_idle())
                } else {
                    Handled
                }
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_calibrated_idle(&mut self, context: &mut LoopContext) {
        context.phase = FlightPhase::CalibratedIdle;
        self.event_pub
            .publish(Event::FlightCalibrated, context.step().step_time);
        info!("ground reference calibrated");
    }

    #[state(entry_action = "enter_calibrated_idle")]
    fn calibrated_idle(&mut self, context: &mut LoopContext, event: &Event) -> Response<State> {
        match event {
            Event::Step => {
                self.detector
                    .observe(&context.flight, context.step().step_interval);

                if self
                    .detector
                    .liftoff_detected(&context.flight, context.step().step_interval)
                {
                    Transition(State::ascent(context.step().step_time))
                } else {
                    Handled
                }
            }
            Event::CmdForceLiftoff => Transition(State::ascent(context.step().step_time)),
            _ => Super,
        }
    }

    #[action]
    fn enter_ascent(&mut self, context: &mut LoopContext) {
        context.phase = FlightPhase::Ascent;
        // Drift accumulated on the pad must not survive into flight.
        context.flight.commit_ground_reference();
        self.detector.reset_reference();
        self.event_pub
            .publish(Event::FlightLiftoff, context.step().step_time);
        info!("liftoff detected");
    }

    #[state(entry_action = "enter_ascent")]
    fn ascent(
        &mut self,
        entry_time: &mut Instant,
        context: &mut LoopContext,
        event: &Event,
    ) -> Response<State> {
        match event {
            Event::Step => {
                self.detector
                    .observe(&context.flight, context.step().step_interval);

                let past_guard = context.step().step_time.0 - entry_time.0
                    >= self.detector.config.apogee_guard();
                if past_guard
                    && self
                        .detector
                        .descent_detected(context.step().step_interval)
                {
                    Transition(State::descent())
                } else {
                    Handled
                }
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_descent(&mut self, context: &mut LoopContext) {
        context.phase = FlightPhase::Descent;
        self.event_pub
            .publish(Event::FlightDescent, context.step().step_time);
        info!("descent detected");
    }

    #[state(entry_action = "enter_descent")]
    fn descent(&mut self, context: &mut LoopContext, event: &Event) -> Response<State> {
        match event {
            Event::Step => {
                self.detector
                    .observe(&context.flight, context.step().step_interval);

                if self.detector.landed_detected(&context.flight) {
                    Transition(State::landed())
                } else {
                    Handled
                }
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_landed(&mut self, context: &mut LoopContext) {
        context.phase = FlightPhase::Landed;
        self.event_pub
            .publish(Event::FlightLanded, context.step().step_time);
        info!("touchdown");
    }

    #[state(entry_action = "enter_landed")]
    fn landed(event: &Event) -> Response<State> {
        match event {
            _ => Handled,
        }
    }
}

/// Ground-reference averaging over the calibration dwell. Only ticks with a
/// healthy barometer contribute samples or dwell time.
#[derive(Debug, Clone)]
struct GroundCalibration {
    elapsed: DurationU64,
    sum_altitude_m: f32,
    samples: u32,
}

impl Default for GroundCalibration {
    fn default() -> Self {
        GroundCalibration::new()
    }
}

impl GroundCalibration {
    const fn new() -> Self {
        GroundCalibration {
            elapsed: DurationU64::from_ticks(0),
            sum_altitude_m: 0.0,
            samples: 0,
        }
    }

    fn accumulate(&mut self, altitude_m: f32, dt: Duration) {
        self.sum_altitude_m += altitude_m;
        self.samples += 1;
        self.elapsed += dt.0;
    }

    fn complete(&self, dwell: DurationU64) -> bool {
        self.samples > 0 && self.elapsed >= dwell
    }

    fn mean_altitude_m(&self) -> f32 {
        self.sum_altitude_m / self.samples as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiftoffSource {
    PrimaryAccel,
    HighGAccel,
    BaroRate,
}

impl LiftoffSource {
    fn select(health: SensorHealth) -> Option<LiftoffSource> {
        if !health.contains(SensorHealth::IMU) {
            Some(LiftoffSource::PrimaryAccel)
        } else if !health.contains(SensorHealth::HIGH_G) {
            Some(LiftoffSource::HighGAccel)
        } else if !health.contains(SensorHealth::BAROMETER) {
            Some(LiftoffSource::BaroRate)
        } else {
            None
        }
    }
}

/// Transition predicates with their persistent debounce state. Owned by the
/// state machine so the accumulators are resettable and testable without a
/// hidden function-local variable.
struct PhaseDetector {
    config: PhaseConfig,
    liftoff_timer: DurationU64,
    descent_timer: DurationU64,
    prev_altitude_m: Option<f32>,
    altitude_rate_m_s: Option<f32>,
    liftoff_source: Option<LiftoffSource>,
}

impl PhaseDetector {
    fn new(config: PhaseConfig) -> Self {
        PhaseDetector {
            config,
            liftoff_timer: DurationU64::from_ticks(0),
            descent_timer: DurationU64::from_ticks(0),
            prev_altitude_m: None,
            altitude_rate_m_s: None,
            liftoff_source: Some(LiftoffSource::PrimaryAccel),
        }
    }

    /// Maintains the altitude-rate estimate from consecutive healthy
    /// barometer samples. A failed read invalidates the estimate rather
    /// than aliasing a stale altitude into a zero rate.
    fn observe(&mut self, flight: &FlightData, dt: Duration) {
        if flight.health.contains(SensorHealth::BAROMETER) {
            self.altitude_rate_m_s = None;
            return;
        }

        if let Some(prev) = self.prev_altitude_m {
            let dt_ms = dt.0.to_millis();
            if dt_ms > 0 {
                self.altitude_rate_m_s =
                    Some((flight.altitude_m - prev) * 1000.0 / dt_ms as f32);
            }
        }
        self.prev_altitude_m = Some(flight.altitude_m);
    }

    /// Fault-tolerant liftoff detection: primary accelerometer, then the
    /// high-g part, then the barometric climb rate. The selected reading
    /// must hold above threshold continuously for the configured duration;
    /// one disqualifying tick zeroes the accumulator.
    fn liftoff_detected(&mut self, flight: &FlightData, dt: Duration) -> bool {
        let source = LiftoffSource::select(flight.health);
        if source != self.liftoff_source {
            match source {
                None => warn!("liftoff detection unavailable: no healthy source"),
                Some(LiftoffSource::BaroRate) => {
                    warn!("liftoff detection degraded to barometric climb rate")
                }
                Some(_) => info!("liftoff detection source changed"),
            }
            self.liftoff_source = source;
        }

        let qualifying = match source {
            Some(LiftoffSource::PrimaryAccel) => {
                flight.imu_accel_m_s2.z > self.config.liftoff_accel_m_s2
            }
            Some(LiftoffSource::HighGAccel) => {
                flight.high_g_accel_m_s2.z > self.config.liftoff_accel_m_s2
            }
            Some(LiftoffSource::BaroRate) => self
                .altitude_rate_m_s
                .is_some_and(|rate| rate > self.config.liftoff_rate_floor_m_s),
            None => false,
        };

        if qualifying {
            self.liftoff_timer += dt.0;
            self.liftoff_timer > self.config.liftoff_hold()
        } else {
            self.liftoff_timer = DurationU64::from_ticks(0);
            false
        }
    }

    fn descent_detected(&mut self, dt: Duration) -> bool {
        let sinking = self
            .altitude_rate_m_s
            .is_some_and(|rate| rate < -self.config.descent_rate_m_s);

        if sinking {
            self.descent_timer += dt.0;
            self.descent_timer > self.config.descent_hold()
        } else {
            self.descent_timer = DurationU64::from_ticks(0);
            false
        }
    }

    fn landed_detected(&self, flight: &FlightData) -> bool {
        flight.altitude_m <= self.config.landed_margin_m
    }

    /// Forgets the altitude history so a committed re-zero step cannot alias
    /// as a sink rate.
    fn reset_reference(&mut self) {
        self.prev_altitude_m = None;
        self.altitude_rate_m_s = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::component::StepData;
    use crate::events::EventQueue;
    use crate::{InstantU64, common::Ts};

    fn config() -> PhaseConfig {
        PhaseConfig {
            calibration_dwell_ms: 100,
            liftoff_accel_m_s2: 10.0,
            liftoff_hold_ms: 200,
            liftoff_rate_floor_m_s: 15.0,
            apogee_guard_ms: 100,
            descent_rate_m_s: 5.0,
            descent_hold_ms: 100,
            landed_margin_m: 10.0,
        }
    }

    struct Bench {
        queue: EventQueue,
        manager: FlightPhaseManager,
        context: LoopContext,
        t_ms: u64,
    }

    impl Bench {
        fn new(config: PhaseConfig) -> Self {
            let queue = EventQueue::new();
            let manager =
                FlightPhaseManager::new(queue.get_publisher(ComponentId::FlightPhaseManager), config);
            Bench {
                queue,
                manager,
                context: LoopContext::new(),
                t_ms: 0,
            }
        }

        /// Advances one 50 ms tick and runs the phase manager.
        fn tick(&mut self) {
            self.t_ms += 50;
            self.context.begin_step(StepData {
                step_time: crate::Instant(InstantU64::from_ticks(self.t_ms)),
                step_interval: Duration(DurationU64::millis(50)),
                step_count: (self.t_ms / 50) as u32,
            });
            self.manager.step(&mut self.context);
        }

        fn phase(&self) -> FlightPhase {
            self.context.phase
        }

        fn drain_events(&mut self) -> alloc::vec::Vec<Event> {
            let mut events = alloc::vec::Vec::new();
            while let Some(Ts { v, .. }) = self.queue.pop_event() {
                events.push(v.event);
            }
            events
        }

        /// Runs the at-rest calibration to completion (dwell 100 ms = 2 ticks).
        fn calibrate(&mut self, pad_altitude_m: f32) {
            self.context.flight.altitude_m = pad_altitude_m;
            while self.phase() == FlightPhase::Uncalibrated {
                self.tick();
            }
            self.drain_events();
        }
    }

    #[test]
    fn calibration_commits_the_averaged_ground_reference() {
        let mut bench = Bench::new(PhaseConfig {
            calibration_dwell_ms: 200,
            ..config()
        });

        for altitude in [98.0, 100.0, 102.0, 104.0] {
            assert_eq!(bench.phase(), FlightPhase::Uncalibrated);
            bench.context.flight.altitude_m = altitude;
            bench.tick();
        }

        assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);
        assert_relative_eq!(bench.context.flight.altitude_offset_m, 101.0);
        // The live reading is re-referenced at commit time.
        assert_relative_eq!(bench.context.flight.altitude_m, 3.0);
        assert_eq!(bench.drain_events(), [Event::FlightCalibrated]);
    }

    #[test]
    fn calibration_skips_unhealthy_barometer_ticks() {
        let mut bench = Bench::new(config());

        bench.context.flight.altitude_m = 100.0;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Uncalibrated);

        // A failed read neither samples nor advances the dwell.
        bench.context.flight.health.set(SensorHealth::BAROMETER, true);
        bench.context.flight.altitude_m = 500.0;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Uncalibrated);

        bench.context.flight.health.set(SensorHealth::BAROMETER, false);
        bench.context.flight.altitude_m = 100.0;
        bench.tick();

        assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);
        assert_eq!(bench.context.flight.altitude_offset_m, 100.0);
    }

    #[test]
    fn liftoff_debounce_fires_on_the_fifth_qualifying_tick() {
        let mut bench = Bench::new(config());
        bench.calibrate(0.0);

        bench.context.flight.imu_accel_m_s2.z = 15.0;
        for _ in 0..4 {
            bench.tick();
            assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);
        }

        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Ascent);
        assert_eq!(bench.drain_events(), [Event::FlightLiftoff]);
    }

    #[test]
    fn one_disqualifying_tick_resets_the_accumulator() {
        let mut bench = Bench::new(config());
        bench.calibrate(0.0);

        bench.context.flight.imu_accel_m_s2.z = 15.0;
        bench.tick();
        bench.tick();

        bench.context.flight.imu_accel_m_s2.z = 2.0;
        bench.tick();

        // No partial credit across the gap.
        bench.context.flight.imu_accel_m_s2.z = 15.0;
        bench.tick();
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);

        bench.tick();
        bench.tick();
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Ascent);
    }

    #[test]
    fn unhealthy_primary_defers_to_the_high_g_accelerometer() {
        let mut bench = Bench::new(config());
        bench.calibrate(0.0);

        bench.context.flight.health.set(SensorHealth::IMU, true);
        // A wild primary reading must be ignored while its bit is set.
        bench.context.flight.imu_accel_m_s2.z = 90.0;
        bench.context.flight.high_g_accel_m_s2.z = 2.0;
        for _ in 0..8 {
            bench.tick();
        }
        assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);

        bench.context.flight.high_g_accel_m_s2.z = 15.0;
        for _ in 0..4 {
            bench.tick();
            assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);
        }
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Ascent);
    }

    #[test]
    fn exhausted_accelerometers_fall_back_to_climb_rate() {
        let mut bench = Bench::new(config());
        bench.calibrate(0.0);

        bench.context.flight.health.set(SensorHealth::IMU, true);
        bench.context.flight.health.set(SensorHealth::HIGH_G, true);

        // 1 m per 50 ms tick = 20 m/s, above the 15 m/s floor. The first
        // tick still reads a zero rate, then the hold accumulates.
        for i in 0..5 {
            bench.context.flight.altitude_m = i as f32;
            bench.tick();
            assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);
        }
        bench.context.flight.altitude_m = 5.0;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Ascent);
    }

    #[test]
    fn fully_degraded_chain_never_lifts_off() {
        let mut bench = Bench::new(config());
        bench.calibrate(0.0);

        bench.context.flight.health.set(SensorHealth::IMU, true);
        bench.context.flight.health.set(SensorHealth::HIGH_G, true);
        bench.context.flight.health.set(SensorHealth::BAROMETER, true);
        bench.context.flight.imu_accel_m_s2.z = 90.0;
        bench.context.flight.high_g_accel_m_s2.z = 90.0;

        for i in 0..10 {
            bench.context.flight.altitude_m = (i * 10) as f32;
            bench.tick();
        }
        assert_eq!(bench.phase(), FlightPhase::CalibratedIdle);
    }

    #[test]
    fn ascent_entry_rezeros_the_altitude_against_pad_drift() {
        let mut bench = Bench::new(config());
        bench.calibrate(100.0);
        assert_eq!(bench.context.flight.altitude_offset_m, 100.0);

        // Altimeter drifted 5 m while sitting on the pad.
        bench.context.flight.altitude_m = 5.0;
        bench.context.flight.imu_accel_m_s2.z = 15.0;
        for _ in 0..5 {
            bench.tick();
        }

        assert_eq!(bench.phase(), FlightPhase::Ascent);
        assert_relative_eq!(bench.context.flight.altitude_offset_m, 105.0);
        assert_eq!(bench.context.flight.altitude_m, 0.0);
    }

    #[test]
    fn force_liftoff_command_bypasses_the_detector() {
        let mut bench = Bench::new(config());
        bench.calibrate(0.0);

        bench
            .manager
            .handle_event(Event::CmdForceLiftoff, &mut bench.context);

        assert_eq!(bench.phase(), FlightPhase::Ascent);
        assert_eq!(bench.drain_events(), [Event::FlightLiftoff]);
    }

    #[test]
    fn descent_requires_the_apogee_guard_and_a_sustained_sink_rate() {
        let mut bench = Bench::new(PhaseConfig {
            apogee_guard_ms: 300,
            ..config()
        });
        bench.calibrate(0.0);
        bench.context.flight.imu_accel_m_s2.z = 15.0;
        for _ in 0..5 {
            bench.tick();
        }
        assert_eq!(bench.phase(), FlightPhase::Ascent);
        bench.drain_events();

        // Sink hard immediately: the guard must still inhibit detection.
        let mut altitude = 400.0;
        for _ in 0..6 {
            altitude -= 1.0; // 20 m/s sink
            bench.context.flight.altitude_m = altitude;
            bench.tick();
            assert_eq!(bench.phase(), FlightPhase::Ascent);
        }

        // The hold started accumulating on the first past-guard tick; the
        // 100 ms hold needs two more qualifying ticks to be exceeded.
        altitude -= 1.0;
        bench.context.flight.altitude_m = altitude;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Ascent);
        altitude -= 1.0;
        bench.context.flight.altitude_m = altitude;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Descent);
        assert_eq!(bench.drain_events(), [Event::FlightDescent]);
    }

    #[test]
    fn landed_fires_inside_the_ground_margin() {
        let mut bench = Bench::new(PhaseConfig {
            descent_hold_ms: 0,
            apogee_guard_ms: 0,
            ..config()
        });
        bench.calibrate(0.0);
        bench.context.flight.imu_accel_m_s2.z = 15.0;
        for _ in 0..5 {
            bench.tick();
        }
        // Prime the rate estimate, then sink into Descent.
        bench.context.flight.altitude_m = 160.0;
        bench.tick();
        bench.context.flight.altitude_m = 120.0;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Descent);
        bench.drain_events();

        for altitude in [120.0, 80.0, 40.0] {
            bench.context.flight.altitude_m = altitude;
            bench.tick();
            assert_eq!(bench.phase(), FlightPhase::Descent);
        }
        bench.context.flight.altitude_m = 9.0;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Landed);
        assert_eq!(bench.drain_events(), [Event::FlightLanded]);

        // Terminal: nothing ever fires again.
        for _ in 0..5 {
            bench.tick();
        }
        assert_eq!(bench.phase(), FlightPhase::Landed);
        assert!(bench.drain_events().is_empty());
    }

    #[test]
    fn cascading_evaluation_advances_one_phase_per_tick() {
        let mut bench = Bench::new(PhaseConfig {
            descent_hold_ms: 0,
            apogee_guard_ms: 0,
            ..config()
        });
        bench.calibrate(0.0);
        bench.context.flight.imu_accel_m_s2.z = 15.0;
        for _ in 0..5 {
            bench.tick();
        }
        assert_eq!(bench.phase(), FlightPhase::Ascent);

        // Altitude already inside the landed margin and sinking fast: the
        // machine must still pass through Descent for one tick.
        bench.context.flight.altitude_m = 8.0;
        bench.tick();
        bench.context.flight.altitude_m = 6.0;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Descent);
        bench.context.flight.altitude_m = 4.0;
        bench.tick();
        assert_eq!(bench.phase(), FlightPhase::Landed);
    }
}
