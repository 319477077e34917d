//! Timed replay of a route path for the moving patrol marker.
//!
//! [`PlaybackState`] is the step function: each call to
//! [`PlaybackState::step`] yields the next position until the path is
//! exhausted. [`PlaybackController`] drives a state from a timer task and
//! guarantees at most one active playback: starting a new one aborts the
//! previous timer and silences its [`Playback`] handle, even for ticks
//! that were already buffered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crime_dashboard_crime_models::Coordinate;
use crime_dashboard_patrol_models::{PlaybackTick, RoutePath};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default interval between playback positions.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Shortest interval a controller will run with.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Cursor over a route path.
///
/// Once the path is exhausted, [`step`](Self::step) keeps returning
/// `None` until [`reset`](Self::reset) rewinds to the first position.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    path: RoutePath,
    next: usize,
}

impl PlaybackState {
    /// Creates a state positioned before the first point of `path`.
    #[must_use]
    pub const fn new(path: RoutePath) -> Self {
        Self { path, next: 0 }
    }

    /// Emits the next position and advances.
    pub fn step(&mut self) -> Option<PlaybackTick> {
        let position = self.path.get(self.next)?;
        let index = self.next;
        self.next += 1;

        Some(PlaybackTick {
            index,
            position,
            last: self.next == self.path.len(),
        })
    }

    /// Index and position of the most recently emitted tick.
    #[must_use]
    pub fn current(&self) -> Option<(usize, Coordinate)> {
        let index = self.next.checked_sub(1)?;
        self.path.get(index).map(|c| (index, c))
    }

    /// Whether every position has been emitted.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.next >= self.path.len()
    }

    /// Rewinds to before the first position.
    pub const fn reset(&mut self) {
        self.next = 0;
    }
}

struct ActivePlayback {
    id: u64,
    task: JoinHandle<()>,
}

/// Owns the single playback timer.
///
/// Must be used from within a Tokio runtime, since [`start`](Self::start)
/// spawns the timer task.
pub struct PlaybackController {
    tick: Duration,
    next_id: AtomicU64,
    current: Arc<AtomicU64>,
    active: Arc<Mutex<Option<ActivePlayback>>>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

impl PlaybackController {
    /// Creates a controller emitting one position every `tick`.
    ///
    /// A `tick` shorter than [`MIN_TICK`] (including zero) is raised to
    /// [`MIN_TICK`].
    #[must_use]
    pub fn new(tick: Duration) -> Self {
        let tick = if tick < MIN_TICK {
            log::warn!("Playback tick {tick:?} is too short, using {MIN_TICK:?}");
            MIN_TICK
        } else {
            tick
        };

        Self {
            tick,
            next_id: AtomicU64::new(1),
            current: Arc::new(AtomicU64::new(0)),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Interval between positions.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Starts replaying `path`, replacing any playback in flight.
    ///
    /// The first position is emitted immediately, then one per tick. The
    /// timer stops right after the last position.
    #[must_use]
    pub fn start(&self, path: RoutePath) -> Playback {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(path.len().max(1));

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.take() {
            log::debug!("Playback {} superseded by {id}", previous.id);
            previous.task.abort();
        }
        self.current.store(id, Ordering::SeqCst);

        log::debug!("Starting playback {id} over {} position(s)", path.len());

        let slot = Arc::clone(&self.active);
        let tick = self.tick;
        let task = tokio::spawn(async move {
            let mut state = PlaybackState::new(path);
            let mut interval = tokio::time::interval(tick);

            loop {
                interval.tick().await;
                let Some(position) = state.step() else {
                    break;
                };
                let last = position.last;
                if tx.send(position).await.is_err() || last {
                    break;
                }
            }

            let mut active = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if active.as_ref().is_some_and(|a| a.id == id) {
                active.take();
            }
        });

        *active = Some(ActivePlayback { id, task });

        Playback {
            id,
            current: Arc::clone(&self.current),
            rx,
        }
    }

    /// Stops the active playback, if any.
    pub fn stop(&self) {
        self.current.store(0, Ordering::SeqCst);
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.take() {
            log::debug!("Playback {} stopped", previous.id);
            previous.task.abort();
        }
    }

    /// ID of the playback whose timer is still running.
    #[must_use]
    pub fn active_id(&self) -> Option<u64> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| a.id)
    }
}

/// Receiving end of one playback run.
pub struct Playback {
    id: u64,
    current: Arc<AtomicU64>,
    rx: mpsc::Receiver<PlaybackTick>,
}

impl Playback {
    /// Identifier of this run.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Whether this run is still the controller's current playback.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }

    /// Waits for the next position.
    ///
    /// Returns `None` once the path is exhausted or a newer playback has
    /// replaced this one.
    pub async fn next_tick(&mut self) -> Option<PlaybackTick> {
        if !self.is_current() {
            return None;
        }
        let tick = self.rx.recv().await?;
        self.is_current().then_some(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> RoutePath {
        #[allow(clippy::cast_precision_loss)]
        let points = (0..n)
            .map(|i| Coordinate::new(11.0 + i as f64 / 10.0, 77.0))
            .collect();
        RoutePath::new(points)
    }

    #[test]
    fn state_steps_through_path_then_stops() {
        let mut state = PlaybackState::new(path(2));
        assert_eq!(state.current(), None);

        let first = state.step().unwrap();
        assert_eq!(first.index, 0);
        assert!(!first.last);
        assert_eq!(state.current().map(|(i, _)| i), Some(0));

        let second = state.step().unwrap();
        assert_eq!(second.index, 1);
        assert!(second.last);
        assert!(state.is_finished());

        assert!(state.step().is_none());
        assert!(state.step().is_none());
    }

    #[test]
    fn state_restarts_only_after_reset() {
        let mut state = PlaybackState::new(path(1));
        assert!(state.step().is_some());
        assert!(state.step().is_none());

        state.reset();
        assert_eq!(state.current(), None);
        assert_eq!(state.step().map(|t| t.index), Some(0));
    }

    #[test]
    fn empty_path_emits_nothing() {
        let mut state = PlaybackState::new(RoutePath::default());
        assert!(state.is_finished());
        assert!(state.step().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_position_per_tick_then_stops() {
        let controller = PlaybackController::new(Duration::from_secs(1));
        let route = path(3);
        let started = tokio::time::Instant::now();
        let mut playback = controller.start(route.clone());

        for expected in 0..3 {
            let tick = playback.next_tick().await.unwrap();
            assert_eq!(tick.index, expected);
            assert_eq!(Some(tick.position), route.get(expected));
            assert_eq!(started.elapsed().as_secs(), expected as u64);
        }

        assert!(playback.next_tick().await.is_none());
        assert_eq!(controller.active_id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn new_playback_replaces_running_one() {
        let controller = PlaybackController::new(Duration::from_secs(1));
        let mut a = controller.start(path(3));
        assert_eq!(a.next_tick().await.map(|t| t.index), Some(0));

        let b_route = RoutePath::new(vec![
            Coordinate::new(12.0, 78.0),
            Coordinate::new(12.1, 78.1),
        ]);
        let mut b = controller.start(b_route.clone());
        assert_eq!(controller.active_id(), Some(b.id()));
        assert!(!a.is_current());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(a.next_tick().await.is_none());

        let mut seen = Vec::new();
        while let Some(tick) = b.next_tick().await {
            seen.push(tick.position);
        }
        assert_eq!(seen, b_route.points());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_silences_playback() {
        let controller = PlaybackController::default();
        let mut playback = controller.start(path(3));
        assert!(playback.next_tick().await.is_some());

        controller.stop();
        assert_eq!(controller.active_id(), None);
        assert!(playback.next_tick().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_tick_is_raised_to_minimum() {
        let controller = PlaybackController::new(Duration::ZERO);
        assert_eq!(controller.tick(), MIN_TICK);

        let mut playback = controller.start(path(2));
        assert_eq!(playback.next_tick().await.map(|t| t.index), Some(0));
        assert_eq!(playback.next_tick().await.map(|t| t.index), Some(1));
        assert!(playback.next_tick().await.is_none());
        assert!(playback.is_current());
    }
}
