use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::cc::state::State;
use crate::cc::NumericalError;
use crate::EngineUpdateConfig;

/// Observe and steer the chains while `Engine::update` runs them.
///
/// Every method has a no-op default, so a handler only implements the hooks
/// it cares about. Handlers are cloned once per chain; shared state must live
/// behind an `Arc`.
///
/// # Example
/// Count the sweeps across all chains.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use crosscat::cc::state::State;
/// use crosscat::update_handler::UpdateHandler;
/// use crosscat::{EngineBuilder, EngineUpdateConfig};
/// use crosscat::synthetic::gen_factorial_data;
///
/// #[derive(Clone, Default)]
/// struct SweepCounter(Arc<AtomicUsize>);
///
/// impl UpdateHandler for SweepCounter {
///     fn state_updated(&mut self, _state_id: usize, _state: &State) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let (table, codebook) =
///     gen_factorial_data(7, 2, 2, 20, 1, 10.0, 1.0).unwrap();
/// let mut engine = EngineBuilder::new(codebook, table)
///     .with_nstates(2)
///     .seed_from_u64(1)
///     .build()
///     .unwrap();
///
/// let counter = SweepCounter::default();
/// engine
///     .update(&EngineUpdateConfig::new().n_iters(3), counter.clone())
///     .unwrap();
///
/// assert_eq!(counter.0.load(Ordering::Relaxed), 6);
/// ```
pub trait UpdateHandler: Clone + Send + Sync {
    /// Called once before any chain runs
    fn global_init(&mut self, _config: &EngineUpdateConfig, _states: &[State]) {
    }

    /// Called before the first sweep of chain `state_id`
    fn new_state_init(&mut self, _state_id: usize, _state: &State) {}

    /// Called after every sweep
    fn state_updated(&mut self, _state_id: usize, _state: &State) {}

    /// Called after the last sweep of a chain
    fn state_complete(&mut self, _state_id: usize, _state: &State) {}

    /// Called when a sweep of chain `state_id` fails. The chain is restored
    /// to its state from before the update.
    fn state_failed(&mut self, _state_id: usize, _err: &NumericalError) {}

    /// Checked after every sweep. `true` stops all chains.
    fn stop_engine(&self) -> bool {
        false
    }

    /// Checked after every sweep. `true` stops chain `state_id`.
    fn stop_state(&self, _state_id: usize) -> bool {
        false
    }

    /// Called once after every chain has finished
    fn finalize(&mut self) {}
}

macro_rules! impl_tuple {
    ($($idx:tt $t:tt),+) => {
        impl<$($t,)+> UpdateHandler for ($($t,)+)
        where
            $($t: UpdateHandler,)+
        {
            fn global_init(
                &mut self,
                config: &EngineUpdateConfig,
                states: &[State],
            ) {
                $(self.$idx.global_init(config, states);)+
            }

            fn new_state_init(&mut self, state_id: usize, state: &State) {
                $(self.$idx.new_state_init(state_id, state);)+
            }

            fn state_updated(&mut self, state_id: usize, state: &State) {
                $(self.$idx.state_updated(state_id, state);)+
            }

            fn state_complete(&mut self, state_id: usize, state: &State) {
                $(self.$idx.state_complete(state_id, state);)+
            }

            fn state_failed(&mut self, state_id: usize, err: &NumericalError) {
                $(self.$idx.state_failed(state_id, err);)+
            }

            fn stop_engine(&self) -> bool {
                $(self.$idx.stop_engine())||+
            }

            fn stop_state(&self, state_id: usize) -> bool {
                $(self.$idx.stop_state(state_id))||+
            }

            fn finalize(&mut self) {
                $(self.$idx.finalize();)+
            }
        }
    };
}

impl_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_tuple!(0 A, 1 B, 2 C, 3 D);
impl_tuple!(0 A, 1 B, 2 C);
impl_tuple!(0 A, 1 B);
impl_tuple!(0 A);

impl<T> UpdateHandler for Vec<T>
where
    T: UpdateHandler,
{
    fn global_init(&mut self, config: &EngineUpdateConfig, states: &[State]) {
        self.iter_mut()
            .for_each(|handler| handler.global_init(config, states));
    }

    fn new_state_init(&mut self, state_id: usize, state: &State) {
        self.iter_mut()
            .for_each(|handler| handler.new_state_init(state_id, state));
    }

    fn state_updated(&mut self, state_id: usize, state: &State) {
        self.iter_mut()
            .for_each(|handler| handler.state_updated(state_id, state));
    }

    fn state_complete(&mut self, state_id: usize, state: &State) {
        self.iter_mut()
            .for_each(|handler| handler.state_complete(state_id, state));
    }

    fn state_failed(&mut self, state_id: usize, err: &NumericalError) {
        self.iter_mut()
            .for_each(|handler| handler.state_failed(state_id, err));
    }

    fn stop_engine(&self) -> bool {
        self.iter().any(|handler| handler.stop_engine())
    }

    fn stop_state(&self, state_id: usize) -> bool {
        self.iter().any(|handler| handler.stop_state(state_id))
    }

    fn finalize(&mut self) {
        self.iter_mut().for_each(|handler| handler.finalize());
    }
}

impl UpdateHandler for () {}

/// Stop the engine on the first Ctrl-C (SIGINT)
#[cfg(feature = "ctrlc_handler")]
#[derive(Clone)]
pub struct CtrlC {
    seen_sigint: Arc<AtomicBool>,
}

#[cfg(feature = "ctrlc_handler")]
impl CtrlC {
    /// Install the signal handler. Fails if a handler is already installed.
    pub fn new() -> Result<Self, ctrlc::Error> {
        let seen_sigint = Arc::new(AtomicBool::new(false));
        let flag = seen_sigint.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;
        Ok(Self { seen_sigint })
    }
}

#[cfg(feature = "ctrlc_handler")]
impl UpdateHandler for CtrlC {
    fn stop_engine(&self) -> bool {
        self.seen_sigint.load(Ordering::Relaxed)
    }
}

/// Stop every chain once `timeout` has passed since the update began
#[derive(Clone, Debug)]
pub enum Timeout {
    UnInitialized { timeout: Duration },
    Initialized { start: Instant, timeout: Duration },
}

impl Timeout {
    pub fn new(timeout: Duration) -> Self {
        Self::UnInitialized { timeout }
    }
}

impl UpdateHandler for Timeout {
    fn global_init(&mut self, _config: &EngineUpdateConfig, _states: &[State]) {
        if let Self::UnInitialized { timeout } = *self {
            *self = Self::Initialized {
                start: Instant::now(),
                timeout,
            };
        }
    }

    fn stop_engine(&self) -> bool {
        match self {
            Self::Initialized { start, timeout } => start.elapsed() > *timeout,
            Self::UnInitialized { .. } => false,
        }
    }
}

/// Limit the run time of each chain separately
#[derive(Clone, Debug)]
pub enum StateTimeout {
    UnInitialized {
        timeout: Duration,
    },
    Initialized {
        timeout: Duration,
        state_start: Arc<RwLock<HashMap<usize, Instant>>>,
    },
}

impl StateTimeout {
    pub fn new(timeout: Duration) -> Self {
        Self::UnInitialized { timeout }
    }
}

impl UpdateHandler for StateTimeout {
    fn global_init(&mut self, _config: &EngineUpdateConfig, _states: &[State]) {
        if let Self::UnInitialized { timeout } = *self {
            *self = Self::Initialized {
                timeout,
                state_start: Arc::new(RwLock::new(HashMap::new())),
            };
        }
    }

    fn new_state_init(&mut self, state_id: usize, _state: &State) {
        if let Self::Initialized { state_start, .. } = self {
            if let Ok(mut starts) = state_start.write() {
                starts.insert(state_id, Instant::now());
            }
        }
    }

    fn stop_state(&self, state_id: usize) -> bool {
        match self {
            Self::Initialized {
                timeout,
                state_start,
            } => state_start
                .read()
                .ok()
                .and_then(|starts| starts.get(&state_id).copied())
                .map_or(false, |start| start.elapsed() > *timeout),
            Self::UnInitialized { .. } => false,
        }
    }
}

/// Stop the engine when a shared flag is raised. Lets another thread cancel
/// a running update.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl UpdateHandler for StopFlag {
    fn stop_engine(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Draw a progress bar on stderr showing the mean chain score
#[derive(Clone, Default)]
pub enum ProgressBar {
    #[default]
    UnInitialized,
    Initialized {
        sender: Arc<Mutex<Sender<(usize, f64)>>>,
        handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    },
}

impl ProgressBar {
    pub fn new() -> Self {
        Self::UnInitialized
    }
}

fn progress_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_bar()
        .template(
            "Score {msg} {wide_bar} │{pos}/{len}, Elapsed {elapsed_precise} ETA {eta_precise}│",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("━╾ ")
}

impl UpdateHandler for ProgressBar {
    fn global_init(&mut self, config: &EngineUpdateConfig, states: &[State]) {
        const UPDATE_INTERVAL: Duration = Duration::from_millis(250);

        let (sender, receiver) = std::sync::mpsc::channel::<(usize, f64)>();
        let total_iters = (states.len() * config.n_iters) as u64;

        let handle = std::thread::spawn(move || {
            let bar = indicatif::ProgressBar::new(total_iters);
            bar.set_style(progress_style());

            let mut last_draw = Instant::now();
            let mut completed: u64 = 0;
            let mut scores: HashMap<usize, f64> = HashMap::new();

            while let Ok((state_id, score)) = receiver.recv() {
                completed += 1;
                scores.insert(state_id, score);

                if last_draw.elapsed() > UPDATE_INTERVAL {
                    last_draw = Instant::now();
                    bar.set_position(completed);
                    let mean = scores.values().sum::<f64>() / scores.len() as f64;
                    bar.set_message(format!("{mean:.2}"));
                }
            }

            bar.finish_and_clear();
        });

        *self = Self::Initialized {
            sender: Arc::new(Mutex::new(sender)),
            handle: Arc::new(Mutex::new(Some(handle))),
        }
    }

    fn state_updated(&mut self, state_id: usize, state: &State) {
        if let Self::Initialized { sender, .. } = self {
            if let Ok(sender) = sender.lock() {
                // the drawing thread only stops after finalize
                let _ = sender.send((state_id, state.score()));
            }
        }
    }

    fn finalize(&mut self) {
        if let Self::Initialized { sender, handle } = std::mem::take(self) {
            drop(sender);
            let handle = handle.lock().ok().and_then(|mut h| h.take());
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_inert_until_initialized() {
        let timeout = Timeout::new(Duration::from_secs(0));
        assert!(!timeout.stop_engine());
    }

    #[test]
    fn zero_timeout_stops_after_init() {
        let mut timeout = Timeout::new(Duration::from_secs(0));
        timeout.global_init(&EngineUpdateConfig::new(), &[]);
        std::thread::sleep(Duration::from_millis(2));
        assert!(timeout.stop_engine());
    }

    #[test]
    fn state_timeout_without_start_does_not_stop() {
        let mut timeout = StateTimeout::new(Duration::from_secs(0));
        timeout.global_init(&EngineUpdateConfig::new(), &[]);
        assert!(!timeout.stop_state(3));
    }

    #[test]
    fn stop_flag_is_shared_between_clones() {
        let flag = StopFlag::new();
        let handler = (flag.clone(), ());
        assert!(!handler.stop_engine());
        flag.raise();
        assert!(handler.stop_engine());
    }

    #[test]
    fn vec_stops_when_any_member_stops() {
        let raised = StopFlag::new();
        raised.raise();
        let handlers = vec![StopFlag::new(), raised];
        assert!(handlers.stop_engine());
        assert!(!Vec::<StopFlag>::new().stop_engine());
    }
}
