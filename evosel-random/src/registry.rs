//! Thread-scoped random registry.
//!
//! Each thread owns a LIFO stack of [`Random`] handles per registry. The top
//! of the stack is the thread's current source. When a thread asks for a
//! source and has no scope open, it uses a bottom entry created lazily from
//! the registry's default. Changing the default (`set_global`, `reset`, ...)
//! bumps a generation counter, and a bottom entry from an older generation
//! is rebuilt on the next [`RandomRegistry::get`]. Scoped entries are never
//! replaced.
//!
//! [`RandomRegistry::with_scope`] pushes an override for the duration of a
//! closure and pops it on every exit path, unwinding panics included.
//! Stacks live in thread-local storage, so scopes on different threads never
//! touch each other and never block.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use tracing::trace;

use crate::seed::SeedHierarchy;
use crate::source::Random;

/// Stream name used when deriving per-thread seeds from a master seed.
const THREAD_STREAM: &str = "thread";

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static STACKS: RefCell<HashMap<u64, ThreadStack>> = RefCell::new(HashMap::new());
}

/// One thread's sources for one registry.
struct ThreadStack {
    /// Dead once the registry is dropped, on whichever thread.
    owner: Weak<()>,
    /// Lazily created default, tagged with the default's generation.
    bottom: Option<(u64, Random)>,
    scopes: Vec<Random>,
}

impl ThreadStack {
    fn new(owner: Weak<()>) -> Self {
        Self {
            owner,
            bottom: None,
            scopes: Vec::new(),
        }
    }

    fn depth(&self) -> usize {
        self.scopes.len() + usize::from(self.bottom.is_some())
    }

    fn is_empty(&self) -> bool {
        self.bottom.is_none() && self.scopes.is_empty()
    }

    /// The current source, unless only a stale bottom entry is left.
    fn current(&self, generation: u64) -> Option<Random> {
        match (self.scopes.last(), &self.bottom) {
            (Some(top), _) => Some(top.clone()),
            (None, Some((built, bottom))) if *built == generation => Some(bottom.clone()),
            _ => None,
        }
    }
}

/// Produces a fresh source for each thread.
pub type RandomFactory = Arc<dyn Fn() -> Random + Send + Sync>;

/// Where a thread's bottom-of-stack source comes from.
#[derive(Clone)]
pub enum DefaultRandom {
    /// Every thread shares the same source.
    Shared(Random),
    /// Every thread gets its own source from the factory.
    PerThread(RandomFactory),
    /// Every thread gets a source seeded from the hierarchy, keyed by the
    /// order in which threads first touched the registry.
    Seeded(SeedHierarchy),
}

impl DefaultRandom {
    /// Per-thread entropy-seeded sources.
    pub fn bootstrap() -> Self {
        let factory: RandomFactory = Arc::new(Random::from_entropy);
        Self::PerThread(factory)
    }
}

impl fmt::Debug for DefaultRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared(random) => f.debug_tuple("Shared").field(random).finish(),
            Self::PerThread(_) => f.write_str("PerThread"),
            Self::Seeded(hierarchy) => f.debug_tuple("Seeded").field(hierarchy).finish(),
        }
    }
}

#[derive(Debug)]
struct DefaultState {
    generation: u64,
    random: DefaultRandom,
}

/// Registry of the current random source per thread.
pub struct RandomRegistry {
    id: u64,
    alive: Arc<()>,
    default: RwLock<DefaultState>,
    thread_ordinal: AtomicU64,
}

impl RandomRegistry {
    pub fn new() -> Self {
        Self::with_default(DefaultRandom::bootstrap())
    }

    pub fn with_default(default: DefaultRandom) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            alive: Arc::new(()),
            default: RwLock::new(DefaultState {
                generation: 0,
                random: default,
            }),
            thread_ordinal: AtomicU64::new(0),
        }
    }

    /// The lazily created process-wide registry.
    pub fn global() -> Arc<RandomRegistry> {
        static GLOBAL: OnceLock<Arc<RandomRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(RandomRegistry::new())))
    }

    /// The calling thread's current source.
    ///
    /// Without an open scope this is the thread's bottom entry, rebuilt from
    /// the default if the default changed since it was created.
    pub fn get(&self) -> Random {
        let generation = self.generation();
        if let Some(current) = self.read_stack(|stack| stack.current(generation)).flatten() {
            return current;
        }

        // The default is built outside the stack borrow: a factory is free
        // to call back into the registry.
        let (generation, random) = self.thread_default();
        self.with_stack(|stack| {
            if let Some(current) = stack.current(generation) {
                return current;
            }
            stack.bottom = Some((generation, random.clone()));
            random
        })
    }

    /// Share `random` with every thread that has no scope open.
    pub fn set_global(&self, random: Random) {
        self.set_default(DefaultRandom::Shared(random));
    }

    /// Give every thread that has no scope open its own source.
    pub fn set_global_per_thread<F>(&self, factory: F)
    where
        F: Fn() -> Random + Send + Sync + 'static,
    {
        self.set_default(DefaultRandom::PerThread(Arc::new(factory)));
    }

    /// Derive per-thread sources from `seed`.
    ///
    /// Thread ordinals restart at zero, so the n-th thread to draw from the
    /// registry after this call receives the same source across runs.
    pub fn set_global_seed(&self, seed: u64) {
        self.thread_ordinal.store(0, Ordering::Relaxed);
        self.set_default(DefaultRandom::Seeded(SeedHierarchy::new(seed)));
    }

    /// Restore the bootstrap default.
    pub fn reset(&self) {
        self.set_default(DefaultRandom::bootstrap());
    }

    /// Run `body` with `random` as the calling thread's current source.
    ///
    /// Exactly one stack entry is popped when `body` returns or unwinds.
    pub fn with_scope<R, F>(&self, random: Random, body: F) -> R
    where
        F: FnOnce(&Random) -> R,
    {
        let scope = Scope::enter(self, random);
        body(&scope.random)
    }

    /// Number of sources on the calling thread's stack.
    pub fn depth(&self) -> usize {
        self.read_stack(ThreadStack::depth).unwrap_or(0)
    }

    fn generation(&self) -> u64 {
        self.default
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    fn set_default(&self, random: DefaultRandom) {
        let mut default = self.default.write().unwrap_or_else(PoisonError::into_inner);
        default.generation += 1;
        trace!(
            registry = self.id,
            generation = default.generation,
            ?random,
            "replacing default random source"
        );
        default.random = random;
    }

    fn thread_default(&self) -> (u64, Random) {
        let (generation, default) = {
            let default = self.default.read().unwrap_or_else(PoisonError::into_inner);
            (default.generation, default.random.clone())
        };

        let random = match default {
            DefaultRandom::Shared(random) => random,
            DefaultRandom::PerThread(factory) => factory(),
            DefaultRandom::Seeded(hierarchy) => {
                let ordinal = self.thread_ordinal.fetch_add(1, Ordering::Relaxed);
                hierarchy.random_for(THREAD_STREAM, ordinal)
            }
        };
        trace!(registry = self.id, generation, "created thread default random source");
        (generation, random)
    }

    fn read_stack<R>(&self, f: impl FnOnce(&ThreadStack) -> R) -> Option<R> {
        STACKS.with(|stacks| stacks.borrow().get(&self.id).map(f))
    }

    fn with_stack<R>(&self, f: impl FnOnce(&mut ThreadStack) -> R) -> R {
        STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if !stacks.contains_key(&self.id) {
                // Registries dropped on other threads cannot reach this map.
                stacks.retain(|_, stack| stack.owner.strong_count() > 0);
            }
            let stack = stacks
                .entry(self.id)
                .or_insert_with(|| ThreadStack::new(Arc::downgrade(&self.alive)));
            f(stack)
        })
    }
}

impl Default for RandomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RandomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default = self.default.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("RandomRegistry")
            .field("id", &self.id)
            .field("generation", &default.generation)
            .field("default", &default.random)
            .finish()
    }
}

impl Drop for RandomRegistry {
    fn drop(&mut self) {
        // Other threads purge their entries on their next registry insert.
        let _ = STACKS.try_with(|stacks| stacks.borrow_mut().remove(&self.id));
    }
}

/// An active override on the current thread. Pops its entry on drop.
struct Scope<'a> {
    registry: &'a RandomRegistry,
    random: Random,
    // Must be dropped on the thread that pushed it.
    _not_send: PhantomData<*const ()>,
}

impl<'a> Scope<'a> {
    fn enter(registry: &'a RandomRegistry, random: Random) -> Self {
        let depth = registry.with_stack(|stack| {
            stack.scopes.push(random.clone());
            stack.depth()
        });
        trace!(registry = registry.id, depth, "entered random scope");
        Self {
            registry,
            random,
            _not_send: PhantomData,
        }
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        let id = self.registry.id;
        let popped = STACKS.try_with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            let stack = stacks.get_mut(&id)?;
            let popped = stack.scopes.pop();
            if stack.is_empty() {
                stacks.remove(&id);
            }
            popped
        });
        if let Ok(popped) = popped {
            debug_assert!(
                popped.as_ref() == Some(&self.random),
                "random scopes must be exited in LIFO order"
            );
        }
        trace!(registry = id, "exited random scope");
    }
}
