//! Manager construction options.

use bdd_engine::{Engine, Heap, HeapConfig, Lite};
use bon::Builder;

use crate::domain::ReorderMethod;
use crate::error::Result;

/// Engine backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Full-featured heap.
    #[default]
    Heap,
    /// Reduced backend without quantification, order shuffling or path counting.
    Lite,
}

/// Options for [`Manager::initialize`][crate::Manager::initialize].
///
/// ```rust
/// use bdd_bridge::{Backend, ManagerConfig, ReorderMethod};
///
/// let config = ManagerConfig::builder()
///     .unique_slots(1 << 10)
///     .backend(Backend::Lite)
///     .auto_reorder(ReorderMethod::Sift)
///     .build();
/// assert_eq!(config.cache_slots, 1 << 16);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ManagerConfig {
    /// Initial node capacity hint.
    #[builder(default = 1 << 14)]
    pub unique_slots: usize,

    /// Computed-table size hint.
    #[builder(default = 1 << 16)]
    pub cache_slots: usize,

    #[builder(default = Backend::Heap)]
    pub backend: Backend,

    /// Automatic reordering strategy enabled right after initialization.
    #[builder(default = ReorderMethod::None)]
    pub auto_reorder: ReorderMethod,

    /// Live nodes that trigger the first automatic reordering.
    #[builder(default = 4004)]
    pub reorder_threshold: usize,

    /// Hard cap on engine nodes; exceeding it is a resource-exhaustion error.
    pub max_nodes: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ManagerConfig {
    fn heap_config(&self) -> HeapConfig {
        HeapConfig {
            unique_slots: self.unique_slots,
            cache_slots: self.cache_slots,
            max_nodes: self.max_nodes,
            reorder_threshold: self.reorder_threshold,
            ..HeapConfig::default()
        }
    }

    pub(crate) fn create_engine(&self) -> Result<Box<dyn Engine>> {
        let heap_config = self.heap_config();
        let mut engine: Box<dyn Engine> = match self.backend {
            Backend::Heap => Box::new(Heap::new(heap_config)?),
            Backend::Lite => Box::new(Lite::new(heap_config)?),
        };
        if self.auto_reorder != ReorderMethod::None {
            engine.autodyn_enable(self.auto_reorder.to_engine());
        }
        Ok(engine)
    }
}
