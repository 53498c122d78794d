use covau_core::{DropHandler, SearchSource};
use std::sync::Arc;

use crate::{Debounced, Droppable, Saved, Unique};

/// The standard decorator stack, outermost first
pub type Standard<S> = Droppable<Debounced<Saved<Unique<S>>>>;

/// Composition helpers for search sources
pub trait SearcherExt: SearchSource + Sized {
    fn unique(self) -> Unique<Self> {
        Unique::new(self)
    }

    fn saved(self) -> Saved<Self> {
        Saved::new(self)
    }

    fn debounced(self) -> Debounced<Self> {
        Debounced::new(self)
    }

    fn droppable(self, handler: Option<Arc<dyn DropHandler>>) -> Droppable<Self> {
        Droppable::new(self, handler)
    }

    /// `Droppable(Debounced(Saved(Unique(self))))`
    fn standard(self, handler: Option<Arc<dyn DropHandler>>) -> Standard<Self> {
        self.unique().saved().debounced().droppable(handler)
    }
}

impl<S: SearchSource + Sized> SearcherExt for S {}
