use once_cell::unsync::OnceCell;

/// Lazily computed value derived from data owned elsewhere.
///
/// The owner calls [`Derived::invalidate`] whenever the source data changes;
/// the next [`Derived::get_or_compute`] recomputes it.
#[derive(Debug, Clone)]
pub struct Derived<T> {
    cell: OnceCell<T>,
}

impl<T> Default for Derived<T> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }
}

impl<T> Derived<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(compute)
    }

    pub fn invalidate(&mut self) {
        self.cell.take();
    }

    pub fn is_valid(&self) -> bool {
        self.cell.get().is_some()
    }
}
