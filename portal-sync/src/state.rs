use crate::error::SubscriptionError;
use portal_model::MaterializedEntity;

/// What a caller sees of one live subscription.
///
/// `loading` is true only until the first snapshot or error is processed.
/// Errored and empty states both keep `data` at its last value, so callers
/// must check `error` to tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<SubscriptionError>,
}

/// State of a collection subscription.
pub type CollectionState = SubscriptionState<Vec<MaterializedEntity>>;

/// State of a document subscription. `data` is `None` when the document
/// does not exist.
pub type DocumentState = SubscriptionState<Option<MaterializedEntity>>;

impl<T> SubscriptionState<T> {
    /// Waiting for the first snapshot.
    pub fn loading(data: T) -> Self {
        Self {
            data,
            loading: true,
            error: None,
        }
    }

    /// Settled with no error and no pending work.
    pub fn idle(data: T) -> Self {
        Self {
            data,
            loading: false,
            error: None,
        }
    }

    /// True once the first snapshot or error has been processed.
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub(crate) fn apply(&mut self, data: T) {
        self.data = data;
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: SubscriptionError) {
        self.loading = false;
        self.error = Some(error);
    }
}

impl<T: Default> Default for SubscriptionState<T> {
    fn default() -> Self {
        Self::loading(T::default())
    }
}
