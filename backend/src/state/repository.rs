use crate::error::StoreError;
use crate::state::model::CrossState;

/// Keyed storage for per-symbol cross state.
///
/// Implementations are synchronous; callers serialize writes per symbol.
pub trait CrossStateRepository: Send + Sync {
    fn get(&self, symbol: &str) -> Result<Option<CrossState>, StoreError>;

    fn put(&self, symbol: &str, state: &CrossState) -> Result<(), StoreError>;

    /// Returns whether a record existed.
    fn remove(&self, symbol: &str) -> Result<bool, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    /// All records ordered by symbol.
    fn list(&self) -> Result<Vec<CrossState>, StoreError>;
}
