//! [`Handler`] abstractions.

use std::future::Future;

/// Asynchronous operation executed with `Args`.
///
/// The single seam between layers: the service executes commands and queries
/// with it, and storage adapters execute operations like `Select` or `Commit`.
pub trait Handler<Args = ()> {
    /// Output of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes the operation described by `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
