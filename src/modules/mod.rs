pub mod auth;
pub mod imports;
pub mod schools;
pub mod students;

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the object-safe store traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
