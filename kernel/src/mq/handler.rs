use crate::mq::ErrorOperation;
use std::future::Future;
use std::pin::Pin;

pub type HandlerResult =
    Pin<Box<dyn Future<Output = error_stack::Result<(), ErrorOperation>> + Send>>;

/// Work a queue consumer performs for every entry, given the shared module.
///
/// Implemented for every `async` closure of shape `(M, T) -> Result<(), ErrorOperation>`.
pub trait Handler<M, T>: 'static + Clone + Sync + Send {
    fn call(self, module: M, data: T) -> HandlerResult;
}

impl<Fn, Res, M, T> Handler<M, T> for Fn
where
    Fn: 'static + Clone + Sync + Send + FnOnce(M, T) -> Res,
    Res: Future<Output = error_stack::Result<(), ErrorOperation>> + Send + 'static,
    M: 'static + Send,
    T: 'static + Send,
{
    fn call(self, module: M, data: T) -> HandlerResult {
        Box::pin(self(module, data))
    }
}
