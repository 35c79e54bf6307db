use std::{
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    task::{Context, Poll, ready},
};

use pin_project::pin_project;

use crate::{inspect::Inspect, value::ToValue, wrapper::Interception};

/// A future returned by an intercepted asynchronous member.
///
/// Polls the original future and, once it resolves, emits the end message
/// before handing the original output to the caller. If it is dropped before
/// completion, no end message is emitted. If the original future panics, the
/// error end message is emitted and the panic is resumed.
#[pin_project]
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Intercepted<'a, T, F> {
    #[pin]
    inner: F,
    receiver: Option<&'a T>,
    call: Option<Interception<'a>>,
}

impl<'a, T, F> Intercepted<'a, T, F> {
    pub(crate) const fn new(
        inner: F,
        receiver: Option<&'a T>,
        call: Option<Interception<'a>>,
    ) -> Self {
        Self {
            inner,
            receiver,
            call,
        }
    }

    /// Returns `true` if this call is being logged.
    pub const fn is_intercepted(&self) -> bool {
        self.call.is_some()
    }
}

impl<T, F, R, E> Future for Intercepted<'_, T, F>
where
    T: Inspect,
    F: Future<Output = Result<R, E>>,
    R: ToValue,
    E: ToValue,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let receiver = this.receiver.map(|receiver| receiver as &dyn Inspect);
        let inner = this.inner;
        let poll = match panic::catch_unwind(AssertUnwindSafe(|| inner.poll(cx))) {
            Ok(poll) => poll,
            Err(payload) => match this.call.take() {
                Some(call) => call.unwind(receiver, payload),
                None => panic::resume_unwind(payload),
            },
        };

        let output = ready!(poll);
        if let Some(call) = this.call.take() {
            call.finish(receiver, output.as_ref());
        }
        Poll::Ready(output)
    }
}
