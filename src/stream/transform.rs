//! Driver connecting push-based stages to async sources.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;

use super::StreamError;

/// An incremental stage turning inputs into zero or more outputs.
///
/// `push` is called once per input in arrival order and `finish` once at
/// end of input. Outputs appended to `out` before an error are still
/// delivered, followed by the error.
pub trait Transform<I> {
    /// Item produced by this stage.
    type Output;

    /// Consume one input.
    ///
    /// # Errors
    ///
    /// Returns a `StreamError` when the input can never be accepted.
    fn push(&mut self, input: I, out: &mut VecDeque<Self::Output>) -> Result<(), StreamError>;

    /// Flush buffered state at end of input.
    ///
    /// # Errors
    ///
    /// Returns a `StreamError` when buffered input is incomplete.
    fn finish(&mut self, out: &mut VecDeque<Self::Output>) -> Result<(), StreamError>;

    /// Run the stage over an in-memory sequence of inputs.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the stage.
    fn run_all(mut self, inputs: impl IntoIterator<Item = I>) -> Result<Vec<Self::Output>, StreamError>
    where
        Self: Sized,
    {
        let mut out = VecDeque::new();
        for input in inputs {
            self.push(input, &mut out)?;
        }
        self.finish(&mut out)?;
        Ok(out.into())
    }
}

struct Driver<S, T, O> {
    source: Pin<Box<S>>,
    stage: T,
    ready: VecDeque<O>,
    error: Option<StreamError>,
    done: bool,
}

/// Apply `stage` to every item of `source`.
///
/// The source is pulled only when the stage has nothing ready, so the
/// stage suspends exactly while waiting for the next input. A source error
/// or a stage error ends the stream after any outputs already produced.
pub fn transform<S, I, T>(source: S, stage: T) -> impl Stream<Item = Result<T::Output, StreamError>>
where
    S: Stream<Item = Result<I, StreamError>>,
    T: Transform<I>,
{
    let driver = Driver {
        source: Box::pin(source),
        stage,
        ready: VecDeque::new(),
        error: None,
        done: false,
    };

    futures_util::stream::unfold(driver, |mut driver| async move {
        loop {
            if let Some(item) = driver.ready.pop_front() {
                return Some((Ok(item), driver));
            }
            if let Some(err) = driver.error.take() {
                return Some((Err(err), driver));
            }
            if driver.done {
                return None;
            }
            match driver.source.next().await {
                Some(Ok(input)) => {
                    if let Err(err) = driver.stage.push(input, &mut driver.ready) {
                        driver.error = Some(err);
                        driver.done = true;
                    }
                }
                Some(Err(err)) => {
                    driver.error = Some(err);
                    driver.done = true;
                }
                None => {
                    driver.done = true;
                    if let Err(err) = driver.stage.finish(&mut driver.ready) {
                        driver.error = Some(err);
                    }
                }
            }
        }
    })
}
