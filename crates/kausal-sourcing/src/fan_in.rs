use std::future::poll_fn;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};

/// Merge several receivers into one sender, round robin.
///
/// Every pass takes at most one ready item from each input, so a busy
/// producer cannot starve the others. Empty inputs are skipped, closed inputs
/// are dropped once drained. While every input is empty the task parks until
/// one of them becomes ready. Returns after all inputs are closed, dropping
/// `output`, or as soon as the downstream receiver goes away.
pub async fn fan_in<T>(mut inputs: Vec<Receiver<T>>, output: Sender<T>) {
    let mut next = 0;
    while let Some(item) = poll_fn(|cx| poll_next(&mut inputs, &mut next, cx)).await {
        // may wait on a slow consumer
        if output.send(item).await.is_err() {
            tracing::debug!("fan-in output closed, stopping");
            return;
        }
    }
}

/// Poll inputs starting at `next`, returning the first ready item.
///
/// Pending only once every remaining input has registered the waker, ready
/// with `None` once all inputs are closed.
fn poll_next<T>(
    inputs: &mut Vec<Receiver<T>>,
    next: &mut usize,
    cx: &mut Context<'_>,
) -> Poll<Option<T>> {
    let mut visited = 0;
    while visited < inputs.len() {
        let i = *next % inputs.len();
        match inputs[i].poll_recv(cx) {
            Poll::Ready(Some(item)) => {
                *next = i + 1;
                return Poll::Ready(Some(item));
            }
            Poll::Ready(None) => {
                inputs.remove(i);
                *next = i;
            }
            Poll::Pending => {
                *next = i + 1;
                visited += 1;
            }
        }
    }

    if inputs.is_empty() {
        Poll::Ready(None)
    } else {
        Poll::Pending
    }
}
