// 🔀 Fan-out helpers - bounded concurrency, results in input order
//
// Each future is tagged with its input index and results are placed back by
// index, so completion order never leaks into output order.
// A limit of 0 means unbounded.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

fn effective_limit(limit: usize, len: usize) -> usize {
    if limit == 0 {
        len.max(1)
    } else {
        limit
    }
}

fn reassemble<R>(tagged: Vec<(usize, R)>, len: usize) -> Vec<R> {
    let mut slots: Vec<Option<R>> = Vec::with_capacity(len);
    slots.resize_with(len, || None);

    for (idx, result) in tagged {
        slots[idx] = Some(result);
    }

    slots.into_iter().flatten().collect()
}

/// Run `f` over every item with at most `limit` in flight; every branch completes
pub async fn ordered_fan_out<I, T, R, F, Fut>(items: I, limit: usize, mut f: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let items: Vec<T> = items.into_iter().collect();
    let len = items.len();

    let tagged: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| {
            let fut = f(item);
            async move { (idx, fut.await) }
        })
        .buffer_unordered(effective_limit(limit, len))
        .collect()
        .await;

    reassemble(tagged, len)
}

/// Like [`ordered_fan_out`] but stops at the first error; in-flight work is dropped
pub async fn try_ordered_fan_out<I, T, R, E, F, Fut>(items: I, limit: usize, mut f: F) -> Result<Vec<R>, E>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let items: Vec<T> = items.into_iter().collect();
    let len = items.len();

    let tagged: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| {
            let fut = f(item);
            async move { fut.await.map(|result| (idx, result)) }
        })
        .buffer_unordered(effective_limit(limit, len))
        .try_collect()
        .await?;

    Ok(reassemble(tagged, len))
}
