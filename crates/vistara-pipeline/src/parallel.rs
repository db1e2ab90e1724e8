use std::{num::NonZeroUsize, panic, thread};

/// Maps `f` over `items` on up to `workers` scoped threads.
///
/// Items are split into contiguous chunks and results are joined back in
/// chunk order, so the output order always matches `items`.
pub(crate) fn map_in_chunks<T, R, F>(items: &[T], workers: NonZeroUsize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return vec![];
    }
    let chunk_size = items.len().div_ceil(workers.get()).max(1);
    let f = &f;
    thread::scope(|s| {
        let handles = items
            .chunks(chunk_size)
            .map(|chunk| s.spawn(move || chunk.iter().map(f).collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_preserved() {
        let items = (0..103).collect::<Vec<u32>>();
        for workers in [1, 2, 7, 200] {
            let out = map_in_chunks(&items, NonZeroUsize::new(workers).unwrap(), |x| x * 2);
            assert_eq!(out, items.iter().map(|x| x * 2).collect::<Vec<_>>());
        }
        assert!(map_in_chunks(&[] as &[u32], NonZeroUsize::MIN, |x| *x).is_empty());
    }
}
