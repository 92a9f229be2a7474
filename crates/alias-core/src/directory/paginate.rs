//! Lazy page streams over marker-based listings

use futures::Stream;
use std::future::Future;

use crate::error::{BackendResult, Result};
use crate::types::{Page, PageRequest};

enum Cursor {
    First,
    Next(String),
    Done,
}

/// Turn a page-fetch function into a stream of pages
///
/// `fetch` is called with the marker of the previous page (`None` first) and
/// is not called again once a page without a next marker has been yielded.
/// Each call to `paginate` starts a fresh listing; nothing is cached.
/// Backend errors are classified into [`crate::Error`] as they surface and
/// end the stream.
pub fn paginate<'a, T, F, Fut>(
    max_items: usize,
    mut fetch: F,
) -> impl Stream<Item = Result<Vec<T>>> + 'a
where
    T: 'a,
    F: FnMut(PageRequest) -> Fut + 'a,
    Fut: Future<Output = BackendResult<Page<T>>> + 'a,
{
    futures::stream::try_unfold(Cursor::First, move |cursor| {
        let request = match cursor {
            Cursor::First => Some(PageRequest {
                marker: None,
                max_items,
            }),
            Cursor::Next(marker) => Some(PageRequest {
                marker: Some(marker),
                max_items,
            }),
            Cursor::Done => None,
        };
        let pending = request.map(&mut fetch);

        async move {
            let Some(pending) = pending else {
                return Ok(None);
            };
            let page = pending.await?;
            let next = match page.next_marker {
                Some(marker) => Cursor::Next(marker),
                None => Cursor::Done,
            };
            Ok::<_, crate::Error>(Some((page.items, next)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::sync::Mutex;

    #[tokio::test]
    async fn follows_markers_until_last_page() {
        let requests = Mutex::new(Vec::new());
        let pages = paginate(2, |request: PageRequest| {
            requests.lock().unwrap().push(request.marker.clone());
            async move {
                Ok::<_, crate::error::BackendError>(match request.marker.as_deref() {
                    None => Page::more(vec![1, 2], "a"),
                    Some("a") => Page::more(vec![3, 4], "b"),
                    _ => Page::last(vec![5]),
                })
            }
        });

        let all: Vec<Vec<i32>> = pages.try_collect().await.unwrap();
        assert_eq!(all, vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert_eq!(
            *requests.lock().unwrap(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let pages = paginate(10, |request: PageRequest| async move {
            match request.marker {
                None => Ok(Page::more(vec![1], "next")),
                Some(_) => Err(crate::error::BackendError::no_credentials()),
            }
        });

        let result: Result<Vec<Vec<i32>>> = pages.try_collect().await;
        assert!(matches!(result, Err(crate::Error::Authentication(_))));
    }
}
