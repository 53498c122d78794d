//! Turning autoplay queries into recommendation sources

use covau_core::{AutoplayQuery, Result, SearchSource, SourceFactory, SourceQuery};
use covau_searcher::SearcherExt;
use tracing::debug;

use crate::config::QueueConfig;

/// Free text used to look an item up by title and artists
pub fn search_text(title: &str, artists: &[String]) -> String {
    if artists.is_empty() {
        title.to_string()
    } else {
        format!("{} by {}", title, artists.join(", "))
    }
}

/// Open the raw recommendation source for `query`
///
/// Returns `None` when the query cannot produce recommendations (a search with
/// no hits, a radio without artists).
pub async fn open_source(
    factory: &dyn SourceFactory,
    config: &QueueConfig,
    query: AutoplayQuery,
) -> Result<Option<Box<dyn SearchSource>>> {
    debug!("Opening autoplay source for {:?}", query);
    match query {
        AutoplayQuery::Related { backend, id } => factory
            .open(SourceQuery::Related { backend, id }, config.related_page_size)
            .await
            .map(Some),
        AutoplayQuery::SearchRelated { title, artists } => {
            let backend = config.autoplay_backend;
            let search = factory
                .open(
                    SourceQuery::Search {
                        backend,
                        query: search_text(&title, &artists),
                    },
                    config.search_page_size,
                )
                .await?;
            let Some(top) = search.next_page().await?.into_iter().next() else {
                return Ok(None);
            };
            factory
                .open(
                    SourceQuery::Related {
                        backend,
                        id: top.key(),
                    },
                    config.related_page_size,
                )
                .await
                .map(Some)
        }
        AutoplayQuery::Radio { artists, .. } => {
            if artists.is_empty() {
                return Ok(None);
            }
            factory
                .open(
                    SourceQuery::Radio {
                        query: artists.join(", "),
                    },
                    config.radio_page_size,
                )
                .await
                .map(Some)
        }
    }
}

/// Raw source wrapped the way the autoplay engine consumes it
pub(crate) fn feed(source: Box<dyn SearchSource>) -> Box<dyn SearchSource> {
    Box::new(source.unique().debounced())
}
