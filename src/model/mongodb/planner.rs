use std::cmp::Ordering;

use mongodb::{
    bson::Document,
    error::Error as DbError,
    options::FindOptions,
};
use rocket::futures::TryStreamExt;
use serde::de::DeserializeOwned;

use super::{Coll, MongoCollection};

/// A filtered, optionally-sorted query declared once, runnable either
/// server-side or via a degraded materialize-then-filter path.
///
/// The store's filtered queries may lack supporting indexes. When the
/// server-side query fails, the planner fetches the declared superset and
/// applies an equivalent predicate and comparator in memory, producing the
/// same element set and order the indexed query would have. The degraded
/// path is logged but never surfaced to the caller.
pub struct PlannedQuery<T> {
    description: &'static str,
    filter: Document,
    sort: Option<Document>,
    superset: Document,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
    compare: Option<Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>>,
}

impl<T> PlannedQuery<T>
where
    T: MongoCollection + DeserializeOwned + Unpin + Send + Sync,
{
    /// Declare a filtered query. `superset` is the (broader) filter used to
    /// materialize documents on the degraded path; `predicate` must accept
    /// exactly the documents `filter` matches.
    pub fn new(
        description: &'static str,
        filter: Document,
        superset: Document,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description,
            filter,
            sort: None,
            superset,
            predicate: Box::new(predicate),
            compare: None,
        }
    }

    /// Add a sort. `compare` must order documents exactly as the server-side
    /// `sort` document would.
    pub fn sorted(
        mut self,
        sort: Document,
        compare: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort = Some(sort);
        self.compare = Some(Box::new(compare));
        self
    }

    /// Run the query, degrading to the in-memory path if the store cannot
    /// serve it directly.
    pub async fn run(self, coll: &Coll<T>) -> Result<Vec<T>, DbError> {
        let options = FindOptions::builder().sort(self.sort.clone()).build();
        let direct: Result<Vec<T>, DbError> = async {
            coll.find(self.filter.clone(), options).await?.try_collect().await
        }
        .await;
        match direct {
            Ok(docs) => Ok(docs),
            Err(e) => {
                warn!(
                    "Query '{}' could not be served directly ({e}); \
falling back to in-memory filtering",
                    self.description
                );
                let all: Vec<T> = coll
                    .find(self.superset.clone(), None)
                    .await?
                    .try_collect()
                    .await?;
                Ok(filter_sort_in_memory(
                    all,
                    &*self.predicate,
                    self.compare.as_deref(),
                ))
            }
        }
    }
}

/// The in-memory half of the planner: filter then stable-sort, reproducing
/// the server-side semantics on materialized documents.
pub fn filter_sort_in_memory<T>(
    mut docs: Vec<T>,
    predicate: &(dyn Fn(&T) -> bool + Send + Sync),
    compare: Option<&(dyn Fn(&T, &T) -> Ordering + Send + Sync)>,
) -> Vec<T> {
    docs.retain(|doc| predicate(doc));
    if let Some(compare) = compare {
        docs.sort_by(|a, b| compare(a, b));
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_path_filters_and_sorts() {
        let docs = vec![(3_u32, "c"), (1, "a"), (7, "x"), (2, "b"), (5, "a")];
        let result = filter_sort_in_memory(
            docs,
            &|&(n, _)| n != 7,
            Some(&|a: &(u32, &str), b: &(u32, &str)| a.0.cmp(&b.0)),
        );
        assert_eq!(result, vec![(1, "a"), (2, "b"), (3, "c"), (5, "a")]);
    }

    #[test]
    fn in_memory_sort_is_stable() {
        // Equal keys must retain input order, matching a stable server sort.
        let docs = vec![(1_u32, "first"), (2, "mid"), (1, "second")];
        let result = filter_sort_in_memory(
            docs,
            &|_| true,
            Some(&|a: &(u32, &str), b: &(u32, &str)| a.0.cmp(&b.0)),
        );
        assert_eq!(result, vec![(1, "first"), (1, "second"), (2, "mid")]);
    }

    #[test]
    fn unsorted_query_keeps_input_order() {
        let docs = vec![(9_u32, ()), (4, ()), (6, ())];
        let result = filter_sort_in_memory(docs, &|&(n, _)| n > 4, None);
        assert_eq!(result, vec![(9, ()), (6, ())]);
    }
}
