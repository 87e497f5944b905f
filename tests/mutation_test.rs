#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lokisearch::analysis::analyzer::analyzer::Analyzer;
    use lokisearch::analysis::analyzer::standard::StandardAnalyzer;
    use lokisearch::analysis::token::TokenStream;
    use lokisearch::error::{LokiSearchError, Result};
    use lokisearch::full_text_search::document::FnExtractor;
    use lokisearch::full_text_search::search::FullTextSearch;
    use lokisearch::index::field::FieldOptions;
    use lokisearch::query::query::Query;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use serde_json::{Value, json};

    /// Standard analysis that refuses any text containing "boom".
    #[derive(Debug)]
    struct FragileAnalyzer(StandardAnalyzer);

    impl Analyzer for FragileAnalyzer {
        fn analyze(&self, text: &str) -> Result<TokenStream> {
            if text.contains("boom") {
                return Err(LokiSearchError::analysis("refusing to analyze"));
            }
            self.0.analyze(text)
        }

        fn name(&self) -> &str {
            "fragile"
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn search(optimize_changes: bool) -> FullTextSearch {
        FullTextSearch::new(vec![
            FieldOptions::new("title").with_optimize_changes(optimize_changes),
            FieldOptions::new("body")
                .with_optimize_changes(optimize_changes)
                .with_analyzer(Arc::new(FragileAnalyzer(StandardAnalyzer::default()))),
        ])
        .unwrap()
    }

    fn hit_ids(fts: &FullTextSearch, query: Query) -> Vec<u64> {
        fts.search(&query).unwrap().iter().map(|h| h.doc_id).collect()
    }

    fn random_doc(rng: &mut StdRng, id: u64) -> Value {
        let words = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];
        let mut text = |len: usize| {
            (0..len)
                .map(|_| words[rng.random_range(0..words.len())])
                .collect::<Vec<_>>()
                .join(" ")
        };
        json!({ "$loki": id, "title": text(3), "body": text(8) })
    }

    #[test]
    fn test_add_then_remove_restores_state() {
        for optimize_changes in [true, false] {
            let mut rng = StdRng::seed_from_u64(7);
            let mut fts = search(optimize_changes);
            for id in 1..=20 {
                fts.add_document(&random_doc(&mut rng, id), None).unwrap();
            }
            let before = fts.to_payload();

            let extra = random_doc(&mut rng, 100);
            fts.add_document(&extra, None).unwrap();
            assert_ne!(fts.to_payload().indexes, before.indexes);

            fts.remove_document(&extra, None).unwrap();
            assert_eq!(fts.to_payload().indexes, before.indexes);
        }
    }

    #[test]
    fn test_update_reflects_only_new_document() {
        let mut fts = search(true);
        fts.add_document(&json!({ "$loki": 1, "title": "old title", "body": "old body" }), None)
            .unwrap();
        fts.update_document(&json!({ "$loki": 1, "title": "new title" }), None)
            .unwrap();

        assert!(hit_ids(&fts, Query::term("title", "old")).is_empty());
        assert_eq!(hit_ids(&fts, Query::term("title", "new")), vec![1]);
        assert!(hit_ids(&fts, Query::exists("body")).is_empty());
    }

    #[test]
    fn test_failed_update_leaves_old_document() {
        let mut fts = search(true);
        fts.add_document(&json!({ "$loki": 1, "title": "old title", "body": "old body" }), None)
            .unwrap();
        let before = fts.to_payload();

        let result = fts.update_document(
            &json!({ "$loki": 1, "title": "new title", "body": "boom" }),
            None,
        );
        assert!(matches!(result, Err(LokiSearchError::Analysis(_))));

        assert_eq!(fts.to_payload().indexes, before.indexes);
        assert_eq!(hit_ids(&fts, Query::term("title", "old")), vec![1]);
    }

    #[test]
    fn test_removal_paths_agree() {
        let mut rng = StdRng::seed_from_u64(11);
        let docs: Vec<Value> = (1..=30).map(|id| random_doc(&mut rng, id)).collect();

        let mut optimized = search(true);
        let mut scanned = search(false);
        for doc in &docs {
            optimized.add_document(doc, None).unwrap();
            scanned.add_document(doc, None).unwrap();
        }
        for doc in docs.iter().step_by(3) {
            optimized.remove_document(doc, None).unwrap();
            scanned.remove_document(doc, None).unwrap();
        }

        assert_eq!(optimized.to_payload().indexes, scanned.to_payload().indexes);
    }

    #[test]
    fn test_tie_order_is_deterministic() {
        let mut ids: Vec<u64> = (1..=50).collect();
        ids.shuffle(&mut StdRng::seed_from_u64(3));

        let mut fts = search(true);
        for id in &ids {
            fts.add_document(&json!({ "$loki": id, "title": "same words" }), None)
                .unwrap();
        }

        let first = hit_ids(&fts, Query::term("title", "same"));
        assert_eq!(first, (1..=50).collect::<Vec<_>>());
        assert_eq!(hit_ids(&fts, Query::term("title", "same")), first);
    }

    #[test]
    fn test_fn_extractor() {
        let mut fts = FullTextSearch::new(vec![FieldOptions::new("name").with_extractor(Arc::new(
            FnExtractor(|doc: &Value| {
                Some(format!("{} {}", doc.get("first")?.as_str()?, doc.get("last")?.as_str()?))
            }),
        ))])
        .unwrap();

        fts.add_document(&json!({ "first": "Ada", "last": "Lovelace" }), Some(1))
            .unwrap();
        fts.add_document(&json!({ "first": "Alan" }), Some(2)).unwrap();

        assert_eq!(hit_ids(&fts, Query::term("name", "lovelace")), vec![1]);
        assert_eq!(hit_ids(&fts, Query::exists("name")), vec![1]);
    }
}
