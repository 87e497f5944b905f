#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use lokisearch::index::field::FieldOptions;
    use lokisearch::index::inverted_index::InvertedIndex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALPHABET: [char; 5] = ['a', 'b', 'c', 'd', 'é'];

    fn random_word(rng: &mut StdRng) -> String {
        let len = rng.random_range(1..=6);
        (0..len)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
            .collect()
    }

    /// Optimal string alignment distance: Levenshtein plus adjacent swaps.
    fn osa_distance(a: &str, b: &str) -> u32 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let mut d = vec![vec![0u32; b.len() + 1]; a.len() + 1];
        for (i, row) in d.iter_mut().enumerate() {
            row[0] = i as u32;
        }
        for j in 0..=b.len() {
            d[0][j] = j as u32;
        }
        for i in 1..=a.len() {
            for j in 1..=b.len() {
                let cost = u32::from(a[i - 1] != b[j - 1]);
                let mut best = (d[i - 1][j] + 1).min(d[i][j - 1] + 1).min(d[i - 1][j - 1] + cost);
                if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                    best = best.min(d[i - 2][j - 2] + 1);
                }
                d[i][j] = best;
            }
        }
        d[a.len()][b.len()]
    }

    #[test]
    fn test_lookup_fuzzy_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);

        let mut index = InvertedIndex::new(FieldOptions::new("word"));
        for doc_id in 0..300 {
            index.insert_text(doc_id, &random_word(&mut rng)).unwrap();
        }
        let dictionary: Vec<String> = index.terms().map(str::to_string).collect();

        for _ in 0..60 {
            let query = random_word(&mut rng);
            for max_edits in 0..=2 {
                let expected: BTreeSet<(String, u32)> = dictionary
                    .iter()
                    .map(|term| (term.clone(), osa_distance(&query, term)))
                    .filter(|(_, distance)| *distance <= max_edits)
                    .collect();

                let actual: BTreeSet<(String, u32)> = index
                    .lookup_fuzzy(&query, max_edits)
                    .unwrap()
                    .into_iter()
                    .map(|m| (m.term.to_string(), m.distance))
                    .collect();

                assert_eq!(actual, expected, "query '{query}' max_edits {max_edits}");
            }
        }
    }

    #[test]
    fn test_prefix_length_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(5);

        let mut index = InvertedIndex::new(FieldOptions::new("word"));
        for doc_id in 0..200 {
            index.insert_text(doc_id, &random_word(&mut rng)).unwrap();
        }
        let dictionary: Vec<String> = index.terms().map(str::to_string).collect();

        for _ in 0..30 {
            let query = random_word(&mut rng);
            for prefix_length in 0..=3 {
                let prefix: String = query.chars().take(prefix_length).collect();
                for max_edits in 0..=2 {
                    let expected: BTreeSet<(String, u32)> = dictionary
                        .iter()
                        .filter(|term| term.starts_with(&prefix))
                        .map(|term| (term.clone(), osa_distance(&query, term)))
                        .filter(|(_, distance)| *distance <= max_edits)
                        .collect();

                    let actual: BTreeSet<(String, u32)> = index
                        .lookup_fuzzy_with_prefix(&query, max_edits, prefix_length)
                        .unwrap()
                        .into_iter()
                        .map(|m| (m.term.to_string(), m.distance))
                        .collect();

                    assert_eq!(
                        actual, expected,
                        "query '{query}' max_edits {max_edits} prefix {prefix_length}"
                    );
                }
            }
        }
    }
}
