use crate::domain::Domain;
use crate::model::{Candidate, FinalSet};
use lazy_regex::regex_is_match;
use tracing::trace;

/// Union every candidate, keep those belonging to `domain`, sorted and deduplicated.
///
/// Raw counts are taken before filtering: they reflect what each source reported.
pub fn merge(candidates: &[Candidate], domain: &Domain) -> FinalSet {
    let mut final_set = FinalSet::default();

    for candidate in candidates {
        *final_set
            .raw_counts
            .entry(candidate.source.clone())
            .or_default() += 1;

        let name = candidate.name.trim_matches('.').to_ascii_lowercase();
        if is_well_formed(&name) && domain.is_parent_of(&name) {
            final_set.subdomains.insert(name);
        } else {
            trace!("Dropping {:?} from {}", candidate.name, candidate.source);
        }
    }

    final_set
}

fn is_well_formed(name: &str) -> bool {
    regex_is_match!(r"^[a-z0-9-]+(?:\.[a-z0-9-]+)*$", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(source: &str, names: &[&str]) -> Vec<Candidate> {
        names
            .iter()
            .map(|name| Candidate {
                name: name.to_string(),
                source: source.to_string(),
            })
            .collect()
    }

    fn example() -> Domain {
        Domain::validate("example.com").unwrap()
    }

    #[test]
    fn filters_on_label_boundary() {
        let input = candidates(
            "text",
            &[
                "notexample.com",
                "api.example.com",
                "example.com.evil.com",
                "example.com",
            ],
        );

        let final_set = merge(&input, &example());

        assert_eq!(
            final_set.subdomains.into_iter().collect::<Vec<_>>(),
            ["api.example.com", "example.com"]
        );
    }

    #[test]
    fn stray_dots_and_garbage_are_handled() {
        let input = candidates(
            "text",
            &[
                ".api.example.com.",
                "a..example.com",
                "bad name.example.com",
                "<br>.example.com",
                "under_score.example.com",
            ],
        );

        let final_set = merge(&input, &example());

        assert_eq!(
            final_set.subdomains.into_iter().collect::<Vec<_>>(),
            ["api.example.com"]
        );
    }

    #[test]
    fn raw_counts_are_taken_before_filtering() {
        let mut input = candidates("text", &["a.example.com", "other.org"]);
        input.extend(candidates("json", &["a.example.com"]));

        let final_set = merge(&input, &example());

        assert_eq!(final_set.subdomains.len(), 1);
        assert_eq!(final_set.raw_counts["text"], 2);
        assert_eq!(final_set.raw_counts["json"], 1);
    }

    #[test]
    fn merge_is_order_independent_and_idempotent() {
        let mut input = candidates("a", &["z.example.com", "b.example.com", "example.com"]);
        input.extend(candidates("b", &["b.example.com", "m.example.com"]));

        let forward = merge(&input, &example());
        input.reverse();
        let backward = merge(&input, &example());
        input.rotate_left(2);
        let rotated = merge(&input, &example());

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
        assert_eq!(
            forward.subdomains.iter().collect::<Vec<_>>(),
            ["b.example.com", "example.com", "m.example.com", "z.example.com"]
        );
    }

    #[test]
    fn no_candidates_gives_empty_set() {
        let final_set = merge(&[], &example());
        assert!(final_set.subdomains.is_empty());
        assert!(final_set.raw_counts.is_empty());
    }
}
