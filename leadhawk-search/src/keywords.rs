//! Query generation: the location × service cross-product plus manual
//! high-intent phrases.

use crate::types::Query;

/// Build the run's query list.
///
/// Order is deterministic (locations outer, services inner, extras last)
/// so repeated runs scan in a stable sequence and an operator can tell from
/// the logs which query ran when. Location and service are concatenated
/// without a separator (the monitored phrases are CJK), then scoped to the
/// target site. Extra phrases get the same site scope; their label is the
/// phrase itself.
pub fn generate(locations: &[String], services: &[String], extra: &[String], site: &str) -> Vec<Query> {
    let mut queries = Vec::with_capacity(locations.len() * services.len() + extra.len());

    for location in locations {
        for service in services {
            let label = format!("{location}{service}");
            queries.push(Query {
                text: format!("{label} site:{site}"),
                label,
            });
        }
    }

    for phrase in extra {
        queries.push(Query {
            text: format!("{phrase} site:{site}"),
            label: phrase.clone(),
        });
    }

    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cross_product_is_locations_outer_services_inner() {
        let queries = generate(
            &strings(&["中壢", "桃園"]),
            &strings(&["接睫毛", "做臉"]),
            &[],
            "threads.net",
        );

        let texts: Vec<_> = queries.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "中壢接睫毛 site:threads.net",
                "中壢做臉 site:threads.net",
                "桃園接睫毛 site:threads.net",
                "桃園做臉 site:threads.net",
            ]
        );
        assert_eq!(queries[0].label, "中壢接睫毛");
    }

    #[test]
    fn extras_come_last_with_their_own_labels() {
        let queries = generate(
            &strings(&["中壢"]),
            &strings(&["做臉"]),
            &strings(&["想做皮膚管理"]),
            "threads.net",
        );

        assert_eq!(queries.len(), 2);
        let last = queries.last().unwrap();
        assert_eq!(last.text, "想做皮膚管理 site:threads.net");
        assert_eq!(last.label, "想做皮膚管理");
    }

    #[test]
    fn repeated_runs_generate_identical_sequences() {
        let locations = strings(&["平鎮", "桃園"]);
        let services = strings(&["除毛", "清粉刺", "皮膚管理"]);
        let extras = strings(&["桃園清粉刺推薦"]);

        let a = generate(&locations, &services, &extras, "threads.net");
        let b = generate(&locations, &services, &extras, "threads.net");
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn empty_inputs_yield_no_queries() {
        assert!(generate(&[], &strings(&["做臉"]), &[], "threads.net").is_empty());
        assert!(generate(&strings(&["中壢"]), &[], &[], "threads.net").is_empty());
    }
}
