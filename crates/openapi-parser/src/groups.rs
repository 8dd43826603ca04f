//! Automatic endpoint grouping, by tags first and by path prefix otherwise

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

use crate::types::ApiEndpoint;

const COMMON_PREFIXES: &[&str] = &["api"];

static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+$").expect("version segment pattern is valid"));

/// Endpoints grouped under a display label
#[derive(Debug, Clone, Default)]
pub struct EndpointGroups<'a> {
    pub groups: IndexMap<String, Vec<&'a ApiEndpoint>>,
}

impl<'a> EndpointGroups<'a> {
    /// Group tagged endpoints by their tag list and the rest by path prefix
    pub fn build(endpoints: &'a [ApiEndpoint]) -> Self {
        let mut groups: IndexMap<String, Vec<&'a ApiEndpoint>> = IndexMap::new();
        let mut untagged = Vec::new();

        for endpoint in endpoints {
            if endpoint.tags.is_empty() {
                untagged.push(endpoint);
            } else {
                let label = format!("Group(by tags): {}", endpoint.tags.join("/"));
                groups.entry(label).or_default().push(endpoint);
            }
        }

        for endpoint in untagged {
            let label = format!("Group(by prefix): {}", Self::prefix_of(&endpoint.path));
            groups.entry(label).or_default().push(endpoint);
        }

        Self { groups }
    }

    /// First path segment that is neither a common prefix nor a version
    fn prefix_of(path: &str) -> &str {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        segments
            .iter()
            .find(|segment| {
                let lower = segment.to_lowercase();
                !VERSION_SEGMENT.is_match(&lower) && !COMMON_PREFIXES.contains(&lower.as_str())
            })
            .or_else(|| segments.first())
            .copied()
            .unwrap_or("")
    }

    /// Group labels in display order
    pub fn labels(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Endpoints of one group
    pub fn get(&self, label: &str) -> Option<&[&'a ApiEndpoint]> {
        self.groups.get(label).map(Vec::as_slice)
    }

    /// Endpoints of every group whose label contains `needle` (case-insensitive)
    pub fn matching(&self, needle: &str) -> Vec<&'a ApiEndpoint> {
        let needle = needle.to_lowercase();
        self.groups
            .iter()
            .filter(|(label, _)| label.to_lowercase().contains(&needle))
            .flat_map(|(_, endpoints)| endpoints.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;
    use indexmap::IndexMap;

    fn endpoint(path: &str, tags: &[&str]) -> ApiEndpoint {
        ApiEndpoint {
            path: path.to_string(),
            method: HttpMethod::Get,
            operation_id: String::new(),
            summary: String::new(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            responses: IndexMap::new(),
        }
    }

    #[test]
    fn test_group_by_tags_then_prefix() {
        let endpoints = vec![
            endpoint("/users", &["user"]),
            endpoint("/api/v1/orders", &[]),
            endpoint("/users/{id}", &["user"]),
            endpoint("/pets/{id}", &["pet", "animal"]),
            endpoint("/v2/orders/{id}", &[]),
        ];

        let groups = EndpointGroups::build(&endpoints);
        assert_eq!(
            groups.labels(),
            vec![
                "Group(by tags): user",
                "Group(by tags): pet/animal",
                "Group(by prefix): orders"
            ]
        );
        assert_eq!(groups.get("Group(by tags): user").unwrap().len(), 2);
        assert_eq!(groups.get("Group(by prefix): orders").unwrap().len(), 2);
    }

    #[test]
    fn test_prefix_falls_back_to_first_segment() {
        assert_eq!(EndpointGroups::prefix_of("/api/v1"), "api");
        assert_eq!(EndpointGroups::prefix_of("/"), "");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let endpoints = vec![endpoint("/users", &["User"]), endpoint("/orders", &[])];
        let groups = EndpointGroups::build(&endpoints);
        assert_eq!(groups.matching("user").len(), 1);
        assert_eq!(groups.matching("group").len(), 2);
    }
}
