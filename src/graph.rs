use crate::store::UserRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Weight multiplier applied after squaring the Jaccard score, widening
/// the visual gap between weak and strong ties.
const WEIGHT_SCALE: f64 = 20.0;

#[derive(Debug, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(rename = "commonCount", skip_serializing_if = "Option::is_none")]
    pub common_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

/// Jaccard index of two sets: |A∩B| / |A∪B|, 0 when both are empty.
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Mode B: one link per unordered user pair whose Jaccard similarity over
/// interest sets exceeds the threshold. Pairs are enumerated by index
/// (i, j) with i < j over the list as loaded, so each pair is visited
/// exactly once and the output order is stable.
pub fn interest_graph(users: &[UserRecord], threshold: f64) -> GraphData {
    let nodes = users
        .iter()
        .map(|user| Node {
            id: user.nickname.clone(),
            name: user.nickname.clone(),
            province: None,
            interests: Some(user.interests.clone()),
        })
        .collect();

    let sets: Vec<HashSet<&str>> = users
        .iter()
        .map(|user| user.interests.iter().map(String::as_str).collect())
        .collect();

    let mut links = Vec::new();
    for i in 0..users.len() {
        for j in (i + 1)..users.len() {
            let similarity = jaccard(&sets[i], &sets[j]);
            if similarity <= threshold {
                continue;
            }
            // Shared interests in the first user's input order. Stored
            // interests may repeat, so deduplicate to keep the count equal
            // to the set intersection size.
            let mut seen = HashSet::new();
            let shared: Vec<&str> = users[i]
                .interests
                .iter()
                .map(String::as_str)
                .filter(|interest| sets[j].contains(interest) && seen.insert(*interest))
                .collect();
            links.push(Link {
                source: users[i].nickname.clone(),
                target: users[j].nickname.clone(),
                label: Some(shared.join(", ")),
                value: Some(similarity * similarity * WEIGHT_SCALE),
                common_count: Some(shared.len()),
            });
        }
    }

    GraphData { nodes, links }
}

/// Mode A: users sharing a province form a complete subgraph, links
/// labeled with the province. Users without a province become isolated
/// nodes. Groups are emitted in sorted key order, members in store order.
pub fn province_graph(users: &[UserRecord]) -> GraphData {
    let nodes = users
        .iter()
        .map(|user| Node {
            id: user.nickname.clone(),
            name: user.nickname.clone(),
            province: user.province.clone(),
            interests: None,
        })
        .collect();

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, user) in users.iter().enumerate() {
        if let Some(province) = user.province.as_deref() {
            groups.entry(province).or_default().push(index);
        }
    }

    let mut links = Vec::new();
    for (province, members) in groups {
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                links.push(Link {
                    source: users[members[i]].nickname.clone(),
                    target: users[members[j]].nickname.clone(),
                    label: Some(province.to_string()),
                    value: None,
                    common_count: None,
                });
            }
        }
    }

    GraphData { nodes, links }
}
