//! Pairing saved names with destination scene names.
//!
//! Two matchers live here:
//! - [`match_names`]: object-to-object pairing across namespaces. Lazy; a
//!   destination object is claimed from the index only when its pair is yielded.
//! - [`match_curve_names`]: curve-to-attribute pairing by case-insensitive
//!   node/attribute scoring against the keyable attributes the host reports.

use std::iter::FusedIterator;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use log::debug;

use crate::host::KeyframeHost;
use crate::naming::{split_curve_name, AttrRef, NodeRef};

/// Score bit for an exact node-name match.
pub const NODE_SCORE: u8 = 8;
/// Score bit for an exact attribute-name match.
pub const ATTR_SCORE: u8 = 4;
/// Score bit for node and attribute both containing the source names.
pub const CONTAINMENT_SCORE: u8 = 2;

/// How strongly a curve pairing is supported.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchStrength {
    NoMatch,
    Fuzzy,
    Exact,
}

impl MatchStrength {
    pub fn from_score(score: u8) -> Self {
        if score & (NODE_SCORE | ATTR_SCORE) != 0 {
            MatchStrength::Exact
        } else if score & CONTAINMENT_SCORE != 0 {
            MatchStrength::Fuzzy
        } else {
            MatchStrength::NoMatch
        }
    }
}

/// One object-to-object pairing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeMatch {
    pub src: NodeRef,
    pub dst: NodeRef,
}

/// One curve-to-attribute pairing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveMatch {
    pub curve: String,
    pub dst: AttrRef,
    pub score: u8,
}

impl CurveMatch {
    pub fn strength(&self) -> MatchStrength {
        MatchStrength::from_score(self.score)
    }
}

/// Group names by namespace, keeping first-seen namespace order.
pub fn group_by_namespace(names: &[String]) -> IndexMap<String, Vec<String>> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for name in names {
        let node = NodeRef::new(name.as_str());
        groups
            .entry(node.namespace().to_string())
            .or_default()
            .push(name.clone());
    }
    groups
}

fn index_by_short_name(names: &[String]) -> HashMap<String, Vec<NodeRef>> {
    let mut index: HashMap<String, Vec<NodeRef>> = HashMap::new();
    for name in names {
        let node = NodeRef::new(name.as_str());
        index
            .entry(node.short_name().to_string())
            .or_default()
            .push(node);
    }
    index
}

/// Pair source objects with destination objects and/or namespaces.
///
/// With neither destination objects nor namespaces the source namespaces are
/// reused (self-match). With objects only, their namespaces are used. Pairs are
/// produced lazily; see [`NameMatches`].
pub fn match_names(
    src_objects: &[String],
    dst_objects: &[String],
    dst_namespaces: &[String],
) -> NameMatches {
    let src_groups = group_by_namespace(src_objects);

    let requested: Vec<String> = if dst_objects.is_empty() && dst_namespaces.is_empty() {
        src_groups.keys().cloned().collect()
    } else if dst_namespaces.is_empty() {
        group_by_namespace(dst_objects).keys().cloned().collect()
    } else {
        dst_namespaces.to_vec()
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut shared: HashSet<String> = HashSet::new();
    let mut leftover: Vec<String> = Vec::new();
    for namespace in requested {
        if !seen.insert(namespace.clone()) {
            continue;
        }
        if src_groups.contains_key(namespace.as_str()) {
            shared.insert(namespace);
        } else {
            leftover.push(namespace);
        }
    }

    // Second pass visits source namespaces without a same-named destination first.
    let (used, unused): (Vec<String>, Vec<String>) = src_groups
        .keys()
        .cloned()
        .partition(|ns| shared.contains(ns.as_str()));
    let mut rotation = unused;
    rotation.extend(used);

    let index = if dst_objects.is_empty() {
        None
    } else {
        Some(index_by_short_name(dst_objects))
    };

    NameMatches {
        src_groups,
        shared,
        leftover,
        rotation,
        index,
        offset: 0,
        cursor: Cursor::Shared {
            group: 0,
            member: 0,
        },
    }
}

#[derive(Clone, Copy, Debug)]
enum Cursor {
    /// Source namespaces that also exist on the destination side.
    Shared { group: usize, member: usize },
    /// Destination namespaces without a source counterpart, spread round-robin.
    Leftover {
        dst: usize,
        step: usize,
        member: usize,
        matched: bool,
    },
    Done,
}

/// Lazy, finite, non-restartable sequence of [`NodeMatch`] values.
///
/// Each destination object is handed out at most once: it is removed from the
/// short-name index at the moment its pair is produced.
#[derive(Debug)]
pub struct NameMatches {
    src_groups: IndexMap<String, Vec<String>>,
    shared: HashSet<String>,
    leftover: Vec<String>,
    rotation: Vec<String>,
    index: Option<HashMap<String, Vec<NodeRef>>>,
    offset: usize,
    cursor: Cursor,
}

impl NameMatches {
    fn claim(&mut self, candidate: NodeRef) -> Option<NodeRef> {
        let Some(index) = self.index.as_mut() else {
            return Some(candidate);
        };
        let bucket = index.get_mut(candidate.short_name())?;
        let pos = bucket.iter().position(|n| candidate.tail_matches(n))?;
        Some(bucket.remove(pos))
    }

    fn finish(&mut self) {
        if let Some(index) = self.index.take() {
            for node in index.values().flatten() {
                debug!("Cannot find matching source object for {}", node);
            }
        }
        self.cursor = Cursor::Done;
    }

    fn rotation_member(&self, step: usize, member: usize) -> (usize, Option<String>) {
        let n = self.rotation.len();
        let namespace = &self.rotation[(self.offset + step) % n];
        match self.src_groups.get(namespace.as_str()) {
            Some(names) => (names.len(), names.get(member).cloned()),
            None => (0, None),
        }
    }
}

impl Iterator for NameMatches {
    type Item = NodeMatch;

    fn next(&mut self) -> Option<NodeMatch> {
        loop {
            match self.cursor {
                Cursor::Shared { group, member } => {
                    let name = match self.src_groups.get_index(group) {
                        None => {
                            self.cursor = Cursor::Leftover {
                                dst: 0,
                                step: 0,
                                member: 0,
                                matched: false,
                            };
                            continue;
                        }
                        Some((namespace, names)) => {
                            if !self.shared.contains(namespace.as_str()) {
                                None
                            } else {
                                names.get(member).cloned()
                            }
                        }
                    };
                    let Some(name) = name else {
                        self.cursor = Cursor::Shared {
                            group: group + 1,
                            member: 0,
                        };
                        continue;
                    };
                    self.cursor = Cursor::Shared {
                        group,
                        member: member + 1,
                    };

                    let src = NodeRef::new(name);
                    if let Some(dst) = self.claim(src.clone()) {
                        return Some(NodeMatch { src, dst });
                    }
                    debug!("Cannot find matching destination object for {}", src);
                }
                Cursor::Leftover {
                    dst,
                    step,
                    member,
                    matched,
                } => {
                    let Some(dst_namespace) = self.leftover.get(dst).cloned() else {
                        self.finish();
                        return None;
                    };
                    let n = self.rotation.len();
                    if step >= n {
                        self.cursor = Cursor::Leftover {
                            dst: dst + 1,
                            step: 0,
                            member: 0,
                            matched: false,
                        };
                        continue;
                    }

                    let (len, name) = self.rotation_member(step, member);
                    let Some(name) = name.filter(|_| member < len) else {
                        let step = step + 1;
                        if matched {
                            // Next destination namespace starts after the one that matched,
                            // unless the rotation wrapped all the way round.
                            if step < n {
                                self.offset += step;
                            }
                            self.cursor = Cursor::Leftover {
                                dst: dst + 1,
                                step: 0,
                                member: 0,
                                matched: false,
                            };
                        } else {
                            self.cursor = Cursor::Leftover {
                                dst,
                                step,
                                member: 0,
                                matched: false,
                            };
                        }
                        continue;
                    };

                    let src = NodeRef::new(name);
                    let candidate = src.with_namespace(&dst_namespace);
                    match self.claim(candidate) {
                        Some(found) => {
                            self.cursor = Cursor::Leftover {
                                dst,
                                step,
                                member: member + 1,
                                matched: true,
                            };
                            return Some(NodeMatch { src, dst: found });
                        }
                        None => {
                            self.cursor = Cursor::Leftover {
                                dst,
                                step,
                                member: member + 1,
                                matched,
                            };
                            debug!("Cannot find matching destination object for {}", src);
                        }
                    }
                }
                Cursor::Done => return None,
            }
        }
    }
}

impl FusedIterator for NameMatches {}

/// Score a source curve name against a destination node/attribute, case-insensitively.
///
/// `dst_node` is the destination base name (no DAG path, no namespace).
pub fn curve_score(src_curve: &str, dst_node: &str, dst_attr: &str) -> u8 {
    let (src_node, src_attr) = split_curve_name(src_curve);
    let src_node = src_node.to_lowercase();
    let src_attr = src_attr.to_lowercase();
    let dst_node = dst_node.to_lowercase();
    let dst_attr = dst_attr.to_lowercase();

    let mut score = 0;
    if src_node == dst_node {
        score += NODE_SCORE;
    }
    if src_attr == dst_attr {
        score += ATTR_SCORE;
    }
    if dst_node.contains(&src_node) && dst_attr.contains(&src_attr) {
        score += CONTAINMENT_SCORE;
    }
    score
}

/// Pair every keyable attribute of `dst_objects` with its best-scoring source curve.
///
/// Any score above zero is accepted; [`CurveMatch::strength`] tells exact pairings
/// from containment-only ones. Ties keep the first source curve seen. A destination
/// attribute gets at most one curve; a curve may drive several attributes.
pub fn match_curve_names<H: KeyframeHost + ?Sized>(
    host: &H,
    src_curve_names: &[String],
    dst_objects: &[String],
) -> Vec<CurveMatch> {
    let mut results = Vec::new();

    for object in dst_objects {
        let node = NodeRef::new(object.as_str());
        let base = node.base_name();

        for attr in host.keyable_attributes(object) {
            let mut best: Option<(&String, u8)> = None;
            for curve in src_curve_names {
                let score = curve_score(curve, base, &attr);
                if score > best.map_or(0, |(_, s)| s) {
                    best = Some((curve, score));
                }
            }

            let Some((curve, score)) = best else {
                debug!("No source curve for {}.{}", object, attr);
                continue;
            };
            results.push(CurveMatch {
                curve: curve.clone(),
                dst: AttrRef::new(node.clone(), attr),
                score,
            });
        }
    }

    results
}
