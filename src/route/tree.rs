use std::{mem, ops::Range, sync::Arc};

use percent_encoding::percent_decode_str;

use super::params::{ParamPool, PooledParams, WILDCARD_PARAM};
use crate::error::RouteError;

const PARAM_BYTE: u8 = b':';
const WILD_BYTE: u8 = b'*';
const MAX_PARAMS: usize = u8::MAX as usize;

fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(a, b)| **a == **b).count()
}

fn find_slash(path: &[u8]) -> Option<usize> {
    path.iter().position(|c| *c == b'/')
}

/// Returns the start and end of the first wildcard, the end being the next
/// `/` or the end of the path.
fn find_wildcard(path: &[u8]) -> Option<(usize, usize)> {
    let start = path
        .iter()
        .position(|c| *c == PARAM_BYTE || *c == WILD_BYTE)?;
    let end = find_slash(&path[start..]).map_or(path.len(), |pos| start + pos);
    Some((start, end))
}

/// Validates a decoded pattern and returns the number of wildcards in it.
///
/// Once a pattern passed this check, inserting it can only fail because it
/// collides with routes that are already in the tree.
fn check_pattern(path: &str) -> Result<usize, RouteError> {
    if !path.starts_with('/') || path.contains("//") {
        return Err(RouteError::InvalidPath(path.to_string()));
    }

    let mut names: Vec<&str> = Vec::new();
    let mut num_params = 0;
    let mut segments = path.split('/').peekable();

    while let Some(segment) = segments.next() {
        let start = match segment.find(|c: char| c == ':' || c == '*') {
            Some(start) => start,
            None => continue,
        };
        let name = &segment[start + 1..];

        if segment.as_bytes()[start] == WILD_BYTE {
            if start != 0 || !name.is_empty() || segments.peek().is_some() {
                return Err(RouteError::InvalidCatchAll(path.to_string()));
            }
        } else {
            if name.is_empty() {
                return Err(RouteError::MissingParamName(path.to_string()));
            }
            if name.contains(|c: char| c == ':' || c == '*') {
                return Err(RouteError::MultipleWildcards {
                    segment: segment[start..].to_string(),
                    path: path.to_string(),
                });
            }
            if names.contains(&name) {
                return Err(RouteError::DuplicateParam {
                    name: name.to_string(),
                    path: path.to_string(),
                });
            }
            names.push(name);
        }

        num_params += 1;
        if num_params > MAX_PARAMS {
            return Err(RouteError::TooManyParams(path.to_string()));
        }
    }

    Ok(num_params)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum NodeKind {
    Static,
    Param,
    CatchAll,
}

#[derive(Debug)]
struct Node<T> {
    kind: NodeKind,
    path: Vec<u8>,
    wild_child: bool,
    indices: Vec<u8>,
    children: Vec<Node<T>>,
    handler: Option<T>,
    priority: u32,
}

impl<T> Node<T> {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            path: Vec::new(),
            wild_child: false,
            indices: Vec::new(),
            children: Vec::new(),
            handler: None,
            priority: 0,
        }
    }

    fn find_static_child(&self, prefix: u8) -> Option<usize> {
        self.indices.iter().position(|c| *c == prefix)
    }

    /// Bumps the priority of the child at `pos` and moves it in front of the
    /// siblings with a lower priority, returning its new position.
    fn increment_child_priority(&mut self, pos: usize) -> usize {
        self.children[pos].priority += 1;
        let priority = self.children[pos].priority;

        let mut new_pos = pos;
        while new_pos > 0 && self.children[new_pos - 1].priority < priority {
            self.children.swap(new_pos - 1, new_pos);
            self.indices.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }
        new_pos
    }

    fn add(&mut self, mut path: &[u8], full_path: &str, handler: T) -> Result<(), RouteError> {
        let mut n = self;
        n.priority += 1;

        if n.path.is_empty() && n.children.is_empty() {
            return n.insert_child(path, full_path, handler);
        }

        loop {
            let i = longest_common_prefix(path, &n.path);

            // split edge
            if i < n.path.len() {
                let child = Node {
                    kind: NodeKind::Static,
                    path: n.path[i..].to_vec(),
                    wild_child: n.wild_child,
                    indices: mem::take(&mut n.indices),
                    children: mem::take(&mut n.children),
                    handler: n.handler.take(),
                    priority: n.priority.saturating_sub(1),
                };
                n.indices = vec![n.path[i]];
                n.children = vec![child];
                n.path.truncate(i);
                n.wild_child = false;
            }

            if i == path.len() {
                if n.handler.is_some() {
                    return Err(RouteError::Duplicate(full_path.to_string()));
                }
                n.handler = Some(handler);
                return Ok(());
            }

            path = &path[i..];

            if n.wild_child {
                n = &mut n.children[0];
                n.priority += 1;

                // `:id` must not be extended to `:ids`
                if path.starts_with(&n.path)
                    && (n.path.len() >= path.len() || path[n.path.len()] == b'/')
                {
                    continue;
                }
                return Err(RouteError::WildcardConflict {
                    segment: String::from_utf8_lossy(path).into_owned(),
                    path: full_path.to_string(),
                });
            }

            let c = path[0];

            if n.kind == NodeKind::Param && c == b'/' && n.children.len() == 1 {
                n = &mut n.children[0];
                n.priority += 1;
                continue;
            }

            if let Some(pos) = n.find_static_child(c) {
                let pos = n.increment_child_priority(pos);
                n = &mut n.children[pos];
                continue;
            }

            if c != PARAM_BYTE && c != WILD_BYTE {
                n.indices.push(c);
                n.children.push(Node::new(NodeKind::Static));
                let pos = n.increment_child_priority(n.children.len() - 1);
                n = &mut n.children[pos];
            }
            return n.insert_child(path, full_path, handler);
        }
    }

    /// Materializes `path` below this node, which must not have a handler
    /// for `path` yet.
    fn insert_child(
        &mut self,
        mut path: &[u8],
        full_path: &str,
        handler: T,
    ) -> Result<(), RouteError> {
        let mut n = self;

        while let Some((start, end)) = find_wildcard(path) {
            if !n.children.is_empty() {
                return Err(RouteError::WildcardConflict {
                    segment: String::from_utf8_lossy(&path[start..end]).into_owned(),
                    path: full_path.to_string(),
                });
            }

            if path[start] == WILD_BYTE {
                if start == 0 || n.path.last() == Some(&b'/') {
                    return Err(RouteError::CatchAllConflict(full_path.to_string()));
                }

                // the catch-all is the final `/*` of the path
                let slash = start - 1;
                n.path = path[..slash].to_vec();
                n.indices = vec![b'/'];

                let mut placeholder = Node::new(NodeKind::CatchAll);
                placeholder.wild_child = true;
                placeholder.priority = 1;
                placeholder.children = vec![Node {
                    path: path[slash..].to_vec(),
                    handler: Some(handler),
                    priority: 1,
                    ..Node::new(NodeKind::CatchAll)
                }];
                n.children = vec![placeholder];
                return Ok(());
            }

            if start > 0 {
                n.path = path[..start].to_vec();
                path = &path[start..];
            }
            let end = end - start;

            n.children = vec![Node::new(NodeKind::Param)];
            n.wild_child = true;
            n = &mut n.children[0];
            n.priority += 1;

            if end == path.len() {
                break;
            }

            n.path = path[..end].to_vec();
            path = &path[end..];
            n.indices = vec![b'/'];
            n.children = vec![Node {
                priority: 1,
                ..Node::new(NodeKind::Static)
            }];
            n = &mut n.children[0];
        }

        n.path = path.to_vec();
        n.handler = Some(handler);
        Ok(())
    }

    /// Resolves `path`, passing each parameter name and the byte range of its
    /// value in `path` to `capture`.
    fn find<'a, F>(&'a self, mut path: &[u8], capture: &mut F) -> Option<&'a T>
    where
        F: FnMut(&[u8], Range<usize>),
    {
        let total = path.len();
        let mut n = self;

        loop {
            if path.len() <= n.path.len() {
                if path == n.path.as_slice() {
                    return n.handler.as_ref();
                }
                return None;
            }

            path = path.strip_prefix(n.path.as_slice())?;

            if !n.wild_child {
                let pos = n.find_static_child(path[0])?;
                n = &n.children[pos];
                continue;
            }

            n = &n.children[0];
            match n.kind {
                NodeKind::Param => {
                    let end = find_slash(path).unwrap_or(path.len());
                    let start = total - path.len();
                    capture(&n.path[1..], start..start + end);

                    if end == path.len() {
                        return n.handler.as_ref();
                    }
                    path = &path[end..];
                    n = n.children.first()?;
                }
                NodeKind::CatchAll => {
                    capture(WILDCARD_PARAM.as_bytes(), total - path.len() + 1..total);
                    return n.handler.as_ref();
                }
                NodeKind::Static => return None,
            }
        }
    }
}

/// A successful lookup.
pub(crate) struct Found<'a, T> {
    pub(crate) handler: &'a T,
    pub(crate) params: Option<PooledParams>,
}

/// A compressed radix tree holding the routes of one HTTP method.
#[derive(Debug)]
pub(crate) struct Tree<T> {
    root: Node<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            root: Node::new(NodeKind::Static),
        }
    }
}

impl<T> Tree<T> {
    /// Adds a route and returns the number of parameters it declares.
    ///
    /// The pattern is percent-decoded first. A pattern rejected by the
    /// validation leaves the tree untouched; a pattern colliding with
    /// existing routes may leave split nodes and bumped priorities behind,
    /// which never changes what the tree matches.
    pub(crate) fn add(&mut self, pattern: &str, handler: T) -> Result<usize, RouteError> {
        let pattern = if pattern.is_empty() { "/" } else { pattern };
        let path = percent_decode_str(pattern)
            .decode_utf8()
            .map_err(|_| RouteError::Decode(pattern.to_string()))?;
        let num_params = check_pattern(&path)?;
        self.root.add(path.as_bytes(), &path, handler)?;
        Ok(num_params)
    }

    /// Resolves `path`, capturing the parameters into a buffer taken from
    /// `pool` the first time a wildcard is crossed.
    pub(crate) fn find(&self, path: &str, pool: &Arc<ParamPool>) -> Option<Found<'_, T>> {
        let mut params: Option<PooledParams> = None;
        // values start after `/` or a static prefix of the pattern and end at
        // `/` or the end of `path`, so the ranges are on char boundaries
        let handler = self
            .root
            .find(path.as_bytes(), &mut |key: &[u8], value: Range<usize>| {
                params
                    .get_or_insert_with(|| pool.acquire())
                    .push(&String::from_utf8_lossy(key), &path[value]);
            })?;
        Some(Found { handler, params })
    }

    /// Returns `true` if a handler is registered for `path`.
    pub(crate) fn contains(&self, path: &str) -> bool {
        self.root
            .find(path.as_bytes(), &mut |_: &[u8], _: Range<usize>| {})
            .is_some()
    }
}
