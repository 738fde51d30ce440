//! Walk the namespace by path segments.

use crate::config::{NamespaceTree, Node};
use crate::error::ResolveError;

/// Descend from the root directory through `children` one segment at a time.
/// Fails on an empty path, an unknown key, or a segment left over after a non-directory node.
pub fn resolve_path<'t, S: AsRef<str>>(
    tree: &'t NamespaceTree,
    segments: &[S],
) -> Result<&'t Node, ResolveError> {
    let first = segments.first().ok_or(ResolveError::EmptyPath)?;
    let mut current = tree
        .root
        .child(first.as_ref())
        .ok_or_else(|| not_found(segments, 0))?;
    for (i, segment) in segments.iter().enumerate().skip(1) {
        current = match current {
            Node::Directory(dir) => dir
                .child(segment.as_ref())
                .ok_or_else(|| not_found(segments, i))?,
            Node::Leaf(_) | Node::Variants(_) => return Err(not_found(segments, i)),
        };
    }
    Ok(current)
}

fn not_found<S: AsRef<str>>(segments: &[S], index: usize) -> ResolveError {
    ResolveError::NotFound {
        segment: segments[index].as_ref().to_string(),
        remaining: segments[index..]
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("/"),
    }
}
