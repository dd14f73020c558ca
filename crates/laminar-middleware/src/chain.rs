//! The linked chain of middleware units.
//!
//! A chain is a singly linked list of [`ChainNode`]s. Every chain ends in
//! exactly one [`ChainNode::Terminal`], which is also what an empty chain
//! looks like. Invoking the terminal does nothing, so traversal stops at the
//! end of the chain without any special casing in the units.
//!
//! ```text
//! Link(A) ──► Link(B) ──► Link(C) ──► Terminal
//! ```
//!
//! Appending walks to the terminal slot and replaces it in place with a new
//! link ending in a fresh terminal. Nodes that already exist are never moved
//! or rebuilt, and the head slot stays where its owner put it. Both appending
//! and dropping loop over the nodes, so chain length is not bounded by the
//! call stack.

use crate::context::Context;
use crate::middleware::{BoxedMiddleware, Next};
use crate::response::ResponseWriter;
use crate::types::Request;

/// One node of a middleware chain.
#[derive(Default)]
pub enum ChainNode {
    /// A unit and the rest of the chain after it.
    Link {
        /// The unit run at this position.
        handler: BoxedMiddleware,
        /// The remainder of the chain.
        next: Box<ChainNode>,
    },
    /// End of the chain.
    #[default]
    Terminal,
}

impl ChainNode {
    /// Builds a chain whose node order equals the order of `units`.
    ///
    /// An empty input yields [`ChainNode::Terminal`]. Duplicates are kept.
    pub fn build<I>(units: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        let units: Vec<BoxedMiddleware> = units.into_iter().collect();
        units
            .into_iter()
            .rev()
            .fold(Self::Terminal, |next, handler| Self::Link {
                handler,
                next: Box::new(next),
            })
    }

    /// Appends `handler` right before the terminal.
    ///
    /// Runs in O(n) of the current chain length. On an empty chain the node
    /// itself becomes the new link.
    pub fn append(&mut self, handler: BoxedMiddleware) {
        let mut slot = self;
        while let Self::Link { next, .. } = slot {
            slot = &mut **next;
        }

        *slot = Self::Link {
            handler,
            next: Box::new(Self::Terminal),
        };
    }

    /// Runs this node's unit with a continuation bound to the next node.
    pub fn invoke(&self, ctx: Context, writer: &mut ResponseWriter<'_>, request: &mut Request) {
        match self {
            Self::Link { handler, next } => {
                handler.handle(ctx, writer, request, Next::new(next));
            }
            Self::Terminal => {}
        }
    }

    /// Returns `true` for the end-of-chain node.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Returns the unit held by this node, if it is a link.
    pub fn handler(&self) -> Option<&BoxedMiddleware> {
        match self {
            Self::Link { handler, .. } => Some(handler),
            Self::Terminal => None,
        }
    }

    /// Returns the node after this one, if this is a link.
    pub fn next(&self) -> Option<&ChainNode> {
        match self {
            Self::Link { next, .. } => Some(&**next),
            Self::Terminal => None,
        }
    }

    /// Iterates over the units from this node to the terminal.
    pub fn iter(&self) -> Iter<'_> {
        Iter { node: self }
    }

    /// Returns the number of units before the terminal.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if this node is the terminal.
    pub fn is_empty(&self) -> bool {
        self.is_terminal()
    }
}

impl Drop for ChainNode {
    fn drop(&mut self) {
        // unlink one node at a time so long chains do not recurse
        let Self::Link { next, .. } = self else {
            return;
        };
        let mut rest = std::mem::take(&mut **next);
        while let Self::Link { next, .. } = &mut rest {
            let after = std::mem::take(&mut **next);
            rest = after;
        }
    }
}

impl std::fmt::Debug for ChainNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|handler| handler.name()))
            .finish()
    }
}

/// Iterator over the units of a chain, in order.
#[derive(Debug)]
pub struct Iter<'a> {
    node: &'a ChainNode,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a BoxedMiddleware;

    fn next(&mut self) -> Option<Self::Item> {
        match self.node {
            ChainNode::Link { handler, next } => {
                self.node = &**next;
                Some(handler)
            }
            ChainNode::Terminal => None,
        }
    }
}

impl<'a> IntoIterator for &'a ChainNode {
    type Item = &'a BoxedMiddleware;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewareFn;
    use crate::response::{ResponseBuffer, ResponseSink};
    use bytes::Bytes;
    use std::sync::Arc;

    /// A unit that appends its tag to the body, around the rest of the chain.
    fn tagged(tag: &'static str) -> BoxedMiddleware {
        Arc::new(MiddlewareFn::new(tag, move |ctx, writer, request, next| {
            writer.write(format!("<{tag}>").as_bytes()).unwrap();
            next.run(ctx, writer, request);
            writer.write(format!("</{tag}>").as_bytes()).unwrap();
        }))
    }

    fn run(chain: &ChainNode) -> String {
        let mut buffer = ResponseBuffer::new();
        let mut writer = ResponseWriter::new(&mut buffer);
        let mut request = http::Request::new(Bytes::new());
        chain.invoke(Context::background(), &mut writer, &mut request);
        drop(writer);
        String::from_utf8(buffer.body().to_vec()).unwrap()
    }

    fn names(chain: &ChainNode) -> Vec<&'static str> {
        chain.iter().map(|handler| handler.name()).collect()
    }

    #[test]
    fn test_build_empty_is_terminal() {
        let chain = ChainNode::build(Vec::<BoxedMiddleware>::new());
        assert!(chain.is_terminal());
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
        assert!(chain.handler().is_none());
        assert!(chain.next().is_none());
    }

    #[test]
    fn test_build_preserves_order() {
        let chain = ChainNode::build(vec![tagged("a"), tagged("b"), tagged("c")]);
        assert_eq!(names(&chain), vec!["a", "b", "c"]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_build_keeps_duplicates() {
        let unit = tagged("dup");
        let chain = ChainNode::build(vec![unit.clone(), unit.clone()]);

        let units: Vec<_> = chain.iter().collect();
        assert_eq!(units.len(), 2);
        assert!(Arc::ptr_eq(units[0], &unit));
        assert!(Arc::ptr_eq(units[1], &unit));
    }

    #[test]
    fn test_append_to_empty_replaces_head() {
        let mut chain = ChainNode::Terminal;
        chain.append(tagged("only"));

        assert!(!chain.is_terminal());
        assert_eq!(names(&chain), vec!["only"]);
        assert!(chain.next().unwrap().is_terminal());
    }

    #[test]
    fn test_append_keeps_single_terminal() {
        let mut chain = ChainNode::default();
        for tag in ["a", "b", "c", "d"] {
            chain.append(tagged(tag));
        }

        let mut node = &chain;
        let mut links = 0;
        while let Some(next) = node.next() {
            links += 1;
            node = next;
        }
        assert_eq!(links, 4);
        assert!(node.is_terminal());
    }

    #[test]
    fn test_append_does_not_move_existing_nodes() {
        let mut chain = ChainNode::build(vec![tagged("a"), tagged("b")]);
        let second = chain.next().unwrap() as *const ChainNode;

        chain.append(tagged("c"));

        assert_eq!(chain.next().unwrap() as *const ChainNode, second);
        assert_eq!(names(&chain), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_append_after_build_matches_build() {
        let mut appended = ChainNode::build(vec![tagged("a"), tagged("b")]);
        appended.append(tagged("c"));
        let built = ChainNode::build(vec![tagged("a"), tagged("b"), tagged("c")]);

        assert_eq!(run(&appended), run(&built));
        assert_eq!(run(&built), "<a><b><c></c></b></a>");
    }

    #[test]
    fn test_long_chain_builds_and_drops() {
        let unit = tagged("u");
        let chain = ChainNode::build((0..100_000).map(|_| unit.clone()));
        assert_eq!(chain.len(), 100_000);

        drop(chain);
        assert_eq!(Arc::strong_count(&unit), 1);
    }

    #[test]
    fn test_many_appends() {
        let unit = tagged("u");
        let mut chain = ChainNode::Terminal;
        for _ in 0..10_000 {
            chain.append(unit.clone());
        }

        assert_eq!(chain.len(), 10_000);
        assert_eq!(Arc::strong_count(&unit), 10_001);
    }

    #[test]
    fn test_invoke_terminal_writes_nothing() {
        assert_eq!(run(&ChainNode::Terminal), "");
    }

    #[test]
    fn test_debug_lists_names() {
        let chain = ChainNode::build(vec![tagged("x"), tagged("y")]);
        assert_eq!(format!("{chain:?}"), r#"["x", "y"]"#);
    }
}
