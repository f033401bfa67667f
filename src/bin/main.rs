//! Builds a tree from the keys given on the command line and prints it as a Graphviz graph.
//!
//! ```text
//! cargo run --bin main -- 5 3 8 1 4 7 9 | dot -Tsvg > tree.svg
//! ```

use std::{env, ptr::NonNull};

use cordyceps::Linked;
use ordered_avl::{AvlTree, Links, TreeNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
#[repr(C)]
struct KeyNode {
    links: Links<KeyNode>,
    key: i64,
}

impl KeyNode {
    fn new(key: i64) -> Box<KeyNode> {
        Box::new(KeyNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<KeyNode>> for KeyNode {
    type Handle = Box<KeyNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<KeyNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<KeyNode>> for KeyNode {
    type Key = i64;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ordered_avl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut tree: AvlTree<KeyNode> = AvlTree::new();

    for arg in env::args().skip(1) {
        match arg.parse() {
            Ok(key) => {
                let (_, inserted) = tree.insert_unique(KeyNode::new(key));
                if !inserted {
                    tracing::warn!(key, "skipping duplicate key");
                }
            }
            Err(e) => tracing::warn!(%arg, error = %e, "skipping argument that is not an integer"),
        }
    }

    if tree.is_empty() {
        tracing::info!("no keys given, using a sample");
        for key in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(KeyNode::new(key));
        }
    }

    tree.assert_invariants();
    tracing::info!(len = tree.len(), "built tree");

    let mut out = String::new();
    if let Err(e) = tree.dotgraph("avl", &mut out) {
        tracing::error!(error = %e, "failed to render tree");
        std::process::exit(1);
    }

    println!("{out}");
}
