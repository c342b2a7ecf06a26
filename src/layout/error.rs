use crate::ir::VertexId;

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Every fatal condition the layout core can report.
///
/// None of these are transient: they mean the input graph is malformed or the
/// caller asked for something the current graph cannot support.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid pedigree structure: {0}")]
    Structural(#[from] StructuralError),
    #[error("edit rejected: {0}")]
    Precondition(#[from] PreconditionError),
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("vertex {vertex} ({name}) has {count} incoming edges")]
    TooManyInEdges {
        vertex: VertexId,
        name: String,
        count: usize,
    },
    #[error("edge {from} -> {to} connects incompatible vertex kinds")]
    BadEdgeTarget { from: VertexId, to: VertexId },
    #[error("vertex {vertex} ({name}) has {incoming} in / {outgoing} out edges")]
    BadEdgeCount {
        vertex: VertexId,
        name: String,
        incoming: usize,
        outgoing: usize,
    },
    #[error("cycle detected through vertex {0}")]
    Cycle(VertexId),
    #[error("graph is disconnected: vertex {0} is unreachable")]
    Disconnected(VertexId),
    #[error("graph has no parentless vertices")]
    NoRoots,
    #[error("edge {from} -> {to} already exists")]
    DuplicateEdge { from: VertexId, to: VertexId },
    #[error("vertex name {0:?} is already taken")]
    DuplicateName(String),
    #[error("real vertex {0:?} added after virtual vertices")]
    RealAfterVirtual(String),
    #[error("vertex {0} is not a virtual vertex")]
    NotVirtual(VertexId),
    #[error("edge {from} -> {to} spans ranks {from_rank} -> {to_rank}")]
    EdgeSpan {
        from: VertexId,
        to: VertexId,
        from_rank: usize,
        to_rank: usize,
    },
    #[error("snapshot {field} holds {found} entries, expected {expected}")]
    SnapshotMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("vertex {vertex} is a {found}, expected {expected}")]
    WrongKind {
        vertex: VertexId,
        expected: &'static str,
        found: &'static str,
    },
    #[error("person {0} already has parents")]
    AlreadyHasParents(VertexId),
    #[error("relationship {0} has no child hub")]
    NoChildHub(VertexId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("unknown vertex name {0:?}")]
    UnknownName(String),
    #[error("unknown vertex id {0}")]
    UnknownId(VertexId),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{requested} seed buckets requested, at most {max} are tractable")]
    TooManySeedBuckets { requested: usize, max: usize },
    #[error("at least one seed bucket is required")]
    NoSeedBuckets,
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}
