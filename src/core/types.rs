use serde::{Deserialize, Serialize};

/// Simulated time, in the time units of the topology's operation durations.
pub type SimTime = f64;

macro_rules! index_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the entity in declaration order
            pub fn index(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

index_id!(
    /// Handle to a workshop of a built topology
    WorkshopId
);
index_id!(
    /// Handle to an item of a built topology
    ItemId
);
index_id!(
    /// Handle to a kanban loop of a built topology
    LoopId
);
index_id!(
    /// Handle to a customer loop of a built topology
    CustomerId
);

/// Sequential identifier of a production order within one simulation run
pub type OrderId = u64;
