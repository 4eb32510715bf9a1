use super::types::{CustomerId, OrderId, WorkshopId};

/// Events driven through the simulation clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// The order in progress at `workshop` finished its current operation
    OperationComplete { workshop: WorkshopId, order: OrderId },
    /// A customer loop withdraws finished goods
    CustomerWithdraw { customer: CustomerId },
}

impl SimEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::OperationComplete { .. } => "OperationComplete",
            SimEvent::CustomerWithdraw { .. } => "CustomerWithdraw",
        }
    }
}

impl std::fmt::Display for SimEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimEvent::OperationComplete { workshop, order } => {
                write!(f, "OperationComplete(order {} at {})", order, workshop)
            }
            SimEvent::CustomerWithdraw { customer } => write!(f, "CustomerWithdraw({})", customer),
        }
    }
}
